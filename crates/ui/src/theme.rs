use danmaku_protocol::ThemeToken;

/// Resolved RGBA color for egui rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl ResolvedColor {
    pub fn to_color32(self) -> egui::Color32 {
        egui::Color32::from_rgba_unmultiplied(self.r, self.g, self.b, self.a)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeMode {
    /// The reference look: translucent white pills on dark cyan.
    Cyan,
    /// Same pills on a near-black backdrop.
    Dark,
}

pub fn resolve(token: ThemeToken, mode: ThemeMode) -> egui::Color32 {
    resolve_rgba(token, mode).to_color32()
}

fn resolve_rgba(token: ThemeToken, mode: ThemeMode) -> ResolvedColor {
    let [r, g, b, a] = match (mode, token) {
        (ThemeMode::Dark, ThemeToken::Background) => [0x11, 0x11, 0x1b, 0xff],
        _ => token.default_color().to_rgba8(),
    };
    ResolvedColor { r, g, b, a }
}

/// Panel visuals whose fill matches the overlay backdrop.
pub fn overlay_visuals(mode: ThemeMode) -> egui::Visuals {
    let mut v = match mode {
        ThemeMode::Cyan => egui::Visuals::light(),
        ThemeMode::Dark => egui::Visuals::dark(),
    };
    v.panel_fill = resolve(ThemeToken::Background, mode);
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cyan_mode_keeps_canonical_colors() {
        let c = resolve_rgba(ThemeToken::CommentBackground, ThemeMode::Cyan);
        assert_eq!(c, ResolvedColor { r: 0xff, g: 0xff, b: 0xff, a: 0x99 });
    }

    #[test]
    fn dark_mode_only_swaps_backdrop() {
        assert_ne!(
            resolve_rgba(ThemeToken::Background, ThemeMode::Dark),
            resolve_rgba(ThemeToken::Background, ThemeMode::Cyan)
        );
        assert_eq!(
            resolve_rgba(ThemeToken::CommentText, ThemeMode::Dark),
            resolve_rgba(ThemeToken::CommentText, ThemeMode::Cyan)
        );
    }
}
