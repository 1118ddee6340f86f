use serde::{Deserialize, Serialize};

use crate::shared_str::SharedStr;
use crate::theme::ThemeToken;
use crate::types::{Point, Rect};

/// A single, stateless render instruction.
///
/// The core emits a `Vec<RenderCommand>` per frame. Renderers consume
/// this list sequentially; each command carries all the data it needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RenderCommand {
    /// Draw a filled rectangle with rounded corners (`radius` 0 = square),
    /// optionally outlined, tagged with the active comment it belongs to.
    DrawRect {
        rect: Rect,
        color: ThemeToken,
        radius: f64,
        border_color: Option<ThemeToken>,
        item_id: Option<u64>,
    },

    /// Draw a text string. `position` is the left/center/right anchor on the
    /// vertical center line of the text.
    DrawText {
        position: Point,
        text: SharedStr,
        color: ThemeToken,
        font_size: f64,
        align: TextAlign,
    },

    /// Draw an image referenced by URL. Renderers that cannot load it fill
    /// `rect` with `fallback` instead.
    DrawImage {
        rect: Rect,
        source: SharedStr,
        rounded: bool,
        fallback: ThemeToken,
    },

    /// Restrict subsequent drawing to a rectangular region.
    SetClip { rect: Rect },

    /// Remove the active clip region.
    ClearClip,

    /// Push an affine transform (applied to all subsequent commands until
    /// the matching `PopTransform`).
    PushTransform { translate: Point, scale: Point },

    /// Pop the most recent transform.
    PopTransform,

    /// Begin a logical group (e.g. a lane). Renderers may use this for
    /// batching, layer separation, or accessibility.
    BeginGroup {
        id: SharedStr,
        label: Option<SharedStr>,
    },

    /// End the current group.
    EndGroup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_externally_tagged() {
        let cmd = RenderCommand::DrawText {
            position: Point::new(1.0, 2.0),
            text: "hi".into(),
            color: ThemeToken::CommentText,
            font_size: 12.0,
            align: TextAlign::Left,
        };
        let json = serde_json::to_string(&cmd).unwrap_or_default();
        assert!(json.starts_with("{\"DrawText\""), "{json}");
        assert!(json.contains("\"CommentText\""));
    }
}
