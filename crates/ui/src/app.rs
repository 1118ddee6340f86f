use danmaku_core::parsers::{self, DanmakuFile};
use danmaku_core::views::render_overlay;
use danmaku_core::{DanmakuConfig, Engine, Phase};
use danmaku_protocol::Viewport;
use eframe::egui;

use crate::renderer::{self, EguiMeasurer};
use crate::theme::{self, ThemeMode};

const MARGIN: f32 = 16.0;

/// Settings for the built-in demo: a narrow strip, a bit faster than default.
fn demo_source() -> DanmakuFile {
    DanmakuFile {
        config: DanmakuConfig {
            container_width: 300.0,
            speed: 120.0,
            ..DanmakuConfig::default()
        },
        danmus: parsers::demo_comments(),
    }
}

/// Main application state.
pub struct DanmakuApp {
    source: DanmakuFile,
    engine: Option<Engine<EguiMeasurer>>,
    measurer: EguiMeasurer,
    theme_mode: ThemeMode,
    /// Error message to display.
    error: Option<String>,
}

impl DanmakuApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let theme_mode = ThemeMode::Cyan;
        cc.egui_ctx.set_visuals(theme::overlay_visuals(theme_mode));

        let mut app = Self {
            source: demo_source(),
            engine: None,
            measurer: EguiMeasurer::new(&cc.egui_ctx),
            theme_mode,
            error: None,
        };
        app.restart(now_ms(&cc.egui_ctx));
        app
    }

    /// Tear down the running engine and play `self.source` from the top.
    fn restart(&mut self, now: f64) {
        if let Some(mut old) = self.engine.take() {
            old.stop();
        }
        match Engine::new(
            self.source.config.clone(),
            self.source.danmus.clone(),
            self.measurer.clone(),
        ) {
            Ok(mut engine) => {
                engine.start(now);
                self.engine = Some(engine);
                self.error = None;
            }
            Err(e) => self.error = Some(format!("Invalid options: {e}")),
        }
    }

    fn load_source(&mut self, data: &[u8], now: f64) {
        match parsers::parse_danmaku(data) {
            Ok(file) => {
                log::info!("loaded {} comments", file.danmus.len());
                self.source = file;
                self.restart(now);
            }
            Err(e) => {
                log::warn!("rejected dropped file: {e}");
                self.error = Some(format!("Failed to load: {e}"));
            }
        }
    }

    fn status_line(&self) -> String {
        let Some(engine) = &self.engine else {
            return "Stopped".to_string();
        };
        let phase = match engine.phase() {
            Phase::Idle => "idle",
            Phase::Running => "playing",
            Phase::Drained if engine.is_quiescent() => "finished",
            Phase::Drained => "draining",
            Phase::Stopped => "stopped",
        };
        format!(
            "{} | Lanes: {} | On screen: {} | Waiting: {} | Queued: {}",
            phase,
            engine.lane_count(),
            engine.active().len(),
            engine.pending_count(),
            engine.queued_count(),
        )
    }

    fn take_dropped_file(ctx: &egui::Context) -> Option<Vec<u8>> {
        let file = ctx.input(|i| i.raw.dropped_files.first().cloned())?;
        if let Some(bytes) = &file.bytes {
            return Some(bytes.to_vec());
        }
        #[cfg(not(target_arch = "wasm32"))]
        if let Some(path) = &file.path {
            match std::fs::read(path) {
                Ok(data) => return Some(data),
                Err(e) => log::warn!("failed to read {}: {e}", path.display()),
            }
        }
        None
    }
}

fn now_ms(ctx: &egui::Context) -> f64 {
    ctx.input(|i| i.time) * 1000.0
}

impl eframe::App for DanmakuApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = now_ms(ctx);

        if let Some(data) = Self::take_dropped_file(ctx) {
            self.load_source(&data, now);
        }

        if let Some(engine) = &mut self.engine {
            for event in engine.advance(now) {
                log::debug!("{event:?}");
            }
        }

        // Top toolbar
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("danmaku");
                ui.separator();

                if ui.button("Restart").clicked() {
                    self.restart(now);
                }
                if ui.button("Demo").clicked() {
                    self.source = demo_source();
                    self.restart(now);
                }
                let mut looping = self.source.config.looping;
                if ui.checkbox(&mut looping, "Loop").changed() {
                    self.source.config.looping = looping;
                    self.restart(now);
                }

                ui.separator();

                let theme_label = match self.theme_mode {
                    ThemeMode::Cyan => "Cyan",
                    ThemeMode::Dark => "Dark",
                };
                if ui.button(theme_label).clicked() {
                    self.theme_mode = match self.theme_mode {
                        ThemeMode::Cyan => ThemeMode::Dark,
                        ThemeMode::Dark => ThemeMode::Cyan,
                    };
                    ctx.set_visuals(theme::overlay_visuals(self.theme_mode));
                }
            });
        });

        // Status bar
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if let Some(err) = &self.error {
                    ui.colored_label(egui::Color32::RED, err);
                } else {
                    ui.label(self.status_line());
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(engine) = &self.engine else {
                ui.centered_and_justified(|ui| {
                    ui.label("Drop a comment file (JSON) here");
                });
                return;
            };

            let available = ui.available_rect_before_wrap();
            let viewport = Viewport::new(engine.config().container_width, engine.overlay_height());
            let origin = available.min + egui::vec2(MARGIN, MARGIN);
            let overlay_rect = egui::Rect::from_min_size(
                origin,
                egui::vec2(viewport.width as f32, viewport.height as f32),
            );

            let commands = render_overlay(engine, &viewport, now);
            let mut painter = ui.painter_at(available);
            painter.rect_stroke(
                overlay_rect,
                egui::CornerRadius::ZERO,
                egui::Stroke::new(1.0, ui.visuals().weak_text_color()),
                egui::StrokeKind::Outside,
            );

            let pointer = ui.input(|i| i.pointer.hover_pos());
            let hovered = renderer::render_commands(
                &mut painter,
                &commands,
                origin,
                self.theme_mode,
                pointer,
            );

            // Hover tooltip
            let response = ui.allocate_rect(overlay_rect, egui::Sense::hover());
            if let Some(item) = hovered.last().and_then(|id| engine.active().get(*id)) {
                response.on_hover_text_at_pointer(item.comment.display_text());
            }
        });

        // Keep animating; idle once a one-shot run has fully played out.
        let idle = self.engine.as_ref().is_none_or(Engine::is_quiescent);
        if !idle {
            ctx.request_repaint();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_source_is_valid() {
        let source = demo_source();
        assert!(source.config.validate().is_ok());
        assert_eq!(source.danmus.len(), 5);
        assert_eq!(source.config.container_width, 300.0);
    }
}
