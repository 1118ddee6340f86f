use danmaku_core::TextMeasurer;
use danmaku_protocol::{RenderCommand, TextAlign};
use egui::{Align2, Color32, CornerRadius, FontId, Pos2, Rect, Stroke, StrokeKind};

use crate::theme::{self, ThemeMode};

/// Measures with the same proportional egui font the renderer paints with,
/// so lane timing and on-screen widths agree.
#[derive(Clone)]
pub struct EguiMeasurer {
    painter: egui::Painter,
}

impl EguiMeasurer {
    pub fn new(ctx: &egui::Context) -> Self {
        Self {
            painter: egui::Painter::new(
                ctx.clone(),
                egui::LayerId::background(),
                Rect::EVERYTHING,
            ),
        }
    }
}

impl TextMeasurer for EguiMeasurer {
    fn measure(&self, content: &str, font_size: f64) -> f64 {
        if content.is_empty() || !font_size.is_finite() || font_size <= 0.0 {
            return 0.0;
        }
        let galley = self.painter.layout_no_wrap(
            content.to_string(),
            FontId::proportional(font_size as f32),
            Color32::WHITE,
        );
        f64::from(galley.size().x)
    }
}

/// Transform state for PushTransform/PopTransform.
#[derive(Debug, Clone, Copy)]
struct Transform {
    tx: f64,
    ty: f64,
    sx: f64,
    sy: f64,
}

impl Transform {
    fn identity() -> Self {
        Self {
            tx: 0.0,
            ty: 0.0,
            sx: 1.0,
            sy: 1.0,
        }
    }

    fn apply(&self, x: f64, y: f64, offset: Pos2) -> Pos2 {
        Pos2::new(
            (x * self.sx + self.tx) as f32 + offset.x,
            (y * self.sy + self.ty) as f32 + offset.y,
        )
    }

    fn scale(&self, w: f64, h: f64) -> egui::Vec2 {
        egui::vec2((w * self.sx) as f32, (h * self.sy) as f32)
    }
}

/// Render a list of `RenderCommand` into an egui `Painter`.
///
/// `offset` is the top-left pixel position of the overlay. Returns the ids of
/// the comments whose bubble contains `pointer`, if any.
pub fn render_commands(
    painter: &mut egui::Painter,
    commands: &[RenderCommand],
    offset: Pos2,
    mode: ThemeMode,
    pointer: Option<Pos2>,
) -> Vec<u64> {
    let mut transform_stack: Vec<Transform> = vec![Transform::identity()];
    let mut clip_stack: Vec<Rect> = Vec::new();
    let mut hovered = Vec::new();

    for cmd in commands {
        let tf = transform_stack
            .last()
            .copied()
            .unwrap_or(Transform::identity());
        match cmd {
            RenderCommand::DrawRect {
                rect,
                color,
                radius,
                border_color,
                item_id,
            } => {
                let egui_rect = Rect::from_min_size(
                    tf.apply(rect.x, rect.y, offset),
                    tf.scale(rect.w, rect.h),
                );
                if !painter.clip_rect().intersects(egui_rect) {
                    continue;
                }
                let corner =
                    CornerRadius::same((radius * tf.sx.min(tf.sy)).round().clamp(0.0, 255.0) as u8);
                painter.rect_filled(egui_rect, corner, theme::resolve(*color, mode));
                if let Some(bc) = border_color {
                    painter.rect_stroke(
                        egui_rect,
                        corner,
                        Stroke::new(1.0, theme::resolve(*bc, mode)),
                        StrokeKind::Outside,
                    );
                }
                if let (Some(id), Some(p)) = (item_id, pointer) {
                    if egui_rect.contains(p) {
                        hovered.push(*id);
                    }
                }
            }

            RenderCommand::DrawImage {
                rect,
                rounded,
                fallback,
                ..
            } => {
                // Avatars are not fetched; the placeholder stands in.
                let egui_rect = Rect::from_min_size(
                    tf.apply(rect.x, rect.y, offset),
                    tf.scale(rect.w, rect.h),
                );
                let fill = theme::resolve(*fallback, mode);
                let border = Stroke::new(
                    1.0,
                    theme::resolve(danmaku_protocol::ThemeToken::AvatarBorder, mode),
                );
                if *rounded {
                    let r = egui_rect.width().min(egui_rect.height()) / 2.0;
                    painter.circle(egui_rect.center(), r, fill, border);
                } else {
                    painter.rect_filled(egui_rect, CornerRadius::ZERO, fill);
                }
            }

            RenderCommand::DrawText {
                position,
                text,
                color,
                font_size,
                align,
            } => {
                let size = (*font_size * tf.sy) as f32;
                if size < 1.0 {
                    continue;
                }
                let anchor = match align {
                    TextAlign::Left => Align2::LEFT_CENTER,
                    TextAlign::Center => Align2::CENTER_CENTER,
                    TextAlign::Right => Align2::RIGHT_CENTER,
                };
                painter.text(
                    tf.apply(position.x, position.y, offset),
                    anchor,
                    text.as_ref(),
                    FontId::proportional(size),
                    theme::resolve(*color, mode),
                );
            }

            RenderCommand::SetClip { rect } => {
                let clip_rect = Rect::from_min_size(
                    tf.apply(rect.x, rect.y, offset),
                    tf.scale(rect.w, rect.h),
                );
                clip_stack.push(painter.clip_rect());
                let intersected = painter.clip_rect().intersect(clip_rect);
                painter.set_clip_rect(intersected);
            }

            RenderCommand::ClearClip => {
                if let Some(prev) = clip_stack.pop() {
                    painter.set_clip_rect(prev);
                }
            }

            RenderCommand::PushTransform { translate, scale } => {
                let parent = tf;
                transform_stack.push(Transform {
                    tx: parent.tx + translate.x * parent.sx,
                    ty: parent.ty + translate.y * parent.sy,
                    sx: parent.sx * scale.x,
                    sy: parent.sy * scale.y,
                });
            }

            RenderCommand::PopTransform => {
                if transform_stack.len() > 1 {
                    transform_stack.pop();
                }
            }

            RenderCommand::BeginGroup { .. } | RenderCommand::EndGroup => {
                // Groups are semantic, no visual effect in egui
            }
        }
    }

    hovered
}
