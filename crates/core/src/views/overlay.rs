use danmaku_protocol::{
    Point, Rect, RenderCommand, SharedStr, TextAlign, ThemeToken, Viewport,
};

use crate::engine::Engine;
use crate::measure::TextMeasurer;
use crate::model::ActiveComment;
use crate::timer::Millis;

const PADDING: f64 = 5.0;
const AVATAR_SIZE: f64 = 15.0;
const AVATAR_GAP: f64 = 4.0;

/// Height of a comment bubble at `font_size`.
pub fn bubble_height(font_size: f64) -> f64 {
    AVATAR_SIZE.max(font_size) + 2.0 * PADDING
}

/// Render the visible comments of `engine` as they stand at `now`.
///
/// Overlay coordinates are px relative to the viewport origin. Every comment
/// is drawn in local coordinates under a `PushTransform` that carries its
/// animation offset and lane position, grouped per lane, and the whole
/// overlay is clipped to the viewport.
pub fn render_overlay<M: TextMeasurer>(
    engine: &Engine<M>,
    viewport: &Viewport,
    now: Millis,
) -> Vec<RenderCommand> {
    let config = engine.config();
    let animation = engine.animation();
    let mut commands = Vec::with_capacity(2 + engine.active().len() * 6);

    commands.push(RenderCommand::SetClip {
        rect: viewport.rect(),
    });

    for lane in 0..engine.lane_count() {
        commands.push(RenderCommand::BeginGroup {
            id: SharedStr::from(format!("lane-{lane}")),
            label: None,
        });
        let lane_y = lane as f64 * config.row_height;
        for item in engine.active().in_lane(lane) {
            let elapsed = now - item.start_time;
            if elapsed < 0.0 || animation.is_finished(elapsed) {
                continue;
            }
            let x = animation.offset_at(elapsed);
            // Cull bubbles entirely outside the viewport.
            if x + item.width < 0.0 || x > viewport.width {
                continue;
            }
            commands.push(RenderCommand::PushTransform {
                translate: Point::new(viewport.x + x, viewport.y + lane_y),
                scale: Point::new(1.0, 1.0),
            });
            push_bubble(&mut commands, item, config.font_size, engine.measurer());
            commands.push(RenderCommand::PopTransform);
        }
        commands.push(RenderCommand::EndGroup);
    }

    commands.push(RenderCommand::ClearClip);
    commands
}

/// Avatar, `name：` and body laid out left to right on a rounded pill.
fn push_bubble<M: TextMeasurer>(
    commands: &mut Vec<RenderCommand>,
    item: &ActiveComment,
    font_size: f64,
    measurer: &M,
) {
    let height = bubble_height(font_size);
    let mid_y = height / 2.0;

    commands.push(RenderCommand::DrawRect {
        rect: Rect::new(0.0, 0.0, item.width, height),
        color: ThemeToken::CommentBackground,
        radius: height / 2.0,
        border_color: None,
        item_id: Some(item.id),
    });

    commands.push(RenderCommand::DrawImage {
        rect: Rect::new(PADDING, mid_y - AVATAR_SIZE / 2.0, AVATAR_SIZE, AVATAR_SIZE),
        source: item.comment.avatar.clone(),
        rounded: true,
        fallback: ThemeToken::AvatarPlaceholder,
    });

    let name_label = item.comment.name_label();
    let name_x = PADDING + AVATAR_SIZE + AVATAR_GAP;
    let name_width = measurer.measure(&name_label, font_size).max(0.0);

    commands.push(RenderCommand::DrawText {
        position: Point::new(name_x, mid_y),
        text: SharedStr::from(name_label),
        color: ThemeToken::CommentName,
        font_size,
        align: TextAlign::Left,
    });
    commands.push(RenderCommand::DrawText {
        position: Point::new(name_x + name_width, mid_y),
        text: item.comment.text.clone(),
        color: ThemeToken::CommentText,
        font_size,
        align: TextAlign::Left,
    });
}
