//! SVG renderer: converts `RenderCommand` lists into standalone SVG strings.

use danmaku_protocol::{Color, RenderCommand, TextAlign, ThemeToken};

/// Render a list of commands as an SVG document string.
///
/// `width` and `height` define the SVG viewBox dimensions. Transforms are
/// applied while emitting, so the output has no nested `<g transform>`.
pub fn render_svg(commands: &[RenderCommand], width: f64, height: f64) -> String {
    let mut svg = String::with_capacity(commands.len() * 160);
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {width} {height}" width="{width}" height="{height}" style="font-family:Arial,sans-serif">"#,
    ));
    svg.push_str(&format!(
        r#"<rect width="{width}" height="{height}" {}/>"#,
        fill_attrs(ThemeToken::Background),
    ));

    // (tx, ty, sx, sy)
    let mut transforms: Vec<(f64, f64, f64, f64)> = vec![(0.0, 0.0, 1.0, 1.0)];
    let mut clip_count = 0usize;
    let mut open_clips = 0usize;

    for cmd in commands {
        let (tx, ty, sx, sy) = transforms.last().copied().unwrap_or((0.0, 0.0, 1.0, 1.0));
        match cmd {
            RenderCommand::DrawRect {
                rect,
                color,
                radius,
                border_color,
                ..
            } => {
                let stroke = border_color
                    .map(|bc| format!(r#" stroke="{}""#, rgb_hex(bc.default_color())))
                    .unwrap_or_default();
                svg.push_str(&format!(
                    r#"<rect x="{}" y="{}" width="{}" height="{}" rx="{}" {}{stroke}/>"#,
                    tx + rect.x * sx,
                    ty + rect.y * sy,
                    rect.w * sx,
                    rect.h * sy,
                    radius * sx.min(sy),
                    fill_attrs(*color),
                ));
            }
            RenderCommand::DrawImage {
                rect,
                source,
                rounded,
                fallback,
            } => {
                let (x, y, w, h) = (tx + rect.x * sx, ty + rect.y * sy, rect.w * sx, rect.h * sy);
                // Placeholder underneath; a broken image leaves it visible.
                if *rounded {
                    svg.push_str(&format!(
                        r#"<ellipse cx="{}" cy="{}" rx="{}" ry="{}" {}/>"#,
                        x + w / 2.0,
                        y + h / 2.0,
                        w / 2.0,
                        h / 2.0,
                        fill_attrs(*fallback),
                    ));
                } else {
                    svg.push_str(&format!(
                        r#"<rect x="{x}" y="{y}" width="{w}" height="{h}" {}/>"#,
                        fill_attrs(*fallback),
                    ));
                }
                let clip = if *rounded {
                    r#" style="clip-path:circle(50%)""#
                } else {
                    ""
                };
                svg.push_str(&format!(
                    r#"<image x="{x}" y="{y}" width="{w}" height="{h}" href="{}"{clip}/>"#,
                    escape_xml(source),
                ));
            }
            RenderCommand::DrawText {
                text,
                position,
                color,
                font_size,
                align,
            } => {
                let anchor = match align {
                    TextAlign::Left => "start",
                    TextAlign::Center => "middle",
                    TextAlign::Right => "end",
                };
                svg.push_str(&format!(
                    r#"<text x="{}" y="{}" font-size="{}" text-anchor="{anchor}" dominant-baseline="central" {}>{}</text>"#,
                    tx + position.x * sx,
                    ty + position.y * sy,
                    font_size * sy,
                    fill_attrs(*color),
                    escape_xml(text),
                ));
            }
            RenderCommand::SetClip { rect } => {
                let id = format!("clip{clip_count}");
                clip_count += 1;
                open_clips += 1;
                svg.push_str(&format!(
                    r#"<clipPath id="{id}"><rect x="{}" y="{}" width="{}" height="{}"/></clipPath><g clip-path="url(#{id})">"#,
                    tx + rect.x * sx,
                    ty + rect.y * sy,
                    rect.w * sx,
                    rect.h * sy,
                ));
            }
            RenderCommand::ClearClip => {
                if open_clips > 0 {
                    open_clips -= 1;
                    svg.push_str("</g>");
                }
            }
            RenderCommand::PushTransform { translate, scale } => {
                transforms.push((
                    tx + translate.x * sx,
                    ty + translate.y * sy,
                    sx * scale.x,
                    sy * scale.y,
                ));
            }
            RenderCommand::PopTransform => {
                if transforms.len() > 1 {
                    transforms.pop();
                }
            }
            // Groups are semantic only.
            RenderCommand::BeginGroup { .. } | RenderCommand::EndGroup => {}
        }
    }

    for _ in 0..open_clips {
        svg.push_str("</g>");
    }
    svg.push_str("</svg>");
    svg
}

fn rgb_hex(color: Color) -> String {
    let [r, g, b, _] = color.to_rgba8();
    format!("#{r:02x}{g:02x}{b:02x}")
}

fn fill_attrs(token: ThemeToken) -> String {
    let color = token.default_color();
    let [_, _, _, a] = color.to_rgba8();
    if a == 0xff {
        format!(r#"fill="{}""#, rgb_hex(color))
    } else {
        format!(
            r#"fill="{}" fill-opacity="{:.2}""#,
            rgb_hex(color),
            f64::from(a) / 255.0
        )
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
