use std::io::stdout;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use danmaku_core::svg::render_svg;
use danmaku_core::views::render_overlay;
use danmaku_core::{Engine, MonospaceMeasurer, Phase};
use danmaku_protocol::{RenderCommand, ThemeToken, Viewport};
use ratatui::{
    Terminal,
    backend::{Backend, CrosstermBackend},
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Block,
};
use unicode_width::UnicodeWidthChar;

/// Terminal rows per lane: the bubble row plus a blank separator.
const ROWS_PER_LANE: u16 = 2;
const FRAME: Duration = Duration::from_millis(33);
const AVATAR_GLYPH: char = '●';

/// Alpha-blend a theme color over an opaque backdrop.
fn blend(token: ThemeToken, under: [u8; 3]) -> [u8; 3] {
    let [r, g, b, a] = token.default_color().to_rgba8();
    let a = f32::from(a) / 255.0;
    let mix = |top: u8, bottom: u8| {
        (f32::from(top) * a + f32::from(bottom) * (1.0 - a)).round() as u8
    };
    [mix(r, under[0]), mix(g, under[1]), mix(b, under[2])]
}

fn backdrop() -> [u8; 3] {
    let [r, g, b, _] = ThemeToken::Background.default_color().to_rgba8();
    [r, g, b]
}

fn to_color([r, g, b]: [u8; 3]) -> Color {
    Color::Rgb(r, g, b)
}

/// Maps overlay pixels onto terminal cells.
struct CellPainter<'a> {
    buf: &'a mut Buffer,
    area: Rect,
    /// Width of one terminal cell in overlay px.
    cell_px: f64,
    row_height: f64,
}

impl CellPainter<'_> {
    fn column(&self, x: f64) -> i64 {
        (x / self.cell_px).floor() as i64
    }

    fn row(&self, y: f64) -> Option<u16> {
        let lane = (y / self.row_height).round();
        if lane < 0.0 {
            return None;
        }
        let row = (lane as u16).saturating_mul(ROWS_PER_LANE);
        (row < self.area.height).then_some(self.area.y + row)
    }

    fn cell_x(&self, col: i64, width: u16) -> Option<u16> {
        let col = u16::try_from(col).ok()?;
        (col.checked_add(width)? <= self.area.width).then_some(self.area.x + col)
    }

    fn paint(&mut self, commands: &[RenderCommand]) {
        let mut translates: Vec<(f64, f64)> = vec![(0.0, 0.0)];
        let bubble = blend(ThemeToken::CommentBackground, backdrop());

        for cmd in commands {
            let (tx, ty) = translates.last().copied().unwrap_or((0.0, 0.0));
            match cmd {
                RenderCommand::DrawRect { rect, color, .. } => {
                    let Some(y) = self.row(ty + rect.y) else {
                        continue;
                    };
                    let bg = to_color(blend(*color, backdrop()));
                    let first = self.column(tx + rect.x);
                    let last = self.column(tx + rect.x + rect.w);
                    for col in first..last {
                        if let Some(x) = self.cell_x(col, 1) {
                            self.buf[(x, y)].set_char(' ').set_bg(bg);
                        }
                    }
                }
                RenderCommand::DrawImage { rect, fallback, .. } => {
                    let Some(y) = self.row(ty) else {
                        continue;
                    };
                    if let Some(x) = self.cell_x(self.column(tx + rect.x), 1) {
                        self.buf[(x, y)]
                            .set_char(AVATAR_GLYPH)
                            .set_fg(to_color(blend(*fallback, bubble)));
                    }
                }
                RenderCommand::DrawText {
                    position,
                    text,
                    color,
                    ..
                } => {
                    let Some(y) = self.row(ty) else {
                        continue;
                    };
                    let style = Style::default().fg(to_color(blend(*color, bubble)));
                    let mut col = self.column(tx + position.x);
                    let mut utf8 = [0u8; 4];
                    for ch in text.chars() {
                        let w = ch.width().unwrap_or(0) as u16;
                        if w == 0 {
                            continue;
                        }
                        if let Some(x) = self.cell_x(col, w) {
                            self.buf
                                .set_stringn(x, y, ch.encode_utf8(&mut utf8), usize::from(w), style);
                        }
                        col += i64::from(w);
                    }
                }
                RenderCommand::PushTransform { translate, .. } => {
                    translates.push((tx + translate.x, ty + translate.y));
                }
                RenderCommand::PopTransform => {
                    if translates.len() > 1 {
                        translates.pop();
                    }
                }
                // The frame area is the clip; groups carry no visuals.
                RenderCommand::SetClip { .. }
                | RenderCommand::ClearClip
                | RenderCommand::BeginGroup { .. }
                | RenderCommand::EndGroup => {}
            }
        }
    }
}

/// Render a snapshot of the overlay `at` ms after start as an SVG document.
pub fn snapshot_svg(mut engine: Engine<MonospaceMeasurer>, at: f64) -> String {
    engine.start(0.0);
    engine.advance(at);
    let viewport = Viewport::new(engine.config().container_width, engine.overlay_height());
    let commands = render_overlay(&engine, &viewport, at);
    engine.stop();
    render_svg(&commands, viewport.width, viewport.height)
}

pub fn render_tui(mut engine: Engine<MonospaceMeasurer>) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut engine);

    // Cancel every pending timer before the terminal goes away.
    engine.stop();
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run<B: Backend>(terminal: &mut Terminal<B>, engine: &mut Engine<MonospaceMeasurer>) -> Result<()> {
    let started = Instant::now();
    engine.start(0.0);
    let cell_px = engine.measurer().cell_width(engine.config().font_size);
    let row_height = engine.config().row_height;
    let [br, bg, bb] = backdrop();

    loop {
        let now = started.elapsed().as_secs_f64() * 1000.0;
        for event in engine.advance(now) {
            log::debug!("{event:?}");
        }

        let viewport = Viewport::new(engine.config().container_width, engine.overlay_height());
        let commands = render_overlay(engine, &viewport, now);

        let status = match engine.phase() {
            Phase::Drained if engine.is_quiescent() => "done".to_string(),
            _ => format!(
                "{} on screen | {} waiting | {} queued",
                engine.active().len(),
                engine.pending_count(),
                engine.queued_count()
            ),
        };

        terminal.draw(|frame| {
            let area = frame.area();

            let header_area = Rect::new(0, 0, area.width, 1);
            let header = Block::default()
                .title(format!(" danmaku | {status} | q quit "))
                .style(Style::default().fg(Color::White).bg(Color::DarkGray));
            frame.render_widget(header, header_area);

            let content_area = Rect::new(0, 1, area.width, area.height.saturating_sub(1));
            let block = Block::default().style(Style::default().bg(Color::Rgb(br, bg, bb)));
            frame.render_widget(block, content_area);

            let mut painter = CellPainter {
                buf: frame.buffer_mut(),
                area: content_area,
                cell_px,
                row_height,
            };
            painter.paint(&commands);
        })?;

        let until_deadline = engine
            .next_deadline()
            .map(|d| Duration::from_secs_f64(((d - now) / 1000.0).max(0.0)))
            .unwrap_or(FRAME);
        if event::poll(until_deadline.min(FRAME))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && matches!(key.code, KeyCode::Char('q') | KeyCode::Esc)
        {
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use danmaku_protocol::{Point, TextAlign};

    fn painter(buf: &mut Buffer) -> CellPainter<'_> {
        let area = *buf.area();
        CellPainter {
            buf,
            area,
            cell_px: 6.0,
            row_height: 35.0,
        }
    }

    #[test]
    fn blend_over_backdrop() {
        assert_eq!(blend(ThemeToken::CommentText, [0, 0, 0]), [0x20, 0x1e, 0x1f]);
        let [r, _, _] = blend(ThemeToken::CommentBackground, [0, 0, 0]);
        assert_eq!(r, 153);
    }

    #[test]
    fn lanes_map_to_every_other_row() {
        let mut buf = Buffer::empty(Rect::new(0, 0, 20, 6));
        let p = painter(&mut buf);
        assert_eq!(p.row(0.0), Some(0));
        assert_eq!(p.row(35.0), Some(2));
        assert_eq!(p.row(70.0), Some(4));
        assert_eq!(p.row(105.0), None);
    }

    #[test]
    fn text_is_clipped_at_the_left_edge() {
        let mut buf = Buffer::empty(Rect::new(0, 0, 10, 2));
        let commands = vec![
            RenderCommand::PushTransform {
                translate: Point::new(-12.0, 0.0),
                scale: Point::new(1.0, 1.0),
            },
            RenderCommand::DrawText {
                position: Point::new(0.0, 12.5),
                text: "abcd".into(),
                color: ThemeToken::CommentText,
                font_size: 12.0,
                align: TextAlign::Left,
            },
            RenderCommand::PopTransform,
        ];
        painter(&mut buf).paint(&commands);
        assert_eq!(buf[(0, 0)].symbol(), "c");
        assert_eq!(buf[(1, 0)].symbol(), "d");
    }

    #[test]
    fn wide_characters_take_two_cells() {
        let mut buf = Buffer::empty(Rect::new(0, 0, 10, 2));
        let commands = vec![RenderCommand::DrawText {
            position: Point::new(0.0, 12.5),
            text: "小熊".into(),
            color: ThemeToken::CommentText,
            font_size: 12.0,
            align: TextAlign::Left,
        }];
        painter(&mut buf).paint(&commands);
        assert_eq!(buf[(0, 0)].symbol(), "小");
        assert_eq!(buf[(2, 0)].symbol(), "熊");
    }
}
