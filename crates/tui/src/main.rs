mod renderer;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use danmaku_core::parsers::{DanmakuFile, demo_comments, parse_danmaku};
use danmaku_core::{DanmakuConfig, Engine, MonospaceMeasurer};

/// Scrolling bullet comments in the terminal.
#[derive(Debug, Parser)]
#[command(name = "danmaku", version)]
struct Args {
    /// Comment file: a JSON array of {avatar, name, text} or an object with a
    /// "danmus" array and options. Plays a built-in demo when omitted.
    file: Option<PathBuf>,

    /// Number of lanes.
    #[arg(long)]
    rows: Option<usize>,

    /// Speed in px/s (one terminal cell is 6px at the default font size).
    #[arg(long)]
    speed: Option<f64>,

    /// Gap between comments in a lane, in px.
    #[arg(long)]
    space: Option<f64>,

    /// Viewport width in px. Defaults to the terminal width.
    #[arg(long)]
    width: Option<f64>,

    /// Play the source once instead of looping.
    #[arg(long)]
    once: bool,

    /// Write an SVG snapshot instead of running interactively.
    #[arg(long, value_name = "OUT")]
    svg: Option<PathBuf>,

    /// Snapshot time in ms after start (with --svg).
    #[arg(long, default_value_t = 3_000.0, requires = "svg")]
    at: f64,
}

impl Args {
    fn apply(&self, config: &mut DanmakuConfig) {
        if let Some(rows) = self.rows {
            config.row_count = rows;
        }
        if let Some(speed) = self.speed {
            config.speed = speed;
        }
        if let Some(space) = self.space {
            config.space = space;
        }
        if let Some(width) = self.width {
            config.container_width = width;
        }
        if self.once {
            config.looping = false;
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let DanmakuFile { mut config, danmus } = match &args.file {
        Some(path) => {
            let data = std::fs::read(path)
                .with_context(|| format!("reading {}", path.display()))?;
            parse_danmaku(&data).with_context(|| format!("parsing {}", path.display()))?
        }
        None => DanmakuFile {
            config: DanmakuConfig::default(),
            danmus: demo_comments(),
        },
    };
    args.apply(&mut config);

    let measurer = MonospaceMeasurer::default();
    if let Some(out) = &args.svg {
        let engine = Engine::new(config, danmus, measurer)?;
        let svg = renderer::snapshot_svg(engine, args.at);
        std::fs::write(out, svg).with_context(|| format!("writing {}", out.display()))?;
        return Ok(());
    }

    if args.width.is_none() {
        let (cols, _) = crossterm::terminal::size()?;
        config.container_width = f64::from(cols) * measurer.cell_width(config.font_size);
    }
    let engine = Engine::new(config, danmus, measurer)?;
    renderer::render_tui(engine)
}
