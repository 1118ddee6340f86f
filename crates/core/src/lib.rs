//! Lane scheduling and overlay layout for scrolling "bullet comments".
//!
//! ```text
//!   PlaybackQueue ──▶ CommentScheduler ──▶ activation timer ──▶ ActiveSet ──▶ render_overlay ──▶ RenderCommand[]
//!        ▲              (TextMeasurer,                              │
//!        └──── recycle ── LaneTracker)  ◀──── completion timer ─────┘
//! ```
//!
//! [`Engine`] owns one overlay instance; hosts drive it with
//! [`Engine::advance`] and draw the output of [`views::render_overlay`].

pub mod active;
pub mod engine;
pub mod measure;
pub mod model;
pub mod parsers;
pub mod queue;
pub mod scheduler;
pub mod svg;
pub mod timer;
pub mod views;

pub use engine::{DanmakuEvent, Engine, Phase};
pub use measure::{MonospaceMeasurer, TextMeasurer};
pub use model::{ActiveComment, Comment, ConfigError, DanmakuConfig};
pub use timer::Millis;
