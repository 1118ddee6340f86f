pub mod comment;
pub mod config;
pub mod lane;

pub use comment::{ActiveComment, Comment, NAME_SEPARATOR, PendingActivation};
pub use config::{ConfigError, DanmakuConfig, MIN_INTERVAL_MS};
pub use lane::LaneTracker;
