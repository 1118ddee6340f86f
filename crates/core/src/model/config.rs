use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::timer::Millis;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("rowCount must be at least 1")]
    NoRows,
    #[error("{field} must be a finite number greater than zero, got {value}")]
    NotPositive { field: &'static str, value: f64 },
    #[error("{field} must be a finite number that is not negative, got {value}")]
    Negative { field: &'static str, value: f64 },
    #[error("intervalMs must be at least 1ms, got {0}")]
    IntervalTooShort(f64),
}

/// Shortest accepted driver cadence.
pub const MIN_INTERVAL_MS: Millis = 1.0;

/// Options of one overlay instance. Keys are camelCase on the wire and every
/// key is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DanmakuConfig {
    /// Desired number of lanes. Collapses to 1 for a single-comment source.
    pub row_count: usize,
    /// Viewport width in px. Comments travel `2 × container_width`.
    pub container_width: f64,
    /// Horizontal speed in px/s, shared by every lane.
    pub speed: f64,
    /// Minimum gap in px between consecutive comments in one lane.
    pub space: f64,
    /// Refill the queue when it runs dry and recycle completed comments.
    #[serde(rename = "loop")]
    pub looping: bool,
    /// Cadence of the driver that dequeues comments.
    pub interval_ms: Millis,
    /// Font size in px, used for measuring and drawing alike.
    pub font_size: f64,
    /// Width added to the measured text for the avatar and padding.
    pub avatar_reserve: f64,
    /// Vertical pitch of lanes.
    pub row_height: f64,
    /// Overlay height contributed by each lane.
    pub lane_block_height: f64,
    /// Fixed offset added to every start time.
    pub extra_delay_ms: Millis,
}

impl Default for DanmakuConfig {
    fn default() -> Self {
        Self {
            row_count: 2,
            container_width: 800.0,
            speed: 100.0,
            space: 15.0,
            looping: true,
            interval_ms: 200.0,
            font_size: 12.0,
            avatar_reserve: 30.0,
            row_height: 35.0,
            lane_block_height: 50.0,
            extra_delay_ms: 0.0,
        }
    }
}

impl DanmakuConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.row_count == 0 {
            return Err(ConfigError::NoRows);
        }
        for (field, value) in [
            ("containerWidth", self.container_width),
            ("speed", self.speed),
            ("intervalMs", self.interval_ms),
            ("fontSize", self.font_size),
            ("rowHeight", self.row_height),
            ("laneBlockHeight", self.lane_block_height),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::NotPositive { field, value });
            }
        }
        if self.interval_ms < MIN_INTERVAL_MS {
            return Err(ConfigError::IntervalTooShort(self.interval_ms));
        }
        for (field, value) in [
            ("space", self.space),
            ("avatarReserve", self.avatar_reserve),
            ("extraDelayMs", self.extra_delay_ms),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Negative { field, value });
            }
        }
        Ok(())
    }

    /// Lanes actually used for a source of `source_len` comments.
    pub fn effective_lane_count(&self, source_len: usize) -> usize {
        if source_len == 1 {
            1
        } else {
            self.row_count.max(1)
        }
    }

    /// Time for a comment to travel from `container_width` to `-container_width`.
    pub fn animation_duration_ms(&self) -> Millis {
        2.0 * self.container_width / self.speed * 1000.0
    }

    /// Overlay height in px for `lanes` lanes.
    pub fn overlay_height(&self, lanes: usize) -> f64 {
        lanes as f64 * self.lane_block_height
    }
}
