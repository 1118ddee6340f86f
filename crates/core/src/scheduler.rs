//! Lane assignment and start-time computation.
//!
//! A comment occupies its lane from the moment it enters the viewport until
//! its tail has moved `width + space` px, i.e. for
//! `(width + space) / speed` seconds. Because every comment moves at the same
//! speed, a comment that starts no earlier than that can never catch up with
//! its predecessor.

use crate::measure::{TextMeasurer, sanitize_width};
use crate::model::{Comment, DanmakuConfig, LaneTracker, PendingActivation};
use crate::timer::Millis;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommentScheduler {
    pub font_size: f64,
    pub avatar_reserve: f64,
    /// px/s
    pub speed: f64,
    /// px
    pub space: f64,
    pub extra_delay_ms: Millis,
}

impl CommentScheduler {
    pub fn from_config(config: &DanmakuConfig) -> Self {
        Self {
            font_size: config.font_size,
            avatar_reserve: config.avatar_reserve,
            speed: config.speed,
            space: config.space,
            extra_delay_ms: config.extra_delay_ms,
        }
    }

    /// Bubble width: `name：text` at the configured font size plus the avatar
    /// reserve.
    pub fn content_width<M: TextMeasurer + ?Sized>(&self, comment: &Comment, measurer: &M) -> f64 {
        let content = comment.display_text();
        let raw = measurer.measure(&content, self.font_size);
        sanitize_width(raw, &content) + self.avatar_reserve
    }

    /// How long a bubble of `width` px keeps its lane busy, gap included.
    pub fn occupancy_ms(&self, width: f64) -> Millis {
        (width / self.speed + self.space / self.speed) * 1000.0
    }

    /// Pick a lane for `comment`, compute when it may start, and reserve the
    /// lane for its occupancy. The returned activation still has to be armed
    /// by the caller.
    pub fn schedule<M: TextMeasurer + ?Sized>(
        &self,
        comment: Comment,
        now: Millis,
        lanes: &mut LaneTracker,
        measurer: &M,
    ) -> PendingActivation {
        let lane = lanes.pick_lane();
        let width = self.content_width(&comment, measurer);
        let occupancy = self.occupancy_ms(width);

        let available_at = lanes.free_at(lane);
        let start_time = now.max(available_at) + self.extra_delay_ms;
        lanes.reserve(lane, start_time + occupancy);

        log::debug!(
            "scheduled {:?} on lane {lane}: width {width:.1}px, start {start_time:.0}ms (now {now:.0}ms), lane busy until {:.0}ms",
            comment.name.as_str(),
            start_time + occupancy,
        );

        PendingActivation {
            comment,
            lane,
            start_time,
            width,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Measures `name：text` as whatever `text` parses to, so tests can dictate widths.
    struct Scripted;

    impl TextMeasurer for Scripted {
        fn measure(&self, content: &str, _font_size: f64) -> f64 {
            content
                .rsplit('：')
                .next()
                .and_then(|w| w.parse().ok())
                .unwrap_or(0.0)
        }
    }

    struct Broken;

    impl TextMeasurer for Broken {
        fn measure(&self, _content: &str, _font_size: f64) -> f64 {
            f64::NAN
        }
    }

    fn scheduler() -> CommentScheduler {
        CommentScheduler::from_config(&DanmakuConfig {
            speed: 100.0,
            space: 15.0,
            ..DanmakuConfig::default()
        })
    }

    /// A comment whose bubble (text + 30px avatar reserve) is `bubble` px wide.
    fn bubble(bubble: f64) -> Comment {
        Comment::new("a.png", "n", format!("{}", bubble - 30.0))
    }

    #[test]
    fn back_to_back_in_one_lane_are_spaced_by_width_and_gap() {
        let s = scheduler();
        let mut lanes = LaneTracker::new(1);
        let first = s.schedule(bubble(100.0), 0.0, &mut lanes, &Scripted);
        let second = s.schedule(bubble(50.0), 0.0, &mut lanes, &Scripted);
        assert_eq!(first.lane, 0);
        assert_eq!(second.lane, 0);
        assert!((first.width - 100.0).abs() < 1e-9);
        // 100px / 100px/s + 15px / 100px/s = 1.15s
        assert!(second.start_time >= first.start_time + 1_150.0 - 1e-9);
        assert!((lanes.free_at(0) - (second.start_time + 650.0)).abs() < 1e-9);
    }

    #[test]
    fn starts_immediately_on_a_free_lane() {
        let s = scheduler();
        let mut lanes = LaneTracker::new(2);
        let p = s.schedule(bubble(80.0), 5_000.0, &mut lanes, &Scripted);
        assert_eq!(p.start_time, 5_000.0);
    }

    #[test]
    fn spreads_across_lanes_before_queueing() {
        let s = scheduler();
        let mut lanes = LaneTracker::new(2);
        let a = s.schedule(bubble(100.0), 0.0, &mut lanes, &Scripted);
        let b = s.schedule(bubble(100.0), 0.0, &mut lanes, &Scripted);
        let c = s.schedule(bubble(100.0), 0.0, &mut lanes, &Scripted);
        assert_eq!((a.lane, b.lane, c.lane), (0, 1, 0));
        assert_eq!(b.start_time, 0.0);
        assert!((c.start_time - 1_150.0).abs() < 1e-9);
    }

    #[test]
    fn extra_delay_offsets_start() {
        let s = CommentScheduler {
            extra_delay_ms: 250.0,
            ..scheduler()
        };
        let mut lanes = LaneTracker::new(1);
        let p = s.schedule(bubble(40.0), 1_000.0, &mut lanes, &Scripted);
        assert_eq!(p.start_time, 1_250.0);
    }

    #[test]
    fn broken_measurement_falls_back_to_reserve_and_gap() {
        let s = scheduler();
        let mut lanes = LaneTracker::new(1);
        let first = s.schedule(Comment::new("a", "n", "t"), 0.0, &mut lanes, &Broken);
        let second = s.schedule(Comment::new("a", "n", "t"), 0.0, &mut lanes, &Broken);
        assert!((first.width - 30.0).abs() < 1e-9);
        assert!((second.start_time - 450.0).abs() < 1e-9);
    }
}
