//! One overlay instance: queue, lanes, timers, and the visible set.
//!
//! Three kinds of one-shot timers share a single [`TimerQueue`]:
//!
//! ```text
//!   Drive ──▶ dequeue + schedule ──▶ Activate(start) ──▶ Complete(start + duration)
//!     └── re-armed every interval_ms                         └── recycle (loop mode)
//! ```
//!
//! The host calls [`Engine::advance`] from its event loop. Handlers run with
//! the timer's own deadline as "now", so a late `advance` replays exactly what
//! an on-time one would have done.

use serde::Serialize;

use crate::active::{ActiveSet, Animation};
use crate::measure::TextMeasurer;
use crate::model::{ActiveComment, Comment, ConfigError, DanmakuConfig, LaneTracker, PendingActivation};
use crate::queue::PlaybackQueue;
use crate::scheduler::CommentScheduler;
use crate::timer::{Millis, TimerHandle, TimerQueue, later_by};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// Built but not started.
    Idle,
    /// The driver is dequeuing comments.
    Running,
    /// One-shot source exhausted; in-flight comments still play out.
    Drained,
    /// Torn down. Nothing fires anymore.
    Stopped,
}

/// What happened during one [`Engine::advance`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DanmakuEvent {
    #[serde(rename_all = "camelCase")]
    Activated { id: u64, lane: usize, start_time: Millis },
    Completed { id: u64, recycled: bool },
    Drained,
}

#[derive(Debug)]
enum TimerEvent {
    Drive,
    Activate(PendingActivation),
    Complete(u64),
}

#[derive(Debug)]
pub struct Engine<M: TextMeasurer> {
    config: DanmakuConfig,
    scheduler: CommentScheduler,
    animation: Animation,
    lanes: LaneTracker,
    queue: PlaybackQueue,
    active: ActiveSet,
    timers: TimerQueue<TimerEvent>,
    driver: Option<TimerHandle>,
    pending_activations: usize,
    next_id: u64,
    phase: Phase,
    measurer: M,
}

impl<M: TextMeasurer> Engine<M> {
    pub fn new(
        config: DanmakuConfig,
        comments: Vec<Comment>,
        measurer: M,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let lane_count = config.effective_lane_count(comments.len());
        Ok(Self {
            scheduler: CommentScheduler::from_config(&config),
            animation: Animation::for_config(&config),
            lanes: LaneTracker::new(lane_count),
            queue: PlaybackQueue::new(comments, config.looping),
            active: ActiveSet::new(),
            timers: TimerQueue::new(),
            driver: None,
            pending_activations: 0,
            next_id: 0,
            phase: Phase::Idle,
            measurer,
            config,
        })
    }

    /// Arm the driver; the first comment is dequeued one interval after `now`.
    /// No-op unless the engine is idle.
    pub fn start(&mut self, now: Millis) {
        if self.phase != Phase::Idle {
            return;
        }
        if !now.is_finite() {
            log::warn!("ignoring start at non-finite time {now}");
            return;
        }
        log::info!(
            "danmaku started: {} comments, {} lanes, {}px/s, loop={}",
            self.queue.source().len(),
            self.lanes.lane_count(),
            self.config.speed,
            self.config.looping,
        );
        self.phase = Phase::Running;
        self.driver = Some(
            self.timers
                .schedule_at(later_by(now, self.config.interval_ms), TimerEvent::Drive),
        );
    }

    /// Fire every timer due at or before `now`, in deadline order.
    pub fn advance(&mut self, now: Millis) -> Vec<DanmakuEvent> {
        let mut events = Vec::new();
        if self.phase == Phase::Stopped {
            return events;
        }
        if !now.is_finite() {
            log::warn!("ignoring advance to non-finite time {now}");
            return events;
        }
        while let Some(fired) = self.timers.pop_due(now) {
            log::trace!("timer {:?} fired at {:.0}ms", fired.handle, fired.at);
            match fired.payload {
                TimerEvent::Drive => self.on_drive(fired.at, &mut events),
                TimerEvent::Activate(pending) => self.on_activate(pending, &mut events),
                TimerEvent::Complete(id) => self.on_complete(id, &mut events),
            }
        }
        events
    }

    /// Tear down: cancel the driver, every pending activation, and every
    /// completion timer, and clear the visible set. Idempotent.
    pub fn stop(&mut self) {
        if self.phase == Phase::Stopped {
            return;
        }
        let cancelled = self.timers.cancel_all();
        log::info!(
            "danmaku stopped: cancelled {cancelled} timers ({} pending activations), dropped {} active comments",
            self.pending_activations,
            self.active.len(),
        );
        self.driver = None;
        self.pending_activations = 0;
        self.active.clear();
        self.lanes.reset();
        self.phase = Phase::Stopped;
    }

    fn on_drive(&mut self, at: Millis, events: &mut Vec<DanmakuEvent>) {
        self.driver = None;
        if let Some(comment) = self.queue.next() {
            let pending = self
                .scheduler
                .schedule(comment, at, &mut self.lanes, &self.measurer);
            self.timers
                .schedule_at(pending.start_time, TimerEvent::Activate(pending));
            self.pending_activations += 1;
        }
        if self.queue.is_drained() {
            log::info!("danmaku source drained at {at:.0}ms");
            self.phase = Phase::Drained;
            events.push(DanmakuEvent::Drained);
            return;
        }
        self.driver = Some(
            self.timers
                .schedule_at(later_by(at, self.config.interval_ms), TimerEvent::Drive),
        );
    }

    fn on_activate(&mut self, pending: PendingActivation, events: &mut Vec<DanmakuEvent>) {
        self.pending_activations = self.pending_activations.saturating_sub(1);
        let id = self.next_id;
        self.next_id += 1;
        let item = ActiveComment::from_pending(id, pending);
        let ends_at = item.start_time + self.animation.duration_ms;
        events.push(DanmakuEvent::Activated {
            id,
            lane: item.lane,
            start_time: item.start_time,
        });
        self.active.insert(item);
        self.timers.schedule_at(ends_at, TimerEvent::Complete(id));
    }

    fn on_complete(&mut self, id: u64, events: &mut Vec<DanmakuEvent>) {
        let Some(item) = self.active.remove(id) else {
            return;
        };
        let recycled = self.queue.recycle(item.comment);
        events.push(DanmakuEvent::Completed { id, recycled });
    }

    pub fn config(&self) -> &DanmakuConfig {
        &self.config
    }

    pub fn animation(&self) -> &Animation {
        &self.animation
    }

    pub fn active(&self) -> &ActiveSet {
        &self.active
    }

    pub fn measurer(&self) -> &M {
        &self.measurer
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.lane_count()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether the periodic driver is armed.
    pub fn is_driving(&self) -> bool {
        self.driver.is_some_and(|h| self.timers.is_armed(h))
    }

    /// Comments that were scheduled but have not become visible yet.
    ///
    /// In loop mode the driver keeps dequeuing every `interval_ms` even when
    /// all lanes are booked, so this grows without bound whenever the source
    /// arrives faster than the lanes drain. Hosts that care can watch it and
    /// lower the cadence or add lanes.
    pub fn pending_count(&self) -> usize {
        self.pending_activations
    }

    /// Comments waiting in the playback queue.
    pub fn queued_count(&self) -> usize {
        self.queue.len()
    }

    /// Overlay height in px.
    pub fn overlay_height(&self) -> f64 {
        self.config.overlay_height(self.lane_count())
    }

    /// Nothing visible, nothing pending, and nothing more will come.
    pub fn is_quiescent(&self) -> bool {
        match self.phase {
            Phase::Stopped => true,
            Phase::Drained => self.pending_activations == 0 && self.active.is_empty(),
            Phase::Idle | Phase::Running => false,
        }
    }

    /// When the next timer is due, so hosts can sleep until then.
    pub fn next_deadline(&mut self) -> Option<Millis> {
        self.timers.next_deadline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::MonospaceMeasurer;

    fn comments(n: usize) -> Vec<Comment> {
        (0..n)
            .map(|i| Comment::new("a.png", format!("user{i}"), "hello"))
            .collect()
    }

    fn engine(n: usize, config: DanmakuConfig) -> Engine<MonospaceMeasurer> {
        Engine::new(config, comments(n), MonospaceMeasurer::default()).expect("valid config")
    }

    fn activations(events: &[DanmakuEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, DanmakuEvent::Activated { .. }))
            .count()
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = DanmakuConfig {
            speed: -5.0,
            ..DanmakuConfig::default()
        };
        assert!(Engine::new(config, comments(2), MonospaceMeasurer::default()).is_err());
    }

    #[test]
    fn nothing_happens_before_start() {
        let mut e = engine(3, DanmakuConfig::default());
        assert!(e.advance(10_000.0).is_empty());
        assert_eq!(e.phase(), Phase::Idle);
    }

    #[test]
    fn first_comment_activates_one_interval_after_start() {
        let mut e = engine(3, DanmakuConfig::default());
        e.start(1_000.0);
        assert!(e.advance(1_199.0).is_empty());
        let events = e.advance(1_200.0);
        assert_eq!(
            events,
            vec![DanmakuEvent::Activated {
                id: 0,
                lane: 0,
                start_time: 1_200.0
            }]
        );
        assert_eq!(e.active().len(), 1);
    }

    #[test]
    fn single_comment_uses_one_lane() {
        let e = engine(1, DanmakuConfig::default());
        assert_eq!(e.lane_count(), 1);
        assert!((e.overlay_height() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn stop_cancels_pending_activations() {
        let config = DanmakuConfig {
            row_count: 1,
            ..DanmakuConfig::default()
        };
        let mut e = engine(5, config);
        e.start(0.0);
        // Several drives fire; one lane means later comments wait for it.
        e.advance(1_000.0);
        assert!(e.pending_count() > 0);
        assert!(e.is_driving());
        e.stop();
        assert_eq!(e.phase(), Phase::Stopped);
        assert!(!e.is_driving());
        assert_eq!(e.pending_count(), 0);
        assert!(e.active().is_empty());
        assert!(e.next_deadline().is_none());
        assert!(e.advance(1_000_000.0).is_empty());
        assert!(e.is_quiescent());
    }

    #[test]
    fn one_shot_reaches_quiescence() {
        let config = DanmakuConfig {
            looping: false,
            container_width: 300.0,
            ..DanmakuConfig::default()
        };
        let mut e = engine(3, config);
        e.start(0.0);
        // Dequeued at 200/400/600; the third waits for lane 0 until 1370ms.
        let events = e.advance(2_000.0);
        assert_eq!(activations(&events), 3);
        assert!(events.contains(&DanmakuEvent::Drained));
        assert_eq!(e.phase(), Phase::Drained);
        assert!(!e.is_driving());
        assert!(!e.is_quiescent());

        let events = e.advance(60_000.0);
        assert_eq!(activations(&events), 0);
        assert!(events.iter().all(|ev| matches!(
            ev,
            DanmakuEvent::Completed {
                recycled: false,
                ..
            }
        )));
        assert!(e.is_quiescent());
        assert!(e.advance(600_000.0).is_empty());
    }

    #[test]
    fn loop_recycles_completed_comments() {
        let config = DanmakuConfig {
            container_width: 100.0,
            ..DanmakuConfig::default()
        };
        let mut e = engine(2, config);
        e.start(0.0);
        let events = e.advance(10_000.0);
        assert!(events.contains(&DanmakuEvent::Completed {
            id: 0,
            recycled: true
        }));
        assert_ne!(e.phase(), Phase::Drained);
    }

    #[test]
    fn ids_are_not_reused_while_active() {
        let mut e = engine(4, DanmakuConfig::default());
        e.start(0.0);
        e.advance(5_000.0);
        let mut ids: Vec<u64> = e.active().iter().map(|c| c.id).collect();
        let before = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), before);
    }

    #[test]
    fn empty_source_idles() {
        let mut e = engine(0, DanmakuConfig::default());
        e.start(0.0);
        assert!(e.advance(10_000.0).is_empty());
        assert_eq!(e.phase(), Phase::Running);

        let mut once = engine(
            0,
            DanmakuConfig {
                looping: false,
                ..DanmakuConfig::default()
            },
        );
        once.start(0.0);
        assert_eq!(once.advance(200.0), vec![DanmakuEvent::Drained]);
        assert!(once.is_quiescent());
    }

    #[test]
    fn driver_advances_at_large_timestamps() {
        // At 1e16 ms one ulp is 2 ms, so a 1 ms cadence rounds back to `at`.
        let config = DanmakuConfig {
            interval_ms: 1.0,
            ..DanmakuConfig::default()
        };
        let mut e = engine(3, config);
        let t0 = 1e16;
        e.start(t0);
        let events = e.advance(t0 + 100.0);
        assert!(activations(&events) > 0);
        assert!(e.next_deadline().is_some_and(|d| d > t0 + 100.0));
    }

    #[test]
    fn non_finite_times_are_ignored() {
        let mut e = engine(2, DanmakuConfig::default());
        e.start(f64::NAN);
        assert_eq!(e.phase(), Phase::Idle);
        e.start(0.0);
        assert!(e.advance(f64::INFINITY).is_empty());
        assert!(e.is_driving());
        assert_eq!(activations(&e.advance(200.0)), 1);
    }

    #[test]
    fn start_twice_is_a_no_op() {
        let mut e = engine(2, DanmakuConfig::default());
        e.start(0.0);
        e.start(50.0);
        assert_eq!(activations(&e.advance(200.0)), 1);
    }
}
