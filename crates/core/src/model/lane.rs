use crate::timer::Millis;

/// Per-lane "free at" timestamps.
///
/// A lane is one horizontal track comments travel along. `free_at[i]` is the
/// moment lane `i` can accept its next comment without the new bubble
/// catching up with the previous one.
#[derive(Debug, Clone, PartialEq)]
pub struct LaneTracker {
    free_at: Vec<Millis>,
}

impl LaneTracker {
    /// `lane_count` is clamped to at least one lane. All lanes start free at 0.
    pub fn new(lane_count: usize) -> Self {
        Self {
            free_at: vec![0.0; lane_count.max(1)],
        }
    }

    pub fn lane_count(&self) -> usize {
        self.free_at.len()
    }

    /// The lane with the smallest `free_at`; ties go to the lowest index.
    pub fn pick_lane(&self) -> usize {
        self.free_at
            .iter()
            .enumerate()
            .fold(0, |best, (i, &t)| if t < self.free_at[best] { i } else { best })
    }

    /// When `lane` next becomes free. Out-of-range lanes read as 0.
    pub fn free_at(&self, lane: usize) -> Millis {
        self.free_at.get(lane).copied().unwrap_or(0.0)
    }

    /// Mark `lane` occupied until `until`. Out-of-range lanes are ignored.
    pub fn reserve(&mut self, lane: usize, until: Millis) {
        if let Some(slot) = self.free_at.get_mut(lane) {
            *slot = until;
        }
    }

    /// Free every lane again.
    pub fn reset(&mut self) {
        self.free_at.iter_mut().for_each(|t| *t = 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_free_picks_lane_zero() {
        let lanes = LaneTracker::new(4);
        assert_eq!(lanes.pick_lane(), 0);
    }

    #[test]
    fn picks_minimum_free_at() {
        let mut lanes = LaneTracker::new(3);
        lanes.reserve(0, 500.0);
        lanes.reserve(1, 200.0);
        lanes.reserve(2, 300.0);
        assert_eq!(lanes.pick_lane(), 1);
    }

    #[test]
    fn ties_go_to_lowest_index() {
        let mut lanes = LaneTracker::new(3);
        lanes.reserve(0, 900.0);
        lanes.reserve(1, 400.0);
        lanes.reserve(2, 400.0);
        assert_eq!(lanes.pick_lane(), 1);
    }

    #[test]
    fn zero_lanes_clamps_to_one() {
        let lanes = LaneTracker::new(0);
        assert_eq!(lanes.lane_count(), 1);
        assert_eq!(lanes.pick_lane(), 0);
    }

    #[test]
    fn reset_frees_everything() {
        let mut lanes = LaneTracker::new(2);
        lanes.reserve(0, 100.0);
        lanes.reserve(1, 50.0);
        lanes.reset();
        assert_eq!(lanes.free_at(0), 0.0);
        assert_eq!(lanes.pick_lane(), 0);
    }
}
