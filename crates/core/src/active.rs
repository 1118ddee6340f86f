use crate::model::{ActiveComment, DanmakuConfig};
use crate::timer::Millis;

/// Linear horizontal motion shared by every comment of an overlay.
///
/// One definition parameterized by offsets and duration; each comment only
/// contributes its own start time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Animation {
    pub from_x: f64,
    pub to_x: f64,
    pub duration_ms: Millis,
}

impl Animation {
    /// Enter at the right edge, leave once fully past the left edge.
    pub fn for_config(config: &DanmakuConfig) -> Self {
        Self {
            from_x: config.container_width,
            to_x: -config.container_width,
            duration_ms: config.animation_duration_ms(),
        }
    }

    /// Horizontal translate after `elapsed` ms, clamped to the end points.
    pub fn offset_at(&self, elapsed: Millis) -> f64 {
        if self.duration_ms <= 0.0 {
            return self.to_x;
        }
        let t = (elapsed / self.duration_ms).clamp(0.0, 1.0);
        self.from_x + (self.to_x - self.from_x) * t
    }

    pub fn is_finished(&self, elapsed: Millis) -> bool {
        elapsed >= self.duration_ms
    }
}

/// Currently visible comments in activation order.
#[derive(Debug, Clone, Default)]
pub struct ActiveSet {
    items: Vec<ActiveComment>,
}

impl ActiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, item: ActiveComment) {
        self.items.push(item);
    }

    pub fn remove(&mut self, id: u64) -> Option<ActiveComment> {
        let idx = self.items.iter().position(|c| c.id == id)?;
        Some(self.items.remove(idx))
    }

    pub fn get(&self, id: u64) -> Option<&ActiveComment> {
        self.items.iter().find(|c| c.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActiveComment> {
        self.items.iter()
    }

    pub fn in_lane(&self, lane: usize) -> impl Iterator<Item = &ActiveComment> {
        self.items.iter().filter(move |c| c.lane == lane)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
