use std::collections::VecDeque;

use crate::model::Comment;

/// Pending comments, consumed from the front.
///
/// In loop mode an empty queue refills from the original source and finished
/// comments are recycled onto the tail, so it never runs dry (unless the
/// source itself is empty). In one-shot mode the queue drains once and stays
/// empty.
#[derive(Debug, Clone)]
pub struct PlaybackQueue {
    source: Vec<Comment>,
    pending: VecDeque<Comment>,
    looping: bool,
}

impl PlaybackQueue {
    pub fn new(source: Vec<Comment>, looping: bool) -> Self {
        let pending = source.iter().cloned().collect();
        Self {
            source,
            pending,
            looping,
        }
    }

    /// The next comment to schedule.
    pub fn next(&mut self) -> Option<Comment> {
        if self.pending.is_empty() && self.looping {
            self.pending.extend(self.source.iter().cloned());
        }
        self.pending.pop_front()
    }

    /// Put a finished comment back on the tail. Only loop mode recycles;
    /// returns whether the comment was re-enqueued.
    pub fn recycle(&mut self, comment: Comment) -> bool {
        if self.looping {
            self.pending.push_back(comment);
        }
        self.looping
    }

    /// One-shot mode with nothing left. Terminal.
    pub fn is_drained(&self) -> bool {
        !self.looping && self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn source(&self) -> &[Comment] {
        &self.source
    }
}
