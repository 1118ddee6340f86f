use danmaku_protocol::SharedStr;
use serde::{Deserialize, Serialize};

use crate::timer::Millis;

/// Separator drawn between a commenter's name and the comment body.
pub const NAME_SEPARATOR: &str = "：";

/// One source comment. Immutable once supplied; unknown fields (such as a
/// host-side `id`) are ignored when deserializing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Avatar image URL.
    pub avatar: SharedStr,
    pub name: SharedStr,
    pub text: SharedStr,
}

impl Comment {
    pub fn new(
        avatar: impl Into<SharedStr>,
        name: impl Into<SharedStr>,
        text: impl Into<SharedStr>,
    ) -> Self {
        Self {
            avatar: avatar.into(),
            name: name.into(),
            text: text.into(),
        }
    }

    /// `name：` as drawn in front of the body.
    pub fn name_label(&self) -> String {
        format!("{}{NAME_SEPARATOR}", self.name)
    }

    /// The full string that is measured for lane timing: `name：text`.
    pub fn display_text(&self) -> String {
        format!("{}{NAME_SEPARATOR}{}", self.name, self.text)
    }
}

/// A comment that has been measured and given a lane and start time, but whose
/// activation timer has not fired yet.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingActivation {
    pub comment: Comment,
    pub lane: usize,
    /// When the comment enters the viewport (ms).
    pub start_time: Millis,
    /// Bubble width in px: measured text plus the avatar reserve.
    pub width: f64,
}

/// A visible, animating comment.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveComment {
    /// Unique among the currently active comments of one engine.
    pub id: u64,
    pub comment: Comment,
    pub lane: usize,
    pub start_time: Millis,
    pub width: f64,
}

impl ActiveComment {
    pub fn from_pending(id: u64, pending: PendingActivation) -> Self {
        Self {
            id,
            comment: pending.comment,
            lane: pending.lane,
            start_time: pending.start_time,
            width: pending.width,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_text_joins_with_fullwidth_colon() {
        let c = Comment::new("https://i.pravatar.cc/40", "小熊2", "第三条");
        assert_eq!(c.display_text(), "小熊2：第三条");
        assert_eq!(c.name_label(), "小熊2：");
    }

    #[test]
    fn ignores_host_id_field() {
        let json = r#"{"id": 3, "avatar": "a.png", "name": "n", "text": "t"}"#;
        let c: Comment = serde_json::from_str(json).expect("comment json");
        assert_eq!(c, Comment::new("a.png", "n", "t"));
    }
}
