use serde::{Deserialize, Serialize};

use crate::types::Color;

/// Semantic color tokens resolved by the renderer's active theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThemeToken {
    /// Area behind the overlay. Hosts usually paint their own.
    Background,
    /// Semi-opaque rounded pill behind each comment.
    CommentBackground,
    /// The `name：` label.
    CommentName,
    /// The comment body.
    CommentText,
    AvatarBorder,
    /// Drawn when an avatar image is unavailable.
    AvatarPlaceholder,
}

impl ThemeToken {
    /// Canonical colors of the overlay. Frontends may map tokens elsewhere,
    /// but these match the reference look.
    pub fn default_color(self) -> Color {
        match self {
            Self::Background => Color::from_rgba8(0x00, 0x8b, 0x8b, 0xff), // darkcyan
            Self::CommentBackground => Color::from_rgba8(0xff, 0xff, 0xff, 0x99),
            Self::CommentName => Color::from_rgba8(0x20, 0x1e, 0x1f, 0x99),
            Self::CommentText => Color::from_rgba8(0x20, 0x1e, 0x1f, 0xff),
            Self::AvatarBorder => Color::from_rgba8(0xff, 0xff, 0xff, 0x99),
            Self::AvatarPlaceholder => Color::from_rgba8(0xb0, 0xb0, 0xb0, 0xff),
        }
    }
}
