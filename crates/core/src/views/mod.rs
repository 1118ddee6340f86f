pub mod overlay;

pub use overlay::{bubble_height, render_overlay};
