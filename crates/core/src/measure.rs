//! Text width measurement.
//!
//! Lane timing is only as good as the widths fed into it: a measurer must
//! agree with the font the renderer actually draws with.

use unicode_width::UnicodeWidthStr;

/// Rendered width of a string, in px.
///
/// Implementations must be deterministic and must not panic. When a width
/// cannot be determined they return `0.0`.
pub trait TextMeasurer {
    fn measure(&self, content: &str, font_size: f64) -> f64;
}

impl<T: TextMeasurer + ?Sized> TextMeasurer for &T {
    fn measure(&self, content: &str, font_size: f64) -> f64 {
        (**self).measure(content, font_size)
    }
}

impl<T: TextMeasurer + ?Sized> TextMeasurer for Box<T> {
    fn measure(&self, content: &str, font_size: f64) -> f64 {
        (**self).measure(content, font_size)
    }
}

/// Fixed-advance measurer based on terminal cell widths.
///
/// Each narrow character advances `advance × font_size` px and each wide (CJK,
/// emoji) character twice that, which is exactly how a terminal grid lays the
/// string out when one cell is `advance × font_size` px wide.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceMeasurer {
    /// Narrow-cell advance as a fraction of the font size.
    pub advance: f64,
}

impl MonospaceMeasurer {
    pub const DEFAULT_ADVANCE: f64 = 0.5;

    pub fn new(advance: f64) -> Self {
        Self { advance }
    }

    /// Width in px of one narrow cell at `font_size`.
    pub fn cell_width(&self, font_size: f64) -> f64 {
        self.advance * font_size
    }
}

impl Default for MonospaceMeasurer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ADVANCE)
    }
}

impl TextMeasurer for MonospaceMeasurer {
    fn measure(&self, content: &str, font_size: f64) -> f64 {
        if content.is_empty() || !font_size.is_finite() || font_size <= 0.0 {
            return 0.0;
        }
        let width = content.width() as f64 * self.cell_width(font_size);
        if width.is_finite() { width } else { 0.0 }
    }
}

/// Clamp a raw measurement to a usable width. Negative or non-finite values
/// count as "measurement unavailable".
pub(crate) fn sanitize_width(raw: f64, content: &str) -> f64 {
    if raw.is_finite() && raw >= 0.0 {
        raw
    } else {
        log::warn!("measurement unavailable for {content:?} (got {raw}), treating as 0px");
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrow_and_wide_cells() {
        let m = MonospaceMeasurer::default();
        assert!((m.measure("abcd", 12.0) - 24.0).abs() < 1e-9);
        // Two wide characters → four cells.
        assert!((m.measure("小熊", 12.0) - 24.0).abs() < 1e-9);
        // Full-width colon is wide too.
        assert!((m.measure("a：b", 12.0) - 24.0).abs() < 1e-9);
    }

    #[test]
    fn same_input_same_width() {
        let m = MonospaceMeasurer::default();
        let a = m.measure("粉色系：这是第五条", 12.0);
        let b = m.measure("粉色系：这是第五条", 12.0);
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn unavailable_measures_zero() {
        let m = MonospaceMeasurer::default();
        assert_eq!(m.measure("", 12.0), 0.0);
        assert_eq!(m.measure("text", 0.0), 0.0);
        assert_eq!(m.measure("text", f64::NAN), 0.0);
    }

    #[test]
    fn sanitize_rejects_garbage() {
        assert_eq!(sanitize_width(-3.0, "x"), 0.0);
        assert_eq!(sanitize_width(f64::INFINITY, "x"), 0.0);
        assert_eq!(sanitize_width(42.0, "x"), 42.0);
    }

    #[test]
    fn works_through_references_and_boxes() {
        fn width_of<M: TextMeasurer>(m: M) -> f64 {
            m.measure("ab", 10.0)
        }
        let m = MonospaceMeasurer::default();
        let boxed: Box<dyn TextMeasurer> = Box::new(m);
        assert_eq!(width_of(&m), 10.0);
        assert_eq!(width_of(boxed), 10.0);
    }
}
