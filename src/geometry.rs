//! # Geometry and Unit Model
//!
//! Labels are designed in inches and printed in device dots. This module owns
//! the conversion between the two, plus the safe-drawable rectangle math that
//! every layout decision flows through.
//!
//! ```text
//! ┌────────────────── media ──────────────────┐
//! │ bleed                                     │
//! │  ┌─────────────────────────────────────┐  │
//! │  │ safe margin                         │  │
//! │  │  ┌───────────────────────────────┐  │  │
//! │  │  │     safe-drawable rect        │  │  │
//! │  │  └───────────────────────────────┘  │  │
//! │  └─────────────────────────────────────┘  │
//! └───────────────────────────────────────────┘
//! ```
//!
//! Everything here is pure. Malformed input (negative sizes, NaN) is a
//! precondition violation caught by profile validation, never here.

use serde::{Deserialize, Serialize};

/// PDF points per inch.
pub const POINTS_PER_INCH: f64 = 72.0;

/// Convert inches to device dots at the given resolution.
///
/// Rounds to the nearest dot; a coordinate is always a whole dot.
#[inline]
pub fn in_to_dots(inches: f64, dpi: u32) -> i64 {
    (inches * dpi as f64).round() as i64
}

/// Convert inches to PDF points.
#[inline]
pub fn in_to_pt(inches: f64) -> f64 {
    inches * POINTS_PER_INCH
}

/// A rectangle in inches, origin at the top-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RectIn {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl RectIn {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    /// Whether `other` lies fully inside this rectangle.
    ///
    /// A small epsilon absorbs floating-point noise from repeated inset
    /// arithmetic; it is far below one device dot at any supported DPI.
    pub fn contains(&self, other: &RectIn) -> bool {
        const EPS: f64 = 1e-6;
        other.x + EPS >= self.x
            && other.y + EPS >= self.y
            && other.right() <= self.right() + EPS
            && other.bottom() <= self.bottom() + EPS
    }

    /// Convert to device dots.
    pub fn to_dots(&self, dpi: u32) -> DotRect {
        DotRect {
            x: in_to_dots(self.x, dpi),
            y: in_to_dots(self.y, dpi),
            w: in_to_dots(self.w, dpi),
            h: in_to_dots(self.h, dpi),
        }
    }
}

/// A rectangle in device dots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DotRect {
    pub x: i64,
    pub y: i64,
    pub w: i64,
    pub h: i64,
}

impl DotRect {
    pub fn right(&self) -> i64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> i64 {
        self.y + self.h
    }

    /// Strict intersection — shared edges do not count as overlap.
    pub fn intersects(&self, other: &DotRect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// The safe-drawable rectangle: the media rect inset by the bleed on all
/// sides, then by the safe margin on all sides.
pub fn safe_rect(media_w_in: f64, media_h_in: f64, bleed_in: f64, safe_margin_in: f64) -> RectIn {
    let inset = bleed_in + safe_margin_in;
    RectIn {
        x: inset,
        y: inset,
        w: media_w_in - 2.0 * inset,
        h: media_h_in - 2.0 * inset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_to_dots() {
        assert_eq!(in_to_dots(4.0, 300), 1200);
        assert_eq!(in_to_dots(6.0, 300), 1800);
        assert_eq!(in_to_dots(0.1, 300), 30);
        assert_eq!(in_to_dots(0.0, 203), 0);
    }

    #[test]
    fn test_dpi_doubling_scales_linearly() {
        for inches in [0.1, 0.25, 0.5, 1.0, 2.5, 4.0] {
            assert_eq!(in_to_dots(inches, 600), 2 * in_to_dots(inches, 300));
            assert_eq!(in_to_dots(inches, 1200), 2 * in_to_dots(inches, 600));
        }
    }

    #[test]
    fn test_in_to_pt() {
        assert_eq!(in_to_pt(1.0), 72.0);
        assert_eq!(in_to_pt(4.0), 288.0);
    }

    #[test]
    fn test_safe_rect_insets() {
        let safe = safe_rect(4.0, 6.0, 0.125, 0.1);
        assert!((safe.x - 0.225).abs() < 1e-9);
        assert!((safe.y - 0.225).abs() < 1e-9);
        assert!((safe.w - 3.55).abs() < 1e-9);
        assert!((safe.h - 5.55).abs() < 1e-9);
    }

    #[test]
    fn test_safe_rect_zero_insets_is_media() {
        let safe = safe_rect(4.0, 6.0, 0.0, 0.0);
        assert_eq!(safe, RectIn::new(0.0, 0.0, 4.0, 6.0));
    }

    #[test]
    fn test_contains() {
        let outer = RectIn::new(0.0, 0.0, 4.0, 6.0);
        assert!(outer.contains(&RectIn::new(0.1, 0.1, 1.0, 1.0)));
        assert!(outer.contains(&RectIn::new(0.0, 0.0, 4.0, 6.0)));
        assert!(!outer.contains(&RectIn::new(3.5, 0.1, 1.0, 1.0)));
        assert!(!outer.contains(&RectIn::new(-0.1, 0.1, 1.0, 1.0)));
    }

    #[test]
    fn test_dot_rect_intersects() {
        let a = DotRect { x: 0, y: 0, w: 100, h: 50 };
        let b = DotRect { x: 50, y: 25, w: 100, h: 50 };
        let c = DotRect { x: 100, y: 0, w: 10, h: 10 };
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        // Touching edges are not overlap
        assert!(!a.intersects(&c));
    }
}
