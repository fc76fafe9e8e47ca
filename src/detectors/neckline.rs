//! Neckline geometry
//!
//! The neckline is evaluated at arbitrary raw times, both when testing the
//! shape and when scanning for a breakout. Anchors that share a time collapse
//! the line to the mean of their prices.

use serde::{Deserialize, Serialize};

use crate::PivotPoint;

/// Anchor times closer than this are treated as coincident
pub const ANCHOR_EPSILON: f64 = 1e-15;

/// Times closer than this give a zero slope
pub const SLOPE_EPSILON: f64 = 1e-10;

/// Slope from `a` to `b`; zero when the two share a time
#[inline]
pub fn slope(a: PivotPoint, b: PivotPoint) -> f64 {
    let dx = b.time - a.time;
    if dx.abs() < SLOPE_EPSILON {
        0.0
    } else {
        (b.price - a.price) / dx
    }
}

/// Straight line through the two inner pivots of a pattern
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neckline {
    pub start: PivotPoint,
    pub end: PivotPoint,
}

impl Neckline {
    #[inline]
    pub const fn through(start: PivotPoint, end: PivotPoint) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn is_degenerate(&self) -> bool {
        (self.end.time - self.start.time).abs() < ANCHOR_EPSILON
    }

    #[inline]
    pub fn slope(&self) -> f64 {
        slope(self.start, self.end)
    }

    /// Time between the anchors
    #[inline]
    pub fn span(&self) -> f64 {
        self.end.time - self.start.time
    }

    /// Neckline price at `time`.
    ///
    /// Exact at either anchor. Degenerate anchors give their mean price everywhere.
    #[inline]
    pub fn value_at(&self, time: f64) -> f64 {
        let dx = self.end.time - self.start.time;
        if dx.abs() < ANCHOR_EPSILON {
            return (self.start.price + self.end.price) / 2.0;
        }
        if time == self.end.time {
            return self.end.price;
        }
        if time == self.start.time {
            return self.start.price;
        }
        self.end.price + (self.end.price - self.start.price) / dx * (time - self.end.time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(t1: f64, y1: f64, t2: f64, y2: f64) -> Neckline {
        Neckline::through(PivotPoint::new(t1, y1), PivotPoint::new(t2, y2))
    }

    #[test]
    fn test_exact_at_anchors() {
        let n = line(0.1, 7.3, 0.7, 11.9);
        assert_eq!(n.value_at(0.1), 7.3);
        assert_eq!(n.value_at(0.7), 11.9);
    }

    #[test]
    fn test_interpolates_and_extrapolates() {
        let n = line(2.0, 10.0, 4.0, 14.0);
        assert!((n.value_at(3.0) - 12.0).abs() < 1e-12);
        assert!((n.value_at(6.0) - 18.0).abs() < 1e-12);
        assert!((n.value_at(0.0) - 6.0).abs() < 1e-12);
        assert_eq!(n.slope(), 2.0);
        assert_eq!(n.span(), 2.0);
    }

    #[test]
    fn test_degenerate_anchors_use_mean() {
        let n = line(5.0, 10.0, 5.0, 14.0);
        assert!(n.is_degenerate());
        assert_eq!(n.value_at(5.0), 12.0);
        assert_eq!(n.value_at(100.0), 12.0);
        assert_eq!(n.slope(), 0.0);
    }

    #[test]
    fn test_slope_of_coincident_times_is_zero() {
        let a = PivotPoint::new(1.0, 3.0);
        let b = PivotPoint::new(1.0 + 1e-12, 9.0);
        assert_eq!(slope(a, b), 0.0);
    }
}
