//! Six-pivot windows fed to the shape tests

use super::Neckline;
use crate::{series::PivotSeries, PivotPoint};

/// Number of pivots forming a pattern body
pub const WINDOW_LEN: usize = 6;

/// Six consecutive pivots with the neckline values the shape tests compare against
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PivotWindow {
    /// Pivot position of the first point
    pub start: usize,
    pub points: [PivotPoint; WINDOW_LEN],
    /// Through `points[2]` and `points[4]`
    pub neckline: Neckline,
    /// Neckline at the first point
    pub at_first: f64,
    /// Neckline at the left shoulder
    pub at_left_shoulder: f64,
    /// Neckline at the right shoulder
    pub at_right_shoulder: f64,
}

impl PivotWindow {
    /// Window starting at pivot `start`, or `None` when it runs past the series or holds a NaN
    pub fn at(pivots: &PivotSeries, start: usize) -> Option<Self> {
        if start + WINDOW_LEN > pivots.len() {
            return None;
        }
        let points = std::array::from_fn(|k| pivots.point(start + k));
        Self::from_points(start, points)
    }

    pub fn from_points(start: usize, points: [PivotPoint; WINDOW_LEN]) -> Option<Self> {
        if points.iter().any(PivotPoint::has_nan) {
            return None;
        }
        let neckline = Neckline::through(points[2], points[4]);
        Some(Self {
            start,
            points,
            neckline,
            at_first: neckline.value_at(points[0].time),
            at_left_shoulder: neckline.value_at(points[1].time),
            at_right_shoulder: neckline.value_at(points[5].time),
        })
    }

    #[inline]
    pub fn price(&self, k: usize) -> f64 {
        self.points[k].price
    }
}
