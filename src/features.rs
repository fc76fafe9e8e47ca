//! Shape measurements attached to every candidate

use serde::{Deserialize, Serialize};

use crate::{
    detectors::{slope, Neckline},
    PivotPoint,
};

/// Slopes and time spans describing a pattern's geometry
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ShapeFeatures {
    pub neckline_slope: f64,
    /// Time between the neckline anchors
    pub neckline_span: f64,
    /// Slope of each leg `P0->P1` .. `P4->P5`
    pub leg_slopes: [f64; 5],
    /// Duration of each leg
    pub leg_spans: [f64; 5],
    /// Right shoulder to breakout bar, once confirmed
    pub breakout_slope: Option<f64>,
    pub breakout_span: Option<f64>,
}

impl ShapeFeatures {
    pub fn measure(points: &[PivotPoint; 6], neckline: &Neckline) -> Self {
        Self {
            neckline_slope: neckline.slope(),
            neckline_span: neckline.span(),
            leg_slopes: std::array::from_fn(|k| slope(points[k], points[k + 1])),
            leg_spans: std::array::from_fn(|k| points[k + 1].time - points[k].time),
            breakout_slope: None,
            breakout_span: None,
        }
    }

    pub fn record_breakout(&mut self, right_shoulder: PivotPoint, breakout: PivotPoint) {
        self.breakout_slope = Some(slope(right_shoulder, breakout));
        self.breakout_span = Some(breakout.time - right_shoulder.time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_and_breakout() {
        let prices = [10.0, 16.0, 12.0, 20.0, 14.0, 16.0];
        let points: [PivotPoint; 6] =
            std::array::from_fn(|k| PivotPoint::new(k as f64 * 2.0, prices[k]));
        let neckline = Neckline::through(points[2], points[4]);

        let mut features = ShapeFeatures::measure(&points, &neckline);
        assert_eq!(features.neckline_slope, 0.5);
        assert_eq!(features.neckline_span, 4.0);
        assert_eq!(features.leg_slopes, [3.0, -2.0, 4.0, -3.0, 1.0]);
        assert_eq!(features.leg_spans, [2.0; 5]);
        assert_eq!(features.breakout_slope, None);

        features.record_breakout(points[5], PivotPoint::new(13.0, 13.0));
        assert_eq!(features.breakout_slope, Some(-1.0));
        assert_eq!(features.breakout_span, Some(3.0));
    }
}
