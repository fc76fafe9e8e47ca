//! Inverse Shoulder-Head-Shoulder (bullish reversal)
//!
//! Mirror image of [`super::ShsDetector`]: troughs for shoulders and head,
//! confirmed by a close above the neckline.

use super::PivotWindow;
use crate::{
    trend::{RunKind, TrendContext, TrendDirection, TrendTracker},
    Direction, PatternDetector, PatternKind, PatternMetadata,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IshsDetector;

impl PatternDetector for IshsDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::Ishs
    }

    fn matches(&self, w: &PivotWindow) -> bool {
        let p = |k| w.price(k);
        p(0) > p(1)
            && p(0) > p(2)
            && p(1) > p(3)
            && p(5) > p(3)
            && p(5) < w.at_right_shoulder
            && p(1) < w.at_left_shoulder
            && p(0) > w.at_first
    }

    #[inline]
    fn is_invalidated(&self, price: f64, right_shoulder: f64) -> bool {
        price < right_shoulder
    }

    #[inline]
    fn is_breakout(&self, price: f64, next_price: f64, neckline: f64, right_shoulder: f64) -> bool {
        price > neckline && next_price > right_shoulder
    }

    fn prior_trend(&self, trends: &TrendTracker) -> TrendContext {
        trends.context(RunKind::DescendingHighs)
    }

    fn following_direction(&self) -> TrendDirection {
        TrendDirection::Ascending
    }

    fn metadata(&self) -> PatternMetadata {
        PatternMetadata {
            name: "Inverse Shoulder-Head-Shoulder",
            description: "Bullish reversal: head below two shoulders, broken above the neckline",
            direction: Direction::Bullish,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{detectors::ShsDetector, PivotPoint};

    fn window(prices: [f64; 6]) -> PivotWindow {
        let points = std::array::from_fn(|k| PivotPoint::new(k as f64, prices[k]));
        PivotWindow::from_points(0, points).unwrap()
    }

    #[test]
    fn test_matches_textbook_shape() {
        let w = window([20.0, 12.0, 16.0, 8.0, 16.0, 12.0]);
        assert!(IshsDetector.matches(&w));
        assert!(!ShsDetector.matches(&w));
    }

    #[test]
    fn test_rejects_shoulder_below_head() {
        assert!(!IshsDetector.matches(&window([20.0, 12.0, 16.0, 8.0, 16.0, 7.0])));
    }

    #[test]
    fn test_rejects_left_shoulder_above_neckline() {
        assert!(!IshsDetector.matches(&window([20.0, 17.0, 16.0, 8.0, 16.0, 12.0])));
    }

    #[test]
    fn test_breakout_and_invalidation_rules() {
        assert!(IshsDetector.is_breakout(17.0, 13.0, 16.0, 12.0));
        assert!(!IshsDetector.is_breakout(16.0, 13.0, 16.0, 12.0));
        assert!(!IshsDetector.is_breakout(17.0, 12.0, 16.0, 12.0));
        assert!(IshsDetector.is_invalidated(11.5, 12.0));
        assert!(!IshsDetector.is_invalidated(12.0, 12.0));
    }

    #[test]
    fn test_trend_roles() {
        assert_eq!(IshsDetector.following_direction(), TrendDirection::Ascending);
        assert!(IshsDetector.metadata().direction.is_bullish());
    }

    #[test]
    fn test_prior_trend_reads_descending_highs() {
        // highs 20 -> 18 -> 16 at even positions, lows 10 -> 11 rising
        let prices = [20.0, 10.0, 18.0, 11.0, 16.0];
        let times = [0.0, 1.0, 2.0, 3.0, 4.0];
        let mut trends = TrendTracker::new(true);
        for p in 0..prices.len() {
            trends.update(&prices, &times, p);
        }

        let prior = IshsDetector.prior_trend(&trends);
        assert_eq!(prior.point_count, 2);
        assert_eq!(prior.start_pivot, Some(0));
        assert_eq!(prior.start_price, Some(20.0));

        let shs_prior = ShsDetector.prior_trend(&trends);
        assert_eq!(shs_prior.point_count, 1);
        assert_eq!(shs_prior.start_pivot, Some(1));
    }
}
