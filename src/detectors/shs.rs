//! Shoulder-Head-Shoulder (bearish reversal)
//!
//! ```text
//!                  P3
//!          P1      /\      P5
//!          /\     /  \     /\
//!         /  \   /    \   /  \
//!   -----/----\-/------\-/----\---- neckline
//!       /     P2       P4      \
//!     P0                        breakout
//! ```

use super::PivotWindow;
use crate::{
    trend::{RunKind, TrendContext, TrendDirection, TrendTracker},
    Direction, PatternDetector, PatternKind, PatternMetadata,
};

/// Top formed by two shoulders around a higher head, confirmed by a close below the neckline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShsDetector;

impl PatternDetector for ShsDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::Shs
    }

    fn matches(&self, w: &PivotWindow) -> bool {
        let p = |k| w.price(k);
        // Head above both shoulders, first point below the left shoulder and trough
        p(0) < p(1)
            && p(0) < p(2)
            && p(1) < p(3)
            && p(5) < p(3)
            // Shoulders stand above the neckline, the first point below it
            && p(5) > w.at_right_shoulder
            && p(1) > w.at_left_shoulder
            && p(0) < w.at_first
    }

    #[inline]
    fn is_invalidated(&self, price: f64, right_shoulder: f64) -> bool {
        price > right_shoulder
    }

    #[inline]
    fn is_breakout(&self, price: f64, next_price: f64, neckline: f64, right_shoulder: f64) -> bool {
        price < neckline && next_price < right_shoulder
    }

    fn prior_trend(&self, trends: &TrendTracker) -> TrendContext {
        trends.context(RunKind::AscendingLows)
    }

    fn following_direction(&self) -> TrendDirection {
        TrendDirection::Descending
    }

    fn metadata(&self) -> PatternMetadata {
        PatternMetadata {
            name: "Shoulder-Head-Shoulder",
            description: "Bearish reversal: head above two shoulders, broken below the neckline",
            direction: Direction::Bearish,
        }
    }
}
