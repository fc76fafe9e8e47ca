//! Running trend context over the pivot series
//!
//! Highs and lows alternate, so each pivot is compared with the pivot two
//! positions back, which has the same type. Four runs are kept, one per
//! direction and pivot type. A move in one direction extends that run and
//! resets the opposite run of the same type; flat moves change nothing.

use serde::{Deserialize, Serialize};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrendDirection {
    Ascending,
    Descending,
}

impl TrendDirection {
    pub const ALL: [TrendDirection; 2] = [TrendDirection::Ascending, TrendDirection::Descending];

    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    #[inline]
    pub(crate) const fn slot(self) -> usize {
        match self {
            Self::Ascending => 0,
            Self::Descending => 1,
        }
    }
}

/// One of the four tracked runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunKind {
    AscendingHighs,
    AscendingLows,
    DescendingHighs,
    DescendingLows,
}

impl RunKind {
    pub const ALL: [RunKind; 4] = [
        RunKind::AscendingHighs,
        RunKind::AscendingLows,
        RunKind::DescendingHighs,
        RunKind::DescendingLows,
    ];

    pub const fn new(direction: TrendDirection, highs: bool) -> Self {
        match (direction, highs) {
            (TrendDirection::Ascending, true) => Self::AscendingHighs,
            (TrendDirection::Ascending, false) => Self::AscendingLows,
            (TrendDirection::Descending, true) => Self::DescendingHighs,
            (TrendDirection::Descending, false) => Self::DescendingLows,
        }
    }

    pub const fn direction(self) -> TrendDirection {
        match self {
            Self::AscendingHighs | Self::AscendingLows => TrendDirection::Ascending,
            Self::DescendingHighs | Self::DescendingLows => TrendDirection::Descending,
        }
    }

    pub const fn is_highs(self) -> bool {
        matches!(self, Self::AscendingHighs | Self::DescendingHighs)
    }

    /// Same pivot type, other direction
    pub const fn opposite(self) -> Self {
        Self::new(self.direction().opposite(), self.is_highs())
    }

    /// Same direction, other pivot type
    pub const fn sibling(self) -> Self {
        Self::new(self.direction(), !self.is_highs())
    }

    #[inline]
    const fn slot(self) -> usize {
        self as usize
    }
}

/// Consecutive same-type pivots moving one way
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Run {
    /// Number of consecutive moves; zero when inactive
    pub count: usize,
    /// Pivot the run started from
    pub first_index: usize,
    pub first_price: f64,
    pub first_time: f64,
}

impl Run {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.count > 0
    }

    pub fn context(&self) -> TrendContext {
        if !self.is_active() {
            return TrendContext::default();
        }
        TrendContext {
            start_pivot: Some(self.first_index),
            start_price: Some(self.first_price),
            start_time: Some(self.first_time),
            point_count: self.count,
        }
    }
}

/// Trend summary attached to a pattern; all fields empty when there was no run
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendContext {
    pub start_pivot: Option<usize>,
    pub start_price: Option<f64>,
    pub start_time: Option<f64>,
    pub point_count: usize,
}

impl TrendContext {
    pub fn is_empty(&self) -> bool {
        self.point_count == 0
    }
}

/// Snapshot of a run taken just before an update reset it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EndedRun {
    pub kind: RunKind,
    pub run: Run,
}

#[derive(Debug, Clone)]
pub struct TrendTracker {
    runs: [Run; 4],
    even_is_high: bool,
    next: usize,
}

impl TrendTracker {
    /// `even_is_high` tells whether even pivot positions are highs
    pub fn new(even_is_high: bool) -> Self {
        Self {
            runs: [Run::default(); 4],
            even_is_high,
            next: 0,
        }
    }

    #[inline]
    pub fn run(&self, kind: RunKind) -> Run {
        self.runs[kind.slot()]
    }

    #[inline]
    pub fn context(&self, kind: RunKind) -> TrendContext {
        self.run(kind).context()
    }

    #[inline]
    pub fn is_high(&self, position: usize) -> bool {
        (position % 2 == 0) == self.even_is_high
    }

    /// Fold pivot `position` into the runs.
    ///
    /// Positions must arrive in order, once each. Returns the run this update
    /// reset, if one was active.
    pub fn update(&mut self, prices: &[f64], times: &[f64], position: usize) -> Option<EndedRun> {
        debug_assert_eq!(position, self.next, "pivots must be folded in order");
        self.next = position + 1;
        if position < 2 {
            return None;
        }

        let previous = position - 2;
        let (current, before) = (prices[position], prices[previous]);
        let direction = if current > before {
            TrendDirection::Ascending
        } else if current < before {
            TrendDirection::Descending
        } else {
            return None;
        };

        let kind = RunKind::new(direction, self.is_high(position));
        let run = &mut self.runs[kind.slot()];
        if !run.is_active() {
            *run = Run {
                count: 0,
                first_index: previous,
                first_price: before,
                first_time: times[previous],
            };
        }
        run.count += 1;

        let opposite = kind.opposite();
        let ended = std::mem::take(&mut self.runs[opposite.slot()]);
        if !ended.is_active() {
            return None;
        }
        trace!(?opposite, count = ended.count, position, "trend run reset");
        Some(EndedRun {
            kind: opposite,
            run: ended,
        })
    }

    /// Longer of the two runs moving in `direction`; ties go to the lows
    pub fn longest(&self, direction: TrendDirection) -> Run {
        Self::longer(
            self.run(RunKind::new(direction, false)),
            self.run(RunKind::new(direction, true)),
        )
    }

    /// Following-trend context once `ended` has closed: the ended run against its live sibling
    pub fn following_context(&self, ended: &EndedRun) -> TrendContext {
        let sibling = self.run(ended.kind.sibling());
        let (lows, highs) = if ended.kind.is_highs() {
            (sibling, ended.run)
        } else {
            (ended.run, sibling)
        };
        Self::longer(lows, highs).context()
    }

    #[inline]
    fn longer(lows: Run, highs: Run) -> Run {
        if lows.count >= highs.count {
            lows
        } else {
            highs
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(prices: &[f64], even_is_high: bool) -> (TrendTracker, Vec<Option<EndedRun>>) {
        let times: Vec<f64> = (0..prices.len()).map(|t| t as f64 * 10.0).collect();
        let mut tracker = TrendTracker::new(even_is_high);
        let ended = (0..prices.len()).map(|p| tracker.update(prices, &times, p)).collect();
        (tracker, ended)
    }

    #[test]
    fn test_rising_lows_build_a_run() {
        // lows at even positions: 8, 9, 10, 11
        let (tracker, ended) = feed(&[8.0, 14.0, 9.0, 13.0, 10.0, 12.0, 11.0], false);
        let run = tracker.run(RunKind::AscendingLows);
        assert_eq!(run.count, 3);
        assert_eq!(run.first_index, 0);
        assert_eq!(run.first_price, 8.0);
        assert_eq!(run.first_time, 0.0);

        let highs = tracker.run(RunKind::DescendingHighs);
        assert_eq!(highs.count, 2);
        assert_eq!(highs.first_index, 1);
        assert!(ended.iter().all(Option::is_none));
    }

    #[test]
    fn test_reversal_resets_opposite_run() {
        // lows 8, 9, 10 then 7
        let (tracker, ended) = feed(&[8.0, 14.0, 9.0, 15.0, 10.0, 16.0, 7.0], false);
        assert_eq!(tracker.run(RunKind::AscendingLows).count, 0);
        assert_eq!(tracker.run(RunKind::DescendingLows).count, 1);
        assert_eq!(tracker.run(RunKind::DescendingLows).first_index, 4);

        let reset = ended[6].expect("ascending lows should end");
        assert_eq!(reset.kind, RunKind::AscendingLows);
        assert_eq!(reset.run.count, 2);
        assert_eq!(reset.run.first_index, 0);
    }

    #[test]
    fn test_flat_move_changes_nothing() {
        let (tracker, ended) = feed(&[8.0, 14.0, 8.0, 14.0], false);
        for kind in RunKind::ALL {
            assert_eq!(tracker.run(kind).count, 0);
        }
        assert!(ended.iter().all(Option::is_none));
    }

    #[test]
    fn test_parity_follows_even_is_high() {
        let (tracker, _) = feed(&[14.0, 8.0, 15.0, 9.0], true);
        assert_eq!(tracker.run(RunKind::AscendingHighs).count, 1);
        assert_eq!(tracker.run(RunKind::AscendingLows).count, 1);
        assert!(tracker.is_high(0));
        assert!(!tracker.is_high(1));
    }

    #[test]
    fn test_longest_prefers_lows_on_tie() {
        let (tracker, _) = feed(&[8.0, 14.0, 9.0, 15.0], false);
        let longest = tracker.longest(TrendDirection::Ascending);
        assert_eq!(longest.count, 1);
        assert_eq!(longest.first_index, 0);

        let (tracker, _) = feed(&[8.0, 14.0, 9.0, 15.0, 9.0, 16.0], false);
        assert_eq!(tracker.longest(TrendDirection::Ascending).first_index, 1);
    }

    #[test]
    fn test_following_context_compares_ended_run_with_sibling() {
        // descending highs 3 long, descending lows 2 long, then highs turn up
        let (tracker, ended) = feed(&[20.0, 10.0, 18.0, 11.0, 16.0, 9.0, 14.0, 8.0, 15.0], true);
        let reset = ended[8].expect("descending highs should end");
        assert_eq!(reset.kind, RunKind::DescendingHighs);
        assert_eq!(reset.run.count, 3);

        let context = tracker.following_context(&reset);
        assert_eq!(context.point_count, 3);
        assert_eq!(context.start_pivot, Some(0));
        assert_eq!(context.start_price, Some(20.0));
        assert_eq!(context.start_time, Some(0.0));
    }

    #[test]
    fn test_inactive_run_has_empty_context() {
        let context = Run::default().context();
        assert!(context.is_empty());
        assert_eq!(context.start_pivot, None);
        assert_eq!(context.start_price, None);
    }

    #[test]
    fn test_run_kind_relations() {
        assert_eq!(RunKind::AscendingHighs.opposite(), RunKind::DescendingHighs);
        assert_eq!(RunKind::AscendingHighs.sibling(), RunKind::AscendingLows);
        assert_eq!(RunKind::DescendingLows.direction(), TrendDirection::Descending);
        assert!(!RunKind::DescendingLows.is_highs());
    }
}
