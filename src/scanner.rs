//! Single forward pass over the pivot series
//!
//! For each pivot, in order: fold it into the trend runs (handing any ended
//! run to confirmed candidates), open the candidates whose window starts
//! there, then walk the raw bars up to the pivot. Bars past the last pivot
//! are walked once the pivots run out.

use std::iter::Peekable;

use tracing::debug;

use crate::{
    candidate::{CandidateTracker, PatternCandidate, PatternRecord},
    returns::ReturnConvention,
    series::{PivotSeries, RawSeries},
    trend::TrendTracker,
    ShapeMatch,
};

pub(crate) struct Scanner<'a> {
    raw: RawSeries<'a>,
    pivots: &'a PivotSeries,
    trends: TrendTracker,
    candidates: CandidateTracker,
}

impl<'a> Scanner<'a> {
    pub(crate) fn new(raw: RawSeries<'a>, pivots: &'a PivotSeries, convention: ReturnConvention) -> Self {
        Self {
            raw,
            pivots,
            trends: TrendTracker::new(pivots.even_is_high()),
            candidates: CandidateTracker::new(convention),
        }
    }

    /// `matches` must be sorted by start position
    pub(crate) fn run(mut self, matches: &[ShapeMatch]) -> Vec<PatternRecord> {
        let mut pending = matches.iter().peekable();

        for position in 0..self.pivots.len() {
            if let Some(ended) = self.trends.update(self.pivots.prices(), self.pivots.times(), position) {
                self.candidates.apply_ended_run(&ended, &self.trends);
            }
            self.open_matches(&mut pending, position);
            self.candidates.advance_to(&self.raw, self.pivots.raw_index(position));
        }
        self.candidates.advance_to(&self.raw, self.raw.len().saturating_sub(1));

        debug!(
            candidates = self.candidates.len(),
            unsettled = self.candidates.active_len(),
            "pivot pass finished"
        );

        self.candidates
            .finish(&self.trends)
            .into_iter()
            .map(PatternCandidate::into_record)
            .collect()
    }

    fn open_matches<'m, I>(&mut self, pending: &mut Peekable<I>, position: usize)
    where
        I: Iterator<Item = &'m ShapeMatch>,
    {
        while let Some(found) = pending.next_if(|m| m.start() == position) {
            let start = found.start();
            let raw_indices = std::array::from_fn(|k| self.pivots.raw_index(start + k));
            let prior_trend = found.detector.prior_trend(&self.trends);
            self.candidates.open(PatternCandidate::open(
                &found.window,
                found.detector,
                raw_indices,
                prior_trend,
            ));
        }
    }
}
