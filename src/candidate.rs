//! Candidate lifecycle
//!
//! A candidate opens when a shape matches and then walks the raw series past
//! its right shoulder:
//!
//! ```text
//! Forming --(price beyond right shoulder)--> Invalidated
//! Forming --(neckline crossed, next bar holds)--> Confirmed --> returns, following trend
//! ```
//!
//! Both terminal states are final. Candidates live in an arena and are
//! referred to by [`CandidateId`]; the tracker keeps a list of ids still
//! waiting for raw bars so finished candidates cost nothing.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{
    detectors::{Neckline, PivotWindow},
    features::ShapeFeatures,
    returns::{ReturnConvention, ReturnTracker},
    series::RawSeries,
    trend::{EndedRun, TrendContext, TrendDirection, TrendTracker},
    BuiltinDetector, PatternKind, PivotPoint,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CandidateStatus {
    Forming,
    Confirmed,
    Invalidated,
}

impl CandidateStatus {
    #[inline]
    pub fn is_terminal(self) -> bool {
        !matches!(self, CandidateStatus::Forming)
    }
}

/// Index of a candidate in detection order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CandidateId(usize);

impl CandidateId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// What one raw bar did to a forming candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    Confirmed,
    Invalidated,
}

// ============================================================
// CANDIDATE
// ============================================================

#[derive(Debug, Clone)]
pub struct PatternCandidate {
    detector: BuiltinDetector,
    start_pivot: usize,
    start_raw: usize,
    right_shoulder_raw: usize,
    points: [PivotPoint; 6],
    neckline: Neckline,
    status: CandidateStatus,
    breakout_raw: Option<usize>,
    breakout: Option<PivotPoint>,
    prior_trend: TrendContext,
    following_trend: Option<TrendContext>,
    returns: Option<ReturnTracker>,
    features: ShapeFeatures,
}

impl PatternCandidate {
    /// `raw_indices` are the raw positions of the six window pivots
    pub fn open(
        window: &PivotWindow,
        detector: BuiltinDetector,
        raw_indices: [usize; 6],
        prior_trend: TrendContext,
    ) -> Self {
        Self {
            detector,
            start_pivot: window.start,
            start_raw: raw_indices[0],
            right_shoulder_raw: raw_indices[5],
            points: window.points,
            neckline: window.neckline,
            status: CandidateStatus::Forming,
            breakout_raw: None,
            breakout: None,
            prior_trend,
            following_trend: None,
            returns: None,
            features: ShapeFeatures::measure(&window.points, &window.neckline),
        }
    }

    #[inline]
    pub fn kind(&self) -> PatternKind {
        self.detector.kind()
    }

    #[inline]
    pub fn status(&self) -> CandidateStatus {
        self.status
    }

    #[inline]
    pub fn start_pivot(&self) -> usize {
        self.start_pivot
    }

    #[inline]
    pub fn left_shoulder(&self) -> usize {
        self.start_pivot + 1
    }

    #[inline]
    pub fn neckline_start(&self) -> usize {
        self.start_pivot + 2
    }

    #[inline]
    pub fn head(&self) -> usize {
        self.start_pivot + 3
    }

    #[inline]
    pub fn neckline_end(&self) -> usize {
        self.start_pivot + 4
    }

    #[inline]
    pub fn right_shoulder(&self) -> usize {
        self.start_pivot + 5
    }

    pub fn start_raw(&self) -> usize {
        self.start_raw
    }

    pub fn right_shoulder_raw(&self) -> usize {
        self.right_shoulder_raw
    }

    pub fn breakout_raw(&self) -> Option<usize> {
        self.breakout_raw
    }

    pub fn breakout(&self) -> Option<PivotPoint> {
        self.breakout
    }

    pub fn points(&self) -> &[PivotPoint; 6] {
        &self.points
    }

    pub fn neckline(&self) -> &Neckline {
        &self.neckline
    }

    pub fn prior_trend(&self) -> &TrendContext {
        &self.prior_trend
    }

    pub fn following_trend(&self) -> Option<&TrendContext> {
        self.following_trend.as_ref()
    }

    pub fn returns(&self) -> Option<&ReturnTracker> {
        self.returns.as_ref()
    }

    pub fn features(&self) -> &ShapeFeatures {
        &self.features
    }

    /// Time from the first point to the breakout bar
    pub fn duration(&self) -> Option<f64> {
        self.breakout.map(|b| b.time - self.points[0].time)
    }

    /// Test raw bar `j` for invalidation, then for a breakout confirmed by bar `j + 1`.
    ///
    /// Only forming candidates past their right shoulder react. Invalidation
    /// wins when both rules hold on the same bar.
    pub fn step(&mut self, raw: &RawSeries<'_>, j: usize, convention: ReturnConvention) -> Transition {
        if self.status != CandidateStatus::Forming || j <= self.right_shoulder_raw {
            return Transition::Unchanged;
        }
        let Some(bar) = raw.point(j).filter(|p| !p.has_nan()) else {
            return Transition::Unchanged;
        };
        let shoulder = self.points[5].price;

        if self.detector.is_invalidated(bar.price, shoulder) {
            self.status = CandidateStatus::Invalidated;
            return Transition::Invalidated;
        }

        // the next bar becomes the breakout point, so it must be whole
        let Some(next) = raw.point(j + 1).filter(|p| !p.has_nan()) else {
            return Transition::Unchanged;
        };
        let neckline = self.neckline.value_at(bar.time);
        if self.detector.is_breakout(bar.price, next.price, neckline, shoulder) {
            self.confirm(j + 1, next, convention);
            return Transition::Confirmed;
        }
        Transition::Unchanged
    }

    fn confirm(&mut self, index: usize, point: PivotPoint, convention: ReturnConvention) {
        self.status = CandidateStatus::Confirmed;
        self.breakout_raw = Some(index);
        self.breakout = Some(point);
        self.features.record_breakout(self.points[5], point);
        self.returns = Some(ReturnTracker::new(index, point, self.points[0].time, convention));
    }

    /// Offer raw bar `j` to the return tracker. True once every horizon is filled.
    pub fn observe(&mut self, raw: &RawSeries<'_>, j: usize) -> bool {
        match &mut self.returns {
            Some(returns) => returns.observe(j, raw.time(j), raw.price(j)),
            None => false,
        }
    }

    fn settle_following(&mut self, context: TrendContext) {
        self.following_trend = Some(context);
    }

    pub fn into_record(self) -> PatternRecord {
        let duration = self.duration();
        let (fixed_returns, relative_returns) = self
            .returns
            .as_ref()
            .map_or(([None; 6], [None; 5]), |r| (r.fixed(), r.relative()));
        PatternRecord {
            kind: self.kind(),
            status: self.status,
            confirmed: self.status == CandidateStatus::Confirmed,
            start_pivot: self.start_pivot,
            start_raw: self.start_raw,
            breakout_raw: self.breakout_raw,
            points: self.points,
            breakout: self.breakout,
            duration,
            prior_trend: self.prior_trend,
            following_trend: self.following_trend,
            fixed_returns,
            relative_returns,
            features: self.features,
        }
    }
}

// ============================================================
// OUTPUT RECORD
// ============================================================

/// One detected pattern as reported to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternRecord {
    pub kind: PatternKind,
    pub status: CandidateStatus,
    pub confirmed: bool,
    /// Pivot position of the first point
    pub start_pivot: usize,
    /// Raw index of the first point
    pub start_raw: usize,
    /// Raw index of the breakout bar
    pub breakout_raw: Option<usize>,
    /// First point, left shoulder, neckline start, head, neckline end, right shoulder
    pub points: [PivotPoint; 6],
    pub breakout: Option<PivotPoint>,
    pub duration: Option<f64>,
    pub prior_trend: TrendContext,
    /// `None` unless confirmed
    pub following_trend: Option<TrendContext>,
    /// Indexed like [`crate::returns::FIXED_HORIZONS`]
    pub fixed_returns: [Option<f64>; 6],
    /// Indexed like [`crate::returns::RELATIVE_HORIZONS`]
    pub relative_returns: [Option<f64>; 5],
    pub features: ShapeFeatures,
}

impl PatternRecord {
    #[inline]
    pub fn right_shoulder(&self) -> PivotPoint {
        self.points[5]
    }

    #[inline]
    pub fn head(&self) -> PivotPoint {
        self.points[3]
    }

    pub fn neckline(&self) -> Neckline {
        Neckline::through(self.points[2], self.points[4])
    }
}

// ============================================================
// TRACKER
// ============================================================

/// Owns every candidate of a scan and drives the open ones over the raw series
#[derive(Debug, Clone)]
pub struct CandidateTracker {
    arena: Vec<PatternCandidate>,
    /// Forming, or confirmed with returns still open
    active: Vec<CandidateId>,
    /// Confirmed, following trend not yet assigned; one list per direction
    awaiting: [Vec<CandidateId>; 2],
    /// Next raw bar to visit
    cursor: usize,
    convention: ReturnConvention,
}

impl CandidateTracker {
    pub fn new(convention: ReturnConvention) -> Self {
        Self {
            arena: Vec::new(),
            active: Vec::new(),
            awaiting: [Vec::new(), Vec::new()],
            cursor: 0,
            convention,
        }
    }

    pub fn open(&mut self, candidate: PatternCandidate) -> CandidateId {
        let id = CandidateId(self.arena.len());
        debug!(
            kind = %candidate.kind(),
            start = candidate.start_pivot(),
            right_shoulder_raw = candidate.right_shoulder_raw(),
            "candidate opened"
        );
        self.arena.push(candidate);
        self.active.push(id);
        id
    }

    pub fn get(&self, id: CandidateId) -> Option<&PatternCandidate> {
        self.arena.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    pub fn awaiting_len(&self) -> usize {
        self.awaiting.iter().map(Vec::len).sum()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Visit every raw bar up to and including `target` that has not been visited yet.
    pub fn advance_to(&mut self, raw: &RawSeries<'_>, target: usize) {
        let Some(last) = raw.len().checked_sub(1) else {
            return;
        };
        let end = target.min(last);
        if self.active.is_empty() {
            self.cursor = self.cursor.max(end + 1);
            return;
        }

        let Self {
            arena,
            active,
            awaiting,
            cursor,
            convention,
        } = self;
        let convention = *convention;

        while *cursor <= end {
            let j = *cursor;
            active.retain(|&id| {
                let candidate = &mut arena[id.0];
                match candidate.step(raw, j, convention) {
                    Transition::Invalidated => {
                        debug!(
                            kind = %candidate.kind(),
                            start = candidate.start_pivot(),
                            bar = j,
                            "candidate invalidated"
                        );
                        return false;
                    }
                    Transition::Confirmed => {
                        debug!(
                            kind = %candidate.kind(),
                            start = candidate.start_pivot(),
                            breakout = j + 1,
                            "candidate confirmed"
                        );
                        let direction = candidate.detector.following_direction();
                        awaiting[direction.slot()].push(id);
                        return true;
                    }
                    Transition::Unchanged => {}
                }
                if candidate.status() != CandidateStatus::Confirmed {
                    return true;
                }
                let complete = candidate.observe(raw, j);
                if complete {
                    trace!(start = candidate.start_pivot(), bar = j, "returns complete");
                }
                !complete
            });
            *cursor += 1;
        }
    }

    /// A run just ended: confirmed candidates waiting on its direction take the
    /// longer of it and its live sibling as their following trend.
    ///
    /// Only resets of runs in the candidate's own direction settle it, and the
    /// ended run is kept at its full length rather than capped at three points.
    pub fn apply_ended_run(&mut self, ended: &EndedRun, trends: &TrendTracker) {
        let waiting = &mut self.awaiting[ended.kind.direction().slot()];
        if waiting.is_empty() {
            return;
        }
        let context = trends.following_context(ended);
        for id in waiting.drain(..) {
            self.arena[id.0].settle_following(context);
        }
    }

    /// Close the scan. Candidates still waiting take the live run of their direction.
    pub fn finish(mut self, trends: &TrendTracker) -> Vec<PatternCandidate> {
        for direction in TrendDirection::ALL {
            let context = trends.longest(direction).context();
            for id in std::mem::take(&mut self.awaiting[direction.slot()]) {
                self.arena[id.0].settle_following(context);
            }
        }
        self.arena
    }
}
