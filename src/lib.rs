//! # SHSD - Shoulder-Head-Shoulder Detector
//!
//! Detection of head-and-shoulders reversal patterns (SHS, bearish) and their
//! inverse (iSHS, bullish) over a pivot-reduced price series, with breakout
//! confirmation against the raw series, trend context and forward returns.
//!
//! ## Quick Start
//!
//! ```rust
//! use shsd::prelude::*;
//!
//! // Raw series and the pivot positions produced by an upstream filter
//! let prices = [
//!     10.0, 13.0, 16.0, 14.0, 12.0, 16.0, 20.0, 16.0, 12.0, 14.0, 16.0, 13.5, 11.0, 12.0, 13.0,
//! ];
//! let times: Vec<f64> = (0..prices.len()).map(|t| t as f64).collect();
//! let pivots = [0, 2, 4, 6, 8, 10, 12, 14];
//!
//! let engine = EngineBuilder::new().with_all_defaults().build().unwrap();
//! let report = engine.scan(&pivots, &times, &prices).unwrap();
//!
//! let shs = &report.patterns[0];
//! assert_eq!(shs.kind, PatternKind::Shs);
//! assert_eq!(shs.breakout_raw, Some(13));
//! ```

pub mod candidate;
pub mod config;
pub mod detectors;
pub mod features;
pub mod returns;
mod scanner;
pub mod series;
pub mod trend;

pub mod prelude {
    pub use crate::{
        // Candidates
        candidate::{CandidateId, CandidateStatus, CandidateTracker, PatternCandidate, PatternRecord},
        // Configuration
        config::ScanConfig,
        // Detectors
        detectors::*,
        // Features
        features::ShapeFeatures,
        // Returns
        returns::{ReturnConvention, ReturnTracker, FIXED_HORIZONS, RELATIVE_HORIZONS},
        // Parallel
        scan_parallel,
        // Series
        series::{PivotSeries, RawSeries, SeriesInput},
        // Trend
        trend::{EndedRun, Run, RunKind, TrendContext, TrendDirection, TrendTracker},
        // Engine
        BuiltinDetector,
        // Types
        Direction,
        EngineBuilder,
        // Core traits
        PatternDetector,
        PatternEngine,
        // Errors
        PatternError,
        PatternKind,
        PatternMetadata,
        PivotPoint,
        Result,
        ScanError,
        ScanReport,
        ScanResult,
        ScanWarning,
        ShapeMatch,
    };
}

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, PatternError>;

/// Errors that can occur while preparing a scan
#[derive(Debug, Clone, thiserror::Error)]
pub enum PatternError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Length mismatch: {times} times vs {prices} prices")]
    LengthMismatch { times: usize, prices: usize },

    #[error("Pivot {position} points at index {index}, outside a series of {len} bars")]
    PivotOutOfRange {
        position: usize,
        index: usize,
        len: usize,
    },

    #[error("Pivot indices must increase: {previous} followed by {index} at position {position}")]
    UnorderedPivots {
        position: usize,
        previous: usize,
        index: usize,
    },

    #[error("Invalid series value at index {index}: {reason}")]
    InvalidSeries { index: usize, reason: &'static str },
}

// ============================================================
// WARNINGS
// ============================================================

/// Non-fatal findings recorded while scanning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanWarning {
    /// The pivot filter does not start at raw index 0
    PivotsNotZeroBased { first: usize },
    /// Too few pivots to hold a pattern; the scan returned nothing
    TooFewPivots { got: usize, need: usize },
    /// Too few raw bars to confirm anything; the scan returned nothing
    TooFewBars { got: usize, need: usize },
}

impl fmt::Display for ScanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PivotsNotZeroBased { first } => {
                write!(f, "pivot indices start at {first}, not zero")
            }
            Self::TooFewPivots { got, need } => {
                write!(f, "need {need} pivots, got {got}")
            }
            Self::TooFewBars { got, need } => write!(f, "need {need} bars, got {got}"),
        }
    }
}

// ============================================================
// CORE TYPES
// ============================================================

/// A (time, price) pair taken from the series
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PivotPoint {
    pub time: f64,
    pub price: f64,
}

impl PivotPoint {
    #[inline]
    pub const fn new(time: f64, price: f64) -> Self {
        Self { time, price }
    }

    #[inline]
    pub fn has_nan(&self) -> bool {
        self.time.is_nan() || self.price.is_nan()
    }
}

/// Shape of a detected pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternKind {
    /// Shoulder-Head-Shoulder, a top
    #[serde(rename = "SHS")]
    Shs,
    /// Inverse Shoulder-Head-Shoulder, a bottom
    #[serde(rename = "iSHS")]
    Ishs,
}

impl PatternKind {
    pub const ALL: [PatternKind; 2] = [PatternKind::Shs, PatternKind::Ishs];

    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Shs => "SHS",
            Self::Ishs => "iSHS",
        }
    }

    /// Direction the pattern signals once confirmed
    pub fn direction(self) -> Direction {
        match self {
            Self::Shs => Direction::Bearish,
            Self::Ishs => Direction::Bullish,
        }
    }

    /// Builtin detector for this shape
    pub fn detector(self) -> BuiltinDetector {
        match self {
            Self::Shs => BuiltinDetector::Shs(ShsDetector),
            Self::Ishs => BuiltinDetector::Ishs(IshsDetector),
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction/bias of a pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Bullish,
    Bearish,
}

impl Direction {
    #[inline]
    pub fn is_bullish(self) -> bool {
        matches!(self, Direction::Bullish)
    }

    #[inline]
    pub fn is_bearish(self) -> bool {
        matches!(self, Direction::Bearish)
    }
}

// ============================================================
// PATTERN DETECTOR TRAIT
// ============================================================

/// Additional metadata about a pattern
#[derive(Debug, Clone)]
pub struct PatternMetadata {
    pub name: &'static str,
    pub description: &'static str,
    pub direction: Direction,
}

/// Per-shape rules. Every method is a pure function of its arguments.
pub trait PatternDetector: Send + Sync {
    fn kind(&self) -> PatternKind;

    /// Shape test over six consecutive pivots
    fn matches(&self, window: &PivotWindow) -> bool;

    /// Whether a raw price after the right shoulder kills the pattern
    fn is_invalidated(&self, price: f64, right_shoulder: f64) -> bool;

    /// Whether `price` has crossed the neckline while `next_price` holds past the shoulder
    fn is_breakout(&self, price: f64, next_price: f64, neckline: f64, right_shoulder: f64)
        -> bool;

    /// Trend context preceding the pattern, read when it is first detected
    fn prior_trend(&self, trends: &TrendTracker) -> TrendContext;

    /// Direction of the runs that count as the trend following a breakout
    fn following_direction(&self) -> TrendDirection;

    fn metadata(&self) -> PatternMetadata {
        PatternMetadata {
            name: self.kind().as_str(),
            description: "",
            direction: self.kind().direction(),
        }
    }
}

// ============================================================
// BUILTIN DETECTORS - generated via macro
// ============================================================

use detectors::*;
use trend::{TrendContext, TrendDirection, TrendTracker};

/// Macro to generate BuiltinDetector enum without boilerplate
macro_rules! define_builtin_detectors {
    (
        $(
            $variant:ident($detector:ty)
        ),* $(,)?
    ) => {
        /// All builtin detectors - fast path via enum dispatch
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum BuiltinDetector {
            $($variant($detector)),*
        }

        impl BuiltinDetector {
            #[inline]
            pub fn kind(&self) -> PatternKind {
                match self {
                    $(Self::$variant(d) => PatternDetector::kind(d)),*
                }
            }

            #[inline]
            pub fn matches(&self, window: &PivotWindow) -> bool {
                match self {
                    $(Self::$variant(d) => PatternDetector::matches(d, window)),*
                }
            }

            #[inline]
            pub fn is_invalidated(&self, price: f64, right_shoulder: f64) -> bool {
                match self {
                    $(Self::$variant(d) => PatternDetector::is_invalidated(d, price, right_shoulder)),*
                }
            }

            #[inline]
            pub fn is_breakout(
                &self,
                price: f64,
                next_price: f64,
                neckline: f64,
                right_shoulder: f64,
            ) -> bool {
                match self {
                    $(Self::$variant(d) => {
                        PatternDetector::is_breakout(d, price, next_price, neckline, right_shoulder)
                    }),*
                }
            }

            pub fn prior_trend(&self, trends: &TrendTracker) -> TrendContext {
                match self {
                    $(Self::$variant(d) => PatternDetector::prior_trend(d, trends)),*
                }
            }

            #[inline]
            pub fn following_direction(&self) -> TrendDirection {
                match self {
                    $(Self::$variant(d) => PatternDetector::following_direction(d)),*
                }
            }

            pub fn metadata(&self) -> PatternMetadata {
                match self {
                    $(Self::$variant(d) => PatternDetector::metadata(d)),*
                }
            }
        }
    };
}

define_builtin_detectors! {
    Shs(ShsDetector),
    Ishs(IshsDetector),
}

// ============================================================
// PATTERN ENGINE
// ============================================================

use candidate::PatternRecord;
use config::ScanConfig;
use scanner::Scanner;
use series::{PivotSeries, RawSeries, SeriesInput, MIN_RAW_LEN};

/// A shape found at a pivot window, before any breakout tracking
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeMatch {
    pub window: PivotWindow,
    pub detector: BuiltinDetector,
}

impl ShapeMatch {
    #[inline]
    pub fn start(&self) -> usize {
        self.window.start
    }

    #[inline]
    pub fn kind(&self) -> PatternKind {
        self.detector.kind()
    }
}

/// Everything one scan produced
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    /// All candidates in detection order, confirmed or not
    pub patterns: Vec<PatternRecord>,
    pub warnings: Vec<ScanWarning>,
}

impl ScanReport {
    fn degenerate(warning: ScanWarning) -> Self {
        Self {
            patterns: Vec::new(),
            warnings: vec![warning],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Candidates that reached a breakout
    pub fn confirmed(&self) -> impl Iterator<Item = &PatternRecord> {
        self.patterns.iter().filter(|p| p.confirmed)
    }

    pub fn count(&self, kind: PatternKind) -> usize {
        self.patterns.iter().filter(|p| p.kind == kind).count()
    }
}

/// Main pattern detection engine
#[derive(Debug, Clone)]
pub struct PatternEngine {
    detectors: Vec<BuiltinDetector>,
    config: ScanConfig,
}

impl PatternEngine {
    pub fn detectors(&self) -> &[BuiltinDetector] {
        &self.detectors
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    // ===========================================
    // LOW-LEVEL: Classification
    // ===========================================

    /// Classify the six pivots starting at `start`.
    /// The shapes exclude each other, so the first detector to match wins.
    pub fn classify_at(&self, pivots: &PivotSeries, start: usize) -> Option<ShapeMatch> {
        let window = PivotWindow::at(pivots, start)?;
        self.detectors
            .iter()
            .find(|d| d.matches(&window))
            .map(|&detector| ShapeMatch { window, detector })
    }

    /// Classify every start position, in start order.
    /// Runs on the rayon pool once the series reaches the parallel threshold.
    pub fn classify(&self, pivots: &PivotSeries) -> Vec<ShapeMatch> {
        let starts = 0..pivots.len().saturating_sub(5);
        let parallel = self
            .config
            .parallel_threshold
            .is_some_and(|threshold| pivots.len() >= threshold);

        if parallel {
            starts
                .into_par_iter()
                .filter_map(|i| self.classify_at(pivots, i))
                .collect()
        } else {
            starts.filter_map(|i| self.classify_at(pivots, i)).collect()
        }
    }

    // ===========================================
    // HIGH-LEVEL: Full scan
    // ===========================================

    /// Scan one instrument: pivot positions into the raw series plus the raw times and prices.
    pub fn scan(&self, pivots: &[usize], times: &[f64], prices: &[f64]) -> Result<ScanReport> {
        self.scan_input(SeriesInput::new(pivots, times, prices))
    }

    pub fn scan_input(&self, input: SeriesInput<'_>) -> Result<ScanReport> {
        let raw = RawSeries::new(input.times, input.prices)?;

        if input.pivots.len() < self.config.min_pivots {
            warn!(
                got = input.pivots.len(),
                need = self.config.min_pivots,
                "too few pivots, nothing to scan"
            );
            return Ok(ScanReport::degenerate(ScanWarning::TooFewPivots {
                got: input.pivots.len(),
                need: self.config.min_pivots,
            }));
        }
        if raw.len() < MIN_RAW_LEN {
            warn!(got = raw.len(), need = MIN_RAW_LEN, "too few bars, nothing to scan");
            return Ok(ScanReport::degenerate(ScanWarning::TooFewBars {
                got: raw.len(),
                need: MIN_RAW_LEN,
            }));
        }

        if self.config.validate_data {
            raw.validate()?;
        }

        let pivots = PivotSeries::from_raw(input.pivots, &raw)?;
        let matches = self.classify(&pivots);
        let patterns = Scanner::new(raw, &pivots, self.config.return_convention).run(&matches);

        debug!(
            pivots = pivots.len(),
            bars = raw.len(),
            candidates = patterns.len(),
            confirmed = patterns.iter().filter(|p| p.confirmed).count(),
            "scan finished"
        );

        Ok(ScanReport {
            patterns,
            warnings: pivots.warnings().to_vec(),
        })
    }

    fn validate(&self) -> Result<()> {
        self.config.validate()?;
        if self.detectors.is_empty() {
            return Err(PatternError::InvalidConfig(
                "no detectors left after filtering".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================
// BUILDER
// ============================================================

/// Builder for creating PatternEngine instances
#[derive(Debug, Clone, Default)]
pub struct EngineBuilder {
    detectors: Vec<BuiltinDetector>,
    config: ScanConfig,
}

/// Generate an array of `BuiltinDetector` variants using `Default::default()` for each inner type.
macro_rules! builtin_defaults {
  ($($variant:ident),* $(,)?) => {
    [$(BuiltinDetector::$variant(Default::default())),*]
  };
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add both builtin shapes
    pub fn with_all_defaults(mut self) -> Self {
        self.detectors.extend(builtin_defaults![Shs, Ishs]);
        self
    }

    /// Add a builtin detector
    #[allow(clippy::should_implement_trait)]
    pub fn add(mut self, detector: BuiltinDetector) -> Self {
        if !self.detectors.contains(&detector) {
            self.detectors.push(detector);
        }
        self
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: ScanConfig) -> Self {
        self.config = config;
        self
    }

    /// Restrict detection to the given shapes
    pub fn only_patterns(mut self, kinds: impl IntoIterator<Item = PatternKind>) -> Self {
        self.config.kinds = Some(kinds.into_iter().collect());
        self
    }

    pub fn return_convention(mut self, convention: returns::ReturnConvention) -> Self {
        self.config.return_convention = convention;
        self
    }

    /// Pivot count from which classification runs in parallel; `None` keeps it sequential
    pub fn parallel_threshold(mut self, threshold: Option<usize>) -> Self {
        self.config.parallel_threshold = threshold;
        self
    }

    /// Enable/disable raw data validation
    pub fn validate_data(mut self, enable: bool) -> Self {
        self.config.validate_data = enable;
        self
    }

    /// Build the engine
    pub fn build(self) -> Result<PatternEngine> {
        let config = self.config;
        let detectors = self
            .detectors
            .into_iter()
            .filter(|d| config.includes(d.kind()))
            .collect();
        let engine = PatternEngine { detectors, config };
        engine.validate()?;
        Ok(engine)
    }
}

// ============================================================
// PARALLEL SCANNING
// ============================================================

use rayon::prelude::*;

/// Result of scanning a single instrument
#[derive(Debug)]
pub struct ScanResult {
    pub symbol: String,
    pub report: ScanReport,
}

/// Error from scanning a single instrument
#[derive(Debug)]
pub struct ScanError {
    pub symbol: String,
    pub error: PatternError,
}

/// Parallel scanning of multiple instruments
pub fn scan_parallel<'a, I>(engine: &PatternEngine, instruments: I) -> (Vec<ScanResult>, Vec<ScanError>)
where
    I: IntoParallelIterator<Item = (&'a str, SeriesInput<'a>)>,
{
    let results: Vec<_> = instruments
        .into_par_iter()
        .map(|(symbol, input)| {
            engine
                .scan_input(input)
                .map(|report| ScanResult {
                    symbol: symbol.to_string(),
                    report,
                })
                .map_err(|error| ScanError {
                    symbol: symbol.to_string(),
                    error,
                })
        })
        .collect();

    let mut successes = Vec::new();
    let mut errors = Vec::new();

    for result in results {
        match result {
            Ok(r) => successes.push(r),
            Err(e) => errors.push(e),
        }
    }

    (successes, errors)
}

// ============================================================
// TESTS
// ============================================================
