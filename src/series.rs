//! Raw series and the pivot series derived from it
//!
//! The raw series is every bar of an instrument; the pivot series is the
//! subset an upstream filter kept as alternating highs and lows, addressed by
//! position. Pivot `p` lives at raw index `indices[p]`.

use tracing::warn;

use crate::{PatternError, PivotPoint, Result, ScanWarning};

/// Six body pivots plus the one that follows the right shoulder
pub const MIN_PIVOTS: usize = 7;

/// A breakout needs a bar and its successor
pub const MIN_RAW_LEN: usize = 2;

/// Borrowed input for one instrument
#[derive(Debug, Clone, Copy)]
pub struct SeriesInput<'a> {
    /// Raw indices of the pivots, strictly increasing
    pub pivots: &'a [usize],
    pub times: &'a [f64],
    pub prices: &'a [f64],
}

impl<'a> SeriesInput<'a> {
    pub const fn new(pivots: &'a [usize], times: &'a [f64], prices: &'a [f64]) -> Self {
        Self {
            pivots,
            times,
            prices,
        }
    }
}

// ============================================================
// RAW SERIES
// ============================================================

#[derive(Debug, Clone, Copy)]
pub struct RawSeries<'a> {
    times: &'a [f64],
    prices: &'a [f64],
}

impl<'a> RawSeries<'a> {
    pub fn new(times: &'a [f64], prices: &'a [f64]) -> Result<Self> {
        if times.len() != prices.len() {
            return Err(PatternError::LengthMismatch {
                times: times.len(),
                prices: prices.len(),
            });
        }
        Ok(Self { times, prices })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    #[inline]
    pub fn time(&self, index: usize) -> f64 {
        self.times[index]
    }

    #[inline]
    pub fn price(&self, index: usize) -> f64 {
        self.prices[index]
    }

    /// Bar at `index`, or `None` past the end
    #[inline]
    pub fn point(&self, index: usize) -> Option<PivotPoint> {
        Some(PivotPoint::new(*self.times.get(index)?, *self.prices.get(index)?))
    }

    pub fn times(&self) -> &'a [f64] {
        self.times
    }

    pub fn prices(&self) -> &'a [f64] {
        self.prices
    }

    /// Reject non-finite values
    pub fn validate(&self) -> Result<()> {
        for (index, (time, price)) in self.times.iter().zip(self.prices).enumerate() {
            if !time.is_finite() {
                return Err(PatternError::InvalidSeries {
                    index,
                    reason: "time is not finite",
                });
            }
            if !price.is_finite() {
                return Err(PatternError::InvalidSeries {
                    index,
                    reason: "price is not finite",
                });
            }
        }
        Ok(())
    }
}

// ============================================================
// PIVOT SERIES
// ============================================================

/// Pivot times and prices gathered from the raw series
#[derive(Debug, Clone, Default)]
pub struct PivotSeries {
    indices: Vec<usize>,
    times: Vec<f64>,
    prices: Vec<f64>,
    warnings: Vec<ScanWarning>,
}

impl PivotSeries {
    /// Gather the pivots at `indices`, which must be strictly increasing and inside `raw`
    pub fn from_raw(indices: &[usize], raw: &RawSeries<'_>) -> Result<Self> {
        let mut warnings = Vec::new();
        if let Some(&first) = indices.first() {
            if first != 0 {
                warn!(first, "pivot indices do not start at zero");
                warnings.push(ScanWarning::PivotsNotZeroBased { first });
            }
        }

        let mut times = Vec::with_capacity(indices.len());
        let mut prices = Vec::with_capacity(indices.len());
        for (position, &index) in indices.iter().enumerate() {
            if index >= raw.len() {
                return Err(PatternError::PivotOutOfRange {
                    position,
                    index,
                    len: raw.len(),
                });
            }
            if position > 0 && index <= indices[position - 1] {
                return Err(PatternError::UnorderedPivots {
                    position,
                    previous: indices[position - 1],
                    index,
                });
            }
            times.push(raw.time(index));
            prices.push(raw.price(index));
        }

        Ok(Self {
            indices: indices.to_vec(),
            times,
            prices,
            warnings,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Raw index of pivot `position`
    #[inline]
    pub fn raw_index(&self, position: usize) -> usize {
        self.indices[position]
    }

    #[inline]
    pub fn point(&self, position: usize) -> PivotPoint {
        PivotPoint::new(self.times[position], self.prices[position])
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    pub fn warnings(&self) -> &[ScanWarning] {
        &self.warnings
    }

    /// Whether even positions hold highs, read from the first two pivots
    pub fn even_is_high(&self) -> bool {
        matches!(self.prices.as_slice(), [first, second, ..] if first > second)
    }
}
