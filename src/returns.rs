//! Forward returns after a confirmed breakout
//!
//! Returns are sampled at the first raw bar whose time lies strictly beyond
//! each horizon, measured from the breakout. Fixed horizons are in time units;
//! relative horizons scale with the pattern's own duration.

use serde::{Deserialize, Serialize};

use crate::PivotPoint;

/// Fixed horizons, in time units past the breakout
pub const FIXED_HORIZONS: [i64; 6] = [1, 3, 5, 10, 30, 60];

/// Horizon expressed against the pattern duration `D`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelativeHorizon {
    /// `D / n`, truncated
    Fraction(i64),
    /// `D * n`
    Multiple(i64),
}

impl RelativeHorizon {
    #[inline]
    pub const fn offset(self, duration: i64) -> i64 {
        match self {
            Self::Fraction(n) => duration / n,
            Self::Multiple(n) => duration.saturating_mul(n),
        }
    }
}

pub const RELATIVE_HORIZONS: [RelativeHorizon; 5] = [
    RelativeHorizon::Fraction(3),
    RelativeHorizon::Fraction(2),
    RelativeHorizon::Multiple(1),
    RelativeHorizon::Multiple(2),
    RelativeHorizon::Multiple(4),
];

/// How a sampled price is expressed against the breakout price
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnConvention {
    /// Log ratio for the shortest fixed horizon, plain ratio everywhere else
    #[default]
    Mixed,
    Ratio,
    LogRatio,
}

impl ReturnConvention {
    #[inline]
    pub fn value(self, price: f64, base: f64, shortest: bool) -> f64 {
        let ratio = price / base;
        match self {
            Self::Mixed if shortest => ratio.ln(),
            Self::Mixed | Self::Ratio => ratio,
            Self::LogRatio => ratio.ln(),
        }
    }
}

/// Pattern duration: breakout time minus start time, truncated, at least 1
pub fn pattern_duration(start_time: f64, breakout_time: f64) -> i64 {
    let d = (breakout_time - start_time).trunc();
    if d.is_nan() || d < 1.0 {
        1
    } else {
        // saturating cast
        d as i64
    }
}

/// Fills the return slots of one confirmed pattern as raw bars stream past
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnTracker {
    breakout_index: usize,
    breakout: PivotPoint,
    duration: i64,
    relative_offsets: [i64; 5],
    fixed: [Option<f64>; 6],
    relative: [Option<f64>; 5],
    next_fixed: usize,
    next_relative: usize,
    convention: ReturnConvention,
}

impl ReturnTracker {
    pub fn new(
        breakout_index: usize,
        breakout: PivotPoint,
        start_time: f64,
        convention: ReturnConvention,
    ) -> Self {
        let duration = pattern_duration(start_time, breakout.time);
        Self {
            breakout_index,
            breakout,
            duration,
            relative_offsets: RELATIVE_HORIZONS.map(|h| h.offset(duration)),
            fixed: [None; 6],
            relative: [None; 5],
            next_fixed: 0,
            next_relative: 0,
            convention,
        }
    }

    #[inline]
    pub fn duration(&self) -> i64 {
        self.duration
    }

    pub fn relative_offsets(&self) -> [i64; 5] {
        self.relative_offsets
    }

    pub fn fixed(&self) -> [Option<f64>; 6] {
        self.fixed
    }

    pub fn relative(&self) -> [Option<f64>; 5] {
        self.relative
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.next_fixed == FIXED_HORIZONS.len() && self.next_relative == RELATIVE_HORIZONS.len()
    }

    /// Bit `k` set when fixed slot `k` is filled, bit `6 + k` for relative slot `k`
    pub fn filled_mask(&self) -> u16 {
        let fixed = self.fixed.iter().map(Option::is_some);
        let relative = self.relative.iter().map(Option::is_some);
        fixed
            .chain(relative)
            .enumerate()
            .filter(|&(_, filled)| filled)
            .fold(0u16, |mask, (bit, _)| mask | (1u16 << bit))
    }

    /// Offer raw bar `index`. Returns true once every slot is filled.
    ///
    /// Bars at or before the breakout and bars holding a NaN are skipped.
    /// Slots are filled once and never overwritten.
    pub fn observe(&mut self, index: usize, time: f64, price: f64) -> bool {
        if index <= self.breakout_index || time.is_nan() || price.is_nan() {
            return self.is_complete();
        }
        // a non-finite breakout time leaves every slot empty
        let elapsed = time - self.breakout.time;
        if elapsed.is_nan() {
            return false;
        }

        while let Some(&horizon) = FIXED_HORIZONS.get(self.next_fixed) {
            if elapsed <= horizon as f64 {
                break;
            }
            let shortest = self.next_fixed == 0;
            self.fixed[self.next_fixed] =
                Some(self.convention.value(price, self.breakout.price, shortest));
            self.next_fixed += 1;
        }

        while let Some(&offset) = self.relative_offsets.get(self.next_relative) {
            if elapsed <= offset as f64 {
                break;
            }
            self.relative[self.next_relative] =
                Some(self.convention.value(price, self.breakout.price, false));
            self.next_relative += 1;
        }

        self.is_complete()
    }
}
