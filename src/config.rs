//! Scan configuration
//!
//! [`ScanConfig`] is plain data: it derives serde so a scan setup can live in
//! a JSON/TOML file next to the data it runs on. [`crate::EngineBuilder`]
//! exposes the same knobs fluently.
//!
//! # Example
//!
//! ```rust
//! use shsd::config::ScanConfig;
//! use shsd::prelude::*;
//!
//! let config = ScanConfig {
//!   return_convention: ReturnConvention::Ratio,
//!   kinds: Some(vec![PatternKind::Shs]),
//!   ..ScanConfig::default()
//! };
//! assert!(config.validate().is_ok());
//!
//! let engine = EngineBuilder::new().with_all_defaults().config(config).build().unwrap();
//! assert_eq!(engine.detectors().len(), 1);
//! ```

use serde::{Deserialize, Serialize};

use crate::{returns::ReturnConvention, series::MIN_PIVOTS, PatternError, PatternKind, Result};

// ============================================================
// DEFAULTS
// ============================================================

/// Pivot count from which shape classification runs on the rayon pool
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 1000;

// ============================================================
// SCAN CONFIG
// ============================================================

/// Knobs shared by every scan an engine runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
  /// How forward returns are expressed
  pub return_convention: ReturnConvention,
  /// Shapes to detect; `None` keeps every detector the builder was given
  pub kinds: Option<Vec<PatternKind>>,
  /// Reject non-finite times and prices before scanning
  pub validate_data: bool,
  /// `None` keeps classification sequential
  pub parallel_threshold: Option<usize>,
  /// Fewer pivots than this yields an empty report
  pub min_pivots: usize,
}

impl Default for ScanConfig {
  fn default() -> Self {
    Self {
      return_convention: ReturnConvention::default(),
      kinds: None,
      validate_data: false,
      parallel_threshold: Some(DEFAULT_PARALLEL_THRESHOLD),
      min_pivots: MIN_PIVOTS,
    }
  }
}

impl ScanConfig {
  pub fn validate(&self) -> Result<()> {
    if self.min_pivots < MIN_PIVOTS {
      return Err(PatternError::InvalidConfig(format!(
        "min_pivots must be at least {MIN_PIVOTS}, got {}",
        self.min_pivots
      )));
    }
    if self.kinds.as_ref().is_some_and(Vec::is_empty) {
      return Err(PatternError::InvalidConfig("kinds filter is empty".to_string()));
    }
    Ok(())
  }

  /// Whether `kind` passes the shape filter
  #[inline]
  pub fn includes(&self, kind: PatternKind) -> bool {
    self.kinds.as_ref().map_or(true, |kinds| kinds.contains(&kind))
  }
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults() {
    let config = ScanConfig::default();
    assert_eq!(config.return_convention, ReturnConvention::Mixed);
    assert_eq!(config.parallel_threshold, Some(1000));
    assert_eq!(config.min_pivots, 7);
    assert!(!config.validate_data);
    assert!(config.validate().is_ok());
    assert!(config.includes(PatternKind::Shs));
    assert!(config.includes(PatternKind::Ishs));
  }

  #[test]
  fn test_min_pivots_below_pattern_size_is_rejected() {
    let config = ScanConfig { min_pivots: 6, ..ScanConfig::default() };
    assert!(matches!(config.validate(), Err(PatternError::InvalidConfig(_))));
  }

  #[test]
  fn test_empty_kind_filter_is_rejected() {
    let config = ScanConfig { kinds: Some(vec![]), ..ScanConfig::default() };
    assert!(config.validate().is_err());
  }

  #[test]
  fn test_kind_filter() {
    let config = ScanConfig { kinds: Some(vec![PatternKind::Ishs]), ..ScanConfig::default() };
    assert!(!config.includes(PatternKind::Shs));
    assert!(config.includes(PatternKind::Ishs));
  }

  #[test]
  fn test_json_roundtrip_with_partial_input() {
    let config: ScanConfig =
      serde_json::from_str(r#"{"return_convention":"log_ratio","kinds":["iSHS"]}"#).unwrap();
    assert_eq!(config.return_convention, ReturnConvention::LogRatio);
    assert_eq!(config.kinds, Some(vec![PatternKind::Ishs]));
    assert_eq!(config.min_pivots, 7);

    let json = serde_json::to_string(&config).unwrap();
    let back: ScanConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);
  }
}
