//! Scoring policy: weights and thresholds with sane defaults.
//!
//! Every constant below is policy, not derived truth. They are tuned so the two
//! published examples (90% coverage / 98% pass, 95% coverage / 87% pass) land
//! on 93.4 and 83.1 confidence. Deployments can override any of them with a
//! JSON policy file.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

// Release confidence = coverage * 0.6 + pass rate * 0.3 + mitigation * 0.1
pub const CONFIDENCE_COVERAGE_WEIGHT: f64 = 0.6;
pub const CONFIDENCE_PASS_RATE_WEIGHT: f64 = 0.3;
pub const CONFIDENCE_MITIGATION_WEIGHT: f64 = 0.1;

// Risk score = deficit * 0.5 + failure pressure * 0.3 + weak features * 0.2
pub const RISK_COVERAGE_DEFICIT_WEIGHT: f64 = 0.5;
pub const RISK_FAILURE_WEIGHT: f64 = 0.3;
pub const RISK_WEAK_FEATURE_WEIGHT: f64 = 0.2;

/// Features strictly below this coverage percent count as weak.
pub const LOW_COVERAGE_THRESHOLD: f64 = 70.0;
/// Penalty points per weak feature, before weighting.
pub const WEAK_FEATURE_PENALTY: f64 = 10.0;
/// Cap on the summed weak-feature penalty, before weighting.
pub const WEAK_FEATURE_PENALTY_CAP: f64 = 50.0;
/// A weak feature further than this below the threshold is a Medium item.
pub const WEAK_FEATURE_MEDIUM_GAP: f64 = 20.0;

// Risk level ladder (coverage only).
pub const CRITICAL_COVERAGE_THRESHOLD: f64 = 50.0;
pub const HIGH_COVERAGE_THRESHOLD: f64 = 70.0;
pub const MEDIUM_COVERAGE_THRESHOLD: f64 = 85.0;

// Risk mitigation bands feeding the confidence formula.
pub const MITIGATED_PASS_RATE: f64 = 95.0;
pub const MITIGATED_RISK_CEILING: f64 = 20.0;
pub const PARTIAL_PASS_RATE: f64 = 90.0;
pub const PARTIAL_RISK_CEILING: f64 = 40.0;
pub const PARTIAL_MITIGATION: f64 = 50.0;

/// Failing-test count at which the failure item escalates to High.
pub const FAILED_TESTS_HIGH_THRESHOLD: u32 = 5;

// Time-to-ship bands: the slower of the coverage band and the risk band wins.
pub const COVERAGE_SHIP_BANDS: [(f64, u32); 4] = [(90.0, 30), (80.0, 60), (70.0, 135), (50.0, 240)];
pub const RISK_SHIP_BANDS: [(f64, u32); 4] = [(10.0, 30), (25.0, 60), (40.0, 135), (60.0, 240)];
/// Estimate for anything past the last band.
pub const SLOWEST_SHIP_MINUTES: u32 = 480;

// Ship decision cut-offs on release confidence.
pub const SHIP_CONFIDENCE: f64 = 90.0;
pub const WAIT_CONFIDENCE: f64 = 70.0;

/// One time-to-ship band. For coverage bands `threshold` is a minimum coverage
/// percent; for risk bands it is a maximum risk score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShipBand {
  pub threshold: f64,
  pub minutes: u32,
}

fn bands(table: &[(f64, u32)]) -> Vec<ShipBand> {
  table
    .iter()
    .map(|&(threshold, minutes)| ShipBand { threshold, minutes })
    .collect()
}

/// Tunable scoring policy. Missing fields in a policy file keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  pub confidence_coverage_weight: f64,
  pub confidence_pass_rate_weight: f64,
  pub confidence_mitigation_weight: f64,
  pub risk_coverage_deficit_weight: f64,
  pub risk_failure_weight: f64,
  pub risk_weak_feature_weight: f64,
  pub low_coverage_threshold: f64,
  pub weak_feature_penalty: f64,
  pub weak_feature_penalty_cap: f64,
  pub weak_feature_medium_gap: f64,
  pub critical_coverage_threshold: f64,
  pub high_coverage_threshold: f64,
  pub medium_coverage_threshold: f64,
  pub mitigated_pass_rate: f64,
  pub mitigated_risk_ceiling: f64,
  pub partial_pass_rate: f64,
  pub partial_risk_ceiling: f64,
  pub partial_mitigation: f64,
  pub failed_tests_high_threshold: u32,
  /// Checked top-down; thresholds descend.
  pub coverage_ship_bands: Vec<ShipBand>,
  /// Checked top-down; thresholds ascend.
  pub risk_ship_bands: Vec<ShipBand>,
  pub slowest_ship_minutes: u32,
  pub ship_confidence: f64,
  pub wait_confidence: f64,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      confidence_coverage_weight: CONFIDENCE_COVERAGE_WEIGHT,
      confidence_pass_rate_weight: CONFIDENCE_PASS_RATE_WEIGHT,
      confidence_mitigation_weight: CONFIDENCE_MITIGATION_WEIGHT,
      risk_coverage_deficit_weight: RISK_COVERAGE_DEFICIT_WEIGHT,
      risk_failure_weight: RISK_FAILURE_WEIGHT,
      risk_weak_feature_weight: RISK_WEAK_FEATURE_WEIGHT,
      low_coverage_threshold: LOW_COVERAGE_THRESHOLD,
      weak_feature_penalty: WEAK_FEATURE_PENALTY,
      weak_feature_penalty_cap: WEAK_FEATURE_PENALTY_CAP,
      weak_feature_medium_gap: WEAK_FEATURE_MEDIUM_GAP,
      critical_coverage_threshold: CRITICAL_COVERAGE_THRESHOLD,
      high_coverage_threshold: HIGH_COVERAGE_THRESHOLD,
      medium_coverage_threshold: MEDIUM_COVERAGE_THRESHOLD,
      mitigated_pass_rate: MITIGATED_PASS_RATE,
      mitigated_risk_ceiling: MITIGATED_RISK_CEILING,
      partial_pass_rate: PARTIAL_PASS_RATE,
      partial_risk_ceiling: PARTIAL_RISK_CEILING,
      partial_mitigation: PARTIAL_MITIGATION,
      failed_tests_high_threshold: FAILED_TESTS_HIGH_THRESHOLD,
      coverage_ship_bands: bands(&COVERAGE_SHIP_BANDS),
      risk_ship_bands: bands(&RISK_SHIP_BANDS),
      slowest_ship_minutes: SLOWEST_SHIP_MINUTES,
      ship_confidence: SHIP_CONFIDENCE,
      wait_confidence: WAIT_CONFIDENCE,
    }
  }
}

impl Config {
  /// Load a JSON policy file and validate it.
  pub fn from_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
    let raw = fs::read_to_string(path.as_ref())?;
    let cfg: Config = serde_json::from_str(&raw)?;
    cfg.validate()?;
    Ok(cfg)
  }

  /// Reject policies the scoring math cannot honor.
  pub fn validate(&self) -> Result<(), EngineError> {
    let weights = [
      ("confidence_coverage_weight", self.confidence_coverage_weight),
      ("confidence_pass_rate_weight", self.confidence_pass_rate_weight),
      ("confidence_mitigation_weight", self.confidence_mitigation_weight),
      ("risk_coverage_deficit_weight", self.risk_coverage_deficit_weight),
      ("risk_failure_weight", self.risk_failure_weight),
      ("risk_weak_feature_weight", self.risk_weak_feature_weight),
    ];
    for (name, w) in weights {
      if !w.is_finite() || !(0.0..=1.0).contains(&w) {
        return Err(EngineError::config(format!("{} must be within 0..=1, got {}", name, w)));
      }
    }

    let risk_sum =
      self.risk_coverage_deficit_weight + self.risk_failure_weight + self.risk_weak_feature_weight;
    if (risk_sum - 1.0).abs() > 1e-6 {
      return Err(EngineError::config(format!(
        "risk score weights must sum to 1, got {:.3}",
        risk_sum
      )));
    }

    if !(self.critical_coverage_threshold < self.high_coverage_threshold
      && self.high_coverage_threshold < self.medium_coverage_threshold)
    {
      return Err(EngineError::config(
        "coverage ladder must ascend: critical < high < medium",
      ));
    }

    if !(0.0..=100.0).contains(&self.low_coverage_threshold) {
      return Err(EngineError::config("low_coverage_threshold must be within 0..=100"));
    }

    if self.weak_feature_penalty < 0.0 || self.weak_feature_penalty_cap < 0.0 {
      return Err(EngineError::config("weak feature penalties must not be negative"));
    }

    let percents = [
      ("mitigated_pass_rate", self.mitigated_pass_rate),
      ("partial_pass_rate", self.partial_pass_rate),
      ("mitigated_risk_ceiling", self.mitigated_risk_ceiling),
      ("partial_risk_ceiling", self.partial_risk_ceiling),
      ("partial_mitigation", self.partial_mitigation),
      ("ship_confidence", self.ship_confidence),
      ("wait_confidence", self.wait_confidence),
    ];
    for (name, v) in percents {
      if !v.is_finite() || !(0.0..=100.0).contains(&v) {
        return Err(EngineError::config(format!("{} must be within 0..=100, got {}", name, v)));
      }
    }

    // Full mitigation must be the stricter band.
    if self.mitigated_pass_rate < self.partial_pass_rate {
      return Err(EngineError::config(
        "mitigated_pass_rate must not be below partial_pass_rate",
      ));
    }
    if self.mitigated_risk_ceiling > self.partial_risk_ceiling {
      return Err(EngineError::config(
        "mitigated_risk_ceiling must not exceed partial_risk_ceiling",
      ));
    }

    if self.wait_confidence > self.ship_confidence {
      return Err(EngineError::config("wait_confidence must not exceed ship_confidence"));
    }

    check_bands(
      "coverage_ship_bands",
      &self.coverage_ship_bands,
      |prev, next| next < prev,
      self.slowest_ship_minutes,
    )?;
    check_bands(
      "risk_ship_bands",
      &self.risk_ship_bands,
      |prev, next| next > prev,
      self.slowest_ship_minutes,
    )?;

    Ok(())
  }
}

/// Bands must be in check order with non-decreasing minutes, all within the
/// slowest estimate, so the time-to-ship mapping stays monotonic.
fn check_bands(
  name: &str,
  bands: &[ShipBand],
  in_order: impl Fn(f64, f64) -> bool,
  slowest: u32,
) -> Result<(), EngineError> {
  for (i, band) in bands.iter().enumerate() {
    if !band.threshold.is_finite() || !(0.0..=100.0).contains(&band.threshold) {
      return Err(EngineError::config(format!(
        "{}[{}].threshold must be within 0..=100",
        name, i
      )));
    }
    if band.minutes > slowest {
      return Err(EngineError::config(format!(
        "{}[{}].minutes must not exceed slowest_ship_minutes",
        name, i
      )));
    }
  }
  for (i, pair) in bands.windows(2).enumerate() {
    if !in_order(pair[0].threshold, pair[1].threshold) || pair[1].minutes < pair[0].minutes {
      return Err(EngineError::config(format!(
        "{}[{}] is out of order with the band before it",
        name,
        i + 1
      )));
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  #[test]
  fn default_policy_is_valid() {
    assert!(Config::default().validate().is_ok());
  }

  #[test]
  fn risk_weights_must_sum_to_one() {
    let cfg = Config {
      risk_failure_weight: 0.5,
      ..Config::default()
    };
    let err = cfg.validate().unwrap_err();
    assert!(err.to_string().contains("sum to 1"));
  }

  #[test]
  fn out_of_range_weight_rejected() {
    let cfg = Config {
      confidence_coverage_weight: 1.5,
      ..Config::default()
    };
    let err = cfg.validate().unwrap_err();
    assert!(err.to_string().contains("confidence_coverage_weight"));
  }

  #[test]
  fn coverage_ladder_must_ascend() {
    let cfg = Config {
      high_coverage_threshold: 90.0,
      ..Config::default()
    };
    assert!(cfg.validate().is_err());
  }

  #[test]
  fn mitigation_bands_must_nest() {
    let cfg = Config {
      mitigated_pass_rate: 85.0,
      ..Config::default()
    };
    let err = cfg.validate().unwrap_err();
    assert!(err.to_string().contains("mitigated_pass_rate"));

    let cfg = Config {
      mitigated_risk_ceiling: 60.0,
      ..Config::default()
    };
    let err = cfg.validate().unwrap_err();
    assert!(err.to_string().contains("mitigated_risk_ceiling"));
  }

  #[test]
  fn percent_fields_bounded() {
    for cfg in [
      Config {
        partial_risk_ceiling: 140.0,
        ..Config::default()
      },
      Config {
        ship_confidence: 101.0,
        ..Config::default()
      },
      Config {
        wait_confidence: -1.0,
        ..Config::default()
      },
    ] {
      let err = cfg.validate().unwrap_err();
      assert!(err.to_string().contains("0..=100"), "got {}", err);
    }
  }

  #[test]
  fn ship_bands_must_keep_order() {
    let mut cfg = Config::default();
    cfg.coverage_ship_bands.swap(0, 1);
    let err = cfg.validate().unwrap_err();
    assert!(err.to_string().contains("coverage_ship_bands[1]"));

    let mut cfg = Config::default();
    cfg.risk_ship_bands[2].minutes = 45;
    let err = cfg.validate().unwrap_err();
    assert!(err.to_string().contains("risk_ship_bands[2]"));

    let cfg = Config {
      slowest_ship_minutes: 200,
      ..Config::default()
    };
    let err = cfg.validate().unwrap_err();
    assert!(err.to_string().contains("slowest_ship_minutes"));
  }

  #[test]
  fn ship_bands_load_from_policy_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
      file,
      r#"{{"coverage_ship_bands": [{{"threshold": 95.0, "minutes": 15}}, {{"threshold": 60.0, "minutes": 90}}],
          "slowest_ship_minutes": 600}}"#
    )
    .unwrap();

    let cfg = Config::from_file(file.path()).unwrap();
    assert_eq!(cfg.coverage_ship_bands.len(), 2);
    assert_eq!(cfg.coverage_ship_bands[0], ShipBand { threshold: 95.0, minutes: 15 });
    assert_eq!(cfg.risk_ship_bands.len(), RISK_SHIP_BANDS.len());
  }

  #[test]
  fn partial_policy_file_keeps_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"low_coverage_threshold": 60.0}}"#).unwrap();

    let cfg = Config::from_file(file.path()).unwrap();
    assert_eq!(cfg.low_coverage_threshold, 60.0);
    assert_eq!(cfg.risk_failure_weight, RISK_FAILURE_WEIGHT);
  }

  #[test]
  fn invalid_policy_file_is_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"risk_failure_weight": 0.9}}"#).unwrap();

    assert!(Config::from_file(file.path()).is_err());
  }
}
