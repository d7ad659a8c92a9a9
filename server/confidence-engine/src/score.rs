//! Pass rate, risk score, and release confidence.
//!
//! All functions are pure and total over validated numbers; rounding happens at
//! the edge of each metric so downstream steps see exactly what gets reported.

use crate::config::Config;
use crate::types::FeatureCoverage;

/// Percent of tests that passed, two decimals, 0 when no tests ran.
pub fn pass_rate(passed: u32, total: u32) -> f64 {
  if total == 0 {
    return 0.0;
  }
  let rate = f64::from(passed) * 100.0 / f64::from(total);
  round2(rate.clamp(0.0, 100.0))
}

/// Features strictly below the low-coverage threshold.
pub fn weak_feature_count(features: &[FeatureCoverage], config: &Config) -> usize {
  features
    .iter()
    .filter(|f| f.coverage < config.low_coverage_threshold)
    .count()
}

/// Weighted risk composite, higher = riskier, two decimals.
///
/// - coverage deficit `100 - coverage`
/// - failure pressure `failed / max(total, 1) * 100`, capped at 100
/// - weak-feature penalty, per-feature points capped before weighting
pub fn risk_score(
  coverage_percent: f64,
  fail_count: u32,
  total_tests: u32,
  features: &[FeatureCoverage],
  config: &Config,
) -> f64 {
  let deficit = (100.0 - coverage_percent).clamp(0.0, 100.0);
  let failure = (f64::from(fail_count) / f64::from(total_tests.max(1)) * 100.0).min(100.0);
  let weak = weak_feature_count(features, config) as f64 * config.weak_feature_penalty;
  let weak = weak.min(config.weak_feature_penalty_cap);

  round2(
    deficit * config.risk_coverage_deficit_weight
      + failure * config.risk_failure_weight
      + weak * config.risk_weak_feature_weight,
  )
}

/// Banded 0..=100 reading of how well known risk is contained.
///
/// Full credit needs a high pass rate and a low risk score; partial credit a
/// slightly relaxed pair; anything else counts as unmitigated.
pub fn risk_mitigation(pass_rate: f64, risk_score: f64, config: &Config) -> f64 {
  if pass_rate >= config.mitigated_pass_rate && risk_score <= config.mitigated_risk_ceiling {
    100.0
  } else if pass_rate >= config.partial_pass_rate && risk_score <= config.partial_risk_ceiling {
    config.partial_mitigation
  } else {
    0.0
  }
}

/// Coverage * 0.6 + pass rate * 0.3 + mitigation * 0.1, clamped, one decimal.
pub fn release_confidence(
  coverage_percent: f64,
  pass_rate: f64,
  risk_score: f64,
  config: &Config,
) -> f64 {
  let mitigation = risk_mitigation(pass_rate, risk_score, config);
  let raw = coverage_percent * config.confidence_coverage_weight
    + pass_rate * config.confidence_pass_rate_weight
    + mitigation * config.confidence_mitigation_weight;
  round1(raw.clamp(0.0, 100.0))
}

pub(crate) fn round1(v: f64) -> f64 {
  (v * 10.0).round() / 10.0
}

pub(crate) fn round2(v: f64) -> f64 {
  (v * 100.0).round() / 100.0
}
