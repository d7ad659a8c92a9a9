//! Release risk level and auto-generated risk items.

use tracing::debug;

use crate::config::Config;
use crate::types::{FeatureCoverage, RiskItem, RiskItemLevel, RiskLevel};

// Severity scale: High 7-10, Medium 4-6, Low 1-3.
const FAILED_TESTS_HIGH_SEVERITY: u8 = 7;
const FAILED_TESTS_HIGH_STEP: u32 = 5;
const FAILED_TESTS_MEDIUM_SEVERITY: u8 = 4;
const WEAK_FEATURE_MEDIUM_SEVERITY: u8 = 5;
const WEAK_FEATURE_LOW_SEVERITY: u8 = 3;
const INSUFFICIENT_COVERAGE_SEVERITY: u8 = 9;

/// Coverage ladder, first match wins.
pub fn risk_level(coverage_percent: f64, config: &Config) -> RiskLevel {
  if coverage_percent < config.critical_coverage_threshold {
    RiskLevel::Critical
  } else if coverage_percent < config.high_coverage_threshold {
    RiskLevel::High
  } else if coverage_percent < config.medium_coverage_threshold {
    RiskLevel::Medium
  } else {
    RiskLevel::Low
  }
}

/// Risk items for a release, most severe first.
///
/// Ties keep generation order: failing tests, weak features (input order),
/// then overall coverage.
pub fn generate_risk_items(
  coverage_percent: f64,
  fail_count: u32,
  features: &[FeatureCoverage],
  config: &Config,
) -> Vec<RiskItem> {
  let mut items = Vec::new();

  if fail_count > 0 {
    items.push(failing_tests_item(fail_count, config));
  }

  for feature in features {
    if feature.coverage < config.low_coverage_threshold {
      items.push(weak_feature_item(feature, config));
    }
  }

  if coverage_percent < config.critical_coverage_threshold {
    items.push(RiskItem {
      name: "Insufficient overall coverage".into(),
      level: RiskItemLevel::High,
      severity: INSUFFICIENT_COVERAGE_SEVERITY,
      description: format!(
        "Overall test coverage is {:.1}%, below the {}% minimum for a safe release",
        coverage_percent, config.critical_coverage_threshold
      ),
      affected_feature: None,
      recommendation: Some("Raise overall coverage before deploying to production".into()),
      auto_generated: true,
    });
  }

  items.sort_by(|a, b| b.severity.cmp(&a.severity));
  debug!(count = items.len(), "generated risk items");
  items
}

fn failing_tests_item(fail_count: u32, config: &Config) -> RiskItem {
  let (level, severity) = if fail_count >= config.failed_tests_high_threshold {
    let extra = (fail_count - config.failed_tests_high_threshold) / FAILED_TESTS_HIGH_STEP;
    (RiskItemLevel::High, FAILED_TESTS_HIGH_SEVERITY + extra.min(3) as u8)
  } else {
    (RiskItemLevel::Medium, FAILED_TESTS_MEDIUM_SEVERITY + (fail_count - 1).min(2) as u8)
  };

  RiskItem {
    name: "Failing tests".into(),
    level,
    severity,
    description: format!(
      "{} failing test{} in this run",
      fail_count,
      if fail_count == 1 { "" } else { "s" }
    ),
    affected_feature: None,
    recommendation: Some("Fix or quarantine failing tests before deploying".into()),
    auto_generated: true,
  }
}

fn weak_feature_item(feature: &FeatureCoverage, config: &Config) -> RiskItem {
  let gap = config.low_coverage_threshold - feature.coverage;
  let (level, severity) = if gap > config.weak_feature_medium_gap {
    (RiskItemLevel::Medium, WEAK_FEATURE_MEDIUM_SEVERITY)
  } else {
    (RiskItemLevel::Low, WEAK_FEATURE_LOW_SEVERITY)
  };

  RiskItem {
    name: format!("Low coverage: {}", feature.name),
    level,
    severity,
    description: format!(
      "{} has {:.1}% test coverage, below the {}% threshold",
      feature.name, feature.coverage, config.low_coverage_threshold
    ),
    affected_feature: Some(feature.name.clone()),
    recommendation: Some(format!(
      "Add tests for {} to reach at least {}% coverage",
      feature.name, config.low_coverage_threshold
    )),
    auto_generated: true,
  }
}
