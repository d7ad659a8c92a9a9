//! Per-feature coverage list: caller-supplied, or derived from the coverage map.

use crate::normalize::TOTAL_KEY;
use crate::types::{CoverageReport, FeatureCoverage};

/// Explicit features win verbatim; otherwise one entry per coverage-map key
/// (the reserved `total` key excluded), in key order.
pub fn derive_features(
  coverage: &CoverageReport,
  explicit: Option<&[FeatureCoverage]>,
) -> Vec<FeatureCoverage> {
  if let Some(features) = explicit {
    return features.to_vec();
  }
  coverage
    .features
    .iter()
    .filter(|(name, _)| name.as_str() != TOTAL_KEY)
    .map(|(name, stats)| FeatureCoverage {
      name: name.clone(),
      coverage: stats.coverage,
      tests_passed: stats.tests_passed,
      tests_failed: stats.tests_failed,
    })
    .collect()
}
