//! Validate inbound webhook payloads into typed scoring inputs.
//!
//! This is the structural gate in front of the scoring math: missing blocks and
//! missing numbers are rejected here, so the scoring functions can stay total.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::error::EngineError;
use crate::types::*;

/// Reserved key of the coverage map holding the overall percent.
pub const TOTAL_KEY: &str = "total";

/// Parse and validate a WebhookPayload into a ValidatedRelease.
pub fn normalize(raw: &WebhookPayload) -> Result<ValidatedRelease, EngineError> {
  let repository = raw
    .repository
    .as_ref()
    .ok_or_else(|| EngineError::validation("repository", "block is required"))?;
  let release = raw
    .release
    .as_ref()
    .ok_or_else(|| EngineError::validation("release", "block is required"))?;
  let coverage = raw
    .coverage
    .as_ref()
    .ok_or_else(|| EngineError::validation("coverage", "block is required"))?;
  let tests = raw
    .tests
    .as_ref()
    .ok_or_else(|| EngineError::validation("tests", "block is required"))?;

  if repository.full_name.trim().is_empty() {
    return Err(EngineError::validation("repository.full_name", "must not be empty"));
  }
  if release.number.trim().is_empty() {
    return Err(EngineError::validation("release.number", "must not be empty"));
  }

  let created_at = match &release.created_at {
    Some(ts) => Some(
      DateTime::parse_from_rfc3339(ts)
        .map_err(|e| {
          EngineError::validation("release.created_at", &format!("invalid RFC3339: {}", e))
        })?
        .with_timezone(&Utc),
    ),
    None => None,
  };

  let identity = ReleaseIdentity {
    repository_id: repository.id,
    repository_name: repository.name.clone(),
    owner: repository.owner.clone(),
    full_name: repository.full_name.clone(),
    release_number: release.number.clone(),
    commit_sha: release.commit_sha.clone(),
    branch: release.branch.clone(),
    workflow_run_id: release.workflow_run_id.clone(),
    created_at,
  };

  let total = coverage
    .total
    .ok_or_else(|| EngineError::validation("coverage.total", "is required"))?;
  check_percent("coverage.total", total)?;

  let mut features = BTreeMap::new();
  for (name, entry) in &coverage.features {
    if name == TOTAL_KEY {
      continue;
    }
    let field = format!("coverage.{}", name);
    let Some(stats) = feature_stats(&field, entry)? else {
      warn!(key = %name, "ignoring non-feature entry in coverage block");
      continue;
    };
    check_percent(&field, stats.coverage)?;
    features.insert(name.clone(), stats);
  }

  let tests = TestSummary {
    total: tests
      .total
      .ok_or_else(|| EngineError::validation("tests.total", "is required"))?,
    passed: tests
      .passed
      .ok_or_else(|| EngineError::validation("tests.passed", "is required"))?,
    failed: tests
      .failed
      .ok_or_else(|| EngineError::validation("tests.failed", "is required"))?,
  };
  if u64::from(tests.passed) + u64::from(tests.failed) != u64::from(tests.total) {
    warn!(
      total = tests.total,
      passed = tests.passed,
      failed = tests.failed,
      "test counts do not add up; scoring as reported"
    );
  }

  let explicit_features = match &raw.features {
    Some(list) => Some(
      list
        .iter()
        .enumerate()
        .map(|(i, f)| {
          if f.name.trim().is_empty() {
            return Err(EngineError::validation(
              &format!("features[{}].name", i),
              "must not be empty",
            ));
          }
          let field = format!("features[{}].coverage", i);
          let coverage = f
            .coverage
            .ok_or_else(|| EngineError::validation(&field, "is required"))?;
          check_percent(&field, coverage)?;
          Ok(FeatureCoverage {
            name: f.name.clone(),
            coverage,
            tests_passed: f.tests_passed,
            tests_failed: f.tests_failed,
          })
        })
        .collect::<Result<Vec<_>, EngineError>>()?,
    ),
    None => None,
  };

  Ok(ValidatedRelease {
    identity,
    coverage: CoverageReport { total, features },
    tests,
    explicit_features,
  })
}

/// Classify one coverage-map entry.
///
/// A number is a bare percent; an object carrying `coverage` is a detailed
/// entry and must be well-formed. Anything else (tool names, report paths,
/// nested metadata) is not a feature and yields `None`.
fn feature_stats(
  field: &str,
  entry: &serde_json::Value,
) -> Result<Option<FeatureStats>, EngineError> {
  match entry {
    serde_json::Value::Number(n) => {
      let coverage = n
        .as_f64()
        .ok_or_else(|| EngineError::validation(field, "must be a finite number"))?;
      Ok(Some(FeatureStats {
        coverage,
        tests_passed: None,
        tests_failed: None,
      }))
    }
    serde_json::Value::Object(map) if map.contains_key("coverage") => {
      let detail: InboundFeatureDetail = serde_json::from_value(entry.clone())
        .map_err(|e| EngineError::validation(field, &format!("invalid feature entry: {}", e)))?;
      Ok(Some(FeatureStats {
        coverage: detail.coverage,
        tests_passed: detail.tests_passed,
        tests_failed: detail.tests_failed,
      }))
    }
    _ => Ok(None),
  }
}

fn check_percent(field: &str, value: f64) -> Result<(), EngineError> {
  if !value.is_finite() {
    return Err(EngineError::validation(field, "must be a finite number"));
  }
  if !(0.0..=100.0).contains(&value) {
    return Err(EngineError::validation(field, "must be within 0..=100"));
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn payload(json: &str) -> WebhookPayload {
    serde_json::from_str(json).unwrap()
  }

  const VALID: &str = r#"{
    "repository": {"id": 42, "name": "web", "owner": "acme", "full_name": "acme/web"},
    "release": {"number": "v1.4.0", "commit_sha": "abc123", "branch": "main",
                "workflow_run_id": "991", "created_at": "2026-01-31T09:00:00+02:00"},
    "coverage": {"total": 88.5, "auth": 92, "billing": {"coverage": 61.0, "tests_passed": 10, "tests_failed": 1}},
    "tests": {"total": 100, "passed": 97, "failed": 3}
  }"#;

  #[test]
  fn normalize_valid_payload() {
    let release = normalize(&payload(VALID)).unwrap();
    assert_eq!(release.identity.full_name, "acme/web");
    assert_eq!(release.identity.repository_id, Some(42));
    assert_eq!(release.coverage.total, 88.5);
    assert_eq!(release.coverage.features.len(), 2);
    assert_eq!(release.coverage.features["auth"].coverage, 92.0);
    assert_eq!(release.coverage.features["billing"].tests_failed, Some(1));
    assert_eq!(release.tests, TestSummary { total: 100, passed: 97, failed: 3 });
    assert!(release.explicit_features.is_none());
  }

  #[test]
  fn created_at_normalized_to_utc() {
    let release = normalize(&payload(VALID)).unwrap();
    let ts = release.identity.created_at.unwrap();
    assert_eq!(ts.to_rfc3339(), "2026-01-31T07:00:00+00:00");
  }

  #[test]
  fn missing_blocks_named_in_error() {
    for (json, field) in [
      (r#"{"release": {"number": "1"}, "coverage": {"total": 1}, "tests": {}}"#, "repository"),
      (r#"{"repository": {"full_name": "a/b"}, "coverage": {"total": 1}, "tests": {}}"#, "release"),
      (r#"{"repository": {"full_name": "a/b"}, "release": {"number": "1"}, "tests": {}}"#, "coverage"),
      (r#"{"repository": {"full_name": "a/b"}, "release": {"number": "1"}, "coverage": {"total": 1}}"#, "tests"),
    ] {
      let err = normalize(&payload(json)).unwrap_err();
      assert_eq!(err.field(), Some(field), "payload: {}", json);
    }
  }

  #[test]
  fn missing_numbers_rejected_not_coerced() {
    let json = r#"{
      "repository": {"full_name": "a/b"}, "release": {"number": "1"},
      "coverage": {"auth": 80}, "tests": {"total": 1, "passed": 1, "failed": 0}
    }"#;
    let err = normalize(&payload(json)).unwrap_err();
    assert_eq!(err.field(), Some("coverage.total"));

    let json = r#"{
      "repository": {"full_name": "a/b"}, "release": {"number": "1"},
      "coverage": {"total": 80}, "tests": {"total": 1, "passed": 1}
    }"#;
    let err = normalize(&payload(json)).unwrap_err();
    assert_eq!(err.field(), Some("tests.failed"));
  }

  #[test]
  fn out_of_range_coverage_rejected() {
    let json = r#"{
      "repository": {"full_name": "a/b"}, "release": {"number": "1"},
      "coverage": {"total": 80, "auth": 120}, "tests": {"total": 0, "passed": 0, "failed": 0}
    }"#;
    let err = normalize(&payload(json)).unwrap_err();
    assert_eq!(err.field(), Some("coverage.auth"));
  }

  #[test]
  fn non_feature_coverage_keys_are_skipped() {
    let json = r#"{
      "repository": {"full_name": "a/b"}, "release": {"number": "1"},
      "coverage": {"total": 80, "generated_by": "istanbul", "report": {"path": "lcov.info"},
                   "merged": true, "auth": 75},
      "tests": {"total": 0, "passed": 0, "failed": 0}
    }"#;
    let release = normalize(&payload(json)).unwrap();
    let names: Vec<&str> = release.coverage.features.keys().map(|k| k.as_str()).collect();
    assert_eq!(names, vec!["auth"]);
  }

  #[test]
  fn malformed_feature_object_names_the_key() {
    let json = r#"{
      "repository": {"full_name": "a/b"}, "release": {"number": "1"},
      "coverage": {"total": 80, "billing": {"coverage": "high"}},
      "tests": {"total": 0, "passed": 0, "failed": 0}
    }"#;
    let err = normalize(&payload(json)).unwrap_err();
    assert_eq!(err.field(), Some("coverage.billing"));
  }

  #[test]
  fn explicit_features_validated() {
    let json = r#"{
      "repository": {"full_name": "a/b"}, "release": {"number": "1"},
      "coverage": {"total": 80}, "tests": {"total": 0, "passed": 0, "failed": 0},
      "features": [{"name": "auth", "coverage": 75}, {"name": "search"}]
    }"#;
    let err = normalize(&payload(json)).unwrap_err();
    assert_eq!(err.field(), Some("features[1].coverage"));
  }

  #[test]
  fn inconsistent_test_counts_accepted() {
    let json = r#"{
      "repository": {"full_name": "a/b"}, "release": {"number": "1"},
      "coverage": {"total": 80}, "tests": {"total": 10, "passed": 3, "failed": 1}
    }"#;
    let release = normalize(&payload(json)).unwrap();
    assert_eq!(release.tests.total, 10);
  }

  #[test]
  fn bad_created_at_rejected() {
    let json = r#"{
      "repository": {"full_name": "a/b"}, "release": {"number": "1", "created_at": "yesterday"},
      "coverage": {"total": 80}, "tests": {"total": 0, "passed": 0, "failed": 0}
    }"#;
    let err = normalize(&payload(json)).unwrap_err();
    assert!(err.to_string().contains("created_at"));
  }
}
