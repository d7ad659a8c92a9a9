//! Core types for the confidence engine (JSON contracts + validated models).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

// ---------------------------------------------------------------------------
// Inbound types (JSON contract: what the CI workflow posts)
// ---------------------------------------------------------------------------

/// Raw coverage webhook body. Unknown fields are silently ignored; every block
/// is optional here so the normalizer can name what is missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
  #[serde(default)]
  pub repository: Option<InboundRepository>,
  #[serde(default)]
  pub release: Option<InboundRelease>,
  #[serde(default)]
  pub coverage: Option<InboundCoverage>,
  #[serde(default)]
  pub tests: Option<InboundTests>,
  #[serde(default)]
  pub features: Option<Vec<InboundFeature>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundRepository {
  #[serde(default)]
  pub id: Option<u64>,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub owner: String,
  #[serde(default)]
  pub full_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundRelease {
  #[serde(default)]
  pub number: String,
  #[serde(default)]
  pub commit_sha: Option<String>,
  #[serde(default)]
  pub branch: Option<String>,
  #[serde(default)]
  pub workflow_run_id: Option<String>,
  #[serde(default)]
  pub created_at: Option<String>,
}

/// Coverage block: `total` plus one key per feature. Entries stay raw JSON so
/// the normalizer can tell features from tool metadata and name bad keys.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundCoverage {
  #[serde(default)]
  pub total: Option<f64>,
  #[serde(flatten)]
  pub features: BTreeMap<String, serde_json::Value>,
}

/// Object form of a coverage-map feature entry.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundFeatureDetail {
  pub coverage: f64,
  #[serde(default)]
  pub tests_passed: Option<u32>,
  #[serde(default)]
  pub tests_failed: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundTests {
  #[serde(default)]
  pub total: Option<u32>,
  #[serde(default)]
  pub passed: Option<u32>,
  #[serde(default)]
  pub failed: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundFeature {
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub coverage: Option<f64>,
  #[serde(default)]
  pub tests_passed: Option<u32>,
  #[serde(default)]
  pub tests_failed: Option<u32>,
}

// ---------------------------------------------------------------------------
// Validated inputs
// ---------------------------------------------------------------------------

/// Per-feature numbers carried in the coverage map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureStats {
  pub coverage: f64,
  pub tests_passed: Option<u32>,
  pub tests_failed: Option<u32>,
}

/// Overall coverage plus the per-feature map (feature name -> stats).
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageReport {
  pub total: f64,
  pub features: BTreeMap<String, FeatureStats>,
}

/// Test counts. `passed + failed == total` is expected but not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestSummary {
  pub total: u32,
  pub passed: u32,
  pub failed: u32,
}

/// Coverage of one feature, either supplied by the caller or derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCoverage {
  pub name: String,
  pub coverage: f64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub tests_passed: Option<u32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub tests_failed: Option<u32>,
}

/// Repository + release identity, echoed back for the persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReleaseIdentity {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub repository_id: Option<u64>,
  pub repository_name: String,
  pub owner: String,
  pub full_name: String,
  pub release_number: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub commit_sha: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub branch: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub workflow_run_id: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub created_at: Option<DateTime<Utc>>,
}

/// Payload after structural validation; every required number is present.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRelease {
  pub identity: ReleaseIdentity,
  pub coverage: CoverageReport,
  pub tests: TestSummary,
  pub explicit_features: Option<Vec<FeatureCoverage>>,
}

// ---------------------------------------------------------------------------
// Levels
// ---------------------------------------------------------------------------

/// Release risk level, read from overall coverage alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
  Critical,
  High,
  Medium,
  Low,
}

/// Level of a single risk item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskItemLevel {
  High,
  Medium,
  Low,
  Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShipDecision {
  Ship,
  Wait,
  Block,
}

// ---------------------------------------------------------------------------
// Output types (JSON contract: what we emit)
// ---------------------------------------------------------------------------

/// One discrete finding. Field names match the `risk_items` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskItem {
  #[serde(rename = "risk_name")]
  pub name: String,
  #[serde(rename = "risk_level")]
  pub level: RiskItemLevel,
  pub severity: u8,
  pub description: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub affected_feature: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub recommendation: Option<String>,
  pub auto_generated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
  pub release_confidence: f64,
  pub risk_score: f64,
  pub risk_level: RiskLevel,
  pub time_to_ship: String,
  pub time_to_ship_minutes: u32,
  pub pass_rate: f64,
}

/// Release-detail metrics in the shape the dashboard reads.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseMetrics {
  pub release_confidence: f64,
  pub test_coverage: f64,
  pub risk_level: RiskLevel,
  pub time_to_ship: String,
  pub pass_rate: f64,
  pub total_tests: u32,
  pub failed_tests: u32,
}

/// Everything one webhook delivery produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
  pub report_id: String,
  pub release: ReleaseIdentity,
  pub score: ScoreResult,
  pub metrics: ReleaseMetrics,
  pub decision: ShipDecision,
  pub recommendation: String,
  pub features: Vec<FeatureCoverage>,
  pub risks: Vec<RiskItem>,
}

// ---------------------------------------------------------------------------
// CLI stream wrappers
// ---------------------------------------------------------------------------

/// Structured error output for rejected deliveries.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorOutput {
  pub error: bool,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub field: Option<String>,
}

impl ErrorOutput {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      error: true,
      message: message.into(),
      field: None,
    }
  }

  pub fn with_field(mut self, field: impl Into<String>) -> Self {
    self.field = Some(field.into());
    self
  }
}

impl From<&EngineError> for ErrorOutput {
  /// Validation errors carry the bare reason plus the field; everything else
  /// keeps its full message.
  fn from(e: &EngineError) -> Self {
    match e {
      EngineError::Validation { field, reason } => {
        ErrorOutput::new(reason.clone()).with_field(field.clone())
      }
      _ => ErrorOutput::new(e.to_string()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn validation_envelope_does_not_repeat_field() {
    let err = EngineError::validation("tests.total", "is required");
    let out = ErrorOutput::from(&err);
    assert_eq!(out.message, "is required");
    assert_eq!(out.field.as_deref(), Some("tests.total"));

    let json = serde_json::to_value(&out).unwrap();
    assert_eq!(json["error"], true);
    assert_eq!(json["field"], "tests.total");
  }

  #[test]
  fn other_errors_keep_full_message() {
    let out = ErrorOutput::from(&EngineError::signature("signature mismatch"));
    assert_eq!(out.message, "signature: signature mismatch");
    assert!(out.field.is_none());
  }
}
