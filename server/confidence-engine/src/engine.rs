//! Core engine: validates a delivery and runs the scoring pipeline.

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::EngineError;
use crate::features;
use crate::normalize;
use crate::risk;
use crate::score;
use crate::ship;
use crate::signature;
use crate::types::*;

/// Signature policy for one raw delivery.
#[derive(Debug, Clone, Copy)]
pub enum Verification<'a> {
  /// Check `header` against `secret`; a missing value rejects the delivery.
  Required {
    header: Option<&'a str>,
    secret: Option<&'a str>,
  },
  /// Local replays only.
  Skip,
}

/// The release confidence engine. Holds only its policy; every call is
/// independent, so one instance can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct Engine {
  config: Config,
}

impl Engine {
  pub fn new(config: Config) -> Self {
    Self { config }
  }

  pub fn with_defaults() -> Self {
    Self::new(Config::default())
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  /// Score validated inputs: pass rate, risk score, confidence, level, time.
  pub fn score(
    &self,
    coverage: &CoverageReport,
    tests: &TestSummary,
    features: &[FeatureCoverage],
  ) -> ScoreResult {
    let pass_rate = score::pass_rate(tests.passed, tests.total);
    let risk_score =
      score::risk_score(coverage.total, tests.failed, tests.total, features, &self.config);
    let release_confidence =
      score::release_confidence(coverage.total, pass_rate, risk_score, &self.config);
    let risk_level = risk::risk_level(coverage.total, &self.config);
    let (time_to_ship_minutes, time_to_ship) =
      ship::time_to_ship(coverage.total, risk_score, &self.config);

    debug!(
      coverage = coverage.total,
      pass_rate,
      risk_score,
      release_confidence,
      ?risk_level,
      %time_to_ship,
      "scored release"
    );

    ScoreResult {
      release_confidence,
      risk_score,
      risk_level,
      time_to_ship,
      time_to_ship_minutes,
      pass_rate,
    }
  }

  /// Risk items for validated inputs, most severe first.
  pub fn risk_items(
    &self,
    coverage: &CoverageReport,
    tests: &TestSummary,
    features: &[FeatureCoverage],
  ) -> Vec<RiskItem> {
    risk::generate_risk_items(coverage.total, tests.failed, features, &self.config)
  }

  /// Validate one webhook payload and produce its full assessment.
  pub fn assess(&self, raw: &WebhookPayload) -> Result<Assessment, EngineError> {
    let release = normalize::normalize(raw)?;
    let features =
      features::derive_features(&release.coverage, release.explicit_features.as_deref());

    let score = self.score(&release.coverage, &release.tests, &features);
    let risks = self.risk_items(&release.coverage, &release.tests, &features);
    let decision = ship::ship_decision(score.release_confidence, &self.config);
    let recommendation = ship::recommendation(score.risk_level, &risks, &score.time_to_ship);

    let metrics = ReleaseMetrics {
      release_confidence: score.release_confidence,
      test_coverage: release.coverage.total,
      risk_level: score.risk_level,
      time_to_ship: score.time_to_ship.clone(),
      pass_rate: score.pass_rate,
      total_tests: release.tests.total,
      failed_tests: release.tests.failed,
    };

    let report_id = report_id(&release.identity);
    info!(
      %report_id,
      repository = %release.identity.full_name,
      release = %release.identity.release_number,
      confidence = score.release_confidence,
      risks = risks.len(),
      ?decision,
      "release assessed"
    );

    Ok(Assessment {
      report_id,
      release: release.identity,
      score,
      metrics,
      decision,
      recommendation,
      features,
      risks,
    })
  }

  /// Gate a raw webhook body on its signature, then parse and assess it.
  ///
  /// Nothing is parsed before the signature check passes.
  pub fn assess_delivery(
    &self,
    raw: &[u8],
    verification: Verification<'_>,
  ) -> Result<Assessment, EngineError> {
    match verification {
      Verification::Required { header, secret } => {
        if let Err(e) = signature::check(raw, header.unwrap_or(""), secret.unwrap_or("")) {
          warn!(error = %e, "rejected delivery");
          return Err(e);
        }
      }
      Verification::Skip => warn!("signature verification disabled"),
    }

    let payload: WebhookPayload = serde_json::from_slice(raw)?;
    self.assess(&payload)
  }
}

/// Stable report ID: hash of repository + release number + commit.
fn report_id(identity: &ReleaseIdentity) -> String {
  let mut hasher = blake3::Hasher::new();
  hasher.update(identity.full_name.as_bytes());
  hasher.update(b"|");
  hasher.update(identity.release_number.as_bytes());
  hasher.update(b"|");
  hasher.update(identity.commit_sha.as_deref().unwrap_or("").as_bytes());
  let hex = hasher.finalize().to_hex();
  format!("rel-{}", &hex[..16])
}
