//! Time-to-ship estimate, ship decision, and the recommendation line.

use crate::config::Config;
use crate::types::{RiskItem, RiskItemLevel, RiskLevel, ShipDecision};

/// Minutes until the release is considered safe.
///
/// Each signal maps to a band on its own; the slower band wins, so more
/// coverage or less risk can only shorten the estimate.
pub fn time_to_ship_minutes(coverage_percent: f64, risk_score: f64, config: &Config) -> u32 {
  let by_coverage = config
    .coverage_ship_bands
    .iter()
    .find(|b| coverage_percent >= b.threshold)
    .map(|b| b.minutes)
    .unwrap_or(config.slowest_ship_minutes);
  let by_risk = config
    .risk_ship_bands
    .iter()
    .find(|b| risk_score <= b.threshold)
    .map(|b| b.minutes)
    .unwrap_or(config.slowest_ship_minutes);
  by_coverage.max(by_risk)
}

/// "30m", "4h", "2h 15m".
pub fn format_minutes(minutes: u32) -> String {
  let (h, m) = (minutes / 60, minutes % 60);
  match (h, m) {
    (0, m) => format!("{}m", m),
    (h, 0) => format!("{}h", h),
    (h, m) => format!("{}h {}m", h, m),
  }
}

/// Minutes and their display string.
pub fn time_to_ship(coverage_percent: f64, risk_score: f64, config: &Config) -> (u32, String) {
  let minutes = time_to_ship_minutes(coverage_percent, risk_score, config);
  (minutes, format_minutes(minutes))
}

pub fn ship_decision(release_confidence: f64, config: &Config) -> ShipDecision {
  if release_confidence >= config.ship_confidence {
    ShipDecision::Ship
  } else if release_confidence >= config.wait_confidence {
    ShipDecision::Wait
  } else {
    ShipDecision::Block
  }
}

/// Dashboard recommendation: High items first, then the release risk level.
pub fn recommendation(risk_level: RiskLevel, risks: &[RiskItem], time_to_ship: &str) -> String {
  let high: Vec<&str> = risks
    .iter()
    .filter(|r| r.level == RiskItemLevel::High)
    .map(|r| r.name.as_str())
    .collect();

  let lead = if !high.is_empty() {
    format!(
      "High priority: Address {} critical issue(s) ({}) before deploying to production.",
      high.len(),
      high.join(", ")
    )
  } else {
    match risk_level {
      RiskLevel::Low => {
        "All systems go! Release confidence is excellent. You're ready to ship.".to_string()
      }
      RiskLevel::Medium => {
        "Release confidence is good, but consider improving test coverage for better confidence."
          .to_string()
      }
      RiskLevel::High | RiskLevel::Critical => {
        "Review the risk summary below before proceeding with deployment.".to_string()
      }
    }
  };

  format!("{} Estimated time to ship: {}", lead, time_to_ship)
}
