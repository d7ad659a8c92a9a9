//! PushLog Release Confidence Engine: deterministic, rule-based scoring.
//!
//! Verifies coverage webhook signatures, validates the payload into typed
//! inputs, and scores the release: pass rate, risk score, release confidence,
//! risk level, time to ship, and a severity-ordered list of risk items.
//!
//! No DB, no network, no shared state; pure computation per delivery.

pub mod config;
pub mod engine;
pub mod error;
pub mod features;
pub mod normalize;
pub mod risk;
pub mod score;
pub mod ship;
pub mod signature;
pub mod types;

pub use config::Config;
pub use engine::{Engine, Verification};
pub use error::EngineError;
pub use types::{Assessment, RiskItem, RiskLevel, ScoreResult, WebhookPayload};
