//! Structured error types for the confidence engine.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
  #[error("validation: {field}: {reason}")]
  Validation { field: String, reason: String },

  #[error("signature: {0}")]
  Signature(String),

  #[error("config: {0}")]
  Config(String),

  #[error("json: {0}")]
  Json(#[from] serde_json::Error),

  #[error("io: {0}")]
  Io(#[from] std::io::Error),
}

impl EngineError {
  pub fn validation(field: &str, reason: &str) -> Self {
    Self::Validation {
      field: field.to_string(),
      reason: reason.to_string(),
    }
  }

  pub fn signature(msg: impl Into<String>) -> Self {
    Self::Signature(msg.into())
  }

  pub fn config(msg: impl Into<String>) -> Self {
    Self::Config(msg.into())
  }

  /// Field name for validation failures, used by the CLI error envelope.
  pub fn field(&self) -> Option<&str> {
    match self {
      Self::Validation { field, .. } => Some(field),
      _ => None,
    }
  }

  /// Process exit code for the CLI: 2 for a rejected signature, 1 otherwise.
  pub fn exit_code(&self) -> i32 {
    match self {
      Self::Signature(_) => 2,
      _ => 1,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn signature_rejections_exit_with_two() {
    assert_eq!(EngineError::signature("missing signature header").exit_code(), 2);
    assert_eq!(EngineError::validation("tests", "block is required").exit_code(), 1);
    assert_eq!(EngineError::config("bad policy").exit_code(), 1);
  }
}
