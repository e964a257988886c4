//! Structured error types for the activity engine.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
  /// Required repository/index identifiers are missing.
  #[error("config: {field}: {reason}")]
  Config { field: String, reason: String },

  /// A record or document does not match the expected shape.
  #[error("input format: {record}: {reason}")]
  InputFormat { record: String, reason: String },

  #[error("json: {0}")]
  Json(#[from] serde_json::Error),
}

impl EngineError {
  pub fn config(field: &str, reason: &str) -> Self {
    Self::Config {
      field: field.to_string(),
      reason: reason.to_string(),
    }
  }

  pub fn input_format(record: impl Into<String>, reason: impl Into<String>) -> Self {
    Self::InputFormat {
      record: record.into(),
      reason: reason.into(),
    }
  }
}
