//! Structured error types for the report runner.

use std::time::Duration;

use activity_engine::EngineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
  #[error(transparent)]
  Engine(#[from] EngineError),

  /// The store could not be reached or rejected the request.
  #[error("query: {index}: {reason}")]
  Query { index: String, reason: String },

  #[error("query: {index}: index not found")]
  IndexNotFound { index: String },

  #[error("query: {index}: timed out after {after:?}")]
  Timeout { index: String, after: Duration },

  #[error("ingest: {repo}: {reason}")]
  Ingest { repo: String, reason: String },

  #[error("io: {path}: {source}")]
  Io {
    path: String,
    #[source]
    source: std::io::Error,
  },

  #[error("csv: {0}")]
  Csv(#[from] csv::Error),
}

impl ReportError {
  pub fn query(index: &str, reason: impl Into<String>) -> Self {
    Self::Query {
      index: index.to_string(),
      reason: reason.into(),
    }
  }

  pub fn ingest(repo: &str, reason: impl Into<String>) -> Self {
    Self::Ingest {
      repo: repo.to_string(),
      reason: reason.into(),
    }
  }

  pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
    Self::Io {
      path: path.as_ref().display().to_string(),
      source,
    }
  }

  /// Transient store failures are worth another attempt; everything else is final.
  pub fn is_retryable(&self) -> bool {
    matches!(self, Self::Query { .. } | Self::Timeout { .. })
  }
}
