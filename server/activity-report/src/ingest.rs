//! Ingestion boundary: populate raw/enriched indices for one repository and source.

use std::path::PathBuf;

use activity_engine::types::IndexNameSet;
use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::ReportError;

/// Where the ingestor reads the repository from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoLocator {
  /// Clone URL, for `git`.
  Url(String),
  /// Owner + repository name, for `github`.
  GitHub { owner: String, name: String },
}

#[derive(Debug, Clone)]
pub struct IngestRequest {
  pub indices: IndexNameSet,
  pub store_address: String,
  pub locator: RepoLocator,
  pub credential: Option<String>,
}

impl IngestRequest {
  pub fn git(indices: IndexNameSet, store_address: &str, url: &str) -> Self {
    Self {
      indices,
      store_address: store_address.to_string(),
      locator: RepoLocator::Url(url.to_string()),
      credential: None,
    }
  }

  pub fn github(
    indices: IndexNameSet,
    store_address: &str,
    owner: &str,
    name: &str,
    token: &str,
  ) -> Self {
    Self {
      indices,
      store_address: store_address.to_string(),
      locator: RepoLocator::GitHub {
        owner: owner.to_string(),
        name: name.to_string(),
      },
      credential: Some(token.to_string()),
    }
  }
}

#[async_trait]
pub trait Ingestor: Send + Sync {
  async fn run(&self, request: &IngestRequest) -> Result<(), ReportError>;
}

/// Runs `p2o.py` directly (no shell) with the enrich pipeline arguments.
#[derive(Debug, Clone)]
pub struct P2oIngestor {
  program: PathBuf,
}

impl P2oIngestor {
  pub fn new(program: impl Into<PathBuf>) -> Self {
    Self {
      program: program.into(),
    }
  }

  /// Argument vector for one request.
  pub fn args(request: &IngestRequest) -> Vec<String> {
    let mut args = vec![
      "--enrich".to_string(),
      "--index".to_string(),
      request.indices.raw_index.clone(),
      "--index-enrich".to_string(),
      request.indices.enrich_index.clone(),
      "-e".to_string(),
      request.store_address.clone(),
      "--no_inc".to_string(),
      "--debug".to_string(),
      request.indices.source.to_string(),
    ];
    match &request.locator {
      RepoLocator::Url(url) => args.push(url.clone()),
      RepoLocator::GitHub { owner, name } => {
        args.push(owner.clone());
        args.push(name.clone());
      }
    }
    if let Some(token) = &request.credential {
      args.push("-t".to_string());
      args.push(token.clone());
    }
    args
  }
}

#[async_trait]
impl Ingestor for P2oIngestor {
  async fn run(&self, request: &IngestRequest) -> Result<(), ReportError> {
    let repo = &request.indices.repo;
    info!(
      repo = %repo,
      source = %request.indices.source,
      raw = %request.indices.raw_index,
      enrich = %request.indices.enrich_index,
      "ingesting"
    );
    debug!(program = %self.program.display(), "launching ingestor");

    let status = tokio::process::Command::new(&self.program)
      .args(Self::args(request))
      .status()
      .await
      .map_err(|e| {
        ReportError::ingest(repo, format!("cannot launch {}: {}", self.program.display(), e))
      })?;

    if !status.success() {
      return Err(ReportError::ingest(
        repo,
        format!("{} exited with {}", self.program.display(), status),
      ));
    }
    Ok(())
  }
}
