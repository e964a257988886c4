//! Report runs: resolve inputs, optionally ingest, query, write tables.

use std::path::{Path, PathBuf};

use activity_engine::index_names::{self, repo_name_from_locator};
use activity_engine::registry::{parse_index_file, parse_registry};
use activity_engine::types::{IndexNameSet, IndexOverrides, SourceKind};
use activity_engine::{Engine, EngineError, MonthlyReport, RepoDescriptor};
use chrono::NaiveDateTime;
use tracing::{info, warn};

use crate::error::ReportError;
use crate::ingest::{IngestRequest, Ingestor};
use crate::monthly;
use crate::output;
use crate::ranker::{self, RankingOutcome};
use crate::retry::RetryPolicy;
use crate::store::EventStore;

/// Inputs for one monthly report.
#[derive(Debug, Clone)]
pub struct MonthlyJob {
  pub repo: Option<String>,
  pub raw: Option<String>,
  pub enrich: Option<String>,
  pub create: bool,
  pub store_address: String,
  pub new_committers_path: PathBuf,
  pub commits_path: PathBuf,
}

impl MonthlyJob {
  /// Index names for this job. Fails before any store interaction when
  /// required identifiers are missing.
  pub fn indices(&self) -> Result<IndexNameSet, EngineError> {
    let repo_name = self.repo.as_deref().and_then(repo_name_from_locator);

    if self.create && repo_name.is_none() {
      return Err(EngineError::config(
        "repo",
        "repository is mandatory when creating indices",
      ));
    }

    let name = match (&repo_name, &self.enrich) {
      (Some(name), _) => name.clone(),
      (None, Some(enrich)) => enrich.clone(),
      (None, None) => {
        return Err(EngineError::config(
          "enrich",
          "an enriched index name or a repository is required",
        ))
      }
    };

    let overrides = IndexOverrides {
      raw: self.raw.clone(),
      enrich: self.enrich.clone(),
    };
    Ok(index_names::resolve(&name, SourceKind::Git, &overrides))
  }
}

/// Run the monthly report and write both tables.
///
/// Tables are only written once the whole report has been built.
pub async fn run_monthly(
  job: &MonthlyJob,
  engine: &Engine,
  store: &dyn EventStore,
  ingestor: &dyn Ingestor,
  retry: &RetryPolicy,
) -> Result<MonthlyReport, ReportError> {
  let indices = job.indices()?;

  if job.create {
    let url = job.repo.as_deref().unwrap_or_default();
    ingestor
      .run(&IngestRequest::git(indices.clone(), &job.store_address, url))
      .await?;
  }

  let report = monthly::monthly_report(store, engine, &indices.enrich_index, retry).await?;
  let (a, b) = output::write_monthly(&report, &job.new_committers_path, &job.commits_path)?;
  info!(new_committers = %a.display(), commits = %b.display(), "wrote monthly tables");
  Ok(report)
}

/// Where the ranking's repository list comes from.
#[derive(Debug, Clone)]
pub enum RepoSource {
  /// Owner-grouped registry; indices are created before querying.
  Registry(PathBuf),
  /// Flat list of enriched index names; query only.
  IndexFile(PathBuf),
}

#[derive(Debug, Clone)]
pub struct RankingJob {
  pub source: RepoSource,
  pub token: Option<String>,
  pub store_address: String,
  pub out_file: PathBuf,
}

fn read_document(path: &Path) -> Result<String, ReportError> {
  std::fs::read_to_string(path).map_err(|e| ReportError::io(path, e))
}

/// Load the repository list in document order.
pub fn load_repositories(source: &RepoSource) -> Result<Vec<RepoDescriptor>, ReportError> {
  let repos = match source {
    RepoSource::Registry(path) => {
      parse_registry(&read_document(path)?, &path.display().to_string())?
    }
    RepoSource::IndexFile(path) => {
      parse_index_file(&read_document(path)?, &path.display().to_string())?
    }
  };
  Ok(repos)
}

/// Ingest git and GitHub data for every repository. Failures are logged, not fatal.
async fn ingest_all(
  repos: &[RepoDescriptor],
  token: &str,
  store_address: &str,
  ingestor: &dyn Ingestor,
) {
  for repo in repos {
    let url = repo.url.as_deref().unwrap_or_default();
    let git = IngestRequest::git(repo.indices(SourceKind::Git), store_address, url);
    if let Err(e) = ingestor.run(&git).await {
      warn!(repo = %repo.name, error = %e, "git ingestion failed");
    }

    let owner = repo.owner.as_deref().unwrap_or_default();
    let github = IngestRequest::github(
      repo.indices(SourceKind::Github),
      store_address,
      owner,
      &repo.name,
      token,
    );
    if let Err(e) = ingestor.run(&github).await {
      warn!(repo = %repo.name, error = %e, "github ingestion failed");
    }
  }
}

/// Run the ranking report and write its table.
pub async fn run_ranking(
  job: &RankingJob,
  engine: &Engine,
  store: &dyn EventStore,
  ingestor: &dyn Ingestor,
  retry: &RetryPolicy,
  now: NaiveDateTime,
) -> Result<RankingOutcome, ReportError> {
  let repos = load_repositories(&job.source)?;

  if let RepoSource::Registry(_) = job.source {
    let token = job
      .token
      .as_deref()
      .filter(|t| !t.is_empty())
      .ok_or_else(|| EngineError::config("token", "a GitHub token is required to create indices"))?;
    ingest_all(&repos, token, &job.store_address, ingestor).await;
  }

  let threshold = engine.window_threshold(now);
  info!(repos = repos.len(), threshold = %threshold, "ranking repositories");
  let outcome = ranker::rank_repositories(store, &repos, threshold, retry).await;

  let path = output::write_ranking(&outcome.records, &job.out_file)?;
  info!(path = %path.display(), ranked = outcome.records.len(), skipped = outcome.failed.len(), "wrote ranking table");
  Ok(outcome)
}
