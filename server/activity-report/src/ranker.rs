//! Repository activity ranking against the event store.

use activity_engine::ranking;
use activity_engine::types::{RepoActivityRecord, SourceKind};
use activity_engine::RepoDescriptor;
use chrono::NaiveDateTime;
use tracing::{info, warn};

use crate::error::ReportError;
use crate::retry::RetryPolicy;
use crate::store::{EventStore, RangeFilter, SearchQuery};

/// Commit date field in enriched git indices.
pub const COMMIT_WINDOW_FIELD: &str = "author_date";
/// Creation date field in enriched GitHub indices.
pub const ISSUE_WINDOW_FIELD: &str = "created_at";

/// Ranked records plus the repositories that were skipped.
#[derive(Debug, Default)]
pub struct RankingOutcome {
  pub records: Vec<RepoActivityRecord>,
  pub failed: Vec<(String, ReportError)>,
}

/// Windowed activity for a single repository.
pub async fn repo_activity(
  store: &dyn EventStore,
  repo: &RepoDescriptor,
  threshold: NaiveDateTime,
  retry: &RetryPolicy,
) -> Result<RepoActivityRecord, ReportError> {
  let git = repo.indices(SourceKind::Git);
  let github = repo.indices(SourceKind::Github);

  let commit_filter = RangeFilter::after(COMMIT_WINDOW_FIELD, threshold);
  let commit_count = retry
    .run(&git.enrich_index, || store.count(&git.enrich_index, Some(&commit_filter)))
    .await?;

  let issue_query = SearchQuery {
    fields: vec!["pull_request".to_string()],
    ..SearchQuery::filtered(RangeFilter::after(ISSUE_WINDOW_FIELD, threshold))
  };
  let hits = retry
    .run_untimed(&github.enrich_index, || store.scan(&github.enrich_index, &issue_query))
    .await?;
  let (pr_count, issue_count) = ranking::classify(&hits)?;

  Ok(RepoActivityRecord::new(&repo.name, commit_count, pr_count, issue_count))
}

/// Query every repository in order, skip the ones that fail, then rank.
pub async fn rank_repositories(
  store: &dyn EventStore,
  repos: &[RepoDescriptor],
  threshold: NaiveDateTime,
  retry: &RetryPolicy,
) -> RankingOutcome {
  let mut outcome = RankingOutcome::default();

  for repo in repos {
    match repo_activity(store, repo, threshold, retry).await {
      Ok(record) => {
        info!(
          repo = %record.name,
          commits = record.commit_count,
          prs = record.pr_count,
          issues = record.issue_count,
          "repository activity"
        );
        outcome.records.push(record);
      }
      Err(e) => {
        warn!(repo = %repo.name, error = %e, "skipping repository");
        outcome.failed.push((repo.name.clone(), e));
      }
    }
  }

  if repos.is_empty() {
    warn!("no repositories to rank; emitting header-only table");
  }

  outcome.records = ranking::rank(outcome.records);
  outcome
}
