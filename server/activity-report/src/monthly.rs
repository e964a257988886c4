//! Monthly committer report against the event store.

use activity_engine::{Engine, MonthlyReport, RawHit};
use tracing::{info, warn};

use crate::error::ReportError;
use crate::retry::RetryPolicy;
use crate::store::{EventStore, SearchQuery};

pub const COMMIT_DATE_FIELD: &str = "commit_date";
pub const AUTHOR_FIELD: &str = "author_name";

/// Every commit document in `enrich_index`, author + date only, sorted by date.
pub async fn fetch_commits(
  store: &dyn EventStore,
  enrich_index: &str,
  retry: &RetryPolicy,
) -> Result<Vec<RawHit>, ReportError> {
  let query = SearchQuery {
    filter: None,
    sort: Some(COMMIT_DATE_FIELD.to_string()),
    fields: vec![COMMIT_DATE_FIELD.to_string(), AUTHOR_FIELD.to_string()],
  };
  let hits = retry.run_untimed(enrich_index, || store.scan(enrich_index, &query)).await?;
  if hits.is_empty() {
    warn!(index = enrich_index, "no commit documents found");
  }
  Ok(hits)
}

/// Fetch, normalize and aggregate one project's commits.
pub async fn monthly_report(
  store: &dyn EventStore,
  engine: &Engine,
  enrich_index: &str,
  retry: &RetryPolicy,
) -> Result<MonthlyReport, ReportError> {
  let hits = fetch_commits(store, enrich_index, retry).await?;
  let report = engine.monthly_report(&hits)?;
  info!(
    index = enrich_index,
    commits = hits.len(),
    months_with_new_committers = report.new_committers.len(),
    author_rows = report.commits_by_author.len(),
    "monthly report built"
  );
  Ok(report)
}
