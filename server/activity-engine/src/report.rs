//! Project aggregation state into the two monthly tables.

use tracing::warn;

use crate::types::{AggregationState, CommitsByAuthorRow, MonthlyReport, NewCommitterRow};

/// One row per month with at least one new committer, in first-occurrence order.
pub fn new_committer_table(state: &AggregationState) -> Vec<NewCommitterRow> {
  state
    .months()
    .filter(|(_, bucket)| bucket.new_committer_count > 0)
    .map(|(key, bucket)| NewCommitterRow {
      month: key.to_string(),
      new_committers: bucket.new_committer_count,
    })
    .collect()
}

/// One row per (month, author) with a positive count: month order, then author order.
pub fn commits_by_author_table(state: &AggregationState) -> Vec<CommitsByAuthorRow> {
  state
    .months()
    .flat_map(|(key, bucket)| {
      let month = key.to_string();
      bucket
        .commits_by_author()
        .filter(|(_, commits)| *commits > 0)
        .map(move |(author, commits)| CommitsByAuthorRow {
          month: month.clone(),
          author: author.to_string(),
          commits,
        })
    })
    .collect()
}

pub fn materialize(state: &AggregationState) -> MonthlyReport {
  if state.is_empty() {
    warn!("no commit events matched; emitting header-only tables");
  }
  MonthlyReport {
    new_committers: new_committer_table(state),
    commits_by_author: commits_by_author_table(state),
  }
}
