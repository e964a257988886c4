//! Windowed activity ranking policy: window threshold, PR/issue classification, stable ordering.

use chrono::{Months, NaiveDateTime};
use serde::Deserialize;

use crate::error::EngineError;
use crate::types::{EventKind, IssueHit, RawHit, RepoActivityRecord};

/// Lower bound of the trailing window: `now` minus `months` calendar months.
///
/// Days past the end of the target month clamp to its last day. Only events
/// strictly after the threshold count.
pub fn window_threshold(now: NaiveDateTime, months: u32) -> NaiveDateTime {
  now
    .checked_sub_months(Months::new(months))
    .unwrap_or(NaiveDateTime::MIN)
}

/// Count (pull_requests, issues) among GitHub hits.
pub fn classify(hits: &[RawHit]) -> Result<(u64, u64), EngineError> {
  let mut prs = 0;
  let mut issues = 0;
  for (i, hit) in hits.iter().enumerate() {
    let issue = IssueHit::deserialize(&hit.source).map_err(|e| {
      let record = if hit.id.is_empty() {
        format!("hit #{}", i)
      } else {
        format!("hit {}", hit.id)
      };
      EngineError::input_format(record, format!("invalid issue document: {}", e))
    })?;
    match issue.kind() {
      EventKind::PullRequest => prs += 1,
      _ => issues += 1,
    }
  }
  Ok((prs, issues))
}

/// Sort descending by total. Stable: equal totals keep input order.
pub fn rank(mut records: Vec<RepoActivityRecord>) -> Vec<RepoActivityRecord> {
  records.sort_by(|a, b| b.total.cmp(&a.total));
  records
}
