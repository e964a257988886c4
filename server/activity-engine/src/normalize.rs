//! Normalize raw store hits into canonical, time-ordered Event models.

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::error::EngineError;
use crate::types::*;

/// Timestamp profile used by enriched documents: date + time, no zone.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Parse a timestamp in the fixed profile.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
  NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).ok()
}

/// Human-readable handle for a hit in diagnostics.
fn record_label(hit: &RawHit, position: usize) -> String {
  if hit.id.is_empty() {
    format!("hit #{}", position)
  } else {
    format!("hit {}", hit.id)
  }
}

/// Parse and validate one commit hit into an Event.
pub fn commit_event(hit: &RawHit, position: usize) -> Result<Event, EngineError> {
  let label = || record_label(hit, position);

  let commit = CommitHit::deserialize(&hit.source)
    .map_err(|e| EngineError::input_format(label(), format!("invalid commit document: {}", e)))?;

  if commit.author_name.is_empty() {
    return Err(EngineError::input_format(label(), "author_name must not be empty"));
  }

  let timestamp = parse_timestamp(&commit.commit_date).ok_or_else(|| {
    EngineError::input_format(
      label(),
      format!(
        "commit_date {:?} does not match {}",
        commit.commit_date, TIMESTAMP_FORMAT
      ),
    )
  })?;

  Ok(Event::commit(commit.author_name, timestamp))
}

/// Normalize a batch of commit hits into ascending timestamp order.
///
/// The sort is stable: equal timestamps keep their input order. Any malformed
/// hit aborts the whole batch.
pub fn normalize_commits(hits: &[RawHit]) -> Result<Vec<Event>, EngineError> {
  let mut events = hits
    .iter()
    .enumerate()
    .map(|(i, hit)| commit_event(hit, i))
    .collect::<Result<Vec<_>, EngineError>>()?;

  events.sort_by_key(|e| e.timestamp);
  Ok(events)
}
