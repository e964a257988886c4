//! Monthly aggregation: month bucketing, new-committer detection, per-author commit counts.

use crate::config::AccumulationMode;
use crate::error::EngineError;
use crate::types::{AggregationState, Event, MonthKey};

/// Record one event into the aggregation state.
///
/// - Appends a fresh bucket the first time a month is seen.
/// - Counts the author as a new committer of this month on their first-ever event.
/// - Credits the commit to the (month, author) cell according to `mode`.
///
/// Events must arrive in non-decreasing timestamp order.
pub fn record_event(
  state: &mut AggregationState,
  event: &Event,
  mode: AccumulationMode,
) -> Result<(), EngineError> {
  if let Some(last) = state.last_timestamp {
    if event.timestamp < last {
      return Err(EngineError::input_format(
        format!("event by {}", event.author),
        format!("timestamp {} precedes {}", event.timestamp, last),
      ));
    }
  }
  state.last_timestamp = Some(event.timestamp);

  let key = MonthKey::of(&event.timestamp);
  let is_new = !state.seen_authors.contains(&event.author);
  if is_new {
    state.seen_authors.insert(event.author.clone());
  }

  let bucket = state.bucket_mut(key);
  if is_new {
    bucket.new_committer_count += 1;
  }

  let credit = match mode {
    AccumulationMode::Total => true,
    AccumulationMode::FirstSeenOnly => is_new || bucket.has_author(&event.author),
  };
  if credit {
    bucket.increment(&event.author);
  }

  Ok(())
}

/// Build the aggregation state from an ascending event sequence.
pub fn aggregate(events: &[Event], mode: AccumulationMode) -> Result<AggregationState, EngineError> {
  let mut state = AggregationState::new();
  for event in events {
    record_event(&mut state, event, mode)?;
  }
  Ok(state)
}
