//! Integration tests for the activity engine.

use std::collections::HashMap;

use activity_engine::types::MonthKey;
use activity_engine::{normalize, Engine, EngineError, RawHit};

fn fixture_hits() -> Vec<RawHit> {
  let json = r#"[
    {"_id": "c7", "_source": {"author_name": "dave", "commit_date": "2024-01-03T08:00:00", "hash": "77"}},
    {"_id": "c1", "_source": {"author_name": "alice", "commit_date": "2023-03-01T09:00:00"}},
    {"_id": "c3", "_source": {"author_name": "alice", "commit_date": "2023-03-20T17:45:10"}},
    {"_id": "c2", "_source": {"author_name": "bob", "commit_date": "2023-03-02T11:30:00"}},
    {"_id": "c5", "_source": {"author_name": "carol", "commit_date": "2023-11-11T11:11:11"}},
    {"_id": "c4", "_source": {"author_name": "bob", "commit_date": "2023-11-01T00:00:00"}},
    {"_id": "c6", "_source": {"author_name": "alice", "commit_date": "2024-01-02T08:00:00"}},
    {"_id": "c8", "_source": {"author_name": "bob", "commit_date": "2024-01-31T23:59:59"}}
  ]"#;
  serde_json::from_str(json).unwrap()
}

#[test]
fn new_committer_total_matches_distinct_authors() {
  let engine = Engine::with_defaults();
  let report = engine.monthly_report(&fixture_hits()).unwrap();

  let total: u64 = report.new_committers.iter().map(|r| r.new_committers).sum();
  assert_eq!(total, 4);
  assert!(report.new_committers.iter().all(|r| r.new_committers > 0));

  let months: Vec<_> = report.new_committers.iter().map(|r| r.month.as_str()).collect();
  assert_eq!(months, vec!["March-2023", "November-2023", "January-2024"]);
}

#[test]
fn per_month_commit_sums_match_event_counts() {
  let hits = fixture_hits();
  let engine = Engine::with_defaults();
  let state = engine.aggregate(&hits).unwrap();

  let mut expected: HashMap<MonthKey, u64> = HashMap::new();
  for (i, hit) in hits.iter().enumerate() {
    let event = normalize::commit_event(hit, i).unwrap();
    *expected.entry(MonthKey::of(&event.timestamp)).or_default() += 1;
  }

  for (key, bucket) in state.months() {
    assert_eq!(bucket.total_commits(), expected[&key], "month {}", key);
  }
  assert_eq!(state.month_count(), expected.len());
}

#[test]
fn month_order_is_chronological_first_occurrence() {
  let engine = Engine::with_defaults();
  let report = engine.monthly_report(&fixture_hits()).unwrap();

  let mut seen = Vec::new();
  for row in &report.commits_by_author {
    if seen.last() != Some(&row.month) {
      seen.push(row.month.clone());
    }
  }
  assert_eq!(seen, vec!["March-2023", "November-2023", "January-2024"]);

  let jan: Vec<_> = report
    .commits_by_author
    .iter()
    .filter(|r| r.month == "January-2024")
    .map(|r| (r.author.as_str(), r.commits))
    .collect();
  assert_eq!(jan, vec![("alice", 1), ("dave", 1), ("bob", 1)]);
}

#[test]
fn single_malformed_timestamp_fails_whole_batch() {
  let mut hits = fixture_hits();
  hits.push(RawHit::new(
    "broken",
    serde_json::json!({"author_name": "eve", "commit_date": "2024-02-30 10:00"}),
  ));

  let engine = Engine::with_defaults();
  let err = engine.monthly_report(&hits).unwrap_err();
  match err {
    EngineError::InputFormat { record, reason } => {
      assert!(record.contains("broken"));
      assert!(reason.contains("commit_date"));
    }
    other => panic!("unexpected error: {}", other),
  }
}

#[test]
fn deterministic_output_across_runs() {
  let hits = fixture_hits();
  let r1 = Engine::with_defaults().monthly_report(&hits).unwrap();
  let r2 = Engine::with_defaults().monthly_report(&hits).unwrap();
  assert_eq!(r1, r2);
}
