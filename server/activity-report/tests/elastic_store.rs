//! ElasticStore against an in-process fake of the Elasticsearch HTTP API.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use activity_engine::normalize::parse_timestamp;
use activity_engine::{Engine, RawHit};
use activity_report::app::{self, MonthlyJob, RankingJob, RepoSource};
use activity_report::ingest::{IngestRequest, Ingestor};
use activity_report::store::{RangeFilter, SearchQuery};
use activity_report::{ElasticStore, EventStore, ReportError, RetryPolicy};
use async_trait::async_trait;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

#[derive(Default)]
struct FakeEs {
  indices: HashMap<String, Vec<Value>>,
  scrolls: HashMap<String, Vec<Value>>,
  page_size: usize,
  next_scroll: usize,
  cleared: usize,
  /// Delay before answering a scroll continuation.
  scroll_delay: Duration,
  /// Answer scroll continuations with 404, as for an expired context.
  expire_scrolls: bool,
}

type Shared = Arc<Mutex<FakeEs>>;

fn range_of(body: &Value) -> Option<(String, String)> {
  let range = body["query"]["bool"]["filter"][0]["range"].as_object()?;
  let (field, cond) = range.iter().next()?;
  Some((field.clone(), cond["gt"].as_str()?.to_string()))
}

fn matching(docs: &[Value], body: &Value) -> Vec<Value> {
  match range_of(body) {
    Some((field, gt)) => docs
      .iter()
      .filter(|d| d[field.as_str()].as_str().map_or(false, |v| v > gt.as_str()))
      .cloned()
      .collect(),
    None => docs.to_vec(),
  }
}

fn page(es: &mut FakeEs, scroll_id: &str) -> Value {
  let size = es.page_size;
  let pending = es.scrolls.entry(scroll_id.to_string()).or_default();
  let take = size.min(pending.len());
  let hits: Vec<Value> = pending.drain(..take).collect();
  json!({ "_scroll_id": scroll_id, "hits": { "hits": hits } })
}

async fn post_handler(
  State(state): State<Shared>,
  Path((first, second)): Path<(String, String)>,
  Query(params): Query<HashMap<String, String>>,
  Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
  if first == "_search" && second == "scroll" {
    let (delay, expired) = {
      let es = state.lock().unwrap();
      (es.scroll_delay, es.expire_scrolls)
    };
    tokio::time::sleep(delay).await;
    if expired {
      return (
        StatusCode::NOT_FOUND,
        Json(json!({"error": {"type": "search_context_missing_exception"}})),
      );
    }
    let mut es = state.lock().unwrap();
    let id = body["scroll_id"].as_str().unwrap_or_default().to_string();
    return (StatusCode::OK, Json(page(&mut es, &id)));
  }

  let mut es = state.lock().unwrap();

  let docs = match es.indices.get(&first) {
    Some(docs) => docs.clone(),
    None => {
      return (
        StatusCode::NOT_FOUND,
        Json(json!({"error": {"type": "index_not_found_exception"}})),
      )
    }
  };
  let matched = matching(&docs, &body);

  match second.as_str() {
    "_count" => (StatusCode::OK, Json(json!({ "count": matched.len() }))),
    "_search" => {
      assert!(params.contains_key("scroll"), "scan must use the scroll API");
      es.page_size = body["size"].as_u64().unwrap_or(10) as usize;
      es.next_scroll += 1;
      let id = format!("scroll-{}", es.next_scroll);
      let hits = matched
        .into_iter()
        .enumerate()
        .map(|(i, source)| json!({ "_id": format!("{}-{}", first, i), "_source": source }))
        .collect();
      es.scrolls.insert(id.clone(), hits);
      (StatusCode::OK, Json(page(&mut es, &id)))
    }
    _ => (StatusCode::BAD_REQUEST, Json(json!({}))),
  }
}

async fn delete_handler(State(state): State<Shared>) -> Json<Value> {
  state.lock().unwrap().cleared += 1;
  Json(json!({ "succeeded": true }))
}

async fn spawn_fake(indices: HashMap<String, Vec<Value>>) -> (String, Shared) {
  spawn_configured(FakeEs {
    indices,
    ..FakeEs::default()
  })
  .await
}

async fn spawn_configured(es: FakeEs) -> (String, Shared) {
  let state: Shared = Arc::new(Mutex::new(es));
  let app = Router::new()
    .route("/:first/:second", post(post_handler).delete(delete_handler))
    .with_state(state.clone());

  let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move {
    axum::serve(listener, app).await.unwrap();
  });
  (format!("http://{}", addr), state)
}

fn store(url: &str, page_size: usize) -> ElasticStore {
  ElasticStore::new(url, Duration::from_secs(2))
    .unwrap()
    .with_page_size(page_size)
}

fn fast_retry() -> RetryPolicy {
  RetryPolicy {
    max_attempts: 2,
    initial_backoff: Duration::from_millis(1),
    timeout: Duration::from_secs(5),
  }
}

struct NoIngest;

#[async_trait]
impl Ingestor for NoIngest {
  async fn run(&self, request: &IngestRequest) -> Result<(), ReportError> {
    panic!("unexpected ingestion for {}", request.indices.repo);
  }
}

#[tokio::test]
async fn count_uses_strict_lower_bound() {
  let docs = vec![
    json!({"author_date": "2026-07-19T00:00:00"}),
    json!({"author_date": "2026-07-19T00:00:01"}),
    json!({"author_date": "2026-09-01T12:00:00"}),
    json!({"author_date": "2025-01-01T00:00:00"}),
  ];
  let (url, _) = spawn_fake(HashMap::from([("git_x".to_string(), docs)])).await;
  let store = store(&url, 10);

  let threshold = parse_timestamp("2026-07-19T00:00:00").unwrap();
  let filter = RangeFilter::after("author_date", threshold);
  assert_eq!(store.count("git_x", Some(&filter)).await.unwrap(), 2);
  assert_eq!(store.count("git_x", None).await.unwrap(), 4);
}

#[tokio::test]
async fn scan_pages_through_scroll_and_releases_it() {
  let docs: Vec<Value> = (0..7)
    .map(|i| json!({"author_name": format!("dev{}", i), "commit_date": "2023-01-01T00:00:00"}))
    .collect();
  let (url, state) = spawn_fake(HashMap::from([("git_x".to_string(), docs)])).await;
  let store = store(&url, 3);

  let hits: Vec<RawHit> = store.scan("git_x", &SearchQuery::default()).await.unwrap();
  assert_eq!(hits.len(), 7);
  assert_eq!(hits[0].id, "git_x-0");
  assert_eq!(hits[6].source["author_name"], "dev6");
  assert_eq!(state.lock().unwrap().cleared, 1);
}

#[tokio::test]
async fn missing_index_is_reported() {
  let (url, _) = spawn_fake(HashMap::new()).await;
  let store = store(&url, 10);
  let err = store.count("nope", None).await.unwrap_err();
  assert!(matches!(err, ReportError::IndexNotFound { ref index } if index == "nope"));
}

#[tokio::test]
async fn unreachable_store_is_a_query_error() {
  let store = store("http://127.0.0.1:1", 10);
  let err = store.count("git_x", None).await.unwrap_err();
  assert!(err.is_retryable(), "{}", err);
}

fn commit_docs(n: usize) -> Vec<Value> {
  (0..n)
    .map(|i| json!({"author_name": format!("dev{}", i), "commit_date": "2023-01-01T00:00:00"}))
    .collect()
}

#[tokio::test]
async fn expired_scroll_is_a_retryable_query_error() {
  let (url, state) = spawn_configured(FakeEs {
    indices: HashMap::from([("github_x".to_string(), commit_docs(4))]),
    expire_scrolls: true,
    ..FakeEs::default()
  })
  .await;
  let store = store(&url, 2);

  let err = store.scan("github_x", &SearchQuery::default()).await.unwrap_err();
  assert!(
    matches!(err, ReportError::Query { ref reason, .. } if reason.contains("scroll context expired")),
    "{}",
    err
  );
  assert!(err.is_retryable());
  assert_eq!(state.lock().unwrap().cleared, 1);
}

#[tokio::test]
async fn slow_scroll_page_times_out_and_releases_every_context() {
  let (url, state) = spawn_configured(FakeEs {
    indices: HashMap::from([("github_x".to_string(), commit_docs(3))]),
    scroll_delay: Duration::from_secs(3),
    ..FakeEs::default()
  })
  .await;
  let store = store(&url, 1).with_request_timeout(Duration::from_millis(200));

  let query = SearchQuery::default();
  let err = fast_retry()
    .run_untimed("github_x", || store.scan("github_x", &query))
    .await
    .unwrap_err();

  assert!(matches!(err, ReportError::Timeout { .. }), "{}", err);
  let es = state.lock().unwrap();
  assert_eq!(es.next_scroll, 2);
  assert_eq!(es.cleared, es.next_scroll);
}

#[tokio::test]
async fn ranking_end_to_end_skips_missing_indices() {
  let indices = HashMap::from([
    (
      "git_alpha".to_string(),
      vec![
        json!({"author_date": "2026-09-01T00:00:00"}),
        json!({"author_date": "2026-01-01T00:00:00"}),
      ],
    ),
    (
      "github_alpha".to_string(),
      vec![
        json!({"created_at": "2026-09-02T00:00:00", "pull_request": true}),
        json!({"created_at": "2026-09-03T00:00:00", "pull_request": false}),
        json!({"created_at": "2026-09-04T00:00:00"}),
      ],
    ),
    (
      "git_beta".to_string(),
      (0..5).map(|_| json!({"author_date": "2026-10-01T00:00:00"})).collect(),
    ),
    ("github_beta".to_string(), vec![]),
  ]);
  let (url, _) = spawn_fake(indices).await;
  let store = store(&url, 2);

  let dir = tempfile::tempdir().unwrap();
  let index_file = dir.path().join("indices.json");
  std::fs::write(&index_file, r#"{"alpha": {}, "ghost": {}, "beta": {}}"#).unwrap();

  let job = RankingJob {
    source: RepoSource::IndexFile(index_file),
    token: None,
    store_address: url.clone(),
    out_file: dir.path().join("ranking"),
  };
  let now = parse_timestamp("2026-10-19T00:00:00").unwrap();
  let outcome = app::run_ranking(&job, &Engine::with_defaults(), &store, &NoIngest, &fast_retry(), now)
    .await
    .unwrap();

  assert_eq!(outcome.failed.len(), 1);
  assert_eq!(outcome.failed[0].0, "ghost");

  let csv = std::fs::read_to_string(dir.path().join("ranking.csv")).unwrap();
  assert_eq!(
    csv,
    "Name,Commits,Pull Requests,Issues,Total\nbeta,5,0,0,5\nalpha,1,1,2,4\n"
  );
}

#[tokio::test]
async fn monthly_end_to_end_writes_both_tables() {
  let docs = vec![
    json!({"author_name": "A", "commit_date": "2023-02-01T08:00:00"}),
    json!({"author_name": "A", "commit_date": "2023-01-05T10:00:00"}),
    json!({"author_name": "B", "commit_date": "2023-01-10T09:00:00"}),
  ];
  let (url, _) = spawn_fake(HashMap::from([("git_foo".to_string(), docs)])).await;
  let store = store(&url, 2);

  let dir = tempfile::tempdir().unwrap();
  let job = MonthlyJob {
    repo: Some("https://github.com/example/foo.git".into()),
    raw: None,
    enrich: None,
    create: false,
    store_address: url.clone(),
    new_committers_path: dir.path().join("new"),
    commits_path: dir.path().join("commits"),
  };
  app::run_monthly(&job, &Engine::with_defaults(), &store, &NoIngest, &fast_retry())
    .await
    .unwrap();

  assert_eq!(
    std::fs::read_to_string(dir.path().join("new.csv")).unwrap(),
    "Month,Number of new commiters\nJanuary-2023,2\n"
  );
  assert_eq!(
    std::fs::read_to_string(dir.path().join("commits.csv")).unwrap(),
    "Month,Author,Number of commits\nJanuary-2023,A,1\nJanuary-2023,B,1\nFebruary-2023,A,1\n"
  );
}

#[tokio::test]
async fn monthly_malformed_timestamp_writes_nothing() {
  let docs = vec![
    json!({"author_name": "A", "commit_date": "2023-01-05T10:00:00"}),
    json!({"author_name": "B", "commit_date": "5 Jan 2023"}),
  ];
  let (url, _) = spawn_fake(HashMap::from([("git_foo".to_string(), docs)])).await;
  let store = store(&url, 10);

  let dir = tempfile::tempdir().unwrap();
  let job = MonthlyJob {
    repo: None,
    raw: None,
    enrich: Some("git_foo".into()),
    create: false,
    store_address: url.clone(),
    new_committers_path: dir.path().join("new"),
    commits_path: dir.path().join("commits"),
  };
  let err = app::run_monthly(&job, &Engine::with_defaults(), &store, &NoIngest, &fast_retry())
    .await
    .unwrap_err();

  assert!(matches!(
    err,
    ReportError::Engine(activity_engine::EngineError::InputFormat { .. })
  ));
  assert!(!dir.path().join("new.csv").exists());
  assert!(!dir.path().join("commits.csv").exists());
}
