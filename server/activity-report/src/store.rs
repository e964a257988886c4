//! Event store access: the narrow query surface the reports need, plus an Elasticsearch client.

use std::future::Future;
use std::time::Duration;

use activity_engine::normalize::TIMESTAMP_FORMAT;
use activity_engine::RawHit;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::ReportError;

/// `field > value` range predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeFilter {
  pub field: String,
  pub gt: String,
}

impl RangeFilter {
  /// Documents whose `field` is strictly after `threshold`.
  pub fn after(field: &str, threshold: NaiveDateTime) -> Self {
    Self {
      field: field.to_string(),
      gt: threshold.format(TIMESTAMP_FORMAT).to_string(),
    }
  }
}

/// What to fetch from an index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
  pub filter: Option<RangeFilter>,
  /// Ascending sort field.
  pub sort: Option<String>,
  /// `_source` fields to return; empty means all.
  pub fields: Vec<String>,
}

impl SearchQuery {
  pub fn filtered(filter: RangeFilter) -> Self {
    Self {
      filter: Some(filter),
      ..Self::default()
    }
  }

  /// The `query` clause: a bool filter on the range, or match_all.
  pub fn query_clause(&self) -> Value {
    match &self.filter {
      Some(f) => json!({
        "bool": { "filter": [ { "range": { f.field.as_str(): { "gt": f.gt } } } ] }
      }),
      None => json!({ "match_all": {} }),
    }
  }

  /// Full search request body for one page of `size` hits.
  pub fn body(&self, size: usize) -> Value {
    let mut body = json!({
      "size": size,
      "query": self.query_clause(),
    });
    if let Some(field) = &self.sort {
      body["sort"] = json!([ { field.as_str(): { "order": "asc" } } ]);
    }
    if !self.fields.is_empty() {
      body["_source"] = json!(self.fields);
    }
    body
  }
}

/// Query capability consumed by the reports.
#[async_trait]
pub trait EventStore: Send + Sync {
  /// Number of documents in `index` matching `filter`.
  async fn count(&self, index: &str, filter: Option<&RangeFilter>) -> Result<u64, ReportError>;

  /// Every document in `index` matching `query`, paging internally.
  async fn scan(&self, index: &str, query: &SearchQuery) -> Result<Vec<RawHit>, ReportError>;
}

#[derive(Debug, Deserialize)]
struct CountResponse {
  count: u64,
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
  #[serde(rename = "_scroll_id", default)]
  pub scroll_id: Option<String>,
  pub hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
pub struct HitsEnvelope {
  #[serde(default)]
  pub hits: Vec<RawHit>,
}

/// Elasticsearch over HTTP.
pub struct ElasticStore {
  base_url: String,
  client: reqwest::Client,
  page_size: usize,
  scroll_keepalive: String,
  request_timeout: Duration,
}

impl ElasticStore {
  pub fn new(base_url: &str, connect_timeout: Duration) -> Result<Self, ReportError> {
    let client = reqwest::Client::builder()
      .user_agent(concat!("activity-report/", env!("CARGO_PKG_VERSION")))
      .connect_timeout(connect_timeout)
      .build()
      .map_err(|e| ReportError::query(base_url, format!("http client: {}", e)))?;

    Ok(Self {
      base_url: base_url.trim_end_matches('/').to_string(),
      client,
      page_size: 500,
      scroll_keepalive: "1m".to_string(),
      request_timeout: Duration::from_secs(30),
    })
  }

  /// Upper bound for each HTTP request, including every page of a scan.
  pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
    self.request_timeout = timeout;
    self
  }

  pub fn with_page_size(mut self, page_size: usize) -> Self {
    self.page_size = page_size.max(1);
    self
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  async fn post_json(&self, index: &str, url: &str, body: &Value) -> Result<Value, ReportError> {
    debug!(url, "store request");
    let response = self
      .client
      .post(url)
      .json(body)
      .send()
      .await
      .map_err(|e| ReportError::query(index, e.to_string()))?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
      return Err(ReportError::IndexNotFound {
        index: index.to_string(),
      });
    }
    if !status.is_success() {
      let text = response.text().await.unwrap_or_default();
      return Err(ReportError::query(index, format!("HTTP {}: {}", status, text)));
    }

    response
      .json::<Value>()
      .await
      .map_err(|e| ReportError::query(index, format!("invalid response body: {}", e)))
  }

  async fn timed<T>(
    &self,
    index: &str,
    request: impl Future<Output = Result<T, ReportError>>,
  ) -> Result<T, ReportError> {
    tokio::time::timeout(self.request_timeout, request)
      .await
      .unwrap_or_else(|_| {
        Err(ReportError::Timeout {
          index: index.to_string(),
          after: self.request_timeout,
        })
      })
  }

  fn decode<T: serde::de::DeserializeOwned>(index: &str, value: Value) -> Result<T, ReportError> {
    serde_json::from_value(value)
      .map_err(|e| ReportError::query(index, format!("unexpected response shape: {}", e)))
  }

  /// One page of hits. With `scroll`, the response carries a scroll id for the next pages.
  pub async fn search(
    &self,
    index: &str,
    query: &SearchQuery,
    scroll: Option<&str>,
  ) -> Result<SearchResponse, ReportError> {
    let mut url = format!("{}/{}/_search", self.base_url, index);
    if let Some(keepalive) = scroll {
      url.push_str("?scroll=");
      url.push_str(keepalive);
    }
    let value = self.post_json(index, &url, &query.body(self.page_size)).await?;
    Self::decode(index, value)
  }

  async fn scroll_next(&self, index: &str, scroll_id: &str) -> Result<SearchResponse, ReportError> {
    let url = format!("{}/_search/scroll", self.base_url);
    let body = json!({ "scroll": self.scroll_keepalive, "scroll_id": scroll_id });
    // 404 here means the scroll context expired, not the index.
    let value = self.post_json(index, &url, &body).await.map_err(|e| match e {
      ReportError::IndexNotFound { index } => ReportError::query(&index, "scroll context expired"),
      other => other,
    })?;
    Self::decode(index, value)
  }

  async fn clear_scroll(&self, scroll_id: &str) {
    let url = format!("{}/_search/scroll", self.base_url);
    let request = self
      .client
      .delete(&url)
      .json(&json!({ "scroll_id": scroll_id }))
      .send();
    match tokio::time::timeout(self.request_timeout, request).await {
      Ok(Ok(_)) => {}
      Ok(Err(e)) => warn!(error = %e, "failed to release scroll context"),
      Err(_) => warn!("timed out releasing scroll context"),
    }
  }
}

#[async_trait]
impl EventStore for ElasticStore {
  async fn count(&self, index: &str, filter: Option<&RangeFilter>) -> Result<u64, ReportError> {
    let url = format!("{}/{}/_count", self.base_url, index);
    let query = SearchQuery {
      filter: filter.cloned(),
      ..SearchQuery::default()
    };
    let body = json!({ "query": query.query_clause() });
    let value = self.timed(index, self.post_json(index, &url, &body)).await?;
    let response: CountResponse = Self::decode(index, value)?;
    Ok(response.count)
  }

  async fn scan(&self, index: &str, query: &SearchQuery) -> Result<Vec<RawHit>, ReportError> {
    let first = self.search(index, query, Some(&self.scroll_keepalive));
    let mut page = self.timed(index, first).await?;
    let mut hits = Vec::new();

    loop {
      let done = page.hits.hits.is_empty();
      hits.append(&mut page.hits.hits);
      let scroll_id = match (done, page.scroll_id.take()) {
        (false, Some(id)) => id,
        (_, Some(id)) => {
          self.clear_scroll(&id).await;
          break;
        }
        (_, None) => break,
      };

      match self.timed(index, self.scroll_next(index, &scroll_id)).await {
        Ok(next) => page = next,
        Err(e) => {
          self.clear_scroll(&scroll_id).await;
          return Err(e);
        }
      }
    }

    debug!(index, hits = hits.len(), "scan complete");
    Ok(hits)
  }
}
