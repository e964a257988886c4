//! Core types for the activity engine (store hit contracts + internal models + report rows).

use std::collections::{HashMap, HashSet};
use std::fmt;

use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Inbound types (store contract: what a search/scan returns)
// ---------------------------------------------------------------------------

/// One document returned by the event store: its id plus the untyped `_source`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RawHit {
  #[serde(rename = "_id", default)]
  pub id: String,
  #[serde(rename = "_source", default)]
  pub source: serde_json::Value,
}

impl RawHit {
  pub fn new(id: impl Into<String>, source: serde_json::Value) -> Self {
    Self {
      id: id.into(),
      source,
    }
  }
}

/// Fields read from an enriched git document. Unknown fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct CommitHit {
  pub author_name: String,
  pub commit_date: String,
}

/// Fields read from an enriched GitHub issue/PR document.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueHit {
  #[serde(default)]
  pub pull_request: Option<serde_json::Value>,
}

impl IssueHit {
  /// A document is a pull request when its marker is present and truthy.
  pub fn kind(&self) -> EventKind {
    let is_pr = match &self.pull_request {
      None | Some(serde_json::Value::Null) => false,
      Some(serde_json::Value::Bool(b)) => *b,
      Some(serde_json::Value::Number(n)) => n.as_f64().map_or(false, |v| v != 0.0),
      Some(serde_json::Value::String(s)) => !s.is_empty(),
      Some(serde_json::Value::Array(a)) => !a.is_empty(),
      Some(serde_json::Value::Object(o)) => !o.is_empty(),
    };
    if is_pr {
      EventKind::PullRequest
    } else {
      EventKind::Issue
    }
  }
}

// ---------------------------------------------------------------------------
// Internal normalized types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
  Commit,
  Issue,
  PullRequest,
}

/// Canonical internal event after normalization + validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
  pub author: String,
  pub timestamp: NaiveDateTime,
  pub kind: EventKind,
}

impl Event {
  pub fn commit(author: impl Into<String>, timestamp: NaiveDateTime) -> Self {
    Self {
      author: author.into(),
      timestamp,
      kind: EventKind::Commit,
    }
  }
}

// ---------------------------------------------------------------------------
// Month bucketing
// ---------------------------------------------------------------------------

const MONTH_NAMES: [&str; 12] = [
  "January",
  "February",
  "March",
  "April",
  "May",
  "June",
  "July",
  "August",
  "September",
  "October",
  "November",
  "December",
];

/// A calendar month. Orders by (year, month); displays as "January-2023".
///
/// The month is always in 1..=12: keys come from a timestamp or a checked `new`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
  year: i32,
  month: u32,
}

impl MonthKey {
  /// `None` unless `month` is in 1..=12.
  pub fn new(year: i32, month: u32) -> Option<Self> {
    (1..=12).contains(&month).then_some(Self { year, month })
  }

  pub fn of(ts: &NaiveDateTime) -> Self {
    Self {
      year: ts.year(),
      month: ts.month(),
    }
  }

  pub fn year(self) -> i32 {
    self.year
  }

  /// 1-based month of the year.
  pub fn month(self) -> u32 {
    self.month
  }

  pub fn month_name(self) -> &'static str {
    MONTH_NAMES[self.month as usize - 1]
  }
}

impl fmt::Display for MonthKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}-{}", self.month_name(), self.year)
  }
}

/// Per-month statistics. Authors keep the order in which they first committed that month.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonthBucket {
  pub new_committer_count: u64,
  commits: Vec<(String, u64)>,
  index: HashMap<String, usize>,
}

impl MonthBucket {
  /// Commit count for `author` in this month (0 when absent).
  pub fn commits_for(&self, author: &str) -> u64 {
    self.index.get(author).map_or(0, |&i| self.commits[i].1)
  }

  pub fn has_author(&self, author: &str) -> bool {
    self.index.contains_key(author)
  }

  /// (author, commit_count) pairs in insertion order.
  pub fn commits_by_author(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
    self.commits.iter().map(|(a, c)| (a.as_str(), *c))
  }

  pub fn total_commits(&self) -> u64 {
    self.commits.iter().map(|(_, c)| *c).sum()
  }

  /// Add one commit for `author`, appending the author on first sight.
  pub(crate) fn increment(&mut self, author: &str) {
    match self.index.get(author) {
      Some(&i) => self.commits[i].1 += 1,
      None => {
        self.index.insert(author.to_string(), self.commits.len());
        self.commits.push((author.to_string(), 1));
      }
    }
  }
}

/// Aggregation state for one report run: months in first-occurrence order + every author seen.
#[derive(Debug, Clone, Default)]
pub struct AggregationState {
  months: Vec<(MonthKey, MonthBucket)>,
  index: HashMap<MonthKey, usize>,
  pub(crate) seen_authors: HashSet<String>,
  pub(crate) last_timestamp: Option<NaiveDateTime>,
}

impl AggregationState {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn months(&self) -> impl Iterator<Item = (MonthKey, &MonthBucket)> + '_ {
    self.months.iter().map(|(k, b)| (*k, b))
  }

  pub fn month(&self, key: MonthKey) -> Option<&MonthBucket> {
    self.index.get(&key).map(|&i| &self.months[i].1)
  }

  pub fn month_count(&self) -> usize {
    self.months.len()
  }

  pub fn is_empty(&self) -> bool {
    self.months.is_empty()
  }

  pub fn seen_authors(&self) -> &HashSet<String> {
    &self.seen_authors
  }

  /// The bucket for `key`, appended at the end of the order if new.
  pub(crate) fn bucket_mut(&mut self, key: MonthKey) -> &mut MonthBucket {
    let i = match self.index.get(&key) {
      Some(&i) => i,
      None => {
        self.index.insert(key, self.months.len());
        self.months.push((key, MonthBucket::default()));
        self.months.len() - 1
      }
    };
    &mut self.months[i].1
  }
}

// ---------------------------------------------------------------------------
// Index names
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
  Git,
  Github,
}

impl SourceKind {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Git => "git",
      Self::Github => "github",
    }
  }
}

impl fmt::Display for SourceKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Explicitly configured index names; either may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexOverrides {
  pub raw: Option<String>,
  pub enrich: Option<String>,
}

/// Fully resolved index names for one repository and source kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexNameSet {
  pub repo: String,
  pub source: SourceKind,
  pub raw_index: String,
  pub enrich_index: String,
}

// ---------------------------------------------------------------------------
// Output types (CSV contract: what we emit)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewCommitterRow {
  #[serde(rename = "Month")]
  pub month: String,
  #[serde(rename = "Number of new commiters")]
  pub new_committers: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitsByAuthorRow {
  #[serde(rename = "Month")]
  pub month: String,
  #[serde(rename = "Author")]
  pub author: String,
  #[serde(rename = "Number of commits")]
  pub commits: u64,
}

/// Both monthly tables, fully materialized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonthlyReport {
  pub new_committers: Vec<NewCommitterRow>,
  pub commits_by_author: Vec<CommitsByAuthorRow>,
}

/// Windowed activity for one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoActivityRecord {
  #[serde(rename = "Name")]
  pub name: String,
  #[serde(rename = "Commits")]
  pub commit_count: u64,
  #[serde(rename = "Pull Requests")]
  pub pr_count: u64,
  #[serde(rename = "Issues")]
  pub issue_count: u64,
  #[serde(rename = "Total")]
  pub total: u64,
}

impl RepoActivityRecord {
  pub fn new(name: impl Into<String>, commit_count: u64, pr_count: u64, issue_count: u64) -> Self {
    Self {
      name: name.into(),
      commit_count,
      pr_count,
      issue_count,
      total: commit_count + pr_count + issue_count,
    }
  }
}
