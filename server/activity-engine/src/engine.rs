//! Core engine: runs normalization, aggregation and materialization for one report.

use chrono::NaiveDateTime;
use tracing::debug;

use crate::aggregate;
use crate::config::Config;
use crate::error::EngineError;
use crate::normalize;
use crate::ranking;
use crate::report;
use crate::types::*;

/// The report engine. Stateless between runs; every call recomputes from its input.
#[derive(Debug, Clone)]
pub struct Engine {
  config: Config,
}

impl Engine {
  pub fn new(config: Config) -> Self {
    Self { config }
  }

  pub fn with_defaults() -> Self {
    Self::new(Config::default())
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  /// Normalize and aggregate a batch of commit hits.
  pub fn aggregate(&self, hits: &[RawHit]) -> Result<AggregationState, EngineError> {
    let events = normalize::normalize_commits(hits)?;
    let state = aggregate::aggregate(&events, self.config.accumulation)?;
    debug!(
      events = events.len(),
      months = state.month_count(),
      authors = state.seen_authors().len(),
      "aggregated commit events"
    );
    Ok(state)
  }

  /// Build both monthly tables from a batch of commit hits.
  ///
  /// Fails without partial output if any hit is malformed.
  pub fn monthly_report(&self, hits: &[RawHit]) -> Result<MonthlyReport, EngineError> {
    let state = self.aggregate(hits)?;
    Ok(report::materialize(&state))
  }

  /// Lower bound of the ranking window for a run started at `now`.
  pub fn window_threshold(&self, now: NaiveDateTime) -> NaiveDateTime {
    ranking::window_threshold(now, self.config.window_months)
  }
}
