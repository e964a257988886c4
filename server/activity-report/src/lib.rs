//! Activity Report runner
//!
//! Drives the activity engine against a live Elasticsearch event store:
//! monthly committer tables for one project, windowed activity ranking
//! across repositories, optional ingestion through p2o.py, CSV output.

pub mod app;
pub mod cli;
pub mod error;
pub mod ingest;
pub mod monthly;
pub mod output;
pub mod ranker;
pub mod retry;
pub mod store;
pub mod telemetry;

pub use error::ReportError;
pub use ingest::{Ingestor, P2oIngestor};
pub use retry::RetryPolicy;
pub use store::{ElasticStore, EventStore};
