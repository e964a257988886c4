//! Activity Report Engine: deterministic monthly and ranking reports.
//!
//! Normalizes commit/issue hits from the event store, buckets commits by
//! calendar month (new committers + per-author counts), materializes the
//! report tables, ranks repositories by windowed activity, and resolves
//! index names.
//!
//! No network, no file I/O; pure computation + in-memory state.

pub mod aggregate;
pub mod config;
pub mod engine;
pub mod error;
pub mod index_names;
pub mod normalize;
pub mod ranking;
pub mod registry;
pub mod report;
pub mod types;

pub use config::{AccumulationMode, Config};
pub use engine::Engine;
pub use error::EngineError;
pub use registry::RepoDescriptor;
pub use types::{MonthlyReport, RawHit, RepoActivityRecord, SourceKind};
