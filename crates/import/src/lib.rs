//! Async orchestration of bulk inventory imports.
//!
//! [`engine::ImportEngine`] drives the Analyze and Commit phases over an
//! [`store::EntityStore`]; [`extract`] turns uploaded documents into rows.

pub mod engine;
pub mod error;
pub mod extract;
pub mod resolve;
pub mod store;

pub use engine::{AnalysisReport, BatchSummary, ImportEngine, ImportOptions};
pub use error::{ImportError, StoreError};
pub use store::{EntityStore, MemoryStore};
