//! Domain types and pure reconciliation logic for bulk inventory imports.
//!
//! No database and no HTTP here. Everything in this crate operates on
//! in-memory values so that the import engine, the storage layer and the
//! API can share one definition of what a row means.

pub mod cache;
pub mod config;
pub mod duplicate_scan;
pub mod entity;
pub mod error;
pub mod planner;
pub mod resolver;
pub mod row;
pub mod similarity;
pub mod snapshot;
pub mod types;
pub mod validation;
