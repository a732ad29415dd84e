//! HTTP surface for inventory imports.
//!
//! Exposed as a library so integration tests can build the same router
//! as the binary.

pub mod background;
pub mod config;
pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
pub mod routes;
pub mod sessions;
pub mod state;
