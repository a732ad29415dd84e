//! Row structs for the inventory tables.
//!
//! Each submodule holds a `FromRow` + `Serialize` struct matching the
//! database row and the conversion into the core domain type.

pub mod asset;
pub mod reference;
