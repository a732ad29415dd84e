//! Category, location, and vendor rows.

use inventra_core::entity::ReferenceEntity;
use inventra_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from `categories`, `locations`, or `vendors`.
///
/// `parent_id` is only ever set for locations; the other two tables
/// select it as `NULL`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReferenceRow {
    pub id: DbId,
    pub name: String,
    pub parent_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<ReferenceRow> for ReferenceEntity {
    fn from(row: ReferenceRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            parent_id: row.parent_id,
        }
    }
}
