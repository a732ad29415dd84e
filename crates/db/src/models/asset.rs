//! Asset rows.

use chrono::NaiveDate;
use inventra_core::entity::{AssetFields, AssetRecord};
use inventra_core::types::{DbId, Timestamp};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `assets` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AssetRow {
    pub id: DbId,
    pub name: String,
    pub serial_number: Option<String>,
    pub category_id: Option<DbId>,
    pub location_id: Option<DbId>,
    pub vendor_id: Option<DbId>,
    pub model: Option<String>,
    /// One of `New`, `Good`, `Fair`, `Poor` (enforced by a CHECK constraint).
    pub condition: String,
    pub purchase_date: Option<NaiveDate>,
    pub purchase_price: Option<Decimal>,
    pub notes: Option<String>,
    pub tags: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<AssetRow> for AssetRecord {
    fn from(row: AssetRow) -> Self {
        Self {
            id: row.id,
            fields: AssetFields {
                name: row.name,
                serial_number: row.serial_number,
                category_id: row.category_id,
                location_id: row.location_id,
                vendor_id: row.vendor_id,
                model: row.model,
                condition: row.condition.parse().unwrap_or_default(),
                purchase_date: row.purchase_date,
                purchase_price: row.purchase_price,
                notes: row.notes,
                tags: row.tags,
            },
        }
    }
}
