//! Repository for the `assets` table.

use inventra_core::entity::AssetFields;
use inventra_core::types::DbId;
use sqlx::PgPool;

use crate::models::asset::AssetRow;

/// Column list for `assets` queries.
const COLUMNS: &str = "\
    id, name, serial_number, category_id, location_id, vendor_id, \
    model, condition, purchase_date, purchase_price, notes, tags, \
    created_at, updated_at";

/// Provides CRUD operations for assets.
pub struct AssetRepo;

impl AssetRepo {
    pub async fn create(pool: &PgPool, input: &AssetFields) -> Result<AssetRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO assets (\
                name, serial_number, category_id, location_id, vendor_id, \
                model, condition, purchase_date, purchase_price, notes, tags\
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AssetRow>(&query)
            .bind(&input.name)
            .bind(input.serial_number.as_deref())
            .bind(input.category_id)
            .bind(input.location_id)
            .bind(input.vendor_id)
            .bind(input.model.as_deref())
            .bind(input.condition.as_str())
            .bind(input.purchase_date)
            .bind(input.purchase_price)
            .bind(input.notes.as_deref())
            .bind(&input.tags)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<AssetRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM assets WHERE id = $1");
        sqlx::query_as::<_, AssetRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All assets, oldest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<AssetRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM assets ORDER BY id");
        sqlx::query_as::<_, AssetRow>(&query).fetch_all(pool).await
    }

    /// Replace every writable field. Returns `None` if the asset does not exist.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &AssetFields,
    ) -> Result<Option<AssetRow>, sqlx::Error> {
        let query = format!(
            "UPDATE assets SET \
                name = $2, serial_number = $3, category_id = $4, location_id = $5, \
                vendor_id = $6, model = $7, condition = $8, purchase_date = $9, \
                purchase_price = $10, notes = $11, tags = $12 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AssetRow>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(input.serial_number.as_deref())
            .bind(input.category_id)
            .bind(input.location_id)
            .bind(input.vendor_id)
            .bind(input.model.as_deref())
            .bind(input.condition.as_str())
            .bind(input.purchase_date)
            .bind(input.purchase_price)
            .bind(input.notes.as_deref())
            .bind(&input.tags)
            .fetch_optional(pool)
            .await
    }
}
