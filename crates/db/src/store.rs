//! PostgreSQL implementation of the import engine's store collaborator.

use async_trait::async_trait;
use inventra_core::entity::{AssetFields, AssetRecord, NewReference, ReferenceEntity, ReferenceKind};
use inventra_core::types::DbId;
use inventra_import::{EntityStore, StoreError};

use crate::repositories::{AssetRepo, ReferenceRepo};
use crate::DbPool;

/// [`EntityStore`] backed by the repositories in this crate.
#[derive(Clone)]
pub struct PgEntityStore {
    pool: DbPool,
}

impl PgEntityStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Constraint violations (SQLSTATE class 23) mean the row was refused;
/// anything else is an infrastructure failure.
fn store_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().is_some_and(|code| code.starts_with("23")) {
            return StoreError::Rejected(db_err.message().to_string());
        }
    }
    tracing::error!(error = %err, "Inventory store query failed");
    StoreError::Database(err.to_string())
}

#[async_trait]
impl EntityStore for PgEntityStore {
    async fn ping(&self) -> Result<(), StoreError> {
        crate::health_check(&self.pool).await.map_err(store_error)
    }

    async fn list_references(
        &self,
        kind: ReferenceKind,
    ) -> Result<Vec<ReferenceEntity>, StoreError> {
        let rows = ReferenceRepo::list(&self.pool, kind).await.map_err(store_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_assets(&self) -> Result<Vec<AssetRecord>, StoreError> {
        let rows = AssetRepo::list(&self.pool).await.map_err(store_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_asset(&self, id: DbId) -> Result<Option<AssetRecord>, StoreError> {
        let row = AssetRepo::find_by_id(&self.pool, id).await.map_err(store_error)?;
        Ok(row.map(Into::into))
    }

    async fn create_reference(
        &self,
        kind: ReferenceKind,
        new: &NewReference,
    ) -> Result<ReferenceEntity, StoreError> {
        let row = ReferenceRepo::create(&self.pool, kind, new)
            .await
            .map_err(store_error)?;
        Ok(row.into())
    }

    async fn create_asset(&self, fields: &AssetFields) -> Result<AssetRecord, StoreError> {
        let row = AssetRepo::create(&self.pool, fields).await.map_err(store_error)?;
        Ok(row.into())
    }

    async fn update_asset(
        &self,
        id: DbId,
        fields: &AssetFields,
    ) -> Result<AssetRecord, StoreError> {
        AssetRepo::update(&self.pool, id, fields)
            .await
            .map_err(store_error)?
            .map(Into::into)
            .ok_or(StoreError::NotFound { entity: "Asset", id })
    }
}
