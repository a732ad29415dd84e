//! The persistence collaborator the engine reads snapshots from and
//! writes decisions to.
//!
//! The engine only talks to storage through [`EntityStore`], so the same
//! orchestration runs against PostgreSQL in production and against
//! [`MemoryStore`] in tests.

use std::collections::HashSet;
use std::sync::RwLock;

use async_trait::async_trait;
use inventra_core::entity::{AssetFields, AssetRecord, NewReference, ReferenceEntity, ReferenceKind};
use inventra_core::similarity::normalize_name;
use inventra_core::types::DbId;

use crate::error::StoreError;

#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Cheap round trip used by the readiness check.
    async fn ping(&self) -> Result<(), StoreError>;

    // ── Reads ──

    /// Every entity of `kind`, in a stable listing order.
    async fn list_references(
        &self,
        kind: ReferenceKind,
    ) -> Result<Vec<ReferenceEntity>, StoreError>;
    async fn list_assets(&self) -> Result<Vec<AssetRecord>, StoreError>;
    async fn get_asset(&self, id: DbId) -> Result<Option<AssetRecord>, StoreError>;

    // ── Writes ──
    //
    // Called at most once per logical decision. The engine never retries.

    async fn create_reference(
        &self,
        kind: ReferenceKind,
        new: &NewReference,
    ) -> Result<ReferenceEntity, StoreError>;
    async fn create_asset(&self, fields: &AssetFields) -> Result<AssetRecord, StoreError>;
    async fn update_asset(
        &self,
        id: DbId,
        fields: &AssetFields,
    ) -> Result<AssetRecord, StoreError>;
}

// ── MemoryStore ──

#[derive(Default)]
struct MemoryInner {
    next_id: DbId,
    categories: Vec<ReferenceEntity>,
    locations: Vec<ReferenceEntity>,
    vendors: Vec<ReferenceEntity>,
    assets: Vec<AssetRecord>,
    failing_names: HashSet<String>,
    failing_serials: HashSet<String>,
    unavailable: bool,
    yield_on_writes: bool,
    reference_creates: usize,
    asset_writes: usize,
}

impl MemoryInner {
    fn next_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }

    fn collection(&self, kind: ReferenceKind) -> &Vec<ReferenceEntity> {
        match kind {
            ReferenceKind::Category => &self.categories,
            ReferenceKind::Location => &self.locations,
            ReferenceKind::Vendor => &self.vendors,
        }
    }

    fn collection_mut(&mut self, kind: ReferenceKind) -> &mut Vec<ReferenceEntity> {
        match kind {
            ReferenceKind::Category => &mut self.categories,
            ReferenceKind::Location => &mut self.locations,
            ReferenceKind::Vendor => &mut self.vendors,
        }
    }

    fn check_asset(&self, fields: &AssetFields) -> Result<(), StoreError> {
        if self.failing_names.contains(&normalize_name(&fields.name)) {
            return Err(StoreError::Rejected(format!(
                "Asset '{}' was rejected by the store",
                fields.name
            )));
        }
        if let Some(serial) = fields.serial_number.as_deref() {
            if self.failing_serials.contains(&normalize_name(serial)) {
                return Err(StoreError::Rejected(format!(
                    "Serial number '{serial}' was rejected by the store"
                )));
            }
        }
        Ok(())
    }
}

/// In-process [`EntityStore`] for tests and local runs.
///
/// Ids are assigned from one counter shared by all collections. Writes
/// can be made to fail for a given name or serial number to exercise the
/// engine's per-row error isolation. The whole store can also be marked
/// unavailable, or made to yield before each write so that concurrent
/// callers interleave the way they would against a real database.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an existing reference entity and return it.
    pub fn insert_reference(
        &self,
        kind: ReferenceKind,
        name: &str,
        parent_id: Option<DbId>,
    ) -> ReferenceEntity {
        let mut inner = self.write_lock();
        let entity = ReferenceEntity {
            id: inner.next_id(),
            name: name.to_string(),
            parent_id,
        };
        inner.collection_mut(kind).push(entity.clone());
        entity
    }

    /// Seed an existing asset and return it.
    pub fn insert_asset(&self, fields: AssetFields) -> AssetRecord {
        let mut inner = self.write_lock();
        let record = AssetRecord {
            id: inner.next_id(),
            fields,
        };
        inner.assets.push(record.clone());
        record
    }

    /// Remove a reference entity, as a concurrent user deleting it would.
    pub fn remove_reference(&self, kind: ReferenceKind, id: DbId) -> bool {
        let mut inner = self.write_lock();
        let collection = inner.collection_mut(kind);
        let before = collection.len();
        collection.retain(|e| e.id != id);
        collection.len() != before
    }

    /// Make every write carrying this name (reference or asset) fail.
    pub fn fail_on_name(&self, name: &str) {
        self.write_lock().failing_names.insert(normalize_name(name));
    }

    /// Make asset writes carrying this serial number fail.
    pub fn fail_on_serial(&self, serial: &str) {
        self.write_lock().failing_serials.insert(normalize_name(serial));
    }

    /// Make `ping` and every read fail until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.write_lock().unavailable = unavailable;
    }

    /// Yield to the scheduler once before each write.
    pub fn yield_on_writes(&self) {
        self.write_lock().yield_on_writes = true;
    }

    /// Number of successful `create_reference` calls.
    pub fn reference_creates(&self) -> usize {
        self.read_lock().reference_creates
    }

    /// Number of successful asset creates and updates.
    pub fn asset_writes(&self) -> usize {
        self.read_lock().asset_writes
    }

    /// Copy of all assets currently stored.
    pub fn assets(&self) -> Vec<AssetRecord> {
        self.read_lock().assets.clone()
    }

    /// Copy of all entities of `kind` currently stored.
    pub fn references(&self, kind: ReferenceKind) -> Vec<ReferenceEntity> {
        self.read_lock().collection(kind).clone()
    }

    // A poisoned lock still holds consistent data: every write is a single push or assignment.
    fn read_lock(&self) -> std::sync::RwLockReadGuard<'_, MemoryInner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_lock(&self) -> std::sync::RwLockWriteGuard<'_, MemoryInner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.read_lock().unavailable {
            return Err(StoreError::Database("Store is unavailable".to_string()));
        }
        Ok(())
    }

    async fn before_write(&self) {
        let should_yield = self.read_lock().yield_on_writes;
        if should_yield {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.check_available()
    }

    async fn list_references(
        &self,
        kind: ReferenceKind,
    ) -> Result<Vec<ReferenceEntity>, StoreError> {
        self.check_available()?;
        Ok(self.read_lock().collection(kind).clone())
    }

    async fn list_assets(&self) -> Result<Vec<AssetRecord>, StoreError> {
        self.check_available()?;
        Ok(self.read_lock().assets.clone())
    }

    async fn get_asset(&self, id: DbId) -> Result<Option<AssetRecord>, StoreError> {
        Ok(self.read_lock().assets.iter().find(|a| a.id == id).cloned())
    }

    async fn create_reference(
        &self,
        kind: ReferenceKind,
        new: &NewReference,
    ) -> Result<ReferenceEntity, StoreError> {
        self.before_write().await;
        let mut inner = self.write_lock();
        if inner.failing_names.contains(&normalize_name(&new.name)) {
            return Err(StoreError::Rejected(format!(
                "Could not create {kind} '{}'",
                new.name
            )));
        }
        let entity = ReferenceEntity {
            id: inner.next_id(),
            name: new.name.clone(),
            parent_id: new.parent_id,
        };
        inner.collection_mut(kind).push(entity.clone());
        inner.reference_creates += 1;
        Ok(entity)
    }

    async fn create_asset(&self, fields: &AssetFields) -> Result<AssetRecord, StoreError> {
        self.before_write().await;
        let mut inner = self.write_lock();
        inner.check_asset(fields)?;
        let record = AssetRecord {
            id: inner.next_id(),
            fields: fields.clone(),
        };
        inner.assets.push(record.clone());
        inner.asset_writes += 1;
        Ok(record)
    }

    async fn update_asset(
        &self,
        id: DbId,
        fields: &AssetFields,
    ) -> Result<AssetRecord, StoreError> {
        self.before_write().await;
        let mut inner = self.write_lock();
        inner.check_asset(fields)?;
        let record = inner
            .assets
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(StoreError::NotFound { entity: "Asset", id })?;
        record.fields = fields.clone();
        let updated = record.clone();
        inner.asset_writes += 1;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use inventra_core::entity::AssetCondition;

    fn fields(name: &str, serial: Option<&str>) -> AssetFields {
        AssetFields {
            name: name.to_string(),
            serial_number: serial.map(str::to_string),
            category_id: None,
            location_id: None,
            vendor_id: None,
            model: None,
            condition: AssetCondition::Good,
            purchase_date: None,
            purchase_price: None,
            notes: None,
            tags: Vec::new(),
        }
    }

    #[tokio::test]
    async fn ids_are_unique_across_collections() {
        let store = MemoryStore::new();
        let vendor = store.insert_reference(ReferenceKind::Vendor, "Acme", None);
        let asset = store.create_asset(&fields("Fridge", Some("SN1"))).await.unwrap();
        assert_ne!(vendor.id, asset.id);
    }

    #[tokio::test]
    async fn update_replaces_fields() {
        let store = MemoryStore::new();
        let asset = store.insert_asset(fields("Fridge", Some("SN1")));
        let updated = store
            .update_asset(asset.id, &fields("Fridge v2", Some("SN1")))
            .await
            .unwrap();
        assert_eq!(updated.name(), "Fridge v2");
        assert_eq!(store.get_asset(asset.id).await.unwrap().unwrap().name(), "Fridge v2");
    }

    #[tokio::test]
    async fn update_of_missing_asset_is_not_found() {
        let store = MemoryStore::new();
        let err = store.update_asset(99, &fields("X", None)).await.unwrap_err();
        assert_matches!(err, StoreError::NotFound { id: 99, .. });
    }

    #[tokio::test]
    async fn injected_failures_reject_writes() {
        let store = MemoryStore::new();
        store.fail_on_name("Broken");
        store.fail_on_serial("BAD-1");

        assert_matches!(
            store.create_asset(&fields("broken", None)).await,
            Err(StoreError::Rejected(_))
        );
        assert_matches!(
            store.create_asset(&fields("Fine", Some("bad-1"))).await,
            Err(StoreError::Rejected(_))
        );
        assert_matches!(
            store
                .create_reference(ReferenceKind::Vendor, &NewReference::named("Broken"))
                .await,
            Err(StoreError::Rejected(_))
        );
        assert_eq!(store.asset_writes(), 0);
        assert_eq!(store.reference_creates(), 0);
    }

    #[tokio::test]
    async fn unavailable_store_fails_ping_and_reads() {
        let store = MemoryStore::new();
        assert!(store.ping().await.is_ok());

        store.set_unavailable(true);
        assert_matches!(store.ping().await, Err(StoreError::Database(_)));
        assert_matches!(store.list_assets().await, Err(StoreError::Database(_)));

        store.set_unavailable(false);
        assert!(store.ping().await.is_ok());
    }

    #[tokio::test]
    async fn remove_reference_drops_entity() {
        let store = MemoryStore::new();
        let category = store.insert_reference(ReferenceKind::Category, "Tools", None);
        assert!(store.remove_reference(ReferenceKind::Category, category.id));
        assert!(store
            .list_references(ReferenceKind::Category)
            .await
            .unwrap()
            .is_empty());
    }
}
