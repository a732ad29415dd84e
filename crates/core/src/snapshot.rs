//! Phase-scoped, in-memory copy of the existing inventory.
//!
//! A snapshot is taken once at the start of Analyze and once at the start
//! of Commit, and is the only read source for the rest of that phase.
//! During Commit it is extended in place with every entity or asset the
//! phase creates, so later rows observe earlier rows' writes.

use std::collections::HashMap;

use serde::Serialize;

use crate::entity::{AssetRecord, ReferenceEntity, ReferenceKind};
use crate::similarity::normalize_name;
use crate::types::DbId;

/// The part of an existing asset the planner needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexedAsset {
    pub id: DbId,
    pub name: String,
}

/// Existing assets keyed by normalised serial number.
///
/// When storage already holds two assets with the same serial, the first
/// one listed wins; the duplicate scanner reports the collision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetIndex {
    by_serial: HashMap<String, IndexedAsset>,
}

impl AssetIndex {
    pub fn from_assets<'a>(assets: impl IntoIterator<Item = &'a AssetRecord>) -> Self {
        let mut index = Self::default();
        for asset in assets {
            index.insert(asset.serial_number(), asset.id, asset.name());
        }
        index
    }

    /// Look up by raw serial; blank serials never match.
    pub fn get(&self, serial: &str) -> Option<&IndexedAsset> {
        let key = normalize_name(serial);
        if key.is_empty() {
            return None;
        }
        self.by_serial.get(&key)
    }

    /// Record an asset. Blank or missing serials are not indexed, and an
    /// existing entry for the same key is kept.
    pub fn insert(&mut self, serial: Option<&str>, id: DbId, name: &str) {
        let Some(key) = serial.map(normalize_name).filter(|k| !k.is_empty()) else {
            return;
        };
        self.by_serial.entry(key).or_insert_with(|| IndexedAsset {
            id,
            name: name.to_string(),
        });
    }

    pub fn len(&self) -> usize {
        self.by_serial.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_serial.is_empty()
    }
}

/// Every reference collection plus the asset index, frozen for one phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    categories: Vec<ReferenceEntity>,
    locations: Vec<ReferenceEntity>,
    vendors: Vec<ReferenceEntity>,
    assets: AssetIndex,
}

impl Snapshot {
    pub fn new(
        categories: Vec<ReferenceEntity>,
        locations: Vec<ReferenceEntity>,
        vendors: Vec<ReferenceEntity>,
        assets: &[AssetRecord],
    ) -> Self {
        Self {
            categories,
            locations,
            vendors,
            assets: AssetIndex::from_assets(assets),
        }
    }

    /// Existing entities of `kind`, in store listing order.
    pub fn references(&self, kind: ReferenceKind) -> &[ReferenceEntity] {
        match kind {
            ReferenceKind::Category => &self.categories,
            ReferenceKind::Location => &self.locations,
            ReferenceKind::Vendor => &self.vendors,
        }
    }

    /// Append an entity created during this phase.
    pub fn push_reference(&mut self, kind: ReferenceKind, entity: ReferenceEntity) {
        match kind {
            ReferenceKind::Category => self.categories.push(entity),
            ReferenceKind::Location => self.locations.push(entity),
            ReferenceKind::Vendor => self.vendors.push(entity),
        }
    }

    pub fn assets(&self) -> &AssetIndex {
        &self.assets
    }

    /// Index an asset created during this phase.
    pub fn record_asset(&mut self, serial: Option<&str>, id: DbId, name: &str) {
        self.assets.insert(serial, id, name);
    }
}
