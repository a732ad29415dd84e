//! Read-only duplicate scan over persisted inventory records.
//!
//! Single pass per collection: each record's normalised key goes into a
//! map, and a second record landing on an occupied key is reported
//! together with the record that got there first.

use std::collections::HashMap;

use serde::Serialize;

use crate::entity::{AssetRecord, ReferenceEntity};
use crate::similarity::normalize_name;
use crate::types::DbId;

/// Which collection an issue was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateKind {
    AssetSerial,
    CategoryName,
    LocationName,
    VendorName,
}

/// A pointer to one of the conflicting records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordRef {
    pub id: DbId,
    pub name: String,
}

/// Two records sharing a normalised key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateIssue {
    pub kind: DuplicateKind,
    /// The normalised key both records map to.
    pub key: String,
    pub first: RecordRef,
    pub duplicate: RecordRef,
}

/// Everything the scan found, in collection then listing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DuplicateReport {
    pub scanned: usize,
    pub issues: Vec<DuplicateIssue>,
}

impl DuplicateReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Scan all four collections.
pub fn scan_duplicates(
    assets: &[AssetRecord],
    categories: &[ReferenceEntity],
    locations: &[ReferenceEntity],
    vendors: &[ReferenceEntity],
) -> DuplicateReport {
    let mut issues = Vec::new();

    collect(
        DuplicateKind::AssetSerial,
        assets.iter().filter_map(|a| {
            let key = normalize_name(a.serial_number()?);
            (!key.is_empty()).then(|| (key, record(a.id, a.name())))
        }),
        &mut issues,
    );
    collect(
        DuplicateKind::CategoryName,
        categories.iter().map(name_key),
        &mut issues,
    );
    collect(
        DuplicateKind::LocationName,
        locations.iter().map(|l| {
            let key = match l.parent_id {
                Some(parent) => format!("{}@{parent}", normalize_name(&l.name)),
                None => normalize_name(&l.name),
            };
            (key, record(l.id, &l.name))
        }),
        &mut issues,
    );
    collect(
        DuplicateKind::VendorName,
        vendors.iter().map(name_key),
        &mut issues,
    );

    DuplicateReport {
        scanned: assets.len() + categories.len() + locations.len() + vendors.len(),
        issues,
    }
}

fn collect(
    kind: DuplicateKind,
    keyed: impl Iterator<Item = (String, RecordRef)>,
    issues: &mut Vec<DuplicateIssue>,
) {
    let mut seen: HashMap<String, RecordRef> = HashMap::new();
    for (key, current) in keyed {
        match seen.get(&key) {
            Some(first) => issues.push(DuplicateIssue {
                kind,
                key,
                first: first.clone(),
                duplicate: current,
            }),
            None => {
                seen.insert(key, current);
            }
        }
    }
}

fn name_key(entity: &ReferenceEntity) -> (String, RecordRef) {
    (normalize_name(&entity.name), record(entity.id, &entity.name))
}

fn record(id: DbId, name: &str) -> RecordRef {
    RecordRef {
        id,
        name: name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{AssetCondition, AssetFields};

    fn reference(id: DbId, name: &str, parent_id: Option<DbId>) -> ReferenceEntity {
        ReferenceEntity {
            id,
            name: name.to_string(),
            parent_id,
        }
    }

    fn asset(id: DbId, name: &str, serial: Option<&str>) -> AssetRecord {
        AssetRecord {
            id,
            fields: AssetFields {
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
            },
        }
    }

    #[test]
    fn clean_inventory_has_no_issues() {
        let report = scan_duplicates(
            &[asset(1, "Fridge", Some("SN1")), asset(2, "Oven", Some("SN2"))],
            &[reference(1, "Appliances", None)],
            &[reference(1, "Kitchen", None)],
            &[reference(1, "Acme", None)],
        );
        assert!(report.is_clean());
        assert_eq!(report.scanned, 5);
    }

    #[test]
    fn detects_serial_collision_case_insensitively() {
        let report = scan_duplicates(
            &[asset(1, "Fridge", Some("sn1")), asset(2, "Fridge B", Some(" SN1 "))],
            &[],
            &[],
            &[],
        );
        assert_eq!(report.issues.len(), 1);
        let issue = &report.issues[0];
        assert_eq!(issue.kind, DuplicateKind::AssetSerial);
        assert_eq!(issue.first.id, 1);
        assert_eq!(issue.duplicate.id, 2);
    }

    #[test]
    fn assets_without_serial_are_ignored() {
        let report = scan_duplicates(
            &[asset(1, "Chair", None), asset(2, "Chair", None)],
            &[],
            &[],
            &[],
        );
        assert!(report.is_clean());
    }

    #[test]
    fn location_key_includes_parent() {
        let report = scan_duplicates(
            &[],
            &[],
            &[
                reference(1, "Storage", Some(10)),
                reference(2, "storage", Some(11)),
                reference(3, "STORAGE ", Some(10)),
            ],
            &[],
        );
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].first.id, 1);
        assert_eq!(report.issues[0].duplicate.id, 3);
    }

    #[test]
    fn every_extra_occurrence_is_reported_against_the_first() {
        let report = scan_duplicates(
            &[],
            &[],
            &[],
            &[
                reference(1, "Acme", None),
                reference(2, "acme", None),
                reference(3, "ACME", None),
            ],
        );
        assert_eq!(report.issues.len(), 2);
        assert!(report.issues.iter().all(|i| i.first.id == 1));
        assert_eq!(report.issues[0].kind, DuplicateKind::VendorName);
    }
}
