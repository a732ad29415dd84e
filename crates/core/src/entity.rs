//! Inventory records the import engine reads and writes.
//!
//! Reference entities (categories, locations, vendors) share one shape;
//! locations additionally carry an optional parent.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Reference kinds
// ---------------------------------------------------------------------------

/// The three foreign-entity kinds a row can name by free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Category,
    Location,
    Vendor,
}

impl ReferenceKind {
    /// Resolution order used for every row.
    pub const ALL: [ReferenceKind; 3] = [Self::Category, Self::Location, Self::Vendor];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Location => "location",
            Self::Vendor => "vendor",
        }
    }

    /// Only vendors are resolved with the fuzzy step. Categories and
    /// locations are short organiser-authored taxonomies where a fuzzy
    /// merge would be silent and wrong.
    pub fn allows_fuzzy(&self) -> bool {
        matches!(self, Self::Vendor)
    }
}

impl std::fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An existing category, location, or vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEntity {
    pub id: DbId,
    pub name: String,
    /// Parent location; always `None` for categories and vendors.
    pub parent_id: Option<DbId>,
}

/// Fields for creating a reference entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReference {
    pub name: String,
    pub parent_id: Option<DbId>,
}

impl NewReference {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent_id: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Asset condition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AssetCondition {
    New,
    #[default]
    Good,
    Fair,
    Poor,
}

impl AssetCondition {
    pub const ALL: &'static [&'static str] = &["New", "Good", "Fair", "Poor"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Poor => "Poor",
        }
    }
}

/// Parses an already case-normalised value ("Good", not "good").
impl std::str::FromStr for AssetCondition {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "New" => Ok(Self::New),
            "Good" => Ok(Self::Good),
            "Fair" => Ok(Self::Fair),
            "Poor" => Ok(Self::Poor),
            other => Err(CoreError::Validation(format!(
                "Unknown asset condition '{other}'"
            ))),
        }
    }
}

impl std::fmt::Display for AssetCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Assets
// ---------------------------------------------------------------------------

/// The writable fields of an asset, as sent to the store on create or
/// update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetFields {
    pub name: String,
    pub serial_number: Option<String>,
    pub category_id: Option<DbId>,
    pub location_id: Option<DbId>,
    pub vendor_id: Option<DbId>,
    pub model: Option<String>,
    pub condition: AssetCondition,
    pub purchase_date: Option<NaiveDate>,
    pub purchase_price: Option<Decimal>,
    pub notes: Option<String>,
    pub tags: Vec<String>,
}

/// A persisted asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: DbId,
    #[serde(flatten)]
    pub fields: AssetFields,
}

impl AssetRecord {
    pub fn name(&self) -> &str {
        &self.fields.name
    }

    pub fn serial_number(&self) -> Option<&str> {
        self.fields.serial_number.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn only_vendor_allows_fuzzy() {
        assert!(ReferenceKind::Vendor.allows_fuzzy());
        assert!(!ReferenceKind::Category.allows_fuzzy());
        assert!(!ReferenceKind::Location.allows_fuzzy());
    }

    #[test]
    fn condition_defaults_to_good() {
        assert_eq!(AssetCondition::default(), AssetCondition::Good);
    }

    #[test]
    fn condition_parse_is_exact() {
        assert_eq!("Fair".parse::<AssetCondition>().unwrap(), AssetCondition::Fair);
        assert_matches!("fair".parse::<AssetCondition>(), Err(CoreError::Validation(_)));
        assert_matches!("Broken".parse::<AssetCondition>(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&ReferenceKind::Vendor).unwrap();
        assert_eq!(json, "\"vendor\"");
    }
}
