//! Typed raw rows and the accepted header contract.
//!
//! Extraction yields loosely-shaped string maps. [`RawRow`] is the fixed
//! set of columns the engine understands; everything else is dropped
//! during parsing and reported as an ignored column.

use serde::{Deserialize, Serialize};

use crate::entity::ReferenceKind;

/// Canonical column names, in the order they are documented.
pub const RECOGNIZED_COLUMNS: &[&str] = &[
    "name",
    "category",
    "location",
    "vendor",
    "serialNumber",
    "model",
    "condition",
    "purchaseDate",
    "purchasePrice",
    "notes",
    "tags",
];

/// One input row restricted to the recognised columns.
///
/// Values are trimmed and blank values are stored as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRow {
    pub name: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub vendor: Option<String>,
    pub serial_number: Option<String>,
    pub model: Option<String>,
    pub condition: Option<String>,
    pub purchase_date: Option<String>,
    pub purchase_price: Option<String>,
    pub notes: Option<String>,
    pub tags: Option<String>,
}

/// A parsed row plus the column names that were not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRow {
    pub row: RawRow,
    pub ignored_columns: Vec<String>,
}

impl RawRow {
    /// Build a row from `(column, value)` pairs.
    ///
    /// Column names match case-insensitively and ignore spaces,
    /// underscores and hyphens, so `Serial Number`, `serial_number` and
    /// `serialNumber` all land in [`RawRow::serial_number`]. When a column
    /// appears twice the first non-blank value wins.
    pub fn from_pairs<I, K, V>(pairs: I) -> ParsedRow
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut row = RawRow::default();
        let mut ignored_columns = Vec::new();

        for (key, value) in pairs {
            let key = key.as_ref();
            match row.slot_mut(&column_key(key)) {
                Some(slot) => {
                    if slot.is_none() {
                        *slot = non_blank(value.as_ref());
                    }
                }
                None => {
                    if !key.trim().is_empty() && !ignored_columns.iter().any(|c| c == key) {
                        ignored_columns.push(key.to_string());
                    }
                }
            }
        }

        ParsedRow {
            row,
            ignored_columns,
        }
    }

    /// Build a row from a JSON object. Numbers and booleans are rendered
    /// to strings; nulls, arrays, and nested objects count as absent.
    pub fn from_json_object(object: &serde_json::Map<String, serde_json::Value>) -> ParsedRow {
        let pairs = object.iter().map(|(key, value)| {
            let text = match value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                _ => String::new(),
            };
            (key.as_str(), text)
        });
        Self::from_pairs(pairs)
    }

    /// The raw name given for a reference column, if any.
    pub fn reference(&self, kind: ReferenceKind) -> Option<&str> {
        match kind {
            ReferenceKind::Category => self.category.as_deref(),
            ReferenceKind::Location => self.location.as_deref(),
            ReferenceKind::Vendor => self.vendor.as_deref(),
        }
    }

    fn slot_mut(&mut self, normalized_key: &str) -> Option<&mut Option<String>> {
        let slot = match normalized_key {
            "name" => &mut self.name,
            "category" => &mut self.category,
            "location" => &mut self.location,
            "vendor" => &mut self.vendor,
            "serialnumber" => &mut self.serial_number,
            "model" => &mut self.model,
            "condition" => &mut self.condition,
            "purchasedate" => &mut self.purchase_date,
            "purchaseprice" => &mut self.purchase_price,
            "notes" => &mut self.notes,
            "tags" => &mut self.tags,
            _ => return None,
        };
        Some(slot)
    }
}

fn column_key(column: &str) -> String {
    column
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
