//! Row validation and normalisation, pure logic.
//!
//! Every check runs independently and appends to the same error list, so
//! one bad field never hides another.

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entity::{AssetCondition, AssetFields};
use crate::row::RawRow;
use crate::types::DbId;

pub const MSG_NAME_REQUIRED: &str = "Name is required.";
pub const MSG_INVALID_DATE: &str = "Invalid date format.";

static ISO_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid regex"));

/// A single field-level problem found in a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// The typed, coerced form of a [`RawRow`].
///
/// When the row carries errors the offending fields hold their fallback
/// value (`None`, empty name, default condition); such a candidate is
/// always planned as a skip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedCandidate {
    pub name: String,
    pub serial_number: Option<String>,
    pub condition: AssetCondition,
    pub purchase_date: Option<NaiveDate>,
    pub purchase_price: Option<Decimal>,
    pub model: Option<String>,
    pub notes: Option<String>,
    pub tags: Vec<String>,
}

impl ValidatedCandidate {
    /// Natural key: the trimmed, lower-cased serial number, if non-blank.
    pub fn serial_key(&self) -> Option<String> {
        self.serial_number
            .as_deref()
            .map(crate::similarity::normalize_name)
            .filter(|s| !s.is_empty())
    }

    /// Combine with resolved reference ids into the fields sent to the store.
    pub fn to_fields(
        &self,
        category_id: Option<DbId>,
        location_id: Option<DbId>,
        vendor_id: Option<DbId>,
    ) -> AssetFields {
        AssetFields {
            name: self.name.clone(),
            serial_number: self.serial_number.clone(),
            category_id,
            location_id,
            vendor_id,
            model: self.model.clone(),
            condition: self.condition,
            purchase_date: self.purchase_date,
            purchase_price: self.purchase_price,
            notes: self.notes.clone(),
            tags: self.tags.clone(),
        }
    }
}

/// Result of validating one row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowValidation {
    pub candidate: ValidatedCandidate,
    pub errors: Vec<FieldViolation>,
}

impl RowValidation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate and coerce one raw row.
pub fn validate_row(row: &RawRow) -> RowValidation {
    let mut errors = Vec::new();

    let name = row.name.as_deref().map(str::trim).unwrap_or_default();
    if name.is_empty() {
        errors.push(FieldViolation::new("name", MSG_NAME_REQUIRED));
    }

    let condition = match row.condition.as_deref() {
        Some(raw) => parse_condition(raw).unwrap_or_else(|violation| {
            errors.push(violation);
            AssetCondition::default()
        }),
        None => AssetCondition::default(),
    };

    let purchase_date = row.purchase_date.as_deref().and_then(|raw| {
        parse_iso_date(raw)
            .map_err(|violation| errors.push(violation))
            .ok()
    });

    let purchase_price = row.purchase_price.as_deref().and_then(|raw| {
        parse_price(raw)
            .map_err(|violation| errors.push(violation))
            .ok()
    });

    let candidate = ValidatedCandidate {
        name: name.to_string(),
        serial_number: trimmed(row.serial_number.as_deref()),
        condition,
        purchase_date,
        purchase_price,
        model: trimmed(row.model.as_deref()),
        notes: trimmed(row.notes.as_deref()),
        tags: row.tags.as_deref().map(normalize_tags).unwrap_or_default(),
    };

    RowValidation { candidate, errors }
}

/// Trim and capitalise (first letter upper, rest lower), then match the
/// enum.
pub fn parse_condition(raw: &str) -> Result<AssetCondition, FieldViolation> {
    let normalized = capitalize(raw.trim());
    normalized.parse::<AssetCondition>().map_err(|_| {
        FieldViolation::new(
            "condition",
            format!(
                "Invalid condition '{}'. Must be one of: {}.",
                raw.trim(),
                AssetCondition::ALL.join(", ")
            ),
        )
    })
}

/// Accept exactly `YYYY-MM-DD` naming a real calendar day.
pub fn parse_iso_date(raw: &str) -> Result<NaiveDate, FieldViolation> {
    let raw = raw.trim();
    if !ISO_DATE_RE.is_match(raw) {
        return Err(FieldViolation::new("purchaseDate", MSG_INVALID_DATE));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| FieldViolation::new("purchaseDate", MSG_INVALID_DATE))
}

/// Strip `$` and `,` then parse. Non-numeric input is an error, never a
/// silent zero.
pub fn parse_price(raw: &str) -> Result<Decimal, FieldViolation> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ','))
        .collect();
    let value = Decimal::from_str(cleaned.trim()).map_err(|_| {
        FieldViolation::new(
            "purchasePrice",
            format!("Invalid purchase price '{}'.", raw.trim()),
        )
    })?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(FieldViolation::new(
            "purchasePrice",
            "Purchase price cannot be negative.",
        ));
    }
    Ok(value)
}

/// Split on commas, trim, drop empties, title-case each word, then
/// de-duplicate keeping the first occurrence.
pub fn normalize_tags(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let titled = title_case(tag);
        if !tags.contains(&titled) {
            tags.push(titled);
        }
    }
    tags
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        RawRow::from_pairs(pairs.iter().copied()).row
    }

    #[test]
    fn minimal_valid_row() {
        let result = validate_row(&row(&[("name", "Fridge")]));
        assert!(result.is_valid());
        assert_eq!(result.candidate.name, "Fridge");
        assert_eq!(result.candidate.condition, AssetCondition::Good);
        assert!(result.candidate.tags.is_empty());
    }

    #[test]
    fn missing_name_is_an_error() {
        let result = validate_row(&row(&[("serialNumber", "SN1")]));
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].message, MSG_NAME_REQUIRED);
    }

    #[test]
    fn condition_is_case_normalized() {
        let result = validate_row(&row(&[("name", "Chair"), ("condition", "  fAIR ")]));
        assert!(result.is_valid());
        assert_eq!(result.candidate.condition, AssetCondition::Fair);
    }

    #[test]
    fn unknown_condition_is_an_error() {
        let result = validate_row(&row(&[("name", "Chair"), ("condition", "broken")]));
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].field, "condition");
        assert!(result.errors[0].message.contains("broken"));
    }

    #[test]
    fn date_must_be_iso() {
        for bad in ["01/02/2024", "2024-1-2", "2024-01-02T00:00", "2024-13-40"] {
            let result = validate_row(&row(&[("name", "Desk"), ("purchaseDate", bad)]));
            assert_eq!(result.errors.len(), 1, "input: {bad}");
            assert_eq!(result.errors[0].message, MSG_INVALID_DATE);
        }
        let ok = validate_row(&row(&[("name", "Desk"), ("purchaseDate", "2024-02-29")]));
        assert!(ok.is_valid());
        assert_eq!(
            ok.candidate.purchase_date,
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
    }

    #[test]
    fn price_strips_currency_and_commas() {
        assert_eq!(parse_price("$1,299.99").unwrap(), Decimal::new(129999, 2));
        assert_eq!(parse_price("0").unwrap(), Decimal::ZERO);
    }

    #[test]
    fn non_numeric_price_is_an_error_not_zero() {
        let result = validate_row(&row(&[("name", "Desk"), ("purchasePrice", "about ten")]));
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.candidate.purchase_price, None);
    }

    #[test]
    fn negative_price_is_an_error() {
        assert!(parse_price("-5").is_err());
    }

    #[test]
    fn errors_accumulate_across_fields() {
        let result = validate_row(&row(&[
            ("condition", "meh"),
            ("purchaseDate", "yesterday"),
            ("purchasePrice", "n/a"),
        ]));
        let fields: Vec<&str> = result.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "condition", "purchaseDate", "purchasePrice"]);
    }

    #[test]
    fn tags_are_trimmed_titled_and_deduplicated() {
        assert_eq!(
            normalize_tags(" kitchen, ,white goods,Kitchen, WHITE goods "),
            vec!["Kitchen".to_string(), "White Goods".to_string()]
        );
    }

    #[test]
    fn serial_key_is_normalized() {
        let result = validate_row(&row(&[("name", "TV"), ("serialNumber", " Ab-12 ")]));
        assert_eq!(result.candidate.serial_number.as_deref(), Some("Ab-12"));
        assert_eq!(result.candidate.serial_key().as_deref(), Some("ab-12"));
    }
}
