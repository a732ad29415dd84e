//! Per-row reconciliation: decide Create, Update, or Skip.
//!
//! Pure logic shared by both phases. Analyze feeds it preview outcomes and
//! the snapshot's asset index; Commit feeds it commit outcomes and the
//! index as extended by earlier rows of the same run.

use serde::{Deserialize, Serialize};

use crate::resolver::ReferenceOutcomes;
use crate::row::RawRow;
use crate::snapshot::AssetIndex;
use crate::types::DbId;
use crate::validation::{FieldViolation, RowValidation, ValidatedCandidate};

pub const REASON_NEW_ASSET: &str = "New asset.";
pub const REASON_NEW_ASSET_NO_SERIAL: &str = "New asset (no serial number).";

/// Planned fate of one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowOutcome {
    Create,
    Update,
    Skip,
}

impl RowOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Skip => "skip",
        }
    }
}

impl std::fmt::Display for RowOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The planner's decision for one row.
///
/// `outcome` is `Skip` exactly when `errors` is non-empty, and `Update`
/// exactly when an existing asset shares the row's normalised, non-blank
/// serial number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowDecision {
    /// Zero-based position of the row in the input.
    pub row_index: usize,
    pub outcome: RowOutcome,
    pub reason: String,
    pub errors: Vec<FieldViolation>,
    pub warnings: Vec<String>,
    pub category_id: Option<DbId>,
    pub location_id: Option<DbId>,
    pub vendor_id: Option<DbId>,
    /// The matched asset when `outcome` is `Update`.
    pub existing_asset_id: Option<DbId>,
    pub references: ReferenceOutcomes,
    pub candidate: ValidatedCandidate,
    /// The parsed input, kept so Commit can re-resolve from the raw names.
    pub row: RawRow,
}

impl RowDecision {
    pub fn is_skip(&self) -> bool {
        self.outcome == RowOutcome::Skip
    }
}

/// Decide the fate of one validated row.
pub fn plan(
    row_index: usize,
    row: &RawRow,
    validation: RowValidation,
    references: ReferenceOutcomes,
    assets: &AssetIndex,
) -> RowDecision {
    let RowValidation {
        candidate,
        mut errors,
    } = validation;

    let mut warnings = Vec::new();
    let mut notes = Vec::new();
    for (kind, outcome) in references.iter() {
        if let Some(message) = outcome.error_message(kind) {
            errors.push(FieldViolation::new(kind.as_str(), message));
        }
        if let Some(note) = outcome.creation_note(kind) {
            notes.push(note);
        }
        let raw_name = row.reference(kind).unwrap_or_default();
        if let Some(warning) = outcome.warning_message(kind, raw_name) {
            warnings.push(warning);
        }
    }

    let category_id = references.category.target_id();
    let location_id = references.location.target_id();
    let vendor_id = references.vendor.target_id();

    let (outcome, base_reason, existing_asset_id) = if !errors.is_empty() {
        let joined = errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        (RowOutcome::Skip, joined, None)
    } else {
        match candidate.serial_key() {
            Some(_) => {
                let serial = candidate.serial_number.as_deref().unwrap_or_default();
                match assets.get(serial) {
                    Some(existing) => (
                        RowOutcome::Update,
                        format!(
                            "Matches existing asset '{}' by serial number.",
                            existing.name
                        ),
                        Some(existing.id),
                    ),
                    None => (RowOutcome::Create, REASON_NEW_ASSET.to_string(), None),
                }
            }
            None => (
                RowOutcome::Create,
                REASON_NEW_ASSET_NO_SERIAL.to_string(),
                None,
            ),
        }
    };

    let reason = if outcome == RowOutcome::Skip {
        base_reason
    } else {
        with_notes(base_reason, notes.iter().chain(warnings.iter()))
    };

    RowDecision {
        row_index,
        outcome,
        reason,
        errors,
        warnings,
        category_id,
        location_id,
        vendor_id,
        existing_asset_id,
        references,
        candidate,
        row: row.clone(),
    }
}

fn with_notes<'a>(base: String, notes: impl Iterator<Item = &'a String>) -> String {
    let notes: Vec<&str> = notes.map(String::as_str).collect();
    if notes.is_empty() {
        base
    } else {
        format!("{base} [{}]", notes.join("; "))
    }
}

// ---------------------------------------------------------------------------
// Counts
// ---------------------------------------------------------------------------

/// Outcome counts over a set of decisions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewCounts {
    pub total: usize,
    pub create: usize,
    pub update: usize,
    pub skip: usize,
}

impl PreviewCounts {
    pub fn tally(decisions: &[RowDecision]) -> Self {
        let mut counts = Self {
            total: decisions.len(),
            ..Self::default()
        };
        for decision in decisions {
            match decision.outcome {
                RowOutcome::Create => counts.create += 1,
                RowOutcome::Update => counts.update += 1,
                RowOutcome::Skip => counts.skip += 1,
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{AssetCondition, AssetFields, AssetRecord};
    use crate::resolver::ResolutionOutcome;
    use crate::validation::validate_row;

    fn raw(pairs: &[(&str, &str)]) -> RawRow {
        RawRow::from_pairs(pairs.iter().copied()).row
    }

    fn plan_row(row: &RawRow, references: ReferenceOutcomes, assets: &AssetIndex) -> RowDecision {
        plan(0, row, validate_row(row), references, assets)
    }

    fn existing(id: DbId, name: &str, serial: &str) -> AssetRecord {
        AssetRecord {
            id,
            fields: AssetFields {
                name: name.to_string(),
                serial_number: Some(serial.to_string()),
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
    fn new_serial_creates() {
        let row = raw(&[("name", "Fridge"), ("serialNumber", "SN1")]);
        let decision = plan_row(&row, ReferenceOutcomes::default(), &AssetIndex::default());
        assert_eq!(decision.outcome, RowOutcome::Create);
        assert_eq!(decision.reason, REASON_NEW_ASSET);
        assert!(decision.errors.is_empty());
    }

    #[test]
    fn known_serial_updates() {
        let row = raw(&[("name", "Fridge v2"), ("serialNumber", " sn1 ")]);
        let assets = AssetIndex::from_assets(&[existing(42, "Fridge", "SN1")]);
        let decision = plan_row(&row, ReferenceOutcomes::default(), &assets);
        assert_eq!(decision.outcome, RowOutcome::Update);
        assert_eq!(decision.existing_asset_id, Some(42));
        assert!(decision.reason.contains("Fridge"));
    }

    #[test]
    fn missing_serial_always_creates() {
        let row = raw(&[("name", "Fridge")]);
        let assets = AssetIndex::from_assets(&[existing(42, "Fridge", "SN1")]);
        let decision = plan_row(&row, ReferenceOutcomes::default(), &assets);
        assert_eq!(decision.outcome, RowOutcome::Create);
        assert_eq!(decision.reason, REASON_NEW_ASSET_NO_SERIAL);
    }

    #[test]
    fn validation_errors_skip_with_joined_reason() {
        let row = raw(&[("purchaseDate", "31/12/2024")]);
        let decision = plan_row(&row, ReferenceOutcomes::default(), &AssetIndex::default());
        assert_eq!(decision.outcome, RowOutcome::Skip);
        assert_eq!(decision.reason, "Name is required., Invalid date format.");
    }

    #[test]
    fn blocking_reference_skips_even_with_known_serial() {
        let row = raw(&[("name", "Fridge"), ("serialNumber", "SN1"), ("vendor", "Globex")]);
        let assets = AssetIndex::from_assets(&[existing(42, "Fridge", "SN1")]);
        let references = ReferenceOutcomes {
            vendor: ResolutionOutcome::NotFound {
                name: "Globex".to_string(),
            },
            ..ReferenceOutcomes::default()
        };
        let decision = plan_row(&row, references, &assets);
        assert_eq!(decision.outcome, RowOutcome::Skip);
        assert_eq!(decision.existing_asset_id, None);
        assert_eq!(decision.errors[0].field, "vendor");
        assert!(decision.reason.contains("Globex"));
    }

    #[test]
    fn fuzzy_match_is_a_warning_not_an_error() {
        let row = raw(&[("name", "Drill"), ("vendor", "Acme Co")]);
        let references = ReferenceOutcomes {
            vendor: ResolutionOutcome::WillFuzzyMatch {
                candidate_id: 9,
                candidate_name: "Acme Co.".to_string(),
                similarity: 0.875,
            },
            ..ReferenceOutcomes::default()
        };
        let decision = plan_row(&row, references, &AssetIndex::default());
        assert_eq!(decision.outcome, RowOutcome::Create);
        assert_eq!(decision.vendor_id, Some(9));
        assert_eq!(decision.warnings.len(), 1);
        assert!(decision.reason.contains("Acme Co."));
    }

    #[test]
    fn will_create_is_disclosed_in_reason() {
        let row = raw(&[("name", "Fridge"), ("category", "Appliances")]);
        let references = ReferenceOutcomes {
            category: ResolutionOutcome::WillCreate {
                name: "Appliances".to_string(),
            },
            ..ReferenceOutcomes::default()
        };
        let decision = plan_row(&row, references, &AssetIndex::default());
        assert_eq!(decision.outcome, RowOutcome::Create);
        assert_eq!(decision.category_id, None);
        assert!(decision.reason.contains("will create category: Appliances"));
        assert!(decision.warnings.is_empty());
    }

    #[test]
    fn tally_counts_each_outcome() {
        let assets = AssetIndex::from_assets(&[existing(1, "A", "S1")]);
        let decisions = vec![
            plan_row(
                &raw(&[("name", "A"), ("serialNumber", "S1")]),
                ReferenceOutcomes::default(),
                &assets,
            ),
            plan_row(&raw(&[("name", "B")]), ReferenceOutcomes::default(), &assets),
            plan_row(&raw(&[("model", "X")]), ReferenceOutcomes::default(), &assets),
        ];
        let counts = PreviewCounts::tally(&decisions);
        assert_eq!(
            counts,
            PreviewCounts {
                total: 3,
                create: 1,
                update: 1,
                skip: 1
            }
        );
    }
}
