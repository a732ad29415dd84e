//! Commit-mode reference resolution.
//!
//! Uses the same [`match_reference`] step as preview, so the entity
//! picked here is the one Analyze promised. A miss with auto-create on
//! writes through the store and appends the new entity to the phase
//! snapshot, which is how a later row naming the same entity finds it.

use inventra_core::config::ImportConfig;
use inventra_core::entity::{NewReference, ReferenceKind};
use inventra_core::resolver::{
    match_reference, ReferenceMatch, ReferenceOutcomes, ResolutionOutcome,
};
use inventra_core::row::RawRow;
use inventra_core::snapshot::Snapshot;

use crate::store::EntityStore;

/// Resolve one reference in commit mode.
///
/// Store failures become [`ResolutionOutcome::CreationFailed`] and never
/// propagate.
pub async fn resolve_commit(
    kind: ReferenceKind,
    raw_name: Option<&str>,
    snapshot: &mut Snapshot,
    store: &dyn EntityStore,
    auto_create: bool,
    config: &ImportConfig,
) -> ResolutionOutcome {
    match match_reference(kind, raw_name.unwrap_or_default(), snapshot, config) {
        ReferenceMatch::Blank => ResolutionOutcome::NoReference,
        ReferenceMatch::Exact(entity) => ResolutionOutcome::Found {
            id: entity.id,
            name: entity.name,
        },
        ReferenceMatch::Fuzzy { best, .. } => ResolutionOutcome::FuzzyMatched {
            id: best.id,
            name: best.name,
            similarity: best.similarity,
        },
        ReferenceMatch::Missing(name) if auto_create => {
            match store.create_reference(kind, &NewReference::named(name.clone())).await {
                Ok(entity) => {
                    tracing::info!(
                        kind = %kind,
                        id = entity.id,
                        name = %entity.name,
                        "Auto-created reference entity",
                    );
                    let outcome = ResolutionOutcome::Created {
                        id: entity.id,
                        name: entity.name.clone(),
                    };
                    snapshot.push_reference(kind, entity);
                    outcome
                }
                Err(e) => {
                    tracing::warn!(
                        kind = %kind,
                        name = %name,
                        error = %e,
                        "Reference creation failed",
                    );
                    ResolutionOutcome::CreationFailed {
                        name,
                        error: e.to_string(),
                    }
                }
            }
        }
        ReferenceMatch::Missing(name) => ResolutionOutcome::NotFound { name },
    }
}

/// Resolve all three reference columns of a row, in [`ReferenceKind::ALL`] order.
pub async fn resolve_row_commit(
    row: &RawRow,
    snapshot: &mut Snapshot,
    store: &dyn EntityStore,
    auto_create: bool,
    config: &ImportConfig,
) -> ReferenceOutcomes {
    let mut outcomes = ReferenceOutcomes::default();
    for kind in ReferenceKind::ALL {
        let outcome =
            resolve_commit(kind, row.reference(kind), snapshot, store, auto_create, config).await;
        outcomes.set(kind, outcome);
    }
    outcomes
}
