//! Resolution of free-text reference names against a snapshot.
//!
//! Matching is pure and shared by both phases: [`match_reference`] picks
//! the target entity, and the preview and commit paths only differ in
//! what they do with a miss. That shared step is what keeps Analyze and
//! Commit choosing the same entity for the same name and snapshot.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::config::ImportConfig;
use crate::entity::{ReferenceEntity, ReferenceKind};
use crate::similarity::{normalize_name, similarity};
use crate::snapshot::Snapshot;
use crate::types::DbId;

/// Whether resolution may write to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveMode {
    Preview,
    Commit,
}

/// A ranked fuzzy candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuzzyCandidate {
    pub id: DbId,
    pub name: String,
    pub similarity: f64,
}

/// What the snapshot says about a name, before any side effects.
#[derive(Debug, Clone, PartialEq)]
pub enum ReferenceMatch {
    /// Blank name: the optional column was not filled in.
    Blank,
    /// Case-insensitive exact hit.
    Exact(ReferenceEntity),
    /// Best candidate at or above the fuzzy threshold, followed by the
    /// runners-up that were also kept.
    Fuzzy {
        best: FuzzyCandidate,
        alternatives: Vec<FuzzyCandidate>,
    },
    /// Nothing close enough. Carries the trimmed display name.
    Missing(String),
}

/// Tagged result of resolving one reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResolutionOutcome {
    NoReference,
    Found {
        id: DbId,
        name: String,
    },
    WillFuzzyMatch {
        candidate_id: DbId,
        candidate_name: String,
        similarity: f64,
    },
    FuzzyMatched {
        id: DbId,
        name: String,
        similarity: f64,
    },
    WillCreate {
        name: String,
    },
    Created {
        id: DbId,
        name: String,
    },
    NotFound {
        name: String,
    },
    CreationFailed {
        name: String,
        error: String,
    },
}

impl ResolutionOutcome {
    /// The entity id this outcome points at, if it is already known.
    pub fn target_id(&self) -> Option<DbId> {
        match self {
            Self::Found { id, .. } | Self::FuzzyMatched { id, .. } | Self::Created { id, .. } => {
                Some(*id)
            }
            Self::WillFuzzyMatch { candidate_id, .. } => Some(*candidate_id),
            _ => None,
        }
    }

    /// `NotFound` and `CreationFailed` force the row to skip.
    pub fn is_blocking(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::CreationFailed { .. })
    }

    pub fn is_fuzzy(&self) -> bool {
        matches!(self, Self::WillFuzzyMatch { .. } | Self::FuzzyMatched { .. })
    }

    /// Error text for blocking outcomes.
    pub fn error_message(&self, kind: ReferenceKind) -> Option<String> {
        match self {
            Self::NotFound { name } => Some(format!("{} '{name}' not found", capitalized(kind))),
            Self::CreationFailed { name, error } => {
                Some(format!("Failed to create {kind} '{name}': {error}"))
            }
            _ => None,
        }
    }

    /// Disclosure text for fuzzy matches.
    pub fn warning_message(&self, kind: ReferenceKind, raw_name: &str) -> Option<String> {
        let (target, score) = match self {
            Self::WillFuzzyMatch {
                candidate_name,
                similarity,
                ..
            } => (candidate_name, similarity),
            Self::FuzzyMatched {
                name, similarity, ..
            } => (name, similarity),
            _ => return None,
        };
        Some(format!(
            "{} '{}' matched to existing '{target}' ({:.0}% similar)",
            capitalized(kind),
            raw_name.trim(),
            score * 100.0
        ))
    }

    /// Note text for entities that will be or were created.
    pub fn creation_note(&self, kind: ReferenceKind) -> Option<String> {
        match self {
            Self::WillCreate { name } => Some(format!("will create {kind}: {name}")),
            Self::Created { name, .. } => Some(format!("created {kind}: {name}")),
            _ => None,
        }
    }
}

/// Resolution outcomes for the three reference columns of one row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceOutcomes {
    pub category: ResolutionOutcome,
    pub location: ResolutionOutcome,
    pub vendor: ResolutionOutcome,
}

impl Default for ReferenceOutcomes {
    fn default() -> Self {
        Self {
            category: ResolutionOutcome::NoReference,
            location: ResolutionOutcome::NoReference,
            vendor: ResolutionOutcome::NoReference,
        }
    }
}

impl ReferenceOutcomes {
    pub fn get(&self, kind: ReferenceKind) -> &ResolutionOutcome {
        match kind {
            ReferenceKind::Category => &self.category,
            ReferenceKind::Location => &self.location,
            ReferenceKind::Vendor => &self.vendor,
        }
    }

    pub fn set(&mut self, kind: ReferenceKind, outcome: ResolutionOutcome) {
        match kind {
            ReferenceKind::Category => self.category = outcome,
            ReferenceKind::Location => self.location = outcome,
            ReferenceKind::Vendor => self.vendor = outcome,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ReferenceKind, &ResolutionOutcome)> {
        ReferenceKind::ALL.into_iter().map(|kind| (kind, self.get(kind)))
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Match a raw name against the snapshot entities of `kind`.
///
/// Exact case-insensitive comparison first, in snapshot order. Vendors
/// then fall back to edit-distance similarity; categories and locations
/// do not.
pub fn match_reference(
    kind: ReferenceKind,
    raw_name: &str,
    snapshot: &Snapshot,
    config: &ImportConfig,
) -> ReferenceMatch {
    let display = raw_name.trim();
    if display.is_empty() {
        return ReferenceMatch::Blank;
    }

    let wanted = normalize_name(display);
    let existing = snapshot.references(kind);

    if let Some(hit) = existing.iter().find(|e| normalize_name(&e.name) == wanted) {
        return ReferenceMatch::Exact(hit.clone());
    }

    if kind.allows_fuzzy() {
        let mut ranked = fuzzy_candidates(&wanted, existing, config);
        if !ranked.is_empty() {
            let best = ranked.remove(0);
            return ReferenceMatch::Fuzzy {
                best,
                alternatives: ranked,
            };
        }
    }

    ReferenceMatch::Missing(display.to_string())
}

/// Candidates scoring at least the threshold, best first, truncated to
/// `max_fuzzy_candidates`. Equal scores keep snapshot order.
pub fn fuzzy_candidates(
    normalized_name: &str,
    existing: &[ReferenceEntity],
    config: &ImportConfig,
) -> Vec<FuzzyCandidate> {
    let mut scored: Vec<FuzzyCandidate> = existing
        .iter()
        .filter_map(|entity| {
            let score = similarity(normalized_name, &normalize_name(&entity.name));
            (score >= config.fuzzy_threshold).then(|| FuzzyCandidate {
                id: entity.id,
                name: entity.name.clone(),
                similarity: score,
            })
        })
        .collect();

    // Stable sort, so ties stay in snapshot order.
    scored.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(Ordering::Equal)
    });
    scored.truncate(config.max_fuzzy_candidates);
    scored
}

/// Preview-mode resolution: never touches the store.
pub fn resolve_preview(
    kind: ReferenceKind,
    raw_name: Option<&str>,
    snapshot: &Snapshot,
    auto_create: bool,
    config: &ImportConfig,
) -> ResolutionOutcome {
    match match_reference(kind, raw_name.unwrap_or_default(), snapshot, config) {
        ReferenceMatch::Blank => ResolutionOutcome::NoReference,
        ReferenceMatch::Exact(entity) => ResolutionOutcome::Found {
            id: entity.id,
            name: entity.name,
        },
        ReferenceMatch::Fuzzy { best, .. } => ResolutionOutcome::WillFuzzyMatch {
            candidate_id: best.id,
            candidate_name: best.name,
            similarity: best.similarity,
        },
        ReferenceMatch::Missing(name) if auto_create => ResolutionOutcome::WillCreate { name },
        ReferenceMatch::Missing(name) => ResolutionOutcome::NotFound { name },
    }
}

fn capitalized(kind: ReferenceKind) -> &'static str {
    match kind {
        ReferenceKind::Category => "Category",
        ReferenceKind::Location => "Location",
        ReferenceKind::Vendor => "Vendor",
    }
}
