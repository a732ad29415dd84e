//! Two-phase batch orchestration: Analyze, then Commit.
//!
//! Each phase loads one [`Snapshot`] at its start and reads nothing else
//! from the store for the rest of the phase. Analyze never writes. Commit
//! walks the analysed rows in input order, owns its snapshot mutably and
//! extends it with every entity and asset it creates, so the second of
//! two rows naming the same new vendor or serial number sees the first
//! row's write.
//!
//! Only ingestion and snapshot-load failures are returned as errors.
//! Everything that goes wrong with a single row ends up in that row's
//! decision or in the [`BatchSummary`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use inventra_core::config::ImportConfig;
use inventra_core::duplicate_scan::{scan_duplicates, DuplicateReport};
use inventra_core::entity::ReferenceKind;
use inventra_core::planner::{plan, PreviewCounts, RowDecision, RowOutcome};
use inventra_core::resolver::{resolve_preview, ReferenceOutcomes, ResolutionOutcome};
use inventra_core::row::{ParsedRow, RawRow};
use inventra_core::snapshot::Snapshot;
use inventra_core::types::DbId;
use inventra_core::validation::validate_row;

use crate::error::ImportError;
use crate::extract::{Extraction, ExtractionStatus};
use crate::resolve::resolve_row_commit;
use crate::store::EntityStore;

// ---------------------------------------------------------------------------
// Options and results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOptions {
    /// Create missing categories, locations, and vendors instead of
    /// skipping the row.
    pub auto_create_entities: bool,
}

/// The output of Analyze, and the only way into Commit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    decisions: Vec<RowDecision>,
    counts: PreviewCounts,
    ignored_columns: Vec<String>,
    options: ImportOptions,
}

impl AnalysisReport {
    pub fn decisions(&self) -> &[RowDecision] {
        &self.decisions
    }

    pub fn counts(&self) -> PreviewCounts {
        self.counts
    }

    /// Input column names that are not part of the header contract.
    pub fn ignored_columns(&self) -> &[String] {
        &self.ignored_columns
    }

    /// Options the analysis ran with.
    pub fn options(&self) -> ImportOptions {
        self.options
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedReference {
    pub kind: ReferenceKind,
    pub id: DbId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowFailure {
    pub row_index: usize,
    pub reason: String,
}

/// Outcome of a Commit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub created: usize,
    pub updated: usize,
    /// Rows skipped during Analyze plus rows that failed during Commit.
    pub skipped: usize,
    pub created_asset_ids: Vec<DbId>,
    pub created_references: Vec<CreatedReference>,
    /// The first few commit-time failures, in row order.
    pub failures: Vec<RowFailure>,
    pub cancelled: bool,
    /// Rows never reached because the run was cancelled.
    pub unprocessed: usize,
}

impl BatchSummary {
    /// True when every row was created or updated.
    pub fn is_complete(&self) -> bool {
        self.skipped == 0 && !self.cancelled
    }

    fn record_failure(&mut self, row_index: usize, reason: String, max_reported: usize) {
        self.skipped += 1;
        if self.failures.len() < max_reported {
            self.failures.push(RowFailure { row_index, reason });
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct ImportEngine {
    store: Arc<dyn EntityStore>,
    config: ImportConfig,
    /// Held for the whole of a commit. Two commits must not plan against
    /// the same snapshot, or both would create the same serial or name.
    commit_lock: Mutex<()>,
}

impl ImportEngine {
    pub fn new(store: Arc<dyn EntityStore>, config: ImportConfig) -> Self {
        Self {
            store,
            config,
            commit_lock: Mutex::new(()),
        }
    }

    // -- Ingestion --

    /// Turn an extraction into parsed rows.
    ///
    /// An extraction that did not succeed aborts the run with its details
    /// surfaced verbatim.
    pub fn ingest(&self, extraction: Extraction) -> Result<Vec<ParsedRow>, ImportError> {
        if extraction.status != ExtractionStatus::Success {
            let details = extraction
                .details
                .unwrap_or_else(|| "Document extraction failed.".to_string());
            return Err(ImportError::Ingestion(details));
        }
        let rows: Vec<ParsedRow> = extraction.output.into_iter().map(RawRow::from_pairs).collect();
        self.check_batch_size(rows.len())?;
        Ok(rows)
    }

    /// Parse rows submitted as JSON objects.
    pub fn ingest_json(&self, rows: &[serde_json::Value]) -> Result<Vec<ParsedRow>, ImportError> {
        let parsed = rows
            .iter()
            .enumerate()
            .map(|(idx, value)| match value.as_object() {
                Some(object) => Ok(RawRow::from_json_object(object)),
                None => Err(ImportError::Ingestion(format!(
                    "Row {} is not an object.",
                    idx + 1
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.check_batch_size(parsed.len())?;
        Ok(parsed)
    }

    fn check_batch_size(&self, count: usize) -> Result<(), ImportError> {
        if count == 0 {
            return Err(ImportError::EmptyBatch);
        }
        if count > self.config.max_rows {
            return Err(ImportError::TooManyRows {
                count,
                max: self.config.max_rows,
            });
        }
        Ok(())
    }

    // -- Snapshot --

    async fn load_snapshot(&self) -> Result<Snapshot, ImportError> {
        let store = self.store.as_ref();
        let (categories, locations, vendors, assets) = tokio::try_join!(
            store.list_references(ReferenceKind::Category),
            store.list_references(ReferenceKind::Location),
            store.list_references(ReferenceKind::Vendor),
            store.list_assets(),
        )?;
        Ok(Snapshot::new(categories, locations, vendors, &assets))
    }

    // -- Analyze --

    /// Predict the fate of every row without writing anything.
    ///
    /// Rows are planned against the snapshot only, so two rows sharing a
    /// new serial number both come out as Create here even though Commit
    /// will turn the second into an Update.
    pub async fn analyze(
        &self,
        rows: Vec<ParsedRow>,
        options: ImportOptions,
    ) -> Result<AnalysisReport, ImportError> {
        self.check_batch_size(rows.len())?;
        let snapshot = self.load_snapshot().await?;
        tracing::info!(
            rows = rows.len(),
            auto_create = options.auto_create_entities,
            "Import analysis started",
        );

        let mut ignored_columns: Vec<String> = Vec::new();
        let mut decisions = Vec::with_capacity(rows.len());
        for (row_index, parsed) in rows.into_iter().enumerate() {
            for column in parsed.ignored_columns {
                if !ignored_columns.contains(&column) {
                    ignored_columns.push(column);
                }
            }
            decisions.push(self.analyze_row(row_index, &parsed.row, &snapshot, options));
        }

        let counts = PreviewCounts::tally(&decisions);
        tracing::info!(
            total = counts.total,
            create = counts.create,
            update = counts.update,
            skip = counts.skip,
            "Import analysis finished",
        );

        Ok(AnalysisReport {
            decisions,
            counts,
            ignored_columns,
            options,
        })
    }

    fn analyze_row(
        &self,
        row_index: usize,
        row: &RawRow,
        snapshot: &Snapshot,
        options: ImportOptions,
    ) -> RowDecision {
        let validation = validate_row(row);
        let mut references = ReferenceOutcomes::default();
        for kind in ReferenceKind::ALL {
            references.set(
                kind,
                resolve_preview(
                    kind,
                    row.reference(kind),
                    snapshot,
                    options.auto_create_entities,
                    &self.config,
                ),
            );
        }
        plan(row_index, row, validation, references, snapshot.assets())
    }

    // -- Commit --

    /// Persist the analysed rows.
    ///
    /// Rows that Analyze marked Skip are counted and not touched. Every
    /// other row is re-resolved and re-planned against the commit
    /// snapshot; a row that now fails (a reference deleted since Analyze,
    /// a rejected write) is skipped and the batch moves on. `cancel` is
    /// checked before each row; rows committed before it fired stay
    /// committed.
    ///
    /// Commits on the same engine run one at a time; a later commit loads
    /// its snapshot only after the earlier one has finished writing.
    pub async fn commit(
        &self,
        report: &AnalysisReport,
        options: ImportOptions,
        cancel: &CancellationToken,
    ) -> Result<BatchSummary, ImportError> {
        let _guard = self.commit_lock.lock().await;
        let mut snapshot = self.load_snapshot().await?;
        let total = report.decisions.len();
        tracing::info!(
            rows = total,
            auto_create = options.auto_create_entities,
            "Import commit started",
        );

        let mut summary = BatchSummary::default();
        for (position, decision) in report.decisions.iter().enumerate() {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                summary.unprocessed = total - position;
                tracing::info!(
                    processed = position,
                    unprocessed = summary.unprocessed,
                    "Import commit cancelled",
                );
                break;
            }
            if decision.is_skip() {
                summary.skipped += 1;
                continue;
            }
            self.commit_row(decision, &mut snapshot, options, &mut summary)
                .await;
        }

        tracing::info!(
            created = summary.created,
            updated = summary.updated,
            skipped = summary.skipped,
            cancelled = summary.cancelled,
            "Import commit finished",
        );
        Ok(summary)
    }

    async fn commit_row(
        &self,
        analysed: &RowDecision,
        snapshot: &mut Snapshot,
        options: ImportOptions,
        summary: &mut BatchSummary,
    ) {
        let row_index = analysed.row_index;
        let max_reported = self.config.max_reported_failures;

        let references = resolve_row_commit(
            &analysed.row,
            snapshot,
            self.store.as_ref(),
            options.auto_create_entities,
            &self.config,
        )
        .await;
        for (kind, outcome) in references.iter() {
            if let ResolutionOutcome::Created { id, name } = outcome {
                summary.created_references.push(CreatedReference {
                    kind,
                    id: *id,
                    name: name.clone(),
                });
            }
        }

        let decision = plan(
            row_index,
            &analysed.row,
            validate_row(&analysed.row),
            references,
            snapshot.assets(),
        );
        let fields = decision.candidate.to_fields(
            decision.category_id,
            decision.location_id,
            decision.vendor_id,
        );

        match (decision.outcome, decision.existing_asset_id) {
            (RowOutcome::Update, Some(asset_id)) => {
                match self.store.update_asset(asset_id, &fields).await {
                    Ok(_) => summary.updated += 1,
                    Err(e) => {
                        tracing::warn!(row_index, asset_id, error = %e, "Asset update failed");
                        summary.record_failure(
                            row_index,
                            format!("Failed to update asset '{}': {e}", fields.name),
                            max_reported,
                        );
                    }
                }
            }
            (RowOutcome::Create, _) => match self.store.create_asset(&fields).await {
                Ok(record) => {
                    snapshot.record_asset(record.serial_number(), record.id, record.name());
                    summary.created += 1;
                    summary.created_asset_ids.push(record.id);
                }
                Err(e) => {
                    tracing::warn!(
                        row_index,
                        name = %fields.name,
                        error = %e,
                        "Asset creation failed"
                    );
                    summary.record_failure(
                        row_index,
                        format!("Failed to create asset '{}': {e}", fields.name),
                        max_reported,
                    );
                }
            },
            _ => {
                tracing::warn!(row_index, reason = %decision.reason, "Row skipped at commit");
                summary.record_failure(row_index, decision.reason, max_reported);
            }
        }
    }

    // -- Duplicate scan --

    /// Read-only duplicate report over everything currently stored.
    pub async fn scan_duplicates(&self) -> Result<DuplicateReport, ImportError> {
        let store = self.store.as_ref();
        let (categories, locations, vendors, assets) = tokio::try_join!(
            store.list_references(ReferenceKind::Category),
            store.list_references(ReferenceKind::Location),
            store.list_references(ReferenceKind::Vendor),
            store.list_assets(),
        )?;
        let report = scan_duplicates(&assets, &categories, &locations, &vendors);
        tracing::debug!(
            scanned = report.scanned,
            issues = report.issues.len(),
            "Duplicate scan finished",
        );
        Ok(report)
    }
}
