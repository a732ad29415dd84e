use inventra_core::types::DbId;

/// Failure reported by an [`EntityStore`](crate::store::EntityStore).
///
/// Store errors never abort a commit on their own: the engine records
/// them against the row that triggered the call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    /// The store refused the write (constraint, validation, injected failure).
    #[error("{0}")]
    Rejected(String),
}

/// Run-level failures. Everything row-level is captured in the decisions
/// and the batch summary instead.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// Unreadable document. The message is the extractor's details verbatim.
    #[error("{0}")]
    Ingestion(String),

    #[error("Failed to load inventory snapshot: {0}")]
    Snapshot(#[from] StoreError),

    #[error("The import contains no rows")]
    EmptyBatch,

    #[error("The import contains {count} rows; the maximum is {max}")]
    TooManyRows { count: usize, max: usize },
}
