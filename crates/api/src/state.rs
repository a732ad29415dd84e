use std::sync::Arc;

use inventra_core::cache::LoadCache;
use inventra_core::duplicate_scan::DuplicateReport;
use inventra_import::{EntityStore, ImportEngine};

use crate::config::ServerConfig;
use crate::sessions::SessionRegistry;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// The store the engine runs against; pinged by the readiness check.
    pub store: Arc<dyn EntityStore>,
    /// Import engine over `store`.
    pub engine: Arc<ImportEngine>,
    /// Analyzed imports awaiting commit, and their outcomes.
    pub sessions: Arc<SessionRegistry>,
    /// Last duplicate scan; invalidated whenever a commit finishes.
    pub duplicates: Arc<LoadCache<DuplicateReport>>,
}

impl AppState {
    pub fn new(store: Arc<dyn EntityStore>, config: &ServerConfig) -> Self {
        let engine = ImportEngine::new(Arc::clone(&store), config.import.clone());
        let sessions = SessionRegistry::new(config.sessions.clone());
        Self {
            store,
            engine: Arc::new(engine),
            sessions: Arc::new(sessions),
            duplicates: Arc::new(LoadCache::new()),
        }
    }
}
