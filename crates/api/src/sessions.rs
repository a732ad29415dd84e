//! In-memory registry of import sessions.
//!
//! A session is created by an analyze request and holds the
//! [`AnalysisReport`] until it is committed or cancelled. Status moves
//! `preview -> committing -> committed | partial | cancelled | failed`,
//! or `preview -> cancelled` directly.
//!
//! Sessions live in memory only. Idle previews and finished sessions are
//! evicted after their TTL, and the oldest idle session makes room when
//! the registry is full. A session that is committing is never evicted.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use inventra_core::error::CoreError;
use inventra_core::planner::PreviewCounts;
use inventra_core::types::Timestamp;
use inventra_import::{AnalysisReport, BatchSummary, ImportOptions};
use serde::Serialize;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::error::{AppError, AppResult};

// ── Status ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Preview,
    Committing,
    Committed,
    /// Commit finished but some rows were skipped.
    Partial,
    Cancelled,
    Failed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Preview => "preview",
            Self::Committing => "committing",
            Self::Committed => "committed",
            Self::Partial => "partial",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }

    /// Status a finished commit lands in.
    pub fn from_summary(summary: &BatchSummary) -> Self {
        if summary.cancelled {
            Self::Cancelled
        } else if summary.is_complete() {
            Self::Committed
        } else {
            Self::Partial
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Session ──────────────────────────────────────────────────────────

struct ImportSession {
    status: SessionStatus,
    options: ImportOptions,
    report: Arc<AnalysisReport>,
    summary: Option<BatchSummary>,
    error: Option<String>,
    cancel: CancellationToken,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl ImportSession {
    fn view(&self, id: Uuid) -> SessionView {
        SessionView {
            id,
            status: self.status,
            options: self.options,
            counts: self.report.counts(),
            ignored_columns: self.report.ignored_columns().to_vec(),
            summary: self.summary.clone(),
            error: self.error.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    fn set_status(&mut self, status: SessionStatus) {
        self.status = status;
        self.updated_at = chrono::Utc::now();
    }

    fn idle_for(&self, now: Timestamp) -> Duration {
        (now - self.updated_at).to_std().unwrap_or_default()
    }

    fn is_expired(&self, now: Timestamp, config: &SessionConfig) -> bool {
        let ttl = match self.status {
            SessionStatus::Committing => return false,
            SessionStatus::Preview => config.preview_ttl,
            _ => config.finished_ttl,
        };
        self.idle_for(now) > ttl
    }
}

/// Serializable view of a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub status: SessionStatus,
    pub options: ImportOptions,
    pub counts: PreviewCounts,
    pub ignored_columns: Vec<String>,
    pub summary: Option<BatchSummary>,
    pub error: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// What a commit needs, handed out when a session enters `committing`.
#[derive(Debug)]
pub struct CommitTicket {
    pub report: Arc<AnalysisReport>,
    pub options: ImportOptions,
    pub cancel: CancellationToken,
}

// ── Registry ─────────────────────────────────────────────────────────

pub struct SessionRegistry {
    config: SessionConfig,
    sessions: RwLock<HashMap<Uuid, ImportSession>>,
}

impl SessionRegistry {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Register a fresh analysis in `preview` status.
    ///
    /// Expired sessions are dropped first. If the registry is still full,
    /// the least recently updated session that is not committing is
    /// evicted; when every slot is committing the analysis is refused.
    pub async fn create(&self, report: AnalysisReport) -> AppResult<SessionView> {
        self.insert(report, chrono::Utc::now()).await
    }

    async fn insert(&self, report: AnalysisReport, now: Timestamp) -> AppResult<SessionView> {
        let mut sessions = self.sessions.write().await;
        prune_expired(&mut sessions, now, &self.config);

        while sessions.len() >= self.config.max_sessions {
            let oldest = sessions
                .iter()
                .filter(|(_, s)| s.status != SessionStatus::Committing)
                .min_by_key(|(_, s)| s.updated_at)
                .map(|(id, _)| *id);
            let Some(oldest) = oldest else {
                return Err(AppError::SessionLimit(self.config.max_sessions));
            };
            sessions.remove(&oldest);
            tracing::debug!(session_id = %oldest, "Evicted import session to make room");
        }

        let id = Uuid::new_v4();
        let session = ImportSession {
            status: SessionStatus::Preview,
            options: report.options(),
            report: Arc::new(report),
            summary: None,
            error: None,
            cancel: CancellationToken::new(),
            created_at: now,
            updated_at: now,
        };
        let view = session.view(id);
        sessions.insert(id, session);
        Ok(view)
    }

    /// Drop every session whose TTL has passed at `now`. Returns how many
    /// were removed.
    pub async fn prune(&self, now: Timestamp) -> usize {
        let mut sessions = self.sessions.write().await;
        prune_expired(&mut sessions, now, &self.config)
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn get(&self, id: Uuid) -> AppResult<SessionView> {
        let sessions = self.sessions.read().await;
        sessions
            .get(&id)
            .map(|s| s.view(id))
            .ok_or(AppError::SessionNotFound(id))
    }

    /// The stored analysis, for callers that need the row decisions.
    pub async fn report(&self, id: Uuid) -> AppResult<Arc<AnalysisReport>> {
        let sessions = self.sessions.read().await;
        sessions
            .get(&id)
            .map(|s| Arc::clone(&s.report))
            .ok_or(AppError::SessionNotFound(id))
    }

    /// Move a `preview` session to `committing`.
    ///
    /// Any other status is a conflict, so a session commits at most once.
    pub async fn begin_commit(&self, id: Uuid) -> AppResult<CommitTicket> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or(AppError::SessionNotFound(id))?;
        if session.status != SessionStatus::Preview {
            return Err(AppError::Core(CoreError::Conflict(format!(
                "Import session must be in 'preview' status to commit (current: '{}')",
                session.status
            ))));
        }
        session.set_status(SessionStatus::Committing);
        Ok(CommitTicket {
            report: Arc::clone(&session.report),
            options: session.options,
            cancel: session.cancel.clone(),
        })
    }

    /// Record the outcome of a commit.
    pub async fn finish_commit(
        &self,
        id: Uuid,
        outcome: Result<BatchSummary, String>,
    ) -> AppResult<SessionView> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or(AppError::SessionNotFound(id))?;
        match outcome {
            Ok(summary) => {
                session.set_status(SessionStatus::from_summary(&summary));
                session.summary = Some(summary);
            }
            Err(error) => {
                session.set_status(SessionStatus::Failed);
                session.error = Some(error);
            }
        }
        Ok(session.view(id))
    }

    /// Cancel a session.
    ///
    /// A `preview` session is cancelled immediately. A `committing`
    /// session has its token triggered and reaches `cancelled` once the
    /// commit loop stops at the next row boundary. Finished sessions
    /// cannot be cancelled.
    pub async fn cancel(&self, id: Uuid) -> AppResult<SessionView> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or(AppError::SessionNotFound(id))?;
        match session.status {
            SessionStatus::Preview => session.set_status(SessionStatus::Cancelled),
            SessionStatus::Committing => {
                tracing::info!(session_id = %id, "Cancellation requested for running commit");
                session.cancel.cancel();
            }
            other => {
                return Err(AppError::Core(CoreError::Conflict(format!(
                    "Import session is already '{other}'"
                ))));
            }
        }
        Ok(session.view(id))
    }

    /// Trigger cancellation of every running commit. Returns how many
    /// were signalled.
    pub async fn cancel_running(&self) -> usize {
        let sessions = self.sessions.read().await;
        let mut signalled = 0;
        for session in sessions.values() {
            if session.status == SessionStatus::Committing {
                session.cancel.cancel();
                signalled += 1;
            }
        }
        signalled
    }

    /// Number of sessions still in `committing`.
    pub async fn running_count(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions
            .values()
            .filter(|s| s.status == SessionStatus::Committing)
            .count()
    }
}

fn prune_expired(
    sessions: &mut HashMap<Uuid, ImportSession>,
    now: Timestamp,
    config: &SessionConfig,
) -> usize {
    let before = sessions.len();
    sessions.retain(|_, s| !s.is_expired(now, config));
    before - sessions.len()
}
