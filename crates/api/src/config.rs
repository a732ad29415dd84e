//! Process configuration, read once at startup.
//!
//! Split by concern: the HTTP surface, the lifetime of import sessions,
//! and the engine tunables owned by `inventra_core`.

use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use inventra_core::config::ImportConfig;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub http: HttpConfig,
    pub sessions: SessionConfig,
    pub import: ImportConfig,
    /// How long in-flight commits get to finish after a shutdown signal.
    pub shutdown_timeout: Duration,
}

/// Listener and middleware settings.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins.
    pub cors_origins: Vec<String>,
    /// Applies to every route except commit, which runs to completion.
    pub request_timeout: Duration,
    /// Body limit of the upload route.
    pub max_upload_bytes: usize,
}

/// How long import sessions are kept in memory.
///
/// Committing sessions are never evicted. Everything else is dropped
/// once it has been idle for its TTL, or earlier (oldest first) when the
/// registry is full.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Idle time after which an uncommitted preview is dropped.
    pub preview_ttl: Duration,
    /// Time a finished session stays readable after its last change.
    pub finished_ttl: Duration,
    /// Upper bound on sessions held at once.
    pub max_sessions: usize,
    /// Interval of the background sweep.
    pub sweep_interval: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_origins: vec!["http://localhost:5173".to_string()],
            request_timeout: Duration::from_secs(30),
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            preview_ttl: Duration::from_secs(30 * 60),
            finished_ttl: Duration::from_secs(60 * 60),
            max_sessions: 500,
            sweep_interval: Duration::from_secs(60),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default                 |
    /// |-------------------------------|-------------------------|
    /// | `HOST`                        | `0.0.0.0`               |
    /// | `PORT`                        | `3000`                  |
    /// | `CORS_ORIGINS`                | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`        | `30`                    |
    /// | `MAX_UPLOAD_BYTES`            | `10485760`              |
    /// | `SESSION_PREVIEW_TTL_SECS`    | `1800`                  |
    /// | `SESSION_FINISHED_TTL_SECS`   | `3600`                  |
    /// | `MAX_SESSIONS`                | `500`                   |
    /// | `SESSION_SWEEP_INTERVAL_SECS` | `60`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS`       | `30`                    |
    ///
    /// Engine tunables come from [`ImportConfig::from_env`]. Panics on
    /// malformed values so misconfiguration fails at startup.
    pub fn from_env() -> Self {
        let http_defaults = HttpConfig::default();
        let http = HttpConfig {
            host: std::env::var("HOST").unwrap_or(http_defaults.host),
            port: env_parse("PORT", http_defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|raw| {
                    raw.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or(http_defaults.cors_origins),
            request_timeout: env_secs("REQUEST_TIMEOUT_SECS", http_defaults.request_timeout),
            max_upload_bytes: env_parse("MAX_UPLOAD_BYTES", http_defaults.max_upload_bytes),
        };

        let session_defaults = SessionConfig::default();
        let sessions = SessionConfig {
            preview_ttl: env_secs("SESSION_PREVIEW_TTL_SECS", session_defaults.preview_ttl),
            finished_ttl: env_secs("SESSION_FINISHED_TTL_SECS", session_defaults.finished_ttl),
            max_sessions: env_parse("MAX_SESSIONS", session_defaults.max_sessions),
            sweep_interval: env_secs(
                "SESSION_SWEEP_INTERVAL_SECS",
                session_defaults.sweep_interval,
            ),
        };
        assert!(sessions.max_sessions > 0, "MAX_SESSIONS must be at least 1");

        let import = ImportConfig::from_env().expect("Invalid IMPORT_* configuration");

        Self {
            http,
            sessions,
            import,
            shutdown_timeout: env_secs("SHUTDOWN_TIMEOUT_SECS", Duration::from_secs(30)),
        }
    }
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{key} has an invalid value '{raw}': {e}")),
        Err(_) => default,
    }
}

fn env_secs(key: &str, default: Duration) -> Duration {
    Duration::from_secs(env_parse(key, default.as_secs()))
}
