//! Tunables for the bulk import reconciliation engine.
//!
//! The fuzzy threshold and candidate cutoff are operational defaults, not
//! business rules, so every value here can be overridden from the
//! environment.

use serde::Serialize;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.8;
pub const MIN_FUZZY_THRESHOLD: f64 = 0.5;
pub const MAX_FUZZY_THRESHOLD: f64 = 1.0;

/// How many fuzzy candidates are kept (best first) per vendor lookup.
pub const DEFAULT_MAX_FUZZY_CANDIDATES: usize = 3;

/// Upper bound on rows accepted in one import run.
pub const DEFAULT_MAX_ROWS: usize = 5000;

/// How many per-row commit failures are reported back verbatim.
pub const DEFAULT_MAX_REPORTED_FAILURES: usize = 20;

// ---------------------------------------------------------------------------
// ImportConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportConfig {
    /// Minimum similarity (inclusive) for a vendor fuzzy match.
    pub fuzzy_threshold: f64,
    /// Number of ranked fuzzy candidates retained per lookup.
    pub max_fuzzy_candidates: usize,
    /// Maximum number of rows per run.
    pub max_rows: usize,
    /// Maximum number of row failures listed in a commit summary.
    pub max_reported_failures: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            max_fuzzy_candidates: DEFAULT_MAX_FUZZY_CANDIDATES,
            max_rows: DEFAULT_MAX_ROWS,
            max_reported_failures: DEFAULT_MAX_REPORTED_FAILURES,
        }
    }
}

impl ImportConfig {
    /// Load from environment variables, falling back to the defaults.
    ///
    /// | Env Var                        | Default |
    /// |--------------------------------|---------|
    /// | `IMPORT_FUZZY_THRESHOLD`       | `0.8`   |
    /// | `IMPORT_MAX_FUZZY_CANDIDATES`  | `3`     |
    /// | `IMPORT_MAX_ROWS`              | `5000`  |
    /// | `IMPORT_MAX_REPORTED_FAILURES` | `20`    |
    pub fn from_env() -> Result<Self, CoreError> {
        let defaults = Self::default();
        let config = Self {
            fuzzy_threshold: env_or("IMPORT_FUZZY_THRESHOLD", defaults.fuzzy_threshold)?,
            max_fuzzy_candidates: env_or(
                "IMPORT_MAX_FUZZY_CANDIDATES",
                defaults.max_fuzzy_candidates,
            )?,
            max_rows: env_or("IMPORT_MAX_ROWS", defaults.max_rows)?,
            max_reported_failures: env_or(
                "IMPORT_MAX_REPORTED_FAILURES",
                defaults.max_reported_failures,
            )?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the engine misbehave.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !(MIN_FUZZY_THRESHOLD..=MAX_FUZZY_THRESHOLD).contains(&self.fuzzy_threshold) {
            return Err(CoreError::Validation(format!(
                "Fuzzy threshold must be between {MIN_FUZZY_THRESHOLD} and \
                 {MAX_FUZZY_THRESHOLD}, got {}",
                self.fuzzy_threshold
            )));
        }
        if self.max_fuzzy_candidates == 0 {
            return Err(CoreError::Validation(
                "max_fuzzy_candidates must be at least 1".to_string(),
            ));
        }
        if self.max_rows == 0 {
            return Err(CoreError::Validation(
                "max_rows must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T, CoreError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| CoreError::Validation(format!("{key} has an invalid value: '{raw}'"))),
        Err(_) => Ok(default),
    }
}
