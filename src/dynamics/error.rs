// ==============================================================================
// error.rs — CONFIGURATION ERRORS + RUNTIME RECOVERY TAGS
// ------------------------------------------------------------------------------
// Only configuration loading can fail. Numerical trouble during a tick is never
// an error: the stability guard recovers locally and reports what it did via
// `Recovery` on the tick output.
// ==============================================================================

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DynamicsError {
    /// Config file could not be read.
    #[error("failed to read vehicle config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config JSON did not match the expected shape.
    #[error("vehicle config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A constant is out of its valid range.
    #[error("invalid vehicle config: {0}")]
    Invalid(String),
}

pub type DynamicsResult<T> = Result<T, DynamicsError>;

/// What the stability guard did on a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Recovery {
    #[default]
    None,
    /// Non-finite engine state: velocities zeroed, smoothing reset, tick skipped.
    Reset,
    /// Internal speed ran away from a wedged body and was pulled back.
    StuckBlend,
}
