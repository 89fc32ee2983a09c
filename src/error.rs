//! Crate-wide error type
//!
//! Subsystems alias [`ReloadResult`] and add their own context helpers on top
//! (see `hot_reload::error`).

use std::path::PathBuf;

use thiserror::Error;

use crate::hot_reload::ModuleId;

/// Errors raised by the scheduler, the coordinator and the bundled loader
#[derive(Debug, Error)]
pub enum ReloadError {
    #[error("system #{handle} is not registered with the scheduler")]
    SystemNotRegistered { handle: u64 },

    #[error("system #{handle} is already registered with the scheduler")]
    SystemAlreadyRegistered { handle: u64 },

    #[error("reload of {original} requested but no snapshot is tracked for it")]
    MissingSnapshot { original: ModuleId },

    #[error("module {module} is already tracked; a fresh load must be flagged as a reload")]
    AlreadyTracked { module: ModuleId },

    #[error("cannot open a reload context for {requested}: {active} is still being evaluated")]
    ContextAlreadyOpen { active: ModuleId, requested: ModuleId },

    #[error("no reload context is open")]
    NoActiveContext,

    #[error("no module is loaded from {path}")]
    UnknownModule { path: PathBuf },

    #[error("unsupported config format: {path}")]
    UnknownConfigFormat { path: PathBuf },

    #[error("failed to parse TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to parse JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error at {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result alias used across the crate
pub type ReloadResult<T> = Result<T, ReloadError>;
