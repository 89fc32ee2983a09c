//! Hot reload error handling
//!
//! Type alias and context helpers for hot reload operations.

use std::path::Path;

use crate::error::{ReloadError, ReloadResult};

/// Type alias for hot reload results
pub type HotReloadResult<T> = ReloadResult<T>;

/// Helper trait for attaching a location to IO failures
pub trait HotReloadErrorContext<T> {
    fn hot_reload_context(self, context: &str) -> HotReloadResult<T>
    where
        Self: Sized;
}

impl<T> HotReloadErrorContext<T> for Result<T, std::io::Error> {
    fn hot_reload_context(self, context: &str) -> HotReloadResult<T> {
        self.map_err(|source| ReloadError::Io {
            context: format!("hot_reload::{}", context),
            source,
        })
    }
}

/// Create an unknown module error
pub fn unknown_module(path: &Path) -> ReloadError {
    ReloadError::UnknownModule {
        path: path.to_path_buf(),
    }
}
