/// Hot-Reload System
///
/// Keeps the scheduler's systems in sync with modules as they are loaded,
/// edited and removed while the process runs.
///
/// Key pieces:
/// - Module → system registry with single ownership per system handle
/// - Name-based reconciliation that replaces changed systems in place
/// - Identity migration when the loader re-creates a module object
/// - Directory loader and manifest evaluator for file-backed modules

pub mod config;
pub mod context;
pub mod coordinator;
pub mod error;
pub mod filter;
pub mod manifest;
pub mod mod_loader;
pub mod module;
pub mod registry;

pub use config::{ConfigFormat, HotReloadConfig};
pub use context::{ReloadOutcome, UnloadOutcome};
pub use coordinator::HotReloadCoordinator;
pub use error::{HotReloadErrorContext, HotReloadResult};
pub use filter::FileFilter;
pub use manifest::{ManifestEvaluator, ManifestLine, RunLog};
pub use mod_loader::{DirectoryLoader, ModuleEvaluator};
pub use module::{Module, ModuleBody, ModuleHooks, ModuleId, ModuleLoader, ReadyMeta, UnloadMeta};
pub use registry::ModuleRegistry;
