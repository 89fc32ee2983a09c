use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::scheduler::Scheduler;
use super::{HotReloadResult, ReloadOutcome, UnloadOutcome};

/// Opaque, stable module identity.
///
/// A reload of the same module keeps its identity; a loader that re-creates the
/// module object hands out a fresh one and names the old one in
/// [`ReadyMeta::original`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModuleId(u64);

impl ModuleId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "module#{}", self.0)
    }
}

/// Executable module body. Registers systems on the scheduler it is given.
pub type ModuleBody = Arc<dyn Fn(&Scheduler) -> anyhow::Result<()> + Send + Sync>;

/// A loaded module as handed to [`ModuleHooks::on_ready`]
#[derive(Clone)]
pub struct Module {
    id: ModuleId,
    path: PathBuf,
    body: ModuleBody,
}

impl Module {
    pub fn new(id: ModuleId, path: impl Into<PathBuf>, body: ModuleBody) -> Self {
        Self {
            id,
            path: path.into(),
            body,
        }
    }

    /// Build a module from a closure, mostly for tests and embedding
    pub fn from_fn(
        id: ModuleId,
        path: impl Into<PathBuf>,
        body: impl Fn(&Scheduler) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        Self::new(id, path, Arc::new(body))
    }

    pub fn id(&self) -> ModuleId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run the module body
    pub fn evaluate(&self, scheduler: &Scheduler) -> anyhow::Result<()> {
        (self.body)(scheduler)
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("id", &self.id)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Metadata passed with a "module ready" notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadyMeta {
    /// Identity whose systems this evaluation supersedes. Equal to the module's
    /// own id unless the loader migrated the module to a new identity.
    pub original: ModuleId,

    /// True when the module was evaluated before
    pub is_reloading: bool,
}

impl ReadyMeta {
    /// First evaluation of `module`
    pub fn initial(module: ModuleId) -> Self {
        Self {
            original: module,
            is_reloading: false,
        }
    }

    /// Re-evaluation superseding `original`
    pub fn reload(original: ModuleId) -> Self {
        Self {
            original,
            is_reloading: true,
        }
    }
}

/// Metadata passed with a "module unloaded" notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnloadMeta {
    /// True when the module is retired as part of a reload sequence
    pub is_reloading: bool,
}

/// Capability the loader drives: one callback per module lifecycle event.
///
/// `on_ready` must evaluate the module before returning.
pub trait ModuleHooks: Send + Sync {
    fn on_ready(&self, module: &Module, meta: ReadyMeta) -> HotReloadResult<ReloadOutcome>;

    fn on_unload(&self, module: ModuleId, meta: UnloadMeta) -> HotReloadResult<UnloadOutcome>;
}

/// Discovers modules below a root and reports them through [`ModuleHooks`]
pub trait ModuleLoader {
    /// Enumerate modules under `root`, calling `hooks.on_ready` for each. The
    /// loader keeps `hooks` to report later reloads and unloads.
    fn scan(&mut self, root: &Path, hooks: Arc<dyn ModuleHooks>) -> HotReloadResult<Vec<ModuleId>>;
}
