use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use walkdir::WalkDir;

use crate::scheduler::Scheduler;
use super::error::unknown_module;
use super::{
    FileFilter, HotReloadConfig, HotReloadErrorContext, HotReloadResult, Module, ModuleHooks,
    ModuleId, ModuleLoader, ReadyMeta, ReloadOutcome, UnloadMeta, UnloadOutcome,
};

/// Turns a module file into system registrations
pub trait ModuleEvaluator: Send + Sync {
    fn evaluate(&self, path: &Path, scheduler: &Scheduler) -> anyhow::Result<()>;
}

/// A module file known to the loader
struct TrackedModule {
    id: ModuleId,
    hooks: Arc<dyn ModuleHooks>,
}

/// Module loader backed by directories of module files.
///
/// Files under each scanned root whose extension passes the filter become
/// modules. The host reports edits with [`reload`](Self::reload),
/// [`replace_module`](Self::replace_module), [`load`](Self::load) and
/// [`remove`](Self::remove); the loader does not watch the filesystem itself.
///
/// Paths are keyed through their canonical parent directory, so
/// `root/./a.systems` and `root/a.systems` name the same module. Symlinked
/// directories are not descended into.
pub struct DirectoryLoader {
    /// Module extensions
    filter: FileFilter,

    /// Descend into subdirectories
    recursive: bool,

    /// Evaluates module files
    evaluator: Arc<dyn ModuleEvaluator>,

    /// Scanned roots and the hooks registered for them
    roots: Vec<(PathBuf, Arc<dyn ModuleHooks>)>,

    /// Loaded modules by file path
    modules: BTreeMap<PathBuf, TrackedModule>,

    /// Next module identity
    next_id: u64,
}

impl DirectoryLoader {
    /// Create new loader
    pub fn new(config: &HotReloadConfig, evaluator: Arc<dyn ModuleEvaluator>) -> Self {
        Self {
            filter: FileFilter::new(&config.extensions),
            recursive: config.recursive,
            evaluator,
            roots: Vec::new(),
            modules: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Identity currently assigned to `path`
    pub fn module_id(&self, path: impl AsRef<Path>) -> Option<ModuleId> {
        self.modules.get(&normalize(path.as_ref())).map(|m| m.id)
    }

    /// Loaded module files in path order
    pub fn module_paths(&self) -> Vec<PathBuf> {
        self.modules.keys().cloned().collect()
    }

    /// Load a module file created after its root was scanned
    pub fn load(&mut self, path: impl AsRef<Path>) -> HotReloadResult<ReloadOutcome> {
        let path = normalize(path.as_ref());
        let path = path.as_path();
        if self.modules.contains_key(path) {
            return self.reload(path);
        }

        let hooks = self
            .roots
            .iter()
            .find(|(root, _)| path.starts_with(root))
            .map(|(_, hooks)| hooks.clone())
            .ok_or_else(|| unknown_module(path))?;

        self.load_with(path, hooks)
    }

    /// Re-evaluate a changed module under its current identity
    pub fn reload(&mut self, path: impl AsRef<Path>) -> HotReloadResult<ReloadOutcome> {
        let path = normalize(path.as_ref());
        let path = path.as_path();
        let tracked = self.modules.get(path).ok_or_else(|| unknown_module(path))?;

        let module = self.module(tracked.id, path);
        let outcome = tracked.hooks.on_ready(&module, ReadyMeta::reload(tracked.id))?;
        report(path, &outcome);
        Ok(outcome)
    }

    /// Re-evaluate a changed module under a fresh identity, retiring the old one
    pub fn replace_module(&mut self, path: impl AsRef<Path>) -> HotReloadResult<ReloadOutcome> {
        let path = normalize(path.as_ref());
        let path = path.as_path();
        let (original, hooks) = {
            let tracked = self.modules.get(path).ok_or_else(|| unknown_module(path))?;
            (tracked.id, tracked.hooks.clone())
        };

        let id = self.allocate_id();
        hooks.on_unload(original, UnloadMeta { is_reloading: true })?;

        let module = self.module(id, path);
        let outcome = hooks.on_ready(&module, ReadyMeta::reload(original))?;
        self.modules.insert(path.to_path_buf(), TrackedModule { id, hooks });

        log::debug!("[DirectoryLoader] {} migrated {} -> {}", path.display(), original, id);
        report(path, &outcome);
        Ok(outcome)
    }

    /// Retire a deleted module
    pub fn remove(&mut self, path: impl AsRef<Path>) -> HotReloadResult<UnloadOutcome> {
        let path = normalize(path.as_ref());
        let path = path.as_path();
        let tracked = self.modules.remove(path).ok_or_else(|| unknown_module(path))?;

        log::info!("[DirectoryLoader] Unloading {}", path.display());
        tracked.hooks.on_unload(tracked.id, UnloadMeta { is_reloading: false })
    }

    fn load_with(&mut self, path: &Path, hooks: Arc<dyn ModuleHooks>) -> HotReloadResult<ReloadOutcome> {
        let id = self.allocate_id();
        let module = self.module(id, path);
        let outcome = hooks.on_ready(&module, ReadyMeta::initial(id))?;
        self.modules.insert(path.to_path_buf(), TrackedModule { id, hooks });

        log::info!("[DirectoryLoader] Loaded {} as {}", path.display(), id);
        report(path, &outcome);
        Ok(outcome)
    }

    fn module(&self, id: ModuleId, path: &Path) -> Module {
        let evaluator = self.evaluator.clone();
        let file = path.to_path_buf();
        Module::from_fn(id, path, move |scheduler| evaluator.evaluate(&file, scheduler))
    }

    fn allocate_id(&mut self) -> ModuleId {
        let id = ModuleId::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// Scan directory for module files, in path order
    fn collect_modules(&self, root: &Path) -> HotReloadResult<Vec<PathBuf>> {
        let max_depth = if self.recursive { usize::MAX } else { 1 };
        let mut found = Vec::new();

        for entry in WalkDir::new(root).max_depth(max_depth).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from).hot_reload_context("scan")?;
            // Links to directories are not followed; links to files are modules
            if entry.file_type().is_dir() || !entry.path().is_file() {
                continue;
            }
            if self.filter.matches(entry.path()) {
                found.push(entry.into_path());
            }
        }

        found.sort();
        Ok(found)
    }
}

impl ModuleLoader for DirectoryLoader {
    fn scan(&mut self, root: &Path, hooks: Arc<dyn ModuleHooks>) -> HotReloadResult<Vec<ModuleId>> {
        let root = root.canonicalize().hot_reload_context("scan")?;
        let found = self.collect_modules(&root)?;

        self.roots.push((root, hooks.clone()));

        let mut loaded = Vec::with_capacity(found.len());
        for path in found {
            if self.modules.contains_key(&path) {
                continue;
            }
            self.load_with(&path, hooks.clone())?;
            if let Some(id) = self.module_id(&path) {
                loaded.push(id);
            }
        }

        Ok(loaded)
    }
}

/// Resolve the parent directory of `path`, leaving the file name as given.
/// Works for files that no longer exist.
fn normalize(path: &Path) -> PathBuf {
    let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
        return path.to_path_buf();
    };
    let parent = if parent.as_os_str().is_empty() { Path::new(".") } else { parent };
    parent
        .canonicalize()
        .map(|dir| dir.join(name))
        .unwrap_or_else(|_| path.to_path_buf())
}

fn report(path: &Path, outcome: &ReloadOutcome) {
    if let Some(failure) = &outcome.failure {
        log::warn!("[DirectoryLoader] Module {} failed to evaluate: {}", path.display(), failure);
    }
}
