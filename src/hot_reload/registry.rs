//! Module → system bookkeeping
//!
//! [`ModuleRegistry`] records which systems each module registered during its
//! most recent evaluation. A handle is attributed to at most one module; every
//! insertion path enforces that by dropping the handle from any other owner
//! first.

use rustc_hash::FxHashMap;

use crate::scheduler::{SystemHandle, SystemInfo};
use super::ModuleId;

/// Mapping from module identity to the systems it currently owns
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: FxHashMap<ModuleId, Vec<SystemInfo>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the system set of `module` wholesale.
    ///
    /// Returns the previous set, if any. An empty set is still recorded so a
    /// later reload finds a snapshot.
    pub fn commit(&mut self, module: ModuleId, systems: Vec<SystemInfo>) -> Option<Vec<SystemInfo>> {
        for system in &systems {
            self.release_elsewhere(module, &system.handle);
        }
        self.modules.insert(module, systems)
    }

    /// Detach and return the set of `module`
    pub fn take(&mut self, module: ModuleId) -> Option<Vec<SystemInfo>> {
        self.modules.remove(&module)
    }

    pub fn contains(&self, module: ModuleId) -> bool {
        self.modules.contains_key(&module)
    }

    pub fn systems_of(&self, module: ModuleId) -> Option<&[SystemInfo]> {
        self.modules.get(&module).map(Vec::as_slice)
    }

    /// Module currently owning `handle`
    pub fn owner_of(&self, handle: &SystemHandle) -> Option<ModuleId> {
        self.modules
            .iter()
            .find(|(_, systems)| systems.iter().any(|s| &s.handle == handle))
            .map(|(module, _)| *module)
    }

    /// Drop `handle` from whichever module owns it. Absent handles are a no-op.
    pub fn forget_handle(&mut self, handle: &SystemHandle) -> Option<(ModuleId, SystemInfo)> {
        self.modules.iter_mut().find_map(|(module, systems)| {
            remove_handle(systems, handle).map(|info| (*module, info))
        })
    }

    /// Swap `old` for `new` inside the owning module, keeping name and position
    pub fn replace_handle(&mut self, old: &SystemHandle, new: &SystemHandle) -> Option<ModuleId> {
        let owner = self.owner_of(old)?;
        self.release_elsewhere(owner, new);
        if let Some(systems) = self.modules.get_mut(&owner) {
            swap_handle(systems, old, new);
        }
        Some(owner)
    }

    /// Tracked modules in ascending id order
    pub fn modules(&self) -> Vec<ModuleId> {
        let mut modules: Vec<_> = self.modules.keys().copied().collect();
        modules.sort_unstable();
        modules
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Total number of tracked systems
    pub fn system_count(&self) -> usize {
        self.modules.values().map(Vec::len).sum()
    }

    fn release_elsewhere(&mut self, keeper: ModuleId, handle: &SystemHandle) {
        for (module, systems) in self.modules.iter_mut() {
            if *module != keeper {
                remove_handle(systems, handle);
            }
        }
    }
}

/// Remove `handle` from `systems`, returning its entry
pub(crate) fn remove_handle(systems: &mut Vec<SystemInfo>, handle: &SystemHandle) -> Option<SystemInfo> {
    let index = systems.iter().position(|s| &s.handle == handle)?;
    Some(systems.remove(index))
}

/// Point the entry holding `old` at `new`. Returns false if `old` is absent.
pub(crate) fn swap_handle(systems: &mut [SystemInfo], old: &SystemHandle, new: &SystemHandle) -> bool {
    match systems.iter_mut().find(|s| &s.handle == old) {
        Some(entry) => {
            entry.handle = new.clone();
            true
        }
        None => false,
    }
}
