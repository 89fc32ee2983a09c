use crate::scheduler::{SystemHandle, SystemInfo};
use super::registry::{remove_handle, swap_handle};
use super::{ModuleId, ReadyMeta};

/// Summary of one module evaluation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReloadOutcome {
    pub module: Option<ModuleId>,
    /// Systems registered under a name the module did not have before
    pub added: Vec<String>,
    /// Systems swapped in place for their previous registration
    pub replaced: Vec<String>,
    /// Systems dropped because the module no longer registers them
    pub removed: Vec<String>,
    /// Contained evaluation failure, if the module body errored or panicked
    pub failure: Option<String>,
}

impl ReloadOutcome {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Summary of one module unload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnloadOutcome {
    pub module: Option<ModuleId>,
    pub removed: Vec<String>,
    /// True when the unload was part of a reload and nothing was touched
    pub skipped: bool,
}

/// State scoped to a single module evaluation
#[derive(Debug)]
pub(crate) struct ReloadContext {
    pub module: ModuleId,
    pub original: ModuleId,
    pub is_reloading: bool,
    /// Prior registrations not yet matched by name
    pending: Vec<SystemInfo>,
    /// Registrations made by this evaluation, in order
    discovered: Vec<SystemInfo>,
    added: Vec<String>,
    replaced: Vec<String>,
}

impl ReloadContext {
    pub fn open(module: ModuleId, meta: ReadyMeta, snapshot: Vec<SystemInfo>) -> Self {
        Self {
            module,
            original: meta.original,
            is_reloading: meta.is_reloading,
            pending: snapshot,
            discovered: Vec::new(),
            added: Vec::new(),
            replaced: Vec::new(),
        }
    }

    /// Consume the prior registration named `name`, if this is a reload and
    /// one is still pending
    pub fn claim_prior(&mut self, name: &str) -> Option<SystemInfo> {
        if !self.is_reloading {
            return None;
        }
        let index = self.pending.iter().position(|s| s.name == name)?;
        Some(self.pending.remove(index))
    }

    pub fn record_new(&mut self, info: SystemInfo) {
        self.added.push(info.name.clone());
        self.discovered.push(info);
    }

    pub fn record_replacement(&mut self, info: SystemInfo) {
        self.replaced.push(info.name.clone());
        self.discovered.push(info);
    }

    /// Drop `handle` from both the pending snapshot and the accumulator
    pub fn forget(&mut self, handle: &SystemHandle) -> bool {
        let pending = remove_handle(&mut self.pending, handle).is_some();
        let discovered = remove_handle(&mut self.discovered, handle).is_some();
        pending || discovered
    }

    pub fn swap(&mut self, old: &SystemHandle, new: &SystemHandle) -> bool {
        swap_handle(&mut self.pending, old, new) || swap_handle(&mut self.discovered, old, new)
    }

    /// Close the context: returns the set to commit, the unconsumed prior
    /// registrations, and the outcome so far
    pub fn finish(self, failure: Option<String>) -> (Vec<SystemInfo>, Vec<SystemInfo>, ReloadOutcome) {
        let outcome = ReloadOutcome {
            module: Some(self.module),
            added: self.added,
            replaced: self.replaced,
            removed: self.pending.iter().map(|s| s.name.clone()).collect(),
            failure,
        };
        (self.discovered, self.pending, outcome)
    }
}
