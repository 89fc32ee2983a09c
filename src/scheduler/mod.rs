/// System Scheduler
///
/// Ordered registry of named systems. Every mutation emits a lifecycle
/// notification to the hooks subscribed for that kind, synchronously and
/// after the registry lock has been released, so hooks may mutate the
/// scheduler again.
///
/// Execution order is registration order; `replace_system` keeps the slot of
/// the system it replaces.

pub mod events;
pub mod system;

pub use events::{HookKind, SchedulerEvent, SchedulerHook};
pub use system::{SystemFn, SystemHandle, SystemInfo};

use parking_lot::Mutex;

use crate::error::{ReloadError, ReloadResult};
use events::HookEntry;

/// Ordered system registry with lifecycle hooks
#[derive(Default)]
pub struct Scheduler {
    /// Registered systems in execution order
    systems: Mutex<Vec<SystemInfo>>,

    /// Subscribed hooks
    hooks: Mutex<Vec<HookEntry>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to one kind of lifecycle notification
    pub fn add_hook(
        &self,
        kind: HookKind,
        hook: impl Fn(&Scheduler, &SchedulerEvent) + Send + Sync + 'static,
    ) {
        self.hooks.lock().push(HookEntry {
            kind,
            hook: std::sync::Arc::new(hook),
        });
    }

    /// Append a system. Returns false if the handle is already registered.
    pub fn add_system(&self, name: impl Into<String>, handle: SystemHandle) -> bool {
        let info = SystemInfo::new(name, handle);
        {
            let mut systems = self.systems.lock();
            if systems.iter().any(|s| s.handle == info.handle) {
                log::debug!(
                    "[Scheduler] Ignoring duplicate registration of {} ({:?})",
                    info.name,
                    info.handle
                );
                return false;
            }
            systems.push(info.clone());
        }

        log::trace!("[Scheduler] Added {} ({:?})", info.name, info.handle);
        self.emit(SchedulerEvent::SystemAdd { info });
        true
    }

    /// Remove a system by handle. Unknown handles are a no-op.
    pub fn remove_system(&self, handle: &SystemHandle) -> Option<SystemInfo> {
        let removed = {
            let mut systems = self.systems.lock();
            let index = systems.iter().position(|s| &s.handle == handle)?;
            systems.remove(index)
        };

        log::trace!("[Scheduler] Removed {} ({:?})", removed.name, removed.handle);
        self.emit(SchedulerEvent::SystemRemove {
            info: removed.clone(),
        });
        Some(removed)
    }

    /// Swap `old` for `new` in the same slot. The system keeps its name.
    pub fn replace_system(&self, old: &SystemHandle, new: SystemHandle) -> ReloadResult<()> {
        let (old_info, new_info) = {
            let mut systems = self.systems.lock();
            if systems.iter().any(|s| s.handle == new) {
                return Err(ReloadError::SystemAlreadyRegistered { handle: new.id() });
            }
            let slot = systems
                .iter_mut()
                .find(|s| &s.handle == old)
                .ok_or(ReloadError::SystemNotRegistered { handle: old.id() })?;

            let old_info = slot.clone();
            slot.handle = new;
            (old_info, slot.clone())
        };

        log::trace!(
            "[Scheduler] Replaced {} ({:?} -> {:?})",
            new_info.name,
            old_info.handle,
            new_info.handle
        );
        self.emit(SchedulerEvent::SystemReplace {
            old: old_info,
            new: new_info,
        });
        Ok(())
    }

    /// Run every system once, in order
    pub fn run(&self, delta_time: f32) {
        // Snapshot so systems may touch the scheduler while running
        let systems = self.systems.lock().clone();
        for system in &systems {
            system.handle.call(delta_time);
        }
    }

    pub fn contains(&self, handle: &SystemHandle) -> bool {
        self.systems.lock().iter().any(|s| &s.handle == handle)
    }

    /// Registered systems in execution order
    pub fn systems(&self) -> Vec<SystemInfo> {
        self.systems.lock().clone()
    }

    /// Names in execution order
    pub fn system_names(&self) -> Vec<String> {
        self.systems.lock().iter().map(|s| s.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.systems.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.lock().is_empty()
    }

    fn emit(&self, event: SchedulerEvent) {
        let kind = event.kind();
        let hooks: Vec<SchedulerHook> = self
            .hooks
            .lock()
            .iter()
            .filter(|entry| entry.kind == kind)
            .map(|entry| entry.hook.clone())
            .collect();

        for hook in hooks {
            hook(self, &event);
        }
    }
}
