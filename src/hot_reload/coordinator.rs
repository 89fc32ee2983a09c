//! Reload coordinator
//!
//! Keeps the scheduler's live systems in step with module evaluations. The
//! coordinator subscribes to the scheduler's add/remove/replace hooks and to
//! the loader's ready/unload callbacks, and owns the module → system registry.
//!
//! A module evaluation runs inside a reconciliation context:
//!
//! 1. the prior system set of the superseded identity is detached as a snapshot
//! 2. the module body runs; every registration it makes is matched by name
//!    against the snapshot and either swapped into the old slot or recorded as
//!    new
//! 3. failures in the body are contained, partial registrations stand
//! 4. snapshot entries nobody claimed are removed from the scheduler
//! 5. the accumulated set is committed under the evaluated identity
//!
//! No lock is held while calling into the scheduler or module code; hooks
//! re-enter the coordinator synchronously.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::error::ReloadError;
use crate::scheduler::{HookKind, Scheduler, SchedulerEvent, SystemHandle, SystemInfo};
use super::context::{ReloadContext, ReloadOutcome, UnloadOutcome};
use super::registry::ModuleRegistry;
use super::{HotReloadResult, Module, ModuleHooks, ModuleId, ModuleLoader, ReadyMeta, UnloadMeta};

#[derive(Debug, Default)]
struct CoordinatorState {
    registry: ModuleRegistry,
    /// Single slot; at most one module evaluates at a time
    context: Option<ReloadContext>,
}

/// Keeps scheduler systems synchronized with module (re)loads
pub struct HotReloadCoordinator {
    scheduler: Arc<Scheduler>,
    state: Mutex<CoordinatorState>,
}

impl HotReloadCoordinator {
    /// Wire the coordinator into `scheduler` and scan every root with `loader`.
    ///
    /// The loader keeps the returned coordinator as its [`ModuleHooks`] and
    /// reports later reloads and unloads through it.
    pub fn start<L, P>(
        roots: impl IntoIterator<Item = P>,
        scheduler: Arc<Scheduler>,
        loader: &mut L,
    ) -> HotReloadResult<Arc<Self>>
    where
        L: ModuleLoader + ?Sized,
        P: AsRef<Path>,
    {
        let coordinator = Self::attach(scheduler);

        for root in roots {
            let root = root.as_ref();
            let hooks: Arc<dyn ModuleHooks> = coordinator.clone();
            let modules = loader.scan(root, hooks)?;
            log::info!(
                "[HotReloadCoordinator] Tracking {} module(s) under {}",
                modules.len(),
                root.display()
            );
        }

        Ok(coordinator)
    }

    /// Subscribe to the scheduler's lifecycle hooks without scanning
    pub(crate) fn attach(scheduler: Arc<Scheduler>) -> Arc<Self> {
        let coordinator = Arc::new(Self {
            scheduler: scheduler.clone(),
            state: Mutex::new(CoordinatorState::default()),
        });

        let weak = Arc::downgrade(&coordinator);
        subscribe(&scheduler, HookKind::SystemAdd, weak.clone(), |coordinator, scheduler, event| {
            if let SchedulerEvent::SystemAdd { info } = event {
                coordinator.handle_system_add(scheduler, info);
            }
        });
        subscribe(&scheduler, HookKind::SystemRemove, weak.clone(), |coordinator, _, event| {
            if let SchedulerEvent::SystemRemove { info } = event {
                coordinator.handle_system_remove(info);
            }
        });
        subscribe(&scheduler, HookKind::SystemReplace, weak, |coordinator, _, event| {
            if let SchedulerEvent::SystemReplace { old, new } = event {
                coordinator.handle_system_replace(old, new);
            }
        });

        coordinator
    }

    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }

    /// Systems currently attributed to `module`, in registration order
    pub fn systems_of(&self, module: ModuleId) -> Option<Vec<SystemInfo>> {
        self.state.lock().registry.systems_of(module).map(<[SystemInfo]>::to_vec)
    }

    pub fn system_names_of(&self, module: ModuleId) -> Option<Vec<String>> {
        self.state
            .lock()
            .registry
            .systems_of(module)
            .map(|systems| systems.iter().map(|s| s.name.clone()).collect())
    }

    pub fn tracked_modules(&self) -> Vec<ModuleId> {
        self.state.lock().registry.modules()
    }

    pub fn owner_of(&self, handle: &SystemHandle) -> Option<ModuleId> {
        self.state.lock().registry.owner_of(handle)
    }

    /// True while a module body is being evaluated
    pub fn is_evaluating(&self) -> bool {
        self.state.lock().context.is_some()
    }

    fn handle_system_add(&self, scheduler: &Scheduler, info: &SystemInfo) {
        let prior = {
            let mut state = self.state.lock();
            let Some(context) = state.context.as_mut() else {
                return;
            };
            match context.claim_prior(&info.name) {
                Some(prior) => prior,
                None => {
                    context.record_new(info.clone());
                    return;
                }
            }
        };

        // Drop the appended copy, then move the new handle into the old slot
        scheduler.remove_system(&info.handle);
        match scheduler.replace_system(&prior.handle, info.handle.clone()) {
            Ok(()) => {
                if let Some(context) = self.state.lock().context.as_mut() {
                    context.record_replacement(info.clone());
                }
            }
            Err(err) => {
                log::debug!(
                    "[HotReloadCoordinator] Could not replace {} in place ({}), registering as new",
                    info.name,
                    err
                );
                // Re-enters handle_system_add with the prior entry consumed
                scheduler.add_system(info.name.clone(), info.handle.clone());
            }
        }
    }

    fn handle_system_remove(&self, info: &SystemInfo) {
        let mut state = self.state.lock();
        if let Some((module, _)) = state.registry.forget_handle(&info.handle) {
            log::trace!("[HotReloadCoordinator] {} no longer owns {}", module, info.name);
        }
        if let Some(context) = state.context.as_mut() {
            context.forget(&info.handle);
        }
    }

    fn handle_system_replace(&self, old: &SystemInfo, new: &SystemInfo) {
        let mut state = self.state.lock();
        if let Some(module) = state.registry.replace_handle(&old.handle, &new.handle) {
            log::trace!("[HotReloadCoordinator] {} now runs {:?} as {}", module, new.handle, new.name);
        }
        if let Some(context) = state.context.as_mut() {
            context.swap(&old.handle, &new.handle);
        }
    }

    fn open_context(&self, module: ModuleId, meta: ReadyMeta) -> HotReloadResult<ContextGuard<'_>> {
        let mut state = self.state.lock();

        if let Some(active) = &state.context {
            return Err(ReloadError::ContextAlreadyOpen {
                active: active.module,
                requested: module,
            });
        }

        let snapshot = if meta.is_reloading {
            if meta.original != module && state.registry.contains(module) {
                return Err(ReloadError::AlreadyTracked { module });
            }
            state
                .registry
                .take(meta.original)
                .ok_or(ReloadError::MissingSnapshot {
                    original: meta.original,
                })?
        } else {
            if state.registry.contains(module) {
                return Err(ReloadError::AlreadyTracked { module });
            }
            Vec::new()
        };

        log::debug!(
            "[HotReloadCoordinator] Evaluating {} (reload: {}, original: {}, {} prior system(s))",
            module,
            meta.is_reloading,
            meta.original,
            snapshot.len()
        );
        state.context = Some(ReloadContext::open(module, meta, snapshot));

        Ok(ContextGuard {
            coordinator: self,
            armed: true,
        })
    }

    fn close_context(&self, failure: Option<String>) -> HotReloadResult<ReloadOutcome> {
        let (stale, outcome) = {
            let mut state = self.state.lock();
            let context = state.context.take().ok_or(ReloadError::NoActiveContext)?;
            let (module, original) = (context.module, context.original);
            let (commit, stale, outcome) = context.finish(failure);
            state.registry.commit(module, commit);
            if original != module {
                log::debug!("[HotReloadCoordinator] {} superseded by {}", original, module);
            }
            (stale, outcome)
        };

        for system in &stale {
            self.scheduler.remove_system(&system.handle);
        }

        log::debug!(
            "[HotReloadCoordinator] Committed {:?}: {} added, {} replaced, {} removed",
            outcome.module,
            outcome.added.len(),
            outcome.replaced.len(),
            outcome.removed.len()
        );
        Ok(outcome)
    }
}

impl ModuleHooks for HotReloadCoordinator {
    fn on_ready(&self, module: &Module, meta: ReadyMeta) -> HotReloadResult<ReloadOutcome> {
        let guard = self.open_context(module.id(), meta)?;

        let failure = match panic::catch_unwind(AssertUnwindSafe(|| module.evaluate(&self.scheduler))) {
            Ok(Ok(())) => None,
            Ok(Err(err)) => Some(format!("{err:#}")),
            Err(payload) => Some(panic_message(&*payload)),
        };

        guard.close(failure)
    }

    fn on_unload(&self, module: ModuleId, meta: UnloadMeta) -> HotReloadResult<UnloadOutcome> {
        if meta.is_reloading {
            log::trace!("[HotReloadCoordinator] {} retired by a reload, keeping its systems", module);
            return Ok(UnloadOutcome {
                module: Some(module),
                removed: Vec::new(),
                skipped: true,
            });
        }

        let systems = self.state.lock().registry.take(module).unwrap_or_default();
        let removed: Vec<String> = systems
            .iter()
            .filter_map(|system| self.scheduler.remove_system(&system.handle))
            .map(|info| info.name)
            .collect();

        log::debug!("[HotReloadCoordinator] Unloaded {}, removed {} system(s)", module, removed.len());
        Ok(UnloadOutcome {
            module: Some(module),
            removed,
            skipped: false,
        })
    }
}

/// Closes the reconciliation context even if evaluation unwinds
struct ContextGuard<'a> {
    coordinator: &'a HotReloadCoordinator,
    armed: bool,
}

impl ContextGuard<'_> {
    fn close(mut self, failure: Option<String>) -> HotReloadResult<ReloadOutcome> {
        self.armed = false;
        self.coordinator.close_context(failure)
    }
}

impl Drop for ContextGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            if let Err(err) = self.coordinator.close_context(Some("evaluation aborted".to_string())) {
                log::debug!("[HotReloadCoordinator] Context already closed: {}", err);
            }
        }
    }
}

fn subscribe(
    scheduler: &Scheduler,
    kind: HookKind,
    coordinator: Weak<HotReloadCoordinator>,
    handler: fn(&HotReloadCoordinator, &Scheduler, &SchedulerEvent),
) {
    scheduler.add_hook(kind, move |scheduler, event| {
        if let Some(coordinator) = coordinator.upgrade() {
            handler(&coordinator, scheduler, event);
        }
    });
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("module panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("module panicked: {message}")
    } else {
        "module panicked".to_string()
    }
}
