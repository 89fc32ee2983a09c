use std::sync::Arc;

use super::{Scheduler, SystemInfo};

/// Kinds of scheduler lifecycle notifications a hook can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    SystemAdd,
    SystemRemove,
    SystemReplace,
}

/// Notification emitted right after the scheduler mutated its registry
#[derive(Debug, Clone)]
pub enum SchedulerEvent {
    SystemAdd { info: SystemInfo },
    SystemRemove { info: SystemInfo },
    SystemReplace { old: SystemInfo, new: SystemInfo },
}

impl SchedulerEvent {
    pub fn kind(&self) -> HookKind {
        match self {
            SchedulerEvent::SystemAdd { .. } => HookKind::SystemAdd,
            SchedulerEvent::SystemRemove { .. } => HookKind::SystemRemove,
            SchedulerEvent::SystemReplace { .. } => HookKind::SystemReplace,
        }
    }
}

/// Hook callback.
///
/// Hooks run synchronously on the mutating thread and receive the scheduler
/// itself, so they may issue further add/remove/replace calls re-entrantly.
pub type SchedulerHook = Arc<dyn Fn(&Scheduler, &SchedulerEvent) + Send + Sync>;

/// Subscription record
#[derive(Clone)]
pub(crate) struct HookEntry {
    pub kind: HookKind,
    pub hook: SchedulerHook,
}
