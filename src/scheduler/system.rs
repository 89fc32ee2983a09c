use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Callable body of a system. Receives the frame delta time.
pub type SystemFn = Arc<dyn Fn(f32) + Send + Sync>;

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

/// Identity of one registered callable.
///
/// Every call to [`SystemHandle::new`] produces a distinct identity, even for
/// identical code. Re-evaluating a module therefore always yields fresh
/// handles; only the system *name* survives a reload.
#[derive(Clone)]
pub struct SystemHandle {
    id: u64,
    func: SystemFn,
}

impl SystemHandle {
    pub fn new(func: impl Fn(f32) + Send + Sync + 'static) -> Self {
        Self::from_fn(Arc::new(func))
    }

    pub fn from_fn(func: SystemFn) -> Self {
        Self {
            id: NEXT_HANDLE.fetch_add(1, Ordering::Relaxed),
            func,
        }
    }

    /// Raw identity, stable for the lifetime of the handle
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn call(&self, delta_time: f32) {
        (self.func)(delta_time)
    }
}

impl PartialEq for SystemHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for SystemHandle {}

impl Hash for SystemHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for SystemHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SystemHandle(#{})", self.id)
    }
}

/// A named system as the scheduler stores it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemInfo {
    pub name: String,
    pub handle: SystemHandle,
}

impl SystemInfo {
    pub fn new(name: impl Into<String>, handle: SystemHandle) -> Self {
        Self {
            name: name.into(),
            handle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_handles_are_unique_per_construction() {
        let a = SystemHandle::new(|_| {});
        let b = SystemHandle::new(|_| {});
        let a2 = a.clone();

        assert_ne!(a, b);
        assert_eq!(a, a2);

        let set: HashSet<_> = [a, a2, b].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_handle_call_runs_body() {
        let hits = Arc::new(AtomicU64::new(0));
        let hits_clone = hits.clone();
        let handle = SystemHandle::new(move |_| {
            hits_clone.fetch_add(1, Ordering::Relaxed);
        });

        handle.call(0.016);
        handle.call(0.016);
        assert_eq!(hits.load(Ordering::Relaxed), 2);
    }
}
