//! Registration state of the metadata interception.
//!
//! The host asks [`HookRegistry::is_active`] before handing a metadata call
//! to the interceptor. Code that materializes or saves a product object
//! takes a [`SuspendGuard`] first: the product's own save path issues
//! metadata calls, and those must reach legacy storage instead of coming
//! back into the handlers.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::{Level, event};

#[derive(Debug, Default)]
pub struct HookRegistry {
    registered: AtomicBool,
    suspended: AtomicUsize,
}

impl HookRegistry {
    /// A registry with nothing registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry registered iff `enabled`. The flag is read once here.
    pub fn install(enabled: bool) -> Self {
        let registry = Self::new();
        if enabled {
            registry.register();
        } else {
            event!(Level::INFO, "product table backwards compatibility disabled");
        }
        registry
    }

    pub fn register(&self) {
        self.registered.store(true, Ordering::SeqCst);
    }

    pub fn unregister(&self) {
        self.registered.store(false, Ordering::SeqCst);
    }

    pub fn is_registered(&self) -> bool {
        self.registered.load(Ordering::SeqCst)
    }

    /// Registered and not inside a suspension scope.
    pub fn is_active(&self) -> bool {
        self.is_registered() && self.suspended.load(Ordering::SeqCst) == 0
    }

    /// Deactivate the interception until the returned guard is dropped.
    /// Scopes nest.
    pub fn suspend(&self) -> SuspendGuard<'_> {
        self.suspended.fetch_add(1, Ordering::SeqCst);
        SuspendGuard { registry: self }
    }
}

#[must_use = "the interception resumes as soon as the guard is dropped"]
pub struct SuspendGuard<'a> {
    registry: &'a HookRegistry,
}

impl Drop for SuspendGuard<'_> {
    fn drop(&mut self) {
        self.registry.suspended.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_respects_flag() {
        assert!(HookRegistry::install(true).is_active());
        assert!(!HookRegistry::install(false).is_active());
    }

    #[test]
    fn test_nested_suspension() {
        let hooks = HookRegistry::install(true);
        {
            let _outer = hooks.suspend();
            {
                let _inner = hooks.suspend();
                assert!(!hooks.is_active());
            }
            assert!(!hooks.is_active());
            assert!(hooks.is_registered());
        }
        assert!(hooks.is_active());
    }

    #[test]
    fn test_guard_restores_on_panic() {
        let hooks = HookRegistry::install(true);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = hooks.suspend();
            panic!("save failed");
        }));
        assert!(result.is_err());
        assert!(hooks.is_active());
    }
}
