//! Per-module build locks.

use std::sync::{Arc, Mutex, PoisonError};

use rustc_hash::FxHashMap;

/// Hands out one lock per module name.
///
/// A build holds its module's lock from workspace reset to install, so two
/// builds of the same module never clear each other's files.
#[derive(Debug, Default)]
pub struct ModuleLocks {
    locks: Mutex<FxHashMap<String, Arc<Mutex<()>>>>,
}

impl ModuleLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of modules with a lock.
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The lock guarding `module_name`.
    pub fn get(&self, module_name: &str) -> Arc<Mutex<()>> {
        // The map only ever grows, so a poisoned guard is still consistent
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks
            .entry(module_name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
