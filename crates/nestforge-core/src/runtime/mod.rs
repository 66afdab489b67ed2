//! Simulator runtime integration.
//!
//! The runtime is a single process-wide resource: installing a module resets
//! it and loads the module. [`InstallGate`] owns the runtime and runs each
//! reset/load/query sequence under one lock, so concurrent builds can never
//! interleave their installs.

mod dylib;

use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::error::{Error, Result};

pub use dylib::{DylibRuntime, NODE_MODELS_SYMBOL, SYNAPSE_MODELS_SYMBOL};

/// Model names the runtime reports as loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResidentModels {
    pub node_models: BTreeSet<String>,
    pub synapse_models: BTreeSet<String>,
}

impl ResidentModels {
    /// Whether `name` is a resident node or synapse model.
    pub fn contains(&self, name: &str) -> bool {
        self.node_models.contains(name) || self.synapse_models.contains(name)
    }
}

/// A simulator kernel that compiled modules are loaded into.
pub trait Runtime: Send {
    /// Drop all loaded modules and runtime state.
    fn reset(&mut self) -> Result<()>;

    /// Load a compiled module by name.
    fn load(&mut self, module_name: &str) -> Result<()>;

    /// Models currently resident.
    fn resident_models(&self) -> Result<ResidentModels>;

    /// Version string of the runtime, if it can report one.
    fn version(&self) -> Option<String> {
        None
    }
}

fn lock_error<T>(e: PoisonError<T>) -> Error {
    Error::Runtime(format!("runtime lock poisoned (thread panicked): {}", e))
}

/// Serializes all access to the runtime.
pub struct InstallGate {
    runtime: Mutex<Box<dyn Runtime>>,
}

impl InstallGate {
    pub fn new(runtime: impl Runtime + 'static) -> Self {
        Self {
            runtime: Mutex::new(Box::new(runtime)),
        }
    }

    fn acquire(&self) -> Result<MutexGuard<'_, Box<dyn Runtime>>> {
        self.runtime.lock().map_err(lock_error)
    }

    /// Reset the runtime, load `module_name` and report resident models.
    ///
    /// The whole sequence runs while holding the runtime lock.
    pub fn install(&self, module_name: &str) -> Result<ResidentModels> {
        let mut runtime = self.acquire()?;

        tracing::info!("Installing module '{}'", module_name);
        runtime.reset()?;
        runtime.load(module_name)?;
        let resident = runtime.resident_models()?;

        tracing::debug!(
            "Runtime reports {} node and {} synapse models",
            resident.node_models.len(),
            resident.synapse_models.len()
        );

        Ok(resident)
    }

    /// Models currently resident.
    pub fn resident_models(&self) -> Result<ResidentModels> {
        self.acquire()?.resident_models()
    }

    /// Runtime version string.
    pub fn version(&self) -> Option<String> {
        self.acquire().ok()?.version()
    }
}
