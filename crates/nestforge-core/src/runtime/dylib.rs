//! Runtime that loads compiled modules as dynamic libraries.
//!
//! A module library must export two functions returning newline separated,
//! NUL-terminated lists of the models it registers:
//!
//! ```c
//! const char *nestforge_node_models(void);
//! const char *nestforge_synapse_models(void);
//! ```

use std::collections::BTreeSet;
use std::ffi::{CStr, c_char};

use libloading::{Library, Symbol};

use crate::error::{Error, Result};
use crate::paths::ModulesRoot;

use super::{ResidentModels, Runtime};

/// Exported symbol listing node models.
pub const NODE_MODELS_SYMBOL: &[u8] = b"nestforge_node_models\0";

/// Exported symbol listing synapse models.
pub const SYNAPSE_MODELS_SYMBOL: &[u8] = b"nestforge_synapse_models\0";

type ModelListFn = unsafe extern "C" fn() -> *const c_char;

struct LoadedModule {
    name: String,
    library: Library,
}

/// Loads `<modules root>/<module>.<dylib extension>` into the process.
pub struct DylibRuntime {
    root: ModulesRoot,
    loaded: Vec<LoadedModule>,
}

impl DylibRuntime {
    pub fn new(root: ModulesRoot) -> Self {
        Self {
            root,
            loaded: Vec::new(),
        }
    }

    /// Names of the modules currently loaded.
    pub fn loaded_modules(&self) -> Vec<&str> {
        self.loaded.iter().map(|m| m.name.as_str()).collect()
    }
}

/// Call a model list export and split its output into names.
fn read_model_list(module: &LoadedModule, symbol: &[u8]) -> Result<BTreeSet<String>> {
    // SAFETY: the symbol is checked for presence at load time and follows the
    // documented `const char *(void)` signature.
    let list = unsafe {
        let func: Symbol<ModelListFn> = module.library.get(symbol)?;
        let ptr = func();
        if ptr.is_null() {
            return Ok(BTreeSet::new());
        }
        CStr::from_ptr(ptr).to_string_lossy().into_owned()
    };

    Ok(list
        .lines()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect())
}

impl Runtime for DylibRuntime {
    fn reset(&mut self) -> Result<()> {
        if !self.loaded.is_empty() {
            tracing::debug!("Unloading {} module(s)", self.loaded.len());
        }
        // Dropping the libraries unloads them
        self.loaded.clear();
        Ok(())
    }

    fn load(&mut self, module_name: &str) -> Result<()> {
        let path = self.root.artifact_path(module_name);
        if !path.is_file() {
            return Err(Error::Runtime(format!(
                "module '{}' is not installed (expected {})",
                module_name,
                path.display()
            )));
        }

        // SAFETY: loading runs the library's initializers; module libraries
        // are produced by the code generator for this purpose.
        let library = unsafe { Library::new(&path)? };

        for symbol in [NODE_MODELS_SYMBOL, SYNAPSE_MODELS_SYMBOL] {
            // SAFETY: only checks that the symbol exists, nothing is called.
            let present = unsafe { library.get::<ModelListFn>(symbol).is_ok() };
            if !present {
                return Err(Error::Runtime(format!(
                    "module '{}' at {} does not export {}",
                    module_name,
                    path.display(),
                    String::from_utf8_lossy(&symbol[..symbol.len() - 1])
                )));
            }
        }

        self.loaded.retain(|m| m.name != module_name);
        self.loaded.push(LoadedModule {
            name: module_name.to_string(),
            library,
        });

        tracing::info!("Loaded module '{}' from {}", module_name, path.display());
        Ok(())
    }

    fn resident_models(&self) -> Result<ResidentModels> {
        let mut resident = ResidentModels::default();
        for module in &self.loaded {
            resident
                .node_models
                .extend(read_model_list(module, NODE_MODELS_SYMBOL)?);
            resident
                .synapse_models
                .extend(read_model_list(module, SYNAPSE_MODELS_SYMBOL)?);
        }
        Ok(resident)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_module() {
        let temp = TempDir::new().unwrap();
        let mut runtime = DylibRuntime::new(ModulesRoot::new(temp.path()));

        let err = runtime.load("absent").unwrap_err();
        assert_eq!(err.kind(), "RuntimeError");
        assert!(err.to_string().contains("not installed"));
        assert!(runtime.loaded_modules().is_empty());
    }

    #[test]
    fn test_load_invalid_library() {
        let temp = TempDir::new().unwrap();
        let root = ModulesRoot::new(temp.path());
        std::fs::write(root.artifact_path("garbage"), b"not a shared object").unwrap();

        let mut runtime = DylibRuntime::new(root);
        let err = runtime.load("garbage").unwrap_err();
        assert_eq!(err.kind(), "RuntimeError");
    }

    #[test]
    fn test_reset_on_empty_runtime() {
        let temp = TempDir::new().unwrap();
        let mut runtime = DylibRuntime::new(ModulesRoot::new(temp.path()));
        runtime.reset().unwrap();
        assert_eq!(runtime.resident_models().unwrap(), ResidentModels::default());
    }
}
