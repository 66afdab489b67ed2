//! Read-only views of installed modules and their models.

use std::collections::BTreeMap;
use std::io;

use crate::error::{Error, Result};
use crate::paths::{ModuleDirs, ModulesRoot, is_identifier};
use crate::store::{self, GENERATED_EXTENSION, MODEL_EXTENSION};

/// Lists modules under a modules root and the models inside them.
#[derive(Debug, Clone)]
pub struct Catalog {
    root: ModulesRoot,
}

impl Catalog {
    pub fn new(root: ModulesRoot) -> Self {
        Self { root }
    }

    /// Modules with a compiled library in the modules root.
    pub fn list_modules(&self) -> Result<Vec<String>> {
        store::list_models(self.root.path(), std::env::consts::DLL_EXTENSION)
    }

    /// Models whose source is stored in `module_name`.
    pub fn list_models(&self, module_name: &str) -> Result<Vec<String>> {
        let dirs = self.existing_module(module_name)?;
        store::list_models(&dirs.source_dir, MODEL_EXTENSION)
    }

    /// Per-model generated sources in `module_name`'s build directory.
    ///
    /// Files whose name starts with the module name belong to the module
    /// aggregate and are left out.
    pub fn list_installed(&self, module_name: &str) -> Result<Vec<String>> {
        let dirs = self.existing_module(module_name)?;
        if !dirs.build_dir.is_dir() {
            return Ok(Vec::new());
        }
        Ok(store::list_models(&dirs.build_dir, GENERATED_EXTENSION)?
            .into_iter()
            .filter(|name| !name.starts_with(module_name))
            .collect())
    }

    /// Stored source text of a model.
    pub fn model_script(&self, module_name: &str, model_name: &str) -> Result<String> {
        let not_found = || Error::ModelNotFound {
            module: module_name.to_string(),
            model: model_name.to_string(),
        };

        let dirs = self.existing_module(module_name)?;
        if !is_identifier(model_name) {
            return Err(not_found());
        }

        match store::read_model(&dirs.source_dir, model_name) {
            Err(Error::Io(e)) if e.kind() == io::ErrorKind::NotFound => Err(not_found()),
            other => other,
        }
    }

    /// Models of every listed module.
    ///
    /// A compiled module whose sources are gone maps to an empty list.
    pub fn all_models(&self) -> Result<BTreeMap<String, Vec<String>>> {
        let mut all = BTreeMap::new();
        for module in self.list_modules()? {
            let models = match self.list_models(&module) {
                Ok(models) => models,
                Err(e) if e.is_not_found() => Vec::new(),
                Err(e) => return Err(e),
            };
            all.insert(module, models);
        }
        Ok(all)
    }

    fn existing_module(&self, module_name: &str) -> Result<ModuleDirs> {
        let dirs = self.root.module_dirs(module_name);
        if is_identifier(module_name) && dirs.source_dir.is_dir() {
            Ok(dirs)
        } else {
            Err(Error::ModuleNotFound(module_name.to_string()))
        }
    }
}
