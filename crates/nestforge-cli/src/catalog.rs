//! Catalog listing commands for nestforge CLI.

use std::path::Path;

use nestforge_core::{Catalog, ModulesRoot};

use crate::colors;

/// Print every built module, one per line.
pub fn list_modules(modules_root: &Path) -> anyhow::Result<()> {
    if !modules_root.is_dir() {
        tracing::debug!("Modules root {} does not exist", modules_root.display());
        return Ok(());
    }

    let catalog = Catalog::new(ModulesRoot::new(modules_root));
    for module in catalog.list_modules()? {
        println!("{}", module);
    }
    Ok(())
}

/// Print the models of `module`, marking the ones with generated code.
pub fn list_models(modules_root: &Path, module: &str) -> anyhow::Result<()> {
    let catalog = Catalog::new(ModulesRoot::new(modules_root));
    let models = catalog.list_models(module)?;
    let installed = catalog.list_installed(module)?;

    for model in models {
        if installed.contains(&model) {
            println!("{}", model);
        } else {
            println!("{}{} (not built){}", model, colors::DIM, colors::RESET);
        }
    }
    Ok(())
}
