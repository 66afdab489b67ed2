//! Specs command implementation for nestforge CLI.

use std::fs;
use std::path::Path;

use anyhow::Context;
use nestforge_core::{DeclarationParser, extract_specs};

/// Print the extracted parameters and states of a model file.
pub fn execute(file: &Path) -> anyhow::Result<()> {
    let script = fs::read_to_string(file)
        .with_context(|| format!("Failed to read model file {}", file.display()))?;

    let specs = extract_specs(&DeclarationParser, &script)?;
    println!("{}", serde_json::to_string_pretty(&specs)?);

    Ok(())
}
