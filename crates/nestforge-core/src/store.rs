//! Model source files on disk.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::paths::is_identifier;

/// Extension of model source files.
pub const MODEL_EXTENSION: &str = "nestml";

/// Extension of per-model files emitted by the code generator.
pub const GENERATED_EXTENSION: &str = "cpp";

/// Reject model names that cannot be stored as `<name>.nestml`.
///
/// Dots are refused outright: listing derives names by splitting on the
/// first dot, so a dotted name would not survive a round trip.
pub fn validate_model_name(name: &str) -> Result<()> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(Error::InvalidModelName(name.to_string()))
    }
}

/// Path of a model's source file inside `source_dir`.
pub fn model_path(source_dir: &Path, name: &str) -> PathBuf {
    source_dir.join(format!("{}.{}", name, MODEL_EXTENSION))
}

/// Write `script` to `<source_dir>/<name>.nestml`, replacing any existing file.
pub fn write_model(source_dir: &Path, name: &str, script: &str) -> Result<PathBuf> {
    validate_model_name(name)?;
    let path = model_path(source_dir, name);
    fs::write(&path, script)?;
    tracing::debug!("Wrote model '{}' to {}", name, path.display());
    Ok(path)
}

/// Read the stored source text of a model.
pub fn read_model(source_dir: &Path, name: &str) -> Result<String> {
    validate_model_name(name)?;
    Ok(fs::read_to_string(model_path(source_dir, name))?)
}

/// Base name of a file: everything before the first dot.
pub fn base_name(file_name: &str) -> &str {
    file_name
        .split_once('.')
        .map_or(file_name, |(base, _)| base)
}

/// List the base names of the files in `dir` ending in `.<extension>`.
///
/// Names are returned sorted so listings are deterministic.
pub fn list_models(dir: &Path, extension: &str) -> Result<Vec<String>> {
    let suffix = format!(".{}", extension);
    let mut names = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.path().is_file() {
            continue;
        }

        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            tracing::debug!("Skipping non UTF-8 file name in {}", dir.display());
            continue;
        };

        if file_name.ends_with(&suffix) {
            names.push(base_name(file_name).to_string());
        }
    }

    names.sort();
    Ok(names)
}
