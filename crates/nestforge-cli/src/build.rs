//! Build command implementation for nestforge CLI.
//!
//! Reads model files from disk and runs them through the build pipeline as
//! one batch.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use nestforge_core::store::MODEL_EXTENSION;
use nestforge_core::{
    BuildOrchestrator, BuildRequest, BuildStatus, CommandGenerator, DeclarationParser,
    DylibRuntime, InstallGate, ModelSubmission, ModulesRoot,
};

use crate::colors;

/// Build the model files under `paths` into `module`.
pub fn execute(
    paths: &[PathBuf],
    module: Option<String>,
    modules_root: &Path,
    generator: &str,
) -> anyhow::Result<()> {
    let files = collect_model_files(paths)?;

    let mut models = Vec::with_capacity(files.len());
    for file in &files {
        let name = file
            .file_stem()
            .and_then(|stem| stem.to_str())
            .with_context(|| format!("Invalid model file name: {}", file.display()))?;
        let script = fs::read_to_string(file)
            .with_context(|| format!("Failed to read model file {}", file.display()))?;
        models.push(ModelSubmission::new(name, script));
    }

    let request = BuildRequest {
        module_name: module,
        models,
    };

    if request.models.is_empty() {
        println!("{}No model files found.{}", colors::YELLOW, colors::RESET);
        return Ok(());
    }

    let root = ModulesRoot::new(modules_root);
    root.ensure()?;
    let orchestrator = BuildOrchestrator::new(
        root.clone(),
        Arc::new(DeclarationParser),
        Arc::new(CommandGenerator::new(generator)),
        Arc::new(InstallGate::new(DylibRuntime::new(root))),
    );

    println!(
        "\n{}Building{} {} model(s) into module {}{}{}",
        colors::BOLD,
        colors::RESET,
        request.models.len(),
        colors::CYAN,
        request.module_name(),
        colors::RESET
    );
    println!("{}", "─".repeat(50));

    match orchestrator.build(&request) {
        Ok(report) => {
            print_status(&report.status);
            println!("{}", "─".repeat(50));
            if report.status.is_complete() {
                println!("{}All models installed{}", colors::GREEN, colors::RESET);
            } else {
                println!(
                    "{}{} of {} models installed{}",
                    colors::YELLOW,
                    report.status.installed.len(),
                    report.status.initialized.len(),
                    colors::RESET
                );
            }
            Ok(())
        }
        Err(failure) => {
            print_status(&failure.status);
            println!("{}", "─".repeat(50));
            println!(
                "{}Build stopped during {} stage{}",
                colors::RED,
                failure.stage,
                colors::RESET
            );
            Err(failure.error.into())
        }
    }
}

/// Expand directories into their `*.nestml` files, sorted by name.
fn collect_model_files(paths: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found = Vec::new();
            for entry in fs::read_dir(path)
                .with_context(|| format!("Failed to read directory {}", path.display()))?
            {
                let entry_path = entry?.path();
                let is_model = entry_path
                    .extension()
                    .is_some_and(|ext| ext == MODEL_EXTENSION);
                if is_model && entry_path.is_file() {
                    found.push(entry_path);
                }
            }
            found.sort();
            files.extend(found);
        } else if path.is_file() {
            files.push(path.clone());
        } else {
            anyhow::bail!("Model file not found: {}", path.display());
        }
    }
    Ok(files)
}

fn print_status(status: &BuildStatus) {
    let stages = [
        ("INITIALIZED", &status.initialized),
        ("WRITTEN", &status.written),
        ("BUILT", &status.built),
        ("INSTALLED", &status.installed),
    ];
    for (label, names) in stages {
        println!(
            "  {}{:<12}{} {}",
            colors::CYAN,
            label,
            colors::RESET,
            names.join(", ")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_collect_model_files() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("b.nestml"), "").unwrap();
        fs::write(temp.path().join("a.nestml"), "").unwrap();
        fs::write(temp.path().join("notes.txt"), "").unwrap();
        let single = temp.path().join("notes.txt");

        let files = collect_model_files(&[temp.path().to_path_buf(), single]).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| f.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.nestml", "b.nestml", "notes.txt"]);
    }

    #[test]
    fn test_missing_path() {
        let temp = TempDir::new().unwrap();
        let err = collect_model_files(&[temp.path().join("absent.nestml")]).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
