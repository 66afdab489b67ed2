//! Code generator backed by an external command.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Error, Result};

use super::{CodeGenerator, find_line_number};

/// Generator executable looked up when none is configured.
pub const DEFAULT_GENERATOR: &str = "nestml";

/// Runs an external generator executable.
///
/// The program is invoked as
/// `<program> --input_path <src> --target_path <build> --install_path <root> --module_name <name>`
/// followed by any extra arguments.
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    /// Program name or path
    program: OsString,

    /// Arguments appended after the standard ones
    extra_args: Vec<OsString>,
}

impl CommandGenerator {
    /// Create a generator for `program`. The program is resolved on use.
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
        }
    }

    /// Append extra arguments to every invocation.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.extra_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Resolve the program in PATH (or as a path).
    pub fn resolve(&self) -> Result<PathBuf> {
        which::which(&self.program).map_err(|_| Error::Generation {
            message: format!(
                "code generator '{}' not found in PATH",
                self.program.to_string_lossy()
            ),
            line: None,
        })
    }
}

impl Default for CommandGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_GENERATOR)
    }
}

impl CodeGenerator for CommandGenerator {
    fn generate(
        &self,
        source_path: &Path,
        install_path: &Path,
        module_name: &str,
        target_path: &Path,
    ) -> Result<()> {
        let program = self.resolve()?;

        tracing::info!(
            "Generating module '{}' from {} with {}",
            module_name,
            source_path.display(),
            program.display()
        );

        let output = Command::new(&program)
            .arg("--input_path")
            .arg(source_path)
            .arg("--target_path")
            .arg(target_path)
            .arg("--install_path")
            .arg(install_path)
            .arg("--module_name")
            .arg(module_name)
            .args(&self.extra_args)
            .output()
            .map_err(|e| Error::Generation {
                message: format!("failed to run {}: {}", program.display(), e),
                line: None,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            tracing::debug!("Generator output:\n{}", stdout);
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            // Some generators report model errors on stdout
            let report = if stderr.trim().is_empty() {
                stdout.trim()
            } else {
                stderr.trim()
            };
            return Err(Error::Generation {
                message: format!(
                    "generation of module '{}' failed ({}): {}",
                    module_name, output.status, report
                ),
                line: find_line_number(report),
            });
        }

        Ok(())
    }

    fn version(&self) -> Option<String> {
        let program = self.resolve().ok()?;
        let output = Command::new(program).arg("--version").output().ok()?;
        if !output.status.success() {
            return None;
        }
        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
        (!version.is_empty()).then_some(version)
    }
}
