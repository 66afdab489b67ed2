//! Code generation for model modules.
//!
//! The generator reads every model file in a module's source directory,
//! writes generated sources to the build directory and installs the compiled
//! module under the modules root.

mod command;

use std::path::Path;

use crate::error::Result;

pub use command::{CommandGenerator, DEFAULT_GENERATOR};

/// Turns a directory of model sources into a compiled module.
pub trait CodeGenerator: Send + Sync {
    /// Generate and install `module_name`.
    ///
    /// * `source_path` - directory holding `<model>.nestml` files
    /// * `install_path` - where the compiled module library is installed
    /// * `target_path` - directory receiving generated sources
    fn generate(
        &self,
        source_path: &Path,
        install_path: &Path,
        module_name: &str,
        target_path: &Path,
    ) -> Result<()>;

    /// Version string of the generator, if it can report one.
    fn version(&self) -> Option<String> {
        None
    }
}

/// Find the first `line <N>` mention in generator output.
pub fn find_line_number(output: &str) -> Option<usize> {
    output.match_indices("line ").find_map(|(pos, matched)| {
        let digits: String = output[pos + matched.len()..]
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse().ok()
    })
}
