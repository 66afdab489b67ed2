//! Error types for nestforge-core.

use thiserror::Error;

/// Result type for nestforge-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in nestforge-core.
#[derive(Debug, Error)]
pub enum Error {
    /// Model source could not be parsed.
    #[error("{message}")]
    Parse {
        message: String,
        line: Option<usize>,
    },

    /// Model name is not a filesystem-safe identifier.
    #[error("invalid model name '{0}': expected letters, digits and '_' only, not starting with a digit")]
    InvalidModelName(String),

    /// Module name is not a filesystem-safe identifier.
    #[error("invalid module name '{0}': expected letters, digits and '_' only, not starting with a digit")]
    InvalidModuleName(String),

    /// Submitted name does not match the model declared in the script.
    #[error("submitted model '{submitted}' declares model '{parsed}'")]
    NameMismatch { submitted: String, parsed: String },

    /// Requested declaration block is absent from the model.
    #[error("model '{model}' has no {block} block")]
    MissingBlock { model: String, block: &'static str },

    /// Model not present in a module.
    #[error("model '{model}' not found in module '{module}'")]
    ModelNotFound { module: String, model: String },

    /// Module not present under the modules root.
    #[error("module '{0}' not found")]
    ModuleNotFound(String),

    /// External code generator failed.
    #[error("{message}")]
    Generation {
        message: String,
        line: Option<usize>,
    },

    /// Runtime failed to reset, load or report models.
    #[error("{0}")]
    Runtime(String),

    /// Failed to load a compiled module library.
    #[error("failed to load library: {0}")]
    LibraryLoad(#[from] libloading::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a parse error, optionally pinned to a 1-based source line.
    pub fn parse(message: impl Into<String>, line: impl Into<Option<usize>>) -> Self {
        Self::Parse {
            message: message.into(),
            line: line.into(),
        }
    }

    /// Stable class name reported to callers.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "ParseError",
            Self::InvalidModelName(_) => "InvalidModelName",
            Self::InvalidModuleName(_) => "InvalidModuleName",
            Self::NameMismatch { .. } => "NameMismatch",
            Self::MissingBlock { .. } => "MissingBlock",
            Self::ModelNotFound { .. } => "ModelNotFound",
            Self::ModuleNotFound(_) => "ModuleNotFound",
            Self::Generation { .. } => "GenerationError",
            Self::Runtime(_) | Self::LibraryLoad(_) => "RuntimeError",
            Self::Io(_) => "IoError",
        }
    }

    /// Source line the error refers to, if known.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Parse { line, .. } | Self::Generation { line, .. } => *line,
            _ => None,
        }
    }

    /// Whether the error means a requested module or model does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ModelNotFound { .. } | Self::ModuleNotFound(_))
    }
}
