//! JSON bodies exchanged with HTTP clients.
//!
//! Build requests and reports reuse the core types directly
//! ([`nestforge_core::BuildRequest`], [`nestforge_core::BuildReport`]).

use nestforge_core::BuildStatus;
use serde::{Deserialize, Serialize};

/// Body of `POST /getSpecs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecsRequest {
    pub script: String,
}

/// Body returned for a stored model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptResponse {
    pub script: String,
}

/// Versions of the server and its collaborators.
///
/// Collaborators that cannot report a version serialize as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub generator: Option<String>,
    pub runtime: Option<String>,
    pub server: String,
}

/// Error body returned for every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Stable error class, e.g. `ParseError`.
    pub kind: String,

    /// `"<kind>: <detail>"` or `"<kind> at line <n>: <detail>"`.
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<usize>,

    /// Partial build report when a build stopped early.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<BuildStatus>,
}

impl ErrorBody {
    pub fn new(kind: impl Into<String>, detail: &str, line_number: Option<usize>) -> Self {
        let kind = kind.into();
        let message = match line_number {
            Some(line) => format!("{} at line {}: {}", kind, line, detail),
            None => format!("{}: {}", kind, detail),
        };
        Self {
            kind,
            message,
            line_number,
            status: None,
        }
    }

    pub fn with_status(mut self, status: BuildStatus) -> Self {
        self.status = Some(status);
        self
    }
}
