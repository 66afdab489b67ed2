//! Build status reporting.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// How far each submitted model progressed.
///
/// Every list is filled by re-observing the filesystem or the runtime after
/// the corresponding stage, never by assuming the stage succeeded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct BuildStatus {
    /// Submissions received, in request order.
    pub initialized: Vec<String>,

    /// Model files found in the source directory after writing.
    pub written: Vec<String>,

    /// Generated sources found in the build directory after generation.
    pub built: Vec<String>,

    /// Built models the runtime reports as resident after install.
    pub installed: Vec<String>,
}

impl BuildStatus {
    /// Whether every received model made it through every stage.
    pub fn is_complete(&self) -> bool {
        let installed = |name: &String| self.installed.contains(name);
        self.initialized.iter().all(installed)
    }
}

/// Response body of a build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    pub status: BuildStatus,
}

/// Pipeline stage a build was in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStage {
    Write,
    Generate,
    Install,
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Write => "write",
            Self::Generate => "generate",
            Self::Install => "install",
        })
    }
}

/// A build that stopped early, with everything observed before the failure.
#[derive(Debug, thiserror::Error)]
#[error("build failed during {stage} stage: {error}")]
pub struct BuildFailure {
    pub stage: BuildStage,
    pub status: BuildStatus,
    #[source]
    pub error: Error,
}

impl BuildFailure {
    pub fn new(stage: BuildStage, status: &BuildStatus, error: Error) -> Self {
        Self {
            stage,
            status: status.clone(),
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_keys() {
        let report = BuildReport {
            status: BuildStatus {
                initialized: vec!["a".into()],
                ..Default::default()
            },
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "status": {"INITIALIZED": ["a"], "WRITTEN": [], "BUILT": [], "INSTALLED": []}
            })
        );
    }

    #[test]
    fn test_is_complete() {
        let mut status = BuildStatus {
            initialized: vec!["a".into(), "b".into()],
            installed: vec!["a".into()],
            ..Default::default()
        };
        assert!(!status.is_complete());
        status.installed.push("b".into());
        assert!(status.is_complete());
    }
}
