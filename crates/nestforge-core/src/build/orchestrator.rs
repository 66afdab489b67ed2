//! Staged build pipeline for a module.

use std::sync::{Arc, PoisonError};

use crate::error::Error;
use crate::generate::CodeGenerator;
use crate::model::ModelParser;
use crate::paths::{ModulesRoot, validate_module_name};
use crate::runtime::InstallGate;
use crate::store::{GENERATED_EXTENSION, MODEL_EXTENSION, list_models, validate_model_name, write_model};

use super::locks::ModuleLocks;
use super::request::BuildRequest;
use super::status::{BuildFailure, BuildReport, BuildStage, BuildStatus};

/// Runs write → generate → install for a batch of models.
///
/// ```text
/// reset workspace ─► write models ─► list models/     ─► WRITTEN
///                 ─► generate     ─► list module/     ─► BUILT
///                 ─► install      ─► resident models  ─► INSTALLED
/// ```
///
/// Builds of the same module are serialized end to end; installs of any
/// module are serialized through the shared [`InstallGate`].
pub struct BuildOrchestrator {
    root: ModulesRoot,
    parser: Arc<dyn ModelParser>,
    generator: Arc<dyn CodeGenerator>,
    runtime: Arc<InstallGate>,
    locks: ModuleLocks,
}

impl BuildOrchestrator {
    pub fn new(
        root: ModulesRoot,
        parser: Arc<dyn ModelParser>,
        generator: Arc<dyn CodeGenerator>,
        runtime: Arc<InstallGate>,
    ) -> Self {
        Self {
            root,
            parser,
            generator,
            runtime,
            locks: ModuleLocks::new(),
        }
    }

    pub fn modules_root(&self) -> &ModulesRoot {
        &self.root
    }

    pub fn parser(&self) -> &dyn ModelParser {
        self.parser.as_ref()
    }

    pub fn generator(&self) -> &dyn CodeGenerator {
        self.generator.as_ref()
    }

    pub fn runtime(&self) -> &InstallGate {
        &self.runtime
    }

    /// Build every submission of `request` into its module.
    ///
    /// An empty batch returns an empty report without touching the
    /// filesystem, the generator or the runtime.
    ///
    /// # Errors
    ///
    /// Returns a [`BuildFailure`] carrying the partial status when a script
    /// does not parse or names a different model, when the generator fails,
    /// or when the runtime cannot load the module.
    pub fn build(&self, request: &BuildRequest) -> Result<BuildReport, BuildFailure> {
        let mut status = BuildStatus::default();

        if request.models.is_empty() {
            tracing::debug!("Empty build request, nothing to do");
            return Ok(BuildReport { status });
        }

        let module_name = request.module_name();
        // Only valid names get a lock entry; the lock table never shrinks
        validate_module_name(module_name)
            .map_err(|e| BuildFailure::new(BuildStage::Write, &status, e))?;
        let lock = self.locks.get(module_name);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        // Write
        let (dirs, cleared) = self
            .root
            .reset_module(module_name)
            .map_err(|e| BuildFailure::new(BuildStage::Write, &status, e))?;
        if cleared.failures > 0 {
            tracing::warn!(
                "{} stale entries of module '{}' could not be removed",
                cleared.failures,
                module_name
            );
        }

        for submission in &request.models {
            status.initialized.push(submission.name.clone());

            if let Err(e) = validate_model_name(&submission.name) {
                tracing::warn!("Skipping submission: {}", e);
                continue;
            }

            let parsed = self
                .parser
                .parse(&submission.script)
                .map_err(|e| BuildFailure::new(BuildStage::Write, &status, e))?;
            if parsed.name != submission.name {
                return Err(BuildFailure::new(
                    BuildStage::Write,
                    &status,
                    Error::NameMismatch {
                        submitted: submission.name.clone(),
                        parsed: parsed.name,
                    },
                ));
            }

            if let Err(e) = write_model(&dirs.source_dir, &submission.name, &submission.script) {
                tracing::warn!("Failed to write model '{}': {}", submission.name, e);
            }
        }

        status.written = list_models(&dirs.source_dir, MODEL_EXTENSION)
            .map_err(|e| BuildFailure::new(BuildStage::Write, &status, e))?;
        tracing::info!(
            "Module '{}': {}/{} models written",
            module_name,
            status.written.len(),
            status.initialized.len()
        );

        // Generate
        self.generator
            .generate(
                &dirs.source_dir,
                self.root.path(),
                module_name,
                &dirs.build_dir,
            )
            .map_err(|e| BuildFailure::new(BuildStage::Generate, &status, e))?;

        let generated = list_models(&dirs.build_dir, GENERATED_EXTENSION)
            .map_err(|e| BuildFailure::new(BuildStage::Generate, &status, e))?;
        status.built = generated
            .into_iter()
            .filter(|name| status.written.contains(name))
            .collect();
        tracing::info!(
            "Module '{}': {} models built",
            module_name,
            status.built.len()
        );

        // Install
        let resident = self
            .runtime
            .install(module_name)
            .map_err(|e| BuildFailure::new(BuildStage::Install, &status, e))?;
        status.installed = status
            .built
            .iter()
            .filter(|name| resident.contains(name))
            .cloned()
            .collect();
        tracing::info!(
            "Module '{}': {} models installed",
            module_name,
            status.installed.len()
        );

        Ok(BuildReport { status })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use crate::error::Result;
    use crate::model::DeclarationParser;
    use crate::runtime::{ResidentModels, Runtime};
    use crate::build::ModelSubmission;
    use tempfile::TempDir;

    struct UnreachableGenerator;

    impl CodeGenerator for UnreachableGenerator {
        fn generate(&self, _: &Path, _: &Path, _: &str, _: &Path) -> Result<()> {
            panic!("generator must not run");
        }
    }

    struct UnreachableRuntime;

    impl Runtime for UnreachableRuntime {
        fn reset(&mut self) -> Result<()> {
            panic!("runtime must not be reset");
        }

        fn load(&mut self, _: &str) -> Result<()> {
            panic!("runtime must not load");
        }

        fn resident_models(&self) -> Result<ResidentModels> {
            panic!("runtime must not be queried");
        }
    }

    #[test]
    fn test_invalid_module_name_takes_no_lock() {
        let temp = TempDir::new().unwrap();
        let orchestrator = BuildOrchestrator::new(
            ModulesRoot::new(temp.path()),
            Arc::new(DeclarationParser),
            Arc::new(UnreachableGenerator),
            Arc::new(InstallGate::new(UnreachableRuntime)),
        );

        for name in ["../escape", "has.dot", "9lives"] {
            let request = BuildRequest::new(
                name,
                vec![ModelSubmission::new("iaf", "model iaf:\n")],
            );
            let failure = orchestrator.build(&request).unwrap_err();
            assert_eq!(failure.stage, BuildStage::Write);
            assert!(matches!(failure.error, Error::InvalidModuleName(_)));
            assert!(failure.status.initialized.is_empty());
        }

        assert!(orchestrator.locks.is_empty());
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
    }
}
