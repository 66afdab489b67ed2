//! Core engine for nestforge.
//!
//! This crate provides:
//! - Module workspace management (per-module source and build directories)
//! - Model source storage and listing
//! - Model parsing and parameter/state declaration extraction
//! - The staged build pipeline (write → generate → install) with per-stage
//!   verification
//! - Code generator and runtime integration
//! - A catalog of installed modules and models

pub mod build;
pub mod catalog;
pub mod error;
pub mod generate;
pub mod model;
pub mod paths;
pub mod runtime;
pub mod store;

pub use build::{
    BuildFailure, BuildOrchestrator, BuildReport, BuildRequest, BuildStage, BuildStatus,
    DEFAULT_MODULE_NAME, ModelSubmission,
};
pub use catalog::Catalog;
pub use error::{Error, Result};
pub use generate::{CodeGenerator, CommandGenerator};
pub use model::{
    BlockKind, DeclarationParser, DeclarationRecord, DeclarationValue, ModelParser, ParsedModel,
    Specs, extract_declarations, extract_specs,
};
pub use paths::{ModuleDirs, ModulesRoot};
pub use runtime::{DylibRuntime, InstallGate, ResidentModels, Runtime};
