//! HTTP routes for nestforge server.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, State},
    response::Json,
    routing::{get, post},
};
use nestforge_core::{
    BuildOrchestrator, BuildReport, BuildRequest, Catalog, CommandGenerator, DeclarationParser,
    DylibRuntime, InstallGate, ModulesRoot, Specs, extract_specs,
};
use tower_http::cors::CorsLayer;

use crate::ServerConfig;
use crate::error::ServerResult;
use crate::protocol::{ScriptResponse, SpecsRequest, VersionInfo};

/// Application state shared across handlers.
pub struct AppState {
    /// Runs builds; owns the parser, generator and runtime.
    pub orchestrator: Arc<BuildOrchestrator>,
    /// Read-only view of the modules root.
    pub catalog: Catalog,
}

impl AppState {
    pub fn new(orchestrator: BuildOrchestrator) -> Self {
        let catalog = Catalog::new(orchestrator.modules_root().clone());
        Self {
            orchestrator: Arc::new(orchestrator),
            catalog,
        }
    }

    /// State backed by the command-line generator and the dynamic-library
    /// runtime. Creates the modules root if needed.
    pub fn from_config(config: &ServerConfig) -> ServerResult<Self> {
        let root = ModulesRoot::new(&config.modules_root);
        root.ensure()?;

        let orchestrator = BuildOrchestrator::new(
            root.clone(),
            Arc::new(DeclarationParser),
            Arc::new(CommandGenerator::new(&config.generator)),
            Arc::new(InstallGate::new(DylibRuntime::new(root))),
        );
        Ok(Self::new(orchestrator))
    }
}

/// Create the router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(version_handler))
        .route("/health", get(health_handler))
        .route("/generateModels", post(generate_models_handler))
        .route("/getSpecs", post(specs_handler))
        .route("/models", get(all_models_handler))
        .route("/modules", get(modules_handler))
        .route("/module/{module}/models", get(module_models_handler))
        .route("/module/{module}/installed", get(installed_handler))
        .route("/module/{module}/model/{model}", get(model_script_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Versions of the server, generator and runtime.
async fn version_handler(State(state): State<Arc<AppState>>) -> ServerResult<Json<VersionInfo>> {
    let orchestrator = state.orchestrator.clone();
    // Asking the generator for its version spawns a process
    let (generator, runtime) = tokio::task::spawn_blocking(move || {
        (
            orchestrator.generator().version(),
            orchestrator.runtime().version(),
        )
    })
    .await?;

    Ok(Json(VersionInfo {
        generator,
        runtime,
        server: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

/// Health check handler.
async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Build a batch of models into a module.
async fn generate_models_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BuildRequest>,
) -> ServerResult<Json<BuildReport>> {
    tracing::info!(
        "Build request for module '{}' with {} model(s)",
        request.module_name(),
        request.models.len()
    );

    let orchestrator = state.orchestrator.clone();
    let report = tokio::task::spawn_blocking(move || orchestrator.build(&request)).await??;
    Ok(Json(report))
}

/// Extract parameter and state declarations from a script.
async fn specs_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SpecsRequest>,
) -> ServerResult<Json<Specs>> {
    let orchestrator = state.orchestrator.clone();
    let specs =
        tokio::task::spawn_blocking(move || extract_specs(orchestrator.parser(), &request.script))
            .await??;
    Ok(Json(specs))
}

async fn all_models_handler(
    State(state): State<Arc<AppState>>,
) -> ServerResult<Json<BTreeMap<String, Vec<String>>>> {
    Ok(Json(state.catalog.all_models()?))
}

async fn modules_handler(State(state): State<Arc<AppState>>) -> ServerResult<Json<Vec<String>>> {
    Ok(Json(state.catalog.list_modules()?))
}

async fn module_models_handler(
    State(state): State<Arc<AppState>>,
    Path(module): Path<String>,
) -> ServerResult<Json<Vec<String>>> {
    Ok(Json(state.catalog.list_models(&module)?))
}

async fn installed_handler(
    State(state): State<Arc<AppState>>,
    Path(module): Path<String>,
) -> ServerResult<Json<Vec<String>>> {
    Ok(Json(state.catalog.list_installed(&module)?))
}

async fn model_script_handler(
    State(state): State<Arc<AppState>>,
    Path((module, model)): Path<(String, String)>,
) -> ServerResult<Json<ScriptResponse>> {
    let script = state.catalog.model_script(&module, &model)?;
    Ok(Json(ScriptResponse { script }))
}
