//! HTTP route handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;

use crate::agent::AgentExecutor;
use crate::config::Config;
use crate::llm::LlmClient;
use crate::pipeline::{build_diagnosis_pipeline, PipelineRun, PipelineRunner};
use crate::tools::{ToolContext, ToolId, ToolRegistry};

use super::types::{
    DiagnoseRequest, ErrorResponse, HealthResponse, PipelineQuery, PipelineResponse,
    ToolResponse, ToolsResponse,
};

/// Shared application state.
pub struct AppState {
    pub config: Arc<Config>,
    pub tools: Arc<ToolRegistry>,
    pub tool_ctx: ToolContext,
    pub runner: PipelineRunner,
}

impl AppState {
    pub fn new(config: Arc<Config>, llm: Arc<dyn LlmClient>) -> Self {
        let tools = Arc::new(ToolRegistry::new());
        let tool_ctx = ToolContext::new(Arc::clone(&config));
        let executor = AgentExecutor::new(
            llm,
            Arc::clone(&tools),
            tool_ctx.clone(),
            config.max_iterations,
        );
        Self {
            config,
            tools,
            tool_ctx,
            runner: PipelineRunner::new(executor),
        }
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            stage: None,
        }),
    )
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/pipeline", get(describe_pipeline))
        .route("/api/diagnose", post(diagnose))
        .route("/api/tools", get(list_tools))
        .route("/api/tools/:name", post(execute_tool))
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: state.config.app_env.clone(),
    })
}

/// Describe the stages a run would execute.
async fn describe_pipeline(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PipelineQuery>,
) -> Json<PipelineResponse> {
    let pipeline = build_diagnosis_pipeline(state.config.verbose, query.imaging);
    Json(PipelineResponse {
        process: pipeline.process(),
        verbose: pipeline.verbose(),
        include_imaging: pipeline.includes_imaging(),
        required_inputs: pipeline.required_inputs(),
        stages: pipeline.descriptors(),
    })
}

/// Run the full pipeline and return the run record.
async fn diagnose(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DiagnoseRequest>,
) -> Result<Json<PipelineRun>, ApiError> {
    let verbose = req.verbose.unwrap_or(state.config.verbose);
    let pipeline = build_diagnosis_pipeline(verbose, req.include_imaging);

    tracing::info!(
        "Diagnose request: {} inputs, imaging={}",
        req.inputs.len(),
        req.include_imaging
    );

    match state.runner.run(&pipeline, &req.inputs).await {
        Ok(run) => Ok(Json(run)),
        Err(e) => Err((
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse {
                error: e.to_string(),
                stage: Some(e.stage().to_string()),
            }),
        )),
    }
}

async fn list_tools(State(state): State<Arc<AppState>>) -> Json<ToolsResponse> {
    Json(ToolsResponse {
        tools: state.tools.list_tools(),
    })
}

/// Invoke one tool directly with a JSON arguments object.
///
/// File-reading imaging tools are refused unless an image root is configured.
async fn execute_tool(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(args): Json<Value>,
) -> Result<Json<ToolResponse>, ApiError> {
    let id: ToolId = name
        .parse()
        .map_err(|e: anyhow::Error| api_error(StatusCode::NOT_FOUND, e.to_string()))?;

    if id.reads_files() && state.config.vision.image_root.is_none() {
        tracing::warn!("Refusing direct call to {}: no image root configured", id);
        return Err(api_error(
            StatusCode::FORBIDDEN,
            format!("{} requires IMAGE_ROOT to be configured", id),
        ));
    }

    let output = state
        .tools
        .execute(id.as_str(), args, &state.tool_ctx)
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(ToolResponse {
        tool: id.to_string(),
        output,
    }))
}
