//! API request and response types.

use serde::{Deserialize, Serialize};

use crate::pipeline::{PipelineInputs, Process, TaskDescriptor};
use crate::tools::{ToolInfo, ToolOutput};

/// Request to run the diagnosis pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct DiagnoseRequest {
    /// Values for task placeholders (`symptoms`, `history`, ...)
    #[serde(default)]
    pub inputs: PipelineInputs,

    /// Insert the imaging stage after symptom analysis
    #[serde(default)]
    pub include_imaging: bool,

    /// Override the configured verbosity for this run
    pub verbose: Option<bool>,
}

/// Query for the pipeline description endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PipelineQuery {
    #[serde(default)]
    pub imaging: bool,
}

/// Ordered description of a pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResponse {
    pub process: Process,
    pub verbose: bool,
    pub include_imaging: bool,
    /// Every input a stage template references
    pub required_inputs: Vec<&'static str>,
    pub stages: Vec<TaskDescriptor>,
}

/// Tool catalog.
#[derive(Debug, Clone, Serialize)]
pub struct ToolsResponse {
    pub tools: Vec<ToolInfo>,
}

/// Result of a direct tool invocation.
#[derive(Debug, Clone, Serialize)]
pub struct ToolResponse {
    pub tool: String,
    pub output: ToolOutput,
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,

    /// Pipeline stage that failed, when a run aborted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
}

/// A single entry in the task execution log.
#[derive(Debug, Clone, Serialize)]
pub struct TaskLogEntry {
    /// Timestamp (RFC 3339)
    pub timestamp: String,

    /// Entry type
    pub entry_type: LogEntryType,

    /// Content of the entry
    pub content: String,
}

impl TaskLogEntry {
    pub fn now(entry_type: LogEntryType, content: impl Into<String>) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            entry_type,
            content: content.into(),
        }
    }
}

/// Types of log entries.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogEntryType {
    /// Tool is being called
    ToolCall,
    /// Work handed to a coworker
    Delegation,
    /// Tool returned a result
    ToolResult,
    /// Agent produced final response
    Response,
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,

    /// Deployment environment (`APP_ENV`)
    pub environment: String,
}
