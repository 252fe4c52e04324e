//! Sequential pipeline execution.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::agent::{AgentDef, AgentExecutor};
use crate::api::types::TaskLogEntry;
use crate::llm::TokenUsage;

use super::template::render;
use super::Pipeline;

/// Caller-supplied fields for task templates.
pub type PipelineInputs = BTreeMap<String, String>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Stage '{stage}' failed: {source}")]
    StageFailed {
        stage: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl PipelineError {
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::StageFailed { stage, .. } => *stage,
        }
    }
}

/// Output of one stage.
#[derive(Debug, Clone, Serialize)]
pub struct StageResult {
    pub index: usize,
    pub task: &'static str,
    pub agent: &'static str,
    /// Rendered task description, before prior context is appended.
    pub prompt: String,
    pub output: String,
    pub log: Vec<TaskLogEntry>,
    pub usage: TokenUsage,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Record of a complete pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineRun {
    pub id: Uuid,
    pub model: String,
    pub include_imaging: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub stages: Vec<StageResult>,
    /// Output of the last stage.
    pub final_output: String,
    pub usage: TokenUsage,
}

/// Walks a [`Pipeline`] stage by stage.
pub struct PipelineRunner {
    executor: AgentExecutor,
}

impl PipelineRunner {
    pub fn new(executor: AgentExecutor) -> Self {
        Self { executor }
    }

    /// Run every stage in order and return the run record.
    ///
    /// The first failing stage aborts the run; nothing is retried.
    pub async fn run(
        &self,
        pipeline: &Pipeline,
        inputs: &PipelineInputs,
    ) -> Result<PipelineRun, PipelineError> {
        let id = Uuid::new_v4();
        let started_at = Utc::now();
        let verbose = pipeline.verbose();
        let coworkers: Vec<&AgentDef> = pipeline.agents();

        tracing::info!(
            "Starting pipeline run {} with {} stages (model: {})",
            id,
            pipeline.len(),
            self.executor.model()
        );

        let mut stages: Vec<StageResult> = Vec::with_capacity(pipeline.len());
        let mut warned: HashSet<String> = HashSet::new();
        let mut usage = TokenUsage::default();

        for (index, stage) in pipeline.stages().iter().enumerate() {
            let task = stage.task;
            let rendered = render(task.description, inputs);
            for name in rendered.missing {
                if warned.insert(name.clone()) {
                    tracing::warn!(
                        "Input '{}' was not supplied; leaving placeholder in '{}'",
                        name,
                        task.id
                    );
                }
            }

            let context = previous_context(&stages);
            if verbose {
                tracing::info!("[{}] {} starting:\n{}", task.id, stage.agent.role, rendered.text);
            } else {
                tracing::debug!("[{}] {} starting", task.id, stage.agent.role);
            }

            let stage_started = Utc::now();
            let outcome = self
                .executor
                .run_task(
                    stage.agent,
                    &rendered.text,
                    task.expected_output,
                    context.as_deref(),
                    &coworkers,
                )
                .await
                .map_err(|source| {
                    tracing::error!("Stage {} failed: {}", task.id, source);
                    PipelineError::StageFailed {
                        stage: task.id,
                        source,
                    }
                })?;

            if verbose {
                tracing::info!("[{}] output:\n{}", task.id, outcome.output);
            } else {
                tracing::debug!("[{}] finished ({} chars)", task.id, outcome.output.len());
            }

            usage.add(outcome.usage);
            stages.push(StageResult {
                index,
                task: task.id,
                agent: stage.agent.id,
                prompt: rendered.text,
                output: outcome.output,
                log: outcome.log,
                usage: outcome.usage,
                started_at: stage_started,
                finished_at: Utc::now(),
            });
        }

        let final_output = stages
            .last()
            .map(|s| s.output.clone())
            .unwrap_or_default();
        tracing::info!("Pipeline run {} completed", id);

        Ok(PipelineRun {
            id,
            model: self.executor.model().to_string(),
            include_imaging: pipeline.includes_imaging(),
            started_at,
            finished_at: Utc::now(),
            stages,
            final_output,
            usage,
        })
    }
}

/// Outputs of earlier stages, formatted for the next prompt.
fn previous_context(stages: &[StageResult]) -> Option<String> {
    if stages.is_empty() {
        return None;
    }
    let mut context = String::from("Context from previous stages:");
    for stage in stages {
        context.push_str(&format!("\n\n### {} ({})\n{}", stage.task, stage.agent, stage.output));
    }
    Some(context)
}
