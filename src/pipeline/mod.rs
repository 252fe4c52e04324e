//! The diagnosis pipeline: a fixed, ordered recipe of (agent, task) stages.
//!
//! Stages run strictly one after another. Each stage's prompt is rendered
//! from the caller's inputs and sees every earlier stage's output, so there
//! is nothing to parallelize.

mod runner;
mod tasks;
mod template;

use serde::Serialize;

use crate::agent::AgentDef;

pub use runner::{PipelineError, PipelineInputs, PipelineRun, PipelineRunner, StageResult};
pub use tasks::{
    TaskDef, TaskDescriptor, DRUG_SAFETY_CHECK, FOLLOW_UP_SCHEDULING, HISTORY_REVIEW,
    IMAGING_ANALYSIS, PATIENT_COMMUNICATION, REFERRAL_ASSESSMENT, SYMPTOM_ANALYSIS,
    TREATMENT_RECOMMENDATION,
};
pub use template::{placeholders, render, Rendered};

/// How stages are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Process {
    Sequential,
}

/// An agent paired with the task it performs.
#[derive(Debug, Clone, Copy)]
pub struct Stage {
    pub agent: &'static AgentDef,
    pub task: &'static TaskDef,
}

/// A materialized pipeline.
#[derive(Debug, Clone)]
pub struct Pipeline {
    stages: Vec<Stage>,
    verbose: bool,
    process: Process,
}

/// Position of the imaging stage when it is included.
const IMAGING_INDEX: usize = 1;

static BASE_TASKS: [&TaskDef; 7] = [
    &SYMPTOM_ANALYSIS,
    &HISTORY_REVIEW,
    &TREATMENT_RECOMMENDATION,
    &REFERRAL_ASSESSMENT,
    &DRUG_SAFETY_CHECK,
    &FOLLOW_UP_SCHEDULING,
    &PATIENT_COMMUNICATION,
];

/// Build the diagnosis pipeline, optionally with the imaging stage at index 1.
pub fn build_diagnosis_pipeline(verbose: bool, include_imaging: bool) -> Pipeline {
    let mut tasks: Vec<&'static TaskDef> = BASE_TASKS.to_vec();
    if include_imaging {
        tasks.insert(IMAGING_INDEX, &IMAGING_ANALYSIS);
    }

    Pipeline {
        stages: tasks
            .into_iter()
            .map(|task| Stage {
                agent: task.agent,
                task,
            })
            .collect(),
        verbose,
        process: Process::Sequential,
    }
}

impl Pipeline {
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Agents in execution order; index-aligned with [`Pipeline::tasks`].
    pub fn agents(&self) -> Vec<&'static AgentDef> {
        self.stages.iter().map(|s| s.agent).collect()
    }

    /// Tasks in execution order; index-aligned with [`Pipeline::agents`].
    pub fn tasks(&self) -> Vec<&'static TaskDef> {
        self.stages.iter().map(|s| s.task).collect()
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn process(&self) -> Process {
        self.process
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn includes_imaging(&self) -> bool {
        self.stages.iter().any(|s| s.task.id == IMAGING_ANALYSIS.id)
    }

    /// Every input name a stage template references, in first-use order.
    pub fn required_inputs(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = Vec::new();
        for stage in &self.stages {
            for name in stage.task.placeholders() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }

    pub fn descriptors(&self) -> Vec<TaskDescriptor> {
        self.stages.iter().map(|s| s.task.descriptor()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE_ORDER: [&str; 7] = [
        "symptom_analysis",
        "history_review",
        "treatment_recommendation",
        "referral_assessment",
        "drug_safety_check",
        "follow_up_scheduling",
        "patient_communication",
    ];

    #[test]
    fn base_pipeline_has_fixed_order() {
        let pipeline = build_diagnosis_pipeline(true, false);
        let ids: Vec<_> = pipeline.tasks().iter().map(|t| t.id).collect();
        assert_eq!(ids, BASE_ORDER);
        assert_eq!(pipeline.process(), Process::Sequential);
        assert!(pipeline.verbose());
        assert!(!pipeline.includes_imaging());
    }

    #[test]
    fn imaging_is_inserted_at_index_one_in_both_sequences() {
        let base = build_diagnosis_pipeline(false, false);
        let with_imaging = build_diagnosis_pipeline(false, true);

        assert_eq!(with_imaging.len(), base.len() + 1);
        assert_eq!(with_imaging.tasks()[1].id, "imaging_analysis");
        assert_eq!(with_imaging.agents()[1].id, "imaging_analyst");
        assert!(with_imaging.includes_imaging());
        assert!(!with_imaging.verbose());

        let ids: Vec<_> = with_imaging
            .tasks()
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != 1)
            .map(|(_, t)| t.id)
            .collect();
        assert_eq!(ids, BASE_ORDER);
    }

    #[test]
    fn agents_stay_paired_with_their_tasks() {
        for include_imaging in [false, true] {
            let pipeline = build_diagnosis_pipeline(true, include_imaging);
            let agents = pipeline.agents();
            let tasks = pipeline.tasks();
            assert_eq!(agents.len(), tasks.len());
            for (agent, task) in agents.iter().zip(&tasks) {
                assert_eq!(agent.id, task.agent.id);
            }
        }
    }

    #[test]
    fn required_inputs_cover_every_stage() {
        let inputs = build_diagnosis_pipeline(true, true).required_inputs();
        assert_eq!(
            inputs,
            vec![
                "symptoms",
                "demographics",
                "image_path",
                "history",
                "medications",
                "working_differential",
                "diagnosis_summary",
                "proposed_medications",
                "allergies",
                "conditions",
                "treatment_plan",
                "referral_plan",
                "clinical_summary",
            ]
        );
    }
}
