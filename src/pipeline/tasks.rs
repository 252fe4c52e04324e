//! Task declarations for the diagnosis pipeline.

use serde::Serialize;

use crate::agent::{
    AgentDef, COMMUNICATION_AGENT, HISTORY_REVIEWER, IMAGING_ANALYST, INTERACTION_CHECKER,
    REFERRAL_AGENT, SCHEDULER_AGENT, SYMPTOM_ANALYZER, TREATMENT_AGENT,
};

use super::template;

/// A unit of work: a prompt template bound to the agent that performs it.
#[derive(Debug)]
pub struct TaskDef {
    pub id: &'static str,
    /// Prompt template with `{name}` placeholders.
    pub description: &'static str,
    pub agent: &'static AgentDef,
    pub expected_output: &'static str,
}

impl TaskDef {
    /// Placeholder names the description references.
    pub fn placeholders(&self) -> Vec<&'static str> {
        template::placeholders(self.description)
    }

    pub fn descriptor(&self) -> TaskDescriptor {
        TaskDescriptor {
            id: self.id,
            agent: self.agent.id,
            role: self.agent.role,
            tools: self.agent.tools.iter().map(|t| t.as_str()).collect(),
            allow_delegation: self.agent.allow_delegation,
            placeholders: self.placeholders(),
            expected_output: self.expected_output,
        }
    }
}

/// Serializable summary of a task and its agent.
#[derive(Debug, Clone, Serialize)]
pub struct TaskDescriptor {
    pub id: &'static str,
    pub agent: &'static str,
    pub role: &'static str,
    pub tools: Vec<&'static str>,
    pub allow_delegation: bool,
    pub placeholders: Vec<&'static str>,
    pub expected_output: &'static str,
}

pub static SYMPTOM_ANALYSIS: TaskDef = TaskDef {
    id: "symptom_analysis",
    description: "Analyze the patient's presented symptoms:\n\
                  - Categorize and prioritize symptoms\n\
                  - Assess severity and urgency\n\
                  - Identify potential conditions\n\
                  - Flag any emergency conditions\n\n\
                  Patient Symptoms: {symptoms}\n\
                  Demographics: {demographics}\n",
    agent: &SYMPTOM_ANALYZER,
    expected_output: "Structured symptom analysis with differential diagnosis list",
};

pub static IMAGING_ANALYSIS: TaskDef = TaskDef {
    id: "imaging_analysis",
    description: "Analyze the patient's medical imaging in light of the presenting complaint:\n\
                  - Run image analysis on the provided study\n\
                  - Compare with prior imaging when a previous study is referenced\n\
                  - Extract key findings and flag critical ones\n\
                  - Relate findings to the reported symptoms\n\n\
                  Image Path: {image_path}\n\
                  Patient Symptoms: {symptoms}\n\
                  Demographics: {demographics}\n",
    agent: &IMAGING_ANALYST,
    expected_output: "Imaging findings summary with critical findings and their clinical relevance",
};

pub static HISTORY_REVIEW: TaskDef = TaskDef {
    id: "history_review",
    description: "Review patient medical history:\n\
                  - Analyze past conditions and treatments\n\
                  - Identify risk factors and contraindications\n\
                  - Review medication history and allergies\n\
                  - Assess family history relevance\n\n\
                  History: {history}\n\
                  Current Medications: {medications}\n",
    agent: &HISTORY_REVIEWER,
    expected_output: "Comprehensive medical history summary with risk assessment",
};

pub static TREATMENT_RECOMMENDATION: TaskDef = TaskDef {
    id: "treatment_recommendation",
    description: "Generate evidence-based treatment recommendations:\n\
                  - Develop treatment plan options\n\
                  - Consider patient-specific factors\n\
                  - Include medication recommendations\n\
                  - Specify monitoring requirements\n\n\
                  Working Differential: {working_differential}\n",
    agent: &TREATMENT_AGENT,
    expected_output: "Detailed treatment plan with alternatives and monitoring",
};

pub static REFERRAL_ASSESSMENT: TaskDef = TaskDef {
    id: "referral_assessment",
    description: "Assess need for specialist consultation and referral urgency based on:\n\
                  - Conditions and risk\n\
                  - Availability\n\
                  - Appropriate specialty\n\n\
                  Diagnosis Summary: {diagnosis_summary}\n",
    agent: &REFERRAL_AGENT,
    expected_output: "Referral plan with specialty, urgency, and any scheduling steps",
};

pub static DRUG_SAFETY_CHECK: TaskDef = TaskDef {
    id: "drug_safety_check",
    description: "Perform drug interaction and contraindication checks for the proposed plan.\n\
                  Proposed Medications: {proposed_medications}\n\
                  Allergies: {allergies}\n\
                  Conditions: {conditions}\n",
    agent: &INTERACTION_CHECKER,
    expected_output: "List of interaction warnings, contraindications, and dosing considerations",
};

pub static FOLLOW_UP_SCHEDULING: TaskDef = TaskDef {
    id: "follow_up_scheduling",
    description: "Schedule appropriate follow-up care and monitoring.\n\
                  Treatment Plan: {treatment_plan}\n\
                  Referral Plan: {referral_plan}\n",
    agent: &SCHEDULER_AGENT,
    expected_output: "Follow-up schedule, reminders, and monitoring checkpoints",
};

pub static PATIENT_COMMUNICATION: TaskDef = TaskDef {
    id: "patient_communication",
    description: "Translate the clinical plan into clear patient guidance including:\n\
                  - What to do now\n\
                  - What to watch for (red flags)\n\
                  - When to seek help\n\
                  - Follow-up expectations\n\n\
                  Clinical Summary: {clinical_summary}\n",
    agent: &COMMUNICATION_AGENT,
    expected_output: "Clear, empathetic patient-facing instructions and summary",
};
