//! The care-team roster.

use crate::tools::ToolId;

/// A role-playing agent: persona plus the closed set of tools it may call.
#[derive(Debug)]
pub struct AgentDef {
    pub id: &'static str,
    pub role: &'static str,
    pub goal: &'static str,
    pub backstory: &'static str,
    pub tools: &'static [ToolId],
    /// May ask coworkers in the same pipeline for help.
    pub allow_delegation: bool,
}

impl AgentDef {
    pub fn can_use(&self, tool: ToolId) -> bool {
        self.tools.contains(&tool)
    }
}

pub static SYMPTOM_ANALYZER: AgentDef = AgentDef {
    id: "symptom_analyzer",
    role: "Medical Symptom Analyst",
    goal: "Analyze patient symptoms and identify potential conditions",
    backstory: "Expert in symptom pattern recognition with deep knowledge of medical conditions, \
                differential diagnosis, and symptom clustering.",
    tools: &[ToolId::MedicalKnowledgeSearch, ToolId::EmergencyAlertSystem],
    allow_delegation: true,
};

pub static IMAGING_ANALYST: AgentDef = AgentDef {
    id: "imaging_analyst",
    role: "Medical Imaging Analyst",
    goal: "Interpret medical images and relate imaging findings to the clinical picture",
    backstory: "Radiology specialist experienced with X-ray, CT, and MRI interpretation, \
                longitudinal comparison of studies, and clear reporting of critical findings.",
    tools: &[
        ToolId::MedicalImageAnalysis,
        ToolId::CompareImagingTimeline,
        ToolId::ExtractImagingFindings,
    ],
    allow_delegation: false,
};

pub static HISTORY_REVIEWER: AgentDef = AgentDef {
    id: "history_reviewer",
    role: "Medical History Analyst",
    goal: "Comprehensively review patient medical history for relevant factors",
    backstory: "Specialized in analyzing patient histories, identifying risk factors, contraindications, \
                and relevant past conditions.",
    tools: &[ToolId::ElectronicHealthRecordAccess],
    allow_delegation: false,
};

pub static TREATMENT_AGENT: AgentDef = AgentDef {
    id: "treatment_agent",
    role: "Treatment Recommendation Specialist",
    goal: "Provide evidence-based treatment recommendations",
    backstory: "Expert in clinical guidelines, treatment protocols, and evidence-based medicine \
                with focus on personalized care.",
    tools: &[
        ToolId::ClinicalGuidelinesSearch,
        ToolId::ValidateMedicalRecommendation,
    ],
    allow_delegation: true,
};

pub static REFERRAL_AGENT: AgentDef = AgentDef {
    id: "referral_agent",
    role: "Specialist Referral Coordinator",
    goal: "Determine appropriate specialist referrals and urgency",
    backstory: "Expert in medical specialties, referral criteria, and healthcare system navigation.",
    tools: &[ToolId::AppointmentScheduling],
    allow_delegation: false,
};

pub static INTERACTION_CHECKER: AgentDef = AgentDef {
    id: "interaction_checker",
    role: "Pharmaceutical Safety Analyst",
    goal: "Ensure medication safety through comprehensive interaction analysis",
    backstory: "Pharmacology expert specializing in drug interactions, contraindications, and adverse \
                effect monitoring.",
    tools: &[
        ToolId::DrugInteractionCheck,
        ToolId::ValidateMedicalRecommendation,
    ],
    allow_delegation: false,
};

pub static SCHEDULER_AGENT: AgentDef = AgentDef {
    id: "scheduler_agent",
    role: "Care Coordination Scheduler",
    goal: "Schedule appropriate follow-up care and monitoring",
    backstory: "Healthcare coordinator expert in treatment timelines, monitoring schedules, and care \
                continuity.",
    tools: &[ToolId::AppointmentScheduling],
    allow_delegation: false,
};

pub static COMMUNICATION_AGENT: AgentDef = AgentDef {
    id: "communication_agent",
    role: "Patient Communication Specialist",
    goal: "Translate medical information into clear, actionable patient guidance",
    backstory: "Expert in medical communication, patient education, and health literacy with focus on \
                clear, empathetic communication.",
    tools: &[],
    allow_delegation: false,
};
