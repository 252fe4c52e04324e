//! Health-record and scheduling integrations (stubs).

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};

use super::{text_arg, Tool, ToolContext, ToolId, ToolOutput};

const STUB_APPOINTMENT_DATE: &str = "2025-10-05";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatientRecord {
    pub patient_id: String,
    pub allergies: Vec<String>,
    pub chronic_conditions: Vec<String>,
    pub medications: Vec<String>,
    pub family_history: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppointmentConfirmation {
    pub specialty: String,
    pub urgency: String,
    pub scheduled: bool,
    pub date: String,
    pub notes: String,
}

/// Fetch a patient's EHR summary. Returns the same demo record for every id.
pub fn electronic_health_record_access(patient_id: &str) -> PatientRecord {
    tracing::info!("Accessing EHR for patient: {}", patient_id);
    PatientRecord {
        patient_id: patient_id.to_string(),
        allergies: vec!["penicillin".to_string()],
        chronic_conditions: vec!["hypertension".to_string()],
        medications: vec!["lisinopril".to_string()],
        family_history: vec!["diabetes".to_string()],
    }
}

/// Book an appointment with the demo scheduler.
pub fn appointment_scheduling(specialty: &str, urgency: &str) -> AppointmentConfirmation {
    tracing::info!(
        "Scheduling appointment for specialty={} urgency={}",
        specialty,
        urgency
    );
    AppointmentConfirmation {
        specialty: specialty.to_string(),
        urgency: urgency.to_string(),
        scheduled: true,
        date: STUB_APPOINTMENT_DATE.to_string(),
        notes: "Stubbed appointment scheduled via demo scheduler.".to_string(),
    }
}

pub struct ElectronicHealthRecordAccess;

#[async_trait]
impl Tool for ElectronicHealthRecordAccess {
    fn id(&self) -> ToolId {
        ToolId::ElectronicHealthRecordAccess
    }

    fn description(&self) -> &str {
        "Access a patient's electronic health record (allergies, chronic conditions, medications, family history)."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "patient_id": {
                    "type": "string",
                    "description": "Patient identifier"
                }
            },
            "required": ["patient_id"]
        })
    }

    async fn execute(&self, args: Value, _ctx: &ToolContext) -> ToolOutput {
        ToolOutput::structured(electronic_health_record_access(&text_arg(&args, "patient_id")))
    }
}

pub struct AppointmentScheduling;

#[async_trait]
impl Tool for AppointmentScheduling {
    fn id(&self) -> ToolId {
        ToolId::AppointmentScheduling
    }

    fn description(&self) -> &str {
        "Schedule an appointment with a healthcare provider for a specialty at a given urgency."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "specialty": {
                    "type": "string",
                    "description": "Specialty, e.g. cardiology or primary care"
                },
                "urgency": {
                    "type": "string",
                    "description": "Urgency, e.g. routine, urgent, emergent"
                }
            },
            "required": ["specialty", "urgency"]
        })
    }

    async fn execute(&self, args: Value, _ctx: &ToolContext) -> ToolOutput {
        ToolOutput::structured(appointment_scheduling(
            &text_arg(&args, "specialty"),
            &text_arg(&args, "urgency"),
        ))
    }
}
