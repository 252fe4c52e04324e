//! Tools agents may invoke during a task.
//!
//! Every tool follows the same contract: it never fails its caller. Internal
//! problems (bad arguments, unreachable services, unreadable files) come back
//! as a fallback text or a `{"status": "failed", "error": ...}` value. The
//! only errors [`ToolRegistry::execute`] reports are dispatch errors.

mod imaging;
mod knowledge;
mod pharmacy;
mod records;
mod safety;
mod vision;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::config::Config;
use crate::llm::ToolDefinition;

pub use imaging::{
    compare_imaging_timeline, extract_imaging_findings, medical_image_analysis,
    CompareImagingTimeline, ExtractImagingFindings, MedicalImageAnalysis,
};
pub use knowledge::{
    clinical_guidelines_search, medical_knowledge_search, ClinicalGuidelinesSearch,
    MedicalKnowledgeSearch,
};
pub use pharmacy::{drug_interaction_check, DrugInteractionCheck, InteractionReport, Severity};
pub use records::{
    appointment_scheduling, electronic_health_record_access, AppointmentConfirmation,
    AppointmentScheduling, ElectronicHealthRecordAccess, PatientRecord,
};
pub use safety::{
    emergency_alert_system, validate_medical_recommendation, EmergencyAlertSystem,
    ValidateMedicalRecommendation,
};
pub use vision::{GeminiVision, VisionPart};

/// Closed set of tool identifiers an agent can be granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolId {
    MedicalKnowledgeSearch,
    DrugInteractionCheck,
    ClinicalGuidelinesSearch,
    ElectronicHealthRecordAccess,
    AppointmentScheduling,
    ValidateMedicalRecommendation,
    EmergencyAlertSystem,
    MedicalImageAnalysis,
    CompareImagingTimeline,
    ExtractImagingFindings,
}

impl ToolId {
    pub const ALL: [ToolId; 10] = [
        ToolId::MedicalKnowledgeSearch,
        ToolId::DrugInteractionCheck,
        ToolId::ClinicalGuidelinesSearch,
        ToolId::ElectronicHealthRecordAccess,
        ToolId::AppointmentScheduling,
        ToolId::ValidateMedicalRecommendation,
        ToolId::EmergencyAlertSystem,
        ToolId::MedicalImageAnalysis,
        ToolId::CompareImagingTimeline,
        ToolId::ExtractImagingFindings,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ToolId::MedicalKnowledgeSearch => "medical_knowledge_search",
            ToolId::DrugInteractionCheck => "drug_interaction_check",
            ToolId::ClinicalGuidelinesSearch => "clinical_guidelines_search",
            ToolId::ElectronicHealthRecordAccess => "electronic_health_record_access",
            ToolId::AppointmentScheduling => "appointment_scheduling",
            ToolId::ValidateMedicalRecommendation => "validate_medical_recommendation",
            ToolId::EmergencyAlertSystem => "emergency_alert_system",
            ToolId::MedicalImageAnalysis => "medical_image_analysis",
            ToolId::CompareImagingTimeline => "compare_imaging_timeline",
            ToolId::ExtractImagingFindings => "extract_imaging_findings",
        }
    }

    /// Tools that read image files from the local filesystem.
    pub fn reads_files(self) -> bool {
        matches!(
            self,
            ToolId::MedicalImageAnalysis | ToolId::CompareImagingTimeline
        )
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown tool: {}", s))
    }
}

/// Result of a tool call: plain text or a JSON mapping.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ToolOutput {
    Text(String),
    Structured(Value),
}

impl ToolOutput {
    pub fn structured(value: impl Serialize) -> Self {
        match serde_json::to_value(value) {
            Ok(v) => ToolOutput::Structured(v),
            Err(e) => ToolOutput::Text(format!("Error: failed to serialize tool result: {}", e)),
        }
    }

    /// Render for the model: text as-is, mappings as compact JSON.
    pub fn to_model_string(&self) -> String {
        match self {
            ToolOutput::Text(text) => text.clone(),
            ToolOutput::Structured(value) => value.to_string(),
        }
    }

    pub fn as_structured(&self) -> Option<&Value> {
        match self {
            ToolOutput::Structured(value) => Some(value),
            ToolOutput::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ToolOutput::Text(text) => Some(text),
            ToolOutput::Structured(_) => None,
        }
    }
}

/// Shared resources handed to every tool call.
#[derive(Clone)]
pub struct ToolContext {
    pub config: Arc<Config>,
    pub http: reqwest::Client,
}

impl ToolContext {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }
}

/// A callable tool exposed to agents.
#[async_trait]
pub trait Tool: Send + Sync {
    fn id(&self) -> ToolId;

    fn description(&self) -> &str;

    /// JSON schema of the arguments object.
    fn parameters_schema(&self) -> Value;

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolOutput;
}

/// Name and description of a registered tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: &'static str,
    pub description: String,
    pub parameters: Value,
}

/// All tools known to the pipeline, addressable by name.
pub struct ToolRegistry {
    tools: HashMap<ToolId, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            tools: HashMap::new(),
        };
        registry.register(Box::new(MedicalKnowledgeSearch));
        registry.register(Box::new(DrugInteractionCheck));
        registry.register(Box::new(ClinicalGuidelinesSearch));
        registry.register(Box::new(ElectronicHealthRecordAccess));
        registry.register(Box::new(AppointmentScheduling));
        registry.register(Box::new(ValidateMedicalRecommendation));
        registry.register(Box::new(EmergencyAlertSystem));
        registry.register(Box::new(MedicalImageAnalysis));
        registry.register(Box::new(CompareImagingTimeline));
        registry.register(Box::new(ExtractImagingFindings));
        registry
    }

    fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.insert(tool.id(), tool);
    }

    /// List every tool, ordered by identifier.
    pub fn list_tools(&self) -> Vec<ToolInfo> {
        ToolId::ALL
            .into_iter()
            .filter_map(|id| self.tools.get(&id))
            .map(|tool| ToolInfo {
                name: tool.id().as_str(),
                description: tool.description().to_string(),
                parameters: tool.parameters_schema(),
            })
            .collect()
    }

    /// Schemas for a subset of tools, in the order given.
    pub fn get_tool_schemas(&self, ids: &[ToolId]) -> Vec<ToolDefinition> {
        ids.iter()
            .filter_map(|id| self.tools.get(id))
            .map(|tool| ToolDefinition {
                name: tool.id().as_str().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters_schema(),
            })
            .collect()
    }

    /// Execute a tool by name.
    pub async fn execute(
        &self,
        name: &str,
        args: Value,
        ctx: &ToolContext,
    ) -> anyhow::Result<ToolOutput> {
        let id: ToolId = name.parse()?;
        let tool = self
            .tools
            .get(&id)
            .ok_or_else(|| anyhow::anyhow!("Tool not registered: {}", name))?;
        Ok(tool.execute(args, ctx).await)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Coerce an arbitrary JSON value into argument text.
///
/// Strings are taken as-is, `null` becomes empty, anything else is
/// rendered as JSON.
pub(crate) fn coerce_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Pull the main text argument out of a call.
///
/// Models sometimes send a bare value instead of an object; that value is
/// used directly.
pub(crate) fn text_arg(args: &Value, key: &str) -> String {
    match args {
        Value::Object(map) => coerce_text(map.get(key)),
        other => coerce_text(Some(other)),
    }
}

/// Optional string argument; empty strings count as absent.
pub(crate) fn optional_text_arg(args: &Value, key: &str) -> Option<String> {
    args.get(key)
        .map(|v| coerce_text(Some(v)))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> ToolContext {
        ToolContext::new(Arc::new(Config::default()))
    }

    #[test]
    fn tool_ids_round_trip_through_names() {
        for id in ToolId::ALL {
            assert_eq!(id.as_str().parse::<ToolId>().unwrap(), id);
        }
        assert!("web_search".parse::<ToolId>().is_err());
    }

    #[test]
    fn registry_lists_every_tool() {
        let registry = ToolRegistry::new();
        let names: Vec<_> = registry.list_tools().iter().map(|t| t.name).collect();
        assert_eq!(names.len(), ToolId::ALL.len());
        assert_eq!(names[0], "medical_knowledge_search");
    }

    #[test]
    fn schemas_follow_requested_order() {
        let registry = ToolRegistry::new();
        let schemas = registry.get_tool_schemas(&[
            ToolId::ValidateMedicalRecommendation,
            ToolId::ClinicalGuidelinesSearch,
        ]);
        let names: Vec<_> = schemas.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["validate_medical_recommendation", "clinical_guidelines_search"]
        );
        assert_eq!(schemas[0].parameters["type"], "object");
    }

    #[tokio::test]
    async fn execute_dispatches_by_name() {
        let registry = ToolRegistry::new();
        let output = registry
            .execute(
                "drug_interaction_check",
                json!({"medications": ["Aspirin", "IBUPROFEN"]}),
                &ctx(),
            )
            .await
            .unwrap();
        assert_eq!(output.as_structured().unwrap()["severity"], "moderate");
    }

    #[tokio::test]
    async fn execute_rejects_unknown_tool() {
        let registry = ToolRegistry::new();
        let err = registry
            .execute("prescribe_anything", json!({}), &ctx())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Unknown tool"));
    }

    #[test]
    fn text_arg_accepts_bare_values_and_non_strings() {
        assert_eq!(text_arg(&json!({"query": "chest pain"}), "query"), "chest pain");
        assert_eq!(text_arg(&json!({"query": 42}), "query"), "42");
        assert_eq!(text_arg(&json!({"query": null}), "query"), "");
        assert_eq!(text_arg(&json!("headache"), "query"), "headache");
        assert_eq!(text_arg(&Value::Null, "query"), "");
    }

    #[test]
    fn model_string_renders_structured_output_as_json() {
        let output = ToolOutput::structured(json!({"scheduled": true}));
        assert_eq!(output.to_model_string(), "{\"scheduled\":true}");
        assert_eq!(ToolOutput::Text("ok".into()).to_model_string(), "ok");
    }
}
