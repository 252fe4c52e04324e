//! Drug interaction checking (stub).

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};

use super::{coerce_text, Tool, ToolContext, ToolId, ToolOutput};

/// Known interacting pair: (first, second, warning).
const INTERACTIONS: &[(&str, &str, &str)] = &[(
    "ibuprofen",
    "aspirin",
    "Caution combining ibuprofen and aspirin due to antiplatelet effect interference.",
)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Moderate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InteractionReport {
    pub warnings: Vec<String>,
    pub severity: Severity,
}

/// Check a medication list for known interactions.
///
/// Matching is case-insensitive on exact names; surrounding whitespace counts.
pub fn drug_interaction_check<S: AsRef<str>>(medications: &[S]) -> InteractionReport {
    let names: Vec<String> = medications
        .iter()
        .map(|m| m.as_ref().to_lowercase())
        .collect();
    tracing::info!("Checking drug interactions for: {:?}", names);

    let warnings: Vec<String> = INTERACTIONS
        .iter()
        .filter(|(a, b, _)| names.iter().any(|n| n == a) && names.iter().any(|n| n == b))
        .map(|(_, _, warning)| warning.to_string())
        .collect();

    let severity = if warnings.is_empty() {
        Severity::Low
    } else {
        Severity::Moderate
    };

    InteractionReport { warnings, severity }
}

pub struct DrugInteractionCheck;

#[async_trait]
impl Tool for DrugInteractionCheck {
    fn id(&self) -> ToolId {
        ToolId::DrugInteractionCheck
    }

    fn description(&self) -> &str {
        "Check a list of medications for drug interactions and contraindications. Returns warnings and an overall severity (low or moderate)."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "medications": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Medication names"
                }
            },
            "required": ["medications"]
        })
    }

    async fn execute(&self, args: Value, _ctx: &ToolContext) -> ToolOutput {
        let list = match &args {
            Value::Object(map) => map.get("medications").cloned().unwrap_or(Value::Null),
            other => other.clone(),
        };
        let medications: Vec<String> = match list {
            Value::Array(items) => items.iter().map(|v| coerce_text(Some(v))).collect(),
            // Comma-separated text is a common model shortcut.
            Value::String(s) => s.split(',').map(|m| m.trim().to_string()).collect(),
            _ => Vec::new(),
        };
        ToolOutput::structured(drug_interaction_check(&medications))
    }
}
