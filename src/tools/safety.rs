//! Safety validation and emergency alerting.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{text_arg, Tool, ToolContext, ToolId, ToolOutput};

/// Validate a recommendation against basic safety rules.
///
/// Fails on any medication with a negative `dose_mg`. A non-numeric dose or a
/// recommendation that cannot be inspected (wrong shape) also fails.
pub fn validate_medical_recommendation(recommendation: &Value) -> bool {
    match check_doses(recommendation) {
        Ok(valid) => valid,
        Err(e) => {
            tracing::error!("Validation error: {}", e);
            false
        }
    }
}

fn check_doses(recommendation: &Value) -> anyhow::Result<bool> {
    let obj = recommendation
        .as_object()
        .ok_or_else(|| anyhow::anyhow!("recommendation is not an object"))?;

    let meds = match obj.get("medications") {
        None | Some(Value::Null) => return Ok(true),
        Some(Value::Array(meds)) => meds,
        Some(_) => return Err(anyhow::anyhow!("'medications' is not a list")),
    };

    for med in meds {
        let med_obj = med
            .as_object()
            .ok_or_else(|| anyhow::anyhow!("medication entry is not an object: {}", med))?;
        let dose = match med_obj.get("dose_mg") {
            None | Some(Value::Null) => continue,
            Some(raw) => raw
                .as_f64()
                .ok_or_else(|| anyhow::anyhow!("dose_mg is not a number: {}", med))?,
        };
        if dose < 0.0 {
            tracing::warn!("Invalid negative dosage detected: {}", med);
            return Ok(false);
        }
    }

    Ok(true)
}

/// Raise an alert for human physicians (stub: logs only).
pub fn emergency_alert_system(condition: &str) -> String {
    let message = format!(
        "EMERGENCY ALERT: Immediate physician review required for condition: {}",
        condition
    );
    tracing::error!("{}", message);
    message
}

pub struct ValidateMedicalRecommendation;

#[async_trait]
impl Tool for ValidateMedicalRecommendation {
    fn id(&self) -> ToolId {
        ToolId::ValidateMedicalRecommendation
    }

    fn description(&self) -> &str {
        "Validate a medical recommendation against safety protocols (dosage limits, contraindications). Returns true if it passes basic validation."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "recommendation": {
                    "type": "object",
                    "description": "Recommendation with a 'medications' list of {name, dose_mg}",
                    "properties": {
                        "medications": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "name": { "type": "string" },
                                    "dose_mg": { "type": "number" }
                                }
                            }
                        }
                    }
                }
            },
            "required": ["recommendation"]
        })
    }

    async fn execute(&self, args: Value, _ctx: &ToolContext) -> ToolOutput {
        // Accept both {"recommendation": {...}} and the recommendation itself.
        let recommendation = match args.get("recommendation").cloned() {
            Some(Value::String(raw)) => serde_json::from_str(&raw).unwrap_or(Value::Null),
            Some(inner) => inner,
            None => args,
        };
        ToolOutput::Structured(Value::Bool(validate_medical_recommendation(&recommendation)))
    }
}

pub struct EmergencyAlertSystem;

#[async_trait]
impl Tool for EmergencyAlertSystem {
    fn id(&self) -> ToolId {
        ToolId::EmergencyAlertSystem
    }

    fn description(&self) -> &str {
        "Alert human physicians about a potential emergency condition requiring immediate review."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "condition": {
                    "type": "string",
                    "description": "Suspected emergency condition"
                }
            },
            "required": ["condition"]
        })
    }

    async fn execute(&self, args: Value, _ctx: &ToolContext) -> ToolOutput {
        ToolOutput::Text(emergency_alert_system(&text_arg(&args, "condition")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::Config;

    #[test]
    fn negative_dose_fails() {
        let rec = json!({"medications": [
            {"name": "amoxicillin", "dose_mg": 500},
            {"name": "ibuprofen", "dose_mg": -200}
        ]});
        assert!(!validate_medical_recommendation(&rec));
    }

    #[test]
    fn non_negative_doses_pass() {
        let rec = json!({"medications": [
            {"name": "amoxicillin", "dose_mg": 500},
            {"name": "saline", "dose_mg": 0},
            {"name": "vitamin d"}
        ]});
        assert!(validate_medical_recommendation(&rec));
    }

    #[test]
    fn missing_medications_pass() {
        assert!(validate_medical_recommendation(&json!({"plan": "rest"})));
        assert!(validate_medical_recommendation(&json!({"medications": null})));
    }

    #[test]
    fn malformed_recommendation_fails() {
        assert!(!validate_medical_recommendation(&json!("take aspirin")));
        assert!(!validate_medical_recommendation(&json!({"medications": "aspirin"})));
        assert!(!validate_medical_recommendation(&json!({"medications": ["aspirin"]})));
    }

    #[test]
    fn non_numeric_dose_fails() {
        assert!(!validate_medical_recommendation(
            &json!({"medications": [{"name": "ibuprofen", "dose_mg": "-200"}]})
        ));
        assert!(!validate_medical_recommendation(
            &json!({"medications": [{"name": "ibuprofen", "dose_mg": "200"}]})
        ));
        assert!(validate_medical_recommendation(
            &json!({"medications": [{"name": "ibuprofen", "dose_mg": null}]})
        ));
    }

    #[test]
    fn alert_message_names_condition() {
        assert_eq!(
            emergency_alert_system("suspected stroke"),
            "EMERGENCY ALERT: Immediate physician review required for condition: suspected stroke"
        );
    }

    #[tokio::test]
    async fn tool_unwraps_recommendation_argument() {
        let ctx = ToolContext::new(Arc::new(Config::default()));
        let wrapped = json!({"recommendation": {"medications": [{"dose_mg": -1}]}});
        let bare = json!({"medications": [{"dose_mg": 10}]});
        let encoded = json!({"recommendation": "{\"medications\": [{\"dose_mg\": -5}]}"});

        let tool = ValidateMedicalRecommendation;
        assert_eq!(
            tool.execute(wrapped, &ctx).await,
            ToolOutput::Structured(Value::Bool(false))
        );
        assert_eq!(
            tool.execute(bare, &ctx).await,
            ToolOutput::Structured(Value::Bool(true))
        );
        assert_eq!(
            tool.execute(encoded, &ctx).await,
            ToolOutput::Structured(Value::Bool(false))
        );
    }
}
