//! Medical knowledge and clinical guideline lookups.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{text_arg, Tool, ToolContext, ToolId, ToolOutput};
use crate::config::GuidelinesConfig;

const GUIDELINES_TIMEOUT: Duration = Duration::from_secs(10);

/// Search medical knowledge for conditions and treatments (stub).
///
/// Empty input falls back to a generic subject so the agent always gets a
/// usable answer.
pub fn medical_knowledge_search(query: &str) -> String {
    let q = match query.trim() {
        "" => "presented symptoms",
        q => q,
    };
    tracing::info!("Searching medical knowledge for query: {}", q);
    format!(
        "Knowledge summary for {q}: consider common and serious differentials; correlate with vitals, \
         onset, red flags (fever, neuro deficits), and patient comorbidities. Use evidence-based \
         sources and confirm with clinical guidelines."
    )
}

#[derive(Debug, Deserialize)]
struct GuidelinesResponse {
    #[serde(default)]
    summary: Option<String>,
}

/// Retrieve clinical guidelines for a condition.
///
/// Queries the remote guideline service when one is configured and falls
/// back to a local summary on any failure.
pub async fn clinical_guidelines_search(
    condition: &str,
    config: &GuidelinesConfig,
    http: &reqwest::Client,
) -> String {
    let cond = match condition.trim() {
        "" => "the presented symptoms",
        c => c,
    };
    tracing::info!("Retrieving clinical guidelines for: {}", cond);

    if let Some((url, key)) = config.remote() {
        match fetch_remote_summary(url, key, cond, http).await {
            Ok(Some(summary)) => return format!("Guideline summary for {cond}: {summary}"),
            Ok(None) => tracing::warn!("Guidelines API response had no summary, using fallback"),
            Err(e) => tracing::warn!("Guidelines API call failed, using fallback. Error: {}", e),
        }
    }

    format!(
        "Guideline summary for {cond}: use evidence-based protocols; consider red flags, \
         patient comorbidities (e.g., hypertension), and follow-up within appropriate timelines."
    )
}

async fn fetch_remote_summary(
    base_url: &str,
    api_key: &str,
    condition: &str,
    http: &reqwest::Client,
) -> anyhow::Result<Option<String>> {
    let url = format!(
        "{}/guidelines?q={}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(condition)
    );

    let response = http
        .get(&url)
        .bearer_auth(api_key)
        .timeout(GUIDELINES_TIMEOUT)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(anyhow::anyhow!("non-OK status: {} {}", status, body));
    }

    let data: GuidelinesResponse = response.json().await?;
    Ok(data.summary.filter(|s| !s.trim().is_empty()))
}

pub struct MedicalKnowledgeSearch;

#[async_trait]
impl Tool for MedicalKnowledgeSearch {
    fn id(&self) -> ToolId {
        ToolId::MedicalKnowledgeSearch
    }

    fn description(&self) -> &str {
        "Search medical knowledge databases for conditions and treatments. Accepts any query text; an empty query returns general triage guidance."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Condition, symptom cluster, or treatment to look up"
                }
            }
        })
    }

    async fn execute(&self, args: Value, _ctx: &ToolContext) -> ToolOutput {
        ToolOutput::Text(medical_knowledge_search(&text_arg(&args, "query")))
    }
}

pub struct ClinicalGuidelinesSearch;

#[async_trait]
impl Tool for ClinicalGuidelinesSearch {
    fn id(&self) -> ToolId {
        ToolId::ClinicalGuidelinesSearch
    }

    fn description(&self) -> &str {
        "Retrieve clinical guidelines for a specific condition. Returns a short guideline summary."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "condition": {
                    "type": "string",
                    "description": "Condition or working diagnosis"
                }
            }
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolOutput {
        let condition = text_arg(&args, "condition");
        ToolOutput::Text(
            clinical_guidelines_search(&condition, &ctx.config.guidelines, &ctx.http).await,
        )
    }
}
