//! Medical imaging tools backed by the Gemini vision model.
//!
//! Results are JSON mappings with a `status` of `"success"` or `"failed"`;
//! failures carry an `error` string instead of aborting the agent.

use std::path::Path;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::vision::{GeminiVision, VisionPart};
use super::{optional_text_arg, text_arg, Tool, ToolContext, ToolId, ToolOutput};
use crate::config::VisionConfig;

const ANALYSIS_PROMPT: &str = r#"You are a highly skilled medical imaging expert with extensive knowledge in radiology and diagnostic imaging.

Analyze this medical image and provide a structured response:

### 1. Image Type & Region
- Specify imaging modality (X-ray/MRI/CT/Ultrasound/etc.)
- Identify anatomical region and positioning
- Comment on image quality and technical adequacy

### 2. Key Findings
- List primary observations systematically
- Note any abnormalities with precise descriptions
- Include measurements and densities where relevant
- Describe location, size, shape, and characteristics
- Rate severity: Normal/Mild/Moderate/Severe

### 3. Diagnostic Assessment
- Provide primary diagnosis with confidence level (Low/Medium/High)
- List differential diagnoses in order of likelihood
- Support each diagnosis with observed evidence
- Note any critical or urgent findings

### 4. Patient-Friendly Explanation
- Explain findings in simple, clear language
- Avoid medical jargon or provide clear definitions
- Address common patient concerns

"#;

const ANALYSIS_FORMAT: &str = r#"Format your response as valid JSON with these keys:
- image_type: {modality, region, quality}
- findings: [list of observations with severity]
- assessment: {primary_diagnosis, confidence, differentials, critical_flags}
- patient_explanation: string
- severity: "Normal"/"Mild"/"Moderate"/"Severe"
"#;

const COMPARISON_PROMPT: &str = r#"You are a medical imaging expert comparing sequential medical images.

Analyze these images chronologically and provide:

### 1. Temporal Comparison
- Describe changes between images
- Note progression, improvement, or stability
- Highlight new findings or resolved conditions

### 2. Clinical Significance
- Assess disease progression or treatment response
- Rate change: Improved/Stable/Worsened
- Recommend follow-up imaging timeline

### 3. Summary
- Concise clinical summary of imaging timeline
- Recommendations for ongoing monitoring

"#;

fn context_section(patient_context: &str) -> String {
    if patient_context.trim().is_empty() {
        String::new()
    } else {
        format!("### Patient Context\n{}\n\n", patient_context.trim())
    }
}

/// Reject a path that resolves outside the configured image root.
async fn check_image_root(image_path: &str, vision: &VisionConfig) -> anyhow::Result<()> {
    let Some(root) = &vision.image_root else {
        return Ok(());
    };
    let root = tokio::fs::canonicalize(root)
        .await
        .map_err(|e| anyhow::anyhow!("Image root {} is unavailable: {}", root.display(), e))?;
    let resolved = tokio::fs::canonicalize(image_path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", image_path, e))?;
    if !resolved.starts_with(&root) {
        tracing::warn!("Refusing image outside {}: {}", root.display(), image_path);
        anyhow::bail!("Image path outside allowed root: {}", image_path);
    }
    Ok(())
}

/// Analyze a single medical image (X-ray, MRI, CT scan).
///
/// A missing file, or one outside `vision.image_root`, is reported without
/// contacting the vision service.
pub async fn medical_image_analysis(
    image_path: &str,
    patient_context: &str,
    vision: &VisionConfig,
    http: &reqwest::Client,
) -> Value {
    if !Path::new(image_path).exists() {
        return json!({
            "error": format!("Image file not found: {}", image_path),
            "status": "failed",
        });
    }

    match analyze(image_path, patient_context, vision, http).await {
        Ok(result) => {
            tracing::info!("Medical image analysis completed successfully");
            result
        }
        Err(e) => {
            tracing::error!("Medical image analysis failed: {}", e);
            json!({
                "error": e.to_string(),
                "status": "failed",
                "image_path": image_path,
            })
        }
    }
}

async fn analyze(
    image_path: &str,
    patient_context: &str,
    vision: &VisionConfig,
    http: &reqwest::Client,
) -> anyhow::Result<Value> {
    check_image_root(image_path, vision).await?;
    let model = GeminiVision::configure(vision, http)?;

    let prompt = format!(
        "{}{}{}",
        ANALYSIS_PROMPT,
        context_section(patient_context),
        ANALYSIS_FORMAT
    );

    tracing::info!("Analyzing medical image: {}", image_path);
    let image = tokio::fs::read(image_path).await?;

    let analysis = model
        .generate_content(&[VisionPart::Text(prompt), VisionPart::jpeg(image)])
        .await?;

    Ok(json!({
        "status": "success",
        "analysis": analysis,
        "image_path": image_path,
        "model_used": model.model(),
    }))
}

/// Compare a current image with an earlier one to track progression.
///
/// Without a previous image this is exactly [`medical_image_analysis`].
pub async fn compare_imaging_timeline(
    current_image_path: &str,
    previous_image_path: Option<&str>,
    patient_context: &str,
    vision: &VisionConfig,
    http: &reqwest::Client,
) -> Value {
    let previous = match previous_image_path.map(str::trim).filter(|p| !p.is_empty()) {
        Some(previous) => previous,
        None => return medical_image_analysis(current_image_path, patient_context, vision, http).await,
    };

    match compare(current_image_path, previous, patient_context, vision, http).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!("Image comparison failed: {}", e);
            json!({
                "error": e.to_string(),
                "status": "failed",
            })
        }
    }
}

async fn compare(
    current: &str,
    previous: &str,
    patient_context: &str,
    vision: &VisionConfig,
    http: &reqwest::Client,
) -> anyhow::Result<Value> {
    check_image_root(previous, vision).await?;
    check_image_root(current, vision).await?;
    let model = GeminiVision::configure(vision, http)?;

    let prompt = format!("{}{}", COMPARISON_PROMPT, context_section(patient_context));

    tracing::info!("Comparing images: {} -> {}", previous, current);
    let previous_data = tokio::fs::read(previous)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", previous, e))?;
    let current_data = tokio::fs::read(current)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", current, e))?;

    let comparison = model
        .generate_content(&[
            VisionPart::Text(prompt),
            VisionPart::Text("Previous Image:".to_string()),
            VisionPart::jpeg(previous_data),
            VisionPart::Text("Current Image:".to_string()),
            VisionPart::jpeg(current_data),
        ])
        .await?;

    Ok(json!({
        "status": "success",
        "comparison": comparison,
        "previous_image": previous,
        "current_image": current,
        "model_used": model.model(),
    }))
}

/// Summarize an analysis (or comparison) result for humans.
pub fn extract_imaging_findings(analysis_result: &Value) -> String {
    let Some(result) = analysis_result.as_object() else {
        tracing::error!("Failed to extract imaging findings: result is not a mapping");
        return "Error extracting findings: analysis result is not a mapping".to_string();
    };

    let field = |key: &str| result.get(key).and_then(Value::as_str);

    if field("status") == Some("failed") {
        return format!(
            "Imaging analysis failed: {}",
            field("error").unwrap_or("Unknown error")
        );
    }

    let body = field("analysis").or_else(|| field("comparison")).unwrap_or("");

    format!(
        "### Medical Imaging Summary\n\n\
         **Status**: {}\n\
         **Model**: {}\n\n\
         {}\n\n\
         ---\n\
         *This analysis was generated by AI and should be reviewed by a qualified radiologist.*",
        field("status").unwrap_or("unknown"),
        field("model_used").unwrap_or("N/A"),
        body
    )
}

pub struct MedicalImageAnalysis;

#[async_trait]
impl Tool for MedicalImageAnalysis {
    fn id(&self) -> ToolId {
        ToolId::MedicalImageAnalysis
    }

    fn description(&self) -> &str {
        "Analyze a medical image (X-ray, MRI, CT scan) with a vision model. Returns modality, findings, assessment, and a patient-friendly explanation."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "image_path": {
                    "type": "string",
                    "description": "Path to the medical image file"
                },
                "patient_context": {
                    "type": "string",
                    "description": "Optional symptoms, demographics, and history"
                }
            },
            "required": ["image_path"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolOutput {
        let image_path = text_arg(&args, "image_path");
        let patient_context = optional_text_arg(&args, "patient_context").unwrap_or_default();
        ToolOutput::Structured(
            medical_image_analysis(&image_path, &patient_context, &ctx.config.vision, &ctx.http)
                .await,
        )
    }
}

pub struct CompareImagingTimeline;

#[async_trait]
impl Tool for CompareImagingTimeline {
    fn id(&self) -> ToolId {
        ToolId::CompareImagingTimeline
    }

    fn description(&self) -> &str {
        "Compare a current medical image with a previous one to track disease progression. Without a previous image, analyzes the current image alone."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "current_image_path": {
                    "type": "string",
                    "description": "Path to the current image"
                },
                "previous_image_path": {
                    "type": "string",
                    "description": "Optional path to the earlier image"
                },
                "patient_context": {
                    "type": "string",
                    "description": "Patient context and history"
                }
            },
            "required": ["current_image_path"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolOutput {
        let current = text_arg(&args, "current_image_path");
        let previous = optional_text_arg(&args, "previous_image_path");
        let patient_context = optional_text_arg(&args, "patient_context").unwrap_or_default();
        ToolOutput::Structured(
            compare_imaging_timeline(
                &current,
                previous.as_deref(),
                &patient_context,
                &ctx.config.vision,
                &ctx.http,
            )
            .await,
        )
    }
}

pub struct ExtractImagingFindings;

#[async_trait]
impl Tool for ExtractImagingFindings {
    fn id(&self) -> ToolId {
        ToolId::ExtractImagingFindings
    }

    fn description(&self) -> &str {
        "Summarize the key findings of a previous imaging analysis result into a readable report."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "analysis_result": {
                    "type": "object",
                    "description": "Result returned by medical_image_analysis or compare_imaging_timeline"
                }
            },
            "required": ["analysis_result"]
        })
    }

    async fn execute(&self, args: Value, _ctx: &ToolContext) -> ToolOutput {
        let result = match args.get("analysis_result").cloned() {
            Some(Value::String(raw)) => serde_json::from_str(&raw).unwrap_or(Value::String(raw)),
            Some(inner) => inner,
            None => args,
        };
        ToolOutput::Text(extract_imaging_findings(&result))
    }
}
