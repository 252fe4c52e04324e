//! # Health Crew
//!
//! A sequential multi-agent clinical decision-support pipeline.
//!
//! This library provides:
//! - A fixed care-team pipeline (triage, optional imaging, history, treatment,
//!   referral, drug safety, follow-up, patient communication)
//! - Stub clinical tools with fail-soft behavior, plus a vision-model imaging toolkit
//! - A tool-based agent loop over an OpenAI-compatible chat API
//! - An HTTP API for running the pipeline and invoking tools directly
//!
//! ## Architecture
//!
//! Each stage follows the "tools in a loop" pattern:
//! 1. Render the stage's task template from caller inputs
//! 2. Append every earlier stage's output as context
//! 3. Call the LLM with the agent's permitted tools, executing any tool calls
//! 4. Record the final answer and move to the next stage
//!
//! Output from these tools is decision support for licensed clinicians, not
//! a diagnosis.
//!
//! ## Example
//!
//! ```rust,ignore
//! use health_crew::{config::Config, pipeline::build_diagnosis_pipeline};
//!
//! let config = Config::from_env()?;
//! let pipeline = build_diagnosis_pipeline(config.verbose, false);
//! let run = runner.run(&pipeline, &inputs).await?;
//! println!("{}", run.final_output);
//! ```

pub mod agent;
pub mod api;
pub mod config;
pub mod llm;
pub mod pipeline;
pub mod tools;

pub use config::Config;
