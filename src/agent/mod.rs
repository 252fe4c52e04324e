//! Agent module - care-team personas and the per-task agent loop.
//!
//! Each task runs the "tools in a loop" pattern:
//! 1. Build context with the agent's persona and the rendered task
//! 2. Call the LLM with the agent's permitted tools
//! 3. If the LLM requests a tool call, execute it and feed the result back
//! 4. Repeat until the LLM produces a final answer or max iterations is reached

mod agent_loop;
mod definitions;
mod prompt;

pub use agent_loop::{AgentExecutor, TaskOutcome};
pub use definitions::{
    AgentDef, COMMUNICATION_AGENT, HISTORY_REVIEWER, IMAGING_ANALYST, INTERACTION_CHECKER,
    REFERRAL_AGENT, SCHEDULER_AGENT, SYMPTOM_ANALYZER, TREATMENT_AGENT,
};
pub use prompt::{build_system_prompt, build_task_prompt};

/// Pseudo-tool offered to agents that may delegate.
pub const DELEGATE_TOOL: &str = "delegate_work";
