//! Core agent loop implementation.

use std::sync::Arc;

use anyhow::{anyhow, bail};
use serde_json::{json, Value};

use crate::api::types::{LogEntryType, TaskLogEntry};
use crate::llm::{ChatMessage, LlmClient, Role, TokenUsage, ToolCall, ToolDefinition};
use crate::tools::{ToolContext, ToolId, ToolRegistry};

use super::prompt::{build_delegation_prompt, build_system_prompt, build_task_prompt};
use super::{AgentDef, DELEGATE_TOOL};

/// Result of one agent working one task.
#[derive(Debug, Clone)]
pub struct TaskOutcome {
    pub output: String,
    pub log: Vec<TaskLogEntry>,
    pub usage: TokenUsage,
}

/// Drives an agent through a task with its permitted tools.
pub struct AgentExecutor {
    llm: Arc<dyn LlmClient>,
    tools: Arc<ToolRegistry>,
    ctx: ToolContext,
    max_iterations: usize,
}

impl AgentExecutor {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        tools: Arc<ToolRegistry>,
        ctx: ToolContext,
        max_iterations: usize,
    ) -> Self {
        Self {
            llm,
            tools,
            ctx,
            max_iterations,
        }
    }

    pub fn model(&self) -> &str {
        self.llm.model()
    }

    /// Run a task and return the final answer and execution log.
    ///
    /// `coworkers` are the other agents of the pipeline; they are only
    /// offered when the agent allows delegation.
    pub async fn run_task(
        &self,
        agent: &AgentDef,
        description: &str,
        expected_output: &str,
        context: Option<&str>,
        coworkers: &[&AgentDef],
    ) -> anyhow::Result<TaskOutcome> {
        let mut log = Vec::new();
        let mut usage = TokenUsage::default();

        let coworkers: Vec<&AgentDef> = coworkers
            .iter()
            .copied()
            .filter(|c| c.id != agent.id)
            .collect();

        let mut tool_schemas = self.tools.get_tool_schemas(agent.tools);
        if agent.allow_delegation && !coworkers.is_empty() {
            tool_schemas.push(delegate_schema(&coworkers));
        }

        let system_prompt = build_system_prompt(agent, &tool_schemas, &coworkers);
        let task_prompt = build_task_prompt(description, expected_output, context);
        let mut messages = vec![
            ChatMessage::system(system_prompt),
            ChatMessage::user(task_prompt),
        ];

        for iteration in 0..self.max_iterations {
            tracing::debug!("{} iteration {}", agent.role, iteration + 1);

            let tools = (!tool_schemas.is_empty()).then_some(tool_schemas.as_slice());
            let response = self.llm.chat_completion(&messages, tools).await?;
            if let Some(turn) = response.usage {
                usage.add(turn);
            }

            if let Some(tool_calls) = &response.tool_calls {
                if !tool_calls.is_empty() {
                    messages.push(ChatMessage {
                        role: Role::Assistant,
                        content: response.content.clone(),
                        tool_calls: Some(tool_calls.clone()),
                        tool_call_id: None,
                    });

                    for tool_call in tool_calls {
                        let entry_type = if tool_call.function.name == DELEGATE_TOOL {
                            LogEntryType::Delegation
                        } else {
                            LogEntryType::ToolCall
                        };
                        log.push(TaskLogEntry::now(
                            entry_type,
                            format!(
                                "Calling tool: {} with args: {}",
                                tool_call.function.name, tool_call.function.arguments
                            ),
                        ));

                        let result_str =
                            match self
                                .execute_tool_call(agent, tool_call, &coworkers, &mut usage)
                                .await
                            {
                                Ok(output) => output,
                                Err(e) => {
                                    tracing::warn!(
                                        "{} tool call {} failed: {}",
                                        agent.role,
                                        tool_call.function.name,
                                        e
                                    );
                                    format!("Error: {}", e)
                                }
                            };

                        log.push(TaskLogEntry::now(
                            LogEntryType::ToolResult,
                            truncate_for_log(&result_str, 1000),
                        ));
                        messages.push(ChatMessage::tool_result(&tool_call.id, result_str));
                    }

                    continue;
                }
            }

            if let Some(content) = response.content.filter(|c| !c.trim().is_empty()) {
                log.push(TaskLogEntry::now(
                    LogEntryType::Response,
                    truncate_for_log(&content, 2000),
                ));
                return Ok(TaskOutcome {
                    output: content,
                    log,
                    usage,
                });
            }

            bail!("LLM returned empty response");
        }

        Err(anyhow!(
            "Max iterations ({}) reached without completion",
            self.max_iterations
        ))
    }

    /// Execute a single tool call on behalf of `agent`.
    ///
    /// Tokens spent by a delegated coworker are added to `usage`.
    async fn execute_tool_call(
        &self,
        agent: &AgentDef,
        tool_call: &ToolCall,
        coworkers: &[&AgentDef],
        usage: &mut TokenUsage,
    ) -> anyhow::Result<String> {
        let name = tool_call.function.name.as_str();
        let args: Value = serde_json::from_str(&tool_call.function.arguments).unwrap_or(Value::Null);

        if name == DELEGATE_TOOL {
            if !agent.allow_delegation {
                bail!("{} may not delegate work", agent.role);
            }
            return self.delegate(&args, coworkers, usage).await;
        }

        let id: ToolId = name.parse()?;
        if !agent.can_use(id) {
            bail!("Tool '{}' is not available to {}", name, agent.role);
        }

        let output = self.tools.execute(name, args, &self.ctx).await?;
        Ok(output.to_model_string())
    }

    /// Ask a coworker a single question; the coworker answers without tools.
    async fn delegate(
        &self,
        args: &Value,
        coworkers: &[&AgentDef],
        usage: &mut TokenUsage,
    ) -> anyhow::Result<String> {
        let wanted = args["coworker"]
            .as_str()
            .map(str::trim)
            .ok_or_else(|| anyhow!("Missing 'coworker' argument"))?;
        let task = args["task"]
            .as_str()
            .ok_or_else(|| anyhow!("Missing 'task' argument"))?;
        let context = args["context"].as_str().unwrap_or_default();

        let coworker = coworkers
            .iter()
            .find(|c| c.role.eq_ignore_ascii_case(wanted) || c.id == wanted)
            .ok_or_else(|| {
                let available: Vec<_> = coworkers.iter().map(|c| c.role).collect();
                anyhow!(
                    "Unknown coworker '{}'. Available: {}",
                    wanted,
                    available.join(", ")
                )
            })?;

        tracing::info!("Delegating to {}: {}", coworker.role, truncate_for_log(task, 200));

        let (system, user) = build_delegation_prompt(coworker, task, context);
        let response = self
            .llm
            .chat_completion(&[ChatMessage::system(system), ChatMessage::user(user)], None)
            .await?;
        if let Some(turn) = response.usage {
            usage.add(turn);
        }

        response
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| anyhow!("{} returned an empty answer", coworker.role))
    }
}

fn delegate_schema(coworkers: &[&AgentDef]) -> ToolDefinition {
    let roles: Vec<&str> = coworkers.iter().map(|c| c.role).collect();
    ToolDefinition {
        name: DELEGATE_TOOL.to_string(),
        description: "Ask a coworker a focused question and get their answer back.".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "coworker": {
                    "type": "string",
                    "enum": roles,
                    "description": "Role of the coworker to ask"
                },
                "task": {
                    "type": "string",
                    "description": "The question or piece of work for the coworker"
                },
                "context": {
                    "type": "string",
                    "description": "Everything the coworker needs to know to answer"
                }
            },
            "required": ["coworker", "task"]
        }),
    }
}

/// Truncate a string for logging purposes.
fn truncate_for_log(s: &str, max_len: usize) -> String {
    match s.char_indices().nth(max_len) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}... [truncated]", &s[..cut]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{
        COMMUNICATION_AGENT, HISTORY_REVIEWER, INTERACTION_CHECKER, SYMPTOM_ANALYZER,
        TREATMENT_AGENT,
    };
    use crate::config::Config;
    use crate::llm::testing::ScriptedLlm;
    use crate::llm::{ChatResponse, LlmError};

    fn executor(script: Vec<Result<ChatResponse, LlmError>>) -> (AgentExecutor, Arc<ScriptedLlm>) {
        let llm = ScriptedLlm::new(script);
        let ctx = ToolContext::new(Arc::new(Config::default()));
        let executor = AgentExecutor::new(llm.clone(), Arc::new(ToolRegistry::new()), ctx, 4);
        (executor, llm)
    }

    #[tokio::test]
    async fn final_answer_without_tools() {
        let (executor, llm) = executor(vec![ScriptedLlm::text("Keep hydrated.")]);
        let outcome = executor
            .run_task(&COMMUNICATION_AGENT, "Explain the plan.", "Patient summary", None, &[])
            .await
            .unwrap();

        assert_eq!(outcome.output, "Keep hydrated.");
        let calls = llm.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].tools.is_empty());
        assert!(calls[0].system().starts_with("You are Patient Communication Specialist."));
        assert!(calls[0].user().ends_with("Expected output: Patient summary"));
    }

    #[tokio::test]
    async fn tool_results_are_fed_back() {
        let (executor, llm) = executor(vec![
            ScriptedLlm::tool_call(
                "call_1",
                "drug_interaction_check",
                json!({ "medications": ["Ibuprofen", "aspirin"] }),
            ),
            ScriptedLlm::text("Avoid combining ibuprofen with aspirin."),
        ]);
        let outcome = executor
            .run_task(&INTERACTION_CHECKER, "Check meds.", "Report", None, &[])
            .await
            .unwrap();

        assert_eq!(outcome.output, "Avoid combining ibuprofen with aspirin.");
        let calls = llm.calls();
        assert_eq!(
            calls[0].tools,
            vec!["drug_interaction_check", "validate_medical_recommendation"]
        );
        let tool_msg = calls[1].last();
        assert_eq!(tool_msg.role, Role::Tool);
        assert_eq!(tool_msg.tool_call_id.as_deref(), Some("call_1"));
        assert!(tool_msg.content.as_deref().unwrap().contains("moderate"));
        assert!(matches!(outcome.log[0].entry_type, LogEntryType::ToolCall));
    }

    #[tokio::test]
    async fn refuses_tools_outside_the_agent_grant() {
        let (executor, llm) = executor(vec![
            ScriptedLlm::tool_call(
                "call_1",
                "appointment_scheduling",
                json!({ "specialty": "cardiology" }),
            ),
            ScriptedLlm::text("No history concerns."),
        ]);
        executor
            .run_task(&HISTORY_REVIEWER, "Review history.", "Summary", None, &[])
            .await
            .unwrap();

        let reply = llm.calls()[1].last().content.clone().unwrap();
        assert_eq!(
            reply,
            "Error: Tool 'appointment_scheduling' is not available to Medical History Analyst"
        );
    }

    #[tokio::test]
    async fn delegates_to_a_coworker() {
        let (executor, llm) = executor(vec![
            ScriptedLlm::tool_call(
                "call_1",
                DELEGATE_TOOL,
                json!({
                    "coworker": "treatment recommendation specialist",
                    "task": "Is ibuprofen reasonable here?",
                    "context": "Adult with fever"
                }),
            ),
            ScriptedLlm::text("Ibuprofen is reasonable absent contraindications."),
            ScriptedLlm::text("Likely viral illness."),
        ]);
        let outcome = executor
            .run_task(
                &SYMPTOM_ANALYZER,
                "Analyze symptoms.",
                "Differential",
                None,
                &[&SYMPTOM_ANALYZER, &TREATMENT_AGENT],
            )
            .await
            .unwrap();

        assert_eq!(outcome.output, "Likely viral illness.");
        let calls = llm.calls();
        assert!(calls[0].tools.contains(&DELEGATE_TOOL.to_string()));
        assert!(calls[1].tools.is_empty());
        assert!(calls[1]
            .system()
            .starts_with("You are Treatment Recommendation Specialist."));
        assert_eq!(calls[1].user(), "Is ibuprofen reasonable here?\n\nContext:\nAdult with fever");
        assert_eq!(
            calls[2].last().content.as_deref(),
            Some("Ibuprofen is reasonable absent contraindications.")
        );
        assert!(matches!(outcome.log[0].entry_type, LogEntryType::Delegation));
    }

    #[tokio::test]
    async fn delegated_tokens_count_toward_task_usage() {
        let with_usage = |response: Result<ChatResponse, LlmError>, prompt: u64, completion: u64| {
            response.map(|r| ChatResponse {
                usage: Some(TokenUsage {
                    prompt_tokens: prompt,
                    completion_tokens: completion,
                }),
                ..r
            })
        };
        let (executor, _llm) = executor(vec![
            with_usage(
                ScriptedLlm::tool_call(
                    "call_1",
                    DELEGATE_TOOL,
                    json!({ "coworker": "Treatment Recommendation Specialist", "task": "Dose?" }),
                ),
                100,
                10,
            ),
            with_usage(ScriptedLlm::text("Standard adult dose."), 40, 20),
            with_usage(ScriptedLlm::text("Done."), 150, 5),
        ]);
        let outcome = executor
            .run_task(&SYMPTOM_ANALYZER, "Analyze.", "Differential", None, &[&TREATMENT_AGENT])
            .await
            .unwrap();

        assert_eq!(outcome.output, "Done.");
        assert_eq!(
            outcome.usage,
            TokenUsage {
                prompt_tokens: 290,
                completion_tokens: 35,
            }
        );
    }

    #[tokio::test]
    async fn unknown_coworker_is_reported_to_the_model() {
        let (executor, llm) = executor(vec![
            ScriptedLlm::tool_call(
                "call_1",
                DELEGATE_TOOL,
                json!({ "coworker": "Surgeon", "task": "Operate?" }),
            ),
            ScriptedLlm::text("Done."),
        ]);
        executor
            .run_task(&SYMPTOM_ANALYZER, "Analyze.", "Differential", None, &[&TREATMENT_AGENT])
            .await
            .unwrap();

        let reply = llm.calls()[1].last().content.clone().unwrap();
        assert!(reply.starts_with("Error: Unknown coworker 'Surgeon'"));
        assert!(reply.contains("Treatment Recommendation Specialist"));
    }

    #[tokio::test]
    async fn max_iterations_is_an_error() {
        let script = (0..4)
            .map(|i| {
                ScriptedLlm::tool_call(
                    &format!("call_{}", i),
                    "medical_knowledge_search",
                    json!({ "query": "fever" }),
                )
            })
            .collect();
        let (executor, _) = executor(script);
        let err = executor
            .run_task(&SYMPTOM_ANALYZER, "Analyze.", "Differential", None, &[])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Max iterations (4) reached without completion");
    }

    #[tokio::test]
    async fn empty_answer_is_an_error() {
        let (executor, _) = executor(vec![ScriptedLlm::text("   ")]);
        let err = executor
            .run_task(&COMMUNICATION_AGENT, "Explain.", "Summary", None, &[])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "LLM returned empty response");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_for_log("héllo", 10), "héllo");
        assert_eq!(truncate_for_log("héllo", 2), "hé... [truncated]");
    }
}
