//! Prompt templates for care-team agents.

use crate::llm::ToolDefinition;

use super::AgentDef;

/// Build the system prompt for an agent.
pub fn build_system_prompt(
    agent: &AgentDef,
    tools: &[ToolDefinition],
    coworkers: &[&AgentDef],
) -> String {
    let tool_descriptions = if tools.is_empty() {
        "You have no tools for this task. Answer from the information provided.".to_string()
    } else {
        tools
            .iter()
            .map(|t| format!("- **{}**: {}", t.name, t.description))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let delegation = if agent.allow_delegation && !coworkers.is_empty() {
        let names = coworkers
            .iter()
            .map(|c| format!("- {}", c.role))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "\n\n## Coworkers\n\nYou may ask one of these coworkers a focused question with the `{}` tool:\n{}",
            super::DELEGATE_TOOL,
            names
        )
    } else {
        String::new()
    };

    format!(
        r#"You are {role}.
{backstory}

Your personal goal is: {goal}

## Tools
{tool_descriptions}{delegation}

## Rules
1. You support licensed clinicians; never present output as a final diagnosis.
2. Use tools when they can ground your answer; do not invent tool results.
3. Flag red-flag findings explicitly.
4. Stay within your role and the task you were given.
5. When done, reply with your complete final answer and no tool calls."#,
        role = agent.role,
        backstory = agent.backstory,
        goal = agent.goal,
        tool_descriptions = tool_descriptions,
        delegation = delegation,
    )
}

/// Build the user message for a task.
pub fn build_task_prompt(description: &str, expected_output: &str, context: Option<&str>) -> String {
    let mut prompt = description.trim_end().to_string();
    if let Some(context) = context.filter(|c| !c.trim().is_empty()) {
        prompt.push_str("\n\n");
        prompt.push_str(context);
    }
    prompt.push_str("\n\nExpected output: ");
    prompt.push_str(expected_output);
    prompt
}

/// Build the single-turn prompt pair for a delegated question.
pub fn build_delegation_prompt(coworker: &AgentDef, task: &str, context: &str) -> (String, String) {
    let system = format!(
        "You are {}.\n{}\n\nYour personal goal is: {}\n\nA coworker asked for your help. Answer the question directly and concisely.",
        coworker.role, coworker.backstory, coworker.goal
    );
    let user = if context.trim().is_empty() {
        task.to_string()
    } else {
        format!("{}\n\nContext:\n{}", task, context)
    };
    (system, user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{COMMUNICATION_AGENT, SYMPTOM_ANALYZER, TREATMENT_AGENT};

    #[test]
    fn system_prompt_lists_tools_and_coworkers() {
        let tools = vec![ToolDefinition {
            name: "medical_knowledge_search".to_string(),
            description: "Search knowledge".to_string(),
            parameters: serde_json::json!({}),
        }];
        let prompt = build_system_prompt(&SYMPTOM_ANALYZER, &tools, &[&TREATMENT_AGENT]);
        assert!(prompt.starts_with("You are Medical Symptom Analyst."));
        assert!(prompt.contains("- **medical_knowledge_search**: Search knowledge"));
        assert!(prompt.contains("- Treatment Recommendation Specialist"));
        assert!(prompt.contains("delegate_work"));
    }

    #[test]
    fn system_prompt_without_tools_or_delegation() {
        let prompt = build_system_prompt(&COMMUNICATION_AGENT, &[], &[&TREATMENT_AGENT]);
        assert!(prompt.contains("You have no tools for this task."));
        assert!(!prompt.contains("## Coworkers"));
    }

    #[test]
    fn task_prompt_appends_context_then_expectation() {
        let prompt = build_task_prompt("Do the thing.\n", "A list", Some("Earlier: stuff"));
        assert_eq!(prompt, "Do the thing.\n\nEarlier: stuff\n\nExpected output: A list");

        let prompt = build_task_prompt("Do the thing.", "A list", None);
        assert_eq!(prompt, "Do the thing.\n\nExpected output: A list");
    }
}
