//! Scripted LLM client for tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use super::{ChatMessage, ChatResponse, FunctionCall, LlmClient, LlmError, ToolCall, ToolDefinition};

/// What the client was asked on one turn.
#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<String>,
}

impl RecordedCall {
    pub fn system(&self) -> &str {
        self.messages
            .first()
            .and_then(|m| m.content.as_deref())
            .unwrap_or_default()
    }

    pub fn user(&self) -> &str {
        self.messages
            .get(1)
            .and_then(|m| m.content.as_deref())
            .unwrap_or_default()
    }

    pub fn last(&self) -> &ChatMessage {
        self.messages.last().expect("call has messages")
    }
}

/// Replays canned responses in order and records every request.
pub(crate) struct ScriptedLlm {
    script: Mutex<VecDeque<Result<ChatResponse, LlmError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedLlm {
    pub fn new(script: Vec<Result<ChatResponse, LlmError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn text(content: &str) -> Result<ChatResponse, LlmError> {
        Ok(ChatResponse {
            content: Some(content.to_string()),
            tool_calls: None,
            usage: None,
        })
    }

    pub fn tool_call(id: &str, name: &str, args: Value) -> Result<ChatResponse, LlmError> {
        Ok(ChatResponse {
            content: None,
            tool_calls: Some(vec![ToolCall {
                id: id.to_string(),
                kind: "function".to_string(),
                function: FunctionCall {
                    name: name.to_string(),
                    arguments: args.to_string(),
                },
            }]),
            usage: None,
        })
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    fn model(&self) -> &str {
        "scripted"
    }

    async fn chat_completion(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<ChatResponse, LlmError> {
        self.calls.lock().unwrap().push(RecordedCall {
            messages: messages.to_vec(),
            tools: tools
                .unwrap_or_default()
                .iter()
                .map(|t| t.name.clone())
                .collect(),
        });
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::Decode("script exhausted".to_string())))
    }
}
