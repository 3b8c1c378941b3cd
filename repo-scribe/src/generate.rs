#![doc = "Live generative text service: an OpenAI-compatible chat-completions client implementing the core `Generator` contract."]
//
//! # Generator Integration (CLI <-> Core)
//!
//! This module bridges [`repo_scribe_core::contract::Generator`] to a real HTTP service.
//!
//! - Each [`GenerationTask`] becomes one chat-completions request: the agent persona is the
//!   system message, the task description plus its expected output is the user message.
//! - The sampling temperature comes from the task's [`AgentRole`].
//! - One round-trip per task, no retry, no timeout. The response text is returned untouched.

use async_trait::async_trait;
use repo_scribe_core::contract::{AgentRole, GenerationTask, Generator, ServiceError};
use serde::{Deserialize, Serialize};

pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub temperature: f32,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

impl OpenAiClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let base_url: String = base_url.into();
        let client = OpenAiClient {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        };
        tracing::info!(
            model = %client.model,
            base_url = %client.base_url,
            api_key_set = !client.api_key.is_empty(),
            "Initialized generative service client"
        );
        client
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

fn system_prompt(role: AgentRole) -> String {
    let persona = role.persona();
    format!(
        "You are a {}.\nYour goal: {}\n{}",
        persona.role, persona.goal, persona.backstory
    )
}

/// Request body for a task.
pub fn chat_request(model: &str, task: &GenerationTask) -> ChatRequest {
    ChatRequest {
        model: model.to_string(),
        temperature: task.role.temperature(),
        messages: vec![
            ChatMessage {
                role: "system".into(),
                content: system_prompt(task.role),
            },
            ChatMessage {
                role: "user".into(),
                content: format!(
                    "{}\n\nExpected output: {}",
                    task.description, task.expected_output
                ),
            },
        ],
    }
}

/// Text of the first choice in a chat-completions response body.
pub fn parse_response(body: &str) -> Result<String, ServiceError> {
    let response: ChatResponse = serde_json::from_str(body)?;
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| "generative service returned no choices".into())
}

#[async_trait]
impl Generator for OpenAiClient {
    async fn generate(&self, task: &GenerationTask) -> Result<String, ServiceError> {
        tracing::info!(role = ?task.role, model = %self.model, "Submitting task to generative service");
        let body = chat_request(&self.model, task);

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, "Generative service request failed");
                e
            })?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            tracing::error!(%status, body = %text, "Generative service returned an error status");
            return Err(format!("generative service returned {status}: {text}").into());
        }

        let content = parse_response(&text)?;
        tracing::info!(role = ?task.role, bytes = content.len(), "Received generative service response");
        Ok(content)
    }
}
