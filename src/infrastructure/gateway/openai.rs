//! OpenAI-compatible implementation of the model gateway.
//!
//! Each [`GatewayMode`] maps to its own model and sampling configuration.
//! The conversation and validation modes force `json_object` responses; only
//! the reasoning mode advertises the clinical tools.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::http_client::HttpClientTrait;
use crate::domain::clinical::{ToolCallRequest, ToolName};
use crate::domain::llm::{GatewayMode, GatewayReply, Message, MessageRole, ModelGateway};
use crate::domain::DomainError;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

/// Model and sampling settings for one gateway mode.
#[derive(Debug, Clone)]
pub struct ModeConfig {
    pub model: String,
    pub temperature: f32,
}

impl ModeConfig {
    pub fn new(model: impl Into<String>, temperature: f32) -> Self {
        Self {
            model: model.into(),
            temperature,
        }
    }
}

/// OpenAI chat-completions backed gateway.
#[derive(Debug)]
pub struct OpenAiModelGateway<C: HttpClientTrait> {
    client: C,
    auth_header: String,
    base_url: String,
    conversation: ModeConfig,
    reasoning: ModeConfig,
    validation: ModeConfig,
}

impl<C: HttpClientTrait> OpenAiModelGateway<C> {
    pub fn new(
        client: C,
        api_key: impl Into<String>,
        conversation: ModeConfig,
        reasoning: ModeConfig,
        validation: ModeConfig,
    ) -> Self {
        Self::with_base_url(
            client,
            api_key,
            DEFAULT_OPENAI_BASE_URL,
            conversation,
            reasoning,
            validation,
        )
    }

    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        conversation: ModeConfig,
        reasoning: ModeConfig,
        validation: ModeConfig,
    ) -> Self {
        Self {
            client,
            auth_header: format!("Bearer {}", api_key.into()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            conversation,
            reasoning,
            validation,
        }
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    fn mode_config(&self, mode: GatewayMode) -> &ModeConfig {
        match mode {
            GatewayMode::Conversation => &self.conversation,
            GatewayMode::Reasoning => &self.reasoning,
            GatewayMode::Validation => &self.validation,
        }
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("Authorization", self.auth_header.as_str()),
            ("Content-Type", "application/json"),
        ]
    }

    fn build_request(
        &self,
        mode: GatewayMode,
        system_instruction: &str,
        history: &[Message],
    ) -> serde_json::Value {
        let config = self.mode_config(mode);

        let mut messages = vec![json!({"role": "system", "content": system_instruction})];
        messages.extend(history.iter().map(wire_message));

        let mut body = json!({
            "model": config.model,
            "messages": messages,
            "temperature": config.temperature,
        });

        match mode {
            GatewayMode::Conversation | GatewayMode::Validation => {
                body["response_format"] = json!({"type": "json_object"});
            }
            GatewayMode::Reasoning => {
                body["tools"] = tool_definitions();
            }
        }

        body
    }

    fn parse_response(&self, response: serde_json::Value) -> Result<GatewayReply, DomainError> {
        let parsed: ChatCompletionResponse = serde_json::from_value(response).map_err(|e| {
            DomainError::provider("openai", format!("Failed to parse response: {}", e))
        })?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::provider("openai", "No choices in response"))?;

        if let Some(calls) = choice.message.tool_calls {
            let requests = calls
                .into_iter()
                .map(|call| {
                    let tool = ToolName::from_wire(&call.function.name).ok_or_else(|| {
                        DomainError::provider(
                            "openai",
                            format!("Unknown tool requested: {}", call.function.name),
                        )
                    })?;
                    let arguments =
                        serde_json::from_str(&call.function.arguments).map_err(|e| {
                            DomainError::provider(
                                "openai",
                                format!("Malformed tool arguments: {}", e),
                            )
                        })?;
                    Ok(ToolCallRequest::new(call.id, tool, arguments))
                })
                .collect::<Result<Vec<_>, DomainError>>()?;

            if !requests.is_empty() {
                return Ok(GatewayReply::ToolCalls(requests));
            }
        }

        let content = choice
            .message
            .content
            .ok_or_else(|| DomainError::provider("openai", "Empty message in response"))?;

        Ok(GatewayReply::Text(content))
    }
}

#[async_trait]
impl<C: HttpClientTrait> ModelGateway for OpenAiModelGateway<C> {
    async fn invoke(
        &self,
        mode: GatewayMode,
        system_instruction: &str,
        history: &[Message],
    ) -> Result<GatewayReply, DomainError> {
        let url = self.chat_completions_url();
        let body = self.build_request(mode, system_instruction, history);
        let response = self.client.post_json(&url, self.headers(), &body).await?;

        self.parse_response(response)
    }
}

fn wire_message(message: &Message) -> serde_json::Value {
    match message.role {
        MessageRole::Assistant if message.has_tool_calls() => {
            let calls: Vec<serde_json::Value> = message
                .tool_calls
                .iter()
                .map(|call| {
                    json!({
                        "id": call.id,
                        "type": "function",
                        "function": {
                            "name": call.tool.as_str(),
                            "arguments": call.arguments.to_string(),
                        }
                    })
                })
                .collect();
            json!({"role": "assistant", "content": serde_json::Value::Null, "tool_calls": calls})
        }
        MessageRole::Tool => json!({
            "role": "tool",
            "tool_call_id": message.tool_call_id,
            "content": message.content,
        }),
        MessageRole::System => json!({"role": "system", "content": message.content}),
        MessageRole::User => json!({"role": "user", "content": message.content}),
        MessageRole::Assistant => json!({"role": "assistant", "content": message.content}),
    }
}

fn tool_definitions() -> serde_json::Value {
    json!([
        {
            "type": "function",
            "function": {
                "name": "find_doctors_by_specialty",
                "description": "List active doctors for a medical specialty, earliest availability first.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "specialty": {"type": "string", "description": "Medical specialty, e.g. Cardiology"}
                    },
                    "required": ["specialty"]
                }
            }
        },
        {
            "type": "function",
            "function": {
                "name": "get_doctor_schedule",
                "description": "Schedule and working hours for doctors matching a name.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "name": {"type": "string", "description": "Doctor name or part of it"}
                    },
                    "required": ["name"]
                }
            }
        }
    ])
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Debug, Deserialize)]
struct WireToolCall {
    id: String,
    function: WireFunction,
}

#[derive(Debug, Deserialize)]
struct WireFunction {
    name: String,
    arguments: String,
}
