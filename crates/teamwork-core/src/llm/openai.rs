use crate::constants::{defaults, endpoints, models};
use crate::error::TeamError;
use crate::llm::traits::*;
use crate::tools::ToolDefinition;
use futures::channel::mpsc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// Client for the OpenAI chat-completions API and compatible servers.
pub struct OpenAIClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: Option<f32>,
    timeout: Duration,
}

impl std::fmt::Debug for OpenAIClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIClient")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl OpenAIClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: models::DEFAULT_OPENAI_MODEL.to_string(),
            base_url: endpoints::OPENAI_BASE_URL.to_string(),
            temperature: None,
            timeout: Duration::from_secs(defaults::TIMEOUT_SECS),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn temperature(&self) -> Option<f32> {
        self.temperature
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn request(&self, body: &ChatRequest) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, endpoints::OPENAI_CHAT_PATH);
        self.client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .timeout(self.timeout)
            .json(body)
    }
}

#[async_trait::async_trait]
impl LlmClient for OpenAIClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn chat(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<LlmResponse, TeamError> {
        let body = ChatRequest::new(Some(&self.model), messages, tools, self.temperature, false);
        tracing::debug!(model = %self.model, messages = messages.len(), "openai chat request");
        send_chat("OpenAI", self.request(&body)).await
    }

    async fn chat_stream(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<mpsc::UnboundedReceiver<StreamEvent>, TeamError> {
        let body = ChatRequest::new(Some(&self.model), messages, tools, self.temperature, true);
        tracing::debug!(model = %self.model, messages = messages.len(), "openai stream request");
        send_stream("OpenAI", self.request(&body)).await
    }
}

// ── Wire format shared with the Azure client ────────────────────────────

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    messages: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream_options: Option<Value>,
}

impl ChatRequest {
    pub(crate) fn new(
        model: Option<&str>,
        messages: &[Message],
        tools: &[ToolDefinition],
        temperature: Option<f32>,
        stream: bool,
    ) -> Self {
        Self {
            model: model.map(str::to_string),
            messages: encode_messages(messages),
            tools: if tools.is_empty() {
                None
            } else {
                Some(build_tool_defs(tools))
            },
            temperature,
            stream: stream.then_some(true),
            stream_options: stream.then(|| serde_json::json!({ "include_usage": true })),
        }
    }

    /// Drop the usage request from a streaming body, for servers that
    /// reject `stream_options`.
    pub(crate) fn without_stream_usage(mut self) -> Self {
        self.stream_options = None;
        self
    }
}

fn build_tool_defs(tools: &[ToolDefinition]) -> Vec<Value> {
    tools
        .iter()
        .map(|t| {
            serde_json::json!({
                "type": "function",
                "function": {
                    "name": t.name,
                    "description": t.description,
                    "parameters": t.parameters,
                }
            })
        })
        .collect()
}

fn encode_messages(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|m| {
            if let Some(ref tool_call_id) = m.tool_call_id {
                serde_json::json!({
                    "role": "tool",
                    "tool_call_id": tool_call_id,
                    "content": m.content,
                })
            } else if let Some(ref tool_calls) = m.tool_calls {
                let tcs: Vec<Value> = tool_calls
                    .iter()
                    .map(|tc| {
                        serde_json::json!({
                            "id": tc.id,
                            "type": "function",
                            "function": {
                                "name": tc.function.name,
                                "arguments": tc.function.arguments,
                            }
                        })
                    })
                    .collect();
                serde_json::json!({
                    "role": "assistant",
                    "content": m.content,
                    "tool_calls": tcs,
                })
            } else {
                let mut value = serde_json::json!({
                    "role": m.role,
                    "content": m.content,
                });
                if let Some(ref name) = m.name {
                    value["name"] = Value::String(name.clone());
                }
                value
            }
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCall>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

pub(crate) async fn send_chat(
    provider: &str,
    request: reqwest::RequestBuilder,
) -> Result<LlmResponse, TeamError> {
    let response = request.send().await?;

    let status = response.status();
    let response_text = response.text().await?;

    if !status.is_success() {
        return Err(TeamError::Llm(format!(
            "{provider} API error ({status}): {response_text}"
        )));
    }

    parse_chat_response(&response_text)
}

fn parse_chat_response(body: &str) -> Result<LlmResponse, TeamError> {
    let api_response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| TeamError::Llm(format!("Failed to parse response: {e}")))?;

    let choice = api_response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| TeamError::Llm("No response from API".into()))?;

    let content = choice.message.content.unwrap_or_default();
    let message = if choice.message.tool_calls.is_empty() {
        Message::assistant(content)
    } else {
        Message::assistant_with_tools(content, choice.message.tool_calls)
    };

    Ok(LlmResponse {
        message,
        usage: api_response.usage.map(|u| Usage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        }),
    })
}

pub(crate) async fn send_stream(
    provider: &str,
    request: reqwest::RequestBuilder,
) -> Result<mpsc::UnboundedReceiver<StreamEvent>, TeamError> {
    let response = request.send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        return Err(TeamError::Llm(format!(
            "{provider} API error ({status}): {text}"
        )));
    }

    let (tx, rx) = mpsc::unbounded();

    let mut stream = response.bytes_stream();
    tokio::spawn(async move {
        use futures::StreamExt;
        let mut buffer = String::new();
        let mut decoder = SseDecoder::default();

        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(c) => c,
                Err(e) => {
                    let _ = tx.unbounded_send(StreamEvent::Error(e.to_string()));
                    return;
                }
            };

            buffer.push_str(&String::from_utf8_lossy(&chunk));

            while let Some(line_end) = buffer.find('\n') {
                let line: String = buffer.drain(..=line_end).collect();
                for event in decoder.decode_line(&line) {
                    let _ = tx.unbounded_send(event);
                }
                if decoder.is_finished() {
                    return;
                }
            }
        }

        for event in decoder.finish() {
            let _ = tx.unbounded_send(event);
        }
    });

    Ok(rx)
}

/// Turns chat-completions SSE lines into [`StreamEvent`]s.
#[derive(Debug, Default)]
struct SseDecoder {
    // OpenAI only sends the id on the first delta of each tool call
    tool_call_ids: HashMap<u64, String>,
    finished: bool,
}

impl SseDecoder {
    fn is_finished(&self) -> bool {
        self.finished
    }

    fn decode_line(&mut self, line: &str) -> Vec<StreamEvent> {
        let line = line.trim();
        let Some(data) = line.strip_prefix("data:") else {
            return Vec::new();
        };
        let data = data.trim_start();

        if data == "[DONE]" {
            return self.finish();
        }

        let Ok(event) = serde_json::from_str::<Value>(data) else {
            tracing::warn!("skipping malformed stream chunk: {data}");
            return Vec::new();
        };

        let mut events = Vec::new();

        if let Some(usage) = event.get("usage").filter(|u| !u.is_null()) {
            let input = usage
                .get("prompt_tokens")
                .and_then(|v| v.as_u64())
                .unwrap_or(0) as u32;
            let output = usage
                .get("completion_tokens")
                .and_then(|v| v.as_u64())
                .unwrap_or(0) as u32;
            if input > 0 || output > 0 {
                events.push(StreamEvent::Usage(Usage {
                    input_tokens: input,
                    output_tokens: output,
                }));
            }
        }

        let Some(delta) = event
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|choices| choices.first())
            .and_then(|c| c.get("delta"))
        else {
            return events;
        };

        if let Some(content) = delta.get("content").and_then(|c| c.as_str()) {
            if !content.is_empty() {
                events.push(StreamEvent::TextDelta(content.to_string()));
            }
        }

        let tool_calls = delta
            .get("tool_calls")
            .and_then(|t| t.as_array())
            .map(Vec::as_slice)
            .unwrap_or_default();

        for tc in tool_calls {
            let index = tc.get("index").and_then(|i| i.as_u64()).unwrap_or(0);
            if let Some(id) = tc.get("id").and_then(|i| i.as_str()) {
                if !id.is_empty() {
                    self.tool_call_ids.insert(index, id.to_string());
                }
            }
            let id = self.tool_call_ids.get(&index).cloned().unwrap_or_default();
            let Some(func) = tc.get("function") else {
                continue;
            };
            if let Some(name) = func.get("name").and_then(|n| n.as_str()) {
                if !name.is_empty() {
                    events.push(StreamEvent::ToolCallStart {
                        id: id.clone(),
                        name: name.to_string(),
                    });
                }
            }
            if let Some(args) = func.get("arguments").and_then(|a| a.as_str()) {
                if !args.is_empty() {
                    events.push(StreamEvent::ToolCallDelta {
                        id: id.clone(),
                        arguments_delta: args.to_string(),
                    });
                }
            }
        }

        events
    }

    /// Close any open tool calls and emit `Done`. Idempotent.
    fn finish(&mut self) -> Vec<StreamEvent> {
        if self.finished {
            return Vec::new();
        }
        self.finished = true;

        let mut open: Vec<(u64, String)> = self.tool_call_ids.drain().collect();
        open.sort_by_key(|(index, _)| *index);

        let mut events: Vec<StreamEvent> = open
            .into_iter()
            .map(|(_, id)| StreamEvent::ToolCallEnd { id })
            .collect();
        events.push(StreamEvent::Done);
        events
    }
}
