use crate::agent::traits::{validate_agent_name, ChatAgent, Response, ToolExecution};
use crate::constants::{defaults, sources};
use crate::context::ConversationHistory;
use crate::error::TeamError;
use crate::llm::{LlmClient, Message, StreamEvent, ToolCall, Usage};
use crate::messages::{MessageKind, TeamMessage};
use crate::tools::{Tool, ToolDefinition, ToolRegistry};
use futures::StreamExt;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

pub const DEFAULT_SYSTEM_MESSAGE: &str = "You are a helpful AI assistant. Solve tasks using your tools. Reply with TERMINATE when the task has been completed.";
pub const DEFAULT_DESCRIPTION: &str = "An agent that provides assistance with ability to use tools.";

/// An agent that answers with a model client and may call tools.
///
/// Each turn it adds the unseen team messages to its own model context and
/// asks the model for a reply. If the model requests tools they are run and
/// the model is asked again, up to `max_tool_iterations` model calls. When
/// the last call still asked for tools the turn ends either with one more
/// tool-free model call (`reflect_on_tool_use`) or with the tool outputs as
/// a summary message.
pub struct AssistantAgent {
    name: String,
    description: String,
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
    context: Mutex<ConversationHistory>,
    max_tool_iterations: usize,
    reflect_on_tool_use: bool,
}

/// One model call, accumulated from the stream.
struct Completion {
    content: String,
    tool_calls: Vec<ToolCall>,
    usage: Usage,
}

impl AssistantAgent {
    pub fn new(name: impl Into<String>, llm: Arc<dyn LlmClient>) -> Result<Self, TeamError> {
        let name = name.into();
        validate_agent_name(&name)?;
        Ok(Self {
            name,
            description: DEFAULT_DESCRIPTION.to_string(),
            llm,
            tools: ToolRegistry::new(),
            context: Mutex::new(
                ConversationHistory::new().with_system_prompt(DEFAULT_SYSTEM_MESSAGE),
            ),
            max_tool_iterations: defaults::MAX_TOOL_ITERATIONS,
            reflect_on_tool_use: false,
        })
    }

    pub fn with_system_message(mut self, prompt: impl Into<String>) -> Self {
        self.context.get_mut().set_system_prompt(prompt);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_tool(mut self, tool: impl Tool + 'static) -> Self {
        self.tools.register(Box::new(tool));
        self
    }

    pub fn with_max_tool_iterations(mut self, max: usize) -> Self {
        self.max_tool_iterations = max.max(1);
        self
    }

    pub fn with_reflect_on_tool_use(mut self, reflect: bool) -> Self {
        self.reflect_on_tool_use = reflect;
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub async fn system_message(&self) -> Option<String> {
        self.context.lock().await.system_prompt().map(str::to_string)
    }

    pub async fn get_conversation_history(&self) -> Vec<Message> {
        self.context.lock().await.get_messages()
    }

    pub async fn estimated_tokens(&self) -> usize {
        self.context.lock().await.estimate_tokens()
    }

    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<Completion, TeamError> {
        let mut stream = self.llm.chat_stream(messages, tools).await?;

        let mut content = String::new();
        let mut tool_calls: Vec<ToolCall> = Vec::new();
        let mut usage = Usage::default();
        // id -> (name, arguments), in start order
        let mut open_calls: Vec<String> = Vec::new();
        let mut partial: HashMap<String, (String, String)> = HashMap::new();

        while let Some(event) = stream.next().await {
            match event {
                StreamEvent::TextDelta(delta) => content.push_str(&delta),
                StreamEvent::ToolCallStart { id, name } => {
                    open_calls.push(id.clone());
                    partial.insert(id, (name, String::new()));
                }
                StreamEvent::ToolCallDelta { id, arguments_delta } => {
                    if let Some((_, args)) = partial.get_mut(&id) {
                        args.push_str(&arguments_delta);
                    }
                }
                StreamEvent::ToolCallEnd { id } => {
                    if let Some((name, arguments)) = partial.remove(&id) {
                        tool_calls.push(ToolCall::function(id, name, arguments));
                    }
                }
                StreamEvent::Usage(u) => usage += u,
                StreamEvent::Done => break,
                StreamEvent::Error(err) => return Err(TeamError::Llm(err)),
            }
        }

        // Streams that close without ending every call
        for id in open_calls {
            if let Some((name, arguments)) = partial.remove(&id) {
                tool_calls.push(ToolCall::function(id, name, arguments));
            }
        }

        Ok(Completion {
            content,
            tool_calls,
            usage,
        })
    }

    async fn execute_tool(&self, tool_call: &ToolCall) -> (bool, String) {
        let tool_name = &tool_call.function.name;

        let params = match tool_call.parse_arguments() {
            Ok(p) => p,
            Err(e) => {
                return (false, format!("Failed to parse tool arguments: {e}"));
            }
        };

        let Some(tool) = self.tools.get(tool_name) else {
            return (false, format!("Tool '{tool_name}' not found"));
        };

        match tool.execute(params).await {
            Ok(Value::String(s)) => (true, s),
            Ok(value) => {
                let result_str =
                    serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
                (true, result_str)
            }
            Err(e) => (false, format!("Error: {e}")),
        }
    }
}

#[async_trait::async_trait]
impl ChatAgent for AssistantAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn on_messages(&self, messages: &[TeamMessage]) -> Result<Response, TeamError> {
        let mut context = self.context.lock().await;

        for message in messages.iter().filter(|m| !m.is_event()) {
            if message.source == self.name {
                context.add_assistant_message(&message.content);
            } else if message.source == sources::USER {
                context.add_user_message(&message.content);
            } else {
                context.add_participant_message(&message.source, &message.content);
            }
        }

        let tool_definitions = self.tools.definitions();
        let mut usage = Usage::default();
        let mut inner_messages = Vec::new();
        let mut tool_executions = Vec::new();
        let mut iterations = 0;

        loop {
            iterations += 1;
            tracing::debug!(agent = %self.name, iteration = iterations, "calling model");

            let completion = self
                .complete(&context.get_messages(), &tool_definitions)
                .await
                .inspect_err(|e| tracing::warn!(agent = %self.name, "model call failed: {e}"))?;
            usage += completion.usage;

            if completion.tool_calls.is_empty() {
                context.add_assistant_message(&completion.content);
                return Ok(Response {
                    chat_message: TeamMessage::text(&self.name, completion.content)
                        .with_usage(usage),
                    inner_messages,
                    tool_executions,
                });
            }

            context.add_message(Message::assistant_with_tools(
                completion.content,
                completion.tool_calls.clone(),
            ));
            inner_messages.push(TeamMessage::new(
                &self.name,
                MessageKind::ToolCallRequest,
                render_tool_calls(&completion.tool_calls),
            ));

            let mut outputs = Vec::with_capacity(completion.tool_calls.len());
            for tool_call in &completion.tool_calls {
                let tool_name = &tool_call.function.name;
                tracing::info!(agent = %self.name, tool = %tool_name, "executing tool");

                let (success, result_str) = self.execute_tool(tool_call).await;
                if !success {
                    tracing::warn!(agent = %self.name, tool = %tool_name, "{result_str}");
                }

                tool_executions.push(ToolExecution {
                    tool_name: tool_name.clone(),
                    params: tool_call.parse_arguments().unwrap_or(Value::Null),
                    success,
                    result_summary: truncate_str(&result_str, defaults::TOOL_SUMMARY_LEN),
                });
                context.add_tool_result(&tool_call.id, &result_str);
                outputs.push((tool_name.clone(), result_str));
            }

            inner_messages.push(TeamMessage::new(
                &self.name,
                MessageKind::ToolCallExecution,
                outputs
                    .iter()
                    .map(|(name, out)| format!("{name}: {out}"))
                    .collect::<Vec<_>>()
                    .join("\n"),
            ));

            if iterations < self.max_tool_iterations {
                continue;
            }

            if self.reflect_on_tool_use {
                let reflection = self.complete(&context.get_messages(), &[]).await?;
                usage += reflection.usage;
                context.add_assistant_message(&reflection.content);
                return Ok(Response {
                    chat_message: TeamMessage::text(&self.name, reflection.content)
                        .with_usage(usage),
                    inner_messages,
                    tool_executions,
                });
            }

            let summary = outputs
                .into_iter()
                .map(|(_, out)| out)
                .collect::<Vec<_>>()
                .join("\n");
            return Ok(Response {
                chat_message: TeamMessage::new(&self.name, MessageKind::ToolCallSummary, summary)
                    .with_usage(usage),
                inner_messages,
                tool_executions,
            });
        }
    }

    async fn reset(&self) {
        self.context.lock().await.clear();
    }
}

fn render_tool_calls(calls: &[ToolCall]) -> String {
    calls
        .iter()
        .map(|c| format!("{}({})", c.function.name, c.function.arguments))
        .collect::<Vec<_>>()
        .join("\n")
}

fn truncate_str(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}
