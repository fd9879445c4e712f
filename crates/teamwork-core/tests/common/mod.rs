#![allow(dead_code)]

use futures::channel::mpsc::{unbounded, UnboundedReceiver};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use teamwork_core::{
    ChatAgent, LlmClient, LlmResponse, Message, Response, StreamEvent, TeamError, TeamMessage,
    ToolDefinition, Usage,
};

/// Mock LLM that plays back scripted stream event sequences in order and
/// records every request it receives.
pub struct MockLlm {
    script: Mutex<VecDeque<Vec<StreamEvent>>>,
    requests: Mutex<Vec<(Vec<Message>, Vec<ToolDefinition>)>>,
}

impl MockLlm {
    pub fn new(script: Vec<Vec<StreamEvent>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<(Vec<Message>, Vec<ToolDefinition>)> {
        self.requests.lock().unwrap().clone()
    }

    fn next(&self, messages: &[Message], tools: &[ToolDefinition]) -> Vec<StreamEvent> {
        self.requests
            .lock()
            .unwrap()
            .push((messages.to_vec(), tools.to_vec()));
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| text("Mock response"))
    }
}

#[async_trait::async_trait]
impl LlmClient for MockLlm {
    fn model(&self) -> &str {
        "mock-model"
    }

    async fn chat(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<LlmResponse, TeamError> {
        let mut content = String::new();
        for event in self.next(messages, tools) {
            match event {
                StreamEvent::TextDelta(delta) => content.push_str(&delta),
                StreamEvent::Error(e) => return Err(TeamError::Llm(e)),
                _ => {}
            }
        }
        Ok(LlmResponse {
            message: Message::assistant(content),
            usage: None,
        })
    }

    async fn chat_stream(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<UnboundedReceiver<StreamEvent>, TeamError> {
        let (tx, rx) = unbounded();
        for event in self.next(messages, tools) {
            tx.unbounded_send(event).unwrap();
        }
        Ok(rx)
    }
}

pub fn text(content: &str) -> Vec<StreamEvent> {
    vec![StreamEvent::TextDelta(content.to_string()), StreamEvent::Done]
}

pub fn text_with_usage(content: &str, input: u32, output: u32) -> Vec<StreamEvent> {
    vec![
        StreamEvent::TextDelta(content.to_string()),
        StreamEvent::Usage(Usage {
            input_tokens: input,
            output_tokens: output,
        }),
        StreamEvent::Done,
    ]
}

pub fn tool_call(id: &str, name: &str, arguments: &str) -> Vec<StreamEvent> {
    vec![
        StreamEvent::ToolCallStart {
            id: id.to_string(),
            name: name.to_string(),
        },
        StreamEvent::ToolCallDelta {
            id: id.to_string(),
            arguments_delta: arguments.to_string(),
        },
        StreamEvent::ToolCallEnd { id: id.to_string() },
        StreamEvent::Done,
    ]
}

/// Participant that replies from a fixed list and records what it was given.
pub struct ScriptedAgent {
    name: String,
    replies: Mutex<VecDeque<String>>,
    received: Mutex<Vec<Vec<TeamMessage>>>,
}

impl ScriptedAgent {
    pub fn new(name: &str, replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            received: Mutex::new(Vec::new()),
        })
    }

    pub fn received(&self) -> Vec<Vec<TeamMessage>> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ChatAgent for ScriptedAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Scripted test agent"
    }

    async fn on_messages(&self, messages: &[TeamMessage]) -> Result<Response, TeamError> {
        self.received.lock().unwrap().push(messages.to_vec());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| format!("{} has nothing more to say", self.name));
        Ok(Response::new(TeamMessage::text(&self.name, reply)))
    }

    async fn reset(&self) {
        self.received.lock().unwrap().clear();
    }
}

/// Participant whose every turn fails.
pub struct FailingAgent;

#[async_trait::async_trait]
impl ChatAgent for FailingAgent {
    fn name(&self) -> &str {
        "Broken"
    }

    fn description(&self) -> &str {
        "Always fails"
    }

    async fn on_messages(&self, _messages: &[TeamMessage]) -> Result<Response, TeamError> {
        Err(TeamError::Llm("model unavailable".into()))
    }

    async fn reset(&self) {}
}
