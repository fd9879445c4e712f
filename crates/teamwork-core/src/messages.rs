use crate::llm::Usage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a [`TeamMessage`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Plain text from the user or an agent.
    Text,
    /// An agent asked its model client for tool calls. Inner event.
    ToolCallRequest,
    /// Results of executing those tool calls. Inner event.
    ToolCallExecution,
    /// An agent's reply made of tool results rather than model text.
    ToolCallSummary,
}

impl MessageKind {
    /// Inner events are streamed and recorded but are not chat messages:
    /// they never reach other agents and are not counted by
    /// message-count termination.
    pub fn is_event(&self) -> bool {
        matches!(self, Self::ToolCallRequest | Self::ToolCallExecution)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Text => "TextMessage",
            Self::ToolCallRequest => "ToolCallRequestEvent",
            Self::ToolCallExecution => "ToolCallExecutionEvent",
            Self::ToolCallSummary => "ToolCallSummaryMessage",
        }
    }
}

/// A message in a team's shared thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMessage {
    pub id: Uuid,
    pub source: String,
    pub kind: MessageKind,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    pub created_at: DateTime<Utc>,
}

impl TeamMessage {
    pub fn new(source: impl Into<String>, kind: MessageKind, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: source.into(),
            kind,
            content: content.into(),
            usage: None,
            created_at: Utc::now(),
        }
    }

    pub fn text(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(source, MessageKind::Text, content)
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = Some(usage);
        self
    }

    pub fn is_event(&self) -> bool {
        self.kind.is_event()
    }
}

/// Why a team run stopped, as reported by a termination condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopMessage {
    pub content: String,
    pub source: String,
}

/// Outcome of a team run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    /// Every message and inner event produced by the run, task first.
    pub messages: Vec<TeamMessage>,
    pub stop_reason: Option<String>,
}

impl TaskResult {
    /// Messages that are not inner events.
    pub fn chat_messages(&self) -> impl Iterator<Item = &TeamMessage> {
        self.messages.iter().filter(|m| !m.is_event())
    }

    pub fn total_usage(&self) -> Usage {
        let mut total = Usage::default();
        for usage in self.messages.iter().filter_map(|m| m.usage) {
            total += usage;
        }
        total
    }
}

/// Items of a streamed team run.
#[derive(Debug, Clone, PartialEq)]
pub enum TeamEvent {
    Message(TeamMessage),
    Finished(TaskResult),
}
