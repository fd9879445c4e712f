pub mod error;
pub mod constants;
pub mod llm;
pub mod tools;
pub mod context;
pub mod config;
pub mod messages;
pub mod agent;
pub mod team;
pub mod console;
pub mod telemetry;

// Re-export key types
pub use error::TeamError;
pub use agent::{AssistantAgent, ChatAgent, Response};
pub use llm::{AzureOpenAIClient, LlmClient, LlmResponse, Message, OpenAIClient, Role, StreamEvent, Usage};
pub use tools::{FunctionTool, Tool, ToolDefinition, ToolRegistry, ToolResult};
pub use context::ConversationHistory;
pub use config::{model_client, Settings};
pub use messages::{MessageKind, StopMessage, TaskResult, TeamEvent, TeamMessage};
pub use team::{
    MaxMessageTermination, RoundRobinGroupChat, SelectorGroupChat, TeamStream,
    TerminationCondition, TextMentionTermination,
};
pub use console::Console;
