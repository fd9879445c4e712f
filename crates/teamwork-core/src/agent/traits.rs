use crate::error::TeamError;
use crate::messages::TeamMessage;
use serde_json::Value;

/// One tool call made during an agent turn.
#[derive(Debug, Clone)]
pub struct ToolExecution {
    pub tool_name: String,
    pub params: Value,
    pub success: bool,
    pub result_summary: String,
}

/// What an agent produced for one turn.
#[derive(Debug, Clone)]
pub struct Response {
    /// The reply other participants will see.
    pub chat_message: TeamMessage,
    /// Tool call requests and executions, in order.
    pub inner_messages: Vec<TeamMessage>,
    pub tool_executions: Vec<ToolExecution>,
}

impl Response {
    pub fn new(chat_message: TeamMessage) -> Self {
        Self {
            chat_message,
            inner_messages: Vec::new(),
            tool_executions: Vec::new(),
        }
    }
}

/// A participant in a team.
#[async_trait::async_trait]
pub trait ChatAgent: Send + Sync {
    fn name(&self) -> &str;

    /// Used by model-driven speaker selection.
    fn description(&self) -> &str;

    /// Take the messages this agent has not seen yet and produce a reply.
    async fn on_messages(&self, messages: &[TeamMessage]) -> Result<Response, TeamError>;

    /// Forget everything seen so far.
    async fn reset(&self);
}

/// Agent names are used as speaker ids and as OpenAI `name` fields.
pub fn validate_agent_name(name: &str) -> Result<(), TeamError> {
    let valid = !name.is_empty()
        && name.len() <= 64
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(TeamError::Config(format!(
            "agent name '{name}' must be 1-64 characters of letters, digits, '_' or '-'"
        )))
    }
}
