mod traits;
mod assistant;

pub use traits::{validate_agent_name, ChatAgent, Response, ToolExecution};
pub use assistant::{AssistantAgent, DEFAULT_DESCRIPTION, DEFAULT_SYSTEM_MESSAGE};
