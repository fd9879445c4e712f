use anyhow::Result;
use std::io::Write;
use std::sync::Arc;
use teamwork_core::{
    AssistantAgent, ChatAgent, Console, LlmClient, RoundRobinGroupChat, TaskResult,
    TextMentionTermination,
};
use tracing::Instrument;

pub const SYSTEM_MESSAGE: &str = "You are a helpful AI assistant. Help the user with their tasks. When the story is complete, say TERMINATE.";

pub const TASK: &str =
    "Tell me a brief story about AI agents working together to solve a problem.";

pub fn build_team(model_client: Arc<dyn LlmClient>) -> Result<RoundRobinGroupChat> {
    let assistant =
        AssistantAgent::new("Assistant", model_client)?.with_system_message(SYSTEM_MESSAGE);
    let participants: Vec<Arc<dyn ChatAgent>> = vec![Arc::new(assistant)];

    Ok(RoundRobinGroupChat::new(participants)?
        .with_termination(TextMentionTermination::new("TERMINATE")))
}

/// A single assistant tells a story until it says TERMINATE.
pub async fn run<W: Write>(
    model_client: Arc<dyn LlmClient>,
    console: &mut Console<W>,
) -> Result<TaskResult> {
    converse(model_client, console)
        .instrument(tracing::info_span!("simple_conversation"))
        .await
}

async fn converse<W: Write>(
    model_client: Arc<dyn LlmClient>,
    console: &mut Console<W>,
) -> Result<TaskResult> {
    let team = Arc::new(build_team(model_client)?);

    writeln!(console.get_mut(), "Starting conversation...\n")?;
    let result = console.run(team.run_stream(TASK)).await?;

    writeln!(
        console.get_mut(),
        "\nConversation completed. Messages exchanged: {}",
        result.messages.len()
    )?;
    Ok(result)
}
