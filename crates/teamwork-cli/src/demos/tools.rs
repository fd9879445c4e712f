use anyhow::Result;
use std::io::Write;
use std::sync::Arc;
use teamwork_core::tools::{product_tool, sum_tool, weather_tool};
use teamwork_core::{
    AssistantAgent, ChatAgent, Console, LlmClient, MaxMessageTermination, RoundRobinGroupChat,
    TaskResult, ToolRegistry,
};
use tracing::Instrument;

pub const SYSTEM_MESSAGE: &str = "You are a helpful assistant with access to math and weather tools.
Use the available tools to help answer user questions. When all tasks are complete, say DONE.";

pub const TASK: &str = "Please help me with the following:
1. What is 15 + 27?
2. What is 8 * 12?
3. What's the weather like in Tokyo?";

pub fn build_team(model_client: Arc<dyn LlmClient>) -> Result<RoundRobinGroupChat> {
    let tools = ToolRegistry::new()
        .with(sum_tool())
        .with(product_tool())
        .with(weather_tool());

    let assistant = AssistantAgent::new("MathWeatherAssistant", model_client)?
        .with_system_message(SYSTEM_MESSAGE)
        .with_tools(tools);
    let participants: Vec<Arc<dyn ChatAgent>> = vec![Arc::new(assistant)];

    // Only the message cap ends the run
    Ok(RoundRobinGroupChat::new(participants)?.with_termination(MaxMessageTermination::new(10)))
}

pub async fn run<W: Write>(
    model_client: Arc<dyn LlmClient>,
    console: &mut Console<W>,
) -> Result<TaskResult> {
    converse(model_client, console)
        .instrument(tracing::info_span!("agent_with_tools"))
        .await
}

async fn converse<W: Write>(
    model_client: Arc<dyn LlmClient>,
    console: &mut Console<W>,
) -> Result<TaskResult> {
    let team = Arc::new(build_team(model_client)?);

    writeln!(console.get_mut(), "Starting agent with tools...\n")?;
    let result = console.run(team.run_stream(TASK)).await?;

    writeln!(
        console.get_mut(),
        "\nTask completed. Messages exchanged: {}",
        result.messages.len()
    )?;
    Ok(result)
}
