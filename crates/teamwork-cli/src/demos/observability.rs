//! The same kind of run as the other demos, broken into nested spans with
//! fields recorded along the way. With span export on, each span is printed
//! to stderr as it closes.

use anyhow::Result;
use std::io::Write;
use std::sync::Arc;
use teamwork_core::{
    AssistantAgent, ChatAgent, Console, LlmClient, MaxMessageTermination, RoundRobinGroupChat,
    TaskResult,
};
use tracing::{field, info_span, Instrument, Span};

pub const SYSTEM_MESSAGE: &str =
    "You are a helpful assistant. Answer briefly and say DONE when finished.";

pub const TASK: &str = "Explain what observability means in software systems in 2 sentences.";

const RULE: &str = "============================================================";

pub fn build_agent(model_client: Arc<dyn LlmClient>) -> Result<AssistantAgent> {
    Ok(AssistantAgent::new("Assistant", model_client)?.with_system_message(SYSTEM_MESSAGE))
}

pub fn build_team(assistant: AssistantAgent) -> Result<RoundRobinGroupChat> {
    let participants: Vec<Arc<dyn ChatAgent>> = vec![Arc::new(assistant)];
    Ok(RoundRobinGroupChat::new(participants)?.with_termination(MaxMessageTermination::new(5)))
}

pub async fn run<W: Write>(
    model_client: Arc<dyn LlmClient>,
    console: &mut Console<W>,
) -> Result<TaskResult> {
    let span = info_span!(
        "observability_demo",
        environment = "development",
        model = %model_client.model()
    );
    observe(model_client, console).instrument(span).await
}

async fn observe<W: Write>(
    model_client: Arc<dyn LlmClient>,
    console: &mut Console<W>,
) -> Result<TaskResult> {
    let assistant = info_span!("create_agents").in_scope(|| build_agent(model_client))?;
    let team = info_span!("create_team").in_scope(|| build_team(assistant))?;
    let team = Arc::new(team);

    let conversation = info_span!(
        "run_conversation",
        task = "greeting",
        message_count = field::Empty,
        stop_reason = field::Empty
    );
    run_conversation(&team, console).instrument(conversation).await
}

async fn run_conversation<W: Write>(
    team: &Arc<RoundRobinGroupChat>,
    console: &mut Console<W>,
) -> Result<TaskResult> {
    {
        let out = console.get_mut();
        writeln!(out, "Starting conversation with observability...\n")?;
        writeln!(out, "{RULE}")?;
        writeln!(out, "Trace spans will be printed to stderr")?;
        writeln!(out, "{RULE}")?;
        writeln!(out)?;
    }

    let result = console.run(team.run_stream(TASK)).await?;
    let stop_reason = result.stop_reason.as_deref().unwrap_or("None");

    let span = Span::current();
    span.record("message_count", result.messages.len());
    span.record("stop_reason", stop_reason);

    let out = console.get_mut();
    writeln!(out, "\n{RULE}")?;
    writeln!(out, "Conversation Statistics:")?;
    writeln!(out, "{RULE}")?;
    writeln!(out, "Messages exchanged: {}", result.messages.len())?;
    writeln!(out, "Stop reason: {stop_reason}")?;

    info_span!("process_results").in_scope(|| -> std::io::Result<()> {
        for (i, message) in result.messages.iter().enumerate() {
            let length = message.content.chars().count();
            let _message_span = info_span!(
                "message",
                index = i,
                source = %message.source,
                message_length = length
            )
            .entered();
            writeln!(out, "  [{}] {}: {} chars", i + 1, message.source, length)?;
        }
        Ok(())
    })?;

    writeln!(out, "{RULE}")?;
    writeln!(out, "\n✓ Observability data captured via tracing spans")?;
    writeln!(out, "  Check stderr above for exported trace spans\n")?;
    Ok(result)
}
