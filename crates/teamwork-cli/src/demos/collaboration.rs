use anyhow::Result;
use std::io::Write;
use std::sync::Arc;
use teamwork_core::{
    AssistantAgent, ChatAgent, Console, LlmClient, MaxMessageTermination, RoundRobinGroupChat,
    TaskResult, TextMentionTermination,
};
use tracing::Instrument;

pub const RESEARCHER_PROMPT: &str = "You are a research specialist. Your role is to:
1. Gather and analyze information on given topics
2. Provide factual, well-researched insights
3. Cite your reasoning clearly
You work with the Writer to create comprehensive content.";

pub const WRITER_PROMPT: &str = "You are a professional writer. Your role is to:
1. Transform research into engaging, well-structured content
2. Ensure clarity and readability
3. Create compelling narratives from factual information
You work with the Researcher to produce high-quality articles.";

pub const CRITIC_PROMPT: &str = "You are a content critic. Your role is to:
1. Review the work produced by the Researcher and Writer
2. Provide constructive feedback
3. Ensure accuracy, clarity, and quality
When the content meets high standards, respond with TERMINATE.";

pub const TASK: &str = "Create a brief article (2-3 paragraphs) about the benefits of \
multi-agent systems in artificial intelligence. The Researcher should gather \
key points, the Writer should create the article, and the Critic should review it.";

pub fn build_team(model_client: Arc<dyn LlmClient>) -> Result<RoundRobinGroupChat> {
    let researcher = AssistantAgent::new("Researcher", model_client.clone())?
        .with_system_message(RESEARCHER_PROMPT);
    let writer =
        AssistantAgent::new("Writer", model_client.clone())?.with_system_message(WRITER_PROMPT);
    let critic = AssistantAgent::new("Critic", model_client)?.with_system_message(CRITIC_PROMPT);

    let participants: Vec<Arc<dyn ChatAgent>> =
        vec![Arc::new(researcher), Arc::new(writer), Arc::new(critic)];
    let termination = TextMentionTermination::new("TERMINATE") | MaxMessageTermination::new(20);

    Ok(RoundRobinGroupChat::new(participants)?.with_termination(termination))
}

pub async fn run<W: Write>(
    model_client: Arc<dyn LlmClient>,
    console: &mut Console<W>,
) -> Result<TaskResult> {
    converse(model_client, console)
        .instrument(tracing::info_span!("multi_agent_collaboration"))
        .await
}

async fn converse<W: Write>(
    model_client: Arc<dyn LlmClient>,
    console: &mut Console<W>,
) -> Result<TaskResult> {
    let team = Arc::new(build_team(model_client)?);

    writeln!(console.get_mut(), "Starting multi-agent collaboration...\n")?;
    let result = console.run(team.run_stream(TASK)).await?;

    let out = console.get_mut();
    writeln!(
        out,
        "\nCollaboration completed. Total messages: {}",
        result.messages.len()
    )?;
    writeln!(
        out,
        "Stop reason: {}",
        result.stop_reason.as_deref().unwrap_or("None")
    )?;
    Ok(result)
}
