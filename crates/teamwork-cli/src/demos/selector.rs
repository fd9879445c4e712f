use anyhow::Result;
use std::io::Write;
use std::sync::Arc;
use teamwork_core::{
    AssistantAgent, ChatAgent, Console, LlmClient, MaxMessageTermination, SelectorGroupChat,
    TaskResult, TextMentionTermination,
};
use tracing::Instrument;

pub const DATA_ANALYST_PROMPT: &str = "You are a data analyst expert. You specialize in:
- Data analysis and statistics
- Interpreting datasets and patterns
- Creating data-driven insights
Say PASS when you're done with your part.";

pub const PYTHON_ENGINEER_PROMPT: &str = "You are a Python programming expert. You specialize in:
- Writing clean, efficient Python code
- Implementing algorithms and data structures
- Code optimization and best practices
Say PASS when you're done with your part.";

pub const ML_SPECIALIST_PROMPT: &str = "You are a machine learning specialist. You specialize in:
- Machine learning algorithms and models
- Model training and evaluation
- Feature engineering and selection
Say DONE when the entire task is complete.";

pub const TASK: &str = "We need to build a simple linear regression model.

Steps needed:
1. Analyze what data we need for a basic example
2. Write Python code to generate sample data (e.g., house prices based on size)
3. Explain which ML algorithm to use and why

Each specialist should contribute their expertise when needed.";

/// Specialists share `model_client`; `selector_client` only picks speakers.
pub fn build_team(
    model_client: Arc<dyn LlmClient>,
    selector_client: Arc<dyn LlmClient>,
) -> Result<SelectorGroupChat> {
    let data_analyst = AssistantAgent::new("DataAnalyst", model_client.clone())?
        .with_system_message(DATA_ANALYST_PROMPT)
        .with_description("Expert in data analysis and statistics");
    let python_engineer = AssistantAgent::new("PythonEngineer", model_client.clone())?
        .with_system_message(PYTHON_ENGINEER_PROMPT)
        .with_description("Expert in Python programming and software engineering");
    let ml_specialist = AssistantAgent::new("MLSpecialist", model_client)?
        .with_system_message(ML_SPECIALIST_PROMPT)
        .with_description("Expert in machine learning and AI model development");

    let participants: Vec<Arc<dyn ChatAgent>> = vec![
        Arc::new(data_analyst),
        Arc::new(python_engineer),
        Arc::new(ml_specialist),
    ];
    let termination = TextMentionTermination::new("DONE") | MaxMessageTermination::new(15);

    Ok(SelectorGroupChat::new(participants, selector_client)?.with_termination(termination))
}

pub async fn run<W: Write>(
    model_client: Arc<dyn LlmClient>,
    selector_client: Arc<dyn LlmClient>,
    console: &mut Console<W>,
) -> Result<TaskResult> {
    converse(model_client, selector_client, console)
        .instrument(tracing::info_span!("selector_team"))
        .await
}

async fn converse<W: Write>(
    model_client: Arc<dyn LlmClient>,
    selector_client: Arc<dyn LlmClient>,
    console: &mut Console<W>,
) -> Result<TaskResult> {
    let team = Arc::new(build_team(model_client, selector_client)?);

    writeln!(console.get_mut(), "Starting selector team collaboration...\n")?;
    let result = console.run(team.run_stream(TASK)).await?;

    let out = console.get_mut();
    writeln!(out, "\nTask completed!")?;
    writeln!(out, "Total messages: {}", result.messages.len())?;
    writeln!(
        out,
        "Stop reason: {}",
        result.stop_reason.as_deref().unwrap_or("None")
    )?;
    Ok(result)
}
