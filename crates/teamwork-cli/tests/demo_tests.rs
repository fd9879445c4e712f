use futures::channel::mpsc::{unbounded, UnboundedReceiver};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use teamwork_cli::demos::{collaboration, observability, selector, simple, tools};
use teamwork_cli::Demo;
use teamwork_core::{
    Console, LlmClient, LlmResponse, Message, MessageKind, Settings, StreamEvent, TeamError,
    ToolDefinition,
};

/// Replays scripted replies in order; tool calls are written as
/// `call:<name>:<json arguments>`.
struct ReplayLlm {
    replies: Mutex<VecDeque<String>>,
    calls: Mutex<usize>,
}

impl ReplayLlm {
    fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            calls: Mutex::new(0),
        })
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }

    fn next_reply(&self) -> String {
        *self.calls.lock().unwrap() += 1;
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| "Nothing to add.".to_string())
    }
}

#[async_trait::async_trait]
impl LlmClient for ReplayLlm {
    fn model(&self) -> &str {
        "replay"
    }

    async fn chat(
        &self,
        _messages: &[Message],
        _tools: &[ToolDefinition],
    ) -> Result<LlmResponse, TeamError> {
        Ok(LlmResponse {
            message: Message::assistant(self.next_reply()),
            usage: None,
        })
    }

    async fn chat_stream(
        &self,
        _messages: &[Message],
        _tools: &[ToolDefinition],
    ) -> Result<UnboundedReceiver<StreamEvent>, TeamError> {
        let reply = self.next_reply();
        let (tx, rx) = unbounded();

        let events = match reply.strip_prefix("call:") {
            Some(call) => {
                let (name, arguments) = call.split_once(':').unwrap();
                let id = format!("call_{}", self.calls());
                vec![
                    StreamEvent::ToolCallStart {
                        id: id.clone(),
                        name: name.to_string(),
                    },
                    StreamEvent::ToolCallDelta {
                        id: id.clone(),
                        arguments_delta: arguments.to_string(),
                    },
                    StreamEvent::ToolCallEnd { id },
                    StreamEvent::Done,
                ]
            }
            None => vec![StreamEvent::TextDelta(reply), StreamEvent::Done],
        };
        for event in events {
            tx.unbounded_send(event).unwrap();
        }
        Ok(rx)
    }
}

fn output(console: Console<Vec<u8>>) -> String {
    String::from_utf8(console.into_inner()).unwrap()
}

#[tokio::test]
async fn test_simple_demo() {
    let llm = ReplayLlm::new(&["Once upon a time, agents worked together. TERMINATE"]);
    let mut console = Console::with_writer(Vec::new());

    let result = simple::run(llm.clone(), &mut console).await.unwrap();

    assert_eq!(result.messages.len(), 2);
    assert_eq!(result.stop_reason.as_deref(), Some("Text 'TERMINATE' mentioned"));
    let out = output(console);
    assert!(out.starts_with("Starting conversation...\n"));
    assert!(out.contains("---------- TextMessage (Assistant) ----------"));
    assert!(out.ends_with("Conversation completed. Messages exchanged: 2\n"));
}

#[tokio::test]
async fn test_tools_demo_runs_to_message_cap() {
    let llm = ReplayLlm::new(&[
        r#"call:calculate_sum:{"a": 15, "b": 27}"#,
        r#"call:calculate_product:{"a": 8, "b": 12}"#,
        r#"call:get_weather:{"city": "Tokyo"}"#,
        "15 + 27 = 42, 8 * 12 = 96 and Tokyo is rainy. DONE",
    ]);
    let mut console = Console::with_writer(Vec::new());

    let result = tools::run(llm, &mut console).await.unwrap();

    // Tool events are listed but only chat messages count toward the cap
    assert_eq!(result.chat_messages().count(), 10);
    assert_eq!(
        result.stop_reason.as_deref(),
        Some("Maximum number of messages 10 reached, current message count: 10")
    );
    let summaries: Vec<&str> = result
        .messages
        .iter()
        .filter(|m| m.kind == MessageKind::ToolCallSummary)
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(summaries, ["42.0", "96.0", "Rainy, 20°C"]);

    let out = output(console);
    assert!(out.contains("---------- ToolCallRequestEvent (MathWeatherAssistant) ----------"));
    assert!(out.contains("Task completed. Messages exchanged: 16"));
}

#[tokio::test]
async fn test_collaboration_demo_round_robin() {
    let llm = ReplayLlm::new(&[
        "Key points: specialization, parallelism, robustness.",
        "Multi-agent systems divide hard problems...",
        "Clear and accurate. TERMINATE",
    ]);
    let mut console = Console::with_writer(Vec::new());

    let result = collaboration::run(llm, &mut console).await.unwrap();

    let sources: Vec<&str> = result.messages.iter().map(|m| m.source.as_str()).collect();
    assert_eq!(sources, ["user", "Researcher", "Writer", "Critic"]);
    let out = output(console);
    assert!(out.contains("Collaboration completed. Total messages: 4"));
    assert!(out.contains("Stop reason: Text 'TERMINATE' mentioned"));
}

#[tokio::test]
async fn test_selector_demo_uses_separate_selector_client() {
    let agents = ReplayLlm::new(&[
        "We need house sizes and prices. PASS",
        "The model is linear regression. DONE",
    ]);
    let picker = ReplayLlm::new(&["DataAnalyst", "MLSpecialist"]);
    let mut console = Console::with_writer(Vec::new());

    let result = selector::run(agents.clone(), picker.clone(), &mut console)
        .await
        .unwrap();

    let sources: Vec<&str> = result.messages.iter().map(|m| m.source.as_str()).collect();
    assert_eq!(sources, ["user", "DataAnalyst", "MLSpecialist"]);
    assert_eq!(picker.calls(), 2);
    assert_eq!(agents.calls(), 2);

    let out = output(console);
    assert!(out.contains("Task completed!\nTotal messages: 3\n"));
    assert!(out.contains("Stop reason: Text 'DONE' mentioned"));
}

#[test]
fn test_selector_team_descriptions() {
    let team = selector::build_team(ReplayLlm::new(&[]), ReplayLlm::new(&[])).unwrap();
    let descriptions: Vec<&str> = team.participants().iter().map(|a| a.description()).collect();
    assert_eq!(
        descriptions,
        [
            "Expert in data analysis and statistics",
            "Expert in Python programming and software engineering",
            "Expert in machine learning and AI model development",
        ]
    );
}

#[tokio::test]
async fn test_observability_demo_lists_messages() {
    let llm = ReplayLlm::new(&["Observability is knowing what a system does. DONE"]);
    let mut console = Console::with_writer(Vec::new());

    let result = observability::run(llm, &mut console).await.unwrap();

    // DONE does not stop this team; five messages do
    assert_eq!(result.messages.len(), 5);
    let out = output(console);
    assert!(out.contains("Messages exchanged: 5"));
    assert!(out.contains(&format!(
        "  [1] user: {} chars",
        observability::TASK.chars().count()
    )));
    assert!(out.contains("  [2] Assistant: 49 chars"));
    assert!(out.contains("  [5] Assistant: 15 chars"));
}

#[tokio::test]
async fn test_missing_credentials_fail_before_running() {
    let settings = Settings::from_lookup(|_| None).unwrap();
    let mut console = Console::with_writer(Vec::new());

    let err = teamwork_cli::demos::run(Demo::Simple, &settings, &mut console)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("OPENAI_API_KEY"));
    assert!(output(console).is_empty());
}
