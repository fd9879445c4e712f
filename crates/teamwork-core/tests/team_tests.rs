mod common;

use common::{text, text_with_usage, tool_call, FailingAgent, MockLlm, ScriptedAgent};
use std::sync::Arc;
use teamwork_core::tools::sum_tool;
use teamwork_core::{
    AssistantAgent, ChatAgent, Console, MaxMessageTermination, MessageKind, RoundRobinGroupChat,
    SelectorGroupChat, TeamError, TextMentionTermination,
};

fn sources(result: &teamwork_core::TaskResult) -> Vec<String> {
    result.messages.iter().map(|m| m.source.clone()).collect()
}

#[tokio::test]
async fn test_round_robin_order_and_max_messages() {
    let writer = ScriptedAgent::new("Writer", &["draft", "second draft"]);
    let critic = ScriptedAgent::new("Critic", &["needs work"]);
    let participants: Vec<Arc<dyn ChatAgent>> = vec![writer.clone(), critic.clone()];

    let team = RoundRobinGroupChat::new(participants)
        .unwrap()
        .with_termination(MaxMessageTermination::new(4));

    let result = team.run("Write a poem").await.unwrap();

    assert_eq!(sources(&result), ["user", "Writer", "Critic", "Writer"]);
    assert_eq!(
        result.stop_reason.as_deref(),
        Some("Maximum number of messages 4 reached, current message count: 4")
    );
}

#[tokio::test]
async fn test_text_mention_stops_run() {
    let writer = ScriptedAgent::new("Writer", &["draft"]);
    let critic = ScriptedAgent::new("Critic", &["Looks good. APPROVED"]);
    let participants: Vec<Arc<dyn ChatAgent>> = vec![writer, critic];

    let team = RoundRobinGroupChat::new(participants)
        .unwrap()
        .with_termination(TextMentionTermination::new("APPROVED"));

    let result = team.run("Write an article").await.unwrap();

    assert_eq!(result.messages.len(), 3);
    assert_eq!(result.stop_reason.as_deref(), Some("Text 'APPROVED' mentioned"));
}

#[tokio::test]
async fn test_or_termination_reports_first_condition_to_fire() {
    let a = ScriptedAgent::new("Alice", &["one", "two", "three"]);
    let participants: Vec<Arc<dyn ChatAgent>> = vec![a];

    let termination = TextMentionTermination::new("DONE") | MaxMessageTermination::new(3);
    let team = RoundRobinGroupChat::new(participants)
        .unwrap()
        .with_termination(termination);

    let result = team.run("count").await.unwrap();

    assert_eq!(result.messages.len(), 3);
    assert_eq!(
        result.stop_reason.as_deref(),
        Some("Maximum number of messages 3 reached, current message count: 3")
    );
}

#[tokio::test]
async fn test_agents_receive_only_unseen_messages() {
    let writer = ScriptedAgent::new("Writer", &["w1", "w2"]);
    let critic = ScriptedAgent::new("Critic", &["c1"]);
    let participants: Vec<Arc<dyn ChatAgent>> = vec![writer.clone(), critic.clone()];

    let team = RoundRobinGroupChat::new(participants)
        .unwrap()
        .with_termination(MaxMessageTermination::new(4));
    team.run("task").await.unwrap();

    let writer_turns = writer.received();
    assert_eq!(writer_turns.len(), 2);
    let first: Vec<&str> = writer_turns[0].iter().map(|m| m.content.as_str()).collect();
    assert_eq!(first, ["task"]);
    // Second turn: the writer's own message is not redelivered
    let second: Vec<&str> = writer_turns[1].iter().map(|m| m.content.as_str()).collect();
    assert_eq!(second, ["c1"]);

    let critic_turns = critic.received();
    let seen: Vec<&str> = critic_turns[0].iter().map(|m| m.content.as_str()).collect();
    assert_eq!(seen, ["task", "w1"]);
}

#[tokio::test]
async fn test_max_turns_without_termination() {
    let a = ScriptedAgent::new("Alice", &[]);
    let b = ScriptedAgent::new("Bob", &[]);
    let participants: Vec<Arc<dyn ChatAgent>> = vec![a, b];

    let team = RoundRobinGroupChat::new(participants)
        .unwrap()
        .with_max_turns(3);
    let result = team.run("go").await.unwrap();

    assert_eq!(sources(&result), ["user", "Alice", "Bob", "Alice"]);
    assert_eq!(
        result.stop_reason.as_deref(),
        Some("Maximum number of turns 3 reached.")
    );
}

#[tokio::test]
async fn test_second_run_continues_conversation() {
    let a = ScriptedAgent::new("Alice", &["a1", "a2"]);
    let b = ScriptedAgent::new("Bob", &["b1", "b2"]);
    let participants: Vec<Arc<dyn ChatAgent>> = vec![a.clone(), b];

    let team = RoundRobinGroupChat::new(participants)
        .unwrap()
        .with_termination(MaxMessageTermination::new(2));

    let first = team.run("first task").await.unwrap();
    assert_eq!(sources(&first), ["user", "Alice"]);

    // Termination was reset, and the next speaker follows on from Alice
    let second = team.run("second task").await.unwrap();
    assert_eq!(sources(&second), ["user", "Bob"]);
    assert_eq!(second.messages[0].content, "second task");
    assert_eq!(a.received().len(), 1);
}

#[tokio::test]
async fn test_reset_forgets_thread() {
    let a = ScriptedAgent::new("Alice", &["a1", "a2"]);
    let participants: Vec<Arc<dyn ChatAgent>> = vec![a.clone()];

    let team = RoundRobinGroupChat::new(participants)
        .unwrap()
        .with_termination(MaxMessageTermination::new(2));
    team.run("one").await.unwrap();
    team.reset().await;
    assert!(a.received().is_empty());

    team.run("two").await.unwrap();
    let received = a.received();
    let delivered: Vec<&str> = received[0].iter().map(|m| m.content.as_str()).collect();
    assert_eq!(delivered, ["two"]);
}

#[tokio::test]
async fn test_task_can_trigger_termination() {
    let a = ScriptedAgent::new("Alice", &["never"]);
    let participants: Vec<Arc<dyn ChatAgent>> = vec![a.clone()];

    let team = RoundRobinGroupChat::new(participants)
        .unwrap()
        .with_termination(TextMentionTermination::new("TERMINATE"));
    let result = team.run("Reply TERMINATE").await.unwrap();

    assert_eq!(result.messages.len(), 1);
    assert!(a.received().is_empty());
}

#[tokio::test]
async fn test_tool_events_do_not_count_as_messages() {
    let mock = MockLlm::new(vec![tool_call("call_1", "calculate_sum", r#"{"a": 15, "b": 27}"#)]);
    let agent = Arc::new(
        AssistantAgent::new("MathAssistant", mock)
            .unwrap()
            .with_tool(sum_tool()),
    );
    let participants: Vec<Arc<dyn ChatAgent>> = vec![agent];

    let team = RoundRobinGroupChat::new(participants)
        .unwrap()
        .with_termination(MaxMessageTermination::new(2));
    let result = team.run("What is 15 + 27?").await.unwrap();

    let kinds: Vec<MessageKind> = result.messages.iter().map(|m| m.kind).collect();
    assert_eq!(
        kinds,
        [
            MessageKind::Text,
            MessageKind::ToolCallRequest,
            MessageKind::ToolCallExecution,
            MessageKind::ToolCallSummary,
        ]
    );
    assert_eq!(result.chat_messages().count(), 2);
}

#[tokio::test]
async fn test_agent_error_aborts_run() {
    let participants: Vec<Arc<dyn ChatAgent>> =
        vec![ScriptedAgent::new("Alice", &["hi"]), Arc::new(FailingAgent)];

    let team = RoundRobinGroupChat::new(participants)
        .unwrap()
        .with_termination(MaxMessageTermination::new(10));
    let err = team.run("go").await.unwrap_err();
    assert!(matches!(err, TeamError::Llm(_)));
}

#[test]
fn test_team_validation() {
    let empty: Vec<Arc<dyn ChatAgent>> = Vec::new();
    assert!(RoundRobinGroupChat::new(empty).is_err());

    let duplicate: Vec<Arc<dyn ChatAgent>> = vec![
        ScriptedAgent::new("Alice", &[]),
        ScriptedAgent::new("Alice", &[]),
    ];
    assert!(RoundRobinGroupChat::new(duplicate).is_err());

    let reserved: Vec<Arc<dyn ChatAgent>> = vec![ScriptedAgent::new("user", &[])];
    assert!(RoundRobinGroupChat::new(reserved).is_err());

    let spaced: Vec<Arc<dyn ChatAgent>> = vec![ScriptedAgent::new("Data Analyst", &[])];
    assert!(RoundRobinGroupChat::new(spaced).is_err());
}

#[tokio::test]
async fn test_run_stream_through_console() {
    let writer = ScriptedAgent::new("Writer", &["A short story."]);
    let critic = ScriptedAgent::new("Critic", &["APPROVED"]);
    let participants: Vec<Arc<dyn ChatAgent>> = vec![writer, critic];

    let team = Arc::new(
        RoundRobinGroupChat::new(participants)
            .unwrap()
            .with_termination(TextMentionTermination::new("APPROVED")),
    );

    let mut console = Console::with_writer(Vec::new());
    let result = console.run(team.run_stream("Tell a story")).await.unwrap();
    let output = String::from_utf8(console.into_inner()).unwrap();

    assert_eq!(result.messages.len(), 3);
    assert!(output.contains("---------- TextMessage (user) ----------\nTell a story\n"));
    assert!(output.contains("---------- TextMessage (Writer) ----------\nA short story.\n"));
    assert!(output.contains("---------- TextMessage (Critic) ----------\nAPPROVED\n"));
    assert!(!output.contains("Summary"));
}

#[tokio::test]
async fn test_console_stats() {
    let mock = MockLlm::new(vec![text_with_usage("Hello! DONE", 12, 3)]);
    let agent = Arc::new(AssistantAgent::new("Assistant", mock).unwrap());
    let participants: Vec<Arc<dyn ChatAgent>> = vec![agent];

    let team = Arc::new(
        RoundRobinGroupChat::new(participants)
            .unwrap()
            .with_termination(TextMentionTermination::new("DONE")),
    );

    let mut console = Console::with_writer(Vec::new()).with_stats(true);
    console.run(team.run_stream("Say hello")).await.unwrap();
    let output = String::from_utf8(console.into_inner()).unwrap();

    assert!(output.contains("[Prompt tokens: 12, Completion tokens: 3]"));
    assert!(output.contains("---------- Summary ----------"));
    assert!(output.contains("Number of messages: 2"));
    assert!(output.contains("Finish reason: Text 'DONE' mentioned"));
    assert!(output.contains("Total prompt tokens: 12"));
}

#[tokio::test]
async fn test_run_stream_surfaces_errors() {
    let participants: Vec<Arc<dyn ChatAgent>> = vec![Arc::new(FailingAgent)];
    let team = Arc::new(RoundRobinGroupChat::new(participants).unwrap().with_max_turns(2));

    let mut console = Console::with_writer(Vec::new());
    let err = console.run(team.run_stream("go")).await.unwrap_err();
    assert!(matches!(err, TeamError::Llm(_)));
}

// Selector

fn selector_team(
    selector_script: Vec<Vec<teamwork_core::StreamEvent>>,
) -> (Arc<MockLlm>, SelectorGroupChat) {
    let selector = MockLlm::new(selector_script);
    let participants: Vec<Arc<dyn ChatAgent>> = vec![
        ScriptedAgent::new("Researcher", &["facts"]),
        ScriptedAgent::new("Analyst", &["insights"]),
        ScriptedAgent::new("Writer", &["report"]),
    ];
    let team = SelectorGroupChat::new(participants, selector.clone())
        .unwrap()
        .with_termination(MaxMessageTermination::new(2));
    (selector, team)
}

#[tokio::test]
async fn test_selector_uses_model_choice() {
    let (selector, team) = selector_team(vec![text("Analyst")]);

    let result = team.run("Analyze renewable energy").await.unwrap();

    assert_eq!(sources(&result), ["user", "Analyst"]);
    let prompt = &selector.requests()[0].0[0].content;
    assert!(prompt.contains("Researcher: Scripted test agent"));
    assert!(prompt.contains("['Researcher', 'Analyst', 'Writer']"));
    assert!(prompt.contains("user: Analyze renewable energy"));
}

#[tokio::test]
async fn test_selector_retries_with_feedback() {
    let (selector, team) = selector_team(vec![text("Nobody"), text("Writer or Analyst"), text("Writer")]);

    let result = team.run("task").await.unwrap();

    assert_eq!(sources(&result), ["user", "Writer"]);
    let requests = selector.requests();
    assert_eq!(requests.len(), 3);
    assert!(requests[1].0[2].content.starts_with("No valid name was mentioned"));
    assert!(requests[2].0[4]
        .content
        .starts_with("Expected exactly one name to be mentioned"));
}

#[tokio::test]
async fn test_selector_falls_back_to_first_candidate() {
    let (selector, team) = selector_team(vec![text("?"), text("?"), text("?")]);

    let result = team.run("task").await.unwrap();

    assert_eq!(sources(&result), ["user", "Researcher"]);
    assert_eq!(selector.requests().len(), 3);
}

#[tokio::test]
async fn test_selector_excludes_previous_speaker() {
    let selector = MockLlm::new(vec![text("Researcher"), text("Analyst")]);
    let participants: Vec<Arc<dyn ChatAgent>> = vec![
        ScriptedAgent::new("Researcher", &["facts"]),
        ScriptedAgent::new("Analyst", &["insights"]),
    ];
    let team = SelectorGroupChat::new(participants, selector.clone())
        .unwrap()
        .with_termination(MaxMessageTermination::new(3));

    let result = team.run("task").await.unwrap();

    // With one candidate left the model is not asked
    assert_eq!(sources(&result), ["user", "Researcher", "Analyst"]);
    assert_eq!(selector.requests().len(), 1);
}

#[tokio::test]
async fn test_selector_repeated_speaker_allowed() {
    let selector = MockLlm::new(vec![text("Researcher"), text("Researcher")]);
    let participants: Vec<Arc<dyn ChatAgent>> = vec![
        ScriptedAgent::new("Researcher", &["facts", "more facts"]),
        ScriptedAgent::new("Analyst", &["insights"]),
    ];
    let team = SelectorGroupChat::new(participants, selector)
        .unwrap()
        .with_allow_repeated_speaker(true)
        .with_termination(MaxMessageTermination::new(3));

    let result = team.run("task").await.unwrap();
    assert_eq!(sources(&result), ["user", "Researcher", "Researcher"]);
}

#[tokio::test]
async fn test_selector_falls_back_to_previous_speaker() {
    let selector = MockLlm::new(vec![text("Analyst"), text("?"), text("?"), text("?")]);
    let participants: Vec<Arc<dyn ChatAgent>> = vec![
        ScriptedAgent::new("Researcher", &["facts"]),
        ScriptedAgent::new("Analyst", &["insights", "more insights"]),
        ScriptedAgent::new("Writer", &["report"]),
    ];
    let team = SelectorGroupChat::new(participants, selector.clone())
        .unwrap()
        .with_termination(MaxMessageTermination::new(3));

    let result = team.run("task").await.unwrap();

    // The previous speaker is not a candidate, but it is the fallback
    assert_eq!(sources(&result), ["user", "Analyst", "Analyst"]);
    assert_eq!(result.messages[2].content, "more insights");
    let requests = selector.requests();
    assert_eq!(requests.len(), 4);
    assert!(requests[1].0[0].content.contains("['Researcher', 'Writer']"));
}
