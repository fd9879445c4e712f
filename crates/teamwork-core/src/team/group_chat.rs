use crate::agent::{validate_agent_name, ChatAgent};
use crate::constants::sources;
use crate::error::TeamError;
use crate::llm::LlmClient;
use crate::messages::{StopMessage, TaskResult, TeamEvent, TeamMessage};
use crate::team::selector::{LlmSelector, RoundRobin, SpeakerSelector};
use crate::team::termination::TerminationCondition;
use futures::Stream;
use std::collections::HashSet;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::Instrument;

/// Agents taking turns in a shared thread until a termination condition
/// fires or the turn limit is reached.
pub struct GroupChat<S> {
    participants: Vec<Arc<dyn ChatAgent>>,
    selector: S,
    max_turns: Option<usize>,
    state: Mutex<ChatState>,
}

/// Participants speak in list order.
pub type RoundRobinGroupChat = GroupChat<RoundRobin>;

/// A model client picks each speaker.
pub type SelectorGroupChat = GroupChat<LlmSelector>;

struct ChatState {
    thread: Vec<TeamMessage>,
    /// Per participant, how much of `thread` it has been given.
    delivered: Vec<usize>,
    previous: Option<usize>,
    termination: Option<Box<dyn TerminationCondition>>,
}

impl RoundRobinGroupChat {
    pub fn new(participants: Vec<Arc<dyn ChatAgent>>) -> Result<Self, TeamError> {
        Self::with_selector(participants, RoundRobin)
    }
}

impl SelectorGroupChat {
    pub fn new(
        participants: Vec<Arc<dyn ChatAgent>>,
        model_client: Arc<dyn LlmClient>,
    ) -> Result<Self, TeamError> {
        Self::with_selector(participants, LlmSelector::new(model_client))
    }

    pub fn with_allow_repeated_speaker(mut self, allow: bool) -> Self {
        self.selector = self.selector.with_allow_repeated_speaker(allow);
        self
    }

    pub fn with_max_selector_attempts(mut self, attempts: usize) -> Self {
        self.selector = self.selector.with_max_attempts(attempts);
        self
    }

    pub fn with_selector_prompt(mut self, template: impl Into<String>) -> Self {
        self.selector = self.selector.with_prompt(template);
        self
    }
}

impl<S: SpeakerSelector> GroupChat<S> {
    pub fn with_selector(
        participants: Vec<Arc<dyn ChatAgent>>,
        selector: S,
    ) -> Result<Self, TeamError> {
        if participants.is_empty() {
            return Err(TeamError::Config("a team needs at least one participant".into()));
        }
        let mut seen = HashSet::new();
        for agent in &participants {
            validate_agent_name(agent.name())?;
            if agent.name() == sources::USER {
                return Err(TeamError::Config(format!(
                    "'{}' is reserved for the task message",
                    sources::USER
                )));
            }
            if !seen.insert(agent.name()) {
                return Err(TeamError::Config(format!(
                    "duplicate participant name '{}'",
                    agent.name()
                )));
            }
        }

        let delivered = vec![0; participants.len()];
        Ok(Self {
            participants,
            selector,
            max_turns: None,
            state: Mutex::new(ChatState {
                thread: Vec::new(),
                delivered,
                previous: None,
                termination: None,
            }),
        })
    }

    pub fn with_termination(mut self, condition: impl TerminationCondition + 'static) -> Self {
        self.state.get_mut().termination = Some(Box::new(condition));
        self
    }

    /// Stop after this many agent turns per run.
    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = Some(max_turns);
        self
    }

    pub fn participants(&self) -> &[Arc<dyn ChatAgent>] {
        &self.participants
    }

    /// Run to completion without streaming.
    pub async fn run(&self, task: impl Into<String>) -> Result<TaskResult, TeamError> {
        self.run_with_events(task, None).await
    }

    /// Run on a spawned task, streaming each message as it is produced.
    pub fn run_stream(self: &Arc<Self>, task: impl Into<String>) -> TeamStream
    where
        S: 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let team = Arc::clone(self);
        let task = task.into();
        let handle = tokio::spawn(
            async move { team.run_with_events(task, Some(tx)).await }.in_current_span(),
        );
        TeamStream { rx, handle }
    }

    /// Run the conversation, sending every message through `event_tx`.
    ///
    /// The thread persists across runs, so a second run continues the same
    /// conversation. Termination is reset when a run ends.
    pub async fn run_with_events(
        &self,
        task: impl Into<String>,
        event_tx: Option<mpsc::UnboundedSender<TeamEvent>>,
    ) -> Result<TaskResult, TeamError> {
        let mut state = self.state.lock().await;
        let start = state.thread.len();

        let outcome = self.drive(&mut state, task.into(), &event_tx).await;

        if let Some(termination) = state.termination.as_mut() {
            termination.reset();
        }

        let stop = outcome?;
        let result = TaskResult {
            messages: state.thread[start..].to_vec(),
            stop_reason: stop.map(|s| s.content),
        };
        tracing::info!(
            messages = result.messages.len(),
            stop_reason = result.stop_reason.as_deref().unwrap_or(""),
            "team run finished"
        );
        if let Some(tx) = &event_tx {
            let _ = tx.send(TeamEvent::Finished(result.clone()));
        }
        Ok(result)
    }

    async fn drive(
        &self,
        state: &mut ChatState,
        task: String,
        event_tx: &Option<mpsc::UnboundedSender<TeamEvent>>,
    ) -> Result<Option<StopMessage>, TeamError> {
        let task_message = TeamMessage::text(sources::USER, task);
        state.thread.push(task_message.clone());
        emit(event_tx, &task_message);

        if let Some(stop) = check_termination(state, std::slice::from_ref(&task_message))? {
            return Ok(Some(stop));
        }

        let mut turns = 0;
        loop {
            if let Some(max) = self.max_turns {
                if turns >= max {
                    return Ok(Some(StopMessage {
                        content: format!("Maximum number of turns {max} reached."),
                        source: "GroupChat".to_string(),
                    }));
                }
            }

            let speaker = self
                .selector
                .select(&self.participants, &state.thread, state.previous)
                .await?;
            let agent = self.participants.get(speaker).ok_or_else(|| {
                TeamError::Selection(format!(
                    "selector chose participant {speaker} of {}",
                    self.participants.len()
                ))
            })?;

            let unseen = state.thread[state.delivered[speaker]..].to_vec();
            let span = tracing::info_span!("agent_turn", agent = agent.name(), turn = turns + 1);
            let response = agent.on_messages(&unseen).instrument(span).await?;

            let mut delta = response.inner_messages;
            delta.push(response.chat_message);
            for message in &delta {
                emit(event_tx, message);
            }
            state.thread.extend(delta.iter().cloned());
            state.delivered[speaker] = state.thread.len();
            state.previous = Some(speaker);
            turns += 1;

            if let Some(stop) = check_termination(state, &delta)? {
                return Ok(Some(stop));
            }
        }
    }

    /// Forget the conversation and every participant's context.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        state.thread.clear();
        state.delivered.iter_mut().for_each(|d| *d = 0);
        state.previous = None;
        if let Some(termination) = state.termination.as_mut() {
            termination.reset();
        }
        for agent in &self.participants {
            agent.reset().await;
        }
    }
}

fn check_termination(
    state: &mut ChatState,
    delta: &[TeamMessage],
) -> Result<Option<StopMessage>, TeamError> {
    match state.termination.as_mut() {
        Some(termination) => termination.check(delta),
        None => Ok(None),
    }
}

fn emit(tx: &Option<mpsc::UnboundedSender<TeamEvent>>, message: &TeamMessage) {
    if let Some(tx) = tx {
        let _ = tx.send(TeamEvent::Message(message.clone()));
    }
}

/// Events of a running team. Ends after [`TeamEvent::Finished`], or early
/// if the run fails; [`TeamStream::result`] then returns the error.
pub struct TeamStream {
    rx: mpsc::UnboundedReceiver<TeamEvent>,
    handle: JoinHandle<Result<TaskResult, TeamError>>,
}

impl TeamStream {
    pub async fn result(self) -> Result<TaskResult, TeamError> {
        self.handle
            .await
            .map_err(|e| TeamError::Other(format!("team run panicked or was cancelled: {e}")))?
    }
}

impl Stream for TeamStream {
    type Item = TeamEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<TeamEvent>> {
        self.rx.poll_recv(cx)
    }
}
