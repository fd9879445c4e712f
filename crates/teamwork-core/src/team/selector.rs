use crate::agent::ChatAgent;
use crate::constants::defaults;
use crate::error::TeamError;
use crate::llm::{LlmClient, Message};
use crate::messages::TeamMessage;
use regex::Regex;
use std::sync::Arc;

/// Picks the next speaker of a group chat.
#[async_trait::async_trait]
pub trait SpeakerSelector: Send + Sync {
    /// Return the index into `participants` of the next speaker. `thread` is
    /// the whole conversation so far, task included.
    async fn select(
        &self,
        participants: &[Arc<dyn ChatAgent>],
        thread: &[TeamMessage],
        previous: Option<usize>,
    ) -> Result<usize, TeamError>;
}

/// Participants take turns in order, wrapping around.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoundRobin;

#[async_trait::async_trait]
impl SpeakerSelector for RoundRobin {
    async fn select(
        &self,
        participants: &[Arc<dyn ChatAgent>],
        _thread: &[TeamMessage],
        previous: Option<usize>,
    ) -> Result<usize, TeamError> {
        Ok(previous.map_or(0, |p| (p + 1) % participants.len()))
    }
}

pub const DEFAULT_SELECTOR_PROMPT: &str = "You are in a role play game. The following roles are available:
{roles}.
Read the following conversation. Then select the next role from {participants} to play. Only return the role.

{history}

Read the above conversation. Then select the next role from {participants} to play. Only return the role.
";

/// Asks a model client which participant should speak next.
pub struct LlmSelector {
    llm: Arc<dyn LlmClient>,
    prompt_template: String,
    allow_repeated_speaker: bool,
    max_attempts: usize,
}

impl LlmSelector {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            prompt_template: DEFAULT_SELECTOR_PROMPT.to_string(),
            allow_repeated_speaker: false,
            max_attempts: defaults::MAX_SELECTOR_ATTEMPTS,
        }
    }

    /// Template with `{roles}`, `{participants}` and `{history}` placeholders.
    pub fn with_prompt(mut self, template: impl Into<String>) -> Self {
        self.prompt_template = template.into();
        self
    }

    pub fn with_allow_repeated_speaker(mut self, allow: bool) -> Self {
        self.allow_repeated_speaker = allow;
        self
    }

    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    fn build_prompt(&self, candidates: &[&Arc<dyn ChatAgent>], thread: &[TeamMessage]) -> String {
        let roles = candidates
            .iter()
            .map(|a| format!("{}: {}", a.name(), a.description()))
            .collect::<Vec<_>>()
            .join("\n");
        let history = thread
            .iter()
            .filter(|m| !m.is_event())
            .map(|m| format!("{}: {}", m.source, m.content))
            .collect::<Vec<_>>()
            .join("\n");
        self.prompt_template
            .replace("{roles}", &roles)
            .replace("{participants}", &name_list(candidates))
            .replace("{history}", &history)
    }
}

#[async_trait::async_trait]
impl SpeakerSelector for LlmSelector {
    async fn select(
        &self,
        participants: &[Arc<dyn ChatAgent>],
        thread: &[TeamMessage],
        previous: Option<usize>,
    ) -> Result<usize, TeamError> {
        let candidates: Vec<usize> = (0..participants.len())
            .filter(|&i| {
                self.allow_repeated_speaker || participants.len() == 1 || Some(i) != previous
            })
            .collect();

        if let [only] = candidates.as_slice() {
            return Ok(*only);
        }

        let agents: Vec<&Arc<dyn ChatAgent>> =
            candidates.iter().map(|&i| &participants[i]).collect();
        let names: Vec<&str> = agents.iter().map(|a| a.name()).collect();

        let mut messages = vec![Message::user(self.build_prompt(&agents, thread))];

        for attempt in 1..=self.max_attempts {
            let response = self.llm.chat(&messages, &[]).await?;
            let reply = response.message.content;
            let mentioned = mentioned_agents(&reply, &names);

            let feedback = match mentioned.as_slice() {
                [chosen] => {
                    tracing::debug!(speaker = names[*chosen], attempt, "selected next speaker");
                    return Ok(candidates[*chosen]);
                }
                [] => format!(
                    "No valid name was mentioned. Please select from: {}.",
                    name_list(&agents)
                ),
                _ => format!(
                    "Expected exactly one name to be mentioned. Please select only one from: {}.",
                    name_list(&agents)
                ),
            };

            tracing::debug!(attempt, reply = %reply, "selector reply rejected");
            messages.push(Message::assistant(reply));
            messages.push(Message::user(feedback));
        }

        let fallback = previous.unwrap_or(candidates[0]);
        tracing::warn!(
            "no speaker selected after {} attempts, falling back to {}",
            self.max_attempts,
            participants[fallback].name()
        );
        Ok(fallback)
    }
}

fn name_list(agents: &[&Arc<dyn ChatAgent>]) -> String {
    let quoted: Vec<String> = agents.iter().map(|a| format!("'{}'", a.name())).collect();
    format!("[{}]", quoted.join(", "))
}

/// Indices of the names that appear as whole words in `reply`. Underscored
/// names also match when written with spaces.
fn mentioned_agents(reply: &str, names: &[&str]) -> Vec<usize> {
    names
        .iter()
        .enumerate()
        .filter(|(_, name)| {
            let spaced = name.replace('_', " ");
            [name.to_string(), spaced].iter().any(|variant| {
                let pattern = format!(r"(?:^|\W){}(?:\W|$)", regex::escape(variant));
                Regex::new(&pattern).is_ok_and(|re| re.is_match(reply))
            })
        })
        .map(|(i, _)| i)
        .collect()
}
