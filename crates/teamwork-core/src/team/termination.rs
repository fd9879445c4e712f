use crate::error::TeamError;
use crate::messages::{StopMessage, TeamMessage};
use std::ops::{BitAnd, BitOr};

/// Decides when a team run stops.
///
/// The team calls [`check`](Self::check) with the task message and then with
/// each turn's new messages. Conditions are stateful: once one fires it stays
/// terminated until [`reset`](Self::reset), which the team does at the end of
/// every run.
pub trait TerminationCondition: Send {
    fn check(&mut self, messages: &[TeamMessage]) -> Result<Option<StopMessage>, TeamError>;

    fn terminated(&self) -> bool;

    fn reset(&mut self);
}

impl TerminationCondition for Box<dyn TerminationCondition> {
    fn check(&mut self, messages: &[TeamMessage]) -> Result<Option<StopMessage>, TeamError> {
        (**self).check(messages)
    }

    fn terminated(&self) -> bool {
        (**self).terminated()
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}

/// Stops when a chat message contains the given text.
#[derive(Debug, Clone)]
pub struct TextMentionTermination {
    text: String,
    sources: Option<Vec<String>>,
    terminated: bool,
}

impl TextMentionTermination {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sources: None,
            terminated: false,
        }
    }

    /// Only look at messages from these sources.
    pub fn with_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources = Some(sources.into_iter().map(Into::into).collect());
        self
    }

    fn accepts(&self, source: &str) -> bool {
        self.sources
            .as_ref()
            .map_or(true, |sources| sources.iter().any(|s| s == source))
    }
}

impl TerminationCondition for TextMentionTermination {
    fn check(&mut self, messages: &[TeamMessage]) -> Result<Option<StopMessage>, TeamError> {
        if self.terminated {
            return Err(TeamError::Terminated);
        }
        let mentioned = messages
            .iter()
            .filter(|m| !m.is_event() && self.accepts(&m.source))
            .any(|m| m.content.contains(&self.text));
        if !mentioned {
            return Ok(None);
        }
        self.terminated = true;
        Ok(Some(StopMessage {
            content: format!("Text '{}' mentioned", self.text),
            source: "TextMentionTermination".to_string(),
        }))
    }

    fn terminated(&self) -> bool {
        self.terminated
    }

    fn reset(&mut self) {
        self.terminated = false;
    }
}

/// Stops once the number of chat messages seen reaches `max_messages`.
/// Inner events do not count.
#[derive(Debug, Clone)]
pub struct MaxMessageTermination {
    max_messages: usize,
    count: usize,
    terminated: bool,
}

impl MaxMessageTermination {
    pub fn new(max_messages: usize) -> Self {
        Self {
            max_messages,
            count: 0,
            terminated: false,
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

impl TerminationCondition for MaxMessageTermination {
    fn check(&mut self, messages: &[TeamMessage]) -> Result<Option<StopMessage>, TeamError> {
        if self.terminated {
            return Err(TeamError::Terminated);
        }
        self.count += messages.iter().filter(|m| !m.is_event()).count();
        if self.count < self.max_messages {
            return Ok(None);
        }
        self.terminated = true;
        Ok(Some(StopMessage {
            content: format!(
                "Maximum number of messages {} reached, current message count: {}",
                self.max_messages, self.count
            ),
            source: "MaxMessageTermination".to_string(),
        }))
    }

    fn terminated(&self) -> bool {
        self.terminated
    }

    fn reset(&mut self) {
        self.count = 0;
        self.terminated = false;
    }
}

fn combine(stops: Vec<StopMessage>) -> StopMessage {
    StopMessage {
        content: stops
            .iter()
            .map(|s| s.content.as_str())
            .collect::<Vec<_>>()
            .join("; "),
        source: stops
            .iter()
            .map(|s| s.source.as_str())
            .collect::<Vec<_>>()
            .join(", "),
    }
}

/// Fires when any of its conditions fires. Every condition sees every
/// check, so counters stay accurate.
pub struct OrTermination {
    conditions: Vec<Box<dyn TerminationCondition>>,
    terminated: bool,
}

impl OrTermination {
    pub fn new(conditions: Vec<Box<dyn TerminationCondition>>) -> Self {
        Self {
            conditions,
            terminated: false,
        }
    }
}

impl TerminationCondition for OrTermination {
    fn check(&mut self, messages: &[TeamMessage]) -> Result<Option<StopMessage>, TeamError> {
        if self.terminated {
            return Err(TeamError::Terminated);
        }
        let mut stops = Vec::new();
        for condition in &mut self.conditions {
            if let Some(stop) = condition.check(messages)? {
                stops.push(stop);
            }
        }
        if stops.is_empty() {
            return Ok(None);
        }
        self.terminated = true;
        Ok(Some(combine(stops)))
    }

    fn terminated(&self) -> bool {
        self.terminated
    }

    fn reset(&mut self) {
        for condition in &mut self.conditions {
            condition.reset();
        }
        self.terminated = false;
    }
}

/// Fires once every one of its conditions has fired, not necessarily on
/// the same check.
pub struct AndTermination {
    conditions: Vec<Box<dyn TerminationCondition>>,
    stops: Vec<Option<StopMessage>>,
    terminated: bool,
}

impl AndTermination {
    pub fn new(conditions: Vec<Box<dyn TerminationCondition>>) -> Self {
        let stops = vec![None; conditions.len()];
        Self {
            conditions,
            stops,
            terminated: false,
        }
    }
}

impl TerminationCondition for AndTermination {
    fn check(&mut self, messages: &[TeamMessage]) -> Result<Option<StopMessage>, TeamError> {
        if self.terminated {
            return Err(TeamError::Terminated);
        }
        for (condition, stop) in self.conditions.iter_mut().zip(self.stops.iter_mut()) {
            if stop.is_none() {
                *stop = condition.check(messages)?;
            }
        }
        if self.stops.iter().any(Option::is_none) {
            return Ok(None);
        }
        self.terminated = true;
        Ok(Some(combine(self.stops.iter().flatten().cloned().collect())))
    }

    fn terminated(&self) -> bool {
        self.terminated
    }

    fn reset(&mut self) {
        for condition in &mut self.conditions {
            condition.reset();
        }
        self.stops.iter_mut().for_each(|s| *s = None);
        self.terminated = false;
    }
}

macro_rules! impl_combinators {
    ($($ty:ty),* $(,)?) => {
        $(
            impl<R: TerminationCondition + 'static> BitOr<R> for $ty {
                type Output = OrTermination;

                fn bitor(self, rhs: R) -> OrTermination {
                    OrTermination::new(vec![Box::new(self) as Box<dyn TerminationCondition>, Box::new(rhs)])
                }
            }

            impl<R: TerminationCondition + 'static> BitAnd<R> for $ty {
                type Output = AndTermination;

                fn bitand(self, rhs: R) -> AndTermination {
                    AndTermination::new(vec![Box::new(self) as Box<dyn TerminationCondition>, Box::new(rhs)])
                }
            }
        )*
    };
}

impl_combinators!(
    TextMentionTermination,
    MaxMessageTermination,
    OrTermination,
    AndTermination,
);
