mod group_chat;
pub mod selector;
pub mod termination;

pub use group_chat::{GroupChat, RoundRobinGroupChat, SelectorGroupChat, TeamStream};
pub use selector::{LlmSelector, RoundRobin, SpeakerSelector, DEFAULT_SELECTOR_PROMPT};
pub use termination::{
    AndTermination, MaxMessageTermination, OrTermination, TerminationCondition,
    TextMentionTermination,
};
