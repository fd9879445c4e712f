//! Environment variable names, provider defaults and loop limits.

// ─── Environment ──────────────────────────────────────────────────────────────

pub mod env {
    pub const MODEL_NAME: &str = "MODEL_NAME";
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
    pub const OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";

    pub const AZURE_MODEL_DEPLOYMENT_NAME: &str = "AZURE_MODEL_DEPLOYMENT_NAME";
    pub const AZURE_OPENAI_API_VERSION: &str = "AZURE_OPENAI_API_VERSION";
    pub const AZURE_OPENAI_ENDPOINT: &str = "AZURE_OPENAI_ENDPOINT";
    pub const AZURE_OPENAI_API_KEY: &str = "AZURE_OPENAI_API_KEY";

    /// `openai` or `azure`
    pub const PROVIDER: &str = "TEAMWORK_PROVIDER";
}

// ─── Models ───────────────────────────────────────────────────────────────────

pub mod models {
    pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
    pub const DEFAULT_AZURE_DEPLOYMENT: &str = "gpt-4";
    pub const DEFAULT_AZURE_API_VERSION: &str = "2024-02-15-preview";
}

// ─── API Endpoints ────────────────────────────────────────────────────────────

pub mod endpoints {
    pub const OPENAI_BASE_URL: &str = "https://api.openai.com";
    pub const OPENAI_CHAT_PATH: &str = "/v1/chat/completions";
}

// ─── Default Settings ─────────────────────────────────────────────────────────

pub mod defaults {
    pub const TEMPERATURE: f32 = 0.7;
    pub const TIMEOUT_SECS: u64 = 120;

    /// Messages kept in an agent's model context before the oldest are dropped.
    pub const MAX_CONTEXT_MESSAGES: usize = 200;

    /// Model calls that may request tools within one agent turn.
    pub const MAX_TOOL_ITERATIONS: usize = 1;

    pub const MAX_SELECTOR_ATTEMPTS: usize = 3;

    /// Length cap for tool result summaries carried in agent events.
    pub const TOOL_SUMMARY_LEN: usize = 200;
}

// ─── Sources ──────────────────────────────────────────────────────────────────

pub mod sources {
    /// Source name of the task message that opens every team run.
    pub const USER: &str = "user";
}
