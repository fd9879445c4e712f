use clap::{Parser, Subcommand};
use teamwork_core::config::{Provider, Settings};
use teamwork_core::telemetry::TelemetryOptions;

#[derive(Parser, Debug)]
#[command(name = "teamwork")]
#[command(about = "Multi-agent team examples over OpenAI and Azure OpenAI")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub demo: Demo,

    /// Use Azure OpenAI instead of OpenAI
    #[arg(long, global = true)]
    pub azure: bool,

    /// Model name, or deployment name with --azure
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    /// Print token usage per message and a run summary
    #[arg(long, global = true)]
    pub stats: bool,

    /// Do not print trace spans to stderr
    #[arg(long, global = true)]
    pub no_spans: bool,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Demo {
    /// One assistant tells a story until it says TERMINATE
    Simple,
    /// An assistant with math and weather tools
    Tools,
    /// Researcher, Writer and Critic in round robin
    Collaborate,
    /// Specialists picked by a model each turn
    Selector,
    /// A short run wrapped in nested trace spans
    Observe,
}

impl Cli {
    /// Fold the command line overrides into loaded settings.
    pub fn apply(&self, settings: &mut Settings) {
        if self.azure {
            settings.provider = Provider::Azure;
        }
        if let Some(ref model) = self.model {
            if settings.use_azure() {
                settings.azure.deployment = model.clone();
            } else {
                settings.openai.model = model.clone();
            }
        }
    }

    pub fn telemetry(&self) -> TelemetryOptions {
        if self.no_spans {
            TelemetryOptions::default()
        } else {
            TelemetryOptions::console_spans()
        }
    }
}
