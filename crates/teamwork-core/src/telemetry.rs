//! Tracing setup. With span export on, every span is printed to stderr when
//! it closes, with its fields and timings.

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct TelemetryOptions {
    /// Filter used when `RUST_LOG` is unset.
    pub default_filter: String,
    pub export_spans: bool,
}

impl Default for TelemetryOptions {
    fn default() -> Self {
        Self {
            default_filter: "warn".to_string(),
            export_spans: false,
        }
    }
}

impl TelemetryOptions {
    /// Console span export at `info`.
    pub fn console_spans() -> Self {
        Self {
            default_filter: "info".to_string(),
            export_spans: true,
        }
    }
}

/// Install the global subscriber. Returns false if one was already set.
pub fn init(options: TelemetryOptions) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&options.default_filter));

    let span_events = if options.export_spans {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(span_events)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}
