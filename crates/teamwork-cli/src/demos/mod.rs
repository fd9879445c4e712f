pub mod collaboration;
pub mod observability;
pub mod selector;
pub mod simple;
pub mod tools;

use crate::cli::Demo;
use anyhow::Result;
use std::io::Write;
use teamwork_core::{Console, Settings, TaskResult};

/// Build the model clients `demo` needs from `settings` and run it,
/// printing through `console`.
pub async fn run<W: Write>(
    demo: Demo,
    settings: &Settings,
    console: &mut Console<W>,
) -> Result<TaskResult> {
    let use_azure = settings.use_azure();
    let model_client = settings.model_client(use_azure)?;
    tracing::debug!(?demo, model = model_client.model(), "starting demo");

    match demo {
        Demo::Simple => simple::run(model_client, console).await,
        Demo::Tools => tools::run(model_client, console).await,
        Demo::Collaborate => collaboration::run(model_client, console).await,
        Demo::Selector => {
            let selector_client = settings.model_client(use_azure)?;
            selector::run(model_client, selector_client, console).await
        }
        Demo::Observe => observability::run(model_client, console).await,
    }
}
