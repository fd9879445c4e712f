use anyhow::Result;
use clap::Parser;
use teamwork_cli::{demos, Cli};
use teamwork_core::{telemetry, Console, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    telemetry::init(cli.telemetry());

    let mut settings = Settings::load()?;
    cli.apply(&mut settings);

    let mut console = Console::new().with_stats(cli.stats);
    demos::run(cli.demo, &settings, &mut console).await?;

    Ok(())
}
