use crate::error::TeamError;
use crate::messages::{TaskResult, TeamEvent, TeamMessage};
use crate::team::TeamStream;
use futures::StreamExt;
use std::io::{self, Write};
use std::time::Instant;

/// Prints a team stream as it arrives and hands back the final result.
pub struct Console<W: Write = io::Stdout> {
    out: W,
    output_stats: bool,
}

impl Console<io::Stdout> {
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }
}

impl Default for Console<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Console<W> {
    pub fn with_writer(out: W) -> Self {
        Self {
            out,
            output_stats: false,
        }
    }

    /// Print token usage per message and a summary at the end.
    pub fn with_stats(mut self, output_stats: bool) -> Self {
        self.output_stats = output_stats;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// The underlying writer, for output around a run.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.out
    }

    pub async fn run(&mut self, mut stream: TeamStream) -> Result<TaskResult, TeamError> {
        let started = Instant::now();

        while let Some(event) = stream.next().await {
            match event {
                TeamEvent::Message(message) => self.render_message(&message)?,
                TeamEvent::Finished(_) => break,
            }
        }

        let result = stream.result().await?;

        if self.output_stats {
            self.render_summary(&result, started.elapsed().as_secs_f64())?;
        }
        Ok(result)
    }

    pub fn render_message(&mut self, message: &TeamMessage) -> io::Result<()> {
        writeln!(
            self.out,
            "---------- {} ({}) ----------",
            message.kind.label(),
            message.source
        )?;
        writeln!(self.out, "{}", message.content)?;
        if self.output_stats {
            if let Some(usage) = message.usage {
                writeln!(
                    self.out,
                    "[Prompt tokens: {}, Completion tokens: {}]",
                    usage.input_tokens, usage.output_tokens
                )?;
            }
        }
        self.out.flush()
    }

    fn render_summary(&mut self, result: &TaskResult, seconds: f64) -> io::Result<()> {
        let usage = result.total_usage();
        writeln!(self.out, "---------- Summary ----------")?;
        writeln!(self.out, "Number of messages: {}", result.messages.len())?;
        writeln!(
            self.out,
            "Finish reason: {}",
            result.stop_reason.as_deref().unwrap_or("None")
        )?;
        writeln!(self.out, "Total prompt tokens: {}", usage.input_tokens)?;
        writeln!(self.out, "Total completion tokens: {}", usage.output_tokens)?;
        writeln!(self.out, "Duration: {seconds:.2} seconds")?;
        self.out.flush()
    }
}
