//! The production `SummarySink` (spec §6): colorized terminal output, plus
//! `tracing` events so the same run can be scraped from structured logs.

use console::style;
use deploykit_core::{SummarySink, SummaryStatus};

#[derive(Debug, Default)]
pub struct ConsoleSummarySink;

impl ConsoleSummarySink {
    pub fn new() -> Self {
        Self
    }
}

impl SummarySink for ConsoleSummarySink {
    fn add_action(&self, text: &str) {
        tracing::info!(action = text, "deploy action");
        println!("  {} {}", style("->").dim(), text);
    }

    fn add_paragraph(&self, text: &str) {
        tracing::warn!(paragraph = text, "deploy paragraph");
        println!();
        if text.starts_with("WARNING:") {
            println!("{}", style(text).yellow());
        } else {
            println!("{text}");
        }
    }

    fn phase_heading(&self, text: &str) {
        tracing::info!(phase = text, "deploy phase");
        println!();
        println!("{}", style(text).cyan().bold());
    }

    fn print_summary(&self, status: SummaryStatus) {
        let (icon, styled) = match status {
            SummaryStatus::Success => (style("OK").green().bold(), style("success")),
            SummaryStatus::TimedOut => (style("!!").yellow().bold(), style("timed_out")),
            SummaryStatus::Failure => (style("XX").red().bold(), style("failure")),
        };
        tracing::info!(status = %status.as_tag(), "deploy summary");
        println!();
        println!("{} deploy finished: {}", icon, styled);
    }
}
