//! The abstract summary sink (spec §6): the core never prints directly, it
//! emits structured phase/action/paragraph events to this trait. The CLI
//! crate supplies the production, colorized implementation; tests use the
//! in-memory recorder below.

/// Final classification of a deploy task (spec §4.8, §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryStatus {
    Success,
    TimedOut,
    Failure,
}

impl SummaryStatus {
    pub fn as_tag(&self) -> &'static str {
        match self {
            SummaryStatus::Success => "status:success",
            SummaryStatus::TimedOut => "status:timeout",
            SummaryStatus::Failure => "status:failed",
        }
    }
}

/// Three append operations plus a terminal print. Implementations must be
/// thread-safe for append operations (spec §5: "logger/summary sink must
/// be thread-safe").
pub trait SummarySink: Send + Sync {
    fn add_action(&self, text: &str);
    fn add_paragraph(&self, text: &str);
    fn phase_heading(&self, text: &str);
    fn print_summary(&self, status: SummaryStatus);
}

/// Records every call for assertions, in append order (spec §5: "Summary
/// paragraph order reflects append order").
#[derive(Debug, Default)]
pub struct RecordingSummarySink {
    events: std::sync::Mutex<Vec<SummaryEvent>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryEvent {
    Action(String),
    Paragraph(String),
    PhaseHeading(String),
    Summary(String),
}

impl RecordingSummarySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SummaryEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn paragraphs(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SummaryEvent::Paragraph(text) => Some(text),
                _ => None,
            })
            .collect()
    }
}

impl SummarySink for RecordingSummarySink {
    fn add_action(&self, text: &str) {
        self.events
            .lock()
            .unwrap()
            .push(SummaryEvent::Action(text.to_string()));
    }

    fn add_paragraph(&self, text: &str) {
        self.events
            .lock()
            .unwrap()
            .push(SummaryEvent::Paragraph(text.to_string()));
    }

    fn phase_heading(&self, text: &str) {
        self.events
            .lock()
            .unwrap()
            .push(SummaryEvent::PhaseHeading(text.to_string()));
    }

    fn print_summary(&self, status: SummaryStatus) {
        let label = match status {
            SummaryStatus::Success => "success",
            SummaryStatus::TimedOut => "timed_out",
            SummaryStatus::Failure => "failure",
        };
        self.events
            .lock()
            .unwrap()
            .push(SummaryEvent::Summary(label.to_string()));
    }
}
