//! The abstract metrics sink (spec §6): a counter/distribution/event
//! interface the core emits to but never implements against a concrete
//! backend.

use std::time::{Duration, Instant};

/// Severity hint carried alongside an `event` call; mirrors the common
/// alerting-backend vocabulary (info/warning/error/success) without
/// depending on any one backend's types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertType {
    Info,
    Warning,
    Error,
    Success,
}

pub trait MetricsSink: Send + Sync {
    fn event(&self, title: &str, body: &str, alert_type: AlertType, tags: &[String]);
    fn distribution(&self, metric: &str, duration: Duration, tags: &[String]);
}

/// `measure_method`: times `f` and records the duration as a distribution
/// under `metric`, tagged with `tags` (spec §6). Implemented as a free
/// function wrapper (rather than a trait default method) so it works
/// uniformly over `&dyn MetricsSink`.
pub fn measure_method<T>(sink: &dyn MetricsSink, metric: &str, tags: &[String], f: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let result = f();
    sink.distribution(metric, start.elapsed(), tags);
    result
}

/// No-op implementation for tests and for CLI invocations that don't wire
/// up a metrics backend (spec's metrics non-goal is about the external
/// wiring, not about dropping the ambient interface — see SPEC_FULL §4.10).
#[derive(Debug, Default, Clone, Copy)]
pub struct NullMetricsSink;

impl MetricsSink for NullMetricsSink {
    fn event(&self, _title: &str, _body: &str, _alert_type: AlertType, _tags: &[String]) {}
    fn distribution(&self, _metric: &str, _duration: Duration, _tags: &[String]) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measure_method_still_returns_inner_value() {
        let sink = NullMetricsSink;
        let value = measure_method(&sink, "test.op", &[], || 42);
        assert_eq!(value, 42);
    }
}
