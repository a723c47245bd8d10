//! deploykit-core - shared types for the cluster-scoped deploy engine
//!
//! This crate provides the foundations every other `deploykit` crate builds
//! on:
//! - `ManifestDocument` / `TemplateSet`: discovery and parsing of manifest
//!   templates from disk (spec §4.1).
//! - `Resource`: the in-memory model of a single Kubernetes object under
//!   management, including classification, deploy strategy and status
//!   (spec §3, §4.5).
//! - `TaskConfig`: the task-level configuration shared across phases.
//! - `CoreError`: errors raised while discovering and parsing templates.

pub mod config;
pub mod error;
pub mod manifest;
pub mod metrics;
pub mod resource;
pub mod summary;
pub mod template_set;

pub use config::TaskConfig;
pub use error::{CoreError, Result};
pub use manifest::ManifestDocument;
pub use metrics::{measure_method, AlertType, MetricsSink, NullMetricsSink};
pub use resource::{
    Classification, DeployStrategy, PredicateCache, Resource, ResourceStatus, CRON_JOB_TIMEOUT,
    DEFAULT_TIMEOUT,
};
pub use summary::{RecordingSummarySink, SummaryEvent, SummarySink, SummaryStatus};
pub use template_set::TemplateSet;
