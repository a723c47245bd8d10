//! The in-memory representation of a single Kubernetes object under
//! management by a deploy task. See spec §3 and §4.5.

use std::time::{Duration, Instant};

use crate::manifest::ManifestDocument;

/// Whether a resource is bound to a namespace or lives at cluster scope.
/// Derived from the discovered set of global kinds (spec §4.2); a task
/// refuses to proceed if any resource classifies as `Namespaced`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Global,
    Namespaced,
}

/// Per-kind deploy policy. `Replace` and `ReplaceForce` resources are
/// deployed individually, outside the bulk `apply` pass (spec §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeployStrategy {
    #[default]
    Apply,
    Replace,
    ReplaceForce,
}

/// The three predicates every kind's status must be able to answer once a
/// sync has populated `observed`. A resource is terminal the moment any one
/// of these first returns `true`; see the precedence rule in spec §4.7.
#[derive(Debug, Clone, Default)]
pub struct PredicateCache {
    pub deploy_succeeded: bool,
    pub deploy_failed: bool,
    pub deploy_timed_out: bool,
}

impl PredicateCache {
    pub fn is_terminal(&self) -> bool {
        self.deploy_failed || self.deploy_timed_out || self.deploy_succeeded
    }
}

/// Mutable status block, populated only by the status synchronizer
/// (`observed`, `predicate_cache`) and the deployer (`deploy_started_at`).
#[derive(Debug, Clone, Default)]
pub struct ResourceStatus {
    /// The most recent observation from the cluster, as raw JSON. `None`
    /// until the first successful sync for this resource.
    pub observed: Option<serde_json::Value>,
    pub predicate_cache: PredicateCache,
    pub deploy_started_at: Option<Instant>,
    pub last_message: Option<String>,
}

/// A single Kubernetes object under management by a deploy task, uniquely
/// identified by `(kind, name)` within the task (spec §3).
#[derive(Debug, Clone)]
pub struct Resource {
    pub kind: String,
    pub name: String,
    pub api_version: String,
    pub file_path: String,
    pub raw_manifest: Vec<u8>,
    pub sensitive: bool,
    pub classification: Classification,
    pub deploy_strategy: DeployStrategy,
    pub prunable: bool,
    pub timeout: Duration,
    pub server_dry_run_validated: bool,
    pub status: ResourceStatus,
}

/// Default per-kind timeout; `CronJob` overrides this to 30s (spec §3).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);
pub const CRON_JOB_TIMEOUT: Duration = Duration::from_secs(30);

impl Resource {
    /// Build a `Resource` from a parsed manifest document and the facts
    /// discovery/config establish about it. Does not itself touch the
    /// cluster; classification and strategy are supplied by the caller,
    /// which in practice is `deploykit-kube`'s discovery-driven builder.
    pub fn from_manifest(
        doc: ManifestDocument,
        classification: Classification,
        deploy_strategy: DeployStrategy,
        prunable: bool,
    ) -> Self {
        let timeout = if doc.kind == "CronJob" {
            CRON_JOB_TIMEOUT
        } else {
            DEFAULT_TIMEOUT
        };

        Self {
            kind: doc.kind,
            name: doc.name,
            api_version: doc.api_version,
            file_path: doc.file_path,
            raw_manifest: doc.raw_manifest,
            sensitive: doc.sensitive,
            classification,
            deploy_strategy,
            prunable,
            timeout,
            server_dry_run_validated: false,
            status: ResourceStatus::default(),
        }
    }

    pub fn identity(&self) -> (String, String) {
        (self.kind.clone(), self.name.clone())
    }

    pub fn id_string(&self) -> String {
        format!("{}/{}", self.kind, self.name)
    }

    pub fn is_global(&self) -> bool {
        matches!(self.classification, Classification::Global)
    }

    /// Marks the moment of the first API mutation for this resource.
    /// Idempotent by construction: callers must only invoke this once per
    /// resource, immediately before the first mutating command (spec §3
    /// invariant: "set exactly once").
    pub fn mark_deploy_started(&mut self) {
        debug_assert!(
            self.status.deploy_started_at.is_none(),
            "deploy_started_at set twice for {}",
            self.id_string()
        );
        self.status.deploy_started_at = Some(Instant::now());
    }

    pub fn deploy_succeeded(&self) -> bool {
        self.status.predicate_cache.deploy_succeeded
    }

    pub fn deploy_failed(&self) -> bool {
        self.status.predicate_cache.deploy_failed
    }

    pub fn deploy_timed_out(&self) -> bool {
        self.status.predicate_cache.deploy_timed_out
    }

    pub fn is_terminal(&self) -> bool {
        self.status.predicate_cache.is_terminal()
    }

    /// How long this resource has been deploying, if it has started.
    pub fn elapsed_since_start(&self) -> Option<Duration> {
        self.status.deploy_started_at.map(|t| t.elapsed())
    }

    pub fn timeout_message(&self) -> String {
        format!(
            "{} did not reach a ready state within {}s",
            self.id_string(),
            self.timeout.as_secs()
        )
    }

    /// Terminal-state precedence is failed > timed_out > succeeded (spec
    /// §4.7: "this matters when predicates briefly overlap"), so this must
    /// check in that order rather than succeeded first.
    pub fn pretty_status(&self) -> String {
        if self.deploy_failed() {
            format!(
                "{}: failed{}",
                self.id_string(),
                self.status
                    .last_message
                    .as_ref()
                    .map(|m| format!(" ({m})"))
                    .unwrap_or_default()
            )
        } else if self.deploy_timed_out() {
            format!("{}: timed out", self.id_string())
        } else if self.deploy_succeeded() {
            format!("{}: deployed", self.id_string())
        } else {
            format!("{}: in progress", self.id_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(kind: &str) -> ManifestDocument {
        ManifestDocument {
            kind: kind.to_string(),
            name: "x".to_string(),
            api_version: "v1".to_string(),
            namespace_in_manifest: None,
            file_path: "x.yaml".to_string(),
            raw_manifest: vec![],
            sensitive: false,
        }
    }

    #[test]
    fn cron_job_gets_short_timeout() {
        let r = Resource::from_manifest(doc("CronJob"), Classification::Global, DeployStrategy::Apply, false);
        assert_eq!(r.timeout, CRON_JOB_TIMEOUT);
    }

    #[test]
    fn other_kinds_get_default_timeout() {
        let r = Resource::from_manifest(doc("ClusterRole"), Classification::Global, DeployStrategy::Apply, false);
        assert_eq!(r.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn terminal_precedence_is_failed_over_timed_out_over_succeeded() {
        let mut r = Resource::from_manifest(doc("ClusterRole"), Classification::Global, DeployStrategy::Apply, false);
        r.status.predicate_cache.deploy_succeeded = true;
        r.status.predicate_cache.deploy_timed_out = true;
        r.status.predicate_cache.deploy_failed = true;
        assert!(r.is_terminal());
    }

    #[test]
    fn pretty_status_honors_terminal_precedence_when_predicates_overlap() {
        let mut r = Resource::from_manifest(doc("ClusterRole"), Classification::Global, DeployStrategy::Apply, false);
        r.status.predicate_cache.deploy_succeeded = true;
        r.status.predicate_cache.deploy_timed_out = true;
        assert!(r.pretty_status().contains("timed out"));

        r.status.predicate_cache.deploy_failed = true;
        assert!(r.pretty_status().contains("failed"));
    }
}
