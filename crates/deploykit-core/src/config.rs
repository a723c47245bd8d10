//! The task-level configuration shared across phases.
//!
//! `TaskConfig` is assembled once at the CLI boundary and passed by value
//! into the validator, deployer and watcher; nothing mutates it after the
//! validate phase (see design note in spec §9 on `TaskConfig.global_kinds`).

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::resource::DeployStrategy;

/// Configuration for a single global-resource deploy task.
#[derive(Debug, Clone)]
pub struct TaskConfig {
    /// Kubectl context to operate against.
    pub context: String,
    /// Manifest template paths (files or directories), in the order they
    /// should be discovered.
    pub template_paths: Vec<PathBuf>,
    /// Label selector restricting which previously-applied objects are
    /// eligible for pruning. `None` means `--all` is used instead.
    pub selector: Option<String>,
    /// `group/version/kind` strings eligible for pruning, in the order they
    /// should be passed to `--prune-whitelist`.
    pub prune_whitelist: Vec<String>,
    /// Whether to prune resources not present in the input set.
    pub prune: bool,
    /// Whether to hand off to the watcher after the deploy phase.
    pub verify_result: bool,
    /// Global watch deadline.
    pub max_watch_seconds: u64,
    /// Basenames whose stderr/content must never be echoed unless cleared
    /// by a successful server-dry-run.
    pub sensitive_filenames: std::collections::HashSet<String>,
    /// Per-kind deploy strategy overrides; any kind not listed here
    /// defaults to `Apply` (spec §3). `CustomResourceDefinition` is
    /// typically configured as `Replace` since CRDs cannot be merged the
    /// way `kubectl apply` merges ordinary objects.
    pub deploy_strategy_overrides: HashMap<String, DeployStrategy>,
}

impl TaskConfig {
    pub fn max_watch_duration(&self) -> Duration {
        Duration::from_secs(self.max_watch_seconds)
    }

    pub fn deploy_strategy_for(&self, kind: &str) -> DeployStrategy {
        self.deploy_strategy_overrides
            .get(kind)
            .copied()
            .unwrap_or_default()
    }

    /// Whether `kind` is included in the configured prune-whitelist (spec
    /// §3: `prunable` is "derived: included in the configured
    /// prune-whitelist"). Whitelist entries are `group/version/kind`
    /// strings; a bare kind matches an entry equal to it or ending in
    /// `/<kind>`.
    pub fn is_prunable(&self, kind: &str) -> bool {
        self.prune_whitelist
            .iter()
            .any(|entry| entry == kind || entry.ends_with(&format!("/{kind}")))
    }
}
