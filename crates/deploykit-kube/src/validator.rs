//! Config validator (spec §4.3): a closed list of pre-flight checks run
//! before any resource touches the API server. Errors accumulate — every
//! check runs regardless of earlier failures — and a single
//! `TaskConfigurationError` is raised only if the accumulated set is
//! non-empty.

use deploykit_core::{Resource, TaskConfig};

use crate::discovery::ApiReader;
use crate::error::{DeployError, Result};
use crate::kinds;
use crate::runner::KubectlRunner;

/// `app=web`, `tier in (frontend,backend)`, and similar Kubernetes label
/// selector expressions are accepted; anything containing whitespace-only
/// garbage or unbalanced parens is rejected up front rather than deferred
/// to the API server's own validation, since a malformed selector combined
/// with `--prune` can otherwise silently match everything.
fn selector_is_well_formed(selector: &str) -> bool {
    if selector.trim().is_empty() {
        return false;
    }
    selector.matches('(').count() == selector.matches(')').count()
}

/// Runs every check and returns the accumulated error set (spec §4.3: "for
/// the global task, the check list is the namespaced task's list minus
/// 'namespace exists'" — there is no namespace check here by construction).
///
/// Also runs a server-side dry-run apply per discovered resource, which is
/// the only place `Resource.server_dry_run_validated` gets set (spec §3,
/// §4.3); the sensitive-resource escape hatch in `error_classifier` reads
/// that field and so depends on this check actually running.
pub async fn validate(
    reader: &dyn ApiReader,
    runner: &dyn KubectlRunner,
    config: &TaskConfig,
    resources: &mut [Resource],
) -> Result<()> {
    let mut errors = Vec::new();

    if config.context.trim().is_empty() {
        errors.push("context is not set".to_string());
    }

    match reader.global_resource_kinds().await {
        Ok(kinds) if kinds.is_empty() => {
            errors.push("API server returned no cluster-scoped kinds; is the context reachable?".to_string());
        }
        Ok(_) => {}
        Err(e) => errors.push(format!("API server is not responsive: {e}")),
    }

    if let Some(selector) = &config.selector {
        if !selector_is_well_formed(selector) {
            errors.push(format!("selector '{selector}' is not well-formed"));
        }
    }

    for resource in resources.iter_mut() {
        let definition = kinds::validate_definition(&resource.kind, runner, &resource.file_path);
        if !definition.ok {
            errors.push(
                definition
                    .message
                    .unwrap_or_else(|| format!("{} failed definition validation", resource.id_string())),
            );
        }

        let dry_run = kinds::server_dry_run(runner, &resource.file_path).await;
        resource.server_dry_run_validated = dry_run.success;
        if !dry_run.success {
            errors.push(format!(
                "dry-run validation failed for {}: {}",
                resource.id_string(),
                dry_run.stderr
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(DeployError::TaskConfigurationError { errors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::mock::MockApiReader;
    use crate::runner::mock::MockKubectlRunner;
    use crate::runner::CommandOutput;
    use deploykit_core::{Classification, DeployStrategy, ManifestDocument};
    use std::collections::HashMap as StdHashMap;
    use std::collections::HashSet as StdHashSet;

    fn config(selector: Option<&str>) -> TaskConfig {
        TaskConfig {
            context: "kind-test".to_string(),
            template_paths: vec![],
            selector: selector.map(str::to_string),
            prune_whitelist: vec![],
            prune: true,
            verify_result: true,
            max_watch_seconds: 60,
            sensitive_filenames: StdHashSet::new(),
            deploy_strategy_overrides: StdHashMap::new(),
        }
    }

    fn resource(kind: &str, name: &str) -> Resource {
        Resource::from_manifest(
            ManifestDocument {
                kind: kind.to_string(),
                name: name.to_string(),
                api_version: "v1".to_string(),
                namespace_in_manifest: None,
                file_path: format!("{name}.yaml"),
                raw_manifest: vec![],
                sensitive: false,
            },
            Classification::Global,
            DeployStrategy::Apply,
            false,
        )
    }

    #[tokio::test]
    async fn accumulates_multiple_errors() {
        let reader = MockApiReader::new();
        let runner = MockKubectlRunner::new();
        let mut cfg = config(Some("not well formed((("));
        cfg.context = String::new();
        let mut resources = vec![];

        let err = validate(&reader, &runner, &cfg, &mut resources)
            .await
            .expect_err("expected config error");
        match err {
            DeployError::TaskConfigurationError { errors } => {
                assert!(errors.len() >= 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn passes_with_reachable_cluster_and_good_selector() {
        let reader = MockApiReader::new().with_global_kinds(["ClusterRole"]);
        let runner = MockKubectlRunner::new();
        let cfg = config(Some("app=web"));
        let mut resources = vec![];
        validate(&reader, &runner, &cfg, &mut resources).await.unwrap();
    }

    #[tokio::test]
    async fn dry_run_success_sets_server_dry_run_validated() {
        let reader = MockApiReader::new().with_global_kinds(["ClusterRole"]);
        let runner = MockKubectlRunner::new().with_apply(CommandOutput::ok(""));
        let cfg = config(Some("app=web"));
        let mut resources = vec![resource("ClusterRole", "cr-a")];

        validate(&reader, &runner, &cfg, &mut resources).await.unwrap();
        assert!(resources[0].server_dry_run_validated);
        assert_eq!(
            runner.last_apply_args().unwrap(),
            vec!["-f".to_string(), "cr-a.yaml".to_string(), "--dry-run=server".to_string()]
        );
    }

    #[tokio::test]
    async fn dry_run_failure_leaves_resource_unvalidated_and_raises_error() {
        let reader = MockApiReader::new().with_global_kinds(["ClusterRole"]);
        let runner = MockKubectlRunner::new().with_apply(CommandOutput::failure("admission denied"));
        let cfg = config(Some("app=web"));
        let mut resources = vec![resource("ClusterRole", "cr-a")];

        let err = validate(&reader, &runner, &cfg, &mut resources)
            .await
            .expect_err("expected dry-run failure to surface");
        assert!(!resources[0].server_dry_run_validated);
        match err {
            DeployError::TaskConfigurationError { errors } => {
                assert!(errors.iter().any(|e| e.contains("admission denied")));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
