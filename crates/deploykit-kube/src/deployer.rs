//! The resource deployer (spec §4.6): the apply/replace/create/prune
//! dispatch engine. This is the hottest core component in the system —
//! ordering invariants and partial-failure semantics live here.

use std::collections::HashSet;

use deploykit_core::{DeployStrategy, Resource, SummarySink};

use crate::apply_dir::ApplyDir;
use crate::error::{DeployError, Result};
use crate::error_classifier::{classify_and_report, parse_pruned_names};
use crate::runner::{quote_argv, KubectlRunner};

/// Dispatches the apply/replace/create/prune algorithm over a batch of
/// resources. Holds no state of its own beyond its collaborators —
/// everything it needs about a single call is passed in.
pub struct ResourceDeployer<'a> {
    runner: &'a dyn KubectlRunner,
    summary: &'a dyn SummarySink,
    selector: Option<String>,
    prune_whitelist: Vec<String>,
    sensitive_filenames: HashSet<String>,
}

impl<'a> ResourceDeployer<'a> {
    pub fn new(
        runner: &'a dyn KubectlRunner,
        summary: &'a dyn SummarySink,
        selector: Option<String>,
        prune_whitelist: Vec<String>,
        sensitive_filenames: HashSet<String>,
    ) -> Self {
        Self {
            runner,
            summary,
            selector,
            prune_whitelist,
            sensitive_filenames,
        }
    }

    /// `deploy(resources, verify, prune, record_summary)` (spec §4.6).
    ///
    /// `verify` is accepted for fidelity with the public contract but is
    /// advisory only here: whether to hand off to the watcher afterwards is
    /// an orchestrator-owned decision (spec §9 open question — metrics and
    /// summary live in the orchestrator, and so does sequencing into the
    /// verify phase). Preconditions: `resources` is non-empty and every
    /// resource is global; both are enforced before any command runs.
    pub async fn deploy(
        &self,
        resources: &mut [Resource],
        verify: bool,
        prune: bool,
        record_summary: bool,
    ) -> Result<()> {
        if resources.is_empty() {
            return Err(DeployError::fatal("no resources to deploy"));
        }
        if resources.iter().any(|r| !r.is_global()) {
            return Err(DeployError::namespaced_resource_rejected());
        }

        let (applyable_idx, individual_idx) = self.partition(resources);

        for &idx in &individual_idx {
            self.deploy_individual(&mut resources[idx]).await?;
        }

        if !applyable_idx.is_empty() {
            self.apply_pass(resources, &applyable_idx, prune, record_summary)
                .await?;
        }

        if verify && record_summary {
            self.summary.add_action("proceeding to verification");
        }

        Ok(())
    }

    /// Partitions `resources` into applyable indices and individual
    /// indices (spec §4.6 steps 1-2), preserving input order within each.
    /// An individual whose kind is in the prune whitelist is additionally
    /// listed as applyable so the prune pass sees it and does not delete
    /// it.
    fn partition(&self, resources: &[Resource]) -> (Vec<usize>, Vec<usize>) {
        let mut applyable_idx = Vec::new();
        let mut individual_idx = Vec::new();

        for (idx, resource) in resources.iter().enumerate() {
            match resource.deploy_strategy {
                DeployStrategy::Apply => applyable_idx.push(idx),
                DeployStrategy::Replace | DeployStrategy::ReplaceForce => {
                    individual_idx.push(idx);
                    if whitelist_contains_kind(&self.prune_whitelist, &resource.kind) {
                        applyable_idx.push(idx);
                    }
                }
            }
        }

        (applyable_idx, individual_idx)
    }

    /// Step 3: replace (or replace --force --cascade) with a create
    /// fallback, in list order, sequentially (spec §4.6, §5: "Individual
    /// deploys are sequential in input order").
    async fn deploy_individual(&self, resource: &mut Resource) -> Result<()> {
        mark_started_once(resource);

        let args = vec!["-f".to_string(), resource.file_path.clone()];
        let replace_args = match resource.deploy_strategy {
            DeployStrategy::ReplaceForce => {
                let mut a = vec!["--force".to_string(), "--cascade".to_string()];
                a.extend(args.clone());
                a
            }
            _ => args.clone(),
        };

        let replace_out = self.runner.replace(&replace_args).await;
        if replace_out.success {
            return Ok(());
        }

        let create_out = self.runner.create(&args).await;
        if create_out.success {
            return Ok(());
        }

        Err(DeployError::fatal(format!(
            "Command failed: {} (replace also failed: {}); create stderr: {}",
            quote_argv("create", &args),
            replace_out.stderr.trim(),
            create_out.stderr.trim()
        )))
    }

    /// Step 4: the bulk apply pass (spec §4.6.1).
    async fn apply_pass(
        &self,
        resources: &mut [Resource],
        applyable_idx: &[usize],
        prune: bool,
        record_summary: bool,
    ) -> Result<()> {
        for &idx in applyable_idx {
            mark_started_once(&mut resources[idx]);
        }

        let applyable_refs: Vec<&Resource> = applyable_idx.iter().map(|&idx| &resources[idx]).collect();
        let apply_dir = ApplyDir::build(&applyable_refs)?;

        let mut args = vec![
            "-f".to_string(),
            apply_dir.path().display().to_string(),
        ];

        if prune {
            args.push("--prune".to_string());
            match &self.selector {
                Some(selector) => {
                    args.push("--selector".to_string());
                    args.push(selector.clone());
                }
                None => args.push("--all".to_string()),
            }
            for kind in &self.prune_whitelist {
                args.push(format!("--prune-whitelist={kind}"));
            }
        }

        let output = self.runner.apply(&args).await;

        if !output.success {
            classify_and_report(
                &output.stderr,
                &applyable_refs,
                &self.sensitive_filenames,
                self.summary,
            );
            return Err(DeployError::fatal(format!(
                "Command failed: {}",
                quote_argv("apply", &args)
            )));
        }

        if prune && record_summary {
            let pruned = parse_pruned_names(&output.stdout);
            self.summary
                .add_action(&format!("pruned {} resources", pruned.len()));
        }

        Ok(())
    }
}

/// Whitelist entries are `group/version/kind` strings (spec glossary); a
/// resource's bare kind matches an entry equal to it or ending in
/// `/<kind>`.
fn whitelist_contains_kind(whitelist: &[String], kind: &str) -> bool {
    whitelist
        .iter()
        .any(|entry| entry == kind || entry.ends_with(&format!("/{kind}")))
}

fn mark_started_once(resource: &mut Resource) {
    if resource.status.deploy_started_at.is_none() {
        resource.mark_deploy_started();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::mock::MockKubectlRunner;
    use crate::runner::CommandOutput;
    use deploykit_core::{Classification, ManifestDocument, RecordingSummarySink};

    fn resource(kind: &str, name: &str, strategy: DeployStrategy, classification: Classification) -> Resource {
        Resource::from_manifest(
            ManifestDocument {
                kind: kind.to_string(),
                name: name.to_string(),
                api_version: "v1".to_string(),
                namespace_in_manifest: None,
                file_path: format!("/tmp/{name}.yaml"),
                raw_manifest: format!("kind: {kind}\n").into_bytes(),
                sensitive: false,
            },
            classification,
            strategy,
            false,
        )
    }

    fn write_manifest(resource: &Resource) {
        std::fs::write(&resource.file_path, &resource.raw_manifest).unwrap();
    }

    #[tokio::test]
    async fn rejects_namespaced_resources_without_running_any_command() {
        let runner = MockKubectlRunner::new();
        let summary = RecordingSummarySink::new();
        let deployer = ResourceDeployer::new(&runner, &summary, None, vec![], HashSet::new());

        let mut resources = vec![resource(
            "ConfigMap",
            "cm",
            DeployStrategy::Apply,
            Classification::Namespaced,
        )];

        let err = deployer
            .deploy(&mut resources, false, false, true)
            .await
            .expect_err("expected namespaced rejection");
        assert!(matches!(err, DeployError::FatalDeploymentError { .. }));
        assert_eq!(err.to_string(), "Deploying namespaced resource is not allowed from this command.");
        assert_eq!(runner.apply_calls.lock().unwrap().len(), 0);
        assert_eq!(runner.replace_calls.lock().unwrap().len(), 0);
        assert_eq!(runner.create_calls.lock().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn happy_apply_no_prune_builds_one_call_with_two_symlinks() {
        let r1 = resource("StorageClass", "sc-a", DeployStrategy::Apply, Classification::Global);
        let r2 = resource("ClusterRole", "cr-b", DeployStrategy::Apply, Classification::Global);
        write_manifest(&r1);
        write_manifest(&r2);

        let runner = MockKubectlRunner::new().with_apply(CommandOutput::ok(""));
        let summary = RecordingSummarySink::new();
        let deployer = ResourceDeployer::new(&runner, &summary, None, vec![], HashSet::new());

        let mut resources = vec![r1, r2];
        deployer.deploy(&mut resources, true, false, true).await.unwrap();

        let args = runner.last_apply_args().unwrap();
        assert!(!args.contains(&"--prune".to_string()));
        assert!(resources.iter().all(|r| r.status.deploy_started_at.is_some()));
    }

    #[tokio::test]
    async fn prune_with_selector_builds_exact_argv() {
        let r1 = resource("StorageClass", "sc-a", DeployStrategy::Apply, Classification::Global);
        let r2 = resource("ClusterRole", "cr-b", DeployStrategy::Apply, Classification::Global);
        write_manifest(&r1);
        write_manifest(&r2);

        let runner = MockKubectlRunner::new().with_apply(CommandOutput::ok(""));
        let summary = RecordingSummarySink::new();
        let deployer = ResourceDeployer::new(
            &runner,
            &summary,
            Some("app=web".to_string()),
            vec!["rbac.authorization.k8s.io/v1/ClusterRole".to_string()],
            HashSet::new(),
        );

        let mut resources = vec![r1, r2];
        deployer.deploy(&mut resources, false, true, true).await.unwrap();

        let args = runner.last_apply_args().unwrap();
        assert!(args.contains(&"--prune".to_string()));
        assert!(args.contains(&"--selector".to_string()));
        assert!(args.contains(&"app=web".to_string()));
        assert!(!args.contains(&"--all".to_string()));
        assert!(args.contains(&"--prune-whitelist=rbac.authorization.k8s.io/v1/ClusterRole".to_string()));
    }

    #[tokio::test]
    async fn prune_without_selector_uses_all() {
        let r1 = resource("StorageClass", "sc-a", DeployStrategy::Apply, Classification::Global);
        write_manifest(&r1);

        let runner = MockKubectlRunner::new().with_apply(CommandOutput::ok(""));
        let summary = RecordingSummarySink::new();
        let deployer = ResourceDeployer::new(&runner, &summary, None, vec![], HashSet::new());

        let mut resources = vec![r1];
        deployer.deploy(&mut resources, false, true, true).await.unwrap();

        let args = runner.last_apply_args().unwrap();
        assert!(args.contains(&"--all".to_string()));
        assert!(!args.contains(&"--selector".to_string()));
    }

    #[tokio::test]
    async fn replace_falls_back_to_create_on_failure() {
        let r1 = resource(
            "CustomResourceDefinition",
            "crd-a",
            DeployStrategy::Replace,
            Classification::Global,
        );
        write_manifest(&r1);

        let runner = MockKubectlRunner::new()
            .with_replace(CommandOutput::failure("not found"))
            .with_create(CommandOutput::ok(""));
        let summary = RecordingSummarySink::new();
        let deployer = ResourceDeployer::new(&runner, &summary, None, vec![], HashSet::new());

        let mut resources = vec![r1];
        deployer.deploy(&mut resources, false, false, true).await.unwrap();

        assert_eq!(runner.replace_calls.lock().unwrap().len(), 1);
        assert_eq!(runner.create_calls.lock().unwrap().len(), 1);
        assert!(resources[0].status.deploy_started_at.is_some());
        assert!(summary.paragraphs().is_empty());
    }

    #[tokio::test]
    async fn apply_failure_surfaces_quoted_argv_and_classifies_errors() {
        let r1 = resource("ClusterRole", "x", DeployStrategy::Apply, Classification::Global);
        write_manifest(&r1);

        let runner = MockKubectlRunner::new().with_apply(CommandOutput::failure(
            "error when creating \"/tmp/abc/foo.yaml\": ClusterRole \"x\" is invalid",
        ));
        let summary = RecordingSummarySink::new();
        let deployer = ResourceDeployer::new(&runner, &summary, None, vec![], HashSet::new());

        let mut resources = vec![r1];
        let err = deployer
            .deploy(&mut resources, false, false, true)
            .await
            .expect_err("expected fatal error");

        assert!(err.to_string().starts_with("Command failed:"));
        let paragraphs = summary.paragraphs();
        assert!(paragraphs[0].starts_with("WARNING:"));
        assert!(paragraphs.iter().any(|p| p == "Invalid template: foo.yaml"));
    }

    #[tokio::test]
    async fn whitelisted_individual_is_also_included_in_apply_pass() {
        let r1 = resource(
            "CustomResourceDefinition",
            "crd-a",
            DeployStrategy::Replace,
            Classification::Global,
        );
        write_manifest(&r1);

        let runner = MockKubectlRunner::new()
            .with_replace(CommandOutput::ok(""))
            .with_apply(CommandOutput::ok(""));
        let summary = RecordingSummarySink::new();
        let deployer = ResourceDeployer::new(
            &runner,
            &summary,
            None,
            vec!["CustomResourceDefinition".to_string()],
            HashSet::new(),
        );

        let mut resources = vec![r1];
        deployer.deploy(&mut resources, false, true, true).await.unwrap();

        // replaced individually, and also appears in the apply call so the
        // prune pass does not delete it.
        assert_eq!(runner.replace_calls.lock().unwrap().len(), 1);
        assert_eq!(runner.apply_calls.lock().unwrap().len(), 1);
    }
}
