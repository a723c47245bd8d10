//! The deploy task orchestrator (spec §4.8): sequences
//! *initialize → validate → initial-status → deploy → verify* and owns the
//! exit-code/summary classification contract. Metrics and summary emission
//! live here rather than in the deployer or watcher, per the open-question
//! resolution in spec §9.

use std::collections::HashMap;
use std::time::Instant;

use deploykit_core::{
    AlertType, MetricsSink, Resource, SummarySink, SummaryStatus, TaskConfig, TemplateSet,
};
use deploykit_kube::{
    build_resources, cache_keys_for, sync_all, validate, watch, ApiReader, DeployError,
    KubectlRunner, ResourceCache, ResourceDeployer, Result as KubeResult, DEFAULT_WORKERS,
};

/// Runs the full deploy task against `config`, returning the final
/// classification (spec §4.8: "success iff all resources succeeded;
/// timed_out iff all non-success resources are timed-out; failure
/// otherwise"). Any error returned aborts later phases, matching
/// "a failure in an earlier phase aborts later phases".
pub async fn run(
    config: &TaskConfig,
    reader: &dyn ApiReader,
    runner: &dyn KubectlRunner,
    summary: &dyn SummarySink,
    metrics: &dyn MetricsSink,
) -> KubeResult<SummaryStatus> {
    let tags = vec![format!("context:{}", config.context)];
    let task_start = Instant::now();

    let outcome = run_phases(config, reader, runner, summary, metrics, &tags).await;

    let status = match &outcome {
        Ok(()) => SummaryStatus::Success,
        Err(DeployError::DeploymentTimeoutError { .. }) => SummaryStatus::TimedOut,
        Err(_) => SummaryStatus::Failure,
    };

    let mut final_tags = tags;
    final_tags.push(status.as_tag().to_string());
    metrics.distribution("deploykit.task.duration", task_start.elapsed(), &final_tags);
    metrics.event(
        "deploy task finished",
        &format!("status={}", status.as_tag()),
        alert_type_for(status),
        &final_tags,
    );
    summary.print_summary(status);

    outcome.map(|()| status)
}

async fn run_phases(
    config: &TaskConfig,
    reader: &dyn ApiReader,
    runner: &dyn KubectlRunner,
    summary: &dyn SummarySink,
    metrics: &dyn MetricsSink,
    tags: &[String],
) -> KubeResult<()> {
    summary.phase_heading("initialize");
    let init_start = Instant::now();
    let mut resources = initialize(config, reader).await?;
    metrics.distribution("deploykit.phase.initialize", init_start.elapsed(), tags);
    summary.add_action(&format!("discovered {} resource(s)", resources.len()));

    summary.phase_heading("validate");
    let validate_start = Instant::now();
    validate(reader, runner, config, &mut resources).await?;
    metrics.distribution("deploykit.phase.validate", validate_start.elapsed(), tags);

    summary.phase_heading("initial-status");
    let sync_start = Instant::now();
    initial_status_sync(reader, &mut resources).await?;
    metrics.distribution("deploykit.phase.initial_status", sync_start.elapsed(), tags);

    summary.phase_heading("deploy");
    let deployer = ResourceDeployer::new(
        runner,
        summary,
        config.selector.clone(),
        config.prune_whitelist.clone(),
        config.sensitive_filenames.clone(),
    );
    let deploy_start = Instant::now();
    deployer
        .deploy(&mut resources, config.verify_result, config.prune, true)
        .await?;
    metrics.distribution("deploykit.phase.deploy", deploy_start.elapsed(), tags);

    if config.verify_result {
        summary.phase_heading("verify");
        let verify_start = Instant::now();
        watch(reader, &mut resources, config.max_watch_seconds, summary).await?;
        metrics.distribution("deploykit.phase.verify", verify_start.elapsed(), tags);
    }

    Ok(())
}

/// Discovers and parses templates, fetches the cluster's global-kind set,
/// and assembles the resource list (spec §4.1, §4.2, §4.5). Template
/// parsing errors surface as a single classified `InvalidTemplateError`
/// (spec §7) rather than propagating the raw `CoreError` variant, so the
/// CLI layer only ever matches on `DeployError`.
async fn initialize(config: &TaskConfig, reader: &dyn ApiReader) -> KubeResult<Vec<Resource>> {
    let template_set = TemplateSet::new(config.sensitive_filenames.clone());
    let docs = template_set
        .discover(&config.template_paths)
        .map_err(|e| DeployError::InvalidTemplateError {
            errors: vec![e.to_string()],
        })?;

    // `global_resource_kinds` is memoized by the reader, so calling it here
    // and again inside `validate` costs one extra lookup, not one extra
    // remote round-trip.
    let global_kinds = reader.global_resource_kinds().await?;
    Ok(build_resources(docs, &global_kinds, config))
}

async fn initial_status_sync(reader: &dyn ApiReader, resources: &mut [Resource]) -> KubeResult<()> {
    let keys = cache_keys_for(resources.iter());
    let cache = ResourceCache::prefetch(reader, keys, &HashMap::new()).await?;
    sync_all(resources, &cache, DEFAULT_WORKERS).await;
    Ok(())
}

fn alert_type_for(status: SummaryStatus) -> AlertType {
    match status {
        SummaryStatus::Success => AlertType::Success,
        SummaryStatus::TimedOut => AlertType::Warning,
        SummaryStatus::Failure => AlertType::Error,
    }
}
