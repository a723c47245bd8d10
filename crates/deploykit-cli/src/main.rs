//! Deploykit - deploys cluster-scoped Kubernetes manifests from CI/CD and
//! waits for rollout.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use clap::Parser;
use deploykit_core::{DeployStrategy, NullMetricsSink, TaskConfig};
use deploykit_kube::{KubeApiReader, ProcessKubectlRunner};

mod error;
mod exit_codes;
mod orchestrator;
mod summary;

use error::{CliError, Result};
use summary::ConsoleSummarySink;

#[derive(Parser)]
#[command(name = "deploykit")]
#[command(author = "Deploykit Contributors")]
#[command(version)]
#[command(about = "Deploys cluster-scoped Kubernetes manifests and waits for rollout", long_about = None)]
struct Cli {
    /// Kubectl context to operate against.
    #[arg(long, env = "DEPLOYKIT_CONTEXT")]
    context: String,

    /// Manifest template paths (files or directories); may be repeated.
    #[arg(long = "template-paths", required = true)]
    template_paths: Vec<PathBuf>,

    /// Label selector restricting which previously-applied objects are
    /// eligible for pruning. If unset, `--all` is used instead.
    #[arg(long)]
    selector: Option<String>,

    /// `group/version/kind` entries eligible for pruning; may be repeated.
    #[arg(long = "prune-whitelist")]
    prune_whitelist: Vec<String>,

    /// Whether to prune resources not present in the input set.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    prune: bool,

    /// Whether to hand off to the watcher after the deploy phase.
    #[arg(long = "verify-result", default_value_t = true, action = clap::ArgAction::Set)]
    verify_result: bool,

    /// Global watch deadline, in seconds.
    #[arg(long, default_value_t = 300)]
    max_watch_seconds: u64,

    /// Basenames whose stderr/content must never be echoed unless cleared
    /// by a successful server-dry-run; may be repeated.
    #[arg(long = "sensitive-filename")]
    sensitive_filenames: Vec<String>,

    /// `kind=strategy` overrides (`Apply`, `Replace`, `ReplaceForce`); may be
    /// repeated. Any kind not listed defaults to `Apply`.
    #[arg(long = "deploy-strategy")]
    deploy_strategy: Vec<String>,

    /// Path to the `kubectl` binary.
    #[arg(long, default_value = "kubectl")]
    kubectl_path: String,
}

fn parse_strategy_overrides(entries: &[String]) -> Result<HashMap<String, DeployStrategy>> {
    let mut overrides = HashMap::new();
    for entry in entries {
        let (kind, strategy) = entry
            .split_once('=')
            .ok_or_else(|| CliError::usage(format!("'{entry}' is not in kind=strategy form")))?;
        let strategy = match strategy {
            "Apply" => DeployStrategy::Apply,
            "Replace" => DeployStrategy::Replace,
            "ReplaceForce" => DeployStrategy::ReplaceForce,
            other => {
                return Err(CliError::usage(format!(
                    "unknown deploy strategy '{other}' for kind '{kind}'"
                )))
            }
        };
        overrides.insert(kind.to_string(), strategy);
    }
    Ok(overrides)
}

fn build_config(cli: &Cli) -> Result<TaskConfig> {
    Ok(TaskConfig {
        context: cli.context.clone(),
        template_paths: cli.template_paths.clone(),
        selector: cli.selector.clone(),
        prune_whitelist: cli.prune_whitelist.clone(),
        prune: cli.prune,
        verify_result: cli.verify_result,
        max_watch_seconds: cli.max_watch_seconds,
        sensitive_filenames: cli.sensitive_filenames.iter().cloned().collect::<HashSet<_>>(),
        deploy_strategy_overrides: parse_strategy_overrides(&cli.deploy_strategy)?,
    })
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    miette::set_panic_hook();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => std::process::ExitCode::from(exit_codes::SUCCESS as u8),
        Err(e) => {
            eprintln!("{e:?}");
            std::process::ExitCode::from(e.exit_code() as u8)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = build_config(&cli)?;

    let client = kube::Client::try_default().await?;
    let reader = KubeApiReader::new(client);
    let runner = ProcessKubectlRunner::new(cli.kubectl_path.clone(), cli.context.clone());
    let summary = ConsoleSummarySink::new();
    let metrics = NullMetricsSink;

    orchestrator::run(&config, &reader, &runner, &summary, &metrics)
        .await
        .map(|_status| ())
        .map_err(CliError::from)
}
