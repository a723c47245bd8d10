//! The subprocess boundary (spec §6): invocations of the form
//! `<kubectl> <verb> [...args]`. Exactly three verbs are used by the core:
//! `apply`, `replace`, `create`. The trait is the seam that lets the
//! deployer be exercised without a real `kubectl` binary on PATH.

use async_trait::async_trait;
use tracing::{debug, warn};

/// Captured result of a single subprocess invocation.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            success: true,
        }
    }

    pub fn failure(stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            success: false,
        }
    }
}

/// Runs `kubectl` (or an equivalent binary) against a single active
/// context. Implementations are expected to be reentrant/stateless: the
/// deployer and watcher may call the same runner from multiple concurrent
/// tasks (spec §5).
#[async_trait]
pub trait KubectlRunner: Send + Sync {
    /// `kubectl apply [args...]`.
    async fn apply(&self, args: &[String]) -> CommandOutput;
    /// `kubectl replace [args...]`.
    async fn replace(&self, args: &[String]) -> CommandOutput;
    /// `kubectl create [args...]`.
    async fn create(&self, args: &[String]) -> CommandOutput;
}

/// Production runner: shells out to a real `kubectl` binary via
/// `tokio::process::Command`, carrying the active context in the
/// environment rather than as a flag, per spec §6.
pub struct ProcessKubectlRunner {
    kubectl_path: String,
    context: String,
}

impl ProcessKubectlRunner {
    pub fn new(kubectl_path: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            kubectl_path: kubectl_path.into(),
            context: context.into(),
        }
    }

    /// The active context never appears in argv (spec §6: "environment
    /// carrying the active context"); it is passed via `KUBECTL_CONTEXT` so
    /// the argv the real binary sees matches the literal argv the E2E
    /// scenarios assert on exactly.
    async fn run(&self, verb: &str, args: &[String]) -> CommandOutput {
        let mut command = tokio::process::Command::new(&self.kubectl_path);
        command
            .arg(verb)
            .args(args)
            .env("KUBECTL_CONTEXT", &self.context);

        debug!(verb, context = %self.context, argv = %quote_argv(verb, args), "invoking kubectl");

        match command.output().await {
            Ok(output) => {
                if !output.status.success() {
                    warn!(verb, status = ?output.status.code(), "kubectl exited non-zero");
                }
                CommandOutput {
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                    success: output.status.success(),
                }
            }
            Err(e) => {
                warn!(verb, error = %e, "failed to spawn kubectl");
                CommandOutput::failure(format!("failed to spawn kubectl: {e}"))
            }
        }
    }
}

#[async_trait]
impl KubectlRunner for ProcessKubectlRunner {
    async fn apply(&self, args: &[String]) -> CommandOutput {
        self.run("apply", args).await
    }

    async fn replace(&self, args: &[String]) -> CommandOutput {
        self.run("replace", args).await
    }

    async fn create(&self, args: &[String]) -> CommandOutput {
        self.run("create", args).await
    }
}

/// Builds the full argv for a single verb the way the production runner
/// would see it, for tests and for diagnostic messages (`Command failed:
/// <quoted argv>`, spec §4.6.1).
pub fn quote_argv(verb: &str, args: &[String]) -> String {
    let mut parts = vec!["kubectl".to_string(), verb.to_string()];
    parts.extend(args.iter().cloned());
    parts.join(" ")
}
