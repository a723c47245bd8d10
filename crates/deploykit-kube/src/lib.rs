//! Deploykit Kube - Kubernetes integration for the global-resource deploy engine
//!
//! This crate provides:
//! - **Discovery**: cluster-scoped kind enumeration and object listing
//! - **Resource Cache**: one-list-per-kind status batching across a resource set
//! - **Config Validator**: pre-flight checks run before any resource touches the API server
//! - **Deployer**: the apply/replace dispatch algorithm and its error classification
//! - **Watcher**: the post-apply resync loop driving resources to a terminal state
//! - **Kind Behaviors**: per-kind sync/validate/prefetch rules

pub mod apply_dir;
pub mod cache;
pub mod deployer;
pub mod discovery;
pub mod error;
pub mod error_classifier;
pub mod kinds;
pub mod resource_builder;
pub mod runner;
pub mod sync;
pub mod validator;
pub mod watcher;

pub use apply_dir::ApplyDir;
pub use cache::ResourceCache;
pub use deployer::ResourceDeployer;
pub use discovery::{ApiReader, Crd, CrdScope, KubeApiReader, ObservedObject};
pub use error::{DeployError, Result};
pub use kinds::{sync_resource, validate_definition, KindBehavior, ValidationResult};
pub use resource_builder::build_resources;
pub use runner::{CommandOutput, KubectlRunner, ProcessKubectlRunner};
pub use sync::{sync_all, DEFAULT_WORKERS};
pub use validator::validate;
pub use watcher::{watch, DEFAULT_POLL_INTERVAL};
