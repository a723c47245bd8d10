//! Builds `Resource`s from discovered manifest documents, classifying each
//! against the cluster's set of cluster-scoped kinds (spec §3, §4.2).

use std::collections::HashSet;

use deploykit_core::{Classification, ManifestDocument, Resource, TaskConfig};

/// Classifies and assembles one `Resource` per `ManifestDocument`, in
/// input order. Does not itself reject namespaced resources — that check
/// belongs to the deployer (spec §4.6 precondition) so the orchestrator
/// can still report every namespaced resource found, not just the first.
pub fn build_resources(
    docs: Vec<ManifestDocument>,
    global_kinds: &HashSet<String>,
    config: &TaskConfig,
) -> Vec<Resource> {
    docs.into_iter()
        .map(|doc| {
            let classification = if global_kinds.contains(&doc.kind) && doc.namespace_in_manifest.is_none() {
                Classification::Global
            } else {
                Classification::Namespaced
            };
            let strategy = config.deploy_strategy_for(&doc.kind);
            let prunable = config.is_prunable(&doc.kind);
            Resource::from_manifest(doc, classification, strategy, prunable)
        })
        .collect()
}
