//! A single parsed YAML document, still ignorant of cluster classification.
//!
//! `ManifestDocument` is the output of [`crate::template_set::TemplateSet`]:
//! one per YAML document in the input files, carrying just enough identity
//! to let downstream components (in `deploykit-kube`) classify it against
//! live cluster discovery and build a full `Resource`.

use serde::Deserialize;

/// A manifest document as discovered on disk, before cluster classification.
#[derive(Debug, Clone)]
pub struct ManifestDocument {
    pub kind: String,
    pub name: String,
    pub api_version: String,
    /// Namespace named in the manifest itself, if any. Used only to detect
    /// namespaced resources; this task never sends a namespace to the API.
    pub namespace_in_manifest: Option<String>,
    pub file_path: String,
    pub raw_manifest: Vec<u8>,
    /// True when the manifest's file basename is in the caller-supplied
    /// sensitive-filename set, or the content looks like a `Secret`.
    pub sensitive: bool,
}

impl ManifestDocument {
    pub fn identity(&self) -> (String, String) {
        (self.kind.clone(), self.name.clone())
    }

    pub fn raw_as_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.raw_manifest)
    }
}

/// Minimal shape used only to pull identity fields out of arbitrary YAML.
/// Unknown fields are ignored so a document with a rich, unknown-to-us
/// `spec:` never fails to parse.
#[derive(Debug, Deserialize)]
pub(crate) struct IdentityOnly {
    pub kind: Option<String>,
    #[serde(rename = "apiVersion")]
    pub api_version: Option<String>,
    pub metadata: Option<IdentityMetadata>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IdentityMetadata {
    pub name: Option<String>,
    pub namespace: Option<String>,
}
