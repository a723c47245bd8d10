//! Template set: walks an ordered list of paths and produces a lazy-ish
//! stream of parsed manifest documents, one per YAML document, each carrying
//! its source file path. See spec §4.1.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{CoreError, Result};
use crate::manifest::{IdentityOnly, ManifestDocument};

/// Traverses the configured template paths and validates the resulting set
/// of manifest documents.
pub struct TemplateSet {
    sensitive_filenames: HashSet<String>,
}

impl TemplateSet {
    pub fn new(sensitive_filenames: HashSet<String>) -> Self {
        Self { sensitive_filenames }
    }

    /// Discover and parse every YAML document under `paths` (files or
    /// directories, walked in the given order). Duplicate `(kind, name)`
    /// identities across the whole set are a validation error.
    pub fn discover(&self, paths: &[PathBuf]) -> Result<Vec<ManifestDocument>> {
        let mut seen: HashMap<(String, String), String> = HashMap::new();
        let mut out = Vec::new();

        for path in paths {
            for file in self.files_under(path)? {
                for doc in self.parse_file(&file)? {
                    let key = doc.identity();
                    if let Some(first_file) = seen.get(&key) {
                        return Err(CoreError::DuplicateIdentity {
                            kind: key.0,
                            name: key.1,
                            first_file: first_file.clone(),
                            second_file: doc.file_path.clone(),
                        });
                    }
                    seen.insert(key, doc.file_path.clone());
                    out.push(doc);
                }
            }
        }

        Ok(out)
    }

    fn files_under(&self, path: &Path) -> Result<Vec<PathBuf>> {
        if path.is_file() {
            return Ok(vec![path.to_path_buf()]);
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry.map_err(|e| CoreError::Io {
                path: path.display().to_string(),
                source: std::io::Error::other(e),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let is_yaml = entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| ext == "yaml" || ext == "yml");
            if is_yaml {
                files.push(entry.path().to_path_buf());
            }
        }
        Ok(files)
    }

    fn parse_file(&self, file: &Path) -> Result<Vec<ManifestDocument>> {
        let file_display = file.display().to_string();
        let bytes = std::fs::read(file).map_err(|e| CoreError::Io {
            path: file_display.clone(),
            source: e,
        })?;
        let content = String::from_utf8_lossy(&bytes);

        let basename = file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&file_display)
            .to_string();
        let sensitive_by_name = self.sensitive_filenames.contains(&basename);

        let mut docs = Vec::new();
        for parsed in serde_yaml::Deserializer::from_str(&content) {
            let value = serde_yaml::Value::deserialize(parsed).map_err(|e| {
                CoreError::InvalidTemplate {
                    file: file_display.clone(),
                    message: e.to_string(),
                    snippet: if sensitive_by_name {
                        None
                    } else {
                        Some(content.chars().take(200).collect())
                    },
                }
            })?;

            if matches!(&value, serde_yaml::Value::Null) {
                continue;
            }

            let identity: IdentityOnly =
                serde_yaml::from_value(value.clone()).map_err(|e| CoreError::InvalidTemplate {
                    file: file_display.clone(),
                    message: e.to_string(),
                    snippet: None,
                })?;

            let kind = identity.kind.ok_or_else(|| CoreError::MissingIdentity {
                file: file_display.clone(),
                field: "kind".to_string(),
            })?;
            let api_version = identity
                .api_version
                .ok_or_else(|| CoreError::MissingIdentity {
                    file: file_display.clone(),
                    field: "apiVersion".to_string(),
                })?;
            let metadata = identity.metadata.ok_or_else(|| CoreError::MissingIdentity {
                file: file_display.clone(),
                field: "metadata".to_string(),
            })?;
            let name = metadata.name.ok_or_else(|| CoreError::MissingIdentity {
                file: file_display.clone(),
                field: "metadata.name".to_string(),
            })?;

            let raw = serde_yaml::to_string(&value).unwrap_or_default().into_bytes();

            docs.push(ManifestDocument {
                kind,
                name,
                api_version,
                namespace_in_manifest: metadata.namespace,
                file_path: file_display.clone(),
                raw_manifest: raw,
                sensitive: sensitive_by_name,
            });
        }

        Ok(docs)
    }
}

use serde::Deserialize;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::io::Write;

    fn write_manifest(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn discovers_and_parses_multi_document_files() {
        let dir = tempfile::tempdir().unwrap();
        write_manifest(
            dir.path(),
            "a.yaml",
            "kind: StorageClass\napiVersion: storage.k8s.io/v1\nmetadata:\n  name: sc-a\n---\nkind: ClusterRole\napiVersion: rbac.authorization.k8s.io/v1\nmetadata:\n  name: cr-b\n",
        );

        let set = TemplateSet::new(HashSet::new());
        let docs = set.discover(&[dir.path().to_path_buf()]).unwrap();

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].kind, "StorageClass");
        assert_eq!(docs[1].kind, "ClusterRole");
    }

    #[test]
    fn rejects_duplicate_identities() {
        let dir = tempfile::tempdir().unwrap();
        write_manifest(
            dir.path(),
            "a.yaml",
            "kind: ClusterRole\napiVersion: rbac.authorization.k8s.io/v1\nmetadata:\n  name: cr-b\n",
        );
        write_manifest(
            dir.path(),
            "b.yaml",
            "kind: ClusterRole\napiVersion: rbac.authorization.k8s.io/v1\nmetadata:\n  name: cr-b\n",
        );

        let set = TemplateSet::new(HashSet::new());
        let err = set
            .discover(&[dir.path().to_path_buf()])
            .expect_err("expected duplicate identity error");
        assert!(matches!(err, CoreError::DuplicateIdentity { .. }));
    }

    #[test]
    fn rejects_missing_name() {
        let dir = tempfile::tempdir().unwrap();
        write_manifest(
            dir.path(),
            "a.yaml",
            "kind: ClusterRole\napiVersion: rbac.authorization.k8s.io/v1\nmetadata: {}\n",
        );

        let set = TemplateSet::new(HashSet::new());
        let err = set
            .discover(&[dir.path().to_path_buf()])
            .expect_err("expected missing identity error");
        assert!(matches!(err, CoreError::MissingIdentity { .. }));
    }

    #[test]
    fn marks_sensitive_filenames() {
        let dir = tempfile::tempdir().unwrap();
        write_manifest(
            dir.path(),
            "secret.yaml",
            "kind: Secret\napiVersion: v1\nmetadata:\n  name: s1\n",
        );

        let mut sensitive = HashSet::new();
        sensitive.insert("secret.yaml".to_string());
        let set = TemplateSet::new(sensitive);
        let docs = set.discover(&[dir.path().to_path_buf()]).unwrap();

        assert!(docs[0].sensitive);
    }
}
