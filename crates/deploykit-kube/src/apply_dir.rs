//! The temporary apply directory (spec §4.6.1, §5, §9): a scratch
//! directory containing exactly one entry per applyable resource, so that
//! `kubectl apply -f <dir>` sees exactly the intended set and nothing else.
//! Owned exclusively by the calling thread for the duration of one apply
//! call and released on every exit path via RAII.

use std::path::{Path, PathBuf};

use deploykit_core::Resource;

use crate::error::{DeployError, Result};

/// Scoped acquisition of a temporary directory populated with one entry
/// per resource in `applyables`. Symlinks are preferred (cheap, preserve
/// the "sees exactly the applyables" invariant without copying manifest
/// bytes); on filesystems where symlinking fails, falls back to copying
/// the file, per the design note in spec §9.
pub struct ApplyDir {
    dir: tempfile::TempDir,
}

impl ApplyDir {
    /// Creates the directory and links (or copies) every resource's
    /// `file_path` into it, named after the resource's basename so
    /// collisions between identically-named files in different source
    /// directories don't overwrite each other.
    pub fn build(applyables: &[&Resource]) -> Result<Self> {
        let dir = tempfile::tempdir().map_err(DeployError::Io)?;

        for (index, resource) in applyables.iter().enumerate() {
            let source = Path::new(&resource.file_path);
            let link_name = format!(
                "{index:04}-{}",
                source
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("manifest.yaml")
            );
            let link_path = dir.path().join(link_name);
            link_or_copy(source, &link_path)?;
        }

        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

#[cfg(unix)]
fn link_or_copy(source: &Path, link_path: &Path) -> Result<()> {
    if std::os::unix::fs::symlink(source, link_path).is_ok() {
        return Ok(());
    }
    std::fs::copy(source, link_path).map_err(DeployError::Io)?;
    Ok(())
}

#[cfg(not(unix))]
fn link_or_copy(source: &Path, link_path: &Path) -> Result<()> {
    std::fs::copy(source, link_path).map_err(DeployError::Io)?;
    Ok(())
}

#[allow(dead_code)]
fn applyable_count(dir: &Path) -> std::io::Result<usize> {
    Ok(std::fs::read_dir(dir)?.count())
}

pub fn symlink_target(entry: &PathBuf) -> Option<PathBuf> {
    std::fs::read_link(entry).ok()
}
