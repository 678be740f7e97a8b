//! Writing output documents under the output root.

use crate::error::{ExportError, Result};
use crate::normalize::OutputDocument;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Writes documents below a single output directory
#[derive(Debug, Clone)]
pub struct Emitter {
    root: PathBuf,
}

impl Emitter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the output root if it does not exist yet
    pub fn prepare(&self) -> Result<()> {
        fs::create_dir_all(&self.root).map_err(|source| ExportError::Write {
            path: self.root.clone(),
            source,
        })
    }

    /// Remove everything a previous run left behind
    pub fn clean(&self) -> Result<()> {
        if !self.root.exists() {
            return Ok(());
        }
        tracing::debug!("Clearing output directory {:?}", self.root);
        fs::remove_dir_all(&self.root).map_err(|source| ExportError::Write {
            path: self.root.clone(),
            source,
        })
    }

    /// Absolute path for an output-relative path; refuses to leave the root.
    pub fn target_path(&self, rel_path: &Path) -> Result<PathBuf> {
        let escapes = rel_path.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if escapes || rel_path.as_os_str().is_empty() {
            return Err(ExportError::OutputOutsideRoot(rel_path.to_path_buf()));
        }
        Ok(self.root.join(rel_path))
    }

    /// Write one document, creating parent directories as needed.
    pub fn write(&self, doc: &OutputDocument) -> Result<PathBuf> {
        let path = self.target_path(&doc.rel_path)?;
        let rendered = doc.render()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ExportError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&path, rendered).map_err(|source| ExportError::Write {
            path: path.clone(),
            source,
        })?;

        tracing::debug!("Wrote {} -> {:?}", doc.origin(), path);
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchPageConfig;
    use tempfile::tempdir;

    #[test]
    fn test_write_creates_parents() {
        let dir = tempdir().unwrap();
        let emitter = Emitter::new(dir.path().join("out"));
        let mut doc = OutputDocument::search_page(&SearchPageConfig::default());
        doc.rel_path = PathBuf::from("a/b/c.md");

        let path = emitter.write(&doc).unwrap();
        assert_eq!(path, dir.path().join("out/a/b/c.md"));
        assert!(fs::read_to_string(path).unwrap().contains("layout: search"));
    }

    #[test]
    fn test_search_page_written_at_configured_path() {
        let dir = tempdir().unwrap();
        let emitter = Emitter::new(dir.path());
        let config = SearchPageConfig {
            path: PathBuf::from("search/_index.md"),
            ..SearchPageConfig::default()
        };

        let path = emitter.write(&OutputDocument::search_page(&config)).unwrap();
        assert_eq!(
            fs::read_to_string(path).unwrap(),
            "---\ntitle: Search\nlayout: search\n---\n"
        );
    }

    #[test]
    fn test_rejects_paths_outside_root() {
        let emitter = Emitter::new("/tmp/out");
        assert!(emitter.target_path(Path::new("../x.md")).is_err());
        assert!(emitter.target_path(Path::new("/etc/x.md")).is_err());
        assert!(emitter.target_path(Path::new("")).is_err());
        assert!(emitter.target_path(Path::new("ok/x.md")).is_ok());
    }

    #[test]
    fn test_clean_missing_root_is_ok() {
        let dir = tempdir().unwrap();
        Emitter::new(dir.path().join("never-created")).clean().unwrap();
    }
}
