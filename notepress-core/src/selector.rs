//! Selection of publishable documents from the source tree.

use crate::config::Config;
use crate::error::{ExportError, Result};
use crate::frontmatter::{parse_document, FrontMatter, FrontmatterError};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Front matter key accepted as an alternative to the marker tag
pub const PUBLISH_FLAG: &str = "publish";

/// A source document that passed selection
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    /// Path relative to the source root
    pub rel_path: PathBuf,
    pub front_matter: FrontMatter,
    pub body: String,
}

/// A document that could not be considered because its front matter is broken
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDocument {
    pub rel_path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct Selection {
    pub documents: Vec<SourceDocument>,
    pub skipped: Vec<SkippedDocument>,
    /// Markdown files looked at, selected or not
    pub scanned: usize,
}

/// Decides which documents get published
#[derive(Debug, Clone)]
pub struct Selector {
    marker: String,
    honor_publish_flag: bool,
    extensions: Vec<String>,
    ignore: Vec<Regex>,
}

impl Selector {
    /// Selector matching `marker` with the default extensions and no ignores
    pub fn new(marker: impl Into<String>) -> Self {
        let defaults = Config::default();
        Self {
            marker: marker.into(),
            honor_publish_flag: defaults.publish.honor_publish_flag,
            extensions: defaults.extensions,
            ignore: Vec::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            marker: config.publish.marker.clone(),
            honor_publish_flag: config.publish.honor_publish_flag,
            extensions: config.extensions.clone(),
            ignore: compile_ignore_patterns(&config.ignore_patterns),
        }
    }

    pub fn with_publish_flag(mut self, honor: bool) -> Self {
        self.honor_publish_flag = honor;
        self
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Exact, case-sensitive marker match against every tag, in any position.
    pub fn is_publishable(&self, front_matter: &FrontMatter) -> bool {
        let tagged = front_matter
            .tags()
            .is_some_and(|tags| tags.contains(&self.marker));
        tagged || (self.honor_publish_flag && front_matter.flag(PUBLISH_FLAG) == Some(true))
    }

    /// Parse one document and keep it when publishable.
    ///
    /// Documents without a front matter block are never publishable.
    pub fn select_text(
        &self,
        rel_path: &Path,
        content: &str,
    ) -> std::result::Result<Option<SourceDocument>, FrontmatterError> {
        let doc = parse_document(content)?;
        let Some(front_matter) = doc.front_matter else {
            return Ok(None);
        };
        if !self.is_publishable(&front_matter) {
            return Ok(None);
        }
        Ok(Some(SourceDocument {
            rel_path: rel_path.to_path_buf(),
            front_matter,
            body: doc.body,
        }))
    }

    pub fn is_markdown(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }

    /// Walk `root` and collect every publishable document.
    ///
    /// A missing root is fatal. Broken front matter only skips that document.
    pub fn discover(&self, root: &Path) -> Result<Selection> {
        if !root.exists() {
            return Err(ExportError::SourceMissing(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(ExportError::SourceNotDirectory(root.to_path_buf()));
        }

        let mut selection = Selection::default();

        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() || !self.is_markdown(entry.path()) {
                continue;
            }

            let rel_path = entry
                .path()
                .strip_prefix(root)
                .unwrap_or(entry.path())
                .to_path_buf();
            let rel_str = rel_path.to_string_lossy().replace('\\', "/");
            if should_ignore(&rel_str, &self.ignore) {
                tracing::debug!("Ignoring {} due to ignore_patterns", rel_str);
                continue;
            }

            selection.scanned += 1;

            let bytes = fs::read(entry.path()).map_err(|source| ExportError::Read {
                path: entry.path().to_path_buf(),
                source,
            })?;
            let Ok(content) = String::from_utf8(bytes) else {
                tracing::warn!("Skipping {}: not valid UTF-8", rel_str);
                selection.skipped.push(SkippedDocument {
                    rel_path,
                    reason: "not valid UTF-8".to_string(),
                });
                continue;
            };

            match self.select_text(&rel_path, &content) {
                Ok(Some(doc)) => {
                    tracing::debug!("Selected {}", rel_str);
                    selection.documents.push(doc);
                }
                Ok(None) => tracing::trace!("Not published: {}", rel_str),
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", rel_str, e);
                    selection.skipped.push(SkippedDocument {
                        rel_path,
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            "Selected {} of {} documents ({} skipped)",
            selection.documents.len(),
            selection.scanned,
            selection.skipped.len()
        );

        Ok(selection)
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

fn compile_ignore_patterns(patterns: &[String]) -> Vec<Regex> {
    let mut compiled = Vec::new();
    for pat in patterns {
        match Regex::new(pat) {
            Ok(re) => compiled.push(re),
            Err(err) => tracing::warn!("Invalid ignore pattern '{}': {}", pat, err),
        }
    }
    compiled
}

fn should_ignore(path: &str, ignores: &[Regex]) -> bool {
    ignores.iter().any(|re| re.is_match(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn fm(yaml: &str) -> FrontMatter {
        FrontMatter::parse(yaml).unwrap()
    }

    #[test]
    fn test_marker_in_any_position() {
        let selector = Selector::new("publish");
        assert!(selector.is_publishable(&fm("tags: [publish]\n")));
        assert!(selector.is_publishable(&fm("tags: [publish, draft]\n")));
        assert!(selector.is_publishable(&fm("tags: [reference, publish, draft]\n")));
        assert!(selector.is_publishable(&fm("tags:\n  - a\n  - b\n  - publish\n")));
    }

    #[test]
    fn test_scalar_marker() {
        let selector = Selector::new("publish");
        assert!(selector.is_publishable(&fm("tags: publish\n")));
    }

    #[test]
    fn test_match_is_exact_and_case_sensitive() {
        let selector = Selector::new("publish");
        assert!(!selector.is_publishable(&fm("tags: [Publish]\n")));
        assert!(!selector.is_publishable(&fm("tags: [published]\n")));
        assert!(!selector.is_publishable(&fm("tags: [unpublish]\n")));
    }

    #[test]
    fn test_missing_or_empty_tags_excluded() {
        let selector = Selector::new("publish").with_publish_flag(false);
        assert!(!selector.is_publishable(&fm("title: x\n")));
        assert!(!selector.is_publishable(&fm("tags:\n")));
        assert!(!selector.is_publishable(&fm("tags: []\n")));
        assert!(!selector.is_publishable(&fm("tags: \"\"\n")));
    }

    #[test]
    fn test_publish_flag() {
        let selector = Selector::new("publish");
        assert!(selector.is_publishable(&fm("publish: true\n")));
        assert!(!selector.is_publishable(&fm("publish: false\n")));
        assert!(!selector.is_publishable(&fm("publish: \"true\"\n")));

        let strict = Selector::new("publish").with_publish_flag(false);
        assert!(!strict.is_publishable(&fm("publish: true\n")));
    }

    #[test]
    fn test_select_text_without_front_matter() {
        let selector = Selector::new("publish");
        let result = selector
            .select_text(Path::new("a.md"), "# publish\n")
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_discover_skips_malformed_and_hidden() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("notes")).unwrap();
        fs::create_dir_all(root.join(".obsidian")).unwrap();
        fs::write(root.join("notes/good.md"), "---\ntags: [publish]\n---\nok\n").unwrap();
        fs::write(root.join("notes/bad.md"), "---\ntags: [publish\n---\nbroken\n").unwrap();
        fs::write(root.join("notes/list.md"), "---\n- publish\n---\n").unwrap();
        fs::write(root.join("notes/draft.md"), "---\ntags: [draft]\n---\n").unwrap();
        fs::write(root.join("notes/binary.md"), [0xff, 0xfe, 0x00]).unwrap();
        fs::write(root.join("notes/readme.txt"), "---\ntags: publish\n---\n").unwrap();
        fs::write(root.join(".obsidian/cfg.md"), "---\ntags: publish\n---\n").unwrap();

        let selection = Selector::new("publish").discover(root).unwrap();

        let selected: Vec<_> = selection
            .documents
            .iter()
            .map(|d| d.rel_path.clone())
            .collect();
        assert_eq!(selected, vec![PathBuf::from("notes/good.md")]);
        assert_eq!(selection.scanned, 5);
        assert_eq!(selection.skipped.len(), 3);
    }

    #[test]
    fn test_discover_honors_ignore_patterns() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("templates")).unwrap();
        fs::write(root.join("templates/t.md"), "---\ntags: publish\n---\n").unwrap();
        fs::write(root.join("keep.md"), "---\ntags: publish\n---\n").unwrap();

        let mut config = Config::default();
        config.ignore_patterns = vec!["^templates/".to_string(), "([bad".to_string()];
        let selection = Selector::from_config(&config).discover(root).unwrap();

        assert_eq!(selection.documents.len(), 1);
        assert_eq!(selection.documents[0].rel_path, PathBuf::from("keep.md"));
    }

    #[test]
    fn test_discover_missing_root_is_fatal() {
        let dir = tempdir().unwrap();
        let err = Selector::new("publish")
            .discover(&dir.path().join("nope"))
            .unwrap_err();
        assert!(matches!(err, ExportError::SourceMissing(_)));
    }
}
