//! Export orchestration - selects, normalizes and writes the site content.

use crate::config::Config;
use crate::emit::Emitter;
use crate::error::{ExportError, Result};
use crate::normalize::{clean_relative, Normalizer, OutputDocument};
use crate::selector::{Selector, SkippedDocument};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Everything an export would write, computed without touching the output
#[derive(Debug)]
pub struct ExportPlan {
    pub scanned: usize,
    pub skipped: Vec<SkippedDocument>,
    pub documents: Vec<OutputDocument>,
    pub search_page: OutputDocument,
}

impl ExportPlan {
    /// Output-relative paths in write order, search page last
    pub fn output_paths(&self) -> impl Iterator<Item = &Path> {
        self.documents
            .iter()
            .chain(std::iter::once(&self.search_page))
            .map(|doc| doc.rel_path.as_path())
    }
}

/// Summary of a finished export
#[derive(Debug)]
pub struct ExportReport {
    pub scanned: usize,
    pub published: usize,
    pub skipped: Vec<SkippedDocument>,
    /// Absolute paths of written documents, search page excluded
    pub written: Vec<PathBuf>,
    pub search_page: PathBuf,
}

/// Runs the publish export for one configuration
pub struct Exporter {
    config: Config,
    selector: Selector,
    normalizer: Normalizer,
}

impl Exporter {
    pub fn new(config: Config) -> Self {
        let selector = Selector::from_config(&config);
        let normalizer = Normalizer::from_config(&config);
        Self {
            config,
            selector,
            normalizer,
        }
    }

    /// Select and normalize every document and check the output layout.
    ///
    /// Fails on a missing source directory, an output directory overlapping
    /// the source tree, or when two documents resolve to the same output
    /// path. Nothing is written.
    pub fn plan(&self) -> Result<ExportPlan> {
        let source_dir = self.config.source_dir();
        let selection = self.selector.discover(&source_dir)?;
        check_overlap(&source_dir, &self.config.output_dir())?;

        let documents: Vec<OutputDocument> = selection
            .documents
            .iter()
            .map(|doc| self.normalizer.normalize(doc))
            .collect();
        let search_page = OutputDocument::search_page(&self.config.search_page);

        let plan = ExportPlan {
            scanned: selection.scanned,
            skipped: selection.skipped,
            documents,
            search_page,
        };
        check_collisions(&plan)?;
        Ok(plan)
    }

    /// Run the export: plan, optionally clear the output, write everything.
    pub fn run(&self) -> Result<ExportReport> {
        let source_dir = self.config.source_dir();
        let output_dir = self.config.output_dir();
        tracing::info!("Exporting {:?} -> {:?}", source_dir, output_dir);

        let plan = self.plan()?;

        let emitter = Emitter::new(&output_dir);
        if self.config.clean_output {
            emitter.clean()?;
        }
        emitter.prepare()?;

        let mut written = Vec::with_capacity(plan.documents.len());
        for doc in &plan.documents {
            written.push(emitter.write(doc)?);
        }
        let search_page = emitter.write(&plan.search_page)?;

        tracing::info!(
            "Published {} documents ({} scanned, {} skipped)",
            written.len(),
            plan.scanned,
            plan.skipped.len()
        );

        Ok(ExportReport {
            scanned: plan.scanned,
            published: written.len(),
            skipped: plan.skipped,
            written,
            search_page,
        })
    }
}

fn check_collisions(plan: &ExportPlan) -> Result<()> {
    let mut claimed: BTreeMap<PathBuf, String> = BTreeMap::new();

    for doc in plan
        .documents
        .iter()
        .chain(std::iter::once(&plan.search_page))
    {
        let key = clean_relative(&doc.rel_path);
        if let Some(first) = claimed.get(&key) {
            return Err(ExportError::OutputCollision {
                path: key,
                first: first.clone(),
                second: doc.origin(),
            });
        }
        claimed.insert(key, doc.origin());
    }

    Ok(())
}

/// Source and output trees must be disjoint: neither may contain the other.
fn check_overlap(source_dir: &Path, output_dir: &Path) -> Result<()> {
    let source = resolve_existing(source_dir);
    let output = resolve_existing(output_dir);

    if source.starts_with(&output) || output.starts_with(&source) {
        return Err(ExportError::OutputOverlapsSource {
            output: output_dir.to_path_buf(),
            source_dir: source_dir.to_path_buf(),
        });
    }
    Ok(())
}

/// Canonical form of `path`, resolving its nearest existing ancestor when
/// the path itself has not been created yet.
fn resolve_existing(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut missing = Vec::new();
    let mut current = absolute.as_path();
    loop {
        if let Ok(resolved) = current.canonicalize() {
            return missing
                .iter()
                .rev()
                .fold(resolved, |acc: PathBuf, part| acc.join(part));
        }
        match (current.parent(), current.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                current = parent;
            }
            _ => return clean_relative(&absolute),
        }
    }
}

/// Convenience wrapper: run an export for `config`.
pub fn export(config: Config) -> Result<ExportReport> {
    Exporter::new(config).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn config_for(root: &Path) -> Config {
        let mut config = Config::default();
        config.set_source_dir(root.join("src"));
        config.set_output_dir(root.join("out"));
        config
    }

    #[test]
    fn test_collision_with_search_page_is_fatal() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(
            dir.path().join("src/search.md"),
            "---\ntags: publish\n---\n",
        )
        .unwrap();

        let err = Exporter::new(config_for(dir.path())).run().unwrap_err();
        match err {
            ExportError::OutputCollision { path, first, second } => {
                assert_eq!(path, PathBuf::from("search.md"));
                assert_eq!(first, "search.md");
                assert_eq!(second, "<generated>");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_home_and_existing_index_collide() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/index.md"), "---\ntags: publish\n---\n").unwrap();
        fs::write(dir.path().join("src/_index.md"), "---\ntags: publish\n---\n").unwrap();

        let err = Exporter::new(config_for(dir.path())).plan().unwrap_err();
        assert!(matches!(err, ExportError::OutputCollision { .. }));
    }

    #[test]
    fn test_output_containing_source_is_rejected() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();

        let mut config = Config::default();
        config.set_source_dir(dir.path().join("src"));
        config.set_output_dir(dir.path().to_path_buf());

        let err = Exporter::new(config).run().unwrap_err();
        assert!(matches!(err, ExportError::OutputOverlapsSource { .. }));
        assert!(dir.path().join("src").exists());
    }

    #[test]
    fn test_output_inside_source_is_rejected() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("content");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("b.md"), "---\ntags: [note, publish]\n---\nbody\n").unwrap();

        let mut config = Config::default();
        config.set_source_dir(src.clone());
        config.set_output_dir(src.join("site"));

        let err = Exporter::new(config.clone()).run().unwrap_err();
        assert!(matches!(err, ExportError::OutputOverlapsSource { .. }));
        assert!(!src.join("site").exists());

        // Also caught when the output directory already exists
        fs::create_dir_all(src.join("site/nested")).unwrap();
        config.set_output_dir(src.join("site/nested"));
        let err = Exporter::new(config).plan().unwrap_err();
        assert!(matches!(err, ExportError::OutputOverlapsSource { .. }));
    }

    #[test]
    fn test_sibling_directories_do_not_overlap() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();

        let mut config = config_for(dir.path());
        config.set_output_dir(dir.path().join("src-out"));
        Exporter::new(config).run().unwrap();
        assert!(dir.path().join("src-out/search.md").exists());
    }

    #[test]
    fn test_dotted_search_page_path_still_collides() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(
            dir.path().join("src/search.md"),
            "---\ntags: publish\n---\nreal content\n",
        )
        .unwrap();

        let mut config = config_for(dir.path());
        config.search_page.path = PathBuf::from("./search.md");

        let err = Exporter::new(config).run().unwrap_err();
        match err {
            ExportError::OutputCollision { path, .. } => {
                assert_eq!(path, PathBuf::from("search.md"))
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_plan_lists_search_page_last() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/a.md"), "---\ntags: publish\n---\n").unwrap();

        let plan = Exporter::new(config_for(dir.path())).plan().unwrap();
        let paths: Vec<_> = plan.output_paths().collect();
        assert_eq!(paths, vec![Path::new("a.md"), Path::new("search.md")]);
        assert!(!dir.path().join("out").exists());
    }
}
