//! Public URLs affected by a change to the notes repository.
//!
//! Both the old and new version of each changed note are considered: a note
//! that stops being published still needs its URL resubmitted so search
//! engines learn it is gone.

use crate::config::Config;
use crate::normalize::Normalizer;
use crate::selector::Selector;
use crate::urls::{page_url, tag_url, tags_index_url, url_host};
use std::collections::BTreeSet;
use std::path::Path;

/// One changed file from `git diff --name-status`; `old` is absent for
/// additions, `new` for deletions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedPath {
    pub old: Option<String>,
    pub new: Option<String>,
}

/// Parse `git diff --name-status` output (tab separated).
pub fn parse_name_status(output: &str) -> Vec<ChangedPath> {
    let mut changes = Vec::new();

    for line in output.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        let status = fields[0];

        if status.starts_with('R') || status.starts_with('C') {
            if fields.len() >= 3 {
                changes.push(ChangedPath {
                    old: Some(fields[1].to_string()),
                    new: Some(fields[2].to_string()),
                });
            }
        } else if (status == "A" || status == "M") && fields.len() >= 2 {
            changes.push(ChangedPath {
                old: None,
                new: Some(fields[1].to_string()),
            });
        } else if status == "D" && fields.len() >= 2 {
            changes.push(ChangedPath {
                old: Some(fields[1].to_string()),
                new: None,
            });
        }
    }

    changes
}

/// Accumulates page and taxonomy URLs from note versions
pub struct UrlCollector {
    selector: Selector,
    normalizer: Normalizer,
    base_url: String,
    notes_dir: String,
    include_taxonomies: bool,
    /// The marker tag is stripped on export, so it has no tag page
    marker_has_page: bool,
    tagged: bool,
    urls: BTreeSet<String>,
    tags: BTreeSet<String>,
}

impl UrlCollector {
    /// `notes_dir` is the notes directory relative to the repository root.
    pub fn new(config: &Config, base_url: &str, notes_dir: &str) -> Self {
        Self {
            selector: Selector::from_config(config),
            normalizer: Normalizer::from_config(config),
            base_url: base_url.to_string(),
            notes_dir: notes_dir.trim_matches('/').to_string(),
            include_taxonomies: false,
            marker_has_page: !config.publish.strip_marker,
            tagged: false,
            urls: BTreeSet::new(),
            tags: BTreeSet::new(),
        }
    }

    pub fn include_taxonomies(mut self, include: bool) -> Self {
        self.include_taxonomies = include;
        self
    }

    fn note_relative<'p>(&self, repo_path: &'p str) -> Option<&'p str> {
        if self.notes_dir.is_empty() {
            return Some(repo_path);
        }
        repo_path
            .strip_prefix(self.notes_dir.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
    }

    /// Record one version of a note, given its repository path and content.
    /// Returns whether the version was publishable.
    pub fn add_version(&mut self, repo_path: &str, content: &str) -> bool {
        let Some(rel) = self.note_relative(repo_path) else {
            return false;
        };
        let rel = Path::new(rel);
        if !self.selector.is_markdown(rel) {
            return false;
        }

        let doc = match self.selector.select_text(rel, content) {
            Ok(Some(doc)) => doc,
            Ok(None) => return false,
            Err(e) => {
                tracing::warn!("Ignoring {}: {}", repo_path, e);
                return false;
            }
        };

        let out_rel = self.normalizer.output_path(&doc.rel_path);
        self.urls.insert(page_url(&out_rel, &self.base_url));

        if self.include_taxonomies {
            let marker = self.selector.marker();
            for tag in doc.front_matter.tag_values() {
                self.tagged = true;
                if tag != marker || self.marker_has_page {
                    self.tags.insert(tag.to_lowercase());
                }
            }
        }
        true
    }

    /// Sorted URLs, restricted to `host`
    pub fn finish(mut self, host: &str) -> Vec<String> {
        if self.include_taxonomies && self.tagged {
            self.urls.insert(tags_index_url(&self.base_url));
            for tag in &self.tags {
                self.urls.insert(tag_url(tag, &self.base_url));
            }
        }

        let host = host.to_ascii_lowercase();
        self.urls
            .into_iter()
            .filter(|url| url_host(url).as_deref() == Some(host.as_str()))
            .collect()
    }
}
