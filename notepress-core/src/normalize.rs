//! Per-document normalization: front matter cleanup, duplicate title
//! suppression, link rewriting and output path resolution.

use crate::config::{Config, SearchPageConfig};
use crate::frontmatter::{FrontMatter, FrontmatterError, ParsedDocument};
use crate::links::LinkRewriter;
use crate::selector::{SourceDocument, PUBLISH_FLAG};
use crate::slug::slugify;
use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

/// File stem the site generator treats as a section/home page
pub const HOME_STEM: &str = "_index";

static HEADING_REGEX: OnceLock<Regex> = OnceLock::new();

fn heading_regex() -> &'static Regex {
    // ATX heading with optional closing hashes
    HEADING_REGEX
        .get_or_init(|| Regex::new(r"^ {0,3}#{1,6}(?:[ \t]+(.*?))?(?:[ \t]+#+)?[ \t]*$").unwrap())
}

/// A document ready to be written under the output root
#[derive(Debug, Clone, PartialEq)]
pub struct OutputDocument {
    /// Source-relative path, `None` for generated pages
    pub source_path: Option<PathBuf>,
    /// Output-relative path
    pub rel_path: PathBuf,
    pub document: ParsedDocument,
}

impl OutputDocument {
    pub fn render(&self) -> Result<String, FrontmatterError> {
        self.document.render()
    }

    /// Human readable origin for diagnostics
    pub fn origin(&self) -> String {
        match &self.source_path {
            Some(path) => path.display().to_string(),
            None => "<generated>".to_string(),
        }
    }

    /// Bodyless page asking the generator for its search layout
    pub fn search_page(config: &SearchPageConfig) -> Self {
        let mut fields = Mapping::new();
        fields.insert(Value::from("title"), Value::from(config.title.as_str()));
        fields.insert(Value::from("layout"), Value::from(config.layout.as_str()));

        Self {
            source_path: None,
            rel_path: clean_relative(&config.path),
            document: ParsedDocument {
                front_matter: Some(FrontMatter::from_fields(fields)),
                body: String::new(),
            },
        }
    }
}

/// Turns selected source documents into output documents
#[derive(Debug, Clone)]
pub struct Normalizer {
    home_document: PathBuf,
    marker: String,
    strip_marker: bool,
    slugify_filenames: bool,
    links: LinkRewriter,
}

impl Normalizer {
    pub fn from_config(config: &Config) -> Self {
        Self {
            home_document: clean_relative(&config.home_document),
            marker: config.publish.marker.clone(),
            strip_marker: config.publish.strip_marker,
            slugify_filenames: config.slugify_filenames,
            links: LinkRewriter::new(
                config.links.rewrite_md_links,
                config.links.rewrite_wikilinks,
            ),
        }
    }

    pub fn normalize(&self, source: &SourceDocument) -> OutputDocument {
        let mut front_matter = source.front_matter.clone();
        if self.strip_marker {
            front_matter.remove_tag(&self.marker);
            if front_matter.flag(PUBLISH_FLAG).is_some() {
                front_matter.remove_key(PUBLISH_FLAG);
            }
        }

        let body = match front_matter.title() {
            Some(title) => strip_duplicate_title(&title, &source.body),
            None => Cow::Borrowed(source.body.as_str()),
        };
        let body = self.links.rewrite(&body);

        OutputDocument {
            source_path: Some(source.rel_path.clone()),
            rel_path: self.output_path(&source.rel_path),
            document: ParsedDocument {
                front_matter: Some(front_matter),
                body,
            },
        }
    }

    pub fn is_home(&self, rel_path: &Path) -> bool {
        clean_relative(rel_path) == self.home_document
    }

    /// Output-relative path for a source-relative path
    pub fn output_path(&self, rel_path: &Path) -> PathBuf {
        if self.is_home(rel_path) {
            return match rel_path.extension() {
                Some(ext) => PathBuf::from(HOME_STEM).with_extension(ext),
                None => PathBuf::from(HOME_STEM),
            };
        }

        let rel_path = clean_relative(rel_path);
        if !self.slugify_filenames {
            return rel_path;
        }

        let stem = rel_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        if stem == HOME_STEM {
            return rel_path;
        }
        let slug = slugify(&stem);
        if slug.is_empty() {
            return rel_path;
        }

        let file_name = match rel_path.extension() {
            Some(ext) => format!("{}.{}", slug, ext.to_string_lossy()),
            None => slug,
        };
        rel_path.with_file_name(file_name)
    }
}

/// Drop `./` segments so configured and discovered paths compare equal.
pub(crate) fn clean_relative(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

fn normalize_heading_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Text of an ATX heading line, or `None` for any other line.
fn heading_text(line: &str) -> Option<&str> {
    let caps = heading_regex().captures(line.trim_end_matches(['\r', '\n']))?;
    Some(caps.get(1).map_or("", |m| m.as_str()))
}

/// Remove the body's leading heading when it repeats `title`.
///
/// Comparison ignores case and whitespace differences. Blank lines directly
/// after the removed heading go with it.
pub fn strip_duplicate_title<'a>(title: &str, body: &'a str) -> Cow<'a, str> {
    let wanted = normalize_heading_text(title);
    if wanted.is_empty() {
        return Cow::Borrowed(body);
    }

    let mut offset = 0;
    let mut lines = body.split_inclusive('\n');

    while let Some(line) = lines.next() {
        if line.trim().is_empty() {
            offset += line.len();
            continue;
        }

        let matches = heading_text(line).is_some_and(|text| normalize_heading_text(text) == wanted);
        if !matches {
            return Cow::Borrowed(body);
        }

        let mut rest = offset + line.len();
        for following in lines.by_ref() {
            if !following.trim().is_empty() {
                break;
            }
            rest += following.len();
        }

        let mut stripped = String::with_capacity(body.len());
        stripped.push_str(&body[..offset]);
        stripped.push_str(&body[rest..]);
        return Cow::Owned(stripped);
    }

    Cow::Borrowed(body)
}
