//! Public URLs of exported pages, as the site generator serves them.

use crate::normalize::HOME_STEM;
use crate::slug::slugify;
use std::path::{Component, Path};

fn base(base_url: &str) -> &str {
    base_url.trim_end_matches('/')
}

fn to_url_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Clean URL for an output-relative document path.
///
/// ```
/// use notepress_core::urls::page_url;
/// use std::path::Path;
///
/// assert_eq!(page_url(Path::new("_index.md"), "https://example.com/"), "https://example.com/");
/// assert_eq!(page_url(Path::new("notes/b.md"), "https://example.com"), "https://example.com/notes/b/");
/// ```
pub fn page_url(out_rel: &Path, base_url: &str) -> String {
    let is_section = out_rel.file_stem().is_some_and(|stem| stem == HOME_STEM);
    let target = if is_section {
        out_rel.parent().map(to_url_path).unwrap_or_default()
    } else {
        to_url_path(&out_rel.with_extension(""))
    };

    if target.is_empty() {
        format!("{}/", base(base_url))
    } else {
        format!("{}/{}/", base(base_url), target)
    }
}

/// Taxonomy listing URL for one tag
pub fn tag_url(tag: &str, base_url: &str) -> String {
    format!("{}/tags/{}/", base(base_url), slugify(tag))
}

/// Taxonomy index URL
pub fn tags_index_url(base_url: &str) -> String {
    format!("{}/tags/", base(base_url))
}

/// Lowercased host of an absolute http(s) URL.
pub fn url_host(url: &str) -> Option<String> {
    let (scheme, rest) = url.split_once("://")?;
    if scheme.is_empty() {
        return None;
    }
    let authority = rest.split(['/', '?', '#']).next()?;
    let host_port = authority.rsplit('@').next()?;
    let host = if let Some(stripped) = host_port.strip_prefix('[') {
        // IPv6 literal
        stripped.split(']').next()?
    } else {
        host_port.split(':').next()?
    };
    if host.is_empty() {
        None
    } else {
        Some(host.to_ascii_lowercase())
    }
}
