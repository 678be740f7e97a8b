//! Sitemap parsing and snapshot diffing for IndexNow submissions.

use crate::urls::url_host;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SitemapError {
    #[error("Invalid XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Sitemap is not valid UTF-8")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("Unsupported sitemap root element <{0}>")]
    UnsupportedRoot(String),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("Snapshot must be a JSON object mapping URLs to lastmod values")]
    SnapshotShape,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapEntry {
    pub url: String,
    pub lastmod: Option<String>,
}

/// A parsed sitemap file: either a URL set or an index of nested sitemaps
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sitemap {
    UrlSet(Vec<SitemapEntry>),
    Index(Vec<String>),
}

/// URL → lastmod, as stored between runs
pub type Snapshot = BTreeMap<String, Option<String>>;

fn resolve_entity(name: &[u8]) -> &'static str {
    match name {
        b"amp" => "&",
        b"lt" => "<",
        b"gt" => ">",
        b"quot" => "\"",
        b"apos" => "'",
        _ => "",
    }
}

/// Parse a `<urlset>` or `<sitemapindex>` document.
pub fn parse_sitemap(xml: &[u8]) -> Result<Sitemap, SitemapError> {
    let text = String::from_utf8(xml.to_vec())?;
    let mut reader = Reader::from_str(&text);
    reader.config_mut().trim_text(true);

    let mut root: Option<String> = None;
    let mut entries = Vec::new();
    let mut nested = Vec::new();

    let mut loc: Option<String> = None;
    let mut lastmod: Option<String> = None;
    let mut current: Option<&'static str> = None;
    let mut buf_text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.local_name();
                let name = name.as_ref();
                if root.is_none() {
                    let kind = String::from_utf8_lossy(name).into_owned();
                    if kind != "urlset" && kind != "sitemapindex" {
                        return Err(SitemapError::UnsupportedRoot(kind));
                    }
                    root = Some(kind);
                    continue;
                }
                match name {
                    b"url" | b"sitemap" => {
                        loc = None;
                        lastmod = None;
                    }
                    b"loc" => current = Some("loc"),
                    b"lastmod" => current = Some("lastmod"),
                    _ => {}
                }
                buf_text.clear();
            }
            Event::Empty(e) if root.is_none() => {
                let kind = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if kind != "urlset" && kind != "sitemapindex" {
                    return Err(SitemapError::UnsupportedRoot(kind));
                }
                root = Some(kind);
            }
            Event::Text(t) if current.is_some() => {
                buf_text.push_str(&String::from_utf8_lossy(t.as_ref()));
            }
            Event::GeneralRef(r) if current.is_some() => match r.resolve_char_ref() {
                Ok(Some(ch)) => buf_text.push(ch),
                _ => buf_text.push_str(resolve_entity(r.as_ref())),
            },
            Event::End(e) => {
                let name = e.local_name();
                match name.as_ref() {
                    b"loc" => {
                        loc = Some(buf_text.trim().to_string()).filter(|s| !s.is_empty());
                        current = None;
                    }
                    b"lastmod" => {
                        lastmod = Some(buf_text.trim().to_string()).filter(|s| !s.is_empty());
                        current = None;
                    }
                    b"url" => {
                        if let Some(url) = loc.take() {
                            entries.push(SitemapEntry {
                                url,
                                lastmod: lastmod.take(),
                            });
                        }
                    }
                    b"sitemap" => {
                        if let Some(url) = loc.take() {
                            nested.push(url);
                        }
                    }
                    _ => {}
                }
                buf_text.clear();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    match root.as_deref() {
        Some("sitemapindex") => Ok(Sitemap::Index(nested)),
        Some(_) => Ok(Sitemap::UrlSet(entries)),
        None => Err(SitemapError::UnsupportedRoot(String::new())),
    }
}

/// Keep absolute URLs on `host`, keyed by URL.
pub fn snapshot_for_host(entries: &[SitemapEntry], host: &str) -> Snapshot {
    let host = host.to_ascii_lowercase();
    entries
        .iter()
        .filter(|e| url_host(&e.url).as_deref() == Some(host.as_str()))
        .map(|e| (e.url.clone(), e.lastmod.clone()))
        .collect()
}

/// Load a previous snapshot; non-string values are ignored.
pub fn load_snapshot(path: &Path) -> Result<Snapshot, SitemapError> {
    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(path)?)?;
    let serde_json::Value::Object(map) = raw else {
        return Err(SitemapError::SnapshotShape);
    };

    let mut snapshot = Snapshot::new();
    for (url, lastmod) in map {
        match lastmod {
            serde_json::Value::String(s) => {
                snapshot.insert(url, Some(s));
            }
            serde_json::Value::Null => {
                snapshot.insert(url, None);
            }
            _ => {}
        }
    }
    Ok(snapshot)
}

pub fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<(), SitemapError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut json = serde_json::to_string_pretty(snapshot)?;
    json.push('\n');
    fs::write(path, json)?;
    Ok(())
}

/// URLs whose lastmod changed since `previous` (all of them without one),
/// plus removed URLs when `include_deletions` is set. Sorted, unique.
pub fn urls_to_submit(
    current: &Snapshot,
    previous: Option<&Snapshot>,
    include_deletions: bool,
) -> Vec<String> {
    let Some(previous) = previous else {
        return current.keys().cloned().collect();
    };

    let mut urls: Vec<String> = current
        .iter()
        .filter(|(url, lastmod)| previous.get(*url) != Some(*lastmod))
        .map(|(url, _)| url.clone())
        .collect();

    if include_deletions {
        urls.extend(
            previous
                .keys()
                .filter(|url| !current.contains_key(*url))
                .cloned(),
        );
    }

    urls.sort();
    urls.dedup();
    urls
}

/// IndexNow request body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitPayload<'a> {
    pub host: &'a str,
    pub key: &'a str,
    pub key_location: &'a str,
    pub url_list: &'a [String],
}
