//! Body link rewriting for the site generator's clean URLs.
//!
//! `[text](notes/page.md)` becomes `[text](/notes/page/)` and
//! `[[Target|Label]]` becomes `[Label](/target/)`. Fenced code blocks are
//! copied through untouched.

use crate::slug::slugify;
use regex::{Captures, Regex};
use std::sync::OnceLock;

static MD_LINK_REGEX: OnceLock<Regex> = OnceLock::new();
static WIKILINK_REGEX: OnceLock<Regex> = OnceLock::new();

fn md_link_regex() -> &'static Regex {
    MD_LINK_REGEX.get_or_init(|| Regex::new(r"\[([^\]]+)\]\(([^)\s]+\.md)\)").unwrap())
}

fn wikilink_regex() -> &'static Regex {
    WIKILINK_REGEX.get_or_init(|| Regex::new(r"\[\[([^\]|]+)(?:\|([^\]]+))?\]\]").unwrap())
}

/// Which rewrites to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkRewriter {
    pub md_links: bool,
    pub wikilinks: bool,
}

impl LinkRewriter {
    pub fn new(md_links: bool, wikilinks: bool) -> Self {
        Self {
            md_links,
            wikilinks,
        }
    }

    pub fn is_noop(&self) -> bool {
        !self.md_links && !self.wikilinks
    }

    pub fn rewrite(&self, body: &str) -> String {
        if self.is_noop() {
            return body.to_string();
        }

        let mut out = String::with_capacity(body.len());
        let mut fence: Option<&str> = None;

        for line in body.split_inclusive('\n') {
            let trimmed = line.trim_start();
            if let Some(open) = fence {
                if trimmed.starts_with(open) {
                    fence = None;
                }
                out.push_str(line);
                continue;
            }
            if trimmed.starts_with("```") {
                fence = Some("```");
                out.push_str(line);
                continue;
            }
            if trimmed.starts_with("~~~") {
                fence = Some("~~~");
                out.push_str(line);
                continue;
            }

            let mut rewritten = line.to_string();
            if self.md_links {
                rewritten = rewrite_md_links(&rewritten);
            }
            if self.wikilinks {
                rewritten = rewrite_wikilinks(&rewritten);
            }
            out.push_str(&rewritten);
        }

        out
    }
}

/// Convert links to `.md` files into clean URLs.
pub fn rewrite_md_links(text: &str) -> String {
    md_link_regex()
        .replace_all(text, |caps: &Captures| {
            let label = &caps[1];
            let target = &caps[2];
            if target.contains("://") {
                return caps[0].to_string();
            }

            let mut clean = target.trim_end_matches(".md").to_string();
            if !clean.starts_with('/') {
                clean.insert(0, '/');
            }
            if !clean.ends_with('/') {
                clean.push('/');
            }
            format!("[{}]({})", label, clean)
        })
        .into_owned()
}

/// Convert `[[Page]]` and `[[Page|Label]]` into markdown links.
pub fn rewrite_wikilinks(text: &str) -> String {
    wikilink_regex()
        .replace_all(text, |caps: &Captures| {
            let target = caps[1].trim();
            let label = caps.get(2).map(|m| m.as_str().trim()).unwrap_or(target);
            format!("[{}](/{}/)", label, slugify(target))
        })
        .into_owned()
}
