//! Slug generation for output file names, wikilink targets and tag URLs.

use regex::Regex;
use std::sync::OnceLock;

static HYPHEN_RUNS: OnceLock<Regex> = OnceLock::new();

fn hyphen_runs() -> &'static Regex {
    HYPHEN_RUNS.get_or_init(|| Regex::new(r"-+").unwrap())
}

/// Convert a string to the URL slug the site generator derives for it
///
/// Rules:
/// - Lowercase
/// - Replace spaces and underscores with hyphens
/// - Drop everything that is not an ASCII letter, digit or hyphen
/// - Collapse multiple hyphens
/// - Trim leading/trailing hyphens
///
/// # Examples
///
/// ```
/// use notepress_core::slugify;
///
/// assert_eq!(slugify("Four Modes of AI Assistance"), "four-modes-of-ai-assistance");
/// assert_eq!(slugify("Rust & Safety"), "rust-safety");
/// assert_eq!(slugify("C++ Programming"), "c-programming");
/// ```
pub fn slugify(input: &str) -> String {
    let cleaned: String = input
        .to_lowercase()
        .chars()
        .map(|c| match c {
            ' ' | '_' => '-',
            _ => c,
        })
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();

    hyphen_runs()
        .replace_all(&cleaned, "-")
        .trim_matches('-')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("Rust Programming"), "rust-programming");
    }

    #[test]
    fn test_special_characters() {
        assert_eq!(slugify("Rust & Safety"), "rust-safety");
        assert_eq!(slugify("Node.js Tips"), "nodejs-tips");
        assert_eq!(slugify("What's new?"), "whats-new");
    }

    #[test]
    fn test_non_ascii_is_dropped() {
        assert_eq!(slugify("Café Notes"), "caf-notes");
    }

    #[test]
    fn test_multiple_spaces_and_underscores() {
        assert_eq!(slugify("Hello    World"), "hello-world");
        assert_eq!(slugify("rust_lang__basics"), "rust-lang-basics");
    }

    #[test]
    fn test_leading_trailing_hyphens() {
        assert_eq!(slugify("  Hello World  "), "hello-world");
        assert_eq!(slugify("-Leading Hyphen"), "leading-hyphen");
        assert_eq!(slugify("Trailing Hyphen-"), "trailing-hyphen");
    }

    #[test]
    fn test_empty_and_special_only() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
        assert_eq!(slugify("   "), "");
    }
}
