//! IndexNow commands: changed URLs from a content diff, and sitemap-based
//! submission.

use super::export::load_config;
use crate::PathArgs;
use anyhow::{anyhow, bail, Context, Result};
use flate2::read::GzDecoder;
use notepress_core::indexnow::{parse_name_status, UrlCollector};
use notepress_core::sitemap::{
    load_snapshot, parse_sitemap, snapshot_for_host, urls_to_submit, write_snapshot, Sitemap,
    SitemapEntry, SubmitPayload,
};
use std::collections::HashSet;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

const USER_AGENT: &str = concat!("notepress/", env!("CARGO_PKG_VERSION"));

pub struct UrlsOptions {
    pub content_dir: PathBuf,
    pub notes_dir: String,
    pub old_sha: String,
    pub new_sha: String,
    pub host: String,
    pub base_url: Option<String>,
    pub include_taxonomies: bool,
}

pub struct SubmitOptions {
    pub sitemap: String,
    pub host: String,
    pub key: String,
    pub key_location: Option<String>,
    pub endpoint: Option<String>,
    pub snapshot_in: Option<PathBuf>,
    pub snapshot_out: Option<PathBuf>,
    pub include_deletions: bool,
    pub batch_size: Option<usize>,
    pub dry_run: bool,
}

/// Print the page URLs touched between two content revisions.
pub fn indexnow_urls(config_path: &Path, opts: UrlsOptions) -> Result<()> {
    let config = load_config(config_path, &PathArgs::default())?;
    let old_sha = opts.old_sha.trim();
    let new_sha = opts.new_sha.trim();

    if old_sha.is_empty() || new_sha.is_empty() {
        eprintln!("Missing old/new content SHA; no URLs emitted.");
        return Ok(());
    }
    if old_sha == new_sha {
        eprintln!("Content SHA unchanged; no URLs emitted.");
        return Ok(());
    }

    let notes_dir = opts.notes_dir.trim_matches('/');
    let base_url = match (&opts.base_url, config.absolute_base_url()) {
        (Some(url), _) => url.clone(),
        (None, Some(url)) => url.to_string(),
        (None, None) => format!("https://{}", opts.host),
    };

    let diff = run_git(
        &opts.content_dir,
        &["diff", "--name-status", old_sha, new_sha, "--", notes_dir],
    )?;
    let changes = parse_name_status(&diff);

    let mut collector = UrlCollector::new(&config, &base_url, notes_dir)
        .include_taxonomies(opts.include_taxonomies);
    for change in &changes {
        if let Some(old_path) = &change.old {
            if let Some(text) = git_show(&opts.content_dir, old_sha, old_path) {
                collector.add_version(old_path, &text);
            }
        }
        if let Some(new_path) = &change.new {
            if let Some(text) = git_show(&opts.content_dir, new_sha, new_path) {
                collector.add_version(new_path, &text);
            }
        }
    }

    let urls = collector.finish(&opts.host);
    for url in &urls {
        println!("{}", url);
    }

    eprintln!("Changed note files: {}", changes.len());
    eprintln!("URLs emitted: {}", urls.len());
    Ok(())
}

fn run_git(repo: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .arg("-C")
        .arg(repo)
        .args(args)
        .output()
        .context("Failed to run git")?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if stderr.is_empty() {
            return Err(anyhow!("git {} failed", args.join(" ")));
        }
        return Err(anyhow!(stderr));
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// File content at a revision; `None` when it does not exist there.
fn git_show(repo: &Path, sha: &str, rel_path: &str) -> Option<String> {
    let object = format!("{}:{}", sha, rel_path);
    let output = Command::new("git")
        .arg("-C")
        .arg(repo)
        .args(["show", &object])
        .output()
        .ok()?;
    if !output.status.success() {
        tracing::debug!("git show {} failed", object);
        return None;
    }
    String::from_utf8(output.stdout).ok()
}

/// Diff the sitemap against the previous snapshot and submit changes.
pub async fn indexnow_submit(config_path: &Path, opts: SubmitOptions) -> Result<()> {
    let config = load_config(config_path, &PathArgs::default())?;
    let endpoint = opts
        .endpoint
        .clone()
        .unwrap_or_else(|| config.indexnow.endpoint.clone());
    let batch_size = opts.batch_size.unwrap_or(config.indexnow.batch_size);
    if batch_size == 0 {
        bail!("--batch-size must be greater than zero");
    }
    let key_location = opts
        .key_location
        .clone()
        .unwrap_or_else(|| format!("https://{}/{}.txt", opts.host, opts.key));

    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(60))
        .build()
        .context("Failed to build HTTP client")?;

    let entries = load_sitemap_entries(&client, &opts.sitemap).await?;
    let current = snapshot_for_host(&entries, &opts.host);

    let previous = match &opts.snapshot_in {
        Some(path) if path.exists() => Some(
            load_snapshot(path).with_context(|| format!("Failed to load snapshot {:?}", path))?,
        ),
        _ => None,
    };

    let to_submit = urls_to_submit(&current, previous.as_ref(), opts.include_deletions);

    println!("Sitemap: {}", opts.sitemap);
    println!("Host: {}", opts.host);
    println!("Entries (matching host): {}", current.len());
    println!("URLs to submit: {}", to_submit.len());

    let mut failed_batches = 0;
    for batch in to_submit.chunks(batch_size) {
        let payload = SubmitPayload {
            host: &opts.host,
            key: &opts.key,
            key_location: &key_location,
            url_list: batch,
        };

        if opts.dry_run {
            println!("DRY RUN: would submit {} URLs to {}", batch.len(), endpoint);
            continue;
        }

        let response = client
            .post(&endpoint)
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", endpoint))?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let line = format!("HTTP {} ({} urls) {}", status.as_u16(), batch.len(), body.trim());

        if status.is_success() {
            println!("{}", line.trim());
        } else {
            eprintln!("{}", line.trim());
            failed_batches += 1;
        }
    }

    if failed_batches > 0 {
        bail!("{} IndexNow batch(es) were rejected", failed_batches);
    }

    if let Some(path) = &opts.snapshot_out {
        if !opts.dry_run {
            write_snapshot(path, &current)
                .with_context(|| format!("Failed to write snapshot {:?}", path))?;
        }
    }

    Ok(())
}

/// Load every `<url>` entry, following sitemap indexes.
async fn load_sitemap_entries(
    client: &reqwest::Client,
    sitemap: &str,
) -> Result<Vec<SitemapEntry>> {
    let mut entries = Vec::new();
    let mut pending = vec![sitemap.to_string()];
    let mut seen = HashSet::new();

    while let Some(source) = pending.pop() {
        if !seen.insert(source.clone()) {
            tracing::warn!("Sitemap {} referenced more than once", source);
            continue;
        }

        let xml = read_sitemap_source(client, &source).await?;
        match parse_sitemap(&xml).with_context(|| format!("Failed to parse sitemap {}", source))? {
            Sitemap::UrlSet(mut found) => entries.append(&mut found),
            Sitemap::Index(nested) => pending.extend(nested.into_iter().rev()),
        }
    }

    Ok(entries)
}

async fn read_sitemap_source(client: &reqwest::Client, source: &str) -> Result<Vec<u8>> {
    let (raw, gzipped) = if source.starts_with("http://") || source.starts_with("https://") {
        let response = client
            .get(source)
            .header(reqwest::header::ACCEPT, "application/xml,text/xml,*/*")
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", source))?
            .error_for_status()
            .with_context(|| format!("Failed to fetch {}", source))?;
        let gzip_encoding = response
            .headers()
            .get(reqwest::header::CONTENT_ENCODING)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.eq_ignore_ascii_case("gzip"));
        let bytes = response.bytes().await?.to_vec();
        (bytes, gzip_encoding || source.ends_with(".gz"))
    } else {
        let bytes = fs::read(source).with_context(|| format!("Failed to read {}", source))?;
        (bytes, source.ends_with(".gz"))
    };

    if !gzipped {
        return Ok(raw);
    }

    let mut decoded = Vec::new();
    GzDecoder::new(raw.as_slice())
        .read_to_end(&mut decoded)
        .with_context(|| format!("Failed to decompress {}", source))?;
    Ok(decoded)
}
