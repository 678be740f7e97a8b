//! Dry-run listing of an export.

use super::export::load_config;
use crate::PathArgs;
use anyhow::{bail, Context, Result};
use notepress_core::Exporter;
use std::path::Path;

pub fn check_site(config_path: &Path, paths: &PathArgs, json: bool, strict: bool) -> Result<()> {
    let config = load_config(config_path, paths)?;
    let plan = Exporter::new(config)
        .plan()
        .context("Export would fail")?;

    if json {
        let documents: Vec<_> = plan
            .documents
            .iter()
            .chain(std::iter::once(&plan.search_page))
            .map(|doc| {
                serde_json::json!({
                    "source": doc.source_path.as_ref().map(|p| p.to_string_lossy()),
                    "output": doc.rel_path.to_string_lossy(),
                })
            })
            .collect();
        let skipped: Vec<_> = plan
            .skipped
            .iter()
            .map(|s| {
                serde_json::json!({
                    "source": s.rel_path.to_string_lossy(),
                    "reason": s.reason,
                })
            })
            .collect();

        let payload = serde_json::json!({
            "scanned": plan.scanned,
            "documents": documents,
            "skipped": skipped,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!(
            "{} of {} notes would be published",
            plan.documents.len(),
            plan.scanned
        );
        for doc in &plan.documents {
            println!("  {} -> {}", doc.origin(), doc.rel_path.display());
        }
        println!(
            "  {} -> {}",
            plan.search_page.origin(),
            plan.search_page.rel_path.display()
        );
        for skipped in &plan.skipped {
            println!("  skipped {}: {}", skipped.rel_path.display(), skipped.reason);
        }
    }

    if strict && !plan.skipped.is_empty() {
        bail!("{} document(s) have malformed front matter", plan.skipped.len());
    }
    Ok(())
}
