//! End-to-end export tests over a temporary notes tree.

use notepress_core::{Config, ExportError, Exporter};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;
use walkdir::WalkDir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn config_for(root: &Path) -> Config {
    let mut config = Config::default();
    config.set_source_dir(root.join("content"));
    config.set_output_dir(root.join("site-content"));
    config.home_document = PathBuf::from("home.md");
    config
}

/// Relative path → content for every file under `root`
fn snapshot(root: &Path) -> Vec<(String, String)> {
    let mut files: Vec<_> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(root).unwrap();
            (
                rel.to_string_lossy().replace('\\', "/"),
                fs::read_to_string(e.path()).unwrap(),
            )
        })
        .collect();
    files.sort();
    files
}

fn sample_tree(root: &Path) {
    let src = root.join("content");
    write(&src, "notes/a.md", "---\ntitle: A\ntags: [draft]\n---\n# A\n");
    write(
        &src,
        "notes/b.md",
        "---\ntitle: Example\ntags: [note, publish]\n---\n\n# Example\n\nSee [[Home Page|home]].\n",
    );
    write(
        &src,
        "home.md",
        "---\ntitle: Welcome\ntags: publish\n---\n# Hello there\n",
    );
}

#[test]
fn exports_selected_documents() {
    let dir = tempdir().unwrap();
    sample_tree(dir.path());

    let report = Exporter::new(config_for(dir.path())).run().unwrap();
    assert_eq!(report.scanned, 3);
    assert_eq!(report.published, 2);
    assert!(report.skipped.is_empty());

    let out = dir.path().join("site-content");
    let files = snapshot(&out);
    let names: Vec<_> = files.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["_index.md", "notes/b.md", "search.md"]);

    assert_eq!(
        fs::read_to_string(out.join("notes/b.md")).unwrap(),
        "---\ntitle: Example\ntags:\n- note\n---\n\nSee [home](/home-page/).\n"
    );
    assert_eq!(
        fs::read_to_string(out.join("_index.md")).unwrap(),
        "---\ntitle: Welcome\ntags: []\n---\n# Hello there\n"
    );
    assert_eq!(
        fs::read_to_string(out.join("search.md")).unwrap(),
        "---\ntitle: Search\nlayout: search\n---\n"
    );
    assert!(!out.join("home.md").exists());
    assert!(!out.join("notes/a.md").exists());
}

#[test]
fn export_is_idempotent() {
    let dir = tempdir().unwrap();
    sample_tree(dir.path());
    let exporter = Exporter::new(config_for(dir.path()));

    exporter.run().unwrap();
    let first = snapshot(&dir.path().join("site-content"));
    exporter.run().unwrap();
    let second = snapshot(&dir.path().join("site-content"));

    assert_eq!(first, second);
}

#[test]
fn source_tree_is_not_modified() {
    let dir = tempdir().unwrap();
    sample_tree(dir.path());
    let before = snapshot(&dir.path().join("content"));

    Exporter::new(config_for(dir.path())).run().unwrap();

    assert_eq!(snapshot(&dir.path().join("content")), before);
}

#[test]
fn search_page_written_with_no_published_notes() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("content"), "x.md", "---\ntags: [draft]\n---\n");

    let report = Exporter::new(config_for(dir.path())).run().unwrap();
    assert_eq!(report.published, 0);

    let files = snapshot(&dir.path().join("site-content"));
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].0, "search.md");
}

#[test]
fn search_page_written_for_empty_source() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("content")).unwrap();

    let report = Exporter::new(config_for(dir.path())).run().unwrap();
    assert_eq!(report.scanned, 0);
    assert!(report.search_page.ends_with("search.md"));
    assert!(report.search_page.exists());
}

#[test]
fn malformed_document_is_skipped() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("content");
    write(&src, "good.md", "---\ntags: [publish]\n---\nok\n");
    write(&src, "bad.md", "---\ntags: [publish\n---\nbroken\n");

    let report = Exporter::new(config_for(dir.path())).run().unwrap();
    assert_eq!(report.published, 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].rel_path, PathBuf::from("bad.md"));
    assert!(dir.path().join("site-content/good.md").exists());
    assert!(!dir.path().join("site-content/bad.md").exists());
}

#[test]
fn missing_source_fails_before_writing() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("site-content");
    write(&out, "stale.md", "old");

    let err = Exporter::new(config_for(dir.path())).run().unwrap_err();
    assert!(matches!(err, ExportError::SourceMissing(_)));
    assert!(out.join("stale.md").exists());
}

#[test]
fn clean_output_removes_stale_files() {
    let dir = tempdir().unwrap();
    sample_tree(dir.path());
    write(&dir.path().join("site-content"), "stale.md", "old");

    Exporter::new(config_for(dir.path())).run().unwrap();
    assert!(!dir.path().join("site-content/stale.md").exists());
}

#[test]
fn stale_files_survive_without_clean() {
    let dir = tempdir().unwrap();
    sample_tree(dir.path());
    write(&dir.path().join("site-content"), "stale.md", "old");

    let mut config = config_for(dir.path());
    config.clean_output = false;
    Exporter::new(config).run().unwrap();

    let out = dir.path().join("site-content");
    assert!(out.join("stale.md").exists());
    assert!(out.join("notes/b.md").exists());
}

#[test]
fn config_file_drives_export() {
    let dir = tempdir().unwrap();
    write(
        &dir.path().join("vault"),
        "Deep Dives/Four Modes.md",
        "---\ntitle: Four Modes\ntags:\n  - essay\n  - public\n---\n# Four Modes\nBody\n",
    );
    write(
        dir.path(),
        "notepress.yml",
        r#"
paths:
  source: vault
  output: public-content
publish:
  marker: public
  strip_marker: false
slugify_filenames: true
search_page:
  path: search/_index.md
  title: Find
"#,
    );

    let config = Config::from_file(dir.path().join("notepress.yml")).unwrap();
    Exporter::new(config).run().unwrap();

    let out = dir.path().join("public-content");
    assert_eq!(
        fs::read_to_string(out.join("Deep Dives/four-modes.md")).unwrap(),
        "---\ntitle: Four Modes\ntags:\n  - essay\n  - public\n---\nBody\n"
    );
    assert_eq!(
        fs::read_to_string(out.join("search/_index.md")).unwrap(),
        "---\ntitle: Find\nlayout: search\n---\n"
    );
}
