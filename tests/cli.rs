//! The `civic` binary driven end to end.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn civic_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("civic");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let kb_dir = root.join("kb");
    fs::create_dir_all(&kb_dir).unwrap();
    fs::write(
        kb_dir.join("articles.toml"),
        r#"
[[articles]]
id = "kb-pothole"
title = "Pothole Repair Process"
body = "Report potholes through the 311 app. Crews respond within 72 hours."
category = "Road Damage"
tags = ["pothole", "roads"]
source_url = "https://city.example/potholes"
priority_score = 80

[[articles]]
id = "kb-resurfacing"
title = "Road Resurfacing Schedule"
body = "Streets are resurfaced on a five year cycle."
category = "Road Damage"
priority_score = 40

[[articles]]
id = "kb-internal"
title = "Pothole Crew Rotation"
body = "Internal pothole staffing notes."
category = "Operations"
is_public = false
priority_score = 100
"#,
    )
    .unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/civic.sqlite"

[retrieval]
limit = 5

[completion]
provider = "disabled"
"#,
        root.display()
    );

    let config_path = config_dir.join("civic.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_civic(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = civic_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run civic binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn init_and_import(config_path: &Path) {
    let (_, stderr, success) = run_civic(config_path, &["init"]);
    assert!(success, "init failed: {}", stderr);

    let kb = config_path
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("kb")
        .join("articles.toml");
    let (stdout, stderr, success) = run_civic(config_path, &["import", kb.to_str().unwrap()]);
    assert!(success, "import failed: {}", stderr);
    assert!(stdout.contains("Imported 3 article(s)"), "got: {}", stdout);
}

#[test]
fn test_init_creates_database() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_civic(&config_path, &["init"]);
    assert!(success, "init failed: {}", stderr);
    assert!(stdout.contains("initialized"));
    assert!(tmp.path().join("data").join("civic.sqlite").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();
    assert!(run_civic(&config_path, &["init"]).2);
    let (_, stderr, success) = run_civic(&config_path, &["init"]);
    assert!(success, "second init failed: {}", stderr);
}

#[test]
fn test_import_is_idempotent() {
    let (_tmp, config_path) = setup_test_env();
    init_and_import(&config_path);
    init_and_import(&config_path);

    let (stdout, _, success) = run_civic(&config_path, &["articles"]);
    assert!(success);
    assert_eq!(stdout.matches("kb-pothole").count(), 1);
}

#[test]
fn test_articles_lists_public_only() {
    let (_tmp, config_path) = setup_test_env();
    init_and_import(&config_path);

    let (stdout, _, success) = run_civic(&config_path, &["articles"]);
    assert!(success);
    assert!(stdout.contains("Pothole Repair Process"));
    assert!(stdout.contains("Road Resurfacing Schedule"));
    assert!(!stdout.contains("Crew Rotation"));

    let (stdout, _, success) =
        run_civic(&config_path, &["articles", "--category", "Operations"]);
    assert!(success);
    assert!(stdout.contains("No articles."));
}

#[test]
fn test_search_ranks_public_matches() {
    let (_tmp, config_path) = setup_test_env();
    init_and_import(&config_path);

    let (stdout, stderr, success) = run_civic(&config_path, &["search", "pothole"]);
    assert!(success, "search failed: {}", stderr);
    assert!(stdout.contains("1. [80] Pothole Repair Process"));
    assert!(!stdout.contains("Crew Rotation"));

    let (stdout, _, success) = run_civic(&config_path, &["search", "   "]);
    assert!(success);
    assert!(stdout.contains("No results."));
}

#[test]
fn test_get_counts_views() {
    let (_tmp, config_path) = setup_test_env();
    init_and_import(&config_path);

    let (stdout, _, success) = run_civic(&config_path, &["get", "kb-pothole"]);
    assert!(success);
    assert!(stdout.contains("views:     1"));
    let (stdout, _, _) = run_civic(&config_path, &["get", "kb-pothole"]);
    assert!(stdout.contains("views:     2"));

    let (_, stderr, success) = run_civic(&config_path, &["get", "kb-internal"]);
    assert!(!success);
    assert!(stderr.contains("article not found"));
}

#[test]
fn test_ask_fails_when_completion_disabled() {
    let (_tmp, config_path) = setup_test_env();
    init_and_import(&config_path);

    let (_, stderr, success) = run_civic(&config_path, &["ask", "how do I report a pothole"]);
    assert!(!success);
    assert!(stderr.contains("An error occurred processing your request"));
}

#[test]
fn test_ask_rejects_blank_query() {
    let (_tmp, config_path) = setup_test_env();
    init_and_import(&config_path);

    let (_, stderr, success) = run_civic(&config_path, &["ask", "  "]);
    assert!(!success);
    assert!(stderr.contains("Query is required"));
}

#[test]
fn test_stats_and_forget() {
    let (_tmp, config_path) = setup_test_env();
    init_and_import(&config_path);

    let (stdout, stderr, success) = run_civic(&config_path, &["stats"]);
    assert!(success, "stats failed: {}", stderr);
    assert!(stdout.contains("Articles:      3 (2 public)"));
    assert!(stdout.contains("Interactions:  0"));

    let (stdout, _, success) = run_civic(&config_path, &["forget", "nobody"]);
    assert!(success);
    assert!(stdout.contains("Deleted 0 interaction record(s)"));
}

#[test]
fn test_missing_config_fails() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, success) = run_civic(&tmp.path().join("absent.toml"), &["init"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}
