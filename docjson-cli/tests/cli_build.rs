use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const CONFIG: &str = r#"
attribution:
  enabled: false
sites:
  - source: docs
    structure: structure.json
    assets: assets/docs
"#;

fn write(root: &Path, rel: &str, contents: &str) -> std::io::Result<()> {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)
}

fn project(root: &Path) -> std::io::Result<()> {
    write(root, "docjson.yml", CONFIG)?;
    write(
        root,
        "structure.json",
        r#"[{ "text": "Setup", "url": "/docs/setup", "filePath": "/assets/docs/setup.json" }]"#,
    )?;
    write(root, "docs/README.md", "# Docs index\n")?;
    write(
        root,
        "docs/intro.md",
        "---\ntitle: Introduction\n---\n# Intro\n\nSee [setup](setup.md#install).\n",
    )?;
    write(root, "docs/setup.md", "# Setup\n\n## Install\n")
}

#[test]
fn build_writes_artifacts() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    project(dir.path())?;

    #[allow(deprecated)]
    Command::cargo_bin("docjson")?
        .current_dir(dir.path())
        .env_remove("GITHUB_TOKEN")
        .arg("build")
        .assert()
        .success();

    let assets = dir.path().join("assets/docs");
    assert!(!assets.join("README.json").exists());

    let intro: Value = serde_json::from_str(&fs::read_to_string(assets.join("intro.json"))?)?;
    assert_eq!(intro["title"], "Introduction");
    assert_eq!(intro["srcPath"], "docs/intro.md");
    assert_eq!(intro["headings"][0]["id"], "intro");
    assert!(intro["content"]
        .as_str()
        .unwrap_or_default()
        .contains("href=\"/docs/setup#install\""));

    let setup: Value = serde_json::from_str(&fs::read_to_string(assets.join("setup.json"))?)?;
    assert_eq!(setup["headings"][1]["id"], "install");

    Ok(())
}

#[test]
fn check_lists_planned_files() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    project(dir.path())?;

    #[allow(deprecated)]
    Command::cargo_bin("docjson")?
        .current_dir(dir.path())
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("docs/intro.md"))
        .stdout(predicate::str::contains("docs/setup.md"))
        .stdout(predicate::str::contains("README").not());

    assert!(!dir.path().join("assets").exists());
    Ok(())
}

#[test]
fn build_fails_on_bad_front_matter() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    project(dir.path())?;
    write(dir.path(), "docs/broken.md", "---\ntitle: [oops\n---\nBody\n")?;

    #[allow(deprecated)]
    Command::cargo_bin("docjson")?
        .current_dir(dir.path())
        .args(["build", "--failure-policy", "collect"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("broken.md"));

    // Collect still converts the healthy files
    assert!(dir.path().join("assets/docs/intro.json").exists());
    Ok(())
}

#[test]
fn build_fails_without_config() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;

    #[allow(deprecated)]
    Command::cargo_bin("docjson")?
        .current_dir(dir.path())
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
    Ok(())
}

#[test]
fn build_rejects_unknown_failure_policy() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    project(dir.path())?;

    #[allow(deprecated)]
    Command::cargo_bin("docjson")?
        .current_dir(dir.path())
        .args(["build", "--failure-policy", "sometimes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value 'sometimes'"))
        .stderr(predicate::str::contains("fail-fast"))
        .stderr(predicate::str::contains("collect"));

    assert!(!dir.path().join("assets").exists());
    Ok(())
}

#[test]
fn build_refuses_to_clear_sources() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    project(dir.path())?;
    write(
        dir.path(),
        "docjson.yml",
        "attribution:\n  enabled: false\nsites:\n  - source: docs\n    structure: structure.json\n    assets: .\n",
    )?;

    #[allow(deprecated)]
    Command::cargo_bin("docjson")?
        .current_dir(dir.path())
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsafe asset directory"));

    assert!(dir.path().join("docs/intro.md").exists());
    Ok(())
}
