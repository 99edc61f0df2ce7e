use std::fs;

use crate::cli::{lines, supatable};
use predicates::prelude::PredicateBooleanExt as _;
use predicates::str::contains;

const CONFIG: &str = "\
profiles:
  default:
    project: abcdefgh
    api_key: anon-key
    table: users
  local:
    project: http://localhost:54321/rest/v1
    api_key: service-key
";

fn home_with_config() -> anyhow::Result<tempfile::TempDir> {
    let home = tempfile::tempdir()?;
    fs::create_dir_all(home.path().join(".config"))?;
    fs::write(home.path().join(".config/supatable.yaml"), CONFIG)?;
    Ok(home)
}

#[test]
fn config_get() -> anyhow::Result<()> {
    let home = home_with_config()?;

    supatable(home.path())
        .args(["config", "get"])
        .assert()
        .success()
        .stdout(contains("Profile \"default\""))
        .stdout(contains("https://abcdefgh.supabase.co/rest/v1/"))
        .stdout(contains("anon-key").not());

    Ok(())
}

#[test]
fn config_get_flags_override_file() -> anyhow::Result<()> {
    let home = home_with_config()?;

    supatable(home.path())
        .args(["-P", "local", "-t", "events", "config", "get"])
        .assert()
        .success()
        .stdout(contains("http://localhost:54321/rest/v1/"))
        .stdout(contains("events"));

    Ok(())
}

#[test]
fn config_get_all_json() -> anyhow::Result<()> {
    let home = home_with_config()?;

    let output = supatable(home.path())
        .args(["-O", "json", "config", "get", "--all"])
        .output()?;
    assert!(output.status.success());

    let profiles: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    let names: Vec<_> = profiles
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|p| p["name"].as_str())
        .collect();
    assert_eq!(names, ["default", "local"]);
    assert!(!String::from_utf8_lossy(&output.stdout).contains("service-key"));

    Ok(())
}

#[test]
fn config_get_all_tty() -> anyhow::Result<()> {
    let home = home_with_config()?;

    supatable(home.path())
        .args(["config", "get", "--all"])
        .assert()
        .success()
        .stdout(lines(&["", "Profile \"local\""]));

    Ok(())
}

#[test]
fn missing_profile() -> anyhow::Result<()> {
    let home = home_with_config()?;

    supatable(home.path())
        .args(["-P", "staging", "config", "get"])
        .assert()
        .failure()
        .stderr(contains("Profile 'staging' not found"));

    Ok(())
}
