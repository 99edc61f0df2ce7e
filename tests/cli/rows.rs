use httpmock::prelude::*;
use predicates::prelude::PredicateBooleanExt as _;
use predicates::str::contains;
use serde_json::json;

use crate::cli::{lines, supatable, supatable_at};

#[test]
fn read_table() -> anyhow::Result<()> {
    let home = tempfile::tempdir()?;
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/users")
            .query_param("select", "*")
            .header("apikey", "test-key")
            .header("authorization", "Bearer test-key");
        then.status(200)
            .json_body(json!([{"id": 1, "name": "John"}, {"id": 2, "name": null}]));
    });

    supatable_at(home.path(), &server.base_url())
        .args(["read"])
        .assert()
        .success()
        .stdout(lines(&["id  name", "1   John", "2   (null)"]));

    mock.assert();
    Ok(())
}

#[test]
fn read_with_filters_json() -> anyhow::Result<()> {
    let home = tempfile::tempdir()?;
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/users")
            .query_param("age", "gte.18")
            .query_param("status", "eq.active")
            .header("range", "0-9");
        then.status(200).json_body(json!([{"id": 1}]));
    });

    supatable_at(home.path(), &server.base_url())
        .args([
            "-O",
            "json",
            "read",
            "--filter",
            "age=gte.18",
            "--filter",
            "status=eq.active",
            "--range",
            "0-9",
        ])
        .assert()
        .success()
        .stdout(contains(r#"[{"id":1}]"#));

    mock.assert();
    Ok(())
}

#[test]
fn read_columns() -> anyhow::Result<()> {
    let home = tempfile::tempdir()?;
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/users")
            .query_param("select", "id,name");
        then.status(200).json_body(json!([]));
    });

    supatable_at(home.path(), &server.base_url())
        .args(["read", "--select", "id,name"])
        .assert()
        .success()
        .stderr(contains("No rows"));

    mock.assert();
    Ok(())
}

#[test]
fn read_pages() -> anyhow::Result<()> {
    let home = tempfile::tempdir()?;
    let server = MockServer::start();
    let first = server.mock(|when, then| {
        when.method(GET).path("/users").header("range", "0-1");
        then.status(200).json_body(json!([{"id": 1}, {"id": 2}]));
    });
    let second = server.mock(|when, then| {
        when.method(GET).path("/users").header("range", "2-3");
        then.status(200).json_body(json!([{"id": 3}, {"id": 4}]));
    });

    supatable_at(home.path(), &server.base_url())
        .args(["-O", "json", "read", "--page-size", "2", "--limit", "3"])
        .assert()
        .success()
        .stdout(contains(r#"[{"id":1},{"id":2},{"id":3}]"#));

    first.assert();
    second.assert();
    Ok(())
}

#[test]
fn select_conflicts_with_filter() -> anyhow::Result<()> {
    let home = tempfile::tempdir()?;

    supatable_at(home.path(), "http://127.0.0.1:1")
        .args(["read", "--select", "id", "--filter", "id=eq.1"])
        .assert()
        .failure()
        .stderr(contains("cannot be used with"));

    Ok(())
}

#[test]
fn unsupported_operator() -> anyhow::Result<()> {
    let home = tempfile::tempdir()?;

    supatable_at(home.path(), "http://127.0.0.1:1")
        .args(["read", "--filter", "name=like.J*"])
        .assert()
        .failure()
        .stderr(contains("Filter operator not supported: like"));

    Ok(())
}

#[test]
fn insert_row() -> anyhow::Result<()> {
    let home = tempfile::tempdir()?;
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/users")
            .header("prefer", "return=representation")
            .header("content-type", "application/json")
            .json_body(json!({"id": 1, "name": "John"}));
        then.status(201).json_body(json!([{"id": 1, "name": "John"}]));
    });

    supatable_at(home.path(), &server.base_url())
        .args(["-O", "json", "insert", r#"{"id": 1, "name": "John"}"#])
        .assert()
        .success()
        .stdout(contains(r#"[{"id":1,"name":"John"}]"#));

    mock.assert();
    Ok(())
}

#[test]
fn upsert_rows_from_stdin() -> anyhow::Result<()> {
    let home = tempfile::tempdir()?;
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/users")
            .header("prefer", "resolution=merge-duplicates")
            .json_body(json!([{"id": 1}, {"id": 2}]));
        then.status(201);
    });

    supatable_at(home.path(), &server.base_url())
        .args(["insert", "--upsert", "-"])
        .write_stdin(r#"[{"id": 1}, {"id": 2}]"#)
        .assert()
        .success()
        .stderr(contains("Inserted rows into users"));

    mock.assert();
    Ok(())
}

#[test]
fn update_rows() -> anyhow::Result<()> {
    let home = tempfile::tempdir()?;
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(PATCH)
            .path("/users")
            .query_param("id", "eq.1")
            .header("prefer", "return=representation")
            .json_body(json!({"name": "Jane"}));
        then.status(200).json_body(json!([{"id": 1, "name": "Jane"}]));
    });

    supatable_at(home.path(), &server.base_url())
        .args(["update", "--filter", "id=eq.1", r#"{"name": "Jane"}"#])
        .assert()
        .success()
        .stdout(lines(&["id  name", "1   Jane"]));

    mock.assert();
    Ok(())
}

#[test]
fn update_requires_filter() -> anyhow::Result<()> {
    let home = tempfile::tempdir()?;

    supatable_at(home.path(), "http://127.0.0.1:1")
        .args(["update", r#"{"name": "Jane"}"#])
        .assert()
        .failure()
        .stderr(contains("--filter"));

    Ok(())
}

#[test]
fn delete_rows() -> anyhow::Result<()> {
    let home = tempfile::tempdir()?;
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(DELETE)
            .path("/users")
            .query_param("id", "in.(1,2)");
        then.status(204);
    });

    supatable_at(home.path(), &server.base_url())
        .args(["delete", "--filter", "id=in.(1,2)"])
        .assert()
        .success()
        .stderr(contains("Deleted matching rows from users"));

    mock.assert();
    Ok(())
}

#[test]
fn rejected_api_key() -> anyhow::Result<()> {
    let home = tempfile::tempdir()?;
    let server = MockServer::start();
    let _m = server.mock(|when, then| {
        when.method(GET).path("/users");
        then.status(401).body(r#"{"message":"Invalid API key"}"#);
    });

    supatable_at(home.path(), &server.base_url())
        .args(["read"])
        .assert()
        .failure()
        .stderr(contains("The server rejected the API key"))
        .stderr(contains("401").and(contains("Invalid API key")));

    Ok(())
}

#[test]
fn missing_table() -> anyhow::Result<()> {
    let home = tempfile::tempdir()?;
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.path("/users");
        then.status(200).json_body(json!([]));
    });

    supatable(home.path())
        .args([
            "--project",
            &server.base_url(),
            "--api-key",
            "test-key",
            "read",
        ])
        .assert()
        .failure()
        .stderr(contains("Table name is required"));

    assert_eq!(mock.calls(), 0);
    Ok(())
}

#[test]
fn read_help_examples() -> anyhow::Result<()> {
    let home = tempfile::tempdir()?;

    supatable(home.path())
        .args(["read", "--help"])
        .assert()
        .success()
        .stdout(contains("Examples"))
        .stdout(contains("# Read two columns of the first ten rows"))
        .stdout(contains("supatable -t users read --select id,name --range 0-9"));

    Ok(())
}
