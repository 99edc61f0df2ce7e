use crate::cli::supatable;
use predicates::prelude::*;

#[test]
fn cli_version() -> anyhow::Result<()> {
    let home = tempfile::tempdir()?;

    supatable(home.path())
        .args(["version"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("supatable "));

    Ok(())
}
