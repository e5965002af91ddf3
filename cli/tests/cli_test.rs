use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::error::Error;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

const PARAMS: &str = r#"[{ "name": "weight", "type": "number", "displayName": "Weight (kg)" }]"#;

#[test]
fn check_passes_clean_script() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let script = dir.path().join("dose.ds");
    let params = dir.path().join("params.json");
    fs::write(&script, "addNormalResult('d', weight*2, 'mg','','','')\n")?;
    fs::write(&params, PARAMS)?;

    let mut cmd = Command::cargo_bin("dosescript")?;
    cmd.args(["check", script.to_str().unwrap(), "--params", params.to_str().unwrap()]);
    cmd.assert().success().stdout(predicate::str::contains("✓ passed"));
    Ok(())
}

#[test]
fn check_warns_on_misspelled_parameter() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let script = dir.path().join("dose.ds");
    let params = dir.path().join("params.json");
    fs::write(&script, "addNormalResult('d', wieght*2, 'mg','','','')\n")?;
    fs::write(&params, PARAMS)?;

    let mut cmd = Command::cargo_bin("dosescript")?;
    cmd.args(["check", script.to_str().unwrap(), "--params", params.to_str().unwrap()]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(":1:22: warning[identifiers]"))
        .stdout(predicate::str::contains("wieght"))
        .stdout(predicate::str::contains("0 errors, 1 warning, 0 hints"));
    Ok(())
}

#[test]
fn check_fails_on_syntax_error_with_json_output() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let script = dir.path().join("broken.ds");
    fs::write(&script, "let total = ;\n")?;

    let mut cmd = Command::cargo_bin("dosescript")?;
    cmd.args(["check", script.to_str().unwrap(), "--format", "json"]);
    cmd.assert()
        .code(1)
        .stdout(predicate::str::contains("\"severity\": \"error\""))
        .stdout(predicate::str::contains("passed").not());
    Ok(())
}

#[test]
fn check_missing_file_exits_with_two() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let mut cmd = Command::cargo_bin("dosescript")?;
    cmd.args(["check", dir.path().join("absent.ds").to_str().unwrap()]);
    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("Failed to read file"));
    Ok(())
}

#[test]
fn complete_ranks_parameter_before_keyword() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let script = dir.path().join("dose.ds");
    let params = dir.path().join("params.json");
    fs::write(&script, "let a = 1;\nw")?;
    fs::write(&params, PARAMS)?;

    let mut cmd = Command::cargo_bin("dosescript")?;
    cmd.args([
        "complete",
        script.to_str().unwrap(),
        "--offset",
        "12",
        "--params",
        params.to_str().unwrap(),
    ]);
    let output = cmd.assert().success().get_output().stdout.clone();
    let stdout = String::from_utf8(output)?;
    let labels: Vec<&str> = stdout.lines().filter_map(|l| l.split('\t').next()).collect();
    let weight = labels.iter().position(|l| *l == "weight").ok_or("weight missing")?;
    let while_kw = labels.iter().position(|l| *l == "while").ok_or("while missing")?;
    assert!(weight < while_kw);
    Ok(())
}

#[test]
fn scopes_lists_visible_names() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let script = dir.path().join("scopes.ds");
    fs::write(&script, "var x=1; function f(y){ let z=2; }")?;

    let mut cmd = Command::cargo_bin("dosescript")?;
    cmd.args(["scopes", script.to_str().unwrap()]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("x\tvariable"))
        .stdout(predicate::str::contains("f\tfunction"))
        .stdout(predicate::str::contains("y\t").not())
        .stdout(predicate::str::contains("z\t").not());
    Ok(())
}

#[test]
fn complete_snaps_offset_inside_multibyte_char() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let script = dir.path().join("dose.ds");
    let source = "let dosé = 1;\ndosé";
    fs::write(&script, source)?;

    let offset = (source.len() - 1).to_string();
    let mut cmd = Command::cargo_bin("dosescript")?;
    cmd.args(["complete", script.to_str().unwrap(), "--offset", offset.as_str()]);
    cmd.assert().success().stdout(predicate::str::starts_with("dosé\tvariable"));
    Ok(())
}

#[test]
fn check_traces_when_enabled() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let script = dir.path().join("dose.ds");
    fs::write(&script, "let a = 1;\n")?;

    let mut cmd = Command::cargo_bin("dosescript")?;
    cmd.env("DOSESCRIPT_TRACE", "dosescript=debug");
    cmd.args(["check", script.to_str().unwrap()]);
    cmd.assert().success().stderr(predicate::str::contains("check finished"));
    Ok(())
}
