// Command line tests for the nodepath binary
#![cfg(unix)]


use assert_cmd::Command;
use nodepath::{exit_codes, ClientType};
use predicates::prelude::*;
use test_utils::NodesFixture;

fn nodepath(fixture: &NodesFixture) -> Command {
    let mut cmd = Command::cargo_bin("nodepath").unwrap();
    cmd.arg("--nodes-dir")
        .arg(fixture.nodes_dir())
        .arg("--search-path")
        .arg(fixture.system_dir());
    cmd
}

#[test]
fn test_prints_resolved_path() {
    let fixture = NodesFixture::new();
    let geth = fixture.bundle(ClientType::Geth, "1.8.2");

    nodepath(&fixture)
        .arg("geth")
        .assert()
        .success()
        .stdout(predicate::str::diff(format!("{}\n", geth.display())));
}

#[test]
fn test_missing_client_exits_with_unavailable_code() {
    let fixture = NodesFixture::new();

    nodepath(&fixture)
        .arg("parity")
        .assert()
        .code(exit_codes::CLIENT_UNAVAILABLE)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("No parity binary found"));
}

#[test]
fn test_unknown_client_is_config_error() {
    let fixture = NodesFixture::new();

    nodepath(&fixture)
        .arg("mist")
        .assert()
        .code(exit_codes::CONFIG_ERROR)
        .stderr(predicate::str::contains("Unknown client type: mist"));
}

#[test]
fn test_all_prints_json_mapping() {
    let fixture = NodesFixture::new();
    let geth = fixture.bundle(ClientType::Geth, "1.8.2");
    let eth = fixture.bundle(ClientType::Eth, "1.3.0");

    let output = nodepath(&fixture).arg("--all").assert().success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let mapping: serde_json::Value = serde_json::from_str(&stdout).unwrap();

    assert_eq!(mapping["geth"], geth.display().to_string());
    assert_eq!(mapping["eth"], eth.display().to_string());
    assert!(mapping.get("parity").is_none());
}

#[test]
fn test_config_file() {
    let fixture = NodesFixture::new();
    let geth = fixture.bundle(ClientType::Geth, "1.8.2");
    let config_path = fixture.root.path().join("nodepath.yaml");
    std::fs::write(
        &config_path,
        format!(
            "nodes_dir: {}\nsearch_path: {}\n",
            fixture.nodes_dir().display(),
            fixture.system_dir().display()
        ),
    )
    .unwrap();

    Command::cargo_bin("nodepath")
        .unwrap()
        .arg("--config")
        .arg(&config_path)
        .arg("geth")
        .assert()
        .success()
        .stdout(predicate::str::contains(geth.display().to_string()));
}

#[test]
fn test_missing_config_file() {
    Command::cargo_bin("nodepath")
        .unwrap()
        .args(["--config", "/nonexistent/nodepath.yaml", "geth"])
        .assert()
        .code(exit_codes::CONFIG_ERROR)
        .stderr(predicate::str::contains("Configuration file not found"));
}
