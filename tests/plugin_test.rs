use assert_cmd::Command;
use predicates::prelude::*;
use prost::Message;
use sqlc_gen_template::plugin::{GenerateRequest, GenerateResponse, Settings};
use std::fs;
use tempfile::tempdir;

const METHOD: &str = "/plugin.CodegenService/Generate";

fn request(options: serde_json::Value) -> Vec<u8> {
    GenerateRequest {
        settings: Some(Settings {
            engine: "sqlite".to_string(),
            ..Settings::default()
        }),
        sqlc_version: "v1.27.0".to_string(),
        plugin_options: serde_json::to_vec(&options).unwrap(),
        ..GenerateRequest::default()
    }
    .encode_to_vec()
}

fn plugin() -> Command {
    let mut cmd = Command::cargo_bin("sqlc-gen-template").unwrap();
    cmd.env_remove("SQLC_GEN_TEMPLATE_LOG");
    cmd
}

#[test]
fn test_generate_over_stdio() {
    let dir = tempdir().unwrap();
    let template = dir.path().join("engine.txt.tmpl");
    fs::write(&template, "engine={{.Settings.Engine}} sqlc={{.SqlcVersion}}").unwrap();

    let output = plugin()
        .arg(METHOD)
        .write_stdin(request(serde_json::json!({"template": template})))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let response = GenerateResponse::decode(&output[..]).unwrap();
    assert_eq!(response.files.len(), 1);
    assert_eq!(response.files[0].name, "engine.txt");
    assert_eq!(response.files[0].contents, b"engine=sqlite sqlc=v1.27.0");
}

#[test]
fn test_method_argument_is_optional() {
    let output = plugin()
        .write_stdin(request(serde_json::json!({})))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert!(GenerateResponse::decode(&output[..]).unwrap().files.is_empty());
}

#[test]
fn test_unknown_method_fails() {
    plugin()
        .arg("/plugin.CodegenService/Other")
        .write_stdin(request(serde_json::json!({})))
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("unknown method"));
}

#[test]
fn test_failing_formatter_exits_non_zero_without_response() {
    let dir = tempdir().unwrap();
    let template = dir.path().join("out.tmpl");
    fs::write(&template, "content").unwrap();

    plugin()
        .arg(METHOD)
        .write_stdin(request(serde_json::json!({
            "template": template,
            "formatter_cmd": "cat >/dev/null; exit 2",
        })))
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("formatter command"));
}

#[test]
fn test_template_error_is_reported_on_stderr() {
    let dir = tempdir().unwrap();
    let template = dir.path().join("bad.tmpl");
    fs::write(&template, "line one\n{{.Settings.Package}}").unwrap();

    plugin()
        .arg(METHOD)
        .write_stdin(request(serde_json::json!({"template": template})))
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("bad.tmpl:2: executing: field Package not found"));
}

#[test]
fn test_malformed_input_fails() {
    plugin()
        .arg(METHOD)
        .write_stdin(b"not a protobuf message".to_vec())
        .assert()
        .failure()
        .stdout(predicate::str::is_empty());
}
