//! Integration tests driving the built `protohelp` binary.
//!
//! Each test runs in its own temp directory with `HOME` pointed at it, so no
//! user-global config leaks in.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const SCHEMA: &str = r#"
files:
  - name: pb/jeton.proto
    package: shop.v1
    messages:
      - name: JetonEntity
        options:
          model_feature: { keeper_key: providers_token }
        fields:
          - { name: id, type: TYPE_STRING }
      - name: JetonListRequest
        options:
          parser: { paging: true, list: true }
        fields:
          - { name: skip, type: TYPE_INT64, options: { field_option: {} } }
          - { name: limit, type: TYPE_INT64, options: { field_option: {} } }
          - { name: title, type: TYPE_STRING, options: { field_option: {} } }
"#;

const BROKEN: &str = r#"
files:
  - name: pb/broken.proto
    messages:
      - name: Typo
        options:
          parser: { pagin: true }
      - name: NoSource
        options:
          parser: { pick: true }
"#;

fn protohelp_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_protohelp"))
}

fn run(work_dir: &Path, args: &[&str]) -> Output {
    Command::new(protohelp_bin())
        .args(args)
        .current_dir(work_dir)
        .env("HOME", work_dir)
        .env_remove("RUST_LOG")
        .env_remove("HELPER_DEBUG")
        .env_remove("PROTOHELP_CONFIG")
        .env_remove("PROTOHELP_OUT_DIR")
        .env_remove("PROTOHELP_MODULE")
        .output()
        .expect("Failed to execute protohelp")
}

fn workspace(schema: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("schema.yaml"), schema).unwrap();
    dir
}

#[test]
fn test_generate_writes_helpers_file() {
    let dir = workspace(SCHEMA);
    let output = run(
        dir.path(),
        &["generate", "schema.yaml", "--go-module", "github.com/acme/shop"],
    );
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let generated = fs::read_to_string(dir.path().join("pb/jeton.helpers.go")).unwrap();
    assert!(generated.contains("package pb"));
    assert!(generated.contains("\"github.com/acme/shop/internal/keeper\""));
    assert!(generated.contains("func (x *JetonEntity) EncryptFields("));
    assert!(generated.contains("func (x *JetonListRequest) GetFilter() bson.M {"));
    assert!(generated.contains("var limit int64 = 20"));
}

#[test]
fn test_generate_reads_go_mod() {
    let dir = workspace(SCHEMA);
    fs::write(dir.path().join("go.mod"), "module example.com/from-mod\n").unwrap();
    let output = run(dir.path(), &["generate", "schema.yaml", "--go-mod", "go.mod"]);
    assert!(output.status.success());

    let generated = fs::read_to_string(dir.path().join("pb/jeton.helpers.go")).unwrap();
    assert!(generated.contains("\"example.com/from-mod/internal/keeper\""));
}

#[test]
fn test_generate_stdout_writes_no_files() {
    let dir = workspace(SCHEMA);
    let output = run(dir.path(), &["generate", "schema.yaml", "--stdout"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("// Code generated by protohelp. DO NOT EDIT."));
    assert!(!dir.path().join("pb").exists());
}

#[test]
fn test_failed_generation_writes_nothing() {
    let dir = workspace(BROKEN);
    let output = run(dir.path(), &["generate", "schema.yaml"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("2 generation error(s), nothing written"), "{stderr}");
    assert!(stderr.contains("Typo"));
    assert!(stderr.contains("NoSource"));
    assert!(!dir.path().join("pb").exists());
}

#[test]
fn test_project_config_sets_out_dir_and_package() {
    let dir = workspace(SCHEMA);
    fs::write(
        dir.path().join(".protohelp.toml"),
        "out-dir = \"gen\"\npackage = \"models\"\n",
    )
    .unwrap();

    let output = run(dir.path(), &["generate", "schema.yaml"]);
    assert!(output.status.success());
    let generated = fs::read_to_string(dir.path().join("gen/pb/jeton.helpers.go")).unwrap();
    assert!(generated.contains("package models"));
}

#[test]
fn test_module_prefix_mismatch_fails() {
    let dir = workspace(SCHEMA);
    let output = run(
        dir.path(),
        &["generate", "schema.yaml", "--module", "github.com/acme/shop"],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("does not match module prefix"), "{stderr}");
}

#[test]
fn test_plan_prints_json() {
    let dir = workspace(SCHEMA);
    let output = run(dir.path(), &["plan", "schema.yaml"]);
    assert!(output.status.success());

    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(plan[0]["file"], "pb/jeton.proto");
    let entities = plan[0]["entities"].as_array().unwrap();
    assert_eq!(entities[0]["entity"], "JetonEntity");
    assert_eq!(entities[1]["entity"], "JetonListRequest");
    assert_eq!(entities[1]["requests"][0]["artifact"], "paging_filter");
}

#[test]
fn test_plan_with_errors_exits_non_zero() {
    let dir = workspace(BROKEN);
    let output = run(dir.path(), &["plan", "schema.yaml", "--format", "yaml"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("file: pb/broken.proto"));
}

#[test]
fn test_case_command() {
    let dir = TempDir::new().unwrap();
    let output = run(
        dir.path(),
        &["case", "snake", "HTTPServerError", "JSONPayloadV2"],
    );
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "http_server_error\njson_payload_v2\n"
    );
}

#[test]
fn test_missing_descriptor_reports_path() {
    let dir = TempDir::new().unwrap();
    let output = run(dir.path(), &["generate", "missing.yaml"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("missing.yaml"));
}
