//! Integration tests for pq CLI.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

const CLUSTER_VERSION: &str = r#"{
  "kind": "ClusterVersion",
  "metadata": {"name": "version", "generation": 1},
  "status": {
    "desired": {"version": "4.2.0-0.ci-2019-08-04-183142", "force": false},
    "conditions": [
      {"type": "Available", "status": "True", "message": "Done applying 4.2.0"},
      {"type": "Failing", "status": "True", "reason": "ClusterOperatorNotAvailable"},
      {"type": "Progressing", "status": "False", "reason": "ClusterOperatorNotAvailable"},
      {"type": "RetrievedUpdates", "status": "False", "reason": "RemoteFailed"}
    ],
    "availableUpdates": null
  }
}"#;

fn pq_cmd(parsr_root: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_pq"));
    cmd.env("PARSR_ROOT", parsr_root);
    cmd.env_remove("RUST_LOG");
    cmd
}

fn write_doc(dir: &Path) -> PathBuf {
    let path = dir.join("clusterversion.json");
    std::fs::write(&path, CLUSTER_VERSION).unwrap();
    path
}

fn run(tmp: &TempDir, args: &[&str]) -> Output {
    pq_cmd(tmp.path())
        .args(args)
        .output()
        .expect("failed to run pq")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_query_values() {
    let tmp = TempDir::new().unwrap();
    let doc = write_doc(tmp.path());

    let output = run(&tmp, &["query", "status.conditions.status", doc.to_str().unwrap(), "-f", "values"]);
    assert!(output.status.success(), "pq query failed: {:?}", output);
    assert_eq!(stdout(&output), "True\nTrue\nFalse\nFalse\n");
}

#[test]
fn test_query_where_or() {
    let tmp = TempDir::new().unwrap();
    let doc = write_doc(tmp.path());

    let output = run(
        &tmp,
        &[
            "query",
            "status.conditions[type=Progressing | status=True].reason",
            doc.to_str().unwrap(),
            "--format",
            "values",
        ],
    );
    assert!(output.status.success(), "pq query failed: {:?}", output);
    assert_eq!(
        stdout(&output),
        "ClusterOperatorNotAvailable\nClusterOperatorNotAvailable\n"
    );
}

#[test]
fn test_query_json_default() {
    let tmp = TempDir::new().unwrap();
    let doc = write_doc(tmp.path());

    let output = run(&tmp, &["query", "status.desired", doc.to_str().unwrap()]);
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(
        parsed,
        serde_json::json!([{"version": "4.2.0-0.ci-2019-08-04-183142", "force": false}])
    );
}

#[test]
fn test_query_count_from_stdin() {
    let tmp = TempDir::new().unwrap();

    let mut child = pq_cmd(tmp.path())
        .args(["query", "status.conditions[type=Progressing]", "-f", "count"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("failed to spawn");

    {
        let stdin = child.stdin.as_mut().unwrap();
        stdin.write_all(CLUSTER_VERSION.as_bytes()).unwrap();
    }

    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "1");
}

#[test]
fn test_query_missing_field_is_empty() {
    let tmp = TempDir::new().unwrap();
    let doc = write_doc(tmp.path());

    let output = run(&tmp, &["query", "spec.nothing.here", doc.to_str().unwrap(), "-f", "count"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "0");
}

#[test]
fn test_values_over_composite_fails() {
    let tmp = TempDir::new().unwrap();
    let doc = write_doc(tmp.path());

    let output = run(&tmp, &["query", "status.conditions", doc.to_str().unwrap(), "-f", "values"]);
    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error:"), "stderr: {}", stderr);
    assert!(stderr.contains("conditions[0]"), "stderr: {}", stderr);
}

#[test]
fn test_skip_composite_flag() {
    let tmp = TempDir::new().unwrap();
    let doc = write_doc(tmp.path());

    let output = run(
        &tmp,
        &["query", "status.*", doc.to_str().unwrap(), "-f", "values", "--skip-composite"],
    );
    assert!(output.status.success(), "pq query failed: {:?}", output);
    assert_eq!(stdout(&output), "null\n");
}

#[test]
fn test_config_sets_defaults() {
    let tmp = TempDir::new().unwrap();
    let doc = write_doc(tmp.path());
    std::fs::write(
        tmp.path().join("config.toml"),
        "output_format = \"values\"\ncomposite_values = \"skip\"\n",
    )
    .unwrap();

    let output = run(&tmp, &["query", "status.desired.*", doc.to_str().unwrap()]);
    assert!(output.status.success(), "pq query failed: {:?}", output);
    assert_eq!(stdout(&output), "4.2.0-0.ci-2019-08-04-183142\nfalse\n");

    let shown = run(&tmp, &["config"]);
    assert!(shown.status.success());
    assert!(stdout(&shown).contains("composite_values = \"skip\""));
}

#[test]
fn test_invalid_config_fails() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("config.toml"), "output_format = \"xml\"\n").unwrap();

    let output = run(&tmp, &["config"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("xml"));
}

#[test]
fn test_parse_ignores_invalid_config() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("config.toml"), "output_format = \"xml\"\n").unwrap();

    let output = run(&tmp, &["parse", "status.conditions[type=Failing]"]);
    assert!(output.status.success(), "pq parse failed: {:?}", output);
    assert_eq!(stdout(&output).trim(), "status.conditions[type=Failing]");
}

#[test]
fn test_config_log_level() {
    let tmp = TempDir::new().unwrap();
    let doc = write_doc(tmp.path());

    let quiet = run(&tmp, &["query", "kind", doc.to_str().unwrap()]);
    assert!(quiet.status.success());
    assert!(!String::from_utf8_lossy(&quiet.stderr).contains("DEBUG"));

    std::fs::write(tmp.path().join("config.toml"), "log_level = \"debug\"\n").unwrap();
    let verbose = run(&tmp, &["query", "kind", doc.to_str().unwrap()]);
    assert!(verbose.status.success());
    let stderr = String::from_utf8_lossy(&verbose.stderr);
    assert!(stderr.contains("DEBUG"), "stderr: {}", stderr);
    assert_eq!(stdout(&verbose).trim(), "[\n  \"ClusterVersion\"\n]");
}

#[test]
fn test_unknown_format_fails() {
    let tmp = TempDir::new().unwrap();
    let doc = write_doc(tmp.path());

    let output = run(&tmp, &["query", "kind", doc.to_str().unwrap(), "-f", "yaml"]);
    assert!(!output.status.success());
}

#[test]
fn test_names() {
    let tmp = TempDir::new().unwrap();
    let doc = write_doc(tmp.path());

    let output = run(&tmp, &["names", "metadata", doc.to_str().unwrap()]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "name\ngeneration\n");
}

#[test]
fn test_toml_document() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("settings.toml");
    std::fs::write(&path, "[[servers]]\nname = \"a\"\nport = 80\n\n[[servers]]\nname = \"b\"\nport = 8080\n").unwrap();

    let output = run(&tmp, &["query", "servers[port>100].name", path.to_str().unwrap(), "-f", "values"]);
    assert!(output.status.success(), "pq query failed: {:?}", output);
    assert_eq!(stdout(&output), "b\n");
}

const SERVERS_TOML: &str = "[[servers]]\nname = \"a\"\nport = 80\n\n[[servers]]\nname = \"b\"\nport = 8080\n";

#[test]
fn test_toml_flag_reads_stdin() {
    let tmp = TempDir::new().unwrap();

    let mut child = pq_cmd(tmp.path())
        .args(["query", "servers[port<100].name", "--toml", "-f", "values"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("failed to spawn");

    {
        let stdin = child.stdin.as_mut().unwrap();
        stdin.write_all(SERVERS_TOML.as_bytes()).unwrap();
    }

    let output = child.wait_with_output().unwrap();
    assert!(output.status.success(), "pq query failed: {:?}", output);
    assert_eq!(stdout(&output), "a\n");
}

#[test]
fn test_toml_flag_overrides_extension() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("servers.json");
    std::fs::write(&path, SERVERS_TOML).unwrap();

    // decoded by extension, the file is not JSON
    let as_json = run(&tmp, &["query", "servers.name", path.to_str().unwrap()]);
    assert_eq!(as_json.status.code(), Some(1));

    let output = run(
        &tmp,
        &["query", "servers.name", path.to_str().unwrap(), "--toml", "-f", "values"],
    );
    assert!(output.status.success(), "pq query failed: {:?}", output);
    assert_eq!(stdout(&output), "a\nb\n");

    let names = run(&tmp, &["names", "servers", path.to_str().unwrap(), "--toml"]);
    assert!(names.status.success(), "pq names failed: {:?}", names);
    assert_eq!(stdout(&names), "name\nport\nname\nport\n");
}

#[test]
fn test_toml_datetime_values() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("release.toml");
    std::fs::write(&path, "[release]\nversion = \"4.2\"\npublished = 2019-08-04T23:16:46Z\n").unwrap();

    let output = run(&tmp, &["query", "release.published", path.to_str().unwrap(), "-f", "values"]);
    assert!(output.status.success(), "pq query failed: {:?}", output);
    assert_eq!(stdout(&output), "2019-08-04T23:16:46Z\n");
}

#[test]
fn test_parse_canonical() {
    let tmp = TempDir::new().unwrap();

    let output = run(&tmp, &["parse", ".status.conditions[type=Failing|status!=True]"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "status.conditions[type=Failing | status<>True]");
}

#[test]
fn test_parse_error() {
    let tmp = TempDir::new().unwrap();

    let output = run(&tmp, &["parse", "status.conditions[type="]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Query parse error"));
}

#[test]
fn test_missing_file() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("absent.json");

    let output = run(&tmp, &["query", "kind", missing.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("IO error"));
}
