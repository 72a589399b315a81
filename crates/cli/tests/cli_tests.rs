//! CLI integration tests

use serde::Deserialize;
use std::path::Path;
use std::process::{Command, Output};

const MANIFEST: &str = r#"
applications:
- name: web
  memory: 1G
  disk_quota: 512M
  instances: 2
  health-check-type: http
  health-check-http-endpoint: /healthz
  timeout: 30
  env:
    MODE: prod
- name: broken
  memory: 21ZB
"#;

fn kf_export(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_kf-export"))
        .args(args)
        .env("HOME", home)
        .env_remove("KF_EXPORT_CONFIG")
        .env_remove("KF_APP_CPU_MIN")
        .env_remove("KF_APP_CPU_PER_GB_OF_RAM")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute command")
}

fn write_manifest(dir: &Path) -> String {
    let path = dir.join("manifest.yml");
    std::fs::write(&path, MANIFEST).unwrap();
    path.display().to_string()
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let home = tempfile::tempdir().unwrap();
    let output = kf_export(home.path(), &["--help"]);

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("container"), "Should show container command");
    assert!(stdout.contains("instances"), "Should show instances command");
    assert!(stdout.contains("deployment"), "Should show deployment command");
    assert!(stdout.contains("normalize"), "Should show normalize command");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let home = tempfile::tempdir().unwrap();
    let output = kf_export(home.path(), &["--version"]);

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("kf-export"), "Should show binary name");
}

#[test]
fn test_container_json() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write_manifest(dir.path());

    let output = kf_export(
        dir.path(),
        &[
            "container", "-f", &manifest, "--app", "web", "-o", "json", "--cpu-per-gb", "500m",
        ],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let container: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(container["resources"]["requests"]["memory"], "1Gi");
    assert_eq!(container["resources"]["requests"]["ephemeral-storage"], "512Mi");
    assert_eq!(container["resources"]["requests"]["cpu"], "500m");
    assert_eq!(container["resources"]["limits"], container["resources"]["requests"]);
    assert_eq!(container["readinessProbe"]["httpGet"]["path"], "/healthz");
    assert_eq!(container["readinessProbe"]["timeoutSeconds"], 30);
    assert_eq!(container["env"][0]["name"], "MODE");
}

#[test]
fn test_bad_quantity_fails() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write_manifest(dir.path());

    let output = kf_export(dir.path(), &["container", "-f", &manifest, "-a", "broken"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("couldn't parse resource quantity 21ZB"), "{stderr}");
}

#[test]
fn test_ambiguous_app_fails() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write_manifest(dir.path());

    let output = kf_export(dir.path(), &["instances", "-f", &manifest]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--app"));
}

#[test]
fn test_instances_yaml() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write_manifest(dir.path());

    let output = kf_export(dir.path(), &["instances", "-f", &manifest, "-a", "web", "-o", "yaml"]);
    assert!(output.status.success());

    let instances: serde_yaml::Value = serde_yaml::from_slice(&output.stdout).unwrap();
    assert_eq!(instances["stopped"], serde_yaml::Value::Bool(false));
    assert_eq!(instances["replicas"], serde_yaml::Value::from(2));
}

#[test]
fn test_deployment_yaml_and_metrics_file() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write_manifest(dir.path());
    let metrics = dir.path().join("metrics.prom");

    let output = kf_export(
        dir.path(),
        &[
            "deployment",
            "-f",
            &manifest,
            "-a",
            "web",
            "--image",
            "gcr.io/project/web",
            "--source-url",
            "https://github.com/example/web",
            "-o",
            "yaml",
            "--metrics-file",
            metrics.to_str().unwrap(),
        ],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let documents: Vec<serde_yaml::Value> = serde_yaml::Deserializer::from_slice(&output.stdout)
        .map(|doc| serde_yaml::Value::deserialize(doc).unwrap())
        .collect();
    let kinds: Vec<_> = documents.iter().map(|d| d["kind"].as_str().unwrap()).collect();
    assert_eq!(kinds, vec!["Task", "Pipeline", "PipelineRun", "Deployment"]);

    let run = &documents[2];
    assert_eq!(run["spec"]["params"][1]["name"], serde_yaml::Value::from("IMAGE"));
    assert_eq!(
        run["spec"]["params"][1]["value"],
        serde_yaml::Value::from("gcr.io/project/web")
    );
    assert_eq!(
        documents[1]["spec"]["tasks"][0]["params"][0]["value"],
        serde_yaml::Value::from("https://github.com/example/web")
    );

    let deployment = &documents[3];
    assert_eq!(deployment["spec"]["replicas"], serde_yaml::Value::from(2));
    assert_eq!(
        deployment["spec"]["template"]["spec"]["containers"][0]["image"],
        serde_yaml::Value::from("gcr.io/project/web")
    );

    let text = std::fs::read_to_string(&metrics).unwrap();
    assert!(text.contains("kf_manifest_conversions_total 1"));
    assert!(text.contains("kf_manifest_probes_compiled_total{type=\"http\"} 1"));
}

#[test]
fn test_normalize() {
    let home = tempfile::tempdir().unwrap();

    let output = kf_export(home.path(), &["normalize", "512M", "2GB", "-o", "json"]);
    assert!(output.status.success());

    let results: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(results[0]["normalized"], "512Mi");
    assert_eq!(results[1]["normalized"], "2Gi");
    assert_eq!(results[1]["canonical"], "2Gi");

    let output = kf_export(home.path(), &["normalize", "1G", "lots"]);
    assert!(!output.status.success());
}

#[test]
fn test_config_file_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write_manifest(dir.path());
    let config = dir.path().join("runtime.json");
    std::fs::write(&config, r#"{"app_cpu_min": "2"}"#).unwrap();

    let output = kf_export(
        dir.path(),
        &[
            "container",
            "-f",
            &manifest,
            "-a",
            "web",
            "-o",
            "json",
            "--config",
            config.to_str().unwrap(),
        ],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let container: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(container["resources"]["requests"]["cpu"], "2");
}
