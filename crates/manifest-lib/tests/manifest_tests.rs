//! End-to-end tests from parsed manifest files to container specs

use manifest_lib::{
    assemble_container, derive_instances, export_deployment, ConversionError, ExportOptions,
    InstanceSpec, Manifest, PortProtocol, ProbeHandler, Quantity, ResourceName, RuntimeDefaults,
};

const MANIFEST: &str = r#"
applications:
- name: web
  memory: 512M
  disk_quota: 1G
  instances: 3
  health-check-type: http
  health-check-http-endpoint: /healthz
  timeout: 180
  env:
    GREETING: hello
    PORT: 8080
    DEBUG: true
    EMPTY:
    RATIO: "1.10"
  ports:
  - port: 8080
    protocol: http
  - port: 9090
- name: worker
  task: true
  instances: 5
  health-check-type: process
  entrypoint: /bin/worker
  args: ["--queue", "jobs"]
- name: paused
  no-start: true
  instances: 2
  buildpack: go_buildpack
"#;

fn manifest() -> Manifest {
    serde_yaml::from_str(MANIFEST).unwrap()
}

fn q(s: &str) -> Quantity {
    Quantity::parse(s).unwrap()
}

#[test]
fn test_manifest_keys_parse() {
    let manifest = manifest();
    let web = manifest.app("web").unwrap();

    assert_eq!(web.memory, "512M");
    assert_eq!(web.disk_quota, "1G");
    assert_eq!(web.instances, Some(3));
    assert_eq!(web.health_check_timeout, 180);
    assert_eq!(web.env["PORT"], "8080");
    assert_eq!(web.env["DEBUG"], "true");
    assert_eq!(web.env["EMPTY"], "");
    assert_eq!(web.env["RATIO"], "1.10");
    assert_eq!(web.ports[0].protocol, PortProtocol::Http);
    assert_eq!(web.ports[1].protocol, PortProtocol::Tcp);

    let paused = manifest.app("paused").unwrap();
    assert_eq!(paused.no_start, Some(true));
    assert_eq!(paused.declared_buildpacks(), vec!["go_buildpack"]);
}

#[test]
fn test_missing_app() {
    let err = manifest().app("nope").unwrap_err();
    assert_eq!(
        err,
        ConversionError::AppNotFound {
            name: "nope".to_string()
        }
    );
}

#[test]
fn test_web_container() {
    let manifest = manifest();
    let runtime = RuntimeDefaults {
        app_cpu_min: Some(q("100m")),
        app_cpu_per_gb_of_ram: Some(q("1")),
    };

    let container = assemble_container(manifest.app("web").unwrap(), &runtime).unwrap();
    let requests = container.resources.requests.as_ref().unwrap();

    assert_eq!(requests[&ResourceName::Memory], q("512Mi"));
    assert_eq!(requests[&ResourceName::EphemeralStorage], q("1Gi"));
    assert_eq!(requests[&ResourceName::Cpu], q("500m"));

    let probe = container.readiness_probe.as_ref().unwrap();
    assert_eq!(probe.http_path(), Some("/healthz"));
    assert_eq!(probe.timeout_seconds, 180);
    assert_eq!(probe.success_threshold, 1);

    let port_names: Vec<_> = container.ports.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(port_names, vec!["http-8080", "tcp-9090"]);

    let env_names: Vec<_> = container.env.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(env_names, vec!["DEBUG", "EMPTY", "GREETING", "PORT", "RATIO"]);
}

#[test]
fn test_worker_container_and_instances() {
    let manifest = manifest();
    let worker = manifest.app("worker").unwrap();

    let container = assemble_container(worker, &RuntimeDefaults::default()).unwrap();
    assert_eq!(container.command, vec!["/bin/worker"]);
    assert_eq!(container.args, vec!["--queue", "jobs"]);
    assert!(container.readiness_probe.is_none());
    assert!(container.resources.requests.is_none());

    assert_eq!(
        derive_instances(worker),
        InstanceSpec {
            stopped: true,
            replicas: None
        }
    );
}

#[test]
fn test_paused_app_exports_scaled_to_zero() {
    let manifest = manifest();
    let paused = manifest.app("paused").unwrap();

    assert_eq!(
        derive_instances(paused),
        InstanceSpec {
            stopped: true,
            replicas: Some(2)
        }
    );

    let bundle =
        export_deployment(paused, &RuntimeDefaults::default(), &ExportOptions::default()).unwrap();
    assert_eq!(bundle.deployment.spec.replicas, 0);
    assert_eq!(
        bundle.pipeline.pipeline_run.param("BUILDPACKS"),
        Some("go_buildpack")
    );
    assert_eq!(
        bundle.deployment.container().unwrap().readiness_probe.as_ref().unwrap().handler,
        ProbeHandler::TcpSocket { port: Some(8080) }
    );
}

#[test]
fn test_export_yaml_is_stable() {
    let manifest = manifest();
    let web = manifest.app("web").unwrap();

    let options = ExportOptions {
        image: Some("gcr.io/p/web"),
        source_url: Some("https://github.com/example/web"),
    };

    let first = export_deployment(web, &RuntimeDefaults::default(), &options).unwrap();
    let second = export_deployment(web, &RuntimeDefaults::default(), &options).unwrap();

    assert_eq!(
        serde_yaml::to_string(&first).unwrap(),
        serde_yaml::to_string(&second).unwrap()
    );
}

#[test]
fn test_runtime_defaults_from_config_values() {
    let runtime: RuntimeDefaults =
        serde_json::from_str(r#"{"app_cpu_min": "500m", "app_cpu_per_gb_of_ram": 2}"#).unwrap();

    assert_eq!(runtime.app_cpu_min, Some(q(".5")));
    assert_eq!(runtime.app_cpu_per_gb_of_ram, Some(q("2")));
}

#[test]
fn test_null_env_value_reads_as_empty() {
    let manifest: Manifest = serde_yaml::from_str(
        r#"
applications:
- name: app
  env:
    UNSET: ~
    BLANK:
"#,
    )
    .unwrap();

    let app = manifest.app("app").unwrap();
    assert_eq!(app.env["UNSET"], "");
    assert_eq!(app.env["BLANK"], "");
}
