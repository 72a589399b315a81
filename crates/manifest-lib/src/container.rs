//! Container spec assembly

use tracing::debug;

use crate::error::Result;
use crate::health::compile_health_check;
use crate::models::{
    AppPort, ApplicationManifest, ContainerPort, ContainerSpec, EnvVar, ResourceRequirements,
    RuntimeDefaults,
};
use crate::resources::build_resource_requests;

/// Assemble the container for an app
///
/// Resources are built first, then the health check; the first error stops
/// assembly and is returned as is.
pub fn assemble_container(
    app: &ApplicationManifest,
    runtime: &RuntimeDefaults,
) -> Result<ContainerSpec> {
    let resources = build_resource_requests(&app.memory, &app.disk_quota, &app.cpu, runtime)?;
    let probe = compile_health_check(
        &app.health_check_type,
        &app.health_check_http_endpoint,
        app.health_check_timeout,
    )?;

    let container = ContainerSpec {
        ports: app.ports.iter().map(container_port).collect(),
        command: if app.entrypoint.is_empty() {
            Vec::new()
        } else {
            vec![app.entrypoint.clone()]
        },
        args: app.args.clone(),
        env: env_vars(app),
        resources: ResourceRequirements::uniform(resources),
        readiness_probe: probe.clone(),
        liveness_probe: probe,
        ..Default::default()
    };

    debug!(
        app = %app.name,
        ports = container.ports.len(),
        env = container.env.len(),
        probe = container.readiness_probe.as_ref().map(|p| p.handler.kind()).unwrap_or("none"),
        "Assembled container"
    );

    Ok(container)
}

/// Name a declared port `<protocol>-<port>`
pub fn container_port(port: &AppPort) -> ContainerPort {
    ContainerPort {
        name: format!("{}-{}", port.protocol.as_str(), port.port),
        container_port: port.port,
        protocol: Some(port.protocol.transport()),
    }
}

/// Env map as name/value pairs, sorted by name
fn env_vars(app: &ApplicationManifest) -> Vec<EnvVar> {
    app.env
        .iter()
        .map(|(name, value)| EnvVar {
            name: name.clone(),
            value: value.clone(),
        })
        .collect()
}
