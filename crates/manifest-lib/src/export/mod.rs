//! Export of an app as plain Kubernetes resources
//!
//! Produces a Deployment running the app's container together with the
//! Tekton pipeline that builds its image from source. The result can be
//! applied to any cluster without the platform's own controllers.

mod deployment;
mod pipeline;

pub use deployment::{
    app_labels, Deployment, DeploymentSpec, LabelSelector, ObjectMeta, PodSpec, PodTemplateSpec,
    APP_LABEL,
};
pub use pipeline::{
    build_pipeline, make_clone_task, make_pipeline_run, make_pipeline_spec, BuildPipeline,
    Pipeline, PipelineRun, PipelineSpec, Task, PIPELINE_NAME, TEKTON_API_VERSION,
};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::container::assemble_container;
use crate::error::Result;
use crate::instances::derive_instances;
use crate::models::{ApplicationManifest, ContainerPort, RuntimeDefaults};

/// Port the app listens on when the manifest declares none
pub const DEFAULT_USER_PORT: i32 = 8080;

/// Name of the default user port
pub const USER_PORT_NAME: &str = "http-user-port";

/// Image used when the caller hasn't built one yet
pub const PLACEHOLDER_IMAGE: &str = "placeholder";

/// Source repository used when the caller names none
pub const PLACEHOLDER_SOURCE_URL: &str = "placeholder";

/// Replicas of a started app that declares no instance count
pub const DEFAULT_REPLICAS: i32 = 1;

/// Buildpacks tried, in order, when the app names none
pub const DEFAULT_BUILDPACKS: &[&str] = &[
    "https://github.com/cloudfoundry/staticfile-buildpack",
    "https://github.com/cloudfoundry/java-buildpack",
    "https://github.com/cloudfoundry/ruby-buildpack",
    "https://github.com/cloudfoundry/dotnet-core-buildpack",
    "https://github.com/cloudfoundry/nodejs-buildpack",
    "https://github.com/cloudfoundry/go-buildpack",
    "https://github.com/cloudfoundry/python-buildpack",
    "https://github.com/cloudfoundry/php-buildpack",
    "https://github.com/cloudfoundry/binary-buildpack",
    "https://github.com/cloudfoundry/nginx-buildpack",
];

/// Build parameter names
pub mod params {
    pub const BUILDPACKS: &str = "BUILDPACKS";
    pub const IMAGE: &str = "IMAGE";
}

/// A named build parameter, passed to Tekton as a string param
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildParam {
    pub name: String,
    pub value: String,
}

/// Everything needed to build and run an app outside the platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub pipeline: BuildPipeline,
    pub deployment: Deployment,
}

/// Caller choices for an export
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportOptions<'a> {
    /// Image the build publishes and the Deployment runs
    pub image: Option<&'a str>,
    /// Git repository the pipeline clones
    pub source_url: Option<&'a str>,
}

fn or_placeholder<'a>(value: Option<&'a str>, placeholder: &'a str) -> &'a str {
    value.filter(|v| !v.is_empty()).unwrap_or(placeholder)
}

/// Build parameters for an app's image
pub fn build_params(app: &ApplicationManifest, image: &str) -> Vec<BuildParam> {
    let declared = app.declared_buildpacks();
    let buildpacks = if declared.is_empty() {
        DEFAULT_BUILDPACKS.join(",")
    } else {
        declared.join(",")
    };

    vec![
        BuildParam {
            name: params::BUILDPACKS.to_string(),
            value: buildpacks,
        },
        BuildParam {
            name: params::IMAGE.to_string(),
            value: image.to_string(),
        },
    ]
}

/// Replica count for the exported Deployment
///
/// A stopped app is exported scaled to zero.
pub fn export_replicas(app: &ApplicationManifest) -> i32 {
    let instances = derive_instances(app);
    if instances.stopped {
        0
    } else {
        instances.replicas.unwrap_or(DEFAULT_REPLICAS)
    }
}

/// Export an app as a Deployment plus the pipeline building its image
pub fn export_deployment(
    app: &ApplicationManifest,
    runtime: &RuntimeDefaults,
    options: &ExportOptions<'_>,
) -> Result<ExportBundle> {
    let image = or_placeholder(options.image, PLACEHOLDER_IMAGE);
    let source_url = or_placeholder(options.source_url, PLACEHOLDER_SOURCE_URL);

    let mut container = assemble_container(app, runtime)?;
    container.name = app.name.clone();
    container.image = image.to_string();

    if container.ports.is_empty() {
        container.ports.push(ContainerPort {
            name: USER_PORT_NAME.to_string(),
            container_port: DEFAULT_USER_PORT,
            protocol: None,
        });
    }

    let probe_port = container.ports[0].container_port;
    for probe in [&mut container.readiness_probe, &mut container.liveness_probe]
        .into_iter()
        .flatten()
    {
        probe.handler.set_port(probe_port);
    }

    let replicas = export_replicas(app);
    debug!(app = %app.name, replicas, image, "Exported deployment");

    Ok(ExportBundle {
        pipeline: build_pipeline(source_url, &build_params(app, image))?,
        deployment: Deployment::new(&app.name, replicas, container),
    })
}
