//! Tekton resources that build and publish an app's image
//!
//! The bundle holds a git clone Task, the `build-and-publish` Pipeline that
//! clones the source and runs the buildpack build, and a PipelineRun
//! supplying the app's build parameters.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::deployment::ObjectMeta;
use super::BuildParam;
use crate::error::{ConversionError, Result};
use crate::quantity::Quantity;

pub const TEKTON_API_VERSION: &str = "tekton.dev/v1beta1";

pub const PIPELINE_NAME: &str = "build-and-publish";

/// Task cloning the app source into the shared workspace
pub const CLONE_TASK_NAME: &str = "git-clone";

/// Buildpack build Task installed alongside the platform
pub const BUILD_TASK_NAME: &str = "buildpacks-v2";

/// Workspace holding the cloned source
pub const SOURCE_WORKSPACE: &str = "source";

/// Size of the volume claimed for the source workspace
pub const SOURCE_WORKSPACE_SIZE: &str = "1Gi";

const CLONE_IMAGE: &str = "alpine/git";

const CLONE_SCRIPT: &str = r#"#!/bin/sh
set -eu
git clone "$(params.url)" "$(workspaces.output.path)"
"#;

/// Declared parameter of a Task or Pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl ParamSpec {
    fn string(name: &str, default: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            param_type: "string".to_string(),
            default: default.map(str::to_string),
        }
    }
}

/// Declared workspace of a Task or Pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceDeclaration {
    pub name: String,
}

/// Container step of a Task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub name: String,
    pub image: String,
    pub script: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub params: Vec<ParamSpec>,
    pub workspaces: Vec<WorkspaceDeclaration>,
    pub steps: Vec<Step>,
}

/// Tekton Task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: TaskSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRef {
    pub name: String,
}

/// Binds a task's workspace to one of the pipeline's
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspacePipelineTaskBinding {
    pub name: String,
    pub workspace: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineTask {
    pub name: String,
    pub task_ref: TaskRef,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub run_after: Vec<String>,
    pub params: Vec<BuildParam>,
    pub workspaces: Vec<WorkspacePipelineTaskBinding>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSpec {
    pub params: Vec<ParamSpec>,
    pub workspaces: Vec<WorkspaceDeclaration>,
    pub tasks: Vec<PipelineTask>,
}

/// Tekton Pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pipeline {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: PipelineSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeResourceRequirements {
    pub requests: BTreeMap<String, Quantity>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistentVolumeClaimSpec {
    pub access_modes: Vec<String>,
    pub resources: VolumeResourceRequirements,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeClaimTemplate {
    pub spec: PersistentVolumeClaimSpec,
}

/// Backs a pipeline workspace with a per-run volume
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceBinding {
    pub name: String,
    pub volume_claim_template: VolumeClaimTemplate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRunSpec {
    pub pipeline_ref: TaskRef,
    pub params: Vec<BuildParam>,
    pub workspaces: Vec<WorkspaceBinding>,
}

/// Tekton PipelineRun
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRun {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: PipelineRunSpec,
}

impl PipelineRun {
    /// Value the run passes for a parameter
    pub fn param(&self, name: &str) -> Option<&str> {
        self.spec
            .params
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }
}

/// Everything needed to build and publish the app's image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildPipeline {
    pub clone_task: Task,
    pub pipeline: Pipeline,
    pub pipeline_run: PipelineRun,
}

fn named(name: &str) -> ObjectMeta {
    ObjectMeta {
        name: name.to_string(),
        ..Default::default()
    }
}

fn bind(task_workspace: &str) -> WorkspacePipelineTaskBinding {
    WorkspacePipelineTaskBinding {
        name: task_workspace.to_string(),
        workspace: SOURCE_WORKSPACE.to_string(),
    }
}

fn param(name: &str, value: impl Into<String>) -> BuildParam {
    BuildParam {
        name: name.to_string(),
        value: value.into(),
    }
}

/// The Task cloning a git repository into its `output` workspace
pub fn make_clone_task() -> Task {
    Task {
        api_version: TEKTON_API_VERSION.to_string(),
        kind: "Task".to_string(),
        metadata: named(CLONE_TASK_NAME),
        spec: TaskSpec {
            params: vec![ParamSpec::string("url", None)],
            workspaces: vec![WorkspaceDeclaration {
                name: "output".to_string(),
            }],
            steps: vec![Step {
                name: "clone".to_string(),
                image: CLONE_IMAGE.to_string(),
                script: CLONE_SCRIPT.to_string(),
            }],
        },
    }
}

/// Pipeline cloning `source_url` and building it with the given parameters
///
/// The build parameters become pipeline parameters defaulting to their
/// values, and the build task reads them through `$(params.<name>)`.
pub fn make_pipeline_spec(source_url: &str, build_params: &[BuildParam]) -> PipelineSpec {
    let fetch = PipelineTask {
        name: "fetch-source".to_string(),
        task_ref: TaskRef {
            name: CLONE_TASK_NAME.to_string(),
        },
        run_after: Vec::new(),
        params: vec![param("url", source_url)],
        workspaces: vec![bind("output")],
    };

    let build = PipelineTask {
        name: "build-and-push".to_string(),
        task_ref: TaskRef {
            name: BUILD_TASK_NAME.to_string(),
        },
        run_after: vec![fetch.name.clone()],
        params: build_params
            .iter()
            .map(|p| param(&p.name, format!("$(params.{})", p.name)))
            .collect(),
        workspaces: vec![bind(SOURCE_WORKSPACE)],
    };

    PipelineSpec {
        params: build_params
            .iter()
            .map(|p| ParamSpec::string(&p.name, Some(&p.value)))
            .collect(),
        workspaces: vec![WorkspaceDeclaration {
            name: SOURCE_WORKSPACE.to_string(),
        }],
        tasks: vec![fetch, build],
    }
}

/// A run of the pipeline passing every parameter it declares
pub fn make_pipeline_run(spec: &PipelineSpec) -> Result<PipelineRun> {
    let size = Quantity::parse(SOURCE_WORKSPACE_SIZE).map_err(|reason| {
        ConversionError::QuantityParse {
            raw: SOURCE_WORKSPACE_SIZE.to_string(),
            reason,
        }
    })?;

    let workspaces = spec
        .workspaces
        .iter()
        .map(|ws| WorkspaceBinding {
            name: ws.name.clone(),
            volume_claim_template: VolumeClaimTemplate {
                spec: PersistentVolumeClaimSpec {
                    access_modes: vec!["ReadWriteOnce".to_string()],
                    resources: VolumeResourceRequirements {
                        requests: BTreeMap::from([("storage".to_string(), size)]),
                    },
                },
            },
        })
        .collect();

    Ok(PipelineRun {
        api_version: TEKTON_API_VERSION.to_string(),
        kind: "PipelineRun".to_string(),
        metadata: ObjectMeta {
            generate_name: format!("{PIPELINE_NAME}-run-"),
            ..Default::default()
        },
        spec: PipelineRunSpec {
            pipeline_ref: TaskRef {
                name: PIPELINE_NAME.to_string(),
            },
            params: spec
                .params
                .iter()
                .map(|p| param(&p.name, p.default.clone().unwrap_or_default()))
                .collect(),
            workspaces,
        },
    })
}

/// Clone task, pipeline and run for an app's build parameters
pub fn build_pipeline(source_url: &str, build_params: &[BuildParam]) -> Result<BuildPipeline> {
    let spec = make_pipeline_spec(source_url, build_params);
    let pipeline_run = make_pipeline_run(&spec)?;

    Ok(BuildPipeline {
        clone_task: make_clone_task(),
        pipeline: Pipeline {
            api_version: TEKTON_API_VERSION.to_string(),
            kind: "Pipeline".to_string(),
            metadata: named(PIPELINE_NAME),
            spec,
        },
        pipeline_run,
    })
}
