//! Plain Kubernetes Deployment types for export
//!
//! Only the fields the exporter writes are modelled.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::ContainerSpec;

/// Label selecting an exported app's pods
pub const APP_LABEL: &str = "app";

/// Object metadata
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Prefix the API server completes into a unique name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub generate_name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

impl ObjectMeta {
    /// Metadata named after the app, labelled for selection
    pub fn for_app(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            labels: app_labels(&name),
            name,
            ..Default::default()
        }
    }
}

/// Labels identifying an app's pods
pub fn app_labels(name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([(APP_LABEL.to_string(), name.to_string())])
}

/// Label selector
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelector {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub match_labels: BTreeMap<String, String>,
}

/// Pod spec
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct PodSpec {
    pub containers: Vec<ContainerSpec>,
}

/// Pod template
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct PodTemplateSpec {
    pub metadata: ObjectMeta,
    pub spec: PodSpec,
}

/// Deployment spec
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct DeploymentSpec {
    pub replicas: i32,
    pub selector: LabelSelector,
    pub template: PodTemplateSpec,
}

/// Kubernetes Deployment
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: DeploymentSpec,
}

impl Deployment {
    /// Deployment running `replicas` copies of a single container
    pub fn new(name: impl Into<String>, replicas: i32, container: ContainerSpec) -> Self {
        let name = name.into();
        Self {
            api_version: "apps/v1".to_string(),
            kind: "Deployment".to_string(),
            metadata: ObjectMeta::for_app(&name),
            spec: DeploymentSpec {
                replicas,
                selector: LabelSelector {
                    match_labels: app_labels(&name),
                },
                template: PodTemplateSpec {
                    metadata: ObjectMeta {
                        labels: app_labels(&name),
                        ..Default::default()
                    },
                    spec: PodSpec {
                        containers: vec![container],
                    },
                },
            },
        }
    }

    /// The single container this deployment runs
    pub fn container(&self) -> Option<&ContainerSpec> {
        self.spec.template.spec.containers.first()
    }
}
