//! Core data models for manifest conversion
//!
//! Input types mirror the CF/Kf manifest keys so they deserialize straight
//! from a parsed manifest file. Output types are a narrow subset of the
//! Kubernetes container schema, holding only the fields the converter
//! writes.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{ConversionError, Result};
use crate::quantity::Quantity;

/// A manifest file holding one or more applications
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub applications: Vec<ApplicationManifest>,
}

impl Manifest {
    /// Find an application by name
    pub fn app(&self, name: &str) -> Result<&ApplicationManifest> {
        self.applications
            .iter()
            .find(|app| app.name == name)
            .ok_or_else(|| ConversionError::AppNotFound {
                name: name.to_string(),
            })
    }
}

/// One application's declared deployment shape
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationManifest {
    pub name: String,

    /// Memory in the legacy dialect, e.g. `512M`
    #[serde(skip_serializing_if = "String::is_empty")]
    pub memory: String,

    /// Ephemeral disk in the legacy dialect, e.g. `1G`
    #[serde(skip_serializing_if = "String::is_empty")]
    pub disk_quota: String,

    /// CPU request, e.g. `200m`
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cpu: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub instances: Option<i32>,

    #[serde(rename = "no-start", skip_serializing_if = "Option::is_none")]
    pub no_start: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<bool>,

    #[serde(
        deserialize_with = "deserialize_env",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub env: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<AppPort>,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub entrypoint: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    #[serde(rename = "health-check-type", skip_serializing_if = "String::is_empty")]
    pub health_check_type: String,

    #[serde(
        rename = "health-check-http-endpoint",
        skip_serializing_if = "String::is_empty"
    )]
    pub health_check_http_endpoint: String,

    /// Health check timeout in seconds, `0` means platform default
    #[serde(rename = "timeout", skip_serializing_if = "is_zero")]
    pub health_check_timeout: i32,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub buildpacks: Vec<String>,

    /// Legacy single-buildpack key
    #[serde(skip_serializing_if = "String::is_empty")]
    pub buildpack: String,
}

fn is_zero(value: &i32) -> bool {
    *value == 0
}

/// Manifests often write env values as bare numbers or booleans, or leave
/// them empty (`KEY:`), which reads as an empty string
fn deserialize_env<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum EnvValue {
        String(String),
        Integer(i64),
        Float(f64),
        Bool(bool),
        Null,
    }

    let raw = BTreeMap::<String, EnvValue>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                EnvValue::String(s) => s,
                EnvValue::Integer(i) => i.to_string(),
                EnvValue::Float(f) => f.to_string(),
                EnvValue::Bool(b) => b.to_string(),
                EnvValue::Null => String::new(),
            };
            (key, value)
        })
        .collect())
}

impl ApplicationManifest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Declared buildpacks, merging the legacy singular key
    pub fn declared_buildpacks(&self) -> Vec<String> {
        if !self.buildpacks.is_empty() {
            return self.buildpacks.clone();
        }
        if self.buildpack.is_empty() {
            Vec::new()
        } else {
            vec![self.buildpack.clone()]
        }
    }
}

/// Application-level protocol of a declared port
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortProtocol {
    Http,
    Http2,
    #[default]
    Tcp,
}

impl PortProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            PortProtocol::Http => "http",
            PortProtocol::Http2 => "http2",
            PortProtocol::Tcp => "tcp",
        }
    }

    /// Transport protocol the port is exposed with
    pub fn transport(&self) -> TransportProtocol {
        TransportProtocol::Tcp
    }
}

impl fmt::Display for PortProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A port declared in the manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppPort {
    pub port: i32,
    #[serde(default)]
    pub protocol: PortProtocol,
}

/// Space-level policy filling gaps in an app's resource declarations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeDefaults {
    /// Floor applied to every app's CPU
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_cpu_min: Option<Quantity>,

    /// CPU granted per GiB of requested memory when no CPU is declared
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_cpu_per_gb_of_ram: Option<Quantity>,
}

/// Resource kinds the converter can populate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceName {
    #[serde(rename = "cpu")]
    Cpu,
    #[serde(rename = "memory")]
    Memory,
    #[serde(rename = "ephemeral-storage")]
    EphemeralStorage,
}

impl ResourceName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceName::Cpu => "cpu",
            ResourceName::Memory => "memory",
            ResourceName::EphemeralStorage => "ephemeral-storage",
        }
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resource kind to quantity, ordered for stable output
pub type ResourceList = BTreeMap<ResourceName, Quantity>;

/// Requests and limits of a container
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceRequirements {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requests: Option<ResourceList>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limits: Option<ResourceList>,
}

impl ResourceRequirements {
    /// Requests and limits set to the same values
    pub fn uniform(list: Option<ResourceList>) -> Self {
        Self {
            requests: list.clone(),
            limits: list,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_none() && self.limits.is_none()
    }
}

/// Transport-layer protocol of a container port
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportProtocol {
    #[default]
    #[serde(rename = "TCP")]
    Tcp,
    #[serde(rename = "UDP")]
    Udp,
}

/// A named port exposed by the container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerPort {
    pub name: String,
    pub container_port: i32,
    /// Unset leaves the platform default, TCP
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<TransportProtocol>,
}

/// Environment variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

/// How the platform checks the container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProbeHandler {
    /// HTTP GET; an absent path means `/`
    HttpGet {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        port: Option<i32>,
    },
    /// TCP connect
    TcpSocket {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        port: Option<i32>,
    },
}

impl ProbeHandler {
    pub fn kind(&self) -> &'static str {
        match self {
            ProbeHandler::HttpGet { .. } => "http",
            ProbeHandler::TcpSocket { .. } => "port",
        }
    }

    /// Point the check at a specific port
    pub fn set_port(&mut self, target: i32) {
        match self {
            ProbeHandler::HttpGet { port, .. } | ProbeHandler::TcpSocket { port } => {
                *port = Some(target)
            }
        }
    }
}

/// Compiled health probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Probe {
    #[serde(flatten)]
    pub handler: ProbeHandler,
    /// `0` leaves the platform default in place
    #[serde(default, skip_serializing_if = "is_zero")]
    pub timeout_seconds: i32,
    pub success_threshold: i32,
}

impl Probe {
    /// Path an HTTP probe requests, `None` for TCP probes
    pub fn http_path(&self) -> Option<&str> {
        match &self.handler {
            ProbeHandler::HttpGet { path, .. } => Some(path.as_deref().unwrap_or("/")),
            ProbeHandler::TcpSocket { .. } => None,
        }
    }
}

/// Deployable container descriptor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSpec {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<ContainerPort>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
    #[serde(default, skip_serializing_if = "ResourceRequirements::is_empty")]
    pub resources: ResourceRequirements,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readiness_probe: Option<Probe>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liveness_probe: Option<Probe>,
}

/// Whether an app runs and how many copies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceSpec {
    #[serde(default)]
    pub stopped: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,
}
