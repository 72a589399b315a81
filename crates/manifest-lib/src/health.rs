//! Health check compilation
//!
//! Maps a manifest's health check settings onto a single probe that is
//! used for both readiness and liveness.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ConversionError, Result};
use crate::models::{Probe, ProbeHandler};

/// Every produced probe succeeds after a single passing check
pub const SUCCESS_THRESHOLD: i32 = 1;

/// Health check types a manifest may declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthCheckType {
    /// TCP connect to the app's port, also the default
    Port,
    /// HTTP GET against an endpoint
    Http,
    /// Process liveness only, no probe
    Process,
    /// Alias of `Process`
    None,
}

impl HealthCheckType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthCheckType::Port => "port",
            HealthCheckType::Http => "http",
            HealthCheckType::Process => "process",
            HealthCheckType::None => "none",
        }
    }
}

impl FromStr for HealthCheckType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "" | "port" => Ok(HealthCheckType::Port),
            "http" => Ok(HealthCheckType::Http),
            "process" => Ok(HealthCheckType::Process),
            "none" => Ok(HealthCheckType::None),
            other => Err(ConversionError::InvalidHealthCheckType {
                check_type: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for HealthCheckType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compile health check settings into a probe
///
/// Checks run in order and stop at the first failure: the timeout must not
/// be negative, an endpoint is only allowed on `http`, and the type must be
/// known. `process` and `none` produce no probe.
pub fn compile_health_check(check_type: &str, endpoint: &str, timeout: i32) -> Result<Option<Probe>> {
    if timeout < 0 {
        return Err(ConversionError::NegativeTimeout { timeout });
    }

    if !endpoint.is_empty() && check_type != HealthCheckType::Http.as_str() {
        return Err(ConversionError::EndpointNotAllowed {
            check_type: check_type.to_string(),
        });
    }

    let handler = match check_type.parse::<HealthCheckType>()? {
        HealthCheckType::Process | HealthCheckType::None => return Ok(None),
        HealthCheckType::Http => ProbeHandler::HttpGet {
            path: (!endpoint.is_empty()).then(|| endpoint.to_string()),
            port: None,
        },
        HealthCheckType::Port => ProbeHandler::TcpSocket { port: None },
    };

    Ok(Some(Probe {
        handler,
        timeout_seconds: timeout,
        success_threshold: SUCCESS_THRESHOLD,
    }))
}
