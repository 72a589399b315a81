//! Manifest conversion library
//!
//! Converts CF-style application manifests into deployable container
//! descriptors:
//! - Legacy size units to binary SI quantities
//! - Resource requests and limits, with space-level CPU defaults
//! - Health checks to readiness/liveness probes
//! - Container assembly and instance derivation
//! - Export as a plain Kubernetes Deployment with a Tekton build pipeline
//!
//! Every conversion is a pure function over owned values.

pub mod container;
pub mod error;
pub mod export;
pub mod health;
pub mod instances;
pub mod models;
pub mod observability;
pub mod quantity;
pub mod resources;

pub use container::assemble_container;
pub use error::{ConversionError, Result};
pub use export::{export_deployment, BuildPipeline, ExportBundle, ExportOptions};
pub use health::{compile_health_check, HealthCheckType};
pub use instances::derive_instances;
pub use models::*;
pub use observability::{ConversionMetrics, StructuredLogger};
pub use quantity::{cf_to_si_units, Quantity, QuantityError};
pub use resources::build_resource_requests;
