//! Instance and replica derivation

use crate::models::{ApplicationManifest, InstanceSpec};

/// Derive whether the app runs and how many replicas it asks for
///
/// A task app is always stopped and carries no replica count. A no-start
/// app is stopped but keeps its declared count so a later start scales to
/// it. The count is left unset whenever the manifest doesn't declare one.
pub fn derive_instances(app: &ApplicationManifest) -> InstanceSpec {
    if app.task.unwrap_or(false) {
        return InstanceSpec {
            stopped: true,
            replicas: None,
        };
    }

    InstanceSpec {
        stopped: app.no_start.unwrap_or(false),
        replicas: app.instances,
    }
}
