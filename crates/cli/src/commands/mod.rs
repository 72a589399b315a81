//! Subcommand implementations

pub mod container;
pub mod deployment;
pub mod instances;
pub mod normalize;

use anyhow::{bail, Context, Result};
use clap::Args;
use manifest_lib::{ApplicationManifest, ConversionMetrics, Manifest, RuntimeDefaults, StructuredLogger};
use std::path::{Path, PathBuf};

use crate::output::OutputFormat;

/// Manifest and app selection shared by the per-app commands
#[derive(Args, Debug, Clone)]
pub struct AppArgs {
    /// Path to the manifest file
    #[arg(long, short = 'f', default_value = "manifest.yml")]
    pub manifest: PathBuf,

    /// App to convert (may be omitted when the manifest has exactly one)
    #[arg(long, short)]
    pub app: Option<String>,
}

/// State shared by every command
pub struct CommandContext {
    pub runtime: RuntimeDefaults,
    pub metrics: ConversionMetrics,
    pub format: OutputFormat,
}

/// A loaded manifest and the logger tagged with its path
pub struct LoadedManifest {
    pub manifest: Manifest,
    pub logger: StructuredLogger,
}

impl LoadedManifest {
    pub fn load(path: &Path) -> Result<Self> {
        let manifest = load_manifest(path)?;
        Ok(Self {
            manifest,
            logger: StructuredLogger::new(path.display().to_string()),
        })
    }
}

/// Read and parse a manifest file (YAML, or JSON as a subset of it)
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse manifest {}", path.display()))
}

/// Pick the app to convert
pub fn select_app<'a>(manifest: &'a Manifest, name: Option<&str>) -> Result<&'a ApplicationManifest> {
    if let Some(name) = name {
        return Ok(manifest.app(name)?);
    }

    match manifest.applications.as_slice() {
        [only] => Ok(only),
        [] => bail!("the manifest doesn't contain any apps"),
        apps => {
            let names: Vec<_> = apps.iter().map(|a| a.name.as_str()).collect();
            bail!(
                "the manifest contains {} apps, pick one with --app ({})",
                apps.len(),
                names.join(", ")
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(names: &[&str]) -> Manifest {
        Manifest {
            applications: names.iter().map(|n| ApplicationManifest::new(*n)).collect(),
        }
    }

    #[test]
    fn test_single_app_selected_implicitly() {
        let m = manifest(&["only"]);
        assert_eq!(select_app(&m, None).unwrap().name, "only");
    }

    #[test]
    fn test_multiple_apps_need_a_name() {
        let m = manifest(&["a", "b"]);

        let err = select_app(&m, None).unwrap_err();
        assert!(err.to_string().contains("pick one with --app (a, b)"));
        assert_eq!(select_app(&m, Some("b")).unwrap().name, "b");
    }

    #[test]
    fn test_unknown_app_and_empty_manifest() {
        let m = manifest(&["a"]);
        assert!(select_app(&m, Some("zzz")).is_err());
        assert!(select_app(&manifest(&[]), None).is_err());
    }

    #[test]
    fn test_load_manifest_reports_path() {
        let err = load_manifest(Path::new("/nonexistent/manifest.yml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/manifest.yml"));
    }
}
