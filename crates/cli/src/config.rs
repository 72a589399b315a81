//! Runtime defaults configuration

use anyhow::{Context, Result};
use manifest_lib::{Quantity, RuntimeDefaults};
use std::path::{Path, PathBuf};

/// Prefix of environment variables read as configuration, e.g. `KF_APP_CPU_MIN`
pub const ENV_PREFIX: &str = "KF";

/// Load the space runtime defaults
///
/// An explicit file must exist. Without one, `~/.config/kf-export/config.json`
/// is read if present. `KF_*` environment variables override file values.
pub fn load_runtime_defaults(explicit: Option<&Path>) -> Result<RuntimeDefaults> {
    let mut builder = config::Config::builder();

    match explicit {
        Some(path) => {
            builder = builder.add_source(config::File::from(path.to_path_buf()).required(true));
        }
        None => {
            if let Some(path) = default_config_path() {
                builder = builder.add_source(config::File::from(path).required(false));
            }
        }
    }

    let config = builder
        .add_source(config::Environment::with_prefix(ENV_PREFIX))
        .build()
        .context("Failed to load runtime defaults")?;

    config
        .try_deserialize()
        .context("Failed to parse runtime defaults")
}

/// Apply command-line overrides on top of loaded defaults
pub fn apply_overrides(
    mut runtime: RuntimeDefaults,
    cpu_min: Option<&str>,
    cpu_per_gb: Option<&str>,
) -> Result<RuntimeDefaults> {
    if let Some(raw) = cpu_min {
        runtime.app_cpu_min = Some(parse_flag("--cpu-min", raw)?);
    }
    if let Some(raw) = cpu_per_gb {
        runtime.app_cpu_per_gb_of_ram = Some(parse_flag("--cpu-per-gb", raw)?);
    }
    Ok(runtime)
}

fn parse_flag(flag: &str, raw: &str) -> Result<Quantity> {
    Quantity::parse(raw).with_context(|| format!("Invalid {flag} value {raw:?}"))
}

/// Get the default configuration file path
fn default_config_path() -> Option<PathBuf> {
    dirs_next::home_dir().map(|home| home.join(".config").join("kf-export").join("config.json"))
}
