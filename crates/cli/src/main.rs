//! Kf manifest export CLI
//!
//! Converts application manifests into container specs and plain
//! Kubernetes Deployments, applying the space's runtime defaults.

mod commands;
mod config;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commands::{container, deployment, instances, normalize, AppArgs, CommandContext};
use manifest_lib::{ConversionMetrics, ExportOptions, StructuredLogger};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Kf manifest export CLI
#[derive(Parser)]
#[command(name = "kf-export")]
#[command(author, version, about = "Export Kf application manifests as Kubernetes resources", long_about = None)]
pub struct Cli {
    /// Runtime defaults file (JSON, YAML or TOML)
    #[arg(long, env = "KF_EXPORT_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Minimum CPU for every app, overrides the config file
    #[arg(long, global = true)]
    pub cpu_min: Option<String>,

    /// CPU per GiB of memory for apps without a CPU request
    #[arg(long, global = true)]
    pub cpu_per_gb: Option<String>,

    /// Output format
    #[arg(long, short = 'o', default_value = "table", global = true)]
    pub format: output::OutputFormat,

    /// Write Prometheus metrics to this file when done
    #[arg(long, global = true)]
    pub metrics_file: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the container assembled for an app
    Container(AppArgs),

    /// Show whether an app runs and its replica count
    Instances(AppArgs),

    /// Export an app as a Deployment and the Tekton pipeline building it
    Deployment {
        #[command(flatten)]
        app: AppArgs,

        /// Image the pipeline publishes and the Deployment runs
        #[arg(long)]
        image: Option<String>,

        /// Git repository the pipeline builds from
        #[arg(long)]
        source_url: Option<String>,
    },

    /// Convert legacy size strings such as 512M to binary SI units
    Normalize {
        /// Size strings to convert
        #[arg(required = true)]
        quantities: Vec<String>,
    },
}

fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| fmt::layer().with_writer(std::io::stderr)))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let runtime = config::load_runtime_defaults(cli.config.as_deref())?;
    let runtime = config::apply_overrides(runtime, cli.cpu_min.as_deref(), cli.cpu_per_gb.as_deref())?;
    info!(
        app_cpu_min = ?runtime.app_cpu_min.map(|q| q.to_string()),
        app_cpu_per_gb_of_ram = ?runtime.app_cpu_per_gb_of_ram.map(|q| q.to_string()),
        "Runtime defaults loaded"
    );

    let ctx = CommandContext {
        runtime,
        metrics: ConversionMetrics::new(),
        format: cli.format,
    };
    StructuredLogger::new("kf-export").log_startup(VERSION);

    // Execute command
    let result = match &cli.command {
        Commands::Container(args) => container::show_container(&ctx, args),
        Commands::Instances(args) => instances::show_instances(&ctx, args),
        Commands::Deployment {
            app,
            image,
            source_url,
        } => {
            let options = ExportOptions {
                image: image.as_deref(),
                source_url: source_url.as_deref(),
            };
            deployment::export(&ctx, app, &options)
        }
        Commands::Normalize { quantities } => normalize::show_normalized(quantities, cli.format),
    };

    if let Some(path) = &cli.metrics_file {
        std::fs::write(path, ctx.metrics.gather_text())
            .with_context(|| format!("Failed to write metrics to {}", path.display()))?;
    }

    result
}
