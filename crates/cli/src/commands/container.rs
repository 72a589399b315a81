//! `kf-export container`

use anyhow::Result;
use manifest_lib::assemble_container;

use super::{select_app, AppArgs, CommandContext, LoadedManifest};
use crate::output::{container_rows, print_structured, print_table, OutputFormat};

/// Print the container assembled for an app
pub fn show_container(ctx: &CommandContext, args: &AppArgs) -> Result<()> {
    let loaded = LoadedManifest::load(&args.manifest)?;
    let app = select_app(&loaded.manifest, args.app.as_deref())?;

    let container = ctx.metrics.track(&loaded.logger, &app.name, "container", || {
        assemble_container(app, &ctx.runtime)
    })?;
    ctx.metrics.record_probe(&container);

    match ctx.format {
        OutputFormat::Table => {
            println!("Container for app {}", app.name);
            print_table(container_rows(&container));
        }
        format => print_structured(&container, format)?,
    }

    Ok(())
}
