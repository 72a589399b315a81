//! `kf-export instances`

use anyhow::Result;
use manifest_lib::derive_instances;

use super::{select_app, AppArgs, CommandContext, LoadedManifest};
use crate::output::{color_state, print_structured, print_table, FieldRow, OutputFormat};

/// Print whether an app runs and how many replicas it asks for
pub fn show_instances(ctx: &CommandContext, args: &AppArgs) -> Result<()> {
    let loaded = LoadedManifest::load(&args.manifest)?;
    let app = select_app(&loaded.manifest, args.app.as_deref())?;

    let instances = ctx.metrics.track(&loaded.logger, &app.name, "instances", || {
        Ok(derive_instances(app))
    })?;

    match ctx.format {
        OutputFormat::Table => {
            let replicas = instances
                .replicas
                .map(|r| r.to_string())
                .unwrap_or_else(|| "unset".to_string());
            print_table(vec![
                FieldRow::new("App", &app.name),
                FieldRow::new("State", color_state(instances.stopped)),
                FieldRow::new("Replicas", replicas),
            ]);
        }
        format => print_structured(&instances, format)?,
    }

    Ok(())
}
