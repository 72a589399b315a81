//! `kf-export deployment`

use anyhow::Result;
use manifest_lib::{export_deployment, ExportBundle, ExportOptions};

use super::{select_app, AppArgs, CommandContext, LoadedManifest};
use crate::output::{
    container_rows, print_documents, print_info, print_structured, print_table, print_warning,
    FieldRow, OutputFormat,
};

/// Print an app exported as a Deployment with the pipeline building its image
pub fn export(ctx: &CommandContext, args: &AppArgs, options: &ExportOptions<'_>) -> Result<()> {
    let loaded = LoadedManifest::load(&args.manifest)?;
    let app = select_app(&loaded.manifest, args.app.as_deref())?;

    let bundle = ctx.metrics.track(&loaded.logger, &app.name, "deployment", || {
        export_deployment(app, &ctx.runtime, options)
    })?;

    match ctx.format {
        OutputFormat::Table => {
            if options.image.is_none() {
                print_warning("No --image given, the deployment uses a placeholder image");
            }
            if options.source_url.is_none() {
                print_warning("No --source-url given, the pipeline clones a placeholder repository");
            }
            let params: Vec<FieldRow> = bundle
                .pipeline
                .pipeline_run
                .spec
                .params
                .iter()
                .map(|p| FieldRow::new(&p.name, p.value.replace(',', "\n")))
                .collect();
            print_info(&format!(
                "Pipeline {} with build parameters",
                bundle.pipeline.pipeline.metadata.name
            ));
            print_table(params);

            print_info(&format!(
                "Deployment {} with {} replica(s)",
                bundle.deployment.metadata.name, bundle.deployment.spec.replicas
            ));
            if let Some(container) = bundle.deployment.container() {
                ctx.metrics.record_probe(container);
                print_table(container_rows(container));
            }
        }
        format => {
            if let Some(container) = bundle.deployment.container() {
                ctx.metrics.record_probe(container);
            }
            match format {
                OutputFormat::Yaml => print_documents(&documents(&bundle)?)?,
                format => print_structured(&bundle, format)?,
            }
        }
    }

    Ok(())
}

/// Every resource of the bundle, in apply order
fn documents(bundle: &ExportBundle) -> Result<Vec<serde_json::Value>> {
    Ok(vec![
        serde_json::to_value(&bundle.pipeline.clone_task)?,
        serde_json::to_value(&bundle.pipeline.pipeline)?,
        serde_json::to_value(&bundle.pipeline.pipeline_run)?,
        serde_json::to_value(&bundle.deployment)?,
    ])
}
