use crate::app::App;
use crate::error::Result;
use crate::export::{DownloadArea, ExportEndpoint, ExportOptions, Exporter};

use super::ExportArgs;

/// Export one entity and report where it was saved.
pub async fn run_export(app: &App, args: ExportArgs) -> Result<()> {
    let dir = args.out.unwrap_or_else(|| app.config.download_dir());
    let endpoint = if args.per_entity {
        ExportEndpoint::PerEntity
    } else {
        ExportEndpoint::Unified
    };
    let exporter =
        Exporter::new(app.client.clone(), DownloadArea::new(dir)).with_endpoint(endpoint);

    let options = ExportOptions::new(args.history, args.comments);
    eprintln!(
        "tms: exporting {} {}{}{}...",
        args.entity_type,
        args.id,
        if options.include_history { " +history" } else { "" },
        if options.include_comments { " +comments" } else { "" },
    );

    let path = exporter
        .export_entity(args.entity_type, &args.id, options)
        .await?;
    eprintln!("tms: saved {}", path.display());
    Ok(())
}
