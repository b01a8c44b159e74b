use std::io::Write;

use anyhow::Context;
use clap::Parser;
use cli_support::common::{OutputFormat, ScanArgs};
use coco_dataset::{scan_records, CocoIndex};
use coco_tools::ToolConfig;

#[derive(Parser, Debug)]
#[command(
    name = "validate_polygons",
    about = "Scan a COCO annotation file for malformed polygon segmentations"
)]
struct Args {
    #[command(flatten)]
    scan: ScanArgs,
}

fn main() -> anyhow::Result<()> {
    coco_tools::init_logging();
    let args = Args::parse();
    let cfg = ToolConfig::load();

    let path = args.scan.annotations.clone().unwrap_or(cfg.annotations);
    let options = args.scan.apply(cfg.scan);
    tracing::info!(
        path = %path.display(),
        limit = options.limit,
        finite = options.finite.as_str(),
        missing_image = options.missing_image.as_str(),
        "scanning annotations"
    );

    let index = CocoIndex::from_path(&path)
        .with_context(|| format!("loading annotations from {}", path.display()))?;
    tracing::info!(
        path = %index.path().display(),
        annotations = index.annotation_count(),
        images = index.image_count(),
        "annotation index loaded"
    );
    let report = scan_records(&index, &options)
        .with_context(|| format!("scanning {}", path.display()))?;

    for (reason, count) in report.counts_by_reason() {
        tracing::info!(%reason, count, "invalid annotations by reason");
    }

    let rendered = match args.scan.format {
        OutputFormat::Text => report.render_text(),
        OutputFormat::Json => {
            let mut json = report.render_json().context("serializing report")?;
            json.push('\n');
            json
        }
    };
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(rendered.as_bytes())
        .context("writing report")?;
    stdout.flush().context("writing report")?;
    Ok(())
}
