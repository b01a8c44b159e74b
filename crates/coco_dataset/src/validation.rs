//! Single-pass polygon integrity scan.

use crate::report::ReportAggregator;
use crate::source::{CocoIndex, RecordSource};
use crate::types::{DatasetResult, ScanOptions, ScanReport};
use data_contracts::validate_with_policy;
use std::path::Path;

/// Validate every record of `source` in order and collect the broken ones.
pub fn scan_records<S: RecordSource>(source: &S, options: &ScanOptions) -> DatasetResult<ScanReport> {
    let mut aggregator = ReportAggregator::new(options);
    for record in source.list_annotations() {
        match record.segmentation.polygons() {
            Some(polygons) => {
                let verdict = validate_with_policy(polygons, options.finite);
                aggregator.observe(source, record, verdict)?;
            }
            None => aggregator.skip_rle(),
        }
    }
    let report = aggregator.finish();
    tracing::info!(
        scanned = report.total_scanned,
        invalid = report.invalid_count(),
        skipped_rle = report.skipped_rle,
        unresolved_images = report.unresolved_images,
        "polygon scan complete"
    );
    Ok(report)
}

pub fn scan_file(path: &Path, options: &ScanOptions) -> DatasetResult<ScanReport> {
    let index = CocoIndex::from_path(path)?;
    scan_records(&index, options)
}
