//! Collecting invalid annotations and rendering the scan report.

use crate::source::RecordSource;
use crate::types::{
    DatasetError, DatasetResult, MissingImagePolicy, ReportEntry, ScanOptions, ScanReport,
    UNKNOWN_IMAGE,
};
use data_contracts::{AnnotationRecord, ValidationVerdict};
use std::fmt::Write as _;

/// Folds `(record, verdict)` pairs into a `ScanReport`, resolving file names
/// for the invalid ones.
#[derive(Debug)]
pub struct ReportAggregator {
    report: ScanReport,
    missing_image: MissingImagePolicy,
}

impl ReportAggregator {
    pub fn new(options: &ScanOptions) -> Self {
        Self {
            report: ScanReport::new(options.limit),
            missing_image: options.missing_image,
        }
    }

    pub fn observe<S: RecordSource>(
        &mut self,
        source: &S,
        record: &AnnotationRecord,
        verdict: ValidationVerdict,
    ) -> DatasetResult<()> {
        self.report.total_scanned += 1;
        let Some(reason) = verdict.reason() else {
            return Ok(());
        };
        let file_name = match source.resolve_image_name(record.image_ref) {
            Ok(name) => name.to_string(),
            Err(DatasetError::MissingImage { image_id })
                if self.missing_image == MissingImagePolicy::Sentinel =>
            {
                tracing::warn!(
                    annotation_id = %record.id,
                    %image_id,
                    "annotation references an unknown image"
                );
                self.report.unresolved_images += 1;
                UNKNOWN_IMAGE.to_string()
            }
            Err(e) => return Err(e),
        };
        tracing::debug!(annotation_id = %record.id, %file_name, %reason, "invalid segmentation");
        self.report.entries.push(ReportEntry {
            annotation_id: record.id,
            file_name,
            reason,
        });
        Ok(())
    }

    /// Count a record whose segmentation is an RLE mask.
    pub fn skip_rle(&mut self) {
        self.report.total_scanned += 1;
        self.report.skipped_rle += 1;
    }

    pub fn finish(self) -> ScanReport {
        self.report
    }
}

impl ScanReport {
    pub fn summary_line(&self) -> String {
        format!("Found {} broken annotations", self.invalid_count())
    }

    /// Summary line followed by at most `limit` table rows.
    pub fn render_text(&self) -> String {
        let mut out = self.summary_line();
        out.push('\n');
        for entry in self.shown() {
            let _ = writeln!(
                out,
                "{:>8}  {:<40}  -> {}",
                entry.annotation_id, entry.file_name, entry.reason
            );
        }
        out
    }

    pub fn render_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
