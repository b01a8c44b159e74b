//! Core types, error definitions, and report structures for coco_dataset.

use data_contracts::{AnnotationId, FinitePolicy, ImageId, InvalidReason};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

pub type DatasetResult<T> = Result<T, DatasetError>;

/// Rows rendered by default; the full entry list is always kept.
pub const DEFAULT_REPORT_LIMIT: usize = 30;

/// File name reported when an annotation's image cannot be resolved.
pub const UNKNOWN_IMAGE: &str = "<unknown>";

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("json parse error at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("malformed COCO file at {path}: {msg}")]
    Schema { path: PathBuf, msg: String },
    #[error("image {image_id} not found in the image index")]
    MissingImage { image_id: ImageId },
}

/// What to do when an invalid annotation points at an unknown image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingImagePolicy {
    /// Abort the scan; the dataset is corrupt.
    #[default]
    Fail,
    /// Report the entry under `<unknown>` and keep going.
    Sentinel,
}

impl MissingImagePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissingImagePolicy::Fail => "fail",
            MissingImagePolicy::Sentinel => "sentinel",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanOptions {
    /// Maximum number of rows rendered in the text table.
    pub limit: usize,
    pub finite: FinitePolicy,
    pub missing_image: MissingImagePolicy,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_REPORT_LIMIT,
            finite: FinitePolicy::default(),
            missing_image: MissingImagePolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub annotation_id: AnnotationId,
    pub file_name: String,
    pub reason: InvalidReason,
}

/// Outcome of one scan. Entries are in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    /// Annotation records seen, including RLE ones.
    pub total_scanned: usize,
    /// Records whose segmentation is an RLE mask rather than polygons.
    pub skipped_rle: usize,
    /// Entries whose image was replaced by `<unknown>`.
    pub unresolved_images: usize,
    pub limit: usize,
    pub entries: Vec<ReportEntry>,
}

impl ScanReport {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            ..Default::default()
        }
    }

    pub fn invalid_count(&self) -> usize {
        self.entries.len()
    }

    /// Entries that make it into the rendered table.
    pub fn shown(&self) -> &[ReportEntry] {
        &self.entries[..self.entries.len().min(self.limit)]
    }

    pub fn counts_by_reason(&self) -> BTreeMap<InvalidReason, usize> {
        let mut counts = BTreeMap::new();
        for entry in &self.entries {
            *counts.entry(entry.reason).or_insert(0) += 1;
        }
        counts
    }
}
