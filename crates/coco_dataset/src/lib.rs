//! COCO annotation loading and polygon integrity scanning.
//!
//! This crate provides:
//! - A `RecordSource` abstraction over annotation stores
//! - `CocoIndex`, a file-backed source for COCO instance JSON
//! - A single-pass scanner that collects malformed polygon segmentations
//! - Report rendering (text table or JSON)

pub mod report;
pub mod source;
pub mod types;
pub mod validation;

pub use report::ReportAggregator;
pub use source::{CocoIndex, RecordSource};
pub use types::*;
pub use validation::{scan_file, scan_records};
