//! End-to-end scans over COCO files written to a temp dir.

use coco_dataset::{
    scan_file, scan_records, CocoIndex, DatasetError, DatasetResult, MissingImagePolicy,
    RecordSource, ScanOptions, UNKNOWN_IMAGE,
};
use data_contracts::{
    AnnotationId, AnnotationRecord, FinitePolicy, ImageId, InvalidReason, Polygon, Segmentation,
};
use std::fs;
use std::path::{Path, PathBuf};

const ONE_TRIANGLE: &str = "[[0, 0, 1, 0, 1, 1]]";
const TRIANGLE_THEN_SHORT: &str = "[[0, 0, 1, 0, 1, 1], [2, 2, 3]]";

fn write_coco(dir: &Path, annotations: &[(u64, u64, &str)]) -> anyhow::Result<PathBuf> {
    let anns: Vec<String> = annotations
        .iter()
        .map(|(id, image_id, seg)| {
            format!(r#"{{"id": {id}, "image_id": {image_id}, "category_id": 1, "iscrowd": 0, "segmentation": {seg}}}"#)
        })
        .collect();
    let body = format!(
        r#"{{
  "info": {{"description": "synthetic"}},
  "images": [
    {{"id": 1, "file_name": "0001.jpg", "width": 64, "height": 48}},
    {{"id": 2, "file_name": "0002.jpg", "width": 64, "height": 48}}
  ],
  "annotations": [{}],
  "categories": [{{"id": 1, "name": "damage"}}]
}}"#,
        anns.join(",\n    ")
    );
    let path = dir.join("instances_train.json");
    fs::write(&path, body)?;
    Ok(path)
}

fn options(limit: usize) -> ScanOptions {
    ScanOptions {
        limit,
        ..ScanOptions::default()
    }
}

#[test]
fn mixed_dataset_reports_each_reason_in_order() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = write_coco(
        tmp.path(),
        &[
            (10, 1, ONE_TRIANGLE),
            (11, 2, "[]"),
            (12, 1, "[[1, 2, 3, 4, 5]]"),
            (13, 2, "[[0, 0, 1, 0, NaN, 1]]"),
            (14, 1, TRIANGLE_THEN_SHORT),
        ],
    )?;

    let report = scan_file(&path, &ScanOptions::default())?;
    assert_eq!(report.total_scanned, 5);
    let rows: Vec<_> = report
        .entries
        .iter()
        .map(|e| (e.annotation_id.0, e.file_name.as_str(), e.reason))
        .collect();
    assert_eq!(
        rows,
        vec![
            (11, "0002.jpg", InvalidReason::Empty),
            (12, "0001.jpg", InvalidReason::BadLength),
            (13, "0002.jpg", InvalidReason::NonFinite),
            (14, "0001.jpg", InvalidReason::BadLength),
        ]
    );
    Ok(())
}

#[test]
fn limit_truncates_table_but_not_count() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = write_coco(
        tmp.path(),
        &[(1, 1, "[]"), (2, 1, "[[1]]"), (3, 2, "[]"), (4, 2, ONE_TRIANGLE)],
    )?;

    let report = scan_file(&path, &options(2))?;
    assert_eq!(report.invalid_count(), 3);
    assert_eq!(report.shown().len(), 2);

    let text = report.render_text();
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "Found 3 broken annotations");
    assert!(lines[1].trim_start().starts_with("1 "));
    assert!(lines[2].trim_start().starts_with("2 "));
    Ok(())
}

#[test]
fn zero_limit_still_counts() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = write_coco(tmp.path(), &[(1, 1, "[]"), (2, 1, "[]")])?;
    let report = scan_file(&path, &options(0))?;
    assert_eq!(report.invalid_count(), 2);
    assert_eq!(report.render_text(), "Found 2 broken annotations\n");
    Ok(())
}

#[test]
fn rescanning_is_idempotent() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = write_coco(
        tmp.path(),
        &[(5, 2, "[[Infinity, 0, 1, NaN, 2, 2]]"), (6, 1, "[]"), (7, 1, "[[0, 0]]")],
    )?;
    let first = scan_file(&path, &ScanOptions::default())?;
    let second = scan_file(&path, &ScanOptions::default())?;
    assert_eq!(first, second);
    assert_eq!(first.render_text(), second.render_text());
    Ok(())
}

#[test]
fn infinity_only_flagged_under_strict_policy() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = write_coco(tmp.path(), &[(1, 1, "[[0, 0, Infinity, 0, 1, -Infinity]]")])?;

    let lenient = scan_file(&path, &ScanOptions::default())?;
    assert_eq!(lenient.invalid_count(), 0);

    let strict = scan_file(
        &path,
        &ScanOptions {
            finite: FinitePolicy::RejectInfinite,
            ..ScanOptions::default()
        },
    )?;
    assert_eq!(strict.entries[0].reason, InvalidReason::NonFinite);
    Ok(())
}

#[test]
fn null_and_blank_object_segmentations_are_empty() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = write_coco(
        tmp.path(),
        &[(1, 1, "null"), (2, 2, "{}"), (3, 1, ONE_TRIANGLE), (4, 2, "[]")],
    )?;
    let report = scan_file(&path, &ScanOptions::default())?;
    assert_eq!(report.total_scanned, 4);
    assert_eq!(report.skipped_rle, 0);
    let rows: Vec<_> = report
        .entries
        .iter()
        .map(|e| (e.annotation_id.0, e.file_name.as_str(), e.reason))
        .collect();
    assert_eq!(
        rows,
        vec![
            (1, "0001.jpg", InvalidReason::Empty),
            (2, "0002.jpg", InvalidReason::Empty),
            (4, "0002.jpg", InvalidReason::Empty),
        ]
    );
    Ok(())
}

#[test]
fn rle_segmentations_are_skipped() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = write_coco(
        tmp.path(),
        &[
            (1, 1, r#"{"counts": [0, 5, 10], "size": [48, 64]}"#),
            (2, 1, r#"{"counts": "PPYo0", "size": [48, 64]}"#),
            (3, 2, "[]"),
        ],
    )?;
    let report = scan_file(&path, &ScanOptions::default())?;
    assert_eq!(report.total_scanned, 3);
    assert_eq!(report.skipped_rle, 2);
    assert_eq!(report.invalid_count(), 1);
    Ok(())
}

#[test]
fn missing_image_fails_by_default() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = write_coco(tmp.path(), &[(1, 1, "[]"), (2, 99, "[]")])?;
    let err = scan_file(&path, &ScanOptions::default()).unwrap_err();
    assert!(matches!(err, DatasetError::MissingImage { image_id: ImageId(99) }));
    Ok(())
}

#[test]
fn missing_image_for_valid_record_is_ignored() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = write_coco(tmp.path(), &[(1, 99, ONE_TRIANGLE)])?;
    let report = scan_file(&path, &ScanOptions::default())?;
    assert_eq!(report.invalid_count(), 0);
    Ok(())
}

#[test]
fn missing_image_sentinel_keeps_going() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = write_coco(tmp.path(), &[(1, 99, "[]"), (2, 1, "[]")])?;
    let report = scan_file(
        &path,
        &ScanOptions {
            missing_image: MissingImagePolicy::Sentinel,
            ..ScanOptions::default()
        },
    )?;
    assert_eq!(report.unresolved_images, 1);
    assert_eq!(report.entries[0].file_name, UNKNOWN_IMAGE);
    assert_eq!(report.entries[1].file_name, "0001.jpg");
    Ok(())
}

#[test]
fn unreadable_file_names_the_path() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("missing.json");
    let err = scan_file(&path, &ScanOptions::default()).unwrap_err();
    assert!(matches!(err, DatasetError::Io { .. }));
    assert!(err.to_string().contains("missing.json"));
}

#[test]
fn malformed_json_is_fatal() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("broken.json");
    fs::write(&path, "{\"images\": [")?;
    let err = scan_file(&path, &ScanOptions::default()).unwrap_err();
    assert!(matches!(err, DatasetError::Json { .. }));
    assert!(err.to_string().contains("broken.json"));
    Ok(())
}

#[test]
fn missing_sections_are_fatal() {
    let err = CocoIndex::parse(r#"{"images": []}"#, "no_annotations.json").unwrap_err();
    assert!(matches!(err, DatasetError::Json { .. }));
}

/// A source that yields records lazily and only knows a couple of images.
struct VecSource {
    records: Vec<AnnotationRecord>,
}

impl RecordSource for VecSource {
    fn list_annotations(&self) -> impl Iterator<Item = &AnnotationRecord> + '_ {
        self.records.iter()
    }

    fn resolve_image_name(&self, image_ref: ImageId) -> DatasetResult<&str> {
        match image_ref.0 {
            1 => Ok("one.png"),
            _ => Err(DatasetError::MissingImage { image_id: image_ref }),
        }
    }
}

#[test]
fn scanner_accepts_any_record_source() -> anyhow::Result<()> {
    let records = (0..40u64)
        .map(|i| AnnotationRecord {
            id: AnnotationId(1000 - i),
            image_ref: ImageId(1),
            segmentation: Segmentation::Polygons(if i % 2 == 0 {
                vec![]
            } else {
                vec![Polygon::new(vec![0.0; 6])]
            }),
        })
        .collect();
    let source = VecSource { records };
    let report = scan_records(&source, &ScanOptions::default())?;
    assert_eq!(report.invalid_count(), 20);
    assert_eq!(report.shown().len(), 20);
    let ids: Vec<u64> = report.entries.iter().map(|e| e.annotation_id.0).collect();
    let mut sorted_desc = ids.clone();
    sorted_desc.sort_unstable_by(|a, b| b.cmp(a));
    assert_eq!(ids, sorted_desc, "entries follow source order");
    Ok(())
}
