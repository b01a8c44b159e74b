//! Annotation record sources and the COCO JSON index.

use crate::types::{DatasetError, DatasetResult};
use data_contracts::{AnnotationRecord, ImageId, ImageRecord};
use serde::Deserialize;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Supplies annotation records and image file names to the scanner.
///
/// `list_annotations` must yield records in the same order on every call so
/// that reports are reproducible.
pub trait RecordSource {
    fn list_annotations(&self) -> impl Iterator<Item = &AnnotationRecord> + '_;

    /// File name of `image_ref`, or `DatasetError::MissingImage` when the
    /// index has no such image.
    fn resolve_image_name(&self, image_ref: ImageId) -> DatasetResult<&str>;
}

// Only the keys the scanner consumes; everything else in the file is ignored.
#[derive(Deserialize)]
struct CocoFile {
    images: Vec<ImageRecord>,
    annotations: Vec<AnnotationRecord>,
}

/// In-memory index over one COCO instances file.
#[derive(Debug, Clone)]
pub struct CocoIndex {
    path: PathBuf,
    annotations: Vec<AnnotationRecord>,
    images: BTreeMap<ImageId, ImageRecord>,
}

impl CocoIndex {
    /// Read and index a COCO annotation file.
    pub fn from_path(path: &Path) -> DatasetResult<Self> {
        let raw = fs::read_to_string(path).map_err(|e| DatasetError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&raw, path)
    }

    /// Index COCO JSON text. `origin` is only used in error messages.
    pub fn parse(raw: &str, origin: impl Into<PathBuf>) -> DatasetResult<Self> {
        let path = origin.into();
        let text = quote_non_finite_literals(raw);
        let file: CocoFile = serde_json::from_str(&text).map_err(|e| DatasetError::Json {
            path: path.clone(),
            source: e,
        })?;

        let mut images = BTreeMap::new();
        for image in file.images {
            let id = image.id;
            if images.insert(id, image).is_some() {
                return Err(DatasetError::Schema {
                    path,
                    msg: format!("duplicate image id {id}"),
                });
            }
        }
        tracing::debug!(
            path = %path.display(),
            images = images.len(),
            annotations = file.annotations.len(),
            "coco index loaded"
        );
        Ok(Self {
            path,
            annotations: file.annotations,
            images,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn annotation_count(&self) -> usize {
        self.annotations.len()
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }
}

impl RecordSource for CocoIndex {
    fn list_annotations(&self) -> impl Iterator<Item = &AnnotationRecord> + '_ {
        self.annotations.iter()
    }

    fn resolve_image_name(&self, image_ref: ImageId) -> DatasetResult<&str> {
        self.images
            .get(&image_ref)
            .map(|img| img.file_name.as_str())
            .ok_or(DatasetError::MissingImage { image_id: image_ref })
    }
}

/// Python's `json` writes NaN and infinities as bare `NaN`/`Infinity`/`-Infinity`,
/// which strict JSON rejects. Quote them (outside string literals) so the
/// coordinate deserializer can read them back.
pub(crate) fn quote_non_finite_literals(raw: &str) -> Cow<'_, str> {
    const LITERALS: [&str; 3] = ["-Infinity", "Infinity", "NaN"];

    let bytes = raw.as_bytes();
    let mut out: Option<String> = None;
    let mut in_string = false;
    let mut escaped = false;
    let mut last = 0;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            i += 1;
            continue;
        }
        if b == b'"' {
            in_string = true;
            i += 1;
            continue;
        }
        if let Some(lit) = LITERALS
            .iter()
            .find(|lit| bytes[i..].starts_with(lit.as_bytes()))
        {
            let buf = out.get_or_insert_with(|| String::with_capacity(raw.len() + 64));
            buf.push_str(&raw[last..i]);
            buf.push('"');
            buf.push_str(lit);
            buf.push('"');
            i += lit.len();
            last = i;
            continue;
        }
        i += 1;
    }
    match out {
        None => Cow::Borrowed(raw),
        Some(mut buf) => {
            buf.push_str(&raw[last..]);
            Cow::Owned(buf)
        }
    }
}
