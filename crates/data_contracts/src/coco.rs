use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::polygon::Polygon;

/// Identifier of one annotation, unique within a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationId(pub u64);

/// Identifier of an image entry; annotations point at it through `image_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(pub u64);

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Forward so width/alignment flags apply to the number.
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Run-length counts are either a plain list or the compressed COCO string form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RleCounts {
    Uncompressed(Vec<u64>),
    Compressed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RleMask {
    pub counts: RleCounts,
    /// `[height, width]` of the mask.
    pub size: [u32; 2],
}

/// Object shape attached to an annotation.
///
/// Polygon lists are what the integrity scanner inspects. RLE masks (used for
/// `iscrowd = 1` objects) carry no coordinates and are passed through untouched.
/// `null` and `{}` read as an empty polygon list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Segmentation {
    Polygons(Vec<Polygon>),
    Rle(RleMask),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct EmptyObject {}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSegmentation {
    Polygons(Vec<Polygon>),
    Rle(RleMask),
    Null,
    Blank(EmptyObject),
}

impl<'de> Deserialize<'de> for Segmentation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawSegmentation::deserialize(deserializer)? {
            RawSegmentation::Polygons(polys) => Segmentation::Polygons(polys),
            RawSegmentation::Rle(mask) => Segmentation::Rle(mask),
            RawSegmentation::Null | RawSegmentation::Blank(_) => {
                Segmentation::Polygons(Vec::new())
            }
        })
    }
}

impl Segmentation {
    pub fn polygons(&self) -> Option<&[Polygon]> {
        match self {
            Segmentation::Polygons(polys) => Some(polys),
            Segmentation::Rle(_) => None,
        }
    }

    pub fn is_rle(&self) -> bool {
        matches!(self, Segmentation::Rle(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    pub id: AnnotationId,
    #[serde(rename = "image_id")]
    pub image_ref: ImageId,
    pub segmentation: Segmentation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: ImageId,
    pub file_name: String,
}
