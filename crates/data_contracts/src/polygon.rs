//! Malformed-polygon detection for COCO segmentations.

use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A valid polygon needs at least three `(x, y)` points.
pub const MIN_POLYGON_COORDS: usize = 6;

/// Flat `[x0, y0, x1, y1, ...]` outline of one polygon.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Polygon(pub Vec<f64>);

impl Polygon {
    pub fn new(coords: Vec<f64>) -> Self {
        Self(coords)
    }

    pub fn coords(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First defect of this polygon under `policy`, if any.
    pub fn defect(&self, policy: FinitePolicy) -> Option<InvalidReason> {
        if self.len() % 2 != 0 || self.len() < MIN_POLYGON_COORDS {
            return Some(InvalidReason::BadLength);
        }
        if self.0.iter().any(|v| policy.rejects(*v)) {
            return Some(InvalidReason::NonFinite);
        }
        None
    }
}

impl<'de> Deserialize<'de> for Polygon {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_seq(PolygonVisitor)
    }
}

struct PolygonVisitor;

impl<'de> Visitor<'de> for PolygonVisitor {
    type Value = Polygon;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a flat list of polygon coordinates")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Polygon, A::Error> {
        let mut coords = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(Coordinate(v)) = seq.next_element()? {
            coords.push(v);
        }
        Ok(Polygon(coords))
    }
}

/// One coordinate as written by the various COCO producers: a JSON number, the
/// `NaN`/`Infinity` spellings as strings, or `null` for a lost value.
struct Coordinate(f64);

impl<'de> Deserialize<'de> for Coordinate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(CoordinateVisitor)
    }
}

struct CoordinateVisitor;

impl<'de> Visitor<'de> for CoordinateVisitor {
    type Value = Coordinate;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number, NaN, Infinity or null")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Coordinate, E> {
        Ok(Coordinate(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Coordinate, E> {
        Ok(Coordinate(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Coordinate, E> {
        Ok(Coordinate(v as f64))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Coordinate, E> {
        match v {
            "NaN" | "nan" => Ok(Coordinate(f64::NAN)),
            "Infinity" | "inf" => Ok(Coordinate(f64::INFINITY)),
            "-Infinity" | "-inf" => Ok(Coordinate(f64::NEG_INFINITY)),
            other => other
                .parse::<f64>()
                .map(Coordinate)
                .map_err(|_| E::invalid_value(de::Unexpected::Str(other), &self)),
        }
    }

    fn visit_unit<E: de::Error>(self) -> Result<Coordinate, E> {
        Ok(Coordinate(f64::NAN))
    }

    fn visit_none<E: de::Error>(self) -> Result<Coordinate, E> {
        Ok(Coordinate(f64::NAN))
    }
}

/// Which non-finite coordinates count as broken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FinitePolicy {
    /// Only NaN is rejected; infinities pass.
    #[default]
    NanOnly,
    /// NaN and both infinities are rejected.
    RejectInfinite,
}

impl FinitePolicy {
    pub fn rejects(self, v: f64) -> bool {
        match self {
            FinitePolicy::NanOnly => v.is_nan(),
            FinitePolicy::RejectInfinite => !v.is_finite(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FinitePolicy::NanOnly => "nan-only",
            FinitePolicy::RejectInfinite => "reject-infinite",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvalidReason {
    Empty,
    BadLength,
    NonFinite,
}

impl InvalidReason {
    pub const ALL: [InvalidReason; 3] = [
        InvalidReason::Empty,
        InvalidReason::BadLength,
        InvalidReason::NonFinite,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InvalidReason::Empty => "empty",
            InvalidReason::BadLength => "bad-length",
            InvalidReason::NonFinite => "non-finite",
        }
    }
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "verdict", content = "reason")]
pub enum ValidationVerdict {
    Valid,
    Invalid(InvalidReason),
}

impl ValidationVerdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationVerdict::Valid)
    }

    pub fn reason(&self) -> Option<InvalidReason> {
        match self {
            ValidationVerdict::Valid => None,
            ValidationVerdict::Invalid(reason) => Some(*reason),
        }
    }
}

/// Classify a polygon list with the NaN-only policy.
pub fn validate_segmentation(polygons: &[Polygon]) -> ValidationVerdict {
    validate_with_policy(polygons, FinitePolicy::NanOnly)
}

/// Classify a polygon list. The first failing polygon decides the verdict and
/// later polygons are not inspected.
pub fn validate_with_policy(polygons: &[Polygon], policy: FinitePolicy) -> ValidationVerdict {
    if polygons.is_empty() {
        return ValidationVerdict::Invalid(InvalidReason::Empty);
    }
    polygons
        .iter()
        .find_map(|poly| poly.defect(policy))
        .map_or(ValidationVerdict::Valid, ValidationVerdict::Invalid)
}
