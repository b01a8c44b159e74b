//! Shared data contracts for COCO annotation records and polygon validation.

pub mod coco;
pub mod polygon;

pub use coco::{AnnotationId, AnnotationRecord, ImageId, ImageRecord, RleCounts, RleMask, Segmentation};
pub use polygon::{
    validate_segmentation, validate_with_policy, FinitePolicy, InvalidReason, Polygon,
    ValidationVerdict, MIN_POLYGON_COORDS,
};
