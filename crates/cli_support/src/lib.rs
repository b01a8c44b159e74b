//! Command-line argument groups shared by the COCO tools.

pub mod common;
