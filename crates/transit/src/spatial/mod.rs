//! Spatial indexing utilities.

pub mod index;

pub use index::{SegmentIndex, SegmentNode};
