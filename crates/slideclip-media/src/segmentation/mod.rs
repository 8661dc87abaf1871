//! Slide segmentation.
//!
//! Turns scene-change timestamps into a gap-free partition of the recording
//! into content segments, one per slide.
//!
//! # Usage
//!
//! ```rust
//! use slideclip_media::segmentation::{build_segments, SegmentationConfig};
//!
//! let segments = build_segments(&[5.0, 5.05, 12.0], 12.0, &SegmentationConfig::default()).unwrap();
//! assert_eq!(segments.len(), 2);
//! assert_eq!(segments[1].start, 5.0);
//! ```

mod builder;
mod config;

pub use builder::build_segments;
pub use config::{SceneDetectionConfig, SegmentationConfig};
