//! Near-duplicate removal for fixed surveillance camera datasets.
//!
//! Frames are grouped per camera from their file names, normalized to a
//! canonical grayscale form and compared pairwise. A frame whose difference
//! score against an earlier kept frame of the same camera is at or below the
//! similarity threshold is deleted.

pub mod core;
pub mod services;

pub use crate::core::dedup::{DedupError, Deduplicator, GroupOutcome};
pub use crate::core::grouping::{camera_id, group_by_camera};
pub use crate::core::imaging::{ImagingBackend, RasterBackend};
pub use crate::core::preprocess::Preprocessor;
pub use crate::core::scorer::{ContourScorer, FrameScorer};
pub use crate::services::config::DedupConfig;
pub use crate::services::report::RemovalReport;
pub use crate::services::store::{DirectoryStore, FrameStore};
