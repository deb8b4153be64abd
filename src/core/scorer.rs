use crate::core::frame::PreprocessedFrame;
use crate::core::imaging::{DiffRegion, ImagingBackend};
use image::GrayImage;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("Frame size mismatch: {left} is {left_size:?}, {right} is {right_size:?}")]
    SizeMismatch {
        left: String,
        left_size: (u32, u32),
        right: String,
        right_size: (u32, u32),
    },
}

/// Result of comparing two preprocessed frames.
#[derive(Debug, Clone)]
pub struct Comparison {
    /// Summed area of the regions that passed the minimum area filter.
    pub score: f64,
    pub regions: Vec<DiffRegion>,
    pub thresholded: GrayImage,
}

pub trait FrameScorer: Send + Sync {
    fn score(
        &self,
        a: &PreprocessedFrame,
        b: &PreprocessedFrame,
    ) -> Result<Comparison, ScoreError>;
}

/// Scores frames by the total area of the change regions the backend finds,
/// ignoring regions smaller than `min_contour_area`.
pub struct ContourScorer {
    backend: Arc<dyn ImagingBackend>,
    min_contour_area: f64,
}

impl ContourScorer {
    pub fn new(backend: Arc<dyn ImagingBackend>, min_contour_area: f64) -> Self {
        Self {
            backend,
            min_contour_area,
        }
    }
}

impl FrameScorer for ContourScorer {
    fn score(
        &self,
        a: &PreprocessedFrame,
        b: &PreprocessedFrame,
    ) -> Result<Comparison, ScoreError> {
        if a.dimensions() != b.dimensions() {
            return Err(ScoreError::SizeMismatch {
                left: a.id().to_string(),
                left_size: a.dimensions(),
                right: b.id().to_string(),
                right_size: b.dimensions(),
            });
        }

        let change = self.backend.diff_contours(a.pixels(), b.pixels());
        let regions: Vec<DiffRegion> = change
            .regions
            .into_iter()
            .filter(|region| f64::from(region.area) >= self.min_contour_area)
            .collect();
        let total_area: u64 = regions.iter().map(|region| u64::from(region.area)).sum();
        let score = total_area as f64;

        Ok(Comparison {
            score,
            regions,
            thresholded: change.thresholded,
        })
    }
}
