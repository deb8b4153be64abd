use crate::core::frame::{PreprocessedFrame, RawFrame};
use crate::core::imaging::{ImagingBackend, ImagingError};
use crate::services::config::DedupConfig;
use crate::services::store::FrameStore;
use image::{GrayImage, Luma};
use std::sync::Arc;

/// Percentages of the frame painted black at the left, top, right and bottom
/// edges. Surveillance frames carry burned-in timestamps there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorderMask {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl BorderMask {
    pub const NONE: BorderMask = BorderMask {
        left: 0,
        top: 0,
        right: 0,
        bottom: 0,
    };

    fn apply(&self, image: &mut GrayImage) {
        let (width, height) = image.dimensions();
        let left = width * self.left / 100;
        let top = height * self.top / 100;
        let right = width - width * self.right / 100;
        let bottom = height - height * self.bottom / 100;

        for (x, y, pixel) in image.enumerate_pixels_mut() {
            if x < left || x >= right || y < top || y >= bottom {
                *pixel = Luma([0]);
            }
        }
    }
}

/// Turns decoded frames into their canonical comparable form.
pub struct Preprocessor {
    backend: Arc<dyn ImagingBackend>,
    blur_kernel_sizes: Vec<u32>,
    frame_size: Option<(u32, u32)>,
    border_mask: BorderMask,
}

impl Preprocessor {
    pub fn new(
        backend: Arc<dyn ImagingBackend>,
        blur_kernel_sizes: Vec<u32>,
        frame_size: Option<(u32, u32)>,
        border_mask: BorderMask,
    ) -> Self {
        Self {
            backend,
            blur_kernel_sizes,
            frame_size,
            border_mask,
        }
    }

    pub fn from_config(backend: Arc<dyn ImagingBackend>, config: &DedupConfig) -> Self {
        let [left, top, right, bottom] = config.border_mask;
        Self::new(
            backend,
            config.gaussian_blur_kernel.clone(),
            Some((config.frame_size[0], config.frame_size[1])),
            BorderMask {
                left,
                top,
                right,
                bottom,
            },
        )
    }

    /// Read and decode `id` from `store`.
    pub fn decode(&self, store: &dyn FrameStore, id: &str) -> Result<RawFrame, ImagingError> {
        let bytes = store.read(id).map_err(|source| ImagingError::Read {
            path: store.path_of(id),
            source,
        })?;
        let image = self
            .backend
            .decode(&bytes)
            .map_err(|source| ImagingError::Decode {
                path: store.path_of(id),
                source,
            })?;
        Ok(RawFrame::new(id, image))
    }

    /// Decode and preprocess in one step.
    pub fn load(
        &self,
        store: &dyn FrameStore,
        id: &str,
    ) -> Result<PreprocessedFrame, ImagingError> {
        self.decode(store, id).map(|raw| self.preprocess(raw))
    }

    /// Grayscale, resize to the canonical size, blur with every configured
    /// kernel in order, then mask the border.
    pub fn preprocess(&self, raw: RawFrame) -> PreprocessedFrame {
        let (id, image) = raw.into_parts();
        let mut gray = image.to_luma8();

        if let Some((width, height)) = self.frame_size {
            if gray.dimensions() != (width, height) {
                gray = self.backend.resize(&gray, width, height);
            }
        }

        for &kernel_size in &self.blur_kernel_sizes {
            gray = self.backend.blur(&gray, kernel_size);
        }

        self.border_mask.apply(&mut gray);
        PreprocessedFrame::new(id, gray)
    }
}
