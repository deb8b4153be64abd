use image::{DynamicImage, GrayImage};

/// A decoded image that has not been normalized yet.
#[derive(Debug, Clone)]
pub struct RawFrame {
    id: String,
    image: DynamicImage,
}

impl RawFrame {
    pub fn new(id: impl Into<String>, image: DynamicImage) -> Self {
        Self {
            id: id.into(),
            image,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn into_parts(self) -> (String, DynamicImage) {
        (self.id, self.image)
    }
}

/// Canonical comparable form of a frame: single channel, fixed size,
/// smoothed and border-masked. Only [`crate::Preprocessor`] produces these.
#[derive(Debug, Clone)]
pub struct PreprocessedFrame {
    id: String,
    pixels: GrayImage,
}

impl PreprocessedFrame {
    pub(crate) fn new(id: String, pixels: GrayImage) -> Self {
        Self { id, pixels }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn pixels(&self) -> &GrayImage {
        &self.pixels
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }
}
