use image::{imageops::FilterType, DynamicImage, GrayImage, Luma};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImagingError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// A connected region of changed pixels in a thresholded difference map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DiffRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Number of changed pixels in the region.
    pub area: u32,
}

/// Output of a frame difference: the binary change map and its regions.
#[derive(Debug, Clone)]
pub struct ChangeMap {
    pub thresholded: GrayImage,
    pub regions: Vec<DiffRegion>,
}

/// Pixel primitives used by the preprocessor and the scorer.
pub trait ImagingBackend: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, image::ImageError>;

    fn resize(&self, image: &GrayImage, width: u32, height: u32) -> GrayImage;

    /// Gaussian blur with a square aperture of `kernel_size` pixels.
    fn blur(&self, image: &GrayImage, kernel_size: u32) -> GrayImage;

    /// Threshold the absolute difference of two equally sized frames and
    /// extract the connected change regions.
    fn diff_contours(&self, a: &GrayImage, b: &GrayImage) -> ChangeMap;
}

/// [`ImagingBackend`] on top of the `image` crate.
#[derive(Debug, Clone)]
pub struct RasterBackend {
    pixel_threshold: u8,
    dilate_iterations: u32,
}

impl RasterBackend {
    pub fn new(pixel_threshold: u8, dilate_iterations: u32) -> Self {
        Self {
            pixel_threshold,
            dilate_iterations,
        }
    }
}

impl Default for RasterBackend {
    fn default() -> Self {
        Self::new(45, 2)
    }
}

impl ImagingBackend for RasterBackend {
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, image::ImageError> {
        image::load_from_memory(bytes)
    }

    fn resize(&self, image: &GrayImage, width: u32, height: u32) -> GrayImage {
        image::imageops::resize(image, width, height, FilterType::Triangle)
    }

    fn blur(&self, image: &GrayImage, kernel_size: u32) -> GrayImage {
        if kernel_size <= 1 {
            return image.clone();
        }
        image::imageops::blur(image, sigma_for_kernel(kernel_size))
    }

    fn diff_contours(&self, a: &GrayImage, b: &GrayImage) -> ChangeMap {
        debug_assert_eq!(a.dimensions(), b.dimensions());
        let width = a.width().min(b.width());
        let height = a.height().min(b.height());

        let mut thresholded = GrayImage::new(width, height);
        for y in 0..height {
            for x in 0..width {
                let delta = a.get_pixel(x, y)[0].abs_diff(b.get_pixel(x, y)[0]);
                if delta > self.pixel_threshold {
                    thresholded.put_pixel(x, y, Luma([255]));
                }
            }
        }
        for _ in 0..self.dilate_iterations {
            thresholded = dilate(&thresholded);
        }

        let regions = connected_regions(&thresholded);
        ChangeMap {
            thresholded,
            regions,
        }
    }
}

/// Sigma OpenCV derives for a Gaussian aperture when none is given.
fn sigma_for_kernel(kernel_size: u32) -> f32 {
    0.3 * ((kernel_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// 3x3 max filter. Out-of-bounds neighbours are ignored.
fn dilate(image: &GrayImage) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut out = GrayImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let mut value = 0u8;
            for ny in y.saturating_sub(1)..=(y + 1).min(height - 1) {
                for nx in x.saturating_sub(1)..=(x + 1).min(width - 1) {
                    value = value.max(image.get_pixel(nx, ny)[0]);
                }
            }
            out.put_pixel(x, y, Luma([value]));
        }
    }
    out
}

/// 8-connected components of non-zero pixels, in raster order of their
/// first pixel.
fn connected_regions(mask: &GrayImage) -> Vec<DiffRegion> {
    let (width, height) = mask.dimensions();
    let mut visited = vec![false; (width as usize) * (height as usize)];
    let index = |x: u32, y: u32| (y as usize) * (width as usize) + x as usize;
    let mut regions = Vec::new();
    let mut stack = Vec::new();

    for y in 0..height {
        for x in 0..width {
            if visited[index(x, y)] || mask.get_pixel(x, y)[0] == 0 {
                continue;
            }

            visited[index(x, y)] = true;
            stack.push((x, y));
            let (mut min_x, mut min_y, mut max_x, mut max_y) = (x, y, x, y);
            let mut area = 0u32;

            while let Some((cx, cy)) = stack.pop() {
                area += 1;
                min_x = min_x.min(cx);
                min_y = min_y.min(cy);
                max_x = max_x.max(cx);
                max_y = max_y.max(cy);

                for ny in cy.saturating_sub(1)..=(cy + 1).min(height - 1) {
                    for nx in cx.saturating_sub(1)..=(cx + 1).min(width - 1) {
                        let i = index(nx, ny);
                        if !visited[i] && mask.get_pixel(nx, ny)[0] != 0 {
                            visited[i] = true;
                            stack.push((nx, ny));
                        }
                    }
                }
            }

            regions.push(DiffRegion {
                x: min_x,
                y: min_y,
                width: max_x - min_x + 1,
                height: max_y - min_y + 1,
                area,
            });
        }
    }

    regions
}
