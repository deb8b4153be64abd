use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_NAME: &str = "config.yaml";
const APP_DIR: &str = "camdedup";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Tunables for a deduplication run.
#[derive(Debug, Clone, PartialEq)]
pub struct DedupConfig {
    /// Frames scoring at or below this against a kept frame are removed.
    pub similarity_threshold: f64,
    /// Change regions smaller than this many pixels are treated as noise.
    pub min_contour_area: f64,
    /// Gaussian blur apertures applied in order. Each must be odd.
    pub gaussian_blur_kernel: Vec<u32>,
    /// Canonical `[width, height]` every frame is resized to. The area
    /// tunables above are measured in pixels at this size, so changing it
    /// rescales what they mean.
    pub frame_size: [u32; 2],
    /// Percent of the frame masked at `[left, top, right, bottom]`.
    pub border_mask: [u32; 4],
    /// Per-pixel intensity delta above which a pixel counts as changed.
    pub pixel_threshold: u8,
    pub dilate_iterations: u32,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 5000.0,
            min_contour_area: 1000.0,
            gaussian_blur_kernel: vec![15],
            frame_size: [640, 480],
            border_mask: [5, 10, 5, 0],
            pixel_threshold: 45,
            dilate_iterations: 2,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct DedupConfigFile {
    similarity_threshold: Option<f64>,
    min_contour_area: Option<f64>,
    gaussian_blur_kernel: Option<Vec<u32>>,
    frame_size: Option<[u32; 2]>,
    border_mask: Option<[u32; 4]>,
    pixel_threshold: Option<u8>,
    dilate_iterations: Option<u32>,
}

impl DedupConfig {
    /// Load from `explicit` if given, otherwise from the first config file
    /// found in the working directory or the user config directory. Falls
    /// back to defaults when no file exists. Returns the file used, if any.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ConfigError::NotFound {
                    path: path.to_path_buf(),
                });
            }
            return Ok((Self::from_path(path)?, Some(path.to_path_buf())));
        }

        for candidate in Self::search_paths() {
            if candidate.is_file() {
                return Ok((Self::from_path(&candidate)?, Some(candidate)));
            }
        }

        log::info!("No config file found, using defaults");
        Ok((Self::default(), None))
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(DEFAULT_CONFIG_NAME)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join(APP_DIR).join(DEFAULT_CONFIG_NAME));
        }
        paths
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, serde_yaml::Error> {
        let file = if raw.trim().is_empty() {
            DedupConfigFile::default()
        } else {
            serde_yaml::from_str::<Option<DedupConfigFile>>(raw)?.unwrap_or_default()
        };
        Ok(Self::from_file(file))
    }

    fn from_file(file: DedupConfigFile) -> Self {
        let defaults = Self::default();
        Self {
            similarity_threshold: or_default(
                "similarity_threshold",
                file.similarity_threshold,
                defaults.similarity_threshold,
            ),
            min_contour_area: or_default(
                "min_contour_area",
                file.min_contour_area,
                defaults.min_contour_area,
            ),
            gaussian_blur_kernel: or_default(
                "gaussian_blur_kernel",
                file.gaussian_blur_kernel,
                defaults.gaussian_blur_kernel,
            ),
            frame_size: file.frame_size.unwrap_or(defaults.frame_size),
            border_mask: file.border_mask.unwrap_or(defaults.border_mask),
            pixel_threshold: file.pixel_threshold.unwrap_or(defaults.pixel_threshold),
            dilate_iterations: file.dilate_iterations.unwrap_or(defaults.dilate_iterations),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.similarity_threshold.is_finite() || self.similarity_threshold < 0.0 {
            return Err(ConfigError::Invalid {
                field: "similarity_threshold",
                reason: format!("{} is not a non-negative number", self.similarity_threshold),
            });
        }
        if !self.min_contour_area.is_finite() || self.min_contour_area <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "min_contour_area",
                reason: format!("{} is not a positive number", self.min_contour_area),
            });
        }
        if let Some(kernel) = self
            .gaussian_blur_kernel
            .iter()
            .find(|&&k| k == 0 || k % 2 == 0)
        {
            return Err(ConfigError::Invalid {
                field: "gaussian_blur_kernel",
                reason: format!("kernel size {} must be odd and positive", kernel),
            });
        }
        if self.frame_size.contains(&0) {
            return Err(ConfigError::Invalid {
                field: "frame_size",
                reason: format!("{:?} has a zero dimension", self.frame_size),
            });
        }
        let [left, top, right, bottom] = self.border_mask;
        if left.saturating_add(right) >= 100 || top.saturating_add(bottom) >= 100 {
            return Err(ConfigError::Invalid {
                field: "border_mask",
                reason: format!("{:?} masks the whole frame", self.border_mask),
            });
        }
        Ok(())
    }
}

fn or_default<T: std::fmt::Debug>(key: &str, value: Option<T>, default: T) -> T {
    value.unwrap_or_else(|| {
        log::info!("{} not set, using default {:?}", key, default);
        default
    })
}
