//! End-to-end deduplication over a real directory of PNG frames.

use camdedup::{
    ContourScorer, DedupConfig, Deduplicator, DirectoryStore, ImagingBackend, Preprocessor,
    RasterBackend,
};
use image::{GrayImage, Luma};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn config() -> DedupConfig {
    DedupConfig {
        similarity_threshold: 500.0,
        min_contour_area: 100.0,
        gaussian_blur_kernel: vec![3],
        frame_size: [160, 120],
        ..DedupConfig::default()
    }
}

fn scene(width: u32, height: u32, square: Option<(u32, u32, u32)>) -> GrayImage {
    let mut image = GrayImage::from_pixel(width, height, Luma([100]));
    if let Some((x0, y0, size)) = square {
        for y in y0..y0 + size {
            for x in x0..x0 + size {
                image.put_pixel(x, y, Luma([255]));
            }
        }
    }
    image
}

fn save(dir: &Path, name: &str, image: &GrayImage) {
    image.save(dir.join(name)).unwrap();
}

fn remaining(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn deduplicate(dir: &Path, dry_run: bool) -> camdedup::RemovalReport {
    let config = config();
    let backend: Arc<dyn ImagingBackend> = Arc::new(RasterBackend::new(
        config.pixel_threshold,
        config.dilate_iterations,
    ));
    let preprocessor = Preprocessor::from_config(backend.clone(), &config);
    let scorer = ContourScorer::new(backend, config.min_contour_area);
    let store = DirectoryStore::new(dir);

    Deduplicator::new(&store, &preprocessor, &scorer, config.similarity_threshold)
        .dry_run(dry_run)
        .run()
        .unwrap()
}

fn populate(dir: &Path) {
    let empty = scene(160, 120, None);
    save(dir, "c1-0001.png", &empty);
    save(dir, "c1-0002.png", &empty);
    save(dir, "c1-0003.png", &scene(160, 120, Some((50, 40, 60))));
    fs::write(dir.join("c1-0004.png"), b"truncated frame").unwrap();
    save(dir, "c2_0001.png", &empty);
    fs::write(dir.join("readme.txt"), b"not an image").unwrap();
}

#[test]
fn test_removes_repeated_frames_per_camera() {
    let temp_dir = TempDir::new().unwrap();
    populate(temp_dir.path());

    let report = deduplicate(temp_dir.path(), false);

    assert_eq!(report.images, 5);
    assert_eq!(report.groups, 2);
    assert_eq!(report.removed, 1);
    assert_eq!(report.removed_ids, vec!["c1-0002.png"]);
    assert_eq!(report.unreadable, vec!["c1-0004.png"]);
    assert_eq!(
        remaining(temp_dir.path()),
        vec![
            "c1-0001.png",
            "c1-0003.png",
            "c1-0004.png",
            "c2_0001.png",
            "readme.txt"
        ]
    );
}

#[test]
fn test_dry_run_leaves_directory_untouched() {
    let temp_dir = TempDir::new().unwrap();
    populate(temp_dir.path());
    let before = remaining(temp_dir.path());

    let report = deduplicate(temp_dir.path(), true);

    assert_eq!(report.removed_ids, vec!["c1-0002.png"]);
    assert_eq!(remaining(temp_dir.path()), before);
}

#[test]
fn test_frames_of_different_sizes_are_normalized_before_comparison() {
    let temp_dir = TempDir::new().unwrap();
    save(temp_dir.path(), "c3-0001.png", &scene(320, 240, None));
    save(temp_dir.path(), "c3-0002.png", &scene(160, 120, None));

    let report = deduplicate(temp_dir.path(), false);

    assert_eq!(report.failed_comparisons, 0);
    assert_eq!(report.removed_ids, vec!["c3-0002.png"]);
}

#[test]
fn test_second_run_is_a_no_op() {
    let temp_dir = TempDir::new().unwrap();
    populate(temp_dir.path());

    deduplicate(temp_dir.path(), false);
    let report = deduplicate(temp_dir.path(), false);

    assert_eq!(report.removed, 0);
}
