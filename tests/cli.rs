//! CLI integration tests for the camdedup binary.

use assert_cmd::Command;
use image::{GrayImage, Luma};
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn camdedup() -> Command {
    Command::cargo_bin("camdedup").unwrap()
}

/// Dataset with one redundant frame, plus a config file next to it.
fn dataset() -> (TempDir, PathBuf, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let data = temp_dir.path().join("dataset");
    fs::create_dir(&data).unwrap();

    let frame = GrayImage::from_pixel(64, 48, Luma([90]));
    frame.save(data.join("c1-0001.png")).unwrap();
    frame.save(data.join("c1-0002.png")).unwrap();
    frame.save(data.join("c2_0001.png")).unwrap();

    let config = temp_dir.path().join("config.yaml");
    fs::write(
        &config,
        "similarity_threshold: 500\nmin_contour_area: 100\ngaussian_blur_kernel: [3]\nframe_size: [64, 48]\n",
    )
    .unwrap();

    (temp_dir, data, config)
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_help_lists_subcommands() {
    camdedup()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("dedup"))
        .stdout(predicate::str::contains("groups"))
        .stdout(predicate::str::contains("compare"));
}

#[test]
fn test_groups_lists_cameras() {
    let (_temp_dir, data, _config) = dataset();

    camdedup()
        .args(["groups", "--dataset-path", arg(&data)])
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 2 camera(s)"))
        .stdout(predicate::str::contains("c1: 2 image(s)"))
        .stdout(predicate::str::contains("c2: 1 image(s)"));
}

#[test]
fn test_dedup_dry_run_keeps_files() {
    let (_temp_dir, data, config) = dataset();

    camdedup()
        .args(["dedup", "--dataset-path", arg(&data), "--config", arg(&config), "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Would delete c1-0002.png"))
        .stdout(predicate::str::contains("Number of removed images: 1"))
        .stdout(predicate::str::contains("Dry-run only"));

    assert!(data.join("c1-0002.png").exists());
}

#[test]
fn test_dedup_json_report_and_deletion() {
    let (_temp_dir, data, config) = dataset();

    let output = camdedup()
        .args(["dedup", "-d", arg(&data), "-c", arg(&config), "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["removed"], 1);
    assert_eq!(report["removed_ids"][0], "c1-0002.png");
    assert_eq!(report["dry_run"], false);

    assert!(data.join("c1-0001.png").exists());
    assert!(!data.join("c1-0002.png").exists());
    assert!(data.join("c2_0001.png").exists());
}

#[test]
fn test_dedup_prints_each_deletion_even_when_quiet() {
    let (_temp_dir, data, config) = dataset();

    camdedup()
        .args(["dedup", "-d", arg(&data), "-c", arg(&config), "--quiet"])
        .env("RUST_LOG", "warn")
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted c1-0002.png"))
        .stdout(predicate::str::contains("Deleted c1-0001.png").not());

    assert!(!data.join("c1-0002.png").exists());
}

#[test]
fn test_threshold_override_keeps_everything() {
    let (temp_dir, data, config) = dataset();
    let mut changed = GrayImage::from_pixel(64, 48, Luma([90]));
    for y in 10..40 {
        for x in 10..50 {
            changed.put_pixel(x, y, Luma([250]));
        }
    }
    changed.save(data.join("c1-0002.png")).unwrap();

    camdedup()
        .args(["dedup", "-d", arg(&data), "-c", arg(&config), "--threshold", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Number of removed images: 0"));

    assert!(data.join("c1-0002.png").exists());
    drop(temp_dir);
}

#[test]
fn test_missing_dataset_fails() {
    let (temp_dir, _data, config) = dataset();

    camdedup()
        .args([
            "dedup",
            "-d",
            arg(&temp_dir.path().join("nope")),
            "-c",
            arg(&config),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid dataset path"));
}

#[test]
fn test_even_blur_kernel_is_rejected() {
    let (_temp_dir, data, config) = dataset();

    camdedup()
        .args(["dedup", "-d", arg(&data), "-c", arg(&config), "--blur", "4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("gaussian_blur_kernel"));

    assert!(data.join("c1-0002.png").exists());
}

#[test]
fn test_compare_identical_images() {
    let (_temp_dir, data, config) = dataset();

    camdedup()
        .args([
            "compare",
            arg(&data.join("c1-0001.png")),
            arg(&data.join("c1-0002.png")),
            "--config",
            arg(&config),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Difference score: 0"))
        .stdout(predicate::str::contains("Verdict: similar"));
}
