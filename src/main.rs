use anyhow::{Context, Result};
use camdedup::core::frame::RawFrame;
use camdedup::core::scorer::FrameScorer;
use camdedup::{
    group_by_camera, ContourScorer, DedupConfig, Deduplicator, DirectoryStore, FrameStore,
    ImagingBackend, Preprocessor, RasterBackend,
};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "camdedup",
    version,
    about = "Remove near-duplicate frames from fixed camera datasets"
)]
struct Cli {
    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Delete frames that are near-identical to an earlier frame of the same camera
    Dedup {
        /// Directory holding the .png frames
        #[arg(
            short = 'd',
            long = "dataset-path",
            alias = "dataset_path",
            value_name = "DIR",
            default_value = "dataset"
        )]
        dataset_path: PathBuf,

        #[command(flatten)]
        tuning: Tuning,

        /// Only show what would be deleted
        #[arg(long)]
        dry_run: bool,

        /// Print the removal report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List camera groups and their image counts
    Groups {
        /// Directory holding the .png frames
        #[arg(
            short = 'd',
            long = "dataset-path",
            alias = "dataset_path",
            value_name = "DIR",
            default_value = "dataset"
        )]
        dataset_path: PathBuf,
    },

    /// Print the difference score between two images
    Compare {
        first: PathBuf,
        second: PathBuf,

        #[command(flatten)]
        tuning: Tuning,
    },
}

#[derive(Args, Debug)]
struct Tuning {
    /// Config file (default: ./config.yaml, then the user config directory)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override similarity_threshold
    #[arg(long, value_name = "SCORE")]
    threshold: Option<f64>,

    /// Override min_contour_area
    #[arg(long, value_name = "PIXELS")]
    min_contour_area: Option<f64>,

    /// Override gaussian_blur_kernel; repeat for several passes
    #[arg(long = "blur", value_name = "SIZE")]
    blur: Vec<u32>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.quiet);

    match cli.command {
        Commands::Dedup {
            dataset_path,
            tuning,
            dry_run,
            json,
        } => {
            let config = resolve_config(&tuning)?;
            let backend = backend_for(&config);
            let preprocessor = Preprocessor::from_config(backend.clone(), &config);
            let scorer = ContourScorer::new(backend, config.min_contour_area);
            let store = DirectoryStore::new(&dataset_path);

            if !json {
                println!("▶ Deduplicating frames in: {}", dataset_path.display());
            }
            let report = Deduplicator::new(
                &store,
                &preprocessor,
                &scorer,
                config.similarity_threshold,
            )
            .dry_run(dry_run)
            .announce_removals(!json)
            .with_progress(!json && !cli.quiet)
            .run()
            .with_context(|| format!("Failed to deduplicate {}", dataset_path.display()))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }

            if !report.unreadable.is_empty() {
                println!(
                    "⚠️  Skipped {} unreadable image(s)",
                    report.unreadable.len()
                );
            }
            println!("\n🗑️  Number of removed images: {}", report.removed);
            if dry_run {
                println!("⚠️  Dry-run only; no files were changed.");
            }
            println!("⏱ Processing time: {:.2?}", report.elapsed());
        }

        Commands::Groups { dataset_path } => {
            let store = DirectoryStore::new(&dataset_path);
            let ids = store
                .list()
                .with_context(|| format!("Failed to list {}", dataset_path.display()))?;
            let groups = group_by_camera(&ids);

            if groups.is_empty() {
                println!("No images found.");
            } else {
                println!("Found {} camera(s):", groups.len());
                for (camera, members) in &groups {
                    println!("   ▶ {}: {} image(s)", camera, members.len());
                }
            }
        }

        Commands::Compare {
            first,
            second,
            tuning,
        } => {
            let config = resolve_config(&tuning)?;
            let backend = backend_for(&config);
            let preprocessor = Preprocessor::from_config(backend.clone(), &config);
            let scorer = ContourScorer::new(backend.clone(), config.min_contour_area);

            let (a, b) = benchmark("preprocessing", || -> Result<_> {
                let a = decode_file(backend.as_ref(), &first)?;
                let b = decode_file(backend.as_ref(), &second)?;
                Ok((preprocessor.preprocess(a), preprocessor.preprocess(b)))
            })?;
            let comparison = scorer.score(&a, &b)?;

            println!("Difference score: {}", comparison.score);
            println!("Regions counted: {}", comparison.regions.len());
            let verdict = if comparison.score <= config.similarity_threshold {
                "similar"
            } else {
                "different"
            };
            println!(
                "Verdict: {} (threshold {})",
                verdict, config.similarity_threshold
            );
        }
    }

    Ok(())
}

fn init_logging(quiet: bool) {
    let default_level = if quiet { "warn" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Load the config file and apply command-line overrides.
fn resolve_config(tuning: &Tuning) -> Result<DedupConfig> {
    let (mut config, source) =
        DedupConfig::load(tuning.config.as_deref()).context("Failed to load configuration")?;
    if let Some(path) = source {
        log::info!("Using config {}", path.display());
    }

    if let Some(threshold) = tuning.threshold {
        config.similarity_threshold = threshold;
    }
    if let Some(area) = tuning.min_contour_area {
        config.min_contour_area = area;
    }
    if !tuning.blur.is_empty() {
        config.gaussian_blur_kernel = tuning.blur.clone();
    }

    config.validate()?;
    Ok(config)
}

fn backend_for(config: &DedupConfig) -> Arc<dyn ImagingBackend> {
    Arc::new(RasterBackend::new(
        config.pixel_threshold,
        config.dilate_iterations,
    ))
}

fn decode_file(backend: &dyn ImagingBackend, path: &Path) -> Result<RawFrame> {
    let bytes = fs::read(path).with_context(|| format!("Failed to open {:?}", path))?;
    let image = backend
        .decode(&bytes)
        .with_context(|| format!("Failed to decode {:?}", path))?;
    Ok(RawFrame::new(path.to_string_lossy(), image))
}

/// Run `f()`, print how long it took (with `label`), and return its result.
fn benchmark<T, F: FnOnce() -> T>(label: &str, f: F) -> T {
    let start = Instant::now();
    let result = f();
    println!("⏱ {} took {:.2?}", label, start.elapsed());
    result
}
