use crate::core::frame::PreprocessedFrame;
use crate::core::grouping::group_by_camera;
use crate::core::preprocess::Preprocessor;
use crate::core::scorer::FrameScorer;
use crate::services::report::RemovalReport;
use crate::services::store::{FrameStore, Removal, StoreError};
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::time::Instant;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DedupError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Liveness of one frame within its camera group.
enum Slot {
    Alive(PreprocessedFrame),
    Removed,
    Unreadable,
}

/// What happened to one camera group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupOutcome {
    pub camera: String,
    pub kept: Vec<String>,
    pub removed: Vec<String>,
    pub unreadable: Vec<String>,
    pub already_missing: Vec<String>,
    pub comparisons: usize,
    pub failed_comparisons: usize,
}

/// Removes frames that are near-identical to an earlier kept frame of the
/// same camera.
///
/// Within a group, frames are visited in sort order. Each surviving frame
/// becomes an anchor and is compared against every later surviving frame;
/// a candidate scoring at or below the threshold is deleted on the spot and
/// takes no further part in the scan. The earliest frame of a similar run is
/// therefore always the one kept. Cost is quadratic in the group size.
pub struct Deduplicator<'a> {
    store: &'a dyn FrameStore,
    preprocessor: &'a Preprocessor,
    scorer: &'a dyn FrameScorer,
    similarity_threshold: f64,
    dry_run: bool,
    announce: bool,
    progress: ProgressBar,
}

impl<'a> Deduplicator<'a> {
    pub fn new(
        store: &'a dyn FrameStore,
        preprocessor: &'a Preprocessor,
        scorer: &'a dyn FrameScorer,
        similarity_threshold: f64,
    ) -> Self {
        Self {
            store,
            preprocessor,
            scorer,
            similarity_threshold,
            dry_run: false,
            announce: false,
            progress: ProgressBar::hidden(),
        }
    }

    /// Make every decision but leave the files in place.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Print a line to stdout for every removed frame.
    pub fn announce_removals(mut self, announce: bool) -> Self {
        self.announce = announce;
        self
    }

    /// Show a progress bar over the frames being decoded.
    pub fn with_progress(mut self, show: bool) -> Self {
        if show {
            let style = ProgressStyle::with_template(
                "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar());
            self.progress = ProgressBar::new(0).with_style(style);
        }
        self
    }

    pub fn run(&self) -> Result<RemovalReport, DedupError> {
        let start = Instant::now();
        let mut report = RemovalReport::new(
            Utc::now().to_rfc3339(),
            self.store.location().display().to_string(),
            self.dry_run,
        );

        let ids = self.store.list()?;
        let groups = group_by_camera(&ids);
        report.images = ids.len();
        report.groups = groups.len();
        log::info!(
            "Found {} images from {} cameras in {}",
            report.images,
            report.groups,
            report.dataset
        );

        self.progress.set_length(ids.len() as u64);
        for (camera, members) in &groups {
            let outcome = self.dedup_group(camera, members)?;
            report.removed += outcome.removed.len();
            report.removed_ids.extend(outcome.removed);
            report.unreadable.extend(outcome.unreadable);
            report.already_missing.extend(outcome.already_missing);
            report.comparisons += outcome.comparisons;
            report.failed_comparisons += outcome.failed_comparisons;
        }
        self.progress.finish_and_clear();

        report.set_elapsed(start.elapsed());
        log::info!(
            "Removed {} of {} images in {:.2?}",
            report.removed,
            report.images,
            report.elapsed()
        );
        Ok(report)
    }

    /// Deduplicate one camera group. `ids` must already be in the order the
    /// scan should follow.
    pub fn dedup_group(&self, camera: &str, ids: &[String]) -> Result<GroupOutcome, DedupError> {
        let mut outcome = GroupOutcome {
            camera: camera.to_string(),
            ..GroupOutcome::default()
        };

        self.progress.set_message(camera.to_string());
        let mut slots = self.load_slots(ids);

        for i in 0..slots.len() {
            let (head, tail) = slots.split_at_mut(i + 1);
            let Slot::Alive(anchor) = &head[i] else {
                continue;
            };

            for slot in tail.iter_mut() {
                let Slot::Alive(candidate) = &*slot else {
                    continue;
                };

                outcome.comparisons += 1;
                let comparison = match self.scorer.score(anchor, candidate) {
                    Ok(comparison) => comparison,
                    Err(e) => {
                        log::warn!("Skipping comparison: {}", e);
                        outcome.failed_comparisons += 1;
                        continue;
                    }
                };
                log::debug!(
                    "{} vs {}: score {} ({} regions)",
                    anchor.id(),
                    candidate.id(),
                    comparison.score,
                    comparison.regions.len()
                );

                if comparison.score <= self.similarity_threshold {
                    let id = candidate.id().to_string();
                    self.remove(id, &mut outcome)?;
                    *slot = Slot::Removed;
                }
            }
        }

        for (id, slot) in ids.iter().zip(&slots) {
            match slot {
                Slot::Alive(_) => outcome.kept.push(id.clone()),
                Slot::Unreadable => outcome.unreadable.push(id.clone()),
                Slot::Removed => {}
            }
        }
        Ok(outcome)
    }

    /// Decode and preprocess every frame of a group up front, in parallel,
    /// keeping input order.
    fn load_slots(&self, ids: &[String]) -> Vec<Slot> {
        ids.par_iter()
            .map(|id| {
                let slot = match self.preprocessor.load(self.store, id) {
                    Ok(frame) => Slot::Alive(frame),
                    Err(e) => {
                        log::warn!("Skipping unreadable image: {}", e);
                        Slot::Unreadable
                    }
                };
                self.progress.inc(1);
                slot
            })
            .collect()
    }

    fn remove(&self, id: String, outcome: &mut GroupOutcome) -> Result<(), DedupError> {
        if self.dry_run {
            log::debug!("[dry-run] Would remove {}", id);
            self.notify(&format!("   🗑️  Would delete {}", id));
            outcome.removed.push(id);
            return Ok(());
        }

        match self.store.remove(&id)? {
            Removal::Deleted => {
                log::debug!("Removed {}", id);
                self.notify(&format!("   🗑️  Deleted {}", id));
                outcome.removed.push(id);
            }
            Removal::AlreadyMissing => outcome.already_missing.push(id),
        }
        Ok(())
    }

    /// Stdout line that does not tear the progress bar.
    fn notify(&self, line: &str) {
        if self.announce {
            self.progress.suspend(|| println!("{}", line));
        }
    }
}
