use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::app_config::Config;
use crate::file_utils::{FileManager, MANIFEST_INDENT};
use crate::split::SplitResult;
use crate::subset::Subset;

// @module: Copies contributor directories into train/dev/test trees

/// Outcome of one arrange run
#[derive(Debug, Default, Clone)]
pub struct ArrangeReport {
    /// Contributor directories copied, with the subset they went to
    pub copied: Vec<(Subset, String)>,
    /// Destinations that already existed and were left untouched
    pub skipped_existing: Vec<PathBuf>,
    /// Contributors listed in the manifest with no source directory
    pub missing_source: Vec<PathBuf>,
    /// Per-subset transcript listings that were written
    pub listings: Vec<PathBuf>,
}

/// Lays a split out on disk
pub struct Materializer {
    // @field: Glob of the contributor-split manifest
    contributors_glob: String,

    // @field: Glob of the prompt-split manifest
    split_glob: String,

    // @field: Draw a progress bar while copying
    show_progress: bool,
}

impl Materializer {
    pub fn new(config: &Config) -> Self {
        Self {
            contributors_glob: config.contributors_glob.clone(),
            split_glob: config.split_glob.clone(),
            show_progress: true,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Copy `<datadir>/<id>` to `<outputdir>/<subset>/<id>` for every listed contributor
    /// and write `<split stem>_<subset>.json` into each subset directory.
    pub fn arrange<P1: AsRef<Path>, P2: AsRef<Path>>(&self, datadir: P1, outputdir: P2) -> Result<ArrangeReport> {
        let datadir = datadir.as_ref();
        let outputdir = outputdir.as_ref();

        let contributors_path = FileManager::find_single_match(datadir, &self.contributors_glob)?;
        let split_path = FileManager::find_single_match(datadir, &self.split_glob)?;
        info!("Contributor split: {:?}", contributors_path);
        info!("Prompt split: {:?}", split_path);

        let contributors = Self::load_contributor_manifest(&contributors_path)?;
        let split = SplitResult::load(&split_path)?;
        let split_stem = split_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default();

        let total: usize = contributors.values().map(|ids| ids.len()).sum();
        let progress_bar = self.progress_bar(total as u64);
        let mut report = ArrangeReport::default();

        for subset in Subset::ALL {
            let target_root = outputdir.join(subset.as_str());
            FileManager::ensure_dir(&target_root)?;

            for contributor in contributors.get(subset.as_str()).into_iter().flatten() {
                progress_bar.inc(1);
                let source = datadir.join(contributor);
                let target = target_root.join(contributor);

                if target.exists() {
                    warn!("{:?} already exists; not copying", target);
                    report.skipped_existing.push(target);
                    continue;
                }
                if !FileManager::dir_exists(&source) {
                    warn!("Contributor directory {:?} does not exist; not copying", source);
                    report.missing_source.push(source);
                    continue;
                }

                let files = FileManager::copy_dir_all(&source, &target)?;
                debug!("Copied {} files for {} into {}", files, contributor, subset);
                report.copied.push((subset, contributor.clone()));
            }

            let listing = target_root.join(format!("{}_{}.json", split_stem, subset));
            FileManager::write_json(&listing, &split.subset_value(subset)?, MANIFEST_INDENT)?;
            report.listings.push(listing);
        }

        progress_bar.finish_and_clear();
        info!(
            "Copied {} contributors ({} already present, {} missing)",
            report.copied.len(),
            report.skipped_existing.len(),
            report.missing_source.len()
        );
        Ok(report)
    }

    /// Read a `{train,dev,test}` → contributor IDs manifest
    pub fn load_contributor_manifest(path: &Path) -> Result<BTreeMap<String, Vec<String>>> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open contributor manifest: {:?}", path))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse contributor manifest: {:?}", path))
    }

    fn progress_bar(&self, total: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::hidden());
        }
        let progress_bar = ProgressBar::new(total);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} contributors ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));
        progress_bar.set_message("Copying");
        progress_bar
    }
}
