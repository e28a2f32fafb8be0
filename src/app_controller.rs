use anyhow::{anyhow, Context, Result};
use log::{info, warn};
use std::path::{Path, PathBuf};

use crate::app_config::Config;
use crate::classifier::Classifier;
use crate::corpus::{Corpus, LoadMode};
use crate::diff::SplitDiff;
use crate::file_utils::{FileManager, MANIFEST_INDENT};
use crate::materializer::{ArrangeReport, Materializer};
use crate::prompts::{ListOverlap, PromptCatalog};
use crate::resolver::{Assignment, ContributorTable, Resolver};
use crate::split::SplitResult;

// @module: Application controller for corpus splitting

/// How contributors are assigned to subsets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Majority vote over prompt texts known per subset
    Majority,
    /// Authoritative contributor → list table
    Table,
    /// Marker prompts unique to one list
    Markers,
}

/// Inputs and outputs of one split run
#[derive(Debug, Clone)]
pub struct SplitOptions {
    // @field: Directory holding one subdirectory per contributor
    pub datadir: PathBuf,

    // @field: Where the split manifest is written
    pub output: PathBuf,

    // @field: Prompt list directory or catalog dump
    pub prompts: Option<PathBuf>,

    // @field: Contributor table CSV
    pub table: Option<PathBuf>,

    // @field: Where the contributor-list manifest is written
    pub contributors_out: Option<PathBuf>,

    // @field: Where the marker strategy's per-list report is written
    pub report: Option<PathBuf>,

    // @field: Explicit strategy; inferred from `table` when absent
    pub strategy: Option<Strategy>,
}

impl SplitOptions {
    pub fn new<P1: AsRef<Path>, P2: AsRef<Path>>(datadir: P1, output: P2) -> Self {
        Self {
            datadir: datadir.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            prompts: None,
            table: None,
            contributors_out: None,
            report: None,
            strategy: None,
        }
    }

    /// Table when a table is given, majority vote otherwise
    pub fn effective_strategy(&self) -> Strategy {
        match (self.strategy, &self.table) {
            (Some(strategy), _) => strategy,
            (None, Some(_)) => Strategy::Table,
            (None, None) => Strategy::Majority,
        }
    }
}

/// Result of a split run, also written to disk
#[derive(Debug, Clone)]
pub struct SplitOutcome {
    pub assignment: Assignment,
    pub split: SplitResult,
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn resolver(&self) -> Resolver {
        Resolver::new(self.config.subsets.clone())
            .with_marker_prompts(self.config.marker_prompts.clone())
    }

    /// Load the corpus, resolve subsets, classify utterances and write the manifests
    pub fn run_split(&self, options: &SplitOptions) -> Result<SplitOutcome> {
        let start_time = std::time::Instant::now();
        let strategy = options.effective_strategy();
        info!("Splitting {:?} using the {:?} strategy", options.datadir, strategy);

        // The table path trusts upstream metadata, so incomplete records abort the run
        let mode = match strategy {
            Strategy::Table => LoadMode::Strict,
            Strategy::Majority | Strategy::Markers => LoadMode::Lenient,
        };
        let corpus = Corpus::load(&options.datadir, &self.config.corpus_glob, mode)?;
        if corpus.is_empty() {
            warn!("No contributor records matched {:?} in {:?}", self.config.corpus_glob, options.datadir);
        }

        let resolver = self.resolver();
        let assignment = match strategy {
            Strategy::Table => {
                let path = options
                    .table
                    .as_ref()
                    .ok_or_else(|| anyhow!("The table strategy needs a contributor table"))?;
                let table = ContributorTable::from_csv_path(path)?;
                info!("Contributor table lists {} contributors", table.len());
                resolver.by_table(&corpus, &table)?
            }
            Strategy::Majority => {
                let path = options
                    .prompts
                    .as_ref()
                    .ok_or_else(|| anyhow!("The majority strategy needs prompt lists (--prompts)"))?;
                let catalog = PromptCatalog::load(path)?;
                let prompts = catalog.subset_prompts(&self.config.subsets, &self.config.spontaneous_category);
                resolver.by_majority(&corpus, &prompts)
            }
            Strategy::Markers => {
                let (assignment, report) = resolver.by_markers(&corpus)?;
                if let Some(path) = &options.report {
                    let text = report.to_log_text(&self.config.subsets.all_lists());
                    FileManager::write_to_file(path, &text)?;
                }
                assignment
            }
        };

        if !assignment.excluded().is_empty() {
            warn!("{} contributors were excluded from the split", assignment.excluded().len());
        }

        let split = Classifier::new(&self.config.spontaneous_category).classify(&assignment, &corpus);
        split.write(&options.output)?;
        info!("Wrote split manifest {:?}", options.output);

        if let Some(path) = &options.contributors_out {
            FileManager::write_json(path, &assignment.to_manifest(), MANIFEST_INDENT)?;
            info!("Wrote contributor manifest {:?}", path);
        }

        info!(
            "Split {} contributors, {} utterances in {:.1}s",
            assignment.len(),
            split.len(),
            start_time.elapsed().as_secs_f64()
        );
        Ok(SplitOutcome { assignment, split })
    }

    /// Copy contributor directories into train/dev/test trees
    pub fn run_arrange<P1: AsRef<Path>, P2: AsRef<Path>>(
        &self,
        datadir: P1,
        outputdir: P2,
        show_progress: bool,
    ) -> Result<ArrangeReport> {
        Materializer::new(&self.config)
            .with_progress(show_progress)
            .arrange(datadir, outputdir)
    }

    /// Report which prompt texts occur in one list and which in several
    pub fn run_compare_lists<P: AsRef<Path>>(&self, prompts: P, output: Option<&Path>) -> Result<ListOverlap> {
        let catalog = PromptCatalog::load(prompts)?;
        let overlap = catalog.list_overlap();
        info!(
            "{} prompts occur in exactly one list, {} in two or more",
            overlap.single.len(),
            overlap.multi.len()
        );
        if let Some(path) = output {
            FileManager::write_to_file(path, &overlap.to_log_text())?;
        }
        Ok(overlap)
    }

    /// Compare two split manifests and write the report to `output`
    pub fn run_diff<P1: AsRef<Path>, P2: AsRef<Path>, P3: AsRef<Path>>(
        &self,
        old: P1,
        new: P2,
        output: P3,
    ) -> Result<SplitDiff> {
        let old = SplitResult::load(old)?;
        let new = SplitResult::load(new)?;
        let diff = SplitDiff::compute(&old, &new);
        diff.write(output)?;
        Ok(diff)
    }
}
