use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::errors::SplitError;
use crate::subset::Subset;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Which prompt lists belong to which subset
    #[serde(default)]
    pub subsets: SubsetLists,

    /// Prompt category excluded from the shared/unshared computation
    #[serde(default = "default_spontaneous_category")]
    pub spontaneous_category: String,

    /// Glob, relative to the data directory, locating one JSON record per contributor
    #[serde(default = "default_corpus_glob")]
    pub corpus_glob: String,

    /// Glob locating the contributor-split manifest consumed by `arrange`
    #[serde(default = "default_contributors_glob")]
    pub contributors_glob: String,

    /// Glob locating the prompt-split manifest consumed by `arrange`
    #[serde(default = "default_split_glob")]
    pub split_glob: String,

    /// Prompt texts known to occur in exactly one list, used by the marker strategy
    #[serde(default = "default_marker_prompts")]
    pub marker_prompts: BTreeMap<String, u32>,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// List numbers that make up each subset
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SubsetLists {
    pub train: Vec<u32>,
    pub dev: Vec<u32>,
    pub test: Vec<u32>,
}

impl SubsetLists {
    /// Lists belonging to `subset`
    pub fn lists(&self, subset: Subset) -> &[u32] {
        match subset {
            Subset::Train => &self.train,
            Subset::Dev => &self.dev,
            Subset::Test => &self.test,
        }
    }

    /// Subset that `list` belongs to, if any
    pub fn subset_for(&self, list: u32) -> Option<Subset> {
        Subset::ALL
            .into_iter()
            .find(|subset| self.lists(*subset).contains(&list))
    }

    /// Every configured list number, ascending
    pub fn all_lists(&self) -> BTreeSet<u32> {
        Subset::ALL
            .iter()
            .flat_map(|subset| self.lists(*subset).iter().copied())
            .collect()
    }

    /// Check that every subset has lists and no list is claimed twice
    pub fn validate(&self) -> Result<(), SplitError> {
        let mut seen = BTreeMap::new();
        for subset in Subset::ALL {
            let lists = self.lists(subset);
            if lists.is_empty() {
                return Err(SplitError::InvalidConfig(format!("Subset {} has no prompt lists", subset)));
            }
            for list in lists {
                if let Some(previous) = seen.insert(*list, subset) {
                    return Err(SplitError::InvalidConfig(format!(
                        "List {} is assigned to both {} and {}",
                        list, previous, subset
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Default for SubsetLists {
    fn default() -> Self {
        Self {
            train: vec![1, 2, 3, 4, 6, 7, 8],
            dev: vec![5],
            test: vec![9, 10],
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_spontaneous_category() -> String {
    "Spontaneous Speech Prompts".to_string()
}

fn default_corpus_glob() -> String {
    "*/*.json".to_string()
}

fn default_contributors_glob() -> String {
    "Speech*Contributors.json".to_string()
}

fn default_split_glob() -> String {
    "Speech*Split.json".to_string()
}

fn default_marker_prompts() -> BTreeMap<String, u32> {
    [
        ("What's the distance to Pluckley, England?", 1),
        ("Play hip hop music on Apple music.", 2),
        ("Set a timer for 60 minutes.", 3),
        ("Wake me up at 6:30 AM every day.", 4),
        ("Did the Seattle Mariners win?", 5),
        ("Cancel alarm for noon.", 6),
        ("When is Buffalo Wild Wings open until?", 7),
        ("Brighten the outdoor lights.", 8),
        ("Turn off the outdoor lights.", 9),
        ("How did the Arizona Diamondbacks game turn out yesterday?", 10),
    ]
    .into_iter()
    .map(|(text, list)| (text.to_string(), list))
    .collect()
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        self.subsets.validate()?;

        if self.corpus_glob.trim().is_empty() {
            return Err(anyhow!("corpus_glob must not be empty"));
        }
        if self.contributors_glob.trim().is_empty() || self.split_glob.trim().is_empty() {
            return Err(anyhow!("Manifest glob patterns must not be empty"));
        }

        Ok(())
    }

    /// Load the configuration at `path`, writing a default one there if it does not exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {:?}", path))?;
            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            return Ok(config);
        }

        warn!("Config file not found at {:?}, creating default config.", path);
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write default config to file: {:?}", path))?;

        Ok(config)
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            subsets: SubsetLists::default(),
            spontaneous_category: default_spontaneous_category(),
            corpus_glob: default_corpus_glob(),
            contributors_glob: default_contributors_glob(),
            split_glob: default_split_glob(),
            marker_prompts: default_marker_prompts(),
            log_level: LogLevel::default(),
        }
    }
}
