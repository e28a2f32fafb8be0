/*!
 * Corpus loading.
 *
 * A corpus is a directory holding one JSON metadata record per contributor,
 * usually at `<datadir>/<contributor>/<contributor>.json`. Each record lists
 * the contributor's audio files together with the prompt that was read.
 */

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;

use crate::errors::SplitError;
use crate::file_utils::FileManager;

/// How strictly optional record fields are enforced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Absent Etiology and Transcript fields are tolerated
    Lenient,
    /// Every contributor needs an Etiology and every prompt a Transcript
    Strict,
}

/// Contributor identifier as it appears in the metadata
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContributorId(String);

impl ContributorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercased form, used only as a lookup fallback
    pub fn to_lowercase(&self) -> String {
        self.0.to_lowercase()
    }
}

impl fmt::Display for ContributorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ContributorId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

// @struct: One recorded prompt
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    // @field: Audio filename, unique across the corpus
    pub filename: String,

    // @field: Prompt category description
    pub category: String,

    // @field: Prompt subcategory description, possibly empty
    pub subcategory: String,

    // @field: Prompt text, trimmed
    pub text: String,

    // @field: What the contributor actually said, when transcribed
    pub transcript: Option<String>,
}

impl Utterance {
    pub fn new(filename: &str, category: &str, text: &str) -> Self {
        Self {
            filename: filename.to_string(),
            category: category.to_string(),
            subcategory: String::new(),
            text: text.trim().to_string(),
            transcript: None,
        }
    }

    pub fn with_transcript(mut self, transcript: &str) -> Self {
        self.transcript = Some(transcript.to_string());
        self
    }
}

/// A contributor and everything they recorded
#[derive(Debug, Clone)]
pub struct Contributor {
    pub id: ContributorId,
    pub etiology: Option<String>,
    pub utterances: Vec<Utterance>,
}

impl Contributor {
    pub fn new(id: &str, utterances: Vec<Utterance>) -> Self {
        Self {
            id: ContributorId::new(id),
            etiology: None,
            utterances,
        }
    }

    /// Distinct prompt texts this contributor uttered
    pub fn prompt_texts(&self) -> HashSet<&str> {
        self.utterances.iter().map(|u| u.text.as_str()).collect()
    }
}

#[derive(Deserialize)]
struct ContributorRecord {
    #[serde(rename = "Contributor ID")]
    contributor_id: Option<String>,
    #[serde(rename = "Etiology", default)]
    etiology: Option<String>,
    #[serde(rename = "Files")]
    files: Option<Vec<FileRecord>>,
}

#[derive(Deserialize)]
struct FileRecord {
    #[serde(rename = "Filename")]
    filename: Option<String>,
    #[serde(rename = "Prompt")]
    prompt: Option<PromptFields>,
}

#[derive(Deserialize)]
struct PromptFields {
    #[serde(rename = "Prompt Text")]
    text: Option<String>,
    #[serde(rename = "Category Description", default)]
    category: Option<String>,
    #[serde(rename = "Sub Category Description", default)]
    subcategory: Option<String>,
    #[serde(rename = "Transcript", default)]
    transcript: Option<String>,
}

fn missing(record: &str, field: &str) -> SplitError {
    SplitError::MissingField {
        record: record.to_string(),
        field: field.to_string(),
    }
}

/// All contributors of one corpus, in load order
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    contributors: Vec<Contributor>,
}

impl Corpus {
    pub fn from_contributors(contributors: Vec<Contributor>) -> Self {
        Self { contributors }
    }

    /// Load every record matching `pattern` below `datadir`, in sorted path order
    pub fn load<P: AsRef<Path>>(datadir: P, pattern: &str, mode: LoadMode) -> Result<Self> {
        let datadir = datadir.as_ref();
        let paths = FileManager::find_matches(datadir, pattern)?;
        info!("Loading {} contributor records from {:?}", paths.len(), datadir);

        let mut contributors = Vec::with_capacity(paths.len());
        for path in &paths {
            contributors.push(Self::load_record(path, mode)?);
        }

        let corpus = Self { contributors };
        corpus.warn_on_case_collisions();
        corpus.warn_on_duplicate_filenames();
        Ok(corpus)
    }

    /// Load one contributor record
    pub fn load_record(path: &Path, mode: LoadMode) -> Result<Contributor> {
        let content = FileManager::read_to_string(path)?;
        Self::parse_record(&content, &path.to_string_lossy(), mode)
            .with_context(|| format!("Failed to load contributor record {:?}", path))
    }

    /// Parse one contributor record; `record` names it in error messages
    pub fn parse_record(content: &str, record: &str, mode: LoadMode) -> Result<Contributor, SplitError> {
        let parsed: ContributorRecord = serde_json::from_str(content)?;

        let id = parsed
            .contributor_id
            .ok_or_else(|| missing(record, "Contributor ID"))?;
        if mode == LoadMode::Strict && parsed.etiology.is_none() {
            return Err(missing(&id, "Etiology"));
        }
        let files = parsed.files.ok_or_else(|| missing(&id, "Files"))?;

        let mut utterances = Vec::with_capacity(files.len());
        for file in files {
            let filename = file.filename.ok_or_else(|| missing(&id, "Filename"))?;
            let prompt = file.prompt.ok_or_else(|| missing(&filename, "Prompt"))?;
            let text = prompt.text.ok_or_else(|| missing(&filename, "Prompt Text"))?;
            if mode == LoadMode::Strict && prompt.transcript.is_none() {
                return Err(missing(&filename, "Transcript"));
            }

            utterances.push(Utterance {
                filename,
                category: prompt.category.unwrap_or_default(),
                subcategory: prompt.subcategory.unwrap_or_default(),
                text: text.trim().to_string(),
                transcript: prompt.transcript,
            });
        }

        debug!("Contributor {} has {} utterances", id, utterances.len());
        Ok(Contributor {
            id: ContributorId::new(id),
            etiology: parsed.etiology,
            utterances,
        })
    }

    // IDs compare case-insensitively, so two records differing only in case are the same contributor
    fn warn_on_case_collisions(&self) {
        let mut seen: HashMap<String, &ContributorId> = HashMap::new();
        for contributor in &self.contributors {
            if let Some(other) = seen.insert(contributor.id.to_lowercase(), &contributor.id) {
                warn!(
                    "Contributor IDs {} and {} differ only in case",
                    other, contributor.id
                );
            }
        }
    }

    fn warn_on_duplicate_filenames(&self) {
        let mut seen = HashSet::new();
        for contributor in &self.contributors {
            for utterance in &contributor.utterances {
                if !seen.insert(utterance.filename.as_str()) {
                    warn!(
                        "Filename {} appears more than once in the corpus (contributor {})",
                        utterance.filename, contributor.id
                    );
                }
            }
        }
    }

    pub fn contributors(&self) -> &[Contributor] {
        &self.contributors
    }

    pub fn len(&self) -> usize {
        self.contributors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contributors.is_empty()
    }

    /// Total number of utterances over all contributors
    pub fn utterance_count(&self) -> usize {
        self.contributors.iter().map(|c| c.utterances.len()).sum()
    }
}
