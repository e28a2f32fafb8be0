/*!
 * Split manifests.
 *
 * A `SplitResult` maps every utterance filename to its prompt text, grouped
 * into the five leaf buckets `train`, `dev.shared`, `dev.unshared`,
 * `test.shared` and `test.unshared`. It serializes with sorted keys so two
 * manifests of successive releases diff cleanly.
 */

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::corpus::Utterance;
use crate::file_utils::{FileManager, MANIFEST_INDENT};
use crate::subset::{Bucket, HeldOut, Sharing, Subset};

/// One manifest value: the prompt text, plus the transcript when one exists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ManifestEntry {
    Text(String),
    Transcribed { text: String, transcript: String },
}

impl ManifestEntry {
    pub fn text(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Transcribed { text, .. } => text,
        }
    }

    pub fn transcript(&self) -> Option<&str> {
        match self {
            Self::Text(_) => None,
            Self::Transcribed { transcript, .. } => Some(transcript),
        }
    }
}

impl From<&Utterance> for ManifestEntry {
    fn from(utterance: &Utterance) -> Self {
        match &utterance.transcript {
            Some(transcript) => Self::Transcribed {
                text: utterance.text.clone(),
                transcript: transcript.clone(),
            },
            None => Self::Text(utterance.text.clone()),
        }
    }
}

/// Filename → entry map of one bucket
pub type BucketMap = BTreeMap<String, ManifestEntry>;

/// Shared and unshared halves of a held-out subset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SharingBuckets {
    #[serde(default)]
    pub shared: BucketMap,
    #[serde(default)]
    pub unshared: BucketMap,
}

impl SharingBuckets {
    pub fn get(&self, sharing: Sharing) -> &BucketMap {
        match sharing {
            Sharing::Shared => &self.shared,
            Sharing::Unshared => &self.unshared,
        }
    }

    fn get_mut(&mut self, sharing: Sharing) -> &mut BucketMap {
        match sharing {
            Sharing::Shared => &mut self.shared,
            Sharing::Unshared => &mut self.unshared,
        }
    }
}

/// Train/dev/test manifest. Fields are declared in key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SplitResult {
    #[serde(default)]
    pub dev: SharingBuckets,
    #[serde(default)]
    pub test: SharingBuckets,
    #[serde(default)]
    pub train: BucketMap,
}

impl SplitResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries of one leaf bucket
    pub fn bucket(&self, bucket: Bucket) -> &BucketMap {
        match bucket {
            Bucket::Train => &self.train,
            Bucket::HeldOut(held_out, sharing) => self.held_out(held_out).get(sharing),
        }
    }

    fn bucket_mut(&mut self, bucket: Bucket) -> &mut BucketMap {
        match bucket {
            Bucket::Train => &mut self.train,
            Bucket::HeldOut(HeldOut::Dev, sharing) => self.dev.get_mut(sharing),
            Bucket::HeldOut(HeldOut::Test, sharing) => self.test.get_mut(sharing),
        }
    }

    /// Shared/unshared halves of a held-out subset
    pub fn held_out(&self, held_out: HeldOut) -> &SharingBuckets {
        match held_out {
            HeldOut::Dev => &self.dev,
            HeldOut::Test => &self.test,
        }
    }

    /// Place `filename` in `bucket`
    pub fn insert(&mut self, bucket: Bucket, filename: &str, entry: ManifestEntry) {
        self.bucket_mut(bucket).insert(filename.to_string(), entry);
    }

    /// Bucket holding `filename`, if any
    pub fn bucket_of(&self, filename: &str) -> Option<Bucket> {
        Bucket::all()
            .into_iter()
            .find(|bucket| self.bucket(*bucket).contains_key(filename))
    }

    /// Every filename with its bucket
    pub fn entries(&self) -> impl Iterator<Item = (Bucket, &String)> {
        Bucket::all()
            .into_iter()
            .flat_map(move |bucket| self.bucket(bucket).keys().map(move |f| (bucket, f)))
    }

    /// Number of entries per bucket, in manifest order
    pub fn counts(&self) -> Vec<(Bucket, usize)> {
        Bucket::all()
            .into_iter()
            .map(|bucket| (bucket, self.bucket(bucket).len()))
            .collect()
    }

    /// Total number of entries over all buckets
    pub fn len(&self) -> usize {
        self.counts().iter().map(|(_, n)| n).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The portion of the manifest belonging to `subset`, as written next to its directory
    pub fn subset_value(&self, subset: Subset) -> Result<serde_json::Value> {
        let value = match subset {
            Subset::Train => serde_json::to_value(&self.train)?,
            Subset::Dev => serde_json::to_value(&self.dev)?,
            Subset::Test => serde_json::to_value(&self.test)?,
        };
        Ok(value)
    }

    /// Read a manifest from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open split manifest: {:?}", path))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse split manifest: {:?}", path))
    }

    /// Write the manifest with sorted keys and one-space indentation
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        FileManager::write_json(path, self, MANIFEST_INDENT)
    }
}
