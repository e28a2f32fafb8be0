/*!
 * Comparison of two split manifests.
 *
 * Used to audit how a re-split moved utterances between buckets from one
 * corpus release to the next. Read-only over both manifests.
 */

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;

use crate::file_utils::{FileManager, REPORT_INDENT};
use crate::split::SplitResult;
use crate::subset::Bucket;

/// Filenames that were deleted, inserted or moved between buckets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SplitDiff {
    /// Old bucket label → filenames absent from the new manifest
    #[serde(rename = "DELETED")]
    pub deleted: BTreeMap<String, Vec<String>>,

    /// New bucket label → filenames absent from the old manifest
    #[serde(rename = "INSERTED")]
    pub inserted: BTreeMap<String, Vec<String>>,

    /// Old bucket label → new bucket label → filenames that moved
    #[serde(rename = "SUBSTITUTED")]
    pub substituted: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl SplitDiff {
    /// Compare `old` against `new`
    pub fn compute(old: &SplitResult, new: &SplitResult) -> Self {
        let old_buckets = bucket_index(old);
        let new_buckets = bucket_index(new);
        let mut diff = Self::default();

        for (bucket, filename) in old.entries() {
            match new_buckets.get(filename.as_str()) {
                None => diff
                    .deleted
                    .entry(bucket.label())
                    .or_default()
                    .push(filename.clone()),
                Some(new_bucket) if *new_bucket != bucket => diff
                    .substituted
                    .entry(bucket.label())
                    .or_default()
                    .entry(new_bucket.label())
                    .or_default()
                    .push(filename.clone()),
                Some(_) => {}
            }
        }

        for (bucket, filename) in new.entries() {
            if !old_buckets.contains_key(filename.as_str()) {
                diff.inserted
                    .entry(bucket.label())
                    .or_default()
                    .push(filename.clone());
            }
        }

        diff
    }

    pub fn is_empty(&self) -> bool {
        self.deleted.is_empty() && self.inserted.is_empty() && self.substituted.is_empty()
    }

    /// Write the report with sorted keys
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        FileManager::write_json(path, self, REPORT_INDENT)
    }
}

fn bucket_index(split: &SplitResult) -> HashMap<&str, Bucket> {
    split
        .entries()
        .map(|(bucket, filename)| (filename.as_str(), bucket))
        .collect()
}

/// Count summary printed after a comparison
impl fmt::Display for SplitDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.deleted.is_empty() {
            writeln!(f, "DELETED:")?;
            for (label, files) in &self.deleted {
                writeln!(f, "{} : {}", label, files.len())?;
            }
            writeln!(f)?;
        }
        if !self.inserted.is_empty() {
            writeln!(f, "INSERTED:")?;
            for (label, files) in &self.inserted {
                writeln!(f, "{} : {}", label, files.len())?;
            }
            writeln!(f)?;
        }
        if !self.substituted.is_empty() {
            writeln!(f, "SUBSTITUTED:")?;
            for (old_label, moves) in &self.substituted {
                for (new_label, files) in moves {
                    writeln!(f, "{} -> {} : {}", old_label, new_label, files.len())?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
