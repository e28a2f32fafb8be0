/*!
 * Tests for split manifest comparison
 */

use anyhow::Result;
use std::fs;
use sapsplit::diff::SplitDiff;
use sapsplit::split::{ManifestEntry, SplitResult};
use sapsplit::subset::{Bucket, HeldOut, Sharing};
use crate::common;

fn entry(text: &str) -> ManifestEntry {
    ManifestEntry::Text(text.to_string())
}

fn sample_split() -> SplitResult {
    let mut split = SplitResult::new();
    split.insert(Bucket::Train, "a.wav", entry("One"));
    split.insert(Bucket::Train, "b.wav", entry("Two"));
    split.insert(Bucket::HeldOut(HeldOut::Dev, Sharing::Shared), "c.wav", entry("One"));
    split.insert(Bucket::HeldOut(HeldOut::Test, Sharing::Unshared), "d.wav", entry("Three"));
    split
}

/// Test that comparing a manifest with itself yields an empty diff
#[test]
fn test_compute_withIdenticalSplits_shouldBeEmpty() {
    let split = sample_split();
    let diff = SplitDiff::compute(&split, &split);
    assert!(diff.is_empty());
    assert_eq!(diff.to_string(), "");
}

/// Test deletions, insertions and moves together
#[test]
fn test_compute_withChangedSplit_shouldReportEveryChange() {
    let old = sample_split();
    let mut new = SplitResult::new();
    new.insert(Bucket::Train, "a.wav", entry("One"));
    new.insert(Bucket::HeldOut(HeldOut::Test, Sharing::Shared), "c.wav", entry("One"));
    new.insert(Bucket::HeldOut(HeldOut::Test, Sharing::Unshared), "d.wav", entry("Three"));
    new.insert(Bucket::HeldOut(HeldOut::Dev, Sharing::Unshared), "e.wav", entry("Four"));

    let diff = SplitDiff::compute(&old, &new);

    assert_eq!(diff.deleted["train"], vec!["b.wav".to_string()]);
    assert_eq!(diff.inserted["dev:unshared"], vec!["e.wav".to_string()]);
    assert_eq!(diff.substituted["dev:shared"]["test:shared"], vec!["c.wav".to_string()]);
    assert_eq!(diff.deleted.len(), 1);
    assert_eq!(diff.inserted.len(), 1);
    assert_eq!(diff.substituted.len(), 1);

    let summary = diff.to_string();
    assert!(summary.contains("DELETED:\ntrain : 1\n"));
    assert!(summary.contains("INSERTED:\ndev:unshared : 1\n"));
    assert!(summary.contains("dev:shared -> test:shared : 1"));
}

/// Test that the report is written with the upper-case section names
#[test]
fn test_write_shouldUseSectionNamesAndTwoSpaceIndent() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("diff.json");
    let old = sample_split();
    let new = SplitResult::new();

    SplitDiff::compute(&old, &new).write(&path)?;

    let content = fs::read_to_string(&path)?;
    assert!(content.starts_with("{\n  \"DELETED\": {\n    \"dev:shared\": ["));
    let value: serde_json::Value = serde_json::from_str(&content)?;
    assert_eq!(value["DELETED"]["train"].as_array().map(|a| a.len()), Some(2));
    assert!(value["INSERTED"].as_object().is_some_and(|o| o.is_empty()));
    Ok(())
}

/// Test that a written manifest reads back with sorted keys and one-space indent
#[test]
fn test_splitWrite_shouldSortKeysAndIndentOneSpace() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("split.json");
    let split = sample_split();

    split.write(&path)?;

    let content = fs::read_to_string(&path)?;
    assert!(content.starts_with("{\n \"dev\": {\n  \"shared\": {\n   \"c.wav\": \"One\"\n  },"));
    let dev = content.find("\"dev\"");
    let test = content.find("\"test\"");
    let train = content.find("\"train\"");
    assert!(dev < test && test < train);
    assert_eq!(SplitResult::load(&path)?, split);
    Ok(())
}

/// Test that each held-out bucket reads and writes its own subset
#[test]
fn test_splitHeldOut_shouldKeepDevAndTestApart() {
    let split = sample_split();

    assert!(split.held_out(HeldOut::Dev).shared.contains_key("c.wav"));
    assert!(split.held_out(HeldOut::Dev).unshared.is_empty());
    assert!(split.held_out(HeldOut::Test).unshared.contains_key("d.wav"));
    assert!(split.held_out(HeldOut::Test).shared.is_empty());
    assert_eq!(split.bucket(Bucket::HeldOut(HeldOut::Test, Sharing::Unshared)).len(), 1);
}
