/*!
 * Tests for subset membership resolution
 */

use anyhow::Result;
use std::io::Cursor;
use sapsplit::app_config::SubsetLists;
use sapsplit::corpus::{ContributorId, Corpus};
use sapsplit::errors::SplitError;
use sapsplit::prompts::SubsetPrompts;
use sapsplit::resolver::{ContributorTable, Resolver};
use sapsplit::subset::Subset;
use crate::common::{self, COMMANDS};

fn known_prompts() -> SubsetPrompts {
    let mut prompts = SubsetPrompts::default();
    prompts.insert(Subset::Train, "Turn on the lights");
    prompts.insert(Subset::Train, "What time is it");
    prompts.insert(Subset::Dev, "Call my sister");
    prompts.insert(Subset::Test, "Read my messages");
    prompts
}

fn table(csv: &str) -> Result<ContributorTable> {
    Ok(ContributorTable::from_csv_reader(Cursor::new(csv.to_string()))?)
}

/// Test that an exact-case table entry wins over a lowercase one
#[test]
fn test_byTable_withExactAndLowercaseEntries_shouldPreferExact() -> Result<()> {
    common::init_logging();
    let corpus = Corpus::from_contributors(vec![common::contributor("AbC", &[(COMMANDS, "Turn on the lights")])]);
    let table = table("ContributorID,List#\nAbC,List 5\nabc,List 9\n")?;

    let assignment = Resolver::new(SubsetLists::default()).by_table(&corpus, &table)?;

    assert_eq!(assignment.subset_of(&"AbC".into()), Some(Subset::Dev));
    Ok(())
}

/// Test that the lowercase form is used when the exact ID is absent
#[test]
fn test_byTable_withOnlyLowercaseEntry_shouldFallBack() -> Result<()> {
    let corpus = Corpus::from_contributors(vec![common::contributor("AbC", &[(COMMANDS, "Turn on the lights")])]);
    let table = table("ContributorID,List#\nabc,List 9\n")?;

    let assignment = Resolver::new(SubsetLists::default()).by_table(&corpus, &table)?;

    assert_eq!(assignment.subset_of(&"AbC".into()), Some(Subset::Test));
    Ok(())
}

/// Test that lists spanning two subsets are rejected
#[test]
fn test_byTable_withListsInTwoSubsets_shouldReturnAmbiguousAssignment() -> Result<()> {
    let corpus = Corpus::from_contributors(vec![common::contributor("A", &[(COMMANDS, "Turn on the lights")])]);
    let table = table("ContributorID,List#\nA,List 1\nA,List 5\n")?;

    let result = Resolver::new(SubsetLists::default()).by_table(&corpus, &table);

    match result {
        Err(SplitError::AmbiguousAssignment { contributor, lists }) => {
            assert_eq!(contributor, "A");
            assert_eq!(lists, vec![1, 5]);
        }
        other => panic!("Expected AmbiguousAssignment, got {:?}", other),
    }
    Ok(())
}

/// Test that two lists of the same subset are accepted
#[test]
fn test_byTable_withTwoTrainLists_shouldAssignTrain() -> Result<()> {
    let corpus = Corpus::from_contributors(vec![common::contributor("A", &[(COMMANDS, "Turn on the lights")])]);
    let table = table("ContributorID,List#\nA,List 1\nA,List 7\n")?;

    let assignment = Resolver::new(SubsetLists::default()).by_table(&corpus, &table)?;

    assert_eq!(assignment.subset_of(&"A".into()), Some(Subset::Train));
    Ok(())
}

/// Test that a list outside the configuration is rejected
#[test]
fn test_byTable_withUnconfiguredList_shouldReturnUnknownList() -> Result<()> {
    let corpus = Corpus::from_contributors(vec![common::contributor("A", &[(COMMANDS, "Turn on the lights")])]);
    let table = table("ContributorID,List#\nA,List 11\n")?;

    let result = Resolver::new(SubsetLists::default()).by_table(&corpus, &table);

    assert!(matches!(result, Err(SplitError::UnknownList(11))));
    Ok(())
}

/// Test that contributors missing from the table are excluded, not assigned
#[test]
fn test_byTable_withContributorMissingFromTable_shouldExclude() -> Result<()> {
    let corpus = Corpus::from_contributors(vec![
        common::contributor("A", &[(COMMANDS, "Turn on the lights")]),
        common::contributor("B", &[(COMMANDS, "Call my sister")]),
    ]);
    let table = table("ContributorID,List#\nA,List 2\nGhost,List 9\n")?;

    let assignment = Resolver::new(SubsetLists::default()).by_table(&corpus, &table)?;

    assert_eq!(assignment.len(), 1);
    assert_eq!(assignment.subset_of(&"B".into()), None);
    assert_eq!(assignment.excluded(), &[ContributorId::from("B")]);
    Ok(())
}

/// Test that a table without the list column is rejected
#[test]
fn test_fromCsvReader_withoutListColumn_shouldReturnInvalidTable() {
    let result = ContributorTable::from_csv_reader(Cursor::new("ContributorID,Notes\nA,x\n"));
    assert!(matches!(result, Err(SplitError::InvalidTable(_))));
}

/// Test that resolve picks the table strategy when a table is given
#[test]
fn test_resolve_withAndWithoutTable_shouldSwitchStrategy() -> Result<()> {
    let corpus = Corpus::from_contributors(vec![common::contributor("A", &[(COMMANDS, "Turn on the lights")])]);
    let resolver = Resolver::new(SubsetLists::default());
    let table = table("ContributorID,List#\nA,List 10\n")?;

    let by_table = resolver.resolve(&corpus, &known_prompts(), Some(&table))?;
    let by_vote = resolver.resolve(&corpus, &known_prompts(), None)?;

    assert_eq!(by_table.subset_of(&"A".into()), Some(Subset::Test));
    assert_eq!(by_vote.subset_of(&"A".into()), Some(Subset::Train));
    Ok(())
}

/// Test that majority vote follows the subset with the most known texts
#[test]
fn test_byMajority_withMostlyDevTexts_shouldAssignDev() {
    let corpus = Corpus::from_contributors(vec![common::contributor(
        "A",
        &[
            (COMMANDS, "Turn on the lights"),
            (COMMANDS, "Call my sister"),
            (COMMANDS, "Read my messages"),
        ],
    )]);
    let mut prompts = known_prompts();
    prompts.insert(Subset::Dev, "Read my messages");

    let assignment = Resolver::new(SubsetLists::default()).by_majority(&corpus, &prompts);

    assert_eq!(assignment.subset_of(&"A".into()), Some(Subset::Dev));
}

/// Test that a dev/test tie resolves to dev
#[test]
fn test_byMajority_withDevTestTie_shouldAssignDev() {
    let corpus = Corpus::from_contributors(vec![common::contributor(
        "A",
        &[(COMMANDS, "Call my sister"), (COMMANDS, "Read my messages")],
    )]);

    let assignment = Resolver::new(SubsetLists::default()).by_majority(&corpus, &known_prompts());

    assert_eq!(assignment.subset_of(&"A".into()), Some(Subset::Dev));
}

/// Test that every contributor gets exactly one subset and reruns agree
#[test]
fn test_byMajority_runTwice_shouldBeCompleteAndDeterministic() {
    let corpus = Corpus::from_contributors(vec![
        common::contributor("A", &[(COMMANDS, "Turn on the lights")]),
        common::contributor("B", &[(COMMANDS, "Call my sister")]),
        common::contributor("C", &[(COMMANDS, "Read my messages")]),
        common::contributor("D", &[(COMMANDS, "Unknown prompt")]),
    ]);
    let resolver = Resolver::new(SubsetLists::default());

    let first = resolver.by_majority(&corpus, &known_prompts());
    let second = resolver.by_majority(&corpus, &known_prompts());

    assert_eq!(first, second);
    assert_eq!(first.len(), corpus.len());
    let per_subset: usize = Subset::ALL.iter().map(|s| first.contributors_in(*s).len()).sum();
    assert_eq!(per_subset, corpus.len());
    assert_eq!(first.subset_of(&"D".into()), Some(Subset::Train));
}

/// Test that the contributor manifest lists every subset with sorted IDs
#[test]
fn test_toManifest_shouldListSortedIdsPerSubset() {
    let corpus = Corpus::from_contributors(vec![
        common::contributor("Zed", &[(COMMANDS, "Turn on the lights")]),
        common::contributor("Amy", &[(COMMANDS, "Turn on the lights")]),
        common::contributor("Bob", &[(COMMANDS, "Read my messages")]),
    ]);

    let manifest = Resolver::new(SubsetLists::default())
        .by_majority(&corpus, &known_prompts())
        .to_manifest();

    let keys: Vec<&str> = manifest.keys().map(|k| k.as_str()).collect();
    assert_eq!(keys, vec!["dev", "test", "train"]);
    assert_eq!(manifest["train"], vec!["Amy".to_string(), "Zed".to_string()]);
    assert_eq!(manifest["test"], vec!["Bob".to_string()]);
    assert!(manifest["dev"].is_empty());
}

/// Test that an upper-case table key matches a lower-case corpus ID
#[test]
fn test_byTable_withUppercaseTableKey_shouldMatchLowercaseCorpusId() -> Result<()> {
    let corpus = Corpus::from_contributors(vec![common::contributor("abc-123", &[(COMMANDS, "Read my messages")])]);
    let table = table("ContributorID,List#\nABC-123,List 9\n")?;

    let assignment = Resolver::new(SubsetLists::default()).by_table(&corpus, &table)?;

    assert_eq!(assignment.subset_of(&"abc-123".into()), Some(Subset::Test));
    assert!(assignment.excluded().is_empty());
    Ok(())
}

/// Test that the lookup reports the table key that matched
#[test]
fn test_lookup_withMixedCaseId_shouldReturnMatchedKey() -> Result<()> {
    let table = table("ContributorID,List#\nABC-123,List 9\nXyz,List 1\n")?;

    assert_eq!(table.lookup(&"abc-123".into()), Some(("ABC-123", &[9][..])));
    assert_eq!(table.lookup(&"Xyz".into()), Some(("Xyz", &[1][..])));
    assert_eq!(table.lookup(&"XYZ".into()), Some(("Xyz", &[1][..])));
    assert_eq!(table.lookup(&"nobody".into()), None);
    Ok(())
}

/// Test that rows differing only in case resolve to the first key in sorted order
#[test]
fn test_lookup_withCaseCollidingRows_shouldPickFirstSortedKey() -> Result<()> {
    let table = table("ContributorID,List#\nAbc,List 1\nABC,List 9\n")?;

    assert_eq!(table.len(), 2);
    assert_eq!(table.lookup(&"abc".into()), Some(("ABC", &[9][..])));
    assert_eq!(table.lookup(&"Abc".into()), Some(("Abc", &[1][..])));
    Ok(())
}

/// Test that the marker strategy rejects markers outside the configured lists
#[test]
fn test_byMarkers_withMarkerOnUnmappedList_shouldReturnInvalidConfig() {
    let config = sapsplit::app_config::Config::default();
    let edition = SubsetLists {
        train: vec![1, 2, 3],
        dev: vec![4],
        test: vec![5],
    };
    let resolver = Resolver::new(edition).with_marker_prompts(config.marker_prompts.clone());
    let corpus = Corpus::from_contributors(vec![common::contributor("A", &[(COMMANDS, "Set a timer for 60 minutes.")])]);

    let result = resolver.by_markers(&corpus);

    assert!(matches!(result, Err(SplitError::InvalidConfig(ref message)) if message.contains("list 8")));
    assert!(Resolver::new(SubsetLists::default())
        .with_marker_prompts(config.marker_prompts)
        .validate_markers()
        .is_ok());
}
