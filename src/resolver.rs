/*!
 * Subset membership resolution.
 *
 * Decides which subset every contributor belongs to. Three strategies exist:
 * - an authoritative contributor → list table,
 * - a majority vote over the prompt texts each contributor uttered,
 * - marker prompts, texts known to occur in exactly one list.
 *
 * All of them return an `Assignment` by value and never touch the corpus.
 */

use anyhow::{Context, Result};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::io::Read;
use std::path::Path;

use crate::app_config::SubsetLists;
use crate::corpus::{Contributor, ContributorId, Corpus};
use crate::errors::SplitError;
use crate::prompts::SubsetPrompts;
use crate::subset::Subset;

// @const: Trailing integer of a List# cell, e.g. "List 7"
static LIST_NUMBER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+)\s*$").unwrap()
});

const ID_COLUMN: &str = "ContributorID";
const LIST_COLUMN: &str = "List#";

/// Contributor → subset map produced by the resolver
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assignment {
    subsets: BTreeMap<ContributorId, Subset>,
    excluded: Vec<ContributorId>,
}

impl Assignment {
    /// Subset of `id`, or None when it was excluded or never seen
    pub fn subset_of(&self, id: &ContributorId) -> Option<Subset> {
        self.subsets.get(id).copied()
    }

    /// Contributors assigned to `subset`, sorted
    pub fn contributors_in(&self, subset: Subset) -> Vec<&ContributorId> {
        self.subsets
            .iter()
            .filter(|(_, s)| **s == subset)
            .map(|(id, _)| id)
            .collect()
    }

    /// Contributors that were dropped with a warning
    pub fn excluded(&self) -> &[ContributorId] {
        &self.excluded
    }

    pub fn len(&self) -> usize {
        self.subsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subsets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ContributorId, Subset)> {
        self.subsets.iter().map(|(id, subset)| (id, *subset))
    }

    /// Subset name → sorted contributor IDs, the contributor-list manifest
    pub fn to_manifest(&self) -> BTreeMap<String, Vec<String>> {
        Subset::ALL
            .into_iter()
            .map(|subset| {
                let ids = self
                    .contributors_in(subset)
                    .into_iter()
                    .map(|id| id.to_string())
                    .collect();
                (subset.as_str().to_string(), ids)
            })
            .collect()
    }
}

/// Accumulates resolver decisions into an `Assignment`
#[derive(Debug, Default)]
pub struct AssignmentBuilder {
    assignment: Assignment,
}

impl AssignmentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&mut self, id: &ContributorId, subset: Subset) -> &mut Self {
        debug!("Contributor {} -> {}", id, subset);
        self.assignment.subsets.insert(id.clone(), subset);
        self
    }

    pub fn exclude(&mut self, id: &ContributorId) -> &mut Self {
        self.assignment.excluded.push(id.clone());
        self
    }

    pub fn build(self) -> Assignment {
        self.assignment
    }
}

/// Authoritative contributor → list numbers table
#[derive(Debug, Clone, Default)]
pub struct ContributorTable {
    rows: BTreeMap<String, Vec<u32>>,

    // @field: Lowercased ID → table keys with that lowercase form, sorted
    lowercase: BTreeMap<String, Vec<String>>,
}

impl ContributorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `contributor` read `list`
    pub fn insert(&mut self, contributor: &str, list: u32) {
        if !self.rows.contains_key(contributor) {
            let keys = self.lowercase.entry(contributor.to_lowercase()).or_default();
            if let Some(other) = keys.first() {
                warn!(
                    "Contributor table lists both {} and {}, which differ only in case",
                    other, contributor
                );
            }
            keys.push(contributor.to_string());
            keys.sort();
        }

        let lists = self.rows.entry(contributor.to_string()).or_default();
        if !lists.contains(&list) {
            lists.push(list);
        }
    }

    /// Load a CSV export with `ContributorID` and `List#` columns
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open contributor table: {:?}", path))?;
        Self::from_csv_reader(file)
            .with_context(|| format!("Failed to read contributor table: {:?}", path))
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, SplitError> {
        let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| SplitError::InvalidTable(format!("missing column '{}'", name)))
        };
        let id_column = column(ID_COLUMN)?;
        let list_column = column(LIST_COLUMN)?;

        let mut table = Self::new();
        for record in csv_reader.records() {
            let record = record?;
            let id = record.get(id_column).unwrap_or_default().trim();
            if id.is_empty() {
                continue;
            }
            let cell = record.get(list_column).unwrap_or_default();
            let list = parse_list_cell(cell).ok_or_else(|| {
                SplitError::InvalidTable(format!(
                    "List# '{}' for contributor {} does not end in a list number",
                    cell, id
                ))
            })?;
            table.insert(id, list);
        }

        Ok(table)
    }

    /// Table key and lists for `id`: exact match first, then a case-insensitive match.
    /// When several keys differ only in case, the first in sorted order wins.
    pub fn lookup(&self, id: &ContributorId) -> Option<(&str, &[u32])> {
        if let Some((key, lists)) = self.rows.get_key_value(id.as_str()) {
            return Some((key.as_str(), lists.as_slice()));
        }
        let key = self.lowercase.get(&id.to_lowercase())?.first()?;
        let lists = self.rows.get(key)?;
        debug!("Contributor {} found in table as {}", id, key);
        Some((key.as_str(), lists.as_slice()))
    }


    pub fn contributor_ids(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(|id| id.as_str())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Trailing integer of a List# cell
pub fn parse_list_cell(cell: &str) -> Option<u32> {
    LIST_NUMBER_REGEX
        .captures(cell)
        .and_then(|captures| captures[1].parse().ok())
}

/// What the marker strategy saw, in the shape of the per-list log
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerReport {
    /// Contributors that uttered markers of more than one list entry
    pub multi_list: Vec<(ContributorId, Vec<u32>)>,
    /// Contributors with exactly one marker, by list
    pub by_list: BTreeMap<u32, Vec<ContributorId>>,
    /// Contributors that uttered no marker
    pub unassigned: Vec<ContributorId>,
    /// Contributors whose markers span subsets
    pub conflicting: Vec<ContributorId>,
}

impl MarkerReport {
    /// Render as the sectioned text log
    pub fn to_log_text(&self, lists: &BTreeSet<u32>) -> String {
        let mut text = String::new();
        if !self.multi_list.is_empty() {
            text.push_str("############## Participants with 2 or more lists ##############\n");
            for (id, markers) in &self.multi_list {
                let markers: Vec<String> = markers.iter().map(|l| format!("list{}", l)).collect();
                let _ = writeln!(text, "{} {}", id, markers.join(" "));
            }
            text.push('\n');
        }
        for list in lists {
            let _ = writeln!(text, "############## list{} ##############", list);
            for id in self.by_list.get(list).into_iter().flatten() {
                let _ = writeln!(text, "{}", id);
            }
            text.push('\n');
        }
        if !self.unassigned.is_empty() {
            text.push_str("############## Participants not assigned to a list ##############\n");
            for id in &self.unassigned {
                let _ = writeln!(text, "{}", id);
            }
            text.push('\n');
        }
        text
    }
}

/// Assigns contributors to subsets under one list configuration
#[derive(Debug, Clone)]
pub struct Resolver {
    subsets: SubsetLists,
    marker_prompts: BTreeMap<String, u32>,
}

impl Resolver {
    pub fn new(subsets: SubsetLists) -> Self {
        Self {
            subsets,
            marker_prompts: BTreeMap::new(),
        }
    }

    pub fn with_marker_prompts(mut self, marker_prompts: BTreeMap<String, u32>) -> Self {
        self.marker_prompts = marker_prompts;
        self
    }

    /// Table strategy when a table is given, majority vote otherwise
    pub fn resolve(
        &self,
        corpus: &Corpus,
        prompts: &SubsetPrompts,
        table: Option<&ContributorTable>,
    ) -> Result<Assignment, SplitError> {
        match table {
            Some(table) => self.by_table(corpus, table),
            None => Ok(self.by_majority(corpus, prompts)),
        }
    }

    /// Assign each contributor to the subset whose known prompts they uttered most
    pub fn by_majority(&self, corpus: &Corpus, prompts: &SubsetPrompts) -> Assignment {
        let mut builder = AssignmentBuilder::new();
        for contributor in corpus.contributors() {
            let subset = Self::majority_subset(contributor, prompts);
            builder.assign(&contributor.id, subset);
        }
        builder.build()
    }

    // Ties, including all-zero counts, go to the earliest subset in enumeration order
    fn majority_subset(contributor: &Contributor, prompts: &SubsetPrompts) -> Subset {
        let texts = contributor.prompt_texts();
        let mut best = Subset::ALL[0];
        let mut best_count = 0;
        for (position, subset) in Subset::ALL.into_iter().enumerate() {
            let count = texts.iter().filter(|t| prompts.contains(subset, t)).count();
            if position == 0 || count > best_count {
                best = subset;
                best_count = count;
            }
        }

        if best_count == 0 {
            warn!(
                "Contributor {} uttered no prompt known to any subset; defaulting to {}",
                contributor.id, best
            );
        }
        best
    }

    /// Assign each contributor from the authoritative table
    pub fn by_table(&self, corpus: &Corpus, table: &ContributorTable) -> Result<Assignment, SplitError> {
        let mut builder = AssignmentBuilder::new();
        let mut matched: BTreeSet<&str> = BTreeSet::new();

        for contributor in corpus.contributors() {
            let Some((key, lists)) = table.lookup(&contributor.id) else {
                warn!(
                    "Contributor {} is not in the contributor table; its files are excluded",
                    contributor.id
                );
                builder.exclude(&contributor.id);
                continue;
            };
            matched.insert(key);

            let subset = self.subset_of_lists(contributor.id.as_str(), lists)?;
            builder.assign(&contributor.id, subset);
        }

        for id in table.contributor_ids() {
            if !matched.contains(id) {
                warn!("Contributor {} is in the contributor table but not in the corpus", id);
            }
        }

        Ok(builder.build())
    }

    // One subset for all of `lists`, or an error
    fn subset_of_lists(&self, contributor: &str, lists: &[u32]) -> Result<Subset, SplitError> {
        let mut found: Option<Subset> = None;
        for list in lists {
            let subset = self
                .subsets
                .subset_for(*list)
                .ok_or(SplitError::UnknownList(*list))?;
            match found {
                Some(previous) if previous != subset => {
                    return Err(SplitError::AmbiguousAssignment {
                        contributor: contributor.to_string(),
                        lists: lists.to_vec(),
                    });
                }
                _ => found = Some(subset),
            }
        }
        found.ok_or_else(|| SplitError::InvalidTable(format!("no lists for contributor {}", contributor)))
    }

    /// Every marker prompt must name a list of the configured subsets
    pub fn validate_markers(&self) -> Result<(), SplitError> {
        for (text, list) in &self.marker_prompts {
            if self.subsets.subset_for(*list).is_none() {
                return Err(SplitError::InvalidConfig(format!(
                    "Marker prompt '{}' refers to list {} which is not mapped to a subset",
                    text, list
                )));
            }
        }
        Ok(())
    }

    /// Assign each contributor from the marker prompts they uttered
    pub fn by_markers(&self, corpus: &Corpus) -> Result<(Assignment, MarkerReport), SplitError> {
        self.validate_markers()?;
        let mut builder = AssignmentBuilder::new();
        let mut report = MarkerReport::default();

        for contributor in corpus.contributors() {
            let markers: Vec<u32> = contributor
                .utterances
                .iter()
                .filter_map(|u| self.marker_prompts.get(&u.text).copied())
                .collect();

            if markers.is_empty() {
                warn!("Contributor {} uttered no marker prompt; excluded", contributor.id);
                report.unassigned.push(contributor.id.clone());
                builder.exclude(&contributor.id);
                continue;
            }

            if markers.len() > 1 {
                report.multi_list.push((contributor.id.clone(), markers.clone()));
            } else {
                report
                    .by_list
                    .entry(markers[0])
                    .or_default()
                    .push(contributor.id.clone());
            }

            let subsets: BTreeSet<Option<Subset>> = markers
                .iter()
                .map(|list| self.subsets.subset_for(*list))
                .collect();
            match subsets.into_iter().collect::<Vec<_>>().as_slice() {
                [Some(subset)] => {
                    builder.assign(&contributor.id, *subset);
                }
                _ => {
                    warn!("Unable to assign {}: lists {:?}", contributor.id, markers);
                    report.conflicting.push(contributor.id.clone());
                    builder.exclude(&contributor.id);
                }
            }
        }

        Ok((builder.build(), report))
    }
}
