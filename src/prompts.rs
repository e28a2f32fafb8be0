/*!
 * Prompt catalog.
 *
 * Resolves (list, block, index) triples to prompt records and derives the
 * set of prompt texts each subset is known to contain. Two on-disk forms are
 * accepted: a directory of `list<N>.txt` files with one prompt per line, and
 * a JSON dump shaped `{"<list>": {"<block>": [[category, subcategory, text], ...]}}`
 * where a block may also be an object keyed by prompt index.
 */

use anyhow::{anyhow, Context, Result};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt::Write as _;
use std::path::Path;
use walkdir::WalkDir;

use crate::app_config::SubsetLists;
use crate::file_utils::FileManager;
use crate::subset::Subset;

// @const: Category given to prompts read from plain list files
pub const DEFAULT_CATEGORY: &str = "Digital Assistant Commands";

// @const: Plain list file name
static LIST_FILE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^list(\d+)\.txt$").unwrap()
});

/// A prompt a contributor is asked to utter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRecord {
    pub category: String,
    pub subcategory: String,
    pub text: String,
}

impl PromptRecord {
    pub fn new(category: &str, subcategory: &str, text: &str) -> Self {
        Self {
            category: category.to_string(),
            subcategory: subcategory.to_string(),
            text: text.trim().to_string(),
        }
    }
}

// Spreadsheet cells may be empty, which the dump writes as null
type RawPrompt = (Option<String>, Option<String>, Option<String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBlock {
    Sequence(Vec<RawPrompt>),
    Indexed(BTreeMap<String, RawPrompt>),
}

fn parse_number(key: &str, what: &str) -> Result<u32> {
    key.trim()
        .parse()
        .map_err(|_| anyhow!("Invalid {} number '{}' in prompt catalog", what, key))
}

/// Prompt records keyed by list, block and index
#[derive(Debug, Clone, Default)]
pub struct PromptCatalog {
    lists: BTreeMap<u32, BTreeMap<u32, BTreeMap<u32, PromptRecord>>>,
}

impl PromptCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the prompt at (list, block, index)
    pub fn insert(&mut self, list: u32, block: u32, index: u32, prompt: PromptRecord) {
        self.lists
            .entry(list)
            .or_default()
            .entry(block)
            .or_default()
            .insert(index, prompt);
    }

    /// Prompt at (list, block, index), if the catalog has one
    pub fn lookup(&self, list: u32, block: u32, index: u32) -> Option<&PromptRecord> {
        self.lists.get(&list)?.get(&block)?.get(&index)
    }

    /// List numbers present in the catalog
    pub fn list_numbers(&self) -> Vec<u32> {
        self.lists.keys().copied().collect()
    }

    /// Every prompt of `list`, in block then index order
    pub fn prompts_in_list(&self, list: u32) -> impl Iterator<Item = &PromptRecord> {
        self.lists
            .get(&list)
            .into_iter()
            .flat_map(|blocks| blocks.values())
            .flat_map(|prompts| prompts.values())
    }

    /// Load from a directory of list files or from a JSON dump, depending on `path`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if FileManager::dir_exists(path) {
            Self::from_list_dir(path)
        } else if FileManager::file_exists(path) {
            Self::from_json_file(path)
        } else {
            Err(anyhow!("Prompt catalog {:?} does not exist", path))
        }
    }

    /// Read `list<N>.txt` files; each non-empty line is one prompt of block 1
    pub fn from_list_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let mut catalog = Self::new();

        for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry
                .with_context(|| format!("Failed to read prompt list directory: {:?}", dir))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            let Some(captures) = LIST_FILE_REGEX.captures(&name) else {
                continue;
            };
            let list = parse_number(&captures[1], "list")?;

            let content = FileManager::read_to_string(entry.path())?;
            let mut index = 0;
            for line in content.lines() {
                let text = line.trim();
                if text.is_empty() {
                    continue;
                }
                index += 1;
                catalog.insert(list, 1, index, PromptRecord::new(DEFAULT_CATEGORY, "", text));
            }
            debug!("Loaded {} prompts for list {}", index, list);
        }

        if catalog.lists.is_empty() {
            return Err(anyhow!("No list<N>.txt files found in {:?}", dir));
        }
        Ok(catalog)
    }

    /// Read the JSON dump form
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = FileManager::read_to_string(path)?;
        Self::from_json_str(&content)
            .with_context(|| format!("Failed to parse prompt catalog {:?}", path))
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let raw: BTreeMap<String, BTreeMap<String, RawBlock>> = serde_json::from_str(content)?;
        let mut catalog = Self::new();

        for (list_key, blocks) in raw {
            let list = parse_number(&list_key, "list")?;
            for (block_key, block) in blocks {
                let block_number = parse_number(&block_key, "block")?;
                let indexed: Vec<(u32, RawPrompt)> = match block {
                    RawBlock::Sequence(prompts) => (1..).zip(prompts).collect(),
                    RawBlock::Indexed(prompts) => prompts
                        .into_iter()
                        .map(|(k, p)| -> Result<(u32, RawPrompt)> {
                            Ok((parse_number(&k, "prompt index")?, p))
                        })
                        .collect::<Result<Vec<_>>>()?,
                };
                for (index, (category, subcategory, text)) in indexed {
                    let Some(text) = text else {
                        continue;
                    };
                    catalog.insert(
                        list,
                        block_number,
                        index,
                        PromptRecord::new(
                            category.as_deref().unwrap_or_default(),
                            subcategory.as_deref().unwrap_or_default(),
                            &text,
                        ),
                    );
                }
            }
        }

        Ok(catalog)
    }

    /// Group every prompt text by the number of lists it occurs in
    pub fn list_overlap(&self) -> ListOverlap {
        let mut occurrences: BTreeMap<&str, Vec<u32>> = BTreeMap::new();
        for list in self.lists.keys() {
            for prompt in self.prompts_in_list(*list) {
                let lists = occurrences.entry(prompt.text.as_str()).or_default();
                if !lists.contains(list) {
                    lists.push(*list);
                }
            }
        }

        let mut overlap = ListOverlap::default();
        for (text, lists) in occurrences {
            match lists.as_slice() {
                [list] => {
                    overlap.single.insert(text.to_string(), *list);
                }
                _ => {
                    overlap.multi.insert(text.to_string(), lists);
                }
            }
        }
        debug!(
            "{} prompt texts occur in one list, {} in several",
            overlap.single.len(),
            overlap.multi.len()
        );
        overlap
    }

    /// Texts known a priori to occur in each subset, without `spontaneous_category` prompts
    pub fn subset_prompts(&self, subsets: &SubsetLists, spontaneous_category: &str) -> SubsetPrompts {
        let mut result = SubsetPrompts::default();
        for subset in Subset::ALL {
            for list in subsets.lists(subset) {
                if !self.lists.contains_key(list) {
                    warn!("Prompt catalog has no list {} (subset {})", list, subset);
                    continue;
                }
                for prompt in self.prompts_in_list(*list) {
                    if prompt.category != spontaneous_category {
                        result.insert(subset, &prompt.text);
                    }
                }
            }
        }
        result
    }
}

/// Which lists each prompt text occurs in
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListOverlap {
    /// Texts found in exactly one list, the candidate marker prompts
    pub single: BTreeMap<String, u32>,
    /// Texts found in two or more lists, with those lists in ascending order
    pub multi: BTreeMap<String, Vec<u32>>,
}

impl ListOverlap {
    /// Render as a two-section text report
    pub fn to_log_text(&self) -> String {
        let mut text = String::from("############## Prompts in 2 or more lists ##############\n");
        for (prompt, lists) in &self.multi {
            let lists: Vec<String> = lists.iter().map(|l| format!("list{}", l)).collect();
            let _ = writeln!(text, "{} [{}]", prompt, lists.join(", "));
        }
        text.push_str("\n############## Prompts in exactly one list ##############\n");
        for (prompt, list) in &self.single {
            let _ = writeln!(text, "{} list{}", prompt, list);
        }
        text
    }
}

/// Prompt texts known to occur in each subset
#[derive(Debug, Clone, Default)]
pub struct SubsetPrompts {
    sets: HashMap<Subset, HashSet<String>>,
}

impl SubsetPrompts {
    pub fn insert(&mut self, subset: Subset, text: &str) {
        self.sets.entry(subset).or_default().insert(text.trim().to_string());
    }

    /// Whether `text` is known to occur in `subset`
    pub fn contains(&self, subset: Subset, text: &str) -> bool {
        self.sets.get(&subset).is_some_and(|texts| texts.contains(text))
    }

    /// Number of known texts for `subset`
    pub fn len(&self, subset: Subset) -> usize {
        self.sets.get(&subset).map_or(0, |texts| texts.len())
    }
}
