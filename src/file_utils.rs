use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fs;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::errors::SplitError;

// @module: File and directory utilities

/// Indentation of split and contributor manifests
pub const MANIFEST_INDENT: &[u8] = b" ";

/// Indentation of diff reports
pub const REPORT_INDENT: &[u8] = b"  ";

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    /// All paths matching `pattern` below `dir`, sorted
    pub fn find_matches<P: AsRef<Path>>(dir: P, pattern: &str) -> Result<Vec<PathBuf>> {
        let full_pattern = Self::join_pattern(dir.as_ref(), pattern);
        let mut result = Vec::new();
        for entry in glob::glob(&full_pattern)
            .with_context(|| format!("Invalid glob pattern: {}", full_pattern))?
        {
            let path = entry.context("Failed to read glob match")?;
            result.push(path);
        }
        result.sort();
        Ok(result)
    }

    /// The one file matching `pattern` below `dir`
    pub fn find_single_match<P: AsRef<Path>>(dir: P, pattern: &str) -> Result<PathBuf> {
        let full_pattern = Self::join_pattern(dir.as_ref(), pattern);
        let mut matches = Self::find_matches(dir, pattern)?;
        if matches.len() != 1 {
            return Err(SplitError::GlobPattern {
                pattern: full_pattern,
                matches: matches.len(),
            }
            .into());
        }
        Ok(matches.remove(0))
    }

    // Escapes the directory so only `pattern` carries wildcards
    fn join_pattern(dir: &Path, pattern: &str) -> String {
        let escaped = glob::Pattern::escape(&dir.to_string_lossy());
        Path::new(&escaped).join(pattern).to_string_lossy().to_string()
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Serialize `value` as JSON with the given indentation.
    ///
    /// Key order follows the value's maps; the manifest types use `BTreeMap`
    /// so their keys come out sorted.
    pub fn write_json<P: AsRef<Path>, T: Serialize>(path: P, value: &T, indent: &[u8]) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            Self::ensure_dir(parent)?;
        }

        let file = fs::File::create(path)
            .with_context(|| format!("Failed to create file: {:?}", path))?;
        let mut writer = BufWriter::new(file);
        let formatter = PrettyFormatter::with_indent(indent);
        let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
        value
            .serialize(&mut serializer)
            .with_context(|| format!("Failed to serialize JSON to {:?}", path))?;
        writer
            .flush()
            .with_context(|| format!("Failed to write to file: {:?}", path))?;

        Ok(())
    }

    /// Recursively copy the directory `from` to `to`, which must not exist yet
    pub fn copy_dir_all<P1: AsRef<Path>, P2: AsRef<Path>>(from: P1, to: P2) -> Result<u64> {
        let from = from.as_ref();
        let to = to.as_ref();

        if !Self::dir_exists(from) {
            return Err(anyhow::anyhow!("Source directory does not exist: {:?}", from));
        }

        let mut copied = 0;
        for entry in WalkDir::new(from).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let relative = entry
                .path()
                .strip_prefix(from)
                .context("Walked outside of the source directory")?;
            let target = to.join(relative);

            if entry.file_type().is_dir() {
                Self::ensure_dir(&target)?;
            } else {
                fs::copy(entry.path(), &target).with_context(|| {
                    format!("Failed to copy {:?} to {:?}", entry.path(), target)
                })?;
                copied += 1;
            }
        }

        Ok(copied)
    }

    /// Append content to a log file with timestamp
    pub fn append_to_log_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        // Get current timestamp
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        // Open file in append mode, create if it doesn't exist
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file: {:?}", path.as_ref()))?;

        writeln!(file, "[{}] {}", timestamp, content)
            .with_context(|| format!("Failed to write to log file: {:?}", path.as_ref()))?;

        Ok(())
    }
}
