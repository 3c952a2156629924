//! The content bank: a line-delimited JSON queue shared by both steps.
//!
//! `generate` appends to the end, `post` pops from the front. There is no
//! lock; the two steps must not run at the same time.
//!
//! ## Pop protocol
//!
//! 1. Read the whole file.
//! 2. Parse the first non-blank line as JSON. A syntax error leaves the file
//!    untouched.
//! 3. Write the remaining lines, byte-for-byte, to a temporary file in the
//!    same directory and rename it over the bank.
//! 4. Convert the popped value to a [`ContentEntry`]. A line without a caption
//!    has already been consumed at this point and is reported as
//!    [`BankError::InvalidEntry`].
//!
//! The rename in step 3 means a reader sees either the old or the new bank,
//! never a truncated one. A concurrent append that lands between steps 1
//! and 3 is still lost.

use crate::types::ContentEntry;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

/// File name used when no path is configured.
pub const DEFAULT_BANK_FILENAME: &str = "facebook_image_content_bank.jsonl";

#[derive(Error, Debug)]
pub enum BankError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed entry at top of bank: {0}")]
    Json(#[from] serde_json::Error),
    #[error("entry has no caption: {0}")]
    InvalidEntry(String),
}

/// Result of popping the front of the bank.
#[derive(Debug, Clone, PartialEq)]
pub enum PopOutcome {
    /// The bank file does not exist.
    Missing,
    /// The bank file exists but holds no entries.
    Empty,
    /// An entry was removed; `remaining` lines are left.
    Entry {
        entry: ContentEntry,
        remaining: usize,
    },
}

#[derive(Debug, Clone)]
pub struct ContentBank {
    path: PathBuf,
}

impl ContentBank {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append each value as one compact JSON line. Creates the file if needed.
    ///
    /// Returns the number of lines written.
    pub fn append(&self, entries: &[serde_json::Value]) -> Result<usize, BankError> {
        let mut buf = String::new();
        for entry in entries {
            buf.push_str(&serde_json::to_string(entry)?);
            buf.push('\n');
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(buf.as_bytes())?;
        debug!(path = %self.path.display(), count = entries.len(), "appended to bank");
        Ok(entries.len())
    }

    /// Number of entries waiting. A missing bank counts as zero.
    pub fn len(&self) -> Result<usize, BankError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(content.lines().filter(|l| !l.trim().is_empty()).count()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    pub fn is_empty(&self) -> Result<bool, BankError> {
        self.len().map(|n| n == 0)
    }

    /// Remove and return the first entry. See the [module docs](self).
    pub fn pop_front(&self) -> Result<PopOutcome, BankError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(PopOutcome::Missing),
            Err(e) => return Err(e.into()),
        };

        let lines: Vec<&str> = content.split_inclusive('\n').collect();
        let Some(first) = lines.iter().position(|l| !l.trim().is_empty()) else {
            return Ok(PopOutcome::Empty);
        };

        let value: serde_json::Value = serde_json::from_str(lines[first].trim())?;
        let rest = &lines[first + 1..];
        self.commit(&rest.concat())?;

        let remaining = rest.iter().filter(|l| !l.trim().is_empty()).count();
        debug!(path = %self.path.display(), remaining, "popped bank entry");

        match ContentEntry::from_value(value) {
            Some(entry) => Ok(PopOutcome::Entry { entry, remaining }),
            None => Err(BankError::InvalidEntry(lines[first].trim().to_string())),
        }
    }

    /// Replace the bank contents via write-to-temp + rename.
    fn commit(&self, content: &str) -> Result<(), BankError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}
