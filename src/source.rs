//! In-memory view of a line-oriented source file.
//!
//! Lines keep their terminators so that a rewrite reproduces every retained
//! line byte for byte.
use std::collections::BTreeSet;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// A source file's lines as read from disk.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    lines: Vec<String>,
}

impl SourceFile {
    /// Reads the whole file, splitting after each `\n`.
    pub fn read(path: &Path) -> io::Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(Self::from_content(path, &content))
    }

    pub fn from_content(path: &Path, content: &str) -> Self {
        Self {
            path: path.to_path_buf(),
            lines: split_lines(content),
        }
    }

    /// Returns the line at a 1-based line number.
    pub fn line(&self, line_number: usize) -> Option<&str> {
        line_number
            .checked_sub(1)
            .and_then(|idx| self.lines.get(idx))
            .map(String::as_str)
    }

    /// Iterates `(line_number, line)` pairs with 1-based numbering.
    pub fn numbered_lines(&self) -> impl Iterator<Item = (usize, &str)> {
        self.lines
            .iter()
            .enumerate()
            .map(|(idx, line)| (idx + 1, line.as_str()))
    }

    /// Drops the given 1-based line numbers, keeping the rest in order.
    ///
    /// Returns how many lines were dropped.
    pub fn remove_lines(&mut self, line_numbers: &BTreeSet<usize>) -> usize {
        let before = self.lines.len();
        let mut line_number = 0;
        self.lines.retain(|_| {
            line_number += 1;
            !line_numbers.contains(&line_number)
        });
        before - self.lines.len()
    }

    /// Rewrites the file with the current lines in a single write.
    ///
    /// The file must still exist; a source deleted since it was read is an
    /// error and is not recreated.
    pub fn save(&self) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        file.write_all(self.lines.concat().as_bytes())
    }
}

/// Splits content into lines, each keeping its `\n` (or `\r\n`) terminator.
pub fn split_lines(content: &str) -> Vec<String> {
    content.split_inclusive('\n').map(str::to_string).collect()
}
