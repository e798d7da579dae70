//! Proposed copy and removal actions.
//!
//! Actions are plain descriptions of a change. They hold no file handles and
//! are replayed against the filesystem only after confirmation.
use crate::destination::DestinationCache;
use crate::reconcile::{ReconcileError, ReconcileResult};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Append a classified line to its category's destination file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyAction {
    pub category: String,
    pub source: PathBuf,
    /// 1-based line number in the source file.
    pub line_number: usize,
    /// The line verbatim, terminator included.
    pub line: String,
    pub destination: PathBuf,
}

/// Delete a line from its source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalAction {
    pub source: PathBuf,
    /// 1-based line number in the source file.
    pub line_number: usize,
    pub line: String,
    /// Category file that already holds the line.
    pub origin: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    Copy(CopyAction),
    Removal(RemovalAction),
}

/// What applying an action did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The line was appended to its destination.
    Copied,
    /// An identical line had already been appended this run; nothing written.
    AlreadyPresent,
    /// The removal was staged; the source file is rewritten later, once.
    Staged,
}

/// Mutable state actions are applied against.
pub struct ApplyContext<'a> {
    pub destinations: &'a mut DestinationCache,
    /// 1-based line numbers to drop, per source file.
    pub staged_removals: &'a mut BTreeMap<PathBuf, BTreeSet<usize>>,
}

impl PendingAction {
    /// One-line, human readable description of the action.
    pub fn describe(&self) -> String {
        match self {
            PendingAction::Copy(copy) => format!(
                "{}:{} {} --> {}",
                copy.source.display(),
                copy.line_number,
                copy.line.trim(),
                file_name(&copy.destination)
            ),
            PendingAction::Removal(removal) => format!(
                "{}:{} {} --> REMOVED (from {})",
                removal.source.display(),
                removal.line_number,
                removal.line.trim(),
                file_name(&removal.origin)
            ),
        }
    }

    /// Key used to batch confirmations: the category for copies, the source
    /// file for removals.
    pub fn group(&self) -> String {
        match self {
            PendingAction::Copy(copy) => copy.category.clone(),
            PendingAction::Removal(removal) => removal.source.display().to_string(),
        }
    }

    pub fn source(&self) -> &PathBuf {
        match self {
            PendingAction::Copy(copy) => &copy.source,
            PendingAction::Removal(removal) => &removal.source,
        }
    }

    /// Applies the action.
    ///
    /// Copies append to the destination right away and update the cache.
    /// Removals are only staged so each source file can be rewritten once.
    pub fn apply(&self, ctx: &mut ApplyContext<'_>) -> ReconcileResult<Applied> {
        match self {
            PendingAction::Copy(copy) => {
                let destination = ctx.destinations.resolve(&copy.category).map_err(|e| {
                    ReconcileError::DestinationRead {
                        path: copy.destination.clone(),
                        source: e,
                    }
                })?;
                let written =
                    destination
                        .append(&copy.line)
                        .map_err(|e| ReconcileError::DestinationWrite {
                            path: copy.destination.clone(),
                            source: e,
                        })?;
                Ok(if written {
                    Applied::Copied
                } else {
                    Applied::AlreadyPresent
                })
            }
            PendingAction::Removal(removal) => {
                ctx.staged_removals
                    .entry(removal.source.clone())
                    .or_default()
                    .insert(removal.line_number);
                Ok(Applied::Staged)
            }
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}
