//! linksort - sort URL and bookmark lines into per-category files
//!
//! This library classifies lines of text files against ordered regex rules,
//! appends each line to its category file without duplicating existing
//! content, and optionally removes moved lines from their sources, asking for
//! confirmation at every mutating step.

pub mod actions;
pub mod category;
pub mod cli;
pub mod config;
pub mod confirm;
pub mod destination;
pub mod output;
pub mod reconcile;
pub mod source;

pub use actions::{CopyAction, PendingAction, RemovalAction};
pub use category::{Category, CategorySet};
pub use config::{CategoryConfig, ConfigError};
pub use confirm::{ConfirmMode, ConfirmPolicy, Confirmer};
pub use reconcile::{Reconciler, RemovalStrategy, RunOptions, RunReport};

pub use cli::{Cli, run_cli};
