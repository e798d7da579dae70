//! Command-line interface module for linksort.
//!
//! This module handles:
//! - Argument parsing
//! - Loading the category configuration before anything is touched
//! - Running the reconciliation and printing its summary

use crate::config::load_categories;
use crate::confirm::{ConfirmMode, ConfirmPolicy, Confirmer, PromptConfirmer};
use crate::output::{OutputFormatter, line_word};
use crate::reconcile::{Reconciler, RemovalStrategy, RunOptions, RunReport};
use clap::Parser;
use std::path::PathBuf;

/// Sort URL lines from text files into per-category files.
#[derive(Debug, Clone, Parser)]
#[command(name = "linksort", version)]
pub struct Cli {
    /// Directory with input .txt files.
    #[arg(short, long)]
    pub input_dir: PathBuf,

    /// Directory to write category files to (created if missing).
    #[arg(short, long)]
    pub output_dir: PathBuf,

    /// JSON or TOML file mapping category names to lists of regex patterns.
    #[arg(short, long)]
    pub categories_file: Option<PathBuf>,

    /// Auto-confirm every action (non-interactive).
    #[arg(short = 'y', long = "yes")]
    pub yes: bool,

    /// Remove lines from source files once they are in a category file.
    #[arg(long)]
    pub remove_moved_lines: bool,

    /// Which source lines count as moved when removing.
    #[arg(long, value_enum, default_value_t = RemovalStrategy::Recompute)]
    pub removal_strategy: RemovalStrategy,

    /// Ask once for everything, once per category, or once per line.
    #[arg(long = "confirm", value_enum, default_value_t = ConfirmMode::Batch)]
    pub confirm_mode: ConfirmMode,

    /// Show what would change without writing anything.
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            input_dir: self.input_dir.clone(),
            output_dir: self.output_dir.clone(),
            policy: ConfirmPolicy::new(self.yes, self.confirm_mode),
            remove_moved_lines: self.remove_moved_lines,
            removal_strategy: self.removal_strategy,
            dry_run: self.dry_run,
        }
    }
}

/// Runs linksort with interactive confirmation on stdin.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use linksort::cli::{Cli, run_cli};
///
/// let cli = Cli::parse_from(["linksort", "-i", "bookmarks", "-o", "sorted", "--yes"]);
/// match run_cli(&cli) {
///     Ok(report) => println!("{} lines copied", report.copied),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(cli: &Cli) -> Result<RunReport, String> {
    run_cli_with_confirmer(cli, &mut PromptConfirmer)
}

/// Runs linksort with the given confirmer.
///
/// The categories are loaded and validated first; a configuration error
/// returns before any file or directory is touched.
pub fn run_cli_with_confirmer(
    cli: &Cli,
    confirmer: &mut dyn Confirmer,
) -> Result<RunReport, String> {
    let categories = load_categories(cli.categories_file.as_deref())
        .map_err(|e| format!("Error loading categories: {}", e))?;

    if categories.is_empty() {
        OutputFormatter::warning("No categories defined; nothing will be sorted.");
    } else {
        OutputFormatter::info(&format!(
            "Categories: {}",
            categories.names().collect::<Vec<_>>().join(", ")
        ));
    }

    if cli.dry_run {
        OutputFormatter::dry_run_notice(&format!(
            "Analyzing contents of: {}",
            cli.input_dir.display()
        ));
    } else {
        OutputFormatter::info(&format!(
            "Sorting lines from {} into {}",
            cli.input_dir.display(),
            cli.output_dir.display()
        ));
    }

    let report = Reconciler::new(categories, cli.run_options())
        .run(confirmer)
        .map_err(|e| format!("Error: {}", e))?;

    print_report(cli, &report);
    Ok(report)
}

fn print_report(cli: &Cli, report: &RunReport) {
    if report.total_proposed() == 0 && report.is_complete_success() {
        OutputFormatter::success("Nothing to do: every categorized line is already sorted.");
        return;
    }

    if cli.dry_run {
        OutputFormatter::header("DRY RUN SUMMARY");
        OutputFormatter::plain(&format!(
            "  Copies proposed: {}",
            report.proposed_copies
        ));
        if cli.remove_moved_lines {
            OutputFormatter::plain(&format!(
                "  Removals proposed: {}",
                report.proposed_removals
            ));
        }
        OutputFormatter::success("Dry run complete. No files were modified.");
        return;
    }

    OutputFormatter::summary_table(&report.copied_by_category);

    if report.declined_copies > 0 {
        OutputFormatter::plain(&format!(
            "Declined: {} {} left in place",
            report.declined_copies,
            line_word(report.declined_copies)
        ));
    }
    if cli.remove_moved_lines {
        OutputFormatter::plain(&format!(
            "Removed from sources: {} {}",
            report.removed,
            line_word(report.removed)
        ));
    }

    if !report.is_complete_success() {
        OutputFormatter::warning(&format!(
            "{} file(s) could not be processed:",
            report.failures.len()
        ));
        for (path, reason) in &report.failures {
            OutputFormatter::error(&format!("{}: {}", path.display(), reason));
        }
    }
}
