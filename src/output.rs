//! Output formatting and styling module.
//!
//! All console output of a run goes through [`OutputFormatter`] so styling
//! stays consistent between the engine and the command line layer.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;

/// Manages CLI output with consistent styling.
///
/// - Success messages (green with ✓)
/// - Error messages (red with ✗, on stderr)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
/// - Progress bar while scanning input files
/// - Summary table of copied lines per category
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    ///
    /// # Example
    ///
    /// ```no_run
    /// use linksort::output::OutputFormatter;
    /// OutputFormatter::success("Copied 3 lines into category files");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark, on stderr.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    ///
    /// # Example
    ///
    /// ```no_run
    /// use linksort::output::OutputFormatter;
    /// OutputFormatter::error("Failed to rewrite bookmarks/a.txt");
    /// ```
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    ///
    /// # Example
    ///
    /// ```no_run
    /// use linksort::output::OutputFormatter;
    /// OutputFormatter::warning("2 file(s) could not be processed:");
    /// ```
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    ///
    /// # Example
    ///
    /// ```no_run
    /// use linksort::output::OutputFormatter;
    /// OutputFormatter::info("Sorting lines from bookmarks into sorted");
    /// ```
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a message without styling, used for action descriptions.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a bold section header preceded by a blank line.
    ///
    /// # Arguments
    ///
    /// * `header` - The header text
    ///
    /// # Example
    ///
    /// ```no_run
    /// use linksort::output::OutputFormatter;
    /// OutputFormatter::header("SUMMARY");
    /// ```
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Creates a progress bar over the input files being scanned.
    ///
    /// Hidden automatically when stderr is not a terminal.
    ///
    /// # Arguments
    ///
    /// * `total` - Number of input files
    ///
    /// # Returns
    ///
    /// A configured `ProgressBar`; set its message to the current file name.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use linksort::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(3);
    /// pb.set_message("a.txt");
    /// pb.inc(1);
    /// pb.finish_and_clear();
    /// ```
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// Prints copied line counts per category, with a total row.
    ///
    /// # Arguments
    ///
    /// * `copied_by_category` - Lines appended per category name
    ///
    /// # Example
    ///
    /// ```no_run
    /// use linksort::output::OutputFormatter;
    /// use std::collections::BTreeMap;
    ///
    /// let mut counts = BTreeMap::new();
    /// counts.insert("news".to_string(), 4);
    /// counts.insert("music".to_string(), 1);
    /// OutputFormatter::summary_table(&counts);
    /// ```
    pub fn summary_table(copied_by_category: &BTreeMap<String, usize>) {
        Self::header("SUMMARY");

        let width = copied_by_category
            .keys()
            .map(String::len)
            .max()
            .unwrap_or(0)
            .max(8); // "Category"

        println!(
            "{:<width$} | {}",
            "Category".bold(),
            "Lines".bold(),
            width = width
        );
        println!("{}", "-".repeat(width + 10));

        for (category, count) in copied_by_category {
            println!(
                "{:<width$} | {} {}",
                category,
                count.to_string().green(),
                line_word(*count),
                width = width
            );
        }

        let total: usize = copied_by_category.values().sum();
        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total.to_string().green().bold(),
            line_word(total),
            width = width
        );
    }

    /// Prints a dry-run notice message in yellow.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    ///
    /// # Example
    ///
    /// ```no_run
    /// use linksort::output::OutputFormatter;
    /// OutputFormatter::dry_run_notice("Lines would be copied as follows:");
    /// ```
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }
}

/// "line" or "lines".
pub fn line_word(count: usize) -> &'static str {
    if count == 1 { "line" } else { "lines" }
}
