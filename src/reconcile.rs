//! Reconciliation of input files against per-category destination files.
//!
//! A run has two phases:
//!
//! 1. **Classify & copy**: every line of every input file is classified; lines
//!    not yet present in their category's destination are proposed as copies,
//!    confirmed, and appended.
//! 2. **Removal** (optional): lines that now live in a destination file are
//!    proposed for removal from their source, confirmed, and each source file
//!    is rewritten once.
//!
//! Declining a copy keeps the line in its source and excludes it from removal
//! for the rest of the run.
use crate::actions::{Applied, ApplyContext, CopyAction, PendingAction, RemovalAction};
use crate::category::CategorySet;
use crate::confirm::{ConfirmPolicy, Confirmer};
use crate::destination::{CategorizedLines, DestinationCache, categorized_lines, txt_files};
use crate::output::{OutputFormatter, line_word};
use crate::source::SourceFile;
use clap::ValueEnum;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// How removal candidates are found in phase 2.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum RemovalStrategy {
    /// Remove exactly the lines copied in this run.
    Recorded,
    /// Remove every source line whose trimmed content appears in any
    /// destination file, including lines moved by earlier runs.
    #[default]
    Recompute,
}

/// Settings for one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub policy: ConfirmPolicy,
    pub remove_moved_lines: bool,
    pub removal_strategy: RemovalStrategy,
    /// Print proposals without confirming or writing anything.
    pub dry_run: bool,
}

impl RunOptions {
    pub fn new(input_dir: &Path, output_dir: &Path) -> Self {
        Self {
            input_dir: input_dir.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            policy: ConfirmPolicy::default(),
            remove_moved_lines: false,
            removal_strategy: RemovalStrategy::default(),
            dry_run: false,
        }
    }
}

/// Outcome of a run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub proposed_copies: usize,
    /// Lines actually appended to a destination.
    pub copied: usize,
    pub declined_copies: usize,
    pub proposed_removals: usize,
    pub removed: usize,
    pub declined_removals: usize,
    pub copied_by_category: BTreeMap<String, usize>,
    /// Files whose processing failed, with the reason.
    pub failures: Vec<(PathBuf, String)>,
}

impl RunReport {
    /// Total number of actions proposed in either phase.
    pub fn total_proposed(&self) -> usize {
        self.proposed_copies + self.proposed_removals
    }

    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Removal proposals for one source file, with the content they were made against.
#[derive(Debug)]
pub struct RemovalPlan {
    pub source: SourceFile,
    pub actions: Vec<RemovalAction>,
}

/// Errors raised while reconciling files.
#[derive(Debug)]
pub enum ReconcileError {
    /// The input directory is missing or cannot be listed.
    InputDirRead {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to create the output directory.
    OutputDirCreation {
        path: PathBuf,
        source: std::io::Error,
    },
    SourceRead {
        path: PathBuf,
        source: std::io::Error,
    },
    SourceWrite {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A source file no longer holds the line a removal was planned for.
    SourceChanged { path: PathBuf, line_number: usize },
    DestinationRead {
        path: PathBuf,
        source: std::io::Error,
    },
    DestinationWrite {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InputDirRead { path, source } => {
                write!(f, "Cannot read input directory {}: {}", path.display(), source)
            }
            Self::OutputDirCreation { path, source } => {
                write!(
                    f,
                    "Failed to create output directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::SourceRead { path, source } => {
                write!(f, "Failed to read {}: {}", path.display(), source)
            }
            Self::SourceWrite { path, source } => {
                write!(f, "Failed to rewrite {}: {}", path.display(), source)
            }
            Self::SourceChanged { path, line_number } => {
                write!(
                    f,
                    "{} changed during the run (line {} differs); file left untouched",
                    path.display(),
                    line_number
                )
            }
            Self::DestinationRead { path, source } => {
                write!(f, "Failed to read category file {}: {}", path.display(), source)
            }
            Self::DestinationWrite { path, source } => {
                write!(
                    f,
                    "Failed to append to category file {}: {}",
                    path.display(),
                    source
                )
            }
        }
    }
}

impl std::error::Error for ReconcileError {}

/// Result type for reconciliation operations.
pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Drives one run over an input directory.
///
/// The destination cache lives exactly as long as the reconciler; create a new
/// one for every run.
pub struct Reconciler {
    categories: CategorySet,
    options: RunOptions,
    destinations: DestinationCache,
    /// Copies accepted and applied in phase 1.
    moved: Vec<CopyAction>,
    /// `(source, line number)` of copies declined in phase 1.
    declined: HashSet<(PathBuf, usize)>,
    /// Categories whose destination file could not be read.
    unreadable_categories: HashSet<String>,
    report: RunReport,
}

impl Reconciler {
    pub fn new(categories: CategorySet, options: RunOptions) -> Self {
        let destinations = DestinationCache::new(&options.output_dir);
        Self {
            categories,
            options,
            destinations,
            moved: Vec::new(),
            declined: HashSet::new(),
            unreadable_categories: HashSet::new(),
            report: RunReport::default(),
        }
    }

    /// Runs both phases and returns the report.
    ///
    /// # Errors
    ///
    /// Fails only for run-level problems: an unreadable input directory or an
    /// output directory that cannot be created. Per-file failures are collected
    /// in [`RunReport::failures`].
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use linksort::category::CategorySet;
    /// use linksort::confirm::PromptConfirmer;
    /// use linksort::reconcile::{Reconciler, RunOptions};
    /// use std::path::Path;
    ///
    /// let options = RunOptions::new(Path::new("bookmarks"), Path::new("sorted"));
    /// let report = Reconciler::new(CategorySet::builtin(), options)
    ///     .run(&mut PromptConfirmer)
    ///     .expect("run failed");
    /// println!("copied {} lines", report.copied);
    /// ```
    pub fn run(mut self, confirmer: &mut dyn Confirmer) -> ReconcileResult<RunReport> {
        let files = self.scan_inputs()?;

        if self.options.dry_run {
            self.preview(&files);
            return Ok(self.report);
        }

        fs::create_dir_all(&self.options.output_dir).map_err(|e| {
            ReconcileError::OutputDirCreation {
                path: self.options.output_dir.clone(),
                source: e,
            }
        })?;

        let copies = self.plan_copies(&files);
        self.apply_copies(copies, confirmer);

        if self.options.remove_moved_lines {
            OutputFormatter::header(
                "Removing lines from source files that are already in category files",
            );
            let moved = std::mem::take(&mut self.moved);
            let plans = self.plan_removals(&files, &moved);
            self.apply_removals(plans, confirmer);
        }

        Ok(self.report)
    }

    /// Lists `*.txt` files in the input directory, sorted by path.
    pub fn scan_inputs(&self) -> ReconcileResult<Vec<PathBuf>> {
        let input_dir = &self.options.input_dir;
        if !input_dir.is_dir() {
            return Err(ReconcileError::InputDirRead {
                path: input_dir.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "not an existing directory",
                ),
            });
        }

        txt_files(input_dir).map_err(|e| ReconcileError::InputDirRead {
            path: input_dir.clone(),
            source: e,
        })
    }

    /// Phase 1 planning: classify every line and propose copies.
    ///
    /// Proposals are ordered by category (category-set order), then by file and
    /// line. A file that cannot be read is reported and contributes nothing. A
    /// destination that cannot be read is reported once, and only lines of
    /// that category are skipped.
    pub fn plan_copies(&mut self, files: &[PathBuf]) -> Vec<CopyAction> {
        let pb = OutputFormatter::create_progress_bar(files.len() as u64);
        let mut copies = Vec::new();

        for path in files {
            pb.set_message(display_name(path));
            match self.plan_file(path) {
                Ok(mut planned) => copies.append(&mut planned),
                Err(e) => self.record_failure(path, e),
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        // stable: file and line order survive within a category
        copies.sort_by_key(|copy| {
            self.categories
                .position(&copy.category)
                .unwrap_or(usize::MAX)
        });
        copies
    }

    fn plan_file(&mut self, path: &Path) -> ReconcileResult<Vec<CopyAction>> {
        let source = SourceFile::read(path).map_err(|e| ReconcileError::SourceRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut copies = Vec::new();
        for (line_number, line) in source.numbered_lines() {
            let Some(category) = self.categories.classify(line).map(str::to_string) else {
                continue;
            };
            if self.unreadable_categories.contains(&category) {
                continue;
            }

            let destination_path = self.destinations.path_for(&category);
            let destination = match self.destinations.resolve(&category) {
                Ok(destination) => destination,
                Err(e) => {
                    self.record_failure(
                        &destination_path,
                        ReconcileError::DestinationRead {
                            path: destination_path.clone(),
                            source: e,
                        },
                    );
                    self.unreadable_categories.insert(category);
                    continue;
                }
            };

            // Already migrated by an earlier run
            if destination.contains(line) {
                continue;
            }

            copies.push(CopyAction {
                category,
                source: path.to_path_buf(),
                line_number,
                line: line.to_string(),
                destination: destination_path,
            });
        }

        Ok(copies)
    }

    /// Phase 1 apply: confirm proposals and append the accepted ones.
    pub fn apply_copies(&mut self, copies: Vec<CopyAction>, confirmer: &mut dyn Confirmer) {
        if copies.is_empty() {
            OutputFormatter::info("No new lines to copy.");
            return;
        }

        self.report.proposed_copies += copies.len();
        let actions: Vec<PendingAction> = copies.into_iter().map(PendingAction::Copy).collect();
        let decisions =
            self.options
                .policy
                .decide(&actions, "Confirm line copy operations?", confirmer);

        let mut staged = BTreeMap::new();
        for (action, accepted) in actions.into_iter().zip(decisions) {
            let PendingAction::Copy(copy) = &action else {
                continue;
            };

            if !accepted {
                self.report.declined_copies += 1;
                self.declined
                    .insert((copy.source.clone(), copy.line_number));
                continue;
            }

            let mut ctx = ApplyContext {
                destinations: &mut self.destinations,
                staged_removals: &mut staged,
            };
            match action.apply(&mut ctx) {
                Ok(applied) => {
                    if applied == Applied::Copied {
                        self.report.copied += 1;
                        *self
                            .report
                            .copied_by_category
                            .entry(copy.category.clone())
                            .or_insert(0) += 1;
                    }
                    self.moved.push(copy.clone());
                }
                Err(e) => {
                    let path = copy.destination.clone();
                    self.record_failure(&path, e);
                }
            }
        }

        if self.report.copied > 0 {
            OutputFormatter::success(&format!(
                "Copied {} {} into category files",
                self.report.copied,
                line_word(self.report.copied)
            ));
        }
    }

    /// Phase 2 planning: find source lines to remove.
    ///
    /// `moved` are the copies treated as done: the accepted copies of a real
    /// run, or every proposal in a dry run.
    pub fn plan_removals(&mut self, files: &[PathBuf], moved: &[CopyAction]) -> Vec<RemovalPlan> {
        match self.options.removal_strategy {
            RemovalStrategy::Recorded => self.plan_recorded_removals(moved),
            RemovalStrategy::Recompute => self.plan_recomputed_removals(files, moved),
        }
    }

    fn plan_recorded_removals(&mut self, moved: &[CopyAction]) -> Vec<RemovalPlan> {
        let mut by_source: BTreeMap<&PathBuf, Vec<&CopyAction>> = BTreeMap::new();
        for copy in moved {
            by_source.entry(&copy.source).or_default().push(copy);
        }

        let mut plans = Vec::new();
        for (path, copies) in by_source {
            let source = match SourceFile::read(path) {
                Ok(source) => source,
                Err(e) => {
                    self.record_failure(
                        path,
                        ReconcileError::SourceRead {
                            path: path.clone(),
                            source: e,
                        },
                    );
                    continue;
                }
            };

            if let Some(changed) = copies
                .iter()
                .find(|copy| source.line(copy.line_number) != Some(copy.line.as_str()))
            {
                self.record_failure(
                    path,
                    ReconcileError::SourceChanged {
                        path: path.clone(),
                        line_number: changed.line_number,
                    },
                );
                continue;
            }

            let mut actions: Vec<RemovalAction> = copies
                .into_iter()
                .map(|copy| RemovalAction {
                    source: path.clone(),
                    line_number: copy.line_number,
                    line: copy.line.clone(),
                    origin: copy.destination.clone(),
                })
                .collect();
            actions.sort_by_key(|removal| removal.line_number);

            plans.push(RemovalPlan { source, actions });
        }
        plans
    }

    fn plan_recomputed_removals(
        &mut self,
        files: &[PathBuf],
        moved: &[CopyAction],
    ) -> Vec<RemovalPlan> {
        let mut known = match categorized_lines(&self.options.output_dir) {
            Ok(found) => found,
            Err(e) => {
                let path = self.options.output_dir.clone();
                self.record_failure(
                    &path,
                    ReconcileError::DestinationRead {
                        path: path.clone(),
                        source: e,
                    },
                );
                return Vec::new();
            }
        };
        for (path, e) in std::mem::take(&mut known.unreadable) {
            self.record_failure(
                &path,
                ReconcileError::DestinationRead {
                    path: path.clone(),
                    source: e,
                },
            );
        }
        // Proposals are not on disk yet in a dry run
        for copy in moved {
            known
                .lines
                .entry(copy.line.trim().to_string())
                .or_insert_with(|| copy.destination.clone());
        }

        let mut plans = Vec::new();
        for path in files {
            let source = match SourceFile::read(path) {
                Ok(source) => source,
                Err(e) => {
                    self.record_failure(
                        path,
                        ReconcileError::SourceRead {
                            path: path.clone(),
                            source: e,
                        },
                    );
                    continue;
                }
            };

            let actions: Vec<RemovalAction> = source
                .numbered_lines()
                .filter(|(line_number, _)| !self.declined.contains(&(path.clone(), *line_number)))
                .filter_map(|(line_number, line)| {
                    let origin = removal_origin(&known, line)?;
                    Some(RemovalAction {
                        source: path.clone(),
                        line_number,
                        line: line.to_string(),
                        origin: origin.clone(),
                    })
                })
                .collect();

            if !actions.is_empty() {
                plans.push(RemovalPlan { source, actions });
            }
        }
        plans
    }

    /// Phase 2 apply: confirm removals, then rewrite each affected file once.
    pub fn apply_removals(&mut self, plans: Vec<RemovalPlan>, confirmer: &mut dyn Confirmer) {
        let actions: Vec<PendingAction> = plans
            .iter()
            .flat_map(|plan| plan.actions.iter().cloned().map(PendingAction::Removal))
            .collect();

        if actions.is_empty() {
            OutputFormatter::info("No lines to remove.");
            return;
        }

        self.report.proposed_removals += actions.len();
        let decisions =
            self.options
                .policy
                .decide(&actions, "Confirm line removal operations?", confirmer);

        let mut staged: BTreeMap<PathBuf, BTreeSet<usize>> = BTreeMap::new();
        for (action, accepted) in actions.iter().zip(decisions) {
            if !accepted {
                self.report.declined_removals += 1;
                continue;
            }
            let mut ctx = ApplyContext {
                destinations: &mut self.destinations,
                staged_removals: &mut staged,
            };
            if let Err(e) = action.apply(&mut ctx) {
                let path = action.source().clone();
                self.record_failure(&path, e);
            }
        }

        for mut plan in plans {
            let Some(line_numbers) = staged.get(&plan.source.path) else {
                continue;
            };

            let removed = plan.source.remove_lines(line_numbers);
            match plan.source.save() {
                Ok(()) => {
                    self.report.removed += removed;
                    OutputFormatter::success(&format!(
                        "Removed {} {} from {}",
                        removed,
                        line_word(removed),
                        plan.source.path.display()
                    ));
                }
                Err(e) => {
                    let path = plan.source.path.clone();
                    self.record_failure(
                        &path,
                        ReconcileError::SourceWrite {
                            path: path.clone(),
                            source: e,
                        },
                    );
                }
            }
        }
    }

    /// Prints what a real run would propose, touching nothing.
    fn preview(&mut self, files: &[PathBuf]) {
        let copies = self.plan_copies(files);
        self.report.proposed_copies = copies.len();

        OutputFormatter::dry_run_notice("Lines would be copied as follows:");
        for copy in &copies {
            OutputFormatter::plain(&PendingAction::Copy(copy.clone()).describe());
        }

        if self.options.remove_moved_lines {
            let plans = self.plan_removals(files, &copies);
            OutputFormatter::dry_run_notice("Lines would be removed as follows:");
            for plan in &plans {
                self.report.proposed_removals += plan.actions.len();
                for removal in &plan.actions {
                    OutputFormatter::plain(&PendingAction::Removal(removal.clone()).describe());
                }
            }
        }
    }

    fn record_failure(&mut self, path: &Path, error: ReconcileError) {
        OutputFormatter::error(&error.to_string());
        self.report
            .failures
            .push((path.to_path_buf(), error.to_string()));
    }
}

/// The category file holding `line`, if any. Blank lines never match.
fn removal_origin<'a>(known: &'a CategorizedLines, line: &str) -> Option<&'a PathBuf> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    known.origin(trimmed)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;
    use crate::confirm::{ConfirmMode, FixedConfirmer, ScriptedConfirmer};
    use tempfile::TempDir;

    /// Accepts everything, deleting `target` when a question mentions `phase`.
    struct DeletingConfirmer {
        phase: &'static str,
        target: PathBuf,
    }

    impl Confirmer for DeletingConfirmer {
        fn confirm(&mut self, question: &str) -> bool {
            if question.contains(self.phase) {
                fs::remove_file(&self.target).expect("Failed to delete file");
            }
            true
        }
    }

    struct Dirs {
        _temp_dir: TempDir,
        input: PathBuf,
        output: PathBuf,
    }

    fn dirs() -> Dirs {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let input = temp_dir.path().join("input");
        let output = temp_dir.path().join("output");
        fs::create_dir(&input).expect("Failed to create input directory");
        Dirs {
            _temp_dir: temp_dir,
            input,
            output,
        }
    }

    fn news() -> CategorySet {
        CategorySet::new(vec![Category::new("news", &[r"nytimes\.com"]).unwrap()])
    }

    fn options(dirs: &Dirs, auto_confirm: bool, remove: bool) -> RunOptions {
        RunOptions {
            policy: ConfirmPolicy::new(auto_confirm, ConfirmMode::Batch),
            remove_moved_lines: remove,
            ..RunOptions::new(&dirs.input, &dirs.output)
        }
    }

    #[test]
    fn test_plan_copies_skips_unclassified_and_present_lines() {
        let dirs = dirs();
        fs::write(
            dirs.input.join("a.txt"),
            "http://nytimes.com/x\nhttp://example.com/y\nhttp://nytimes.com/z\n",
        )
        .unwrap();
        fs::create_dir(&dirs.output).unwrap();
        fs::write(dirs.output.join("news.txt"), "http://nytimes.com/z\n").unwrap();

        let mut reconciler = Reconciler::new(news(), options(&dirs, true, false));
        let files = reconciler.scan_inputs().unwrap();
        let copies = reconciler.plan_copies(&files);

        assert_eq!(copies.len(), 1);
        assert_eq!(copies[0].line_number, 1);
        assert_eq!(copies[0].line, "http://nytimes.com/x\n");
        assert_eq!(copies[0].destination, dirs.output.join("news.txt"));
    }

    #[test]
    fn test_plan_copies_orders_by_category() {
        let dirs = dirs();
        fs::write(
            dirs.input.join("a.txt"),
            "https://spotify.com/1\nhttps://nytimes.com/2\nhttps://spotify.com/3\n",
        )
        .unwrap();
        let categories = CategorySet::new(vec![
            Category::new("news", &["nytimes"]).unwrap(),
            Category::new("music", &["spotify"]).unwrap(),
        ]);

        let mut reconciler = Reconciler::new(categories, options(&dirs, true, false));
        let files = reconciler.scan_inputs().unwrap();
        let order: Vec<_> = reconciler
            .plan_copies(&files)
            .iter()
            .map(|c| (c.category.clone(), c.line_number))
            .collect();

        assert_eq!(
            order,
            vec![
                ("news".to_string(), 2),
                ("music".to_string(), 1),
                ("music".to_string(), 3)
            ]
        );
    }

    #[test]
    fn test_identical_lines_are_written_once() {
        let dirs = dirs();
        fs::write(dirs.input.join("a.txt"), "http://nytimes.com/x\n").unwrap();
        fs::write(dirs.input.join("b.txt"), "http://nytimes.com/x\n").unwrap();

        let report = Reconciler::new(news(), options(&dirs, true, true))
            .run(&mut FixedConfirmer(false))
            .unwrap();

        assert_eq!(report.proposed_copies, 2);
        assert_eq!(report.copied, 1);
        assert_eq!(
            fs::read_to_string(dirs.output.join("news.txt")).unwrap(),
            "http://nytimes.com/x\n"
        );
        // both sources are cleaned, the line lives in news.txt
        assert_eq!(fs::read_to_string(dirs.input.join("a.txt")).unwrap(), "");
        assert_eq!(fs::read_to_string(dirs.input.join("b.txt")).unwrap(), "");
    }

    #[test]
    fn test_recorded_strategy_removes_only_moved_lines() {
        let dirs = dirs();
        fs::create_dir(&dirs.output).unwrap();
        fs::write(dirs.output.join("news.txt"), "http://nytimes.com/old\n").unwrap();
        fs::write(
            dirs.input.join("a.txt"),
            "http://nytimes.com/old\nhttp://nytimes.com/new\n",
        )
        .unwrap();

        let mut opts = options(&dirs, true, true);
        opts.removal_strategy = RemovalStrategy::Recorded;
        let report = Reconciler::new(news(), opts)
            .run(&mut FixedConfirmer(false))
            .unwrap();

        assert_eq!(report.removed, 1);
        assert_eq!(
            fs::read_to_string(dirs.input.join("a.txt")).unwrap(),
            "http://nytimes.com/old\n"
        );
    }

    #[test]
    fn test_recompute_strategy_removes_previously_moved_lines() {
        let dirs = dirs();
        fs::create_dir(&dirs.output).unwrap();
        fs::write(dirs.output.join("news.txt"), "http://nytimes.com/old\n").unwrap();
        fs::write(
            dirs.input.join("a.txt"),
            "http://nytimes.com/old\nhttp://nytimes.com/new\nkeep me\n",
        )
        .unwrap();

        let report = Reconciler::new(news(), options(&dirs, true, true))
            .run(&mut FixedConfirmer(false))
            .unwrap();

        assert_eq!(report.copied, 1);
        assert_eq!(report.removed, 2);
        assert_eq!(fs::read_to_string(dirs.input.join("a.txt")).unwrap(), "keep me\n");
    }

    #[test]
    fn test_declined_copy_is_never_removed() {
        let dirs = dirs();
        // the same line twice: accept the first copy, decline the second
        fs::write(
            dirs.input.join("a.txt"),
            "http://nytimes.com/x\nother\nhttp://nytimes.com/x\n",
        )
        .unwrap();

        let mut opts = options(&dirs, false, true);
        opts.policy.mode = ConfirmMode::Line;
        let mut confirmer = ScriptedConfirmer::new([true, false, true]);
        let report = Reconciler::new(news(), opts).run(&mut confirmer).unwrap();

        assert_eq!(report.declined_copies, 1);
        assert_eq!(report.proposed_removals, 1);
        assert_eq!(
            fs::read_to_string(dirs.input.join("a.txt")).unwrap(),
            "other\nhttp://nytimes.com/x\n"
        );
    }

    #[test]
    fn test_declined_removal_keeps_line_in_place() {
        let dirs = dirs();
        fs::write(
            dirs.input.join("a.txt"),
            "http://nytimes.com/1\nmid\nhttp://nytimes.com/2\n",
        )
        .unwrap();

        let mut opts = options(&dirs, false, true);
        opts.policy.mode = ConfirmMode::Line;
        // accept both copies, then remove only the second line
        let mut confirmer = ScriptedConfirmer::new([true, true, false, true]);
        let report = Reconciler::new(news(), opts).run(&mut confirmer).unwrap();

        assert_eq!(report.removed, 1);
        assert_eq!(report.declined_removals, 1);
        assert_eq!(
            fs::read_to_string(dirs.input.join("a.txt")).unwrap(),
            "http://nytimes.com/1\nmid\n"
        );
    }

    #[test]
    fn test_recorded_removal_skips_changed_file() {
        let dirs = dirs();
        let source = dirs.input.join("a.txt");
        fs::write(&source, "http://nytimes.com/x\n").unwrap();

        let mut opts = options(&dirs, true, true);
        opts.removal_strategy = RemovalStrategy::Recorded;
        let mut reconciler = Reconciler::new(news(), opts);
        let files = reconciler.scan_inputs().unwrap();
        fs::create_dir(&dirs.output).unwrap();
        let copies = reconciler.plan_copies(&files);
        reconciler.apply_copies(copies.clone(), &mut FixedConfirmer(true));

        // edited by someone else between the phases
        fs::write(&source, "something else\n").unwrap();
        let plans = reconciler.plan_removals(&files, &copies);

        assert!(plans.is_empty());
        assert_eq!(reconciler.report.failures.len(), 1);
        assert_eq!(fs::read_to_string(&source).unwrap(), "something else\n");
    }

    #[test]
    fn test_unreadable_source_does_not_stop_other_files() {
        let dirs = dirs();
        // not valid UTF-8, so it cannot be read as lines
        fs::write(dirs.input.join("a.txt"), [0xff, 0xfe, 0x00, 0x0a]).unwrap();
        fs::write(dirs.input.join("b.txt"), "http://nytimes.com/x\n").unwrap();

        let report = Reconciler::new(news(), options(&dirs, true, true))
            .run(&mut FixedConfirmer(true))
            .unwrap();

        assert!(!report.is_complete_success());
        assert!(
            report
                .failures
                .iter()
                .all(|(path, _)| path == &dirs.input.join("a.txt"))
        );
        assert_eq!(report.copied, 1);
        assert_eq!(fs::read_to_string(dirs.input.join("b.txt")).unwrap(), "");
        assert_eq!(
            fs::read(dirs.input.join("a.txt")).unwrap(),
            vec![0xff, 0xfe, 0x00, 0x0a]
        );
    }

    #[test]
    fn test_source_deleted_before_rewrite_is_not_recreated() {
        let dirs = dirs();
        let deleted = dirs.input.join("a.txt");
        fs::write(&deleted, "http://nytimes.com/x\nkeep\n").unwrap();
        fs::write(dirs.input.join("b.txt"), "http://nytimes.com/y\n").unwrap();

        let mut confirmer = DeletingConfirmer {
            phase: "removal",
            target: deleted.clone(),
        };
        let report = Reconciler::new(news(), options(&dirs, false, true))
            .run(&mut confirmer)
            .unwrap();

        assert!(!deleted.exists());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, deleted);
        assert_eq!(report.removed, 1);
        assert_eq!(fs::read_to_string(dirs.input.join("b.txt")).unwrap(), "");
    }

    #[test]
    fn test_destination_deleted_before_append_is_not_recreated() {
        let dirs = dirs();
        let destination = dirs.output.join("news.txt");
        fs::create_dir(&dirs.output).unwrap();
        fs::write(&destination, "http://nytimes.com/old\n").unwrap();
        fs::write(dirs.input.join("a.txt"), "http://nytimes.com/x\n").unwrap();

        let mut confirmer = DeletingConfirmer {
            phase: "copy",
            target: destination.clone(),
        };
        let report = Reconciler::new(news(), options(&dirs, false, true))
            .run(&mut confirmer)
            .unwrap();

        assert!(!destination.exists());
        assert_eq!(report.copied, 0);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, destination);
        // never moved, so never removed
        assert_eq!(
            fs::read_to_string(dirs.input.join("a.txt")).unwrap(),
            "http://nytimes.com/x\n"
        );
    }

    #[test]
    fn test_unreadable_category_file_does_not_block_removals() {
        let dirs = dirs();
        fs::create_dir(&dirs.output).unwrap();
        fs::write(dirs.output.join("zz_binary.txt"), [0xff, 0xfe, 0x0a]).unwrap();
        fs::write(dirs.input.join("a.txt"), "http://nytimes.com/x\nkeep\n").unwrap();

        let report = Reconciler::new(news(), options(&dirs, true, true))
            .run(&mut FixedConfirmer(false))
            .unwrap();

        assert_eq!(report.copied, 1);
        assert_eq!(report.removed, 1);
        assert_eq!(fs::read_to_string(dirs.input.join("a.txt")).unwrap(), "keep\n");
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, dirs.output.join("zz_binary.txt"));
    }

    #[test]
    fn test_unreadable_destination_skips_only_its_category() {
        let dirs = dirs();
        fs::create_dir(&dirs.output).unwrap();
        fs::write(dirs.output.join("news.txt"), [0xff, 0xfe, 0x0a]).unwrap();
        fs::write(
            dirs.input.join("a.txt"),
            "http://nytimes.com/1\nhttps://spotify.com/2\nhttp://nytimes.com/3\n",
        )
        .unwrap();
        let categories = CategorySet::new(vec![
            Category::new("news", &["nytimes"]).unwrap(),
            Category::new("music", &["spotify"]).unwrap(),
        ]);

        let report = Reconciler::new(categories, options(&dirs, true, false))
            .run(&mut FixedConfirmer(false))
            .unwrap();

        assert_eq!(report.copied, 1);
        // reported once for the destination, not per line or per source
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, dirs.output.join("news.txt"));
        assert_eq!(
            fs::read_to_string(dirs.output.join("music.txt")).unwrap(),
            "https://spotify.com/2\n"
        );
        assert_eq!(
            fs::read(dirs.output.join("news.txt")).unwrap(),
            vec![0xff, 0xfe, 0x0a]
        );
    }

    #[test]
    fn test_removal_names_category_file() {
        let dirs = dirs();
        fs::create_dir(&dirs.output).unwrap();
        fs::write(dirs.output.join("news.txt"), "http://nytimes.com/old\n").unwrap();
        fs::write(dirs.input.join("a.txt"), "  http://nytimes.com/old\n").unwrap();

        let mut reconciler = Reconciler::new(news(), options(&dirs, true, true));
        let files = reconciler.scan_inputs().unwrap();
        let plans = reconciler.plan_removals(&files, &[]);

        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].actions[0].origin, dirs.output.join("news.txt"));
        assert!(
            PendingAction::Removal(plans[0].actions[0].clone())
                .describe()
                .ends_with("--> REMOVED (from news.txt)")
        );
    }

    #[test]
    fn test_missing_input_dir_is_an_error() {
        let dirs = dirs();
        let opts = RunOptions::new(&dirs.input.join("missing"), &dirs.output);

        let result = Reconciler::new(news(), opts).run(&mut FixedConfirmer(true));
        assert!(matches!(result, Err(ReconcileError::InputDirRead { .. })));
        assert!(!dirs.output.exists());
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dirs = dirs();
        fs::write(dirs.input.join("a.txt"), "http://nytimes.com/x\n").unwrap();

        let mut opts = options(&dirs, true, true);
        opts.dry_run = true;
        let report = Reconciler::new(news(), opts)
            .run(&mut FixedConfirmer(true))
            .unwrap();

        assert_eq!(report.proposed_copies, 1);
        assert_eq!(report.proposed_removals, 1);
        assert_eq!(report.copied, 0);
        assert!(!dirs.output.exists());
        assert_eq!(
            fs::read_to_string(dirs.input.join("a.txt")).unwrap(),
            "http://nytimes.com/x\n"
        );
    }
}
