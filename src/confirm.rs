//! Confirmation of proposed actions.
//!
//! The engine never reads from stdin itself. It hands proposals to a
//! [`ConfirmPolicy`], which turns them into yes/no answers by asking a
//! [`Confirmer`] once for everything, once per group, or once per action.

use crate::actions::PendingAction;
use crate::output::OutputFormatter;
use clap::ValueEnum;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// Answers a yes/no question about a described action or batch.
pub trait Confirmer {
    fn confirm(&mut self, question: &str) -> bool;
}

/// Interactive confirmer reading answers from stdin.
///
/// Only `y` and `yes` (any case) accept; end of input declines.
pub struct PromptConfirmer;

impl Confirmer for PromptConfirmer {
    fn confirm(&mut self, question: &str) -> bool {
        print!("{} [y/N]: ", question);
        if io::stdout().flush().is_err() {
            return false;
        }

        let mut input = String::new();
        match io::stdin().lock().read_line(&mut input) {
            Ok(0) | Err(_) => false,
            Ok(_) => is_yes(&input),
        }
    }
}

/// Gives the same answer to every question.
pub struct FixedConfirmer(pub bool);

impl Confirmer for FixedConfirmer {
    fn confirm(&mut self, _question: &str) -> bool {
        self.0
    }
}

/// Replays a fixed list of answers, declining once they run out.
///
/// Questions are recorded for inspection.
#[derive(Debug, Default)]
pub struct ScriptedConfirmer {
    answers: VecDeque<bool>,
    pub questions: Vec<String>,
}

impl ScriptedConfirmer {
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            questions: Vec::new(),
        }
    }
}

impl Confirmer for ScriptedConfirmer {
    fn confirm(&mut self, question: &str) -> bool {
        self.questions.push(question.to_string());
        self.answers.pop_front().unwrap_or(false)
    }
}

fn is_yes(input: &str) -> bool {
    let answer = input.trim();
    answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
}

/// How many questions are asked for a set of proposals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ConfirmMode {
    /// One question for all proposals of a phase.
    #[default]
    Batch,
    /// One question per category (copies) or per source file (removals).
    Category,
    /// One question per proposed line.
    Line,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfirmPolicy {
    /// Accept everything without asking.
    pub auto_confirm: bool,
    pub mode: ConfirmMode,
}

impl ConfirmPolicy {
    pub fn new(auto_confirm: bool, mode: ConfirmMode) -> Self {
        Self { auto_confirm, mode }
    }

    /// Returns one decision per action, in the same order.
    ///
    /// Descriptions are printed before each question. Nothing is asked for an
    /// empty list.
    pub fn decide(
        &self,
        actions: &[PendingAction],
        question: &str,
        confirmer: &mut dyn Confirmer,
    ) -> Vec<bool> {
        if actions.is_empty() {
            return Vec::new();
        }

        if self.auto_confirm {
            for action in actions {
                OutputFormatter::plain(&action.describe());
            }
            return vec![true; actions.len()];
        }

        match self.mode {
            ConfirmMode::Batch => {
                for action in actions {
                    OutputFormatter::plain(&action.describe());
                }
                vec![confirmer.confirm(question); actions.len()]
            }
            ConfirmMode::Category => {
                let mut decisions = vec![false; actions.len()];
                let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
                for (idx, action) in actions.iter().enumerate() {
                    let key = action.group();
                    match groups.iter_mut().find(|(k, _)| *k == key) {
                        Some((_, members)) => members.push(idx),
                        None => groups.push((key, vec![idx])),
                    }
                }

                for (key, members) in groups {
                    OutputFormatter::header(&key);
                    for &idx in &members {
                        OutputFormatter::plain(&actions[idx].describe());
                    }
                    let accepted = confirmer.confirm(&format!("{} [{}]", question, key));
                    for idx in members {
                        decisions[idx] = accepted;
                    }
                }
                decisions
            }
            ConfirmMode::Line => actions
                .iter()
                .map(|action| {
                    OutputFormatter::plain(&action.describe());
                    confirmer.confirm(question)
                })
                .collect(),
        }
    }
}
