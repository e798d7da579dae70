//! Line categorization by ordered regex rules.
//!
//! A [`CategorySet`] is an ordered list of named categories, each carrying an
//! ordered list of case-insensitive regular expressions. Classification is
//! first-match-wins: categories are tried in order, and within a category the
//! patterns are tried in order.
//!
//! # Examples
//!
//! ```
//! use linksort::category::CategorySet;
//!
//! let set = CategorySet::builtin();
//! assert_eq!(set.classify("https://www.NYTimes.com/section/world\n"), Some("news"));
//! assert_eq!(set.classify("https://open.spotify.com/track/1\n"), Some("music"));
//! assert_eq!(set.classify("https://example.com/\n"), None);
//! ```

use regex::{Regex, RegexBuilder};

/// Default rules used when no categories file is found.
const BUILTIN_CATEGORIES: &[(&str, &[&str])] = &[
    ("news", &[r"news", r"nytimes\.com", r"bbc\.co\.uk"]),
    ("music", &[r"spotify\.com", r"soundcloud\.com"]),
    ("learn", &[r"khanacademy\.org", r"coursera\.org", r"edx\.org"]),
];

/// A single named category and its compiled patterns.
#[derive(Debug, Clone)]
pub struct Category {
    /// The category name, also the stem of its destination file.
    pub name: String,
    patterns: Vec<Regex>,
}

impl Category {
    /// Compiles `patterns` case-insensitively.
    pub fn new<S: AsRef<str>>(name: &str, patterns: &[S]) -> Result<Self, regex::Error> {
        let patterns = patterns
            .iter()
            .map(|p| compile_pattern(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::from_regexes(name, patterns))
    }

    /// Builds a category from patterns compiled with [`compile_pattern`].
    pub fn from_regexes(name: &str, patterns: Vec<Regex>) -> Self {
        Self {
            name: name.to_string(),
            patterns,
        }
    }

    /// Returns true if any pattern matches anywhere in `line`.
    pub fn matches(&self, line: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(line))
    }
}

/// Ordered collection of categories, immutable once built.
#[derive(Debug, Clone, Default)]
pub struct CategorySet {
    categories: Vec<Category>,
}

impl CategorySet {
    /// Creates a set from already compiled categories, keeping their order.
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    /// The built-in news/music/learn rules.
    pub fn builtin() -> Self {
        let categories = BUILTIN_CATEGORIES
            .iter()
            .filter_map(|&(name, patterns)| Category::new(name, patterns).ok())
            .collect();
        Self { categories }
    }

    /// Returns the name of the first category with a pattern matching `line`.
    ///
    /// The line is matched as-is, terminator included; no trimming happens here.
    pub fn classify(&self, line: &str) -> Option<&str> {
        self.categories
            .iter()
            .find(|category| category.matches(line))
            .map(|category| category.name.as_str())
    }

    /// Category names in evaluation order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.name.as_str())
    }

    /// Position of a category in evaluation order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.categories.iter().position(|c| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Compiles a single category pattern. Matching is case-insensitive.
pub fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

/// `<category>.txt`
pub fn destination_file_name(category: &str) -> String {
    format!("{}.txt", category)
}
