//! Category configuration loading.
//!
//! Categories are defined in a JSON or TOML file mapping each category name to
//! an ordered list of regular expressions. Key order in the file is the
//! evaluation order of the categories.
//!
//! # Configuration File Format
//!
//! ```json
//! {
//!     "news": ["nytimes\\.com", "bbc\\.co\\.uk"],
//!     "music": ["spotify\\.com"]
//! }
//! ```
//!
//! or, for files ending in `.toml`:
//!
//! ```toml
//! news = ['nytimes\.com', 'bbc\.co\.uk']
//! music = ['spotify\.com']
//! ```

use crate::category::{Category, CategorySet, compile_pattern};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Errors that can occur while loading the category configuration.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    ConfigNotFound(PathBuf),
    /// The file is not valid JSON/TOML or does not have the expected shape.
    ConfigInvalid(String),
    /// Invalid regex pattern in a category.
    InvalidRegexPattern {
        /// The category the pattern belongs to.
        category: String,
        /// The regex pattern that failed to compile.
        pattern: String,
        /// The reason why the pattern is invalid.
        reason: String,
    },
    /// IO error while reading configuration.
    IoError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Categories file not found: {}", path.display())
            }
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid categories file: {}", msg),
            ConfigError::InvalidRegexPattern {
                category,
                pattern,
                reason,
            } => {
                write!(
                    f,
                    "Invalid regex pattern '{}' in category '{}': {}",
                    pattern, category, reason
                )
            }
            ConfigError::IoError(msg) => write!(f, "IO error reading categories file: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Raw, unvalidated category configuration.
///
/// Values are kept as loose JSON so that shape errors can be reported per
/// category instead of as an opaque deserialization failure.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct CategoryConfig {
    pub categories: Map<String, Value>,
}

impl CategoryConfig {
    /// Load configuration, with fallback to the built-in categories.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.linksort.json` in the current directory
    /// 3. Look for `~/.config/linksort/categories.json`
    /// 4. Fall back to the built-in categories
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file exists but cannot be read or
    /// parsed, or if an explicitly given file does not exist.
    pub fn load(config_path: Option<&Path>) -> Result<Option<Self>, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).map(Some);
        }

        let local_config = PathBuf::from(".linksort.json");
        if local_config.exists() {
            return Self::load_from_file(&local_config).map(Some);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("linksort")
                .join("categories.json");
            if home_config.exists() {
                return Self::load_from_file(&home_config).map(Some);
            }
        }

        Ok(None)
    }

    /// Load configuration from a specific file.
    ///
    /// Files with a `.toml` extension are parsed as TOML, everything else as JSON.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        if is_toml {
            Self::from_toml_str(&content)
        } else {
            Self::from_json_str(&content)
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|e| {
            ConfigError::ConfigInvalid(format!(
                "expected an object mapping category names to lists of regex patterns ({})",
                e
            ))
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| {
            ConfigError::ConfigInvalid(format!(
                "expected a table mapping category names to lists of regex patterns ({})",
                e
            ))
        })
    }

    /// Validate the shape and compile every pattern.
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` if a category does not map to a list of strings,
    /// and `InvalidRegexPattern` if a pattern does not compile.
    pub fn compile(self) -> Result<CategorySet, ConfigError> {
        let mut categories = Vec::with_capacity(self.categories.len());

        for (name, value) in &self.categories {
            let regexes = pattern_list(name, value)?
                .into_iter()
                .map(|pattern| {
                    compile_pattern(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                        category: name.clone(),
                        pattern: pattern.to_string(),
                        reason: e.to_string(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            categories.push(Category::from_regexes(name, regexes));
        }

        Ok(CategorySet::new(categories))
    }
}

/// Load and compile the category set, falling back to the built-in rules.
pub fn load_categories(config_path: Option<&Path>) -> Result<CategorySet, ConfigError> {
    match CategoryConfig::load(config_path)? {
        Some(config) => config.compile(),
        None => Ok(CategorySet::builtin()),
    }
}

fn pattern_list<'a>(name: &str, value: &'a Value) -> Result<Vec<&'a str>, ConfigError> {
    let invalid = || {
        ConfigError::ConfigInvalid(format!(
            "each category must map to a list of regex strings; problem in category '{}'",
            name
        ))
    };

    value
        .as_array()
        .ok_or_else(invalid)?
        .iter()
        .map(|p| p.as_str().ok_or_else(invalid))
        .collect()
}
