//! Per-run cache of destination file contents.
//!
//! Each category's destination file is read at most once per run. Appends go
//! through the cache so a line is never written twice into the same file.
use crate::category::destination_file_name;
use crate::source::split_lines;
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// A destination file and the exact lines it holds.
///
/// Entries are compared with their terminator. A source line without one
/// (last line of a file) is compared and written as if it ended in `\n`, so
/// appends never run two entries together.
#[derive(Debug, Clone)]
pub struct DestinationFile {
    pub path: PathBuf,
    lines: HashSet<String>,
    /// Existing content does not end in a newline.
    unterminated: bool,
    /// The file exists on disk, so appends must not recreate it.
    existed: bool,
}

impl DestinationFile {
    /// Loads existing lines; a missing file is treated as empty.
    fn load(path: PathBuf) -> io::Result<Self> {
        let (content, existed) = match fs::read_to_string(&path) {
            Ok(content) => (content, true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => (String::new(), false),
            Err(e) => return Err(e),
        };

        let unterminated = !content.is_empty() && !content.ends_with('\n');
        let mut lines: HashSet<String> = split_lines(&content).into_iter().collect();
        if unterminated && let Some(last) = content.rsplit('\n').next() {
            lines.insert(format!("{}\n", last));
        }

        Ok(Self {
            path,
            lines,
            unterminated,
            existed,
        })
    }

    /// Exact match, terminator included.
    pub fn contains(&self, line: &str) -> bool {
        self.lines.contains(entry(line).as_ref())
    }

    /// Appends `line` unless it is already present, then records it.
    ///
    /// Returns `Ok(false)` when the line was already there and nothing was written.
    /// A file that existed when loaded and has since been deleted is an error.
    pub fn append(&mut self, line: &str) -> io::Result<bool> {
        let entry = entry(line);
        if self.lines.contains(entry.as_ref()) {
            return Ok(false);
        }

        let mut file = OpenOptions::new()
            .create(!self.existed)
            .append(true)
            .open(&self.path)?;
        self.existed = true;
        if self.unterminated {
            file.write_all(b"\n")?;
            self.unterminated = false;
        }
        file.write_all(entry.as_bytes())?;

        self.lines.insert(entry.into_owned());
        Ok(true)
    }
}

fn entry(line: &str) -> Cow<'_, str> {
    if line.ends_with('\n') {
        Cow::Borrowed(line)
    } else {
        Cow::Owned(format!("{}\n", line))
    }
}

/// Lazily loaded destination files keyed by category, scoped to one run.
#[derive(Debug)]
pub struct DestinationCache {
    output_dir: PathBuf,
    files: HashMap<String, DestinationFile>,
}

impl DestinationCache {
    pub fn new(output_dir: &Path) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
            files: HashMap::new(),
        }
    }

    /// Path of a category's destination file, whether or not it exists.
    pub fn path_for(&self, category: &str) -> PathBuf {
        self.output_dir.join(destination_file_name(category))
    }

    /// Returns the destination for `category`, reading it on first use.
    pub fn resolve(&mut self, category: &str) -> io::Result<&mut DestinationFile> {
        if !self.files.contains_key(category) {
            let file = DestinationFile::load(self.path_for(category))?;
            self.files.insert(category.to_string(), file);
        }

        self.files
            .get_mut(category)
            .ok_or_else(|| io::Error::other("destination cache entry missing"))
    }
}

/// Trimmed lines found across the category files of an output directory.
#[derive(Debug, Default)]
pub struct CategorizedLines {
    /// Trimmed line to the first file (in path order) that holds it.
    pub lines: HashMap<String, PathBuf>,
    /// Category files that could not be read.
    pub unreadable: Vec<(PathBuf, io::Error)>,
}

impl CategorizedLines {
    pub fn origin(&self, trimmed: &str) -> Option<&PathBuf> {
        self.lines.get(trimmed)
    }
}

/// Collects the trimmed, non-empty lines of every `*.txt` file in `output_dir`.
///
/// A missing output directory yields an empty set. A file that cannot be read
/// is listed in [`CategorizedLines::unreadable`] and the scan carries on.
///
/// # Errors
///
/// Fails only when the directory itself cannot be listed.
pub fn categorized_lines(output_dir: &Path) -> io::Result<CategorizedLines> {
    let mut found = CategorizedLines::default();
    if !output_dir.exists() {
        return Ok(found);
    }

    for path in txt_files(output_dir)? {
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                found.unreadable.push((path, e));
                continue;
            }
        };

        for line in content.lines().map(str::trim).filter(|line| !line.is_empty()) {
            found
                .lines
                .entry(line.to_string())
                .or_insert_with(|| path.clone());
        }
    }

    Ok(found)
}

/// Lists `*.txt` files directly under `dir`, sorted by path.
pub fn txt_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    // Escape the directory part so brackets in real paths are not globbed
    let pattern = PathBuf::from(glob::Pattern::escape(&dir.to_string_lossy())).join("*.txt");

    let entries = glob::glob(&pattern.to_string_lossy())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| e.into_error())?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_missing_file_is_empty() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut cache = DestinationCache::new(temp_dir.path());

        let dest = cache.resolve("news").expect("Failed to resolve");
        assert!(!dest.contains("http://nytimes.com/x\n"));
        assert_eq!(dest.path, temp_dir.path().join("news.txt"));
        assert!(!dest.path.exists());
    }

    #[test]
    fn test_resolve_reads_existing_lines() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(temp_dir.path().join("news.txt"), "http://a.com\nhttp://b.com\n").unwrap();
        let mut cache = DestinationCache::new(temp_dir.path());

        let dest = cache.resolve("news").unwrap();
        assert!(dest.contains("http://a.com\n"));
        assert!(dest.contains("http://b.com\n"));
        // terminator is part of the identity
        assert!(!dest.contains("http://a.com\r\n"));
    }

    #[test]
    fn test_append_updates_cache_immediately() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut cache = DestinationCache::new(temp_dir.path());

        let dest = cache.resolve("news").unwrap();
        assert!(dest.append("http://a.com\n").unwrap());
        assert!(!dest.append("http://a.com\n").unwrap());

        let content = fs::read_to_string(temp_dir.path().join("news.txt")).unwrap();
        assert_eq!(content, "http://a.com\n");
    }

    #[test]
    fn test_append_does_not_recreate_deleted_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("news.txt");
        fs::write(&path, "http://a.com\n").unwrap();
        let mut cache = DestinationCache::new(temp_dir.path());

        let dest = cache.resolve("news").unwrap();
        fs::remove_file(&path).unwrap();

        let err = dest.append("http://b.com\n").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(!path.exists());
        assert!(!dest.contains("http://b.com\n"));
    }

    #[test]
    fn test_append_removed_after_first_write_is_an_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("news.txt");
        let mut cache = DestinationCache::new(temp_dir.path());

        let dest = cache.resolve("news").unwrap();
        assert!(dest.append("http://a.com\n").unwrap());
        fs::remove_file(&path).unwrap();

        assert!(dest.append("http://b.com\n").is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_unterminated_line_is_written_with_newline() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(temp_dir.path().join("news.txt"), "http://a.com").unwrap();
        let mut cache = DestinationCache::new(temp_dir.path());

        let dest = cache.resolve("news").unwrap();
        assert!(dest.contains("http://a.com"));
        assert!(dest.contains("http://a.com\n"));
        assert!(dest.append("http://b.com").unwrap());

        let content = fs::read_to_string(temp_dir.path().join("news.txt")).unwrap();
        assert_eq!(content, "http://a.com\nhttp://b.com\n");
    }

    #[test]
    fn test_cache_is_reused_across_resolves() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut cache = DestinationCache::new(temp_dir.path());

        cache.resolve("news").unwrap().append("http://a.com\n").unwrap();
        // Content changed on disk behind our back is not re-read
        fs::write(temp_dir.path().join("news.txt"), "").unwrap();

        assert!(cache.resolve("news").unwrap().contains("http://a.com\n"));
    }

    #[test]
    fn test_categorized_lines_trims_and_skips_blanks() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(temp_dir.path().join("news.txt"), "  http://a.com \n\n").unwrap();
        fs::write(temp_dir.path().join("music.txt"), "http://b.com\r\n").unwrap();
        fs::write(temp_dir.path().join("notes.md"), "http://c.com\n").unwrap();

        let found = categorized_lines(temp_dir.path()).unwrap();
        let mut lines: Vec<_> = found.lines.keys().cloned().collect();
        lines.sort();
        assert_eq!(lines, vec!["http://a.com", "http://b.com"]);
        assert_eq!(
            found.origin("http://b.com"),
            Some(&temp_dir.path().join("music.txt"))
        );
        assert!(found.unreadable.is_empty());
    }

    #[test]
    fn test_categorized_lines_skips_unreadable_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(temp_dir.path().join("news.txt"), "http://a.com\n").unwrap();
        fs::write(temp_dir.path().join("zz_binary.txt"), [0xff, 0xfe, 0x0a]).unwrap();

        let found = categorized_lines(temp_dir.path()).unwrap();
        assert_eq!(
            found.origin("http://a.com"),
            Some(&temp_dir.path().join("news.txt"))
        );
        assert_eq!(found.unreadable.len(), 1);
        assert_eq!(found.unreadable[0].0, temp_dir.path().join("zz_binary.txt"));
    }

    #[test]
    fn test_categorized_lines_missing_dir() {
        let found = categorized_lines(Path::new("/non/existent/output")).unwrap();
        assert!(found.lines.is_empty());
        assert!(found.unreadable.is_empty());
    }

    #[test]
    fn test_txt_files_sorted_and_flat() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(temp_dir.path().join("b.txt"), "").unwrap();
        fs::write(temp_dir.path().join("a.txt"), "").unwrap();
        fs::write(temp_dir.path().join("c.md"), "").unwrap();
        fs::create_dir(temp_dir.path().join("nested")).unwrap();
        fs::write(temp_dir.path().join("nested").join("d.txt"), "").unwrap();

        let names: Vec<_> = txt_files(temp_dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }
}
