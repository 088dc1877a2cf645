//! The read-only filesystem capability the walker runs against.

use std::io::{self, Read};

use crate::glob::PatternError;

/// Type of a filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
    File,
    Directory,
}

/// A directory entry returned by `read_dir`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Name of the entry (not full path).
    pub name: String,
    /// Type of entry.
    pub entry_type: EntryType,
}

impl DirEntry {
    pub fn new(name: impl Into<String>, entry_type: EntryType) -> Self {
        Self {
            name: name.into(),
            entry_type,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.entry_type == EntryType::Directory
    }
}

/// Minimal read-only filesystem abstraction for the walker.
///
/// Paths are slash-separated and relative to the filesystem root (see
/// [`valid_path`]). Implement this trait to run the walker against a real
/// directory tree, an in-memory fixture, or a restricted view.
pub trait WalkFs {
    /// Handle returned by `open`.
    type File: WalkFile;

    /// Open an entry for reading. Directories may be opened too; the handle
    /// then reports [`EntryType::Directory`].
    fn open(&self, path: &str) -> io::Result<Self::File>;

    /// List a directory, sorted by name. `"."` names the root.
    fn read_dir(&self, path: &str) -> io::Result<Vec<DirEntry>>;

    /// Get the type of an entry without opening it.
    fn stat(&self, path: &str) -> io::Result<EntryType>;

    /// Check if a path exists.
    fn exists(&self, path: &str) -> bool {
        self.stat(path).is_ok()
    }

    /// Resolve a glob pattern to the existing paths it names.
    ///
    /// The default expands the pattern one path element at a time through
    /// `read_dir`. Filesystems with a native glob can override it, but must
    /// keep returning syntax errors as [`PatternError`].
    fn glob(&self, pattern: &str) -> Result<Vec<String>, PatternError> {
        crate::expand::glob(self, pattern)
    }
}

/// An open entry handed out by [`WalkFs::open`].
pub trait WalkFile: Read {
    /// Type of the opened entry.
    fn entry_type(&self) -> io::Result<EntryType>;

    /// Release the handle, reporting any error the release produces.
    fn close(self) -> io::Result<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

/// Report whether `path` is a valid walk path.
///
/// Valid paths are unrooted, slash-separated sequences of names with no
/// empty, `.` or `..` elements. The single name `.` denotes the root.
///
/// ```
/// use portal_walk::valid_path;
/// assert!(valid_path("."));
/// assert!(valid_path("etc/os-release"));
/// assert!(!valid_path("/etc"));
/// assert!(!valid_path("etc/../root"));
/// assert!(!valid_path("etc//passwd"));
/// ```
pub fn valid_path(path: &str) -> bool {
    if path == "." {
        return true;
    }
    path.split('/')
        .all(|elem| !elem.is_empty() && elem != "." && elem != "..")
}

/// Reject invalid paths the way every `WalkFs` implementation in this crate does.
pub(crate) fn check_path(op: &str, path: &str) -> io::Result<()> {
    if valid_path(path) {
        Ok(())
    } else {
        Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{op} {path:?}: invalid argument"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_paths() {
        for path in [".", "a", "a/b", "etc/openwrt_release", "dir/subdir_0002.txt"] {
            assert!(valid_path(path), "{path:?} should be valid");
        }
    }

    #[test]
    fn invalid_paths() {
        for path in ["", "/", "/a", "a/", "a//b", "./a", "a/.", "..", "a/../b"] {
            assert!(!valid_path(path), "{path:?} should be invalid");
        }
    }

    #[test]
    fn check_path_reports_invalid_input() {
        let err = check_path("open", "../etc").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(err.to_string().contains("\"../etc\""));
    }
}
