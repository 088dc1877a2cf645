//! In-memory filesystem implementation.
//!
//! Used as a test fixture and for probing captured trees. All data is
//! ephemeral.

use std::collections::BTreeMap;
use std::io::{self, Cursor, Read};
use std::sync::{Arc, RwLock};

use crate::fs::{DirEntry, EntryType, WalkFile, WalkFs, check_path, valid_path};

/// Entry in the memory filesystem.
#[derive(Debug, Clone)]
enum Entry {
    File { data: Arc<[u8]> },
    Directory,
}

/// In-memory filesystem.
///
/// Thread-safe via internal `RwLock`, so entries can be added or removed
/// through a shared reference while a walk is running.
#[derive(Debug)]
pub struct MemoryFs {
    entries: RwLock<BTreeMap<String, Entry>>,
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFs {
    /// Create a new empty in-memory filesystem.
    pub fn new() -> Self {
        let mut entries = BTreeMap::new();
        // Root directory always exists
        entries.insert(".".to_string(), Entry::Directory);
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Build a filesystem from `(path, content)` pairs.
    pub fn from_files<'a>(files: impl IntoIterator<Item = (&'a str, &'a [u8])>) -> Self {
        let fs = Self::new();
        for (path, data) in files {
            fs.add_file(path, data);
        }
        fs
    }

    /// Add or replace a file, creating parent directories as needed.
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid walk path or names an existing
    /// directory. This is fixture setup, so bad input is a caller bug.
    pub fn add_file(&self, path: &str, data: &[u8]) {
        assert!(valid_path(path) && path != ".", "invalid file path {path:?}");
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if let Some(Entry::Directory) = entries.get(path) {
            panic!("{path:?} is a directory");
        }
        Self::ensure_parents(&mut entries, path);
        entries.insert(path.to_string(), Entry::File { data: data.into() });
    }

    /// Add a directory and its parents.
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid walk path.
    pub fn add_dir(&self, path: &str) {
        assert!(valid_path(path), "invalid directory path {path:?}");
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        Self::ensure_parents(&mut entries, path);
        entries.insert(path.to_string(), Entry::Directory);
    }

    /// Remove an entry and, for directories, everything below it.
    ///
    /// Returns true if something was removed.
    pub fn remove(&self, path: &str) -> bool {
        if path == "." {
            return false;
        }
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let prefix = format!("{path}/");
        let before = entries.len();
        entries.retain(|key, _| key != path && !key.starts_with(&prefix));
        entries.len() != before
    }

    fn ensure_parents(entries: &mut BTreeMap<String, Entry>, path: &str) {
        let mut end = 0;
        while let Some(idx) = path[end..].find('/') {
            end += idx;
            entries
                .entry(path[..end].to_string())
                .or_insert(Entry::Directory);
            end += 1;
        }
    }

    fn lookup(&self, op: &str, path: &str) -> io::Result<Entry> {
        check_path(op, path)?;
        let entries = self
            .entries
            .read()
            .map_err(|_| io::Error::other("lock poisoned"))?;
        entries.get(path).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("{op} {path:?}: not found"))
        })
    }
}

/// Parent of a valid path, with `.` as the parent of top-level names.
fn parent(path: &str) -> Option<&str> {
    if path == "." {
        return None;
    }
    Some(path.rfind('/').map_or(".", |idx| &path[..idx]))
}

fn base_name(path: &str) -> &str {
    path.rfind('/').map_or(path, |idx| &path[idx + 1..])
}

impl WalkFs for MemoryFs {
    type File = MemoryFile;

    fn open(&self, path: &str) -> io::Result<MemoryFile> {
        let file = match self.lookup("open", path)? {
            Entry::File { data } => MemoryFile {
                content: Cursor::new(data),
                entry_type: EntryType::File,
            },
            Entry::Directory => MemoryFile {
                content: Cursor::new(Arc::from(Vec::<u8>::new())),
                entry_type: EntryType::Directory,
            },
        };
        Ok(file)
    }

    fn read_dir(&self, path: &str) -> io::Result<Vec<DirEntry>> {
        if let Entry::File { .. } = self.lookup("readdir", path)? {
            return Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("readdir {path:?}: not a directory"),
            ));
        }

        let entries = self
            .entries
            .read()
            .map_err(|_| io::Error::other("lock poisoned"))?;

        let mut result: Vec<DirEntry> = entries
            .iter()
            .filter(|(key, _)| parent(key) == Some(path))
            .map(|(key, entry)| {
                let entry_type = match entry {
                    Entry::File { .. } => EntryType::File,
                    Entry::Directory => EntryType::Directory,
                };
                DirEntry::new(base_name(key), entry_type)
            })
            .collect();

        // Sort for consistent ordering
        result.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(result)
    }

    fn stat(&self, path: &str) -> io::Result<EntryType> {
        Ok(match self.lookup("stat", path)? {
            Entry::File { .. } => EntryType::File,
            Entry::Directory => EntryType::Directory,
        })
    }
}

/// Open handle on a `MemoryFs` entry.
#[derive(Debug)]
pub struct MemoryFile {
    content: Cursor<Arc<[u8]>>,
    entry_type: EntryType,
}

impl Read for MemoryFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.entry_type == EntryType::Directory {
            return Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                "read: is a directory",
            ));
        }
        self.content.read(buf)
    }
}

impl WalkFile for MemoryFile {
    fn entry_type(&self) -> io::Result<EntryType> {
        Ok(self.entry_type)
    }
}
