//! Directory-rooted filesystem backed by the host OS.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crate::fs::{DirEntry, EntryType, WalkFile, WalkFs, check_path};

/// Read-only view of a real directory tree.
///
/// All operations are relative to `root`. For example, if `root` is `/`,
/// then `open("etc/os-release")` opens `/etc/os-release`. Paths must be
/// valid walk paths, so `..` can never climb out of the root.
#[derive(Debug, Clone)]
pub struct DirFs {
    root: PathBuf,
}

impl DirFs {
    /// Create a filesystem rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Get the root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, op: &str, path: &str) -> io::Result<PathBuf> {
        check_path(op, path)?;
        if path == "." {
            return Ok(self.root.clone());
        }
        Ok(self.root.join(path))
    }
}

fn entry_type(meta: &fs::Metadata) -> EntryType {
    if meta.is_dir() {
        EntryType::Directory
    } else {
        EntryType::File
    }
}

impl WalkFs for DirFs {
    type File = DirFile;

    fn open(&self, path: &str) -> io::Result<DirFile> {
        let full_path = self.resolve("open", path)?;
        let file = File::open(&full_path)?;
        Ok(DirFile { file })
    }

    fn read_dir(&self, path: &str) -> io::Result<Vec<DirEntry>> {
        let full_path = self.resolve("readdir", path)?;

        let mut result = Vec::new();
        for entry in fs::read_dir(&full_path)? {
            let entry = entry?;
            // Names that aren't UTF-8 can't be expressed as walk paths
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            let entry_type = match entry.file_type() {
                Ok(ft) if ft.is_dir() => EntryType::Directory,
                Ok(_) => EntryType::File,
                Err(_) => continue,
            };
            result.push(DirEntry::new(name, entry_type));
        }

        // Sort for consistent ordering
        result.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(result)
    }

    fn stat(&self, path: &str) -> io::Result<EntryType> {
        let full_path = self.resolve("stat", path)?;
        fs::metadata(&full_path).map(|meta| entry_type(&meta))
    }
}

/// Open handle on a `DirFs` entry.
#[derive(Debug)]
pub struct DirFile {
    file: File,
}

impl Read for DirFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl WalkFile for DirFile {
    fn entry_type(&self) -> io::Result<EntryType> {
        self.file.metadata().map(|meta| entry_type(&meta))
    }
}
