//! Test filesystems.

use std::io;
use std::time::Duration;

use portal_walk::{DirEntry, EntryType, MemoryFile, MemoryFs, WalkFs};

/// In-memory tree whose `open` blocks for a fixed delay.
pub struct SlowFs {
    pub inner: MemoryFs,
    delay: Duration,
}

impl SlowFs {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MemoryFs::new(),
            delay,
        }
    }
}

impl WalkFs for SlowFs {
    type File = MemoryFile;

    fn open(&self, path: &str) -> io::Result<MemoryFile> {
        std::thread::sleep(self.delay);
        self.inner.open(path)
    }

    fn read_dir(&self, path: &str) -> io::Result<Vec<DirEntry>> {
        self.inner.read_dir(path)
    }

    fn stat(&self, path: &str) -> io::Result<EntryType> {
        self.inner.stat(path)
    }
}
