//! portal-walk: probe a filesystem by content, one glob pattern at a time.
//!
//! Provides:
//! - **glob_match**: Path-element glob matching with strict syntax checking
//! - **WalkFs**: Minimal read-only filesystem trait (open, list, stat, glob)
//! - **MemoryFs** / **DirFs**: In-memory fixture and directory-rooted implementations
//! - **FileWalker**: Pattern-frontier walker driven by a caller's `ContentCheck`
//! - **read_bounded** / **LineScanner**: Size-capped readers for content checks
//!
//! The walker has no notion of recursive descent. It visits what the seed
//! patterns match, and each content check may name more patterns to visit.
//! That covers "find the OS release file that mentions X" as well as chains
//! of files that include one another.

mod dir;
mod expand;
mod fs;
pub mod glob;
mod memory;
pub mod scan;
mod walker;

pub use dir::{DirFile, DirFs};
pub use expand::glob;
pub use fs::{DirEntry, EntryType, WalkFile, WalkFs, valid_path};
pub use glob::{PatternError, glob_match, has_meta, validate_pattern};
pub use memory::{MemoryFile, MemoryFs};
pub use scan::{LineScanner, MAX_FILE_SIZE, MAX_LINE_LEN, read_bounded};
pub use walker::{BoxError, CheckError, ContentCheck, FileWalker, Inspection, InvalidPattern, WalkError};
