//! Pattern-frontier file walker.
//!
//! Unlike a recursive directory walk, `FileWalker` only visits files named
//! by glob patterns: the seed patterns given to [`FileWalker::walk`] and the
//! follow-up patterns each [`ContentCheck`] call returns. Directories that
//! match are skipped, never descended into; a check that wants to look
//! inside `dir` returns `dir/*`.
//!
//! The walk is iterative. Matched paths go into a FIFO frontier guarded by
//! a visited set, so a path is inspected at most once even when patterns
//! cycle back to it, and memory stays bounded by the frontier rather than
//! the size of the tree.

use std::collections::{HashSet, VecDeque};
use std::error::Error as StdError;
use std::io::{self, Read};

use thiserror::Error;
use tracing::{debug, trace};

use crate::fs::{EntryType, WalkFile, WalkFs};
use crate::glob::PatternError;

/// Boxed error returned by a content check.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// What a content check decided about one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inspection {
    /// Glob patterns to add to the frontier.
    pub patterns: Vec<String>,
    /// Keep walking. `false` means the check found what it was looking for.
    pub cont: bool,
}

impl Inspection {
    /// Nothing found here, move on.
    pub fn next() -> Self {
        Self {
            patterns: Vec::new(),
            cont: true,
        }
    }

    /// Nothing found here, but also look at these patterns.
    pub fn follow<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
            cont: true,
        }
    }

    /// Found it; stop the walk.
    pub fn stop() -> Self {
        Self {
            patterns: Vec::new(),
            cont: false,
        }
    }
}

/// Caller-supplied check run against the content of each matched file.
///
/// The reader is only borrowed for the duration of the call; the walker
/// closes the file as soon as `check` returns.
pub trait ContentCheck {
    fn check(&mut self, content: &mut dyn Read) -> Result<Inspection, BoxError>;
}

impl<F> ContentCheck for F
where
    F: FnMut(&mut dyn Read) -> Result<Inspection, BoxError>,
{
    fn check(&mut self, content: &mut dyn Read) -> Result<Inspection, BoxError> {
        self(content)
    }
}

/// A glob pattern that failed to parse.
#[derive(Debug, Error)]
#[error("invalid pattern {pattern:?}")]
pub struct InvalidPattern {
    pub pattern: String,
    #[source]
    pub source: PatternError,
}

/// Failure while processing a single frontier entry.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    BadPattern(#[from] InvalidPattern),
    /// The content check failed. A failure to close the file afterwards is
    /// kept alongside, without replacing the check's own error.
    #[error("content check failed")]
    Check {
        #[source]
        source: BoxError,
        close: Option<io::Error>,
    },
    #[error("closing file")]
    Close(#[source] io::Error),
}

/// Errors from [`FileWalker::walk`].
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("no seed patterns given")]
    NoSeedPatterns,
    /// A seed pattern is malformed.
    #[error(transparent)]
    BadPattern(#[from] InvalidPattern),
    /// Processing `path` failed.
    #[error("checking {path:?}")]
    Checking {
        path: String,
        #[source]
        source: CheckError,
    },
}

impl WalkError {
    /// True if the walk failed on glob syntax, in a seed or a follow-up pattern.
    pub fn is_bad_pattern(&self) -> bool {
        matches!(
            self,
            WalkError::BadPattern(_)
                | WalkError::Checking {
                    source: CheckError::BadPattern(_),
                    ..
                }
        )
    }

    /// The path being processed when the walk failed, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            WalkError::Checking { path, .. } => Some(path),
            _ => None,
        }
    }

    /// The error a content check returned, if that is what stopped the walk.
    pub fn check_error(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        match self {
            WalkError::Checking {
                source: CheckError::Check { source, .. },
                ..
            } => Some(source.as_ref()),
            _ => None,
        }
    }

    /// The error from closing the file after a failed content check.
    pub fn close_error(&self) -> Option<&io::Error> {
        match self {
            WalkError::Checking {
                source: CheckError::Check { close, .. },
                ..
            } => close.as_ref(),
            WalkError::Checking {
                source: CheckError::Close(err),
                ..
            } => Some(err),
            _ => None,
        }
    }
}

/// Walks the files named by glob patterns, handing each to a [`ContentCheck`].
///
/// # Examples
/// ```
/// use std::io::Read;
/// use portal_walk::{BoxError, FileWalker, Inspection, MemoryFs};
///
/// let fs = MemoryFs::new();
/// fs.add_file("etc/openwrt_release", b"DISTRIB_ID='OpenWrt'\n");
///
/// let mut walker = FileWalker::from_fn(|r: &mut dyn Read| -> Result<Inspection, BoxError> {
///     let mut content = String::new();
///     r.read_to_string(&mut content)?;
///     Ok(if content.contains("OpenWrt") { Inspection::stop() } else { Inspection::next() })
/// });
/// assert!(walker.walk(&fs, &["etc/*release*"]).unwrap());
/// ```
pub struct FileWalker<C> {
    check: C,
}

impl<F> FileWalker<F>
where
    F: FnMut(&mut dyn Read) -> Result<Inspection, BoxError>,
{
    /// Create a walker from a closure.
    pub fn from_fn(check: F) -> Self {
        Self { check }
    }
}

impl<C: ContentCheck> FileWalker<C> {
    /// Create a walker running `check` on every matched file.
    pub fn new(check: C) -> Self {
        Self { check }
    }

    /// Get the content check back, e.g. to read state it collected.
    pub fn into_inner(self) -> C {
        self.check
    }

    /// Walk the files matched by `seeds` and by every pattern the check returns.
    ///
    /// Returns `Ok(true)` if the check stopped the walk, `Ok(false)` if the
    /// frontier ran out first. Any error aborts the walk; errors raised while
    /// processing a path carry that path.
    pub fn walk<F, S>(&mut self, fs: &F, seeds: &[S]) -> Result<bool, WalkError>
    where
        F: WalkFs + ?Sized,
        S: AsRef<str>,
    {
        if seeds.is_empty() {
            return Err(WalkError::NoSeedPatterns);
        }

        let mut seen = HashSet::new();
        let mut frontier: VecDeque<String> = handle_patterns(fs, &mut seen, seeds)?.into();

        while let Some(path) = frontier.pop_front() {
            let inspection = match check_file(fs, &mut self.check, &path) {
                Ok(inspection) => inspection,
                Err(source) => return Err(WalkError::Checking { path, source }),
            };

            if !inspection.cont {
                debug!(path = %path, skipped = frontier.len(), "content check stopped the walk");
                return Ok(true);
            }

            match handle_patterns(fs, &mut seen, &inspection.patterns) {
                Ok(found) => frontier.extend(found),
                Err(err) => {
                    return Err(WalkError::Checking {
                        path,
                        source: err.into(),
                    });
                }
            }
        }

        Ok(false)
    }
}

/// Expand `patterns` against `fs`, returning the paths not seen before.
///
/// Newly returned paths are added to `seen`. Order follows the patterns,
/// then the glob's own order within each pattern.
pub(crate) fn handle_patterns<F, S>(
    fs: &F,
    seen: &mut HashSet<String>,
    patterns: &[S],
) -> Result<Vec<String>, InvalidPattern>
where
    F: WalkFs + ?Sized,
    S: AsRef<str>,
{
    let mut found = Vec::with_capacity(patterns.len());
    for pattern in patterns {
        let pattern = pattern.as_ref();
        let matches = fs.glob(pattern).map_err(|source| InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        trace!(pattern, matches = matches.len(), "expanded pattern");

        for path in matches {
            if seen.insert(path.clone()) {
                found.push(path);
            }
        }
    }
    Ok(found)
}

/// Open `path` and run the check on it, skipping missing entries and directories.
pub(crate) fn check_file<F, C>(fs: &F, check: &mut C, path: &str) -> Result<Inspection, CheckError>
where
    F: WalkFs + ?Sized,
    C: ContentCheck + ?Sized,
{
    let mut file = match fs.open(path) {
        Ok(file) => file,
        // Removed after the glob matched it
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(path, "entry vanished before open, skipping");
            return Ok(Inspection::next());
        }
        Err(err) => return Err(CheckError::Io(err)),
    };

    let result = match file.entry_type() {
        Ok(EntryType::Directory) => {
            trace!(path, "skipping directory");
            Ok(Inspection::next())
        }
        Ok(EntryType::File) => {
            debug!(path, "checking file");
            check
                .check(&mut file)
                .map_err(|source| CheckError::Check {
                    source,
                    close: None,
                })
        }
        Err(err) => Err(CheckError::Io(err)),
    };

    match (result, file.close()) {
        (result, Ok(())) => result,
        (Ok(_), Err(err)) => Err(CheckError::Close(err)),
        (Err(CheckError::Check { source, .. }), Err(err)) => Err(CheckError::Check {
            source,
            close: Some(err),
        }),
        (Err(primary), Err(err)) => {
            debug!(path, error = %err, "close failed after an earlier error");
            Err(primary)
        }
    }
}
