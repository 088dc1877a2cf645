//! Glob expansion against a `WalkFs`.

use tracing::trace;

use crate::fs::WalkFs;
use crate::glob::{PatternError, glob_match, has_meta, validate_pattern};

/// Upper bound on `/` separators in one pattern.
const MAX_SEPARATORS: usize = 10_000;

/// Return the paths in `fs` matching `pattern`, in listing order.
///
/// Syntax errors are the only failure. Unreadable directories contribute no
/// matches, and a literal pattern yields itself only if it exists. Rooted
/// patterns and empty path elements never match.
///
/// Expansion runs one path element at a time over a worklist of matched
/// directories, so pattern depth does not grow the call stack.
pub fn glob<F: WalkFs + ?Sized>(fs: &F, pattern: &str) -> Result<Vec<String>, PatternError> {
    if pattern.matches('/').count() > MAX_SEPARATORS {
        return Err(PatternError::TooDeep);
    }
    validate_pattern(pattern)?;

    if !has_meta(pattern) {
        if fs.exists(pattern) {
            return Ok(vec![pattern.to_string()]);
        }
        return Ok(Vec::new());
    }

    let parts: Vec<&str> = pattern.split('/').collect();
    for part in &parts {
        validate_pattern(part)?;
    }
    if parts.iter().any(|part| part.is_empty()) {
        trace!(pattern, "rooted pattern or empty path element, no matches");
        return Ok(Vec::new());
    }

    // Everything before the first element with meta characters is a fixed prefix
    let Some(first) = parts.iter().position(|part| has_meta(part)) else {
        return Ok(Vec::new());
    };
    let mut dirs = vec![if first == 0 {
        ".".to_string()
    } else {
        parts[..first].join("/")
    }];

    for part in &parts[first..] {
        let mut matches = Vec::new();
        for dir in &dirs {
            glob_dir(fs, dir, part, &mut matches)?;
        }
        if matches.is_empty() {
            return Ok(matches);
        }
        dirs = matches;
    }
    Ok(dirs)
}

/// Append the entries of `dir` whose names match `pattern`.
fn glob_dir<F: WalkFs + ?Sized>(
    fs: &F,
    dir: &str,
    pattern: &str,
    matches: &mut Vec<String>,
) -> Result<(), PatternError> {
    let entries = match fs.read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            trace!(dir, error = %err, "skipping unreadable directory");
            return Ok(());
        }
    };

    for entry in entries {
        if glob_match(pattern, &entry.name)? {
            matches.push(join(dir, &entry.name));
        }
    }
    Ok(())
}

fn join(dir: &str, name: &str) -> String {
    if dir == "." {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}
