//! Glob pattern syntax and single-name matching.
//!
//! Patterns follow the classic slash-separated path matching rules:
//! - `*` matches any run of characters except `/`
//! - `?` matches exactly one character except `/`
//! - `[abc]` matches any character in the set
//! - `[a-z]` matches any character in the range
//! - `[^abc]` matches any character NOT in the set; `!` has no special
//!   meaning, so `[!abc]` is a plain set containing `!`
//! - `\x` matches `x` literally
//!
//! Unlike a lenient shell matcher, malformed syntax is an error rather than
//! a literal: `[]`, an unterminated `[abc`, or a trailing `\` all fail with
//! [`PatternError::Syntax`], even when the name being matched is empty.

use thiserror::Error;

/// Errors when parsing glob patterns.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("syntax error in pattern")]
    Syntax,
    #[error("pattern nests too many directories")]
    TooDeep,
}

/// Check if a string contains glob metacharacters (`*`, `?`, `[`, `\`).
///
/// ```
/// use portal_walk::has_meta;
/// assert!(has_meta("etc/*release*"));
/// assert!(has_meta("file\\[1\\]"));
/// assert!(!has_meta("etc/os-release"));
/// ```
pub fn has_meta(s: &str) -> bool {
    s.contains(['*', '?', '[', '\\'])
}

/// Check that a pattern is syntactically valid without matching anything.
pub fn validate_pattern(pattern: &str) -> Result<(), PatternError> {
    glob_match(pattern, "").map(|_| ())
}

/// Match a name against a glob pattern.
///
/// Returns `Ok(true)` if the pattern matches the entire name. The whole
/// pattern is checked for syntax errors even when the match fails early.
///
/// # Examples
/// ```
/// use portal_walk::glob_match;
///
/// assert_eq!(glob_match("*release*", "os-release"), Ok(true));
/// assert_eq!(glob_match("dir/*", "dir/a.txt"), Ok(true));
/// assert_eq!(glob_match("*", "dir/a.txt"), Ok(false));
/// assert!(glob_match("[]", "x").is_err());
/// ```
pub fn glob_match(pattern: &str, name: &str) -> Result<bool, PatternError> {
    let mut pattern = pattern;
    let mut name = name;

    'pattern: while !pattern.is_empty() {
        let (star, chunk, rest) = scan_chunk(pattern);
        pattern = rest;

        // Trailing star matches the rest of the name unless it has a `/`
        if star && chunk.is_empty() {
            return Ok(!name.contains('/'));
        }

        // Try the chunk at the current position. The last chunk must
        // consume the whole name, otherwise a star may still save us.
        if let Some(tail) = match_chunk(chunk, name)?
            && (tail.is_empty() || !pattern.is_empty())
        {
            name = tail;
            continue;
        }

        if star {
            // Let the star swallow one more character at a time, never a `/`
            for (i, c) in name.char_indices() {
                if c == '/' {
                    break;
                }
                if let Some(tail) = match_chunk(chunk, &name[i + c.len_utf8()..])? {
                    if pattern.is_empty() && !tail.is_empty() {
                        continue;
                    }
                    name = tail;
                    continue 'pattern;
                }
            }
        }

        // No match; the remainder must still parse
        while !pattern.is_empty() {
            let (_, chunk, rest) = scan_chunk(pattern);
            pattern = rest;
            match_chunk(chunk, "")?;
        }
        return Ok(false);
    }

    Ok(name.is_empty())
}

/// Split off the next star-delimited chunk.
///
/// Returns (leading star seen, chunk, remaining pattern).
fn scan_chunk(pattern: &str) -> (bool, &str, &str) {
    let trimmed = pattern.trim_start_matches('*');
    let star = trimmed.len() != pattern.len();

    let bytes = trimmed.as_bytes();
    let mut in_class = false;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if i + 1 < bytes.len() => i += 1,
            b'[' => in_class = true,
            b']' => in_class = false,
            b'*' if !in_class => break,
            _ => {}
        }
        i += 1;
    }

    (star, &trimmed[..i], &trimmed[i..])
}

/// Match a star-free chunk against the start of `s`.
///
/// Returns the unmatched tail of `s` on success. The chunk is parsed to the
/// end even after a mismatch so syntax errors are never hidden.
fn match_chunk<'a>(chunk: &str, s: &'a str) -> Result<Option<&'a str>, PatternError> {
    let mut chunk = chunk;
    let mut s = s;
    let mut failed = false;

    while let Some(c) = chunk.chars().next() {
        if !failed && s.is_empty() {
            failed = true;
        }

        match c {
            '[' => {
                let mut current = None;
                if !failed && let Some(ch) = s.chars().next() {
                    current = Some(ch);
                    s = &s[ch.len_utf8()..];
                }
                chunk = &chunk[1..];

                let negated = chunk.starts_with('^');
                if negated {
                    chunk = &chunk[1..];
                }

                let mut matched = false;
                let mut ranges = 0;
                loop {
                    if ranges > 0 && let Some(rest) = chunk.strip_prefix(']') {
                        chunk = rest;
                        break;
                    }
                    let (lo, rest) = class_char(chunk)?;
                    chunk = rest;
                    let mut hi = lo;
                    if let Some(rest) = chunk.strip_prefix('-') {
                        let (end, rest) = class_char(rest)?;
                        hi = end;
                        chunk = rest;
                    }
                    if current.is_some_and(|ch| lo <= ch && ch <= hi) {
                        matched = true;
                    }
                    ranges += 1;
                }

                if matched == negated {
                    failed = true;
                }
            }

            '?' => {
                if !failed && let Some(ch) = s.chars().next() {
                    if ch == '/' {
                        failed = true;
                    }
                    s = &s[ch.len_utf8()..];
                }
                chunk = &chunk[1..];
            }

            '\\' => {
                chunk = &chunk[1..];
                let literal = chunk.chars().next().ok_or(PatternError::Syntax)?;
                chunk = &chunk[literal.len_utf8()..];
                failed = failed || !eat_literal(&mut s, literal);
            }

            literal => {
                chunk = &chunk[literal.len_utf8()..];
                failed = failed || !eat_literal(&mut s, literal);
            }
        }
    }

    Ok(if failed { None } else { Some(s) })
}

fn eat_literal(s: &mut &str, literal: char) -> bool {
    match s.strip_prefix(literal) {
        Some(rest) => {
            *s = rest;
            true
        }
        None => false,
    }
}

/// Read one (possibly escaped) character of a class.
///
/// A class element can't start with `-` or `]`, and the class must be
/// closed, so running out of pattern is an error too.
fn class_char(chunk: &str) -> Result<(char, &str), PatternError> {
    let mut chars = chunk.chars();
    let c = match chars.next() {
        None | Some('-') | Some(']') => return Err(PatternError::Syntax),
        Some('\\') => chars.next().ok_or(PatternError::Syntax)?,
        Some(c) => c,
    };

    let rest = chars.as_str();
    if rest.is_empty() {
        return Err(PatternError::Syntax);
    }
    Ok((c, rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_match(pattern: &str, name: &str) -> bool {
        glob_match(pattern, name).expect("valid pattern")
    }

    #[test]
    fn literal_matches() {
        assert!(is_match("hello", "hello"));
        assert!(is_match("", ""));
        assert!(!is_match("hello", "world"));
        assert!(!is_match("hello", "hell"));
        assert!(!is_match("hello", "helloo"));
    }

    #[test]
    fn star_wildcard() {
        assert!(is_match("*", ""));
        assert!(is_match("*", "anything"));
        assert!(is_match("*.txt", "simple_0001.txt"));
        assert!(is_match("no_*", "no_0003.txt"));
        assert!(is_match("*release*", "os-release"));
        assert!(is_match("*release*", "openwrt_release"));
        assert!(is_match("a*b*c", "aXXXbYYYc"));
        assert!(!is_match("*.rs", "main.txt"));
        assert!(!is_match("test*", "mytest"));
    }

    #[test]
    fn star_stops_at_separator() {
        assert!(!is_match("*", "dir/file"));
        assert!(!is_match("dir*", "dir/file"));
        assert!(is_match("dir/*", "dir/subdir_0002.txt"));
        assert!(is_match("*/*", "foo/bar"));
        assert!(!is_match("*/*", "foobar"));
    }

    #[test]
    fn question_wildcard() {
        assert!(is_match("?", "a"));
        assert!(is_match("test?", "test1"));
        assert!(!is_match("?", ""));
        assert!(!is_match("?", "ab"));
        assert!(!is_match("a?b", "a/b"));
    }

    #[test]
    fn char_classes() {
        assert!(is_match("[abc]", "b"));
        assert!(!is_match("[abc]", "d"));
        assert!(is_match("[a-z]", "m"));
        assert!(!is_match("[a-z]", "A"));
        assert!(is_match("[a-zA-Z0-9]", "M"));
        assert!(is_match("file[0-9].txt", "file5.txt"));
        assert!(!is_match("file[0-9].txt", "filea.txt"));
    }

    #[test]
    fn char_class_negated() {
        assert!(is_match("[^abc]", "d"));
        assert!(!is_match("[^abc]", "a"));
        assert!(!is_match("[^a-z]", "m"));
    }

    #[test]
    fn bang_is_a_plain_class_member() {
        assert!(is_match("[!abc]", "!"));
        assert!(is_match("[!abc]", "a"));
        assert!(!is_match("[!abc]", "d"));
    }

    #[test]
    fn escapes() {
        assert!(is_match("\\*", "*"));
        assert!(!is_match("\\*", "a"));
        assert!(is_match("file\\[1\\]", "file[1]"));
        assert!(is_match("[\\]]", "]"));
    }

    #[test]
    fn backtracking_through_stars() {
        assert!(is_match("a*a*a*a*a*a*a*a", "aaaaaaaaaaaaaaaa"));
        assert!(!is_match("a*a*a*a*a*a*a*ab", "aaaaaaaaaaaaaaaa"));
        assert!(is_match("*.*.txt", "file.backup.txt"));
        assert!(!is_match("*.*.txt", "file.txt"));
    }

    #[test]
    fn unicode_names() {
        assert!(is_match("héllo", "héllo"));
        assert!(is_match("*ñ*", "español"));
        assert!(is_match("?", "ü"));
        assert!(is_match("[αβγ]", "β"));
    }

    #[test]
    fn malformed_patterns() {
        for pattern in ["[]", "[", "[abc", "[a-", "[-a]", "[]a]", "\\", "a\\", "[x-]"] {
            assert_eq!(
                glob_match(pattern, "a"),
                Err(PatternError::Syntax),
                "pattern {pattern:?} should be rejected"
            );
        }
    }

    #[test]
    fn malformed_tail_is_reported_after_mismatch() {
        // The first chunk fails to match, the broken class must still surface
        assert_eq!(glob_match("x*[", "abc"), Err(PatternError::Syntax));
        assert_eq!(validate_pattern("ok*[]"), Err(PatternError::Syntax));
        assert_eq!(validate_pattern("etc/*release*"), Ok(()));
    }

    #[test]
    fn meta_detection() {
        assert!(has_meta("*"));
        assert!(has_meta("a?"));
        assert!(has_meta("[ab]"));
        assert!(has_meta("a\\b"));
        assert!(!has_meta("dir/subdir_0002.txt"));
    }
}
