//! Properties-file loading with include directives
//!
//! Format: `#` or `!` comments, `key=value` or `key: value`, trailing
//! backslash continuation, and `\t`/`\n`/`\r`/`\\` escapes. A line
//! assigning to the reserved key `.include` loads another file at that
//! point; relative paths resolve against the including file's directory.
//! Entries later in a file override earlier ones, included or not.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::{PropertyStore, PropsError};

/// Reserved key whose value names a file to include.
pub const INCLUDE_KEY: &str = ".include";

/// Load a properties file into a fresh store.
pub fn load_path(path: &Path) -> Result<PropertyStore, PropsError> {
    let store = PropertyStore::new();
    load_into(&store, path)?;
    Ok(store)
}

/// Like [`load_path`], but a missing top-level file is a warning and an
/// empty store rather than an error.
pub fn load_path_lenient(path: &Path) -> Result<PropertyStore, PropsError> {
    if !path.is_file() {
        warn!(path = %path.display(), "properties file missing or unreadable, using empty set");
        return Ok(PropertyStore::new());
    }
    load_path(path)
}

/// Load a properties file (includes honored) into an existing store.
pub fn load_into(store: &PropertyStore, path: &Path) -> Result<(), PropsError> {
    let mut stack = Vec::new();
    load_file(store, path, &mut stack)
}

fn load_file(
    store: &PropertyStore,
    path: &Path,
    stack: &mut Vec<PathBuf>,
) -> Result<(), PropsError> {
    let canonical = match path.canonicalize() {
        Ok(p) => p,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(PropsError::NotFound {
                path: path.display().to_string(),
            })
        }
        Err(e) => return Err(e.into()),
    };

    if stack.contains(&canonical) {
        let chain = stack
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(" -> ");
        return Err(PropsError::RecursiveInclude {
            path: canonical.display().to_string(),
            chain,
        });
    }
    stack.push(canonical.clone());

    let text = fs::read_to_string(&canonical)?;
    debug!(path = %canonical.display(), "loading properties file");

    for (key, value) in parse(&text) {
        if key == INCLUDE_KEY {
            let target = PathBuf::from(&value);
            let resolved = if target.is_absolute() {
                target
            } else {
                let base = canonical
                    .parent()
                    .map(Path::to_path_buf)
                    .or_else(dirs::home_dir)
                    .unwrap_or_default();
                base.join(target)
            };
            info!(include = %resolved.display(), from = %canonical.display(), "including properties file");
            load_file(store, &resolved, stack)?;
        } else {
            store.set(key, value);
        }
    }

    stack.pop();
    Ok(())
}

/// Parse properties text into key/value pairs, in file order.
fn parse(text: &str) -> Vec<(String, String)> {
    let mut entries = Vec::new();
    let mut lines = text.lines();

    while let Some(line) = lines.next() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
            continue;
        }

        let mut logical = trimmed.to_string();
        while has_continuation(&logical) {
            logical.pop();
            match lines.next() {
                Some(next) => logical.push_str(next.trim_start()),
                None => break,
            }
        }

        let (key, value) = split_entry(&logical);
        entries.push((unescape(key.trim_end()), unescape(value.trim_start())));
    }

    entries
}

/// A line continues when it ends in an odd number of backslashes.
fn has_continuation(line: &str) -> bool {
    let trailing = line.chars().rev().take_while(|&c| c == '\\').count();
    trailing % 2 == 1
}

/// Split at the first unescaped `=` or `:`; a line without a separator is
/// a key with an empty value.
fn split_entry(line: &str) -> (&str, &str) {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => return (&line[..i], &line[i + 1..]),
            _ => {}
        }
    }
    (line, "")
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}
