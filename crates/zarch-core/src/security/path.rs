//! Path traversal validation.

use std::fmt;
use std::path::Component;
use std::path::Path;

use log::warn;

use crate::ArchiveError;
use crate::Result;

/// Reason an entry name was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathViolation {
    /// The name is empty and would resolve to the extraction root itself.
    Empty,
    /// The name starts at a filesystem root.
    Absolute,
    /// A `..` component would climb out of the extraction root.
    ParentTraversal,
    /// The name contains a backslash.
    Backslash,
}

impl fmt::Display for PathViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty entry name"),
            Self::Absolute => write!(f, "absolute path"),
            Self::ParentTraversal => write!(f, "parent directory traversal"),
            Self::Backslash => write!(f, "backslash in entry name"),
        }
    }
}

/// Validates that an entry name stays inside the extraction root.
///
/// Rejects, in this order:
/// - the empty name
/// - names starting with `/` or a platform root or prefix
/// - a `..` component at the start of the name or right after a `/`,
///   terminated by end of name, `/` or `\`
/// - any `\`, which is never translated into a separator
///
/// This check is purely lexical and never touches the filesystem.
///
/// # Errors
///
/// Returns `ArchiveError::PathSecurity` naming the violated rule.
///
/// # Examples
///
/// ```
/// use zarch_core::security::validate_entry_name;
///
/// assert!(validate_entry_name("docs/readme.txt").is_ok());
/// assert!(validate_entry_name("../etc/passwd").is_err());
/// assert!(validate_entry_name("/etc/passwd").is_err());
/// assert!(validate_entry_name("dir\\file").is_err());
/// ```
pub fn validate_entry_name(name: &str) -> Result<()> {
    match find_violation(name) {
        None => Ok(()),
        Some(violation) => {
            warn!("rejected entry name {name:?}: {violation}");
            Err(ArchiveError::PathSecurity {
                name: name.to_string(),
                violation,
            })
        }
    }
}

fn find_violation(name: &str) -> Option<PathViolation> {
    if name.is_empty() {
        return Some(PathViolation::Empty);
    }
    if is_absolute(name) {
        return Some(PathViolation::Absolute);
    }
    if has_parent_component(name.as_bytes()) {
        return Some(PathViolation::ParentTraversal);
    }
    if name.contains('\\') {
        return Some(PathViolation::Backslash);
    }
    None
}

fn is_absolute(name: &str) -> bool {
    if name.starts_with('/') {
        return true;
    }
    matches!(
        Path::new(name).components().next(),
        Some(Component::RootDir | Component::Prefix(_))
    )
}

fn has_parent_component(bytes: &[u8]) -> bool {
    let mut start = 0;
    while start < bytes.len() {
        if bytes[start..].starts_with(b"..") {
            match bytes.get(start + 2) {
                None | Some(b'/' | b'\\') => return true,
                Some(_) => {}
            }
        }
        match bytes[start..].iter().position(|&b| b == b'/') {
            Some(offset) => start += offset + 1,
            None => break,
        }
    }
    false
}
