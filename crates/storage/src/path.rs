//! Container path handling.
//!
//! Share directories are addressed by forward-slash paths accumulated from
//! the share root: the root itself is `""`, its children are `/name`, their
//! children `/name/child`, and so on. Nothing is URL-encoded.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Path of the child `name` inside the container at `parent`.
///
/// # Examples
///
/// ```
/// use snuffle_storage::join_path;
/// assert_eq!(join_path("", "home"), "/home");
/// assert_eq!(join_path("/home", "user"), "/home/user");
/// ```
pub fn join(parent: &str, name: &str) -> String {
    format!("{parent}/{name}")
}

/// Validates a container path and converts it to a path relative to the
/// backend root. Ensures that paths don't escape the root (no `..` traversal).
///
/// The root (`""` or `"/"`) resolves to an empty relative path.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use snuffle_storage::validate_path;
/// assert_eq!(validate_path("/home/user/.ssh").unwrap(), Path::new("home/user/.ssh"));
/// assert_eq!(validate_path("").unwrap(), Path::new(""));
/// assert!(validate_path("/../etc").is_err());
/// assert!(validate_path("a\0b").is_err());
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let mut components = Vec::new();
    for component in path.as_ref().components() {
        match component {
            Component::Normal(s) => {
                // Null bytes pass through Path::components() on Unix but cause
                // truncation in C-based syscalls.
                if s.as_encoded_bytes().contains(&0) {
                    exn::bail!(ErrorKind::InvalidPath(path.as_ref().display().to_string()));
                }
                components.push(s)
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(ErrorKind::InvalidPath(path.as_ref().display().to_string())),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(ErrorKind::InvalidPath(path.as_ref().display().to_string()));
                }
            },
        }
    }
    Ok(components.into_iter().collect())
}

/// Forward-slash key for a relative filesystem path.
pub(crate) fn to_key(relative: &Path) -> String {
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
