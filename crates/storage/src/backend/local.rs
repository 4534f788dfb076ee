//! Local filesystem storage backend.
//!
//! Exposes a directory on the local filesystem (or a mounted network share)
//! both as a share, listed one directory at a time, and as a bucket, where
//! every file is an object keyed by its forward-slash path relative to the
//! root. Uses `tokio::fs` for async I/O.

use crate::backend::{EntryStream, ObjectStream};
use crate::error::{ErrorKind, Result};
use crate::models::Entry;
use crate::path::{to_key, validate as validate_path};
use crate::{BucketBackend, ShareBackend};
use async_stream::stream;
use async_trait::async_trait;
use exn::ResultExt;
use std::path::{Path, PathBuf};
use tokio::fs::{self, DirEntry};
use tracing::instrument;

enum WalkEntry {
    File(String),
    Descend(PathBuf),
    Skip,
}

/// Local filesystem storage backend.
///
/// All container paths and object keys are relative to the configured root
/// directory. Symbolic links are never followed.
///
/// # Examples
///
/// ```no_run
/// use snuffle_storage::backend::LocalBackend;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = LocalBackend::new("fileserver", "/mnt/fileserver/c$")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct LocalBackend {
    name: String,
    /// Root directory of the share
    root: PathBuf,
}
impl LocalBackend {
    /// Create a new local filesystem backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not absolute or is not an existing
    /// directory. Nothing is ever created.
    #[instrument(skip_all, fields(name = tracing::field::Empty))]
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let name = name.into();
        tracing::Span::current().record("name", name.as_str());
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidPath(root.display().to_string()));
        }
        let metadata = std::fs::metadata(&root).map_err(|e| Self::map_io_error(e, &root.display().to_string()))?;
        if !metadata.is_dir() {
            exn::bail!(ErrorKind::InvalidPath(root.display().to_string()));
        }
        tracing::debug!(root = %root.display(), "Local backend ready");
        Ok(Self { name, root })
    }

    /// Get the absolute path for a container path.
    fn absolute_path(&self, dir: &str) -> Result<PathBuf> {
        Ok(self.root.join(validate_path(dir)?))
    }

    /// Convert an absolute path back to an object key.
    fn relative_key(&self, absolute: &Path) -> Result<String> {
        let relative = absolute.strip_prefix(&self.root).or_raise(|| {
            ErrorKind::BackendError(format!("path `{:?}` is not within root `{:?}`", absolute, self.root))
        })?;
        Ok(to_key(relative))
    }

    fn map_io_error(e: std::io::Error, path: &str) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(path.to_string()),
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_string()),
            _ => ErrorKind::Io(e),
        }
    }

    async fn share_entry(entry: &DirEntry) -> Result<Option<Entry>> {
        let name = entry.file_name().to_string_lossy().into_owned();
        let file_type = entry.file_type().await.map_err(|e| Self::map_io_error(e, &name))?;
        if file_type.is_dir() {
            return Ok(Some(Entry::directory(name)));
        }
        if file_type.is_file() {
            return Ok(Some(Entry::file(name)));
        }
        // Symlinks, sockets, devices: nothing to classify.
        Ok(None)
    }

    async fn bucket_entry(&self, entry: &DirEntry) -> Result<WalkEntry> {
        let path = entry.path();
        let file_type = entry.file_type().await.map_err(|e| Self::map_io_error(e, &path.display().to_string()))?;
        if file_type.is_dir() {
            return Ok(WalkEntry::Descend(path));
        }
        if file_type.is_file() {
            return Ok(WalkEntry::File(self.relative_key(&path)?));
        }
        Ok(WalkEntry::Skip)
    }
}

#[async_trait]
impl ShareBackend for LocalBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_dir<'a>(&'a self, dir: &str) -> EntryStream<'a> {
        let absolute = match self.absolute_path(dir) {
            Ok(path) => path,
            Err(e) => return Box::pin(futures::stream::once(async { Err(e) })),
        };
        let dir = dir.to_string();

        Box::pin(stream! {
            let mut entries = match fs::read_dir(&absolute).await {
                Ok(entries) => entries,
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => return,
                Err(err) => {
                    yield Err(exn::Exn::from(Self::map_io_error(err, &dir)));
                    return;
                }
            };
            loop {
                match entries.next_entry().await {
                    Ok(Some(entry)) => match Self::share_entry(&entry).await {
                        Ok(Some(entry)) => yield Ok(entry),
                        Ok(None) => {},
                        Err(e) => yield Err(e),
                    },
                    Ok(None) => break,
                    // The directory handle itself broke; there's no recovering
                    // the rest of this listing.
                    Err(e) => {
                        yield Err(exn::Exn::from(Self::map_io_error(e, &dir)));
                        break;
                    },
                }
            }
        })
    }
}

#[async_trait]
impl BucketBackend for LocalBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_objects(&self) -> ObjectStream<'_> {
        let mut stack = vec![self.root.clone()];

        Box::pin(stream! {
            'dirs: while let Some(current) = stack.pop() {
                let mut entries = match fs::read_dir(&current).await {
                    Ok(entries) => entries,
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
                    Err(err) => {
                        yield Err(exn::Exn::from(Self::map_io_error(err, &current.display().to_string())));
                        continue 'dirs;
                    }
                };

                'entries: loop {
                    let entry = match entries.next_entry().await {
                        Ok(Some(entry)) => entry,
                        Ok(None) => break 'entries,
                        Err(e) => {
                            yield Err(exn::Exn::from(Self::map_io_error(e, &current.display().to_string())));
                            continue 'dirs;
                        },
                    };
                    match self.bucket_entry(&entry).await {
                        Ok(WalkEntry::File(key)) => yield Ok(key),
                        Ok(WalkEntry::Descend(d)) => stack.push(d),
                        Ok(WalkEntry::Skip) => {},
                        Err(e) => yield Err(e),
                    };
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntryKind;

    fn fixture(files: &[&str]) -> (tempfile::TempDir, LocalBackend) {
        let temp_dir = tempfile::tempdir().unwrap();
        for file in files {
            let path = temp_dir.path().join(file);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, b"data").unwrap();
        }
        let backend = LocalBackend::new("local", temp_dir.path()).unwrap();
        (temp_dir, backend)
    }

    #[test]
    fn test_new_requires_absolute_existing_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(LocalBackend::new("name", temp_dir.path()).is_ok());
        assert!(LocalBackend::new("name", "relative/path").is_err());
        let missing = LocalBackend::new("name", temp_dir.path().join("missing")).unwrap_err();
        assert!(matches!(&*missing, ErrorKind::NotFound(_)));
        let file = temp_dir.path().join("file.txt");
        std::fs::write(&file, b"data").unwrap();
        assert!(LocalBackend::new("name", &file).is_err());
    }

    #[test]
    fn test_absolute_path() {
        let (temp_dir, backend) = fixture(&[]);
        assert_eq!(backend.absolute_path("").unwrap(), temp_dir.path());
        assert_eq!(backend.absolute_path("/home/user").unwrap(), temp_dir.path().join("home/user"));
        assert!(backend.absolute_path("/../etc").is_err());
    }

    #[tokio::test]
    async fn test_list_dir() {
        let (_temp_dir, backend) = fixture(&["home/user/.ssh/id_rsa", "home/readme.md", "web.config"]);
        let mut root = backend.list("").await.unwrap();
        root.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(root, vec![Entry::directory("home"), Entry::file("web.config")]);

        let mut home = backend.list("/home").await.unwrap();
        home.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(home, vec![Entry::file("readme.md"), Entry::directory("user")]);

        let ssh = backend.list("/home/user/.ssh").await.unwrap();
        assert_eq!(ssh.len(), 1);
        assert_eq!(ssh[0].kind, EntryKind::File);
    }

    #[tokio::test]
    async fn test_list_missing_dir_is_empty() {
        let (_temp_dir, backend) = fixture(&["a.txt"]);
        assert!(backend.list("/nope").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_traversal_rejected() {
        let (_temp_dir, backend) = fixture(&["a.txt"]);
        let err = backend.list("/../..").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_list_unreadable_dir_is_denied() {
        use std::os::unix::fs::PermissionsExt;
        let (temp_dir, backend) = fixture(&["restricted/secret.txt"]);
        let restricted = temp_dir.path().join("restricted");
        std::fs::set_permissions(&restricted, std::fs::Permissions::from_mode(0o000)).unwrap();
        // Root ignores permission bits entirely; nothing to assert there.
        if std::fs::read_dir(&restricted).is_ok() {
            std::fs::set_permissions(&restricted, std::fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }
        let err = backend.list("/restricted").await.unwrap_err();
        std::fs::set_permissions(&restricted, std::fs::Permissions::from_mode(0o755)).unwrap();
        assert!(err.is_denied());
    }

    #[tokio::test]
    async fn test_list_objects() {
        let (_temp_dir, backend) = fixture(&["backups/2023/secrets.txt", "logo.png", "a/b/c/d.json"]);
        let mut keys = backend.keys().await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["a/b/c/d.json", "backups/2023/secrets.txt", "logo.png"]);
    }
}
