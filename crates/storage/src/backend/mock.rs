//! In-memory storage backend for testing.

use crate::backend::{EntryStream, ObjectStream};
use crate::error::ErrorKind;
use crate::models::{Entry, EntryKind};
use crate::path::{to_key, validate as validate_path};
use crate::{BucketBackend, ShareBackend};
use async_stream::stream;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// In-memory storage backend for testing.
///
/// Holds a fixed set of file keys and derives directories from them. Both
/// listing views are deterministic (sorted), and failures can be injected
/// per directory or per object to exercise walker error handling without a
/// filesystem or network.
///
/// # Examples
///
/// ```
/// use snuffle_storage::backend::MockBackend;
/// use snuffle_storage::ShareBackend;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MockBackend::with_files(["restricted/passwords.txt", "public/web.config"])
///     .with_denied("/restricted");
/// assert_eq!(backend.list("/public").await?.len(), 1);
/// assert!(backend.list("/restricted").await.is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MockBackend {
    name: String,
    files: BTreeSet<String>,
    denied: HashSet<String>,
    faulty: HashSet<String>,
    broken_objects: HashSet<String>,
}

impl MockBackend {
    /// Create a mock backend pre-populated with file keys.
    ///
    /// Panics if any path fails validation (e.g. path traversal). If test
    /// setup is wrong, then test should not pass.
    pub fn with_files(files: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        let mut keys = BTreeSet::new();
        for file in files {
            let file = file.as_ref();
            let validated = match validate_path(file) {
                Ok(path) if !path.as_os_str().is_empty() => path,
                // The panic here is DELIBERATE. MockBackend is intended to be
                // used in tests; panics are expected. There is no error result.
                _ => panic!("MockBackend::with_files: invalid path {file}"),
            };
            keys.insert(to_key(&validated));
        }
        Self {
            name: "mock".to_string(),
            files: keys,
            denied: HashSet::new(),
            faulty: HashSet::new(),
            broken_objects: HashSet::new(),
        }
    }

    /// Change the name of the mock backend.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Listing this directory fails with `PermissionDenied`. Denying the root
    /// (`""`) also denies the bucket view.
    pub fn with_denied(mut self, dir: impl Into<String>) -> Self {
        self.denied.insert(dir.into());
        self
    }

    /// Listing this directory yields its first child, then fails.
    pub fn with_fault(mut self, dir: impl Into<String>) -> Self {
        self.faulty.insert(dir.into());
        self
    }

    /// The bucket view yields an error in place of this key.
    pub fn with_broken_object(mut self, key: impl Into<String>) -> Self {
        self.broken_objects.insert(key.into());
        self
    }

    fn children(&self, dir: &str) -> BTreeMap<String, EntryKind> {
        let prefix = match dir.trim_start_matches('/') {
            "" => String::new(),
            dir => format!("{dir}/"),
        };
        let mut children = BTreeMap::new();
        for key in self.files.iter().filter_map(|key| key.strip_prefix(prefix.as_str())) {
            match key.split_once('/') {
                Some((child, _)) => children.insert(child.to_string(), EntryKind::Directory),
                None => children.insert(key.to_string(), EntryKind::File),
            };
        }
        children
    }
}
impl Default for MockBackend {
    fn default() -> Self {
        let files: [&str; 0] = [];
        Self::with_files(files)
    }
}

#[async_trait]
impl ShareBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_dir<'a>(&'a self, dir: &str) -> EntryStream<'a> {
        let dir = dir.to_string();
        Box::pin(stream! {
            if self.denied.contains(&dir) {
                yield Err(exn::Exn::from(ErrorKind::PermissionDenied(dir)));
                return;
            }
            let faulty = self.faulty.contains(&dir);
            for (index, (name, kind)) in self.children(&dir).into_iter().enumerate() {
                if faulty && index == 1 {
                    yield Err(exn::Exn::from(ErrorKind::BackendError(format!("listing of {dir} interrupted"))));
                }
                yield Ok(Entry::new(name, kind));
            }
        })
    }
}

#[async_trait]
impl BucketBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_objects(&self) -> ObjectStream<'_> {
        Box::pin(stream! {
            if self.denied.contains("") {
                yield Err(exn::Exn::from(ErrorKind::PermissionDenied(self.name.clone())));
                return;
            }
            for key in &self.files {
                if self.broken_objects.contains(key) {
                    yield Err(exn::Exn::from(ErrorKind::BackendError(format!("object {key} unreadable"))));
                    continue;
                }
                yield Ok(key.clone());
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn backend() -> MockBackend {
        MockBackend::with_files(["home/user/.ssh/id_rsa", "home/user/notes.txt", "logo.png"])
    }

    #[tokio::test]
    async fn test_list_root() {
        let entries = backend().list("").await.unwrap();
        assert_eq!(entries, vec![Entry::directory("home"), Entry::file("logo.png")]);
    }

    #[tokio::test]
    async fn test_list_nested() {
        let entries = backend().list("/home/user").await.unwrap();
        assert_eq!(entries, vec![Entry::directory(".ssh"), Entry::file("notes.txt")]);
    }

    #[tokio::test]
    async fn test_list_missing_is_empty() {
        assert!(backend().list("/nope").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_denied() {
        let backend = backend().with_denied("/home");
        let err = backend.list("/home").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::PermissionDenied(_)));
        assert!(backend.list("").await.is_ok());
    }

    #[tokio::test]
    async fn test_fault_interrupts_listing() {
        let backend = backend().with_fault("/home/user");
        let items: Vec<_> = backend.list_dir("/home/user").collect().await;
        assert_eq!(items.len(), 3);
        assert!(items[0].is_ok());
        assert!(items[1].is_err());
    }

    #[tokio::test]
    async fn test_keys() {
        let keys = backend().keys().await.unwrap();
        assert_eq!(keys, vec!["home/user/.ssh/id_rsa", "home/user/notes.txt", "logo.png"]);
    }

    #[tokio::test]
    async fn test_broken_object() {
        let backend = backend().with_broken_object("home/user/notes.txt");
        let items: Vec<_> = backend.list_objects().collect().await;
        assert_eq!(items.len(), 3);
        assert!(items[1].is_err());
        assert_eq!(items[2].as_ref().unwrap(), "logo.png");
    }

    #[tokio::test]
    async fn test_denied_root_denies_bucket() {
        let backend = backend().with_denied("");
        let err = backend.keys().await.unwrap_err();
        assert!(err.is_denied());
    }

    #[test]
    #[should_panic(expected = "invalid path")]
    fn test_with_files_panics_on_bad_path() {
        MockBackend::with_files(["../escape"]);
    }
}
