//! Listing capabilities and their implementations.
//!
//! Two shapes of container are supported: shares, which are trees of
//! directories that get listed one level at a time ([`ShareBackend`]), and
//! buckets, which are flat sets of objects addressed by full key
//! ([`BucketBackend`]). A single backend may expose both views of the same
//! data, as [`LocalBackend`] does.

mod local;
#[cfg(feature = "mock")]
mod mock;
#[cfg(feature = "s3")]
mod s3;

pub use self::local::LocalBackend;
#[cfg(feature = "mock")]
pub use self::mock::MockBackend;
#[cfg(feature = "s3")]
pub use self::s3::{S3Account, S3Backend};
use crate::error::Result;
use crate::models::Entry;
use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use std::pin::Pin;

pub type EntryStream<'a> = Pin<Box<dyn Stream<Item = Result<Entry>> + Send + 'a>>;
pub type ObjectStream<'a> = Pin<Box<dyn Stream<Item = Result<String>> + Send + 'a>>;

/// A hierarchical container: directories holding directories and files.
///
/// Directories are addressed by their container path (see
/// [`join_path`](crate::join_path)); the root is `""`. The handle for a child
/// directory is simply `join_path(dir, &entry.name)`.
///
/// # Examples
///
/// ```
/// use futures::TryStreamExt;
/// # use snuffle_storage::{ShareBackend, error::Result};
/// # async fn example(share: &dyn ShareBackend) -> Result<()> {
/// let mut entries = share.list_dir("/home");
/// while let Some(entry) = entries.try_next().await? {
///     println!("{} ({:?})", entry.name, entry.kind);
/// }
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait ShareBackend: Send + Sync {
    /// Name of the share, used for reporting and logging only.
    fn name(&self) -> &str;

    /// List the immediate children of `dir`, collected into a [`Vec`].
    async fn list(&self, dir: &str) -> Result<Vec<Entry>> {
        self.list_dir(dir).try_collect().await
    }

    /// Stream the immediate children of `dir`.
    ///
    /// # Notes
    /// - Failing to open the directory at all is reported as the first (and
    ///   only) item of the stream.
    /// - A directory that doesn't exist lists as empty, to stay consistent
    ///   with object stores.
    /// - A credentials problem must surface as
    ///   [`PermissionDenied`](crate::error::ErrorKind::PermissionDenied) and
    ///   nothing else.
    fn list_dir<'a>(&'a self, dir: &str) -> EntryStream<'a>;
}

/// A flat container: objects addressed by full key, no real directories.
#[async_trait]
pub trait BucketBackend: Send + Sync {
    /// Name of the bucket, used for reporting and logging only.
    fn name(&self) -> &str;

    /// Every object key in the bucket, collected into a [`Vec`].
    async fn keys(&self) -> Result<Vec<String>> {
        self.list_objects().try_collect().await
    }

    /// Stream every object key in the bucket.
    ///
    /// Errors for individual items (or pages) may be followed by further
    /// keys; consumers decide whether to keep going.
    fn list_objects(&self) -> ObjectStream<'_>;
}
