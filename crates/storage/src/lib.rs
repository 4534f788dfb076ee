pub mod backend;
pub mod error;
mod models;
mod path;

pub use crate::backend::{BucketBackend, ShareBackend};
pub use crate::models::{Entry, EntryKind};
pub use crate::path::{join as join_path, validate as validate_path};
use std::sync::Arc;

/// A hierarchical container (file share, directory tree).
pub type ShareHandle = Arc<dyn ShareBackend>;
/// A flat container (object bucket).
pub type BucketHandle = Arc<dyn BucketBackend>;
