//! Storage models.

/// Whether a listed entry can hold further entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Directory,
    File,
}

/// One immediate child of a share directory, as returned by a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Leaf name, without any separators
    pub name: String,
    pub kind: EntryKind,
}
impl Entry {
    pub fn new(name: impl Into<String>, kind: EntryKind) -> Self {
        Self { name: name.into(), kind }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self::new(name, EntryKind::Directory)
    }

    pub fn file(name: impl Into<String>) -> Self {
        Self::new(name, EntryKind::File)
    }
}
