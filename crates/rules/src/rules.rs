//! Rule tables.
//!
//! A [`RuleSet`] is built once (usually at startup, from the built-in tables
//! plus whatever the configuration adds) and then only ever read. Share it
//! behind an [`Arc`](std::sync::Arc); there is nothing to lock.

use crate::consts;
use std::collections::HashSet;

/// Identifies one of the seven rule tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Table {
    /// Directory names never descended into (matched by equality).
    ExcludedDirectoryNames,
    /// Directory names reported on sight (matched by equality).
    InterestingDirectoryNames,
    /// File name suffixes ignored outright.
    ExcludedExtensions,
    /// Full path suffixes of known-benign files.
    ExcludedPathSuffixes,
    /// Tokens that make a file name interesting when contained in it.
    InterestingFilenameSubstrings,
    /// File name suffixes interesting by default.
    InterestingExtensions,
    /// Full path suffixes of known-sensitive locations.
    InterestingPathSuffixes,
}
impl Table {
    pub const ALL: [Table; 7] = [
        Table::ExcludedDirectoryNames,
        Table::InterestingDirectoryNames,
        Table::ExcludedExtensions,
        Table::ExcludedPathSuffixes,
        Table::InterestingFilenameSubstrings,
        Table::InterestingExtensions,
        Table::InterestingPathSuffixes,
    ];

    /// The built-in entries for this table.
    pub fn defaults(self) -> &'static [&'static str] {
        match self {
            Self::ExcludedDirectoryNames => consts::EXCLUDED_DIRECTORY_NAMES,
            Self::InterestingDirectoryNames => consts::INTERESTING_DIRECTORY_NAMES,
            Self::ExcludedExtensions => consts::EXCLUDED_EXTENSIONS,
            Self::ExcludedPathSuffixes => consts::EXCLUDED_PATH_SUFFIXES,
            Self::InterestingFilenameSubstrings => consts::INTERESTING_FILENAME_SUBSTRINGS,
            Self::InterestingExtensions => consts::INTERESTING_EXTENSIONS,
            Self::InterestingPathSuffixes => consts::INTERESTING_PATH_SUFFIXES,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Lowercased, de-duplicated, non-empty entries of one table.
///
/// All matching helpers expect the candidate to be lowercased already; the
/// classifier lowercases each candidate exactly once.
#[derive(Clone, Debug, Default)]
pub(crate) struct Entries(Vec<String>);
impl Entries {
    fn normalize(raw: Vec<String>) -> Self {
        let mut seen = HashSet::new();
        let entries = raw
            .into_iter()
            .map(|entry| entry.to_lowercase())
            // An empty token is contained in every string and would flag everything.
            .filter(|entry| !entry.is_empty())
            .filter(|entry| seen.insert(entry.clone()))
            .collect();
        Self(entries)
    }

    pub(crate) fn equals(&self, candidate: &str) -> bool {
        self.0.iter().any(|entry| entry == candidate)
    }

    pub(crate) fn suffix_of(&self, candidate: &str) -> bool {
        self.0.iter().any(|entry| candidate.ends_with(entry.as_str()))
    }

    pub(crate) fn contained_in(&self, candidate: &str) -> bool {
        self.0.iter().any(|entry| candidate.contains(entry.as_str()))
    }

    fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Immutable set of rule tables consulted by the classifier.
///
/// # Examples
///
/// ```
/// use snuffle_rules::{Reason, RuleSet, Table};
///
/// let rules = RuleSet::builder()
///     .extend(Table::InterestingFilenameSubstrings, ["vault-token"])
///     .build();
/// assert_eq!(rules.should_raise_file("/srv/vault-token", "vault-token"), Some(Reason::Name));
/// assert!(rules.should_skip_file("/www/logo.PNG", "logo.PNG"));
/// ```
#[derive(Clone, Debug)]
pub struct RuleSet {
    tables: [Entries; 7],
}
impl RuleSet {
    /// Start building from the built-in tables.
    pub fn builder() -> RuleSetBuilder {
        RuleSetBuilder::with_defaults()
    }

    pub(crate) fn table(&self, table: Table) -> &Entries {
        &self.tables[table.index()]
    }

    /// Normalised (lowercase) entries of a table.
    pub fn entries(&self, table: Table) -> impl Iterator<Item = &str> {
        self.table(table).iter()
    }
}
impl Default for RuleSet {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Collects raw table entries before they get frozen into a [`RuleSet`].
#[derive(Clone, Debug, Default)]
pub struct RuleSetBuilder {
    tables: [Vec<String>; 7],
}
impl RuleSetBuilder {
    /// Builder pre-populated with the built-in tables.
    pub fn with_defaults() -> Self {
        let mut builder = Self::empty();
        for table in Table::ALL {
            builder = builder.extend(table, table.defaults().iter().copied());
        }
        builder
    }

    /// Builder with every table empty.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Append entries to a table. Casing and duplicates don't matter.
    pub fn extend(mut self, table: Table, entries: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tables[table.index()].extend(entries.into_iter().map(Into::into));
        self
    }

    pub fn build(self) -> RuleSet {
        RuleSet { tables: self.tables.map(Entries::normalize) }
    }
}
