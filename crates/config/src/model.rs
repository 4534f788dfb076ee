use crate::error::{ErrorKind, Result};
use serde::{Deserialize, Serialize};
use snuffle_rules::{RuleSet, RuleSetBuilder, Table};
use snuffle_walk::{DEFAULT_CONCURRENCY, DEFAULT_MAX_DEPTH, WalkOptions};
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Containers walked at once.
    pub concurrency: usize,
    /// Deepest directory nesting descended into.
    pub max_depth: usize,
    pub rules: RulesConfig,
    pub resources: Vec<ResourceConfig>,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            max_depth: DEFAULT_MAX_DEPTH,
            rules: RulesConfig::default(),
            resources: Vec::new(),
        }
    }
}
impl Config {
    pub fn walk_options(&self) -> WalkOptions {
        WalkOptions { max_depth: self.max_depth, concurrency: self.concurrency }
    }

    /// Reject values that parse but can't drive a run.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            exn::bail!(ErrorKind::Invalid("concurrency must be at least 1".to_string()));
        }
        if self.max_depth == 0 {
            exn::bail!(ErrorKind::Invalid("max_depth must be at least 1".to_string()));
        }
        let mut names = HashSet::new();
        for resource in &self.resources {
            let name = resource.name();
            if name.trim().is_empty() {
                exn::bail!(ErrorKind::Invalid("resource name must not be empty".to_string()));
            }
            if !names.insert(name) {
                exn::bail!(ErrorKind::Invalid(format!("duplicate resource name `{name}`")));
            }
            if let ResourceConfig::Local { root, .. } = resource
                && !root.is_absolute()
            {
                exn::bail!(ErrorKind::Invalid(format!("root of `{name}` must be absolute: {}", root.display())));
            }
        }
        Ok(())
    }
}

/// Extra rule entries, appended to (or replacing) the built-in tables.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RulesConfig {
    /// Start from the built-in tables. When `false`, only the entries below
    /// are used.
    pub extend_defaults: bool,
    pub excluded_directory_names: Vec<String>,
    pub interesting_directory_names: Vec<String>,
    pub excluded_extensions: Vec<String>,
    pub excluded_path_suffixes: Vec<String>,
    pub interesting_filename_substrings: Vec<String>,
    pub interesting_extensions: Vec<String>,
    pub interesting_path_suffixes: Vec<String>,
}
impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            extend_defaults: true,
            excluded_directory_names: Vec::new(),
            interesting_directory_names: Vec::new(),
            excluded_extensions: Vec::new(),
            excluded_path_suffixes: Vec::new(),
            interesting_filename_substrings: Vec::new(),
            interesting_extensions: Vec::new(),
            interesting_path_suffixes: Vec::new(),
        }
    }
}
impl RulesConfig {
    fn entries(&self, table: Table) -> &[String] {
        match table {
            Table::ExcludedDirectoryNames => &self.excluded_directory_names,
            Table::InterestingDirectoryNames => &self.interesting_directory_names,
            Table::ExcludedExtensions => &self.excluded_extensions,
            Table::ExcludedPathSuffixes => &self.excluded_path_suffixes,
            Table::InterestingFilenameSubstrings => &self.interesting_filename_substrings,
            Table::InterestingExtensions => &self.interesting_extensions,
            Table::InterestingPathSuffixes => &self.interesting_path_suffixes,
        }
    }

    pub fn build(&self) -> RuleSet {
        let builder = if self.extend_defaults { RuleSetBuilder::with_defaults() } else { RuleSetBuilder::empty() };
        Table::ALL
            .into_iter()
            .fold(builder, |builder, table| builder.extend(table, self.entries(table).iter().cloned()))
            .build()
    }
}

/// How a local directory tree is exposed to the walkers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocalView {
    /// Walked directory by directory.
    #[default]
    Share,
    /// Every file keyed by its relative path, like an object store.
    Bucket,
    Both,
}
impl LocalView {
    pub fn is_share(self) -> bool {
        matches!(self, Self::Share | Self::Both)
    }

    pub fn is_bucket(self) -> bool {
        matches!(self, Self::Bucket | Self::Both)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ResourceConfig {
    /// A directory on this machine, or a mounted network share.
    Local {
        name: String,
        root: PathBuf,
        #[serde(default, rename = "as")]
        view: LocalView,
    },
    /// An S3-compatible account.
    S3 {
        name: String,
        region: String,
        #[serde(default)]
        endpoint: Option<String>,
        key_id: String,
        key_secret: Secret,
        /// Buckets to walk, each optionally `bucket/prefix`. When absent,
        /// every bucket the credentials can list is walked.
        #[serde(default)]
        buckets: Option<Vec<String>>,
    },
}
impl ResourceConfig {
    pub fn name(&self) -> &str {
        match self {
            Self::Local { name, .. } | Self::S3 { name, .. } => name,
        }
    }
}

/// A credential that must never end up in logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);
impl Secret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}
impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(**redacted**)")
    }
}
