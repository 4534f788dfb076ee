//! Rule tables and the classifier that decides, for every entry a walker
//! sees, whether to skip it, report it, or let it pass.
//!
//! Matching is plain case-insensitive equality, suffix and substring tests.
//! No regexes, no globs, and no file contents.

mod classify;
mod consts;
mod rules;

pub use crate::classify::{Candidate, Reason, Verdict};
pub use crate::rules::{RuleSet, RuleSetBuilder, Table};
