//! Skip/raise decisions over a [`RuleSet`].
//!
//! Every predicate here is total: any string, including the empty string,
//! gets a definite answer. Skip rules are always consulted before raise
//! rules, so a known-benign entry never produces a finding even if it also
//! looks interesting.

use crate::rules::{Entries, RuleSet, Table};
use derive_more::Display;

/// Which rule category flagged an entry.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(rename_all = "lowercase"))]
pub enum Reason {
    #[display("path")]
    Path,
    #[display("name")]
    Name,
    #[display("extension")]
    Extension,
    #[display("directory")]
    Directory,
}

/// One entry under consideration. Lives for a single classification call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Candidate<'a> {
    /// A sub-directory of a share.
    Container { name: &'a str, path: &'a str },
    /// A terminal file of a share.
    File { name: &'a str, path: &'a str },
    /// An object in a flat bucket, addressed by its full key.
    Blob { path: &'a str },
}

/// Outcome of classifying a [`Candidate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Ignore the entry (and, for containers, everything beneath it).
    Skip,
    /// Report the entry.
    Raise(Reason),
    /// Nothing to report; containers are still descended into.
    Pass,
}

impl RuleSet {
    /// The decision interface shared by the tree and flat walkers.
    pub fn classify(&self, candidate: &Candidate<'_>) -> Verdict {
        match *candidate {
            Candidate::Container { name, .. } => {
                let name = name.to_lowercase();
                if self.table(Table::ExcludedDirectoryNames).equals(&name) {
                    Verdict::Skip
                } else if self.table(Table::InterestingDirectoryNames).equals(&name) {
                    Verdict::Raise(Reason::Directory)
                } else {
                    Verdict::Pass
                }
            },
            Candidate::File { name, path } => {
                let (name, path) = (name.to_lowercase(), path.to_lowercase());
                if self.skip_file(&path, &name) {
                    return Verdict::Skip;
                }
                self.raise_file(&path, &name).map_or(Verdict::Pass, Verdict::Raise)
            },
            Candidate::Blob { path } => {
                let path = path.to_lowercase();
                if self.skip_blob(&path) {
                    return Verdict::Skip;
                }
                self.raise_blob(&path).map_or(Verdict::Pass, Verdict::Raise)
            },
        }
    }

    /// `true` if a directory with this exact name must not be descended into.
    pub fn should_skip_container(&self, name: &str) -> bool {
        self.table(Table::ExcludedDirectoryNames).equals(&name.to_lowercase())
    }

    /// `true` if a directory with this exact name is worth reporting. Raising
    /// a directory never stops it from being walked.
    pub fn should_raise_container(&self, name: &str) -> bool {
        self.table(Table::InterestingDirectoryNames).equals(&name.to_lowercase())
    }

    pub fn should_skip_file(&self, path: &str, name: &str) -> bool {
        self.skip_file(&path.to_lowercase(), &name.to_lowercase())
    }

    /// First matching raise rule, in precedence order: path suffix, then
    /// file name token, then extension.
    ///
    /// Does not consult the skip rules; use [`classify`](Self::classify) to
    /// get both in the right order.
    pub fn should_raise_file(&self, path: &str, name: &str) -> Option<Reason> {
        self.raise_file(&path.to_lowercase(), &name.to_lowercase())
    }

    pub fn should_skip_blob(&self, path: &str) -> bool {
        self.skip_blob(&path.to_lowercase())
    }

    /// First matching raise rule for an object key: directory name anywhere
    /// in the key, then path suffix, then file name token, then extension.
    ///
    /// The name and extension rules only look at the last segment of the
    /// key, so a token in a parent "directory" (`passwd_rotation/summary.md`)
    /// does not raise the object.
    pub fn should_raise_blob(&self, path: &str) -> Option<Reason> {
        self.raise_blob(&path.to_lowercase())
    }

    fn skip_file(&self, path: &str, name: &str) -> bool {
        self.table(Table::ExcludedExtensions).suffix_of(name)
            || path_suffix_matches(self.table(Table::ExcludedPathSuffixes), path)
    }

    fn raise_file(&self, path: &str, name: &str) -> Option<Reason> {
        if path_suffix_matches(self.table(Table::InterestingPathSuffixes), path) {
            Some(Reason::Path)
        } else if self.table(Table::InterestingFilenameSubstrings).contained_in(name) {
            Some(Reason::Name)
        } else if self.table(Table::InterestingExtensions).suffix_of(name) {
            Some(Reason::Extension)
        } else {
            None
        }
    }

    fn skip_blob(&self, path: &str) -> bool {
        // A key can encode what would be an administrative share in a tree.
        self.table(Table::ExcludedDirectoryNames).contained_in(path) || self.skip_file(path, leaf(path))
    }

    fn raise_blob(&self, path: &str) -> Option<Reason> {
        // No directory nodes to raise individually, so look for them in the key.
        if self.table(Table::InterestingDirectoryNames).contained_in(path) {
            return Some(Reason::Directory);
        }
        self.raise_file(path, leaf(path))
    }
}

/// A path suffix matches the entry itself or the directory directly holding
/// it, so `.ssh` flags both `/home/u/.ssh` and `/home/u/.ssh/id_rsa`.
fn path_suffix_matches(entries: &Entries, path: &str) -> bool {
    entries.suffix_of(path) || path.rsplit_once('/').is_some_and(|(parent, _)| entries.suffix_of(parent))
}

fn leaf(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, name)| name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Table;
    use rstest::rstest;

    fn rules() -> RuleSet {
        RuleSet::default()
    }

    #[rstest]
    #[case("IPC$")]
    #[case("ipc$")]
    #[case("Print$")]
    fn test_excluded_containers_are_skipped(#[case] name: &str) {
        assert!(rules().should_skip_container(name));
        let candidate = Candidate::Container { name, path: "" };
        assert_eq!(rules().classify(&candidate), Verdict::Skip);
    }

    #[rstest]
    #[case("IPC")]
    #[case("myIPC$")]
    #[case("")]
    fn test_container_skip_requires_equality(#[case] name: &str) {
        assert!(!rules().should_skip_container(name));
    }

    #[rstest]
    #[case("ADMIN$", true)]
    #[case("c$", true)]
    #[case("SccmContentLib$", true)]
    #[case("ADMIN", false)]
    #[case("", false)]
    fn test_raise_container(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(rules().should_raise_container(name), expected);
    }

    #[rstest]
    #[case("/www/logo.PNG", "logo.PNG")]
    #[case("/x/secrets.css", "secrets.css")]
    #[case("/x/passwords.lock", "passwords.lock")]
    #[case("/opt/jmxremote/.password/.template", ".template")]
    fn test_skip_beats_raise(#[case] path: &str, #[case] name: &str) {
        assert!(rules().should_skip_file(path, name));
        assert_eq!(rules().classify(&Candidate::File { name, path }), Verdict::Skip);
    }

    #[rstest]
    #[case("/home/user/.ssh/id_rsa", "id_rsa", Some(Reason::Path))]
    #[case("/home/user/.aws", ".aws", Some(Reason::Path))]
    #[case("/deploy/Control/CustomSettings.ini", "CustomSettings.ini", Some(Reason::Path))]
    #[case("/home/user/.config/doctl/config.yaml", "config.yaml", Some(Reason::Path))]
    #[case("/home/user/id_rsa", "id_rsa", Some(Reason::Name))]
    #[case("/srv/app/.env", ".env", Some(Reason::Name))]
    #[case("/srv/DB_Password_list.docx", "DB_Password_list.docx", Some(Reason::Name))]
    #[case("/srv/app/settings.py", "settings.py", Some(Reason::Extension))]
    #[case("/srv/backup.BAK", "backup.BAK", Some(Reason::Extension))]
    #[case("/srv/readme.md", "readme.md", None)]
    #[case("", "", None)]
    fn test_raise_file_precedence(#[case] path: &str, #[case] name: &str, #[case] expected: Option<Reason>) {
        assert_eq!(rules().should_raise_file(path, name), expected);
    }

    #[test]
    fn test_raise_file_is_case_insensitive() {
        let rules = rules();
        assert_eq!(rules.should_raise_file("/a/B.ENV", "B.ENV"), rules.should_raise_file("/a/b.env", "b.env"));
        assert_eq!(rules.should_raise_file("/a/b.env", "b.env"), Some(Reason::Name));
    }

    #[test]
    fn test_classify_is_idempotent() {
        let rules = rules();
        let candidate = Candidate::File { name: "web.config", path: "/inetpub/web.config" };
        let first = rules.classify(&candidate);
        assert_eq!(first, rules.classify(&candidate));
        assert_eq!(first, Verdict::Raise(Reason::Extension));
    }

    #[rstest]
    #[case("assets/logo.png", true)]
    #[case("IPC$/anything.txt", true)]
    #[case("shares/print$/driver.inf", true)]
    #[case("opt/jmxremote/.password/.template", true)]
    #[case("backups/2023/secrets.txt", false)]
    #[case("", false)]
    fn test_skip_blob(#[case] path: &str, #[case] expected: bool) {
        assert_eq!(rules().should_skip_blob(path), expected);
    }

    #[rstest]
    #[case("backups/2023/secrets.txt", Some(Reason::Name))]
    #[case("images/ADMIN$/notes.md", Some(Reason::Directory))]
    #[case("c$/windows/notes.md", Some(Reason::Directory))]
    #[case("home/user/.ssh/known_hosts", Some(Reason::Path))]
    #[case("home/user/.aws", Some(Reason::Path))]
    #[case("deploy/main.tf.json", Some(Reason::Extension))]
    #[case("reports/passwd_rotation/summary.md", None)]
    #[case("docs/readme.md", None)]
    #[case("", None)]
    fn test_raise_blob(#[case] path: &str, #[case] expected: Option<Reason>) {
        assert_eq!(rules().should_raise_blob(path), expected);
    }

    #[test]
    fn test_classify_blob_skips_before_raising() {
        let rules = rules();
        // Would be a directory raise, but the excluded extension wins.
        assert_eq!(rules.classify(&Candidate::Blob { path: "ADMIN$/logo.png" }), Verdict::Skip);
        assert_eq!(
            rules.classify(&Candidate::Blob { path: "backups/2023/secrets.txt" }),
            Verdict::Raise(Reason::Name)
        );
    }

    #[test]
    fn test_configured_entries_take_part() {
        let rules = RuleSet::builder()
            .extend(Table::ExcludedDirectoryNames, ["node_modules"])
            .extend(Table::InterestingPathSuffixes, [".kube/config"])
            .build();
        assert!(rules.should_skip_container("NODE_MODULES"));
        assert_eq!(rules.should_raise_file("/home/u/.kube/config", "config"), Some(Reason::Path));
    }

    #[rstest]
    #[case(Reason::Path, "path")]
    #[case(Reason::Name, "name")]
    #[case(Reason::Extension, "extension")]
    #[case(Reason::Directory, "directory")]
    fn test_reason_display(#[case] reason: Reason, #[case] expected: &str) {
        assert_eq!(reason.to_string(), expected);
    }
}
