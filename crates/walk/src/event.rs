use snuffle_rules::Reason;

/// A path judged sensitive, and the rule category that flagged it.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Finding {
    /// Full forward-slash path: `/dir/file` within a share, the object key
    /// within a bucket.
    pub path: String,
    pub reason: Reason,
}
impl Finding {
    pub fn new(path: impl Into<String>, reason: Reason) -> Self {
        Self { path: path.into(), reason }
    }
}

/// Emitted by [`walk_share`](crate::walk_share) and
/// [`walk_bucket`](crate::walk_bucket): zero or more findings, then exactly
/// one [`Complete`](Self::Complete).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WalkEvent {
    Finding(Finding),
    Complete(WalkStats),
}

/// Counters for one walk, or (merged) for a whole run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WalkStats {
    /// Directories (or buckets) whose listing was started.
    pub containers: u64,
    /// Entries or objects returned by listings.
    pub entries: u64,
    /// Entries suppressed by a skip rule.
    pub skipped: u64,
    pub findings: u64,
    /// Listings refused for lack of access.
    pub denied: u64,
    /// Listings abandoned because of any other error.
    pub faults: u64,
    /// Directories not descended because of the depth guard.
    pub truncated: u64,
    /// The walk stopped early because it was cancelled.
    pub cancelled: bool,
}
impl WalkStats {
    pub fn merge(&mut self, other: &WalkStats) {
        self.containers += other.containers;
        self.entries += other.entries;
        self.skipped += other.skipped;
        self.findings += other.findings;
        self.denied += other.denied;
        self.faults += other.faults;
        self.truncated += other.truncated;
        self.cancelled |= other.cancelled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge() {
        let mut total = WalkStats { containers: 2, findings: 1, ..Default::default() };
        total.merge(&WalkStats { containers: 3, denied: 1, cancelled: true, ..Default::default() });
        assert_eq!(total.containers, 5);
        assert_eq!(total.findings, 1);
        assert_eq!(total.denied, 1);
        assert!(total.cancelled);
    }
}
