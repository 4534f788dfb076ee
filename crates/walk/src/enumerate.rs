use crate::event::{WalkEvent, WalkStats};
use crate::{WalkOptions, walk_bucket, walk_share};
use async_stream::stream;
use derive_more::Display;
use futures::stream::{self, BoxStream};
use futures::{Stream, StreamExt};
use snuffle_rules::RuleSet;
use snuffle_storage::{BucketHandle, ShareHandle};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// One discovered storage resource: a storage account, a local tree, and
/// whatever containers it exposes in either shape.
#[derive(Clone)]
pub struct Resource {
    pub name: String,
    pub shares: Vec<ShareHandle>,
    pub buckets: Vec<BucketHandle>,
}
impl Resource {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), shares: Vec::new(), buckets: Vec::new() }
    }

    pub fn with_share(mut self, share: ShareHandle) -> Self {
        self.shares.push(share);
        self
    }

    pub fn with_bucket(mut self, bucket: BucketHandle) -> Self {
        self.buckets.push(bucket);
        self
    }
}
impl std::fmt::Debug for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resource")
            .field("name", &self.name)
            .field("shares", &self.shares.iter().map(|s| s.name()).collect::<Vec<_>>())
            .field("buckets", &self.buckets.iter().map(|b| b.name()).collect::<Vec<_>>())
            .finish()
    }
}

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(rename_all = "lowercase"))]
pub enum ContainerKind {
    #[display("share")]
    Share,
    #[display("bucket")]
    Bucket,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReportEvent {
    /// The resource exposes no containers of this kind.
    Empty,
    /// A container walk is about to begin.
    Started,
    Walk(WalkEvent),
}

/// A [`WalkEvent`] tagged with where it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Report {
    pub resource: Arc<str>,
    /// `None` only for [`ReportEvent::Empty`].
    pub container: Option<Arc<str>>,
    pub kind: ContainerKind,
    pub event: ReportEvent,
}

/// Walks every container of every resource, at most
/// [`WalkOptions::concurrency`] at a time.
///
/// For each container the stream carries [`ReportEvent::Started`], its
/// findings, then its [`WalkEvent::Complete`]. Reports from different
/// containers interleave unless the concurrency is `1`, in which case
/// containers are walked one after another in resource order (shares before
/// buckets).
pub fn enumerate<'a>(
    resources: &'a [Resource],
    rules: &'a RuleSet,
    options: &'a WalkOptions,
    cancel: &'a CancellationToken,
) -> impl Stream<Item = Report> + Send + 'a {
    let mut jobs: Vec<BoxStream<'a, Report>> = Vec::new();
    for resource in resources {
        let name: Arc<str> = Arc::from(resource.name.as_str());
        if resource.shares.is_empty() {
            jobs.push(empty(name.clone(), ContainerKind::Share));
        }
        for share in &resource.shares {
            let source = Source::new(&name, share.name(), ContainerKind::Share);
            jobs.push(source.run(walk_share(share.as_ref(), rules, options, cancel)));
        }
        if resource.buckets.is_empty() {
            jobs.push(empty(name.clone(), ContainerKind::Bucket));
        }
        for bucket in &resource.buckets {
            let source = Source::new(&name, bucket.name(), ContainerKind::Bucket);
            jobs.push(source.run(walk_bucket(bucket.as_ref(), rules, cancel)));
        }
    }
    tracing::debug!(resources = resources.len(), jobs = jobs.len(), concurrency = options.concurrency, "Enumerating");
    stream::iter(jobs).flatten_unordered(options.concurrency.max(1))
}

fn empty<'a>(resource: Arc<str>, kind: ContainerKind) -> BoxStream<'a, Report> {
    tracing::debug!(resource = %resource, %kind, "Resource has no containers of this kind");
    stream::once(async move { Report { resource, container: None, kind, event: ReportEvent::Empty } }).boxed()
}

struct Source {
    resource: Arc<str>,
    container: Arc<str>,
    kind: ContainerKind,
}
impl Source {
    fn new(resource: &Arc<str>, container: &str, kind: ContainerKind) -> Self {
        Self { resource: resource.clone(), container: Arc::from(container), kind }
    }

    fn report(&self, event: ReportEvent) -> Report {
        Report { resource: self.resource.clone(), container: Some(self.container.clone()), kind: self.kind, event }
    }

    fn run<'a>(self, walk: impl Stream<Item = WalkEvent> + Send + 'a) -> BoxStream<'a, Report> {
        Box::pin(stream! {
            yield self.report(ReportEvent::Started);
            for await event in walk {
                yield self.report(ReportEvent::Walk(event));
            }
        })
    }
}

/// Totals for a whole run, folded from every container's
/// [`WalkEvent::Complete`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Container walks that ran to completion (or were cancelled).
    pub walks: u64,
    /// "No shares"/"no buckets" notices.
    pub empty: u64,
    pub stats: WalkStats,
}
impl RunSummary {
    pub fn record(&mut self, report: &Report) {
        match &report.event {
            ReportEvent::Empty => self.empty += 1,
            ReportEvent::Walk(WalkEvent::Complete(stats)) => {
                self.walks += 1;
                self.stats.merge(stats);
            },
            ReportEvent::Started | ReportEvent::Walk(WalkEvent::Finding(_)) => {},
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Finding;
    use rstest::rstest;
    use snuffle_rules::Reason;
    use snuffle_storage::backend::MockBackend;

    fn resources() -> Vec<Resource> {
        let files = MockBackend::with_files(["IPC$/x.txt", "ADMIN$/notes.md", "public/passwords.txt"]).with_name("files");
        let backups = MockBackend::with_files(["2023/secrets.txt", "assets/logo.png"]).with_name("backups");
        vec![
            Resource::new("fileserver").with_share(Arc::new(files)),
            Resource::new("storage").with_bucket(Arc::new(backups)),
        ]
    }

    fn describe(report: &Report) -> String {
        let container = report.container.as_deref().unwrap_or("-");
        let event = match &report.event {
            ReportEvent::Empty => "empty".to_string(),
            ReportEvent::Started => "started".to_string(),
            ReportEvent::Walk(WalkEvent::Finding(Finding { path, reason })) => format!("{reason} {path}"),
            ReportEvent::Walk(WalkEvent::Complete(_)) => "complete".to_string(),
        };
        format!("{}/{} {}: {}", report.resource, report.kind, container, event)
    }

    #[tokio::test]
    async fn test_sequential_order() {
        let resources = resources();
        let rules = RuleSet::default();
        let options = WalkOptions { concurrency: 1, ..Default::default() };
        let cancel = CancellationToken::new();
        let reports: Vec<Report> = enumerate(&resources, &rules, &options, &cancel).collect().await;
        let lines: Vec<String> = reports.iter().map(describe).collect();
        assert_eq!(
            lines,
            vec![
                "fileserver/share files: started",
                "fileserver/share files: directory /ADMIN$",
                "fileserver/share files: name /public/passwords.txt",
                "fileserver/share files: complete",
                "fileserver/bucket -: empty",
                "storage/share -: empty",
                "storage/bucket backups: started",
                "storage/bucket backups: name 2023/secrets.txt",
                "storage/bucket backups: complete",
            ]
        );
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(8)]
    #[tokio::test]
    async fn test_summary_is_independent_of_concurrency(#[case] concurrency: usize) {
        let resources = resources();
        let rules = RuleSet::default();
        let options = WalkOptions { concurrency, ..Default::default() };
        let cancel = CancellationToken::new();
        let mut summary = RunSummary::default();
        let mut findings = Vec::new();
        let mut reports = std::pin::pin!(enumerate(&resources, &rules, &options, &cancel));
        while let Some(report) = reports.next().await {
            summary.record(&report);
            if let ReportEvent::Walk(WalkEvent::Finding(finding)) = report.event {
                findings.push(finding);
            }
        }
        findings.sort_by(|a, b| a.path.cmp(&b.path));
        assert_eq!(
            findings,
            vec![
                Finding::new("/ADMIN$", Reason::Directory),
                Finding::new("/public/passwords.txt", Reason::Name),
                Finding::new("2023/secrets.txt", Reason::Name),
            ]
        );
        assert_eq!(summary.walks, 2);
        assert_eq!(summary.empty, 2);
        assert_eq!(summary.stats.findings, 3);
        // `IPC$` on the share, `logo.png` in the bucket.
        assert_eq!(summary.stats.skipped, 2);
    }

    #[rstest]
    #[case(1)]
    #[case(4)]
    #[tokio::test]
    async fn test_failed_containers_do_not_stop_the_run(#[case] concurrency: usize) {
        let [fileserver, storage]: [Resource; 2] = resources().try_into().unwrap();
        // The faulty listing yields `a.txt` and then errors before `passwords.txt`.
        let faulty = MockBackend::with_files(["a.txt", "passwords.txt"]).with_name("flaky").with_fault("");
        let denied = MockBackend::with_files(["secrets.txt"]).with_name("locked").with_denied("");
        let broken = Resource::new("broken").with_share(Arc::new(faulty)).with_bucket(Arc::new(denied));
        let resources = vec![fileserver, broken, storage];
        let rules = RuleSet::default();
        let options = WalkOptions { concurrency, ..Default::default() };
        let cancel = CancellationToken::new();
        let mut summary = RunSummary::default();
        let mut findings = Vec::new();
        let mut reports = std::pin::pin!(enumerate(&resources, &rules, &options, &cancel));
        while let Some(report) = reports.next().await {
            summary.record(&report);
            if let ReportEvent::Walk(WalkEvent::Finding(finding)) = report.event {
                findings.push(finding);
            }
        }
        findings.sort_by(|a, b| a.path.cmp(&b.path));
        assert_eq!(
            findings,
            vec![
                Finding::new("/ADMIN$", Reason::Directory),
                Finding::new("/public/passwords.txt", Reason::Name),
                Finding::new("2023/secrets.txt", Reason::Name),
            ]
        );
        assert_eq!(summary.walks, 4);
        assert_eq!(summary.empty, 2);
        assert_eq!(summary.stats.denied, 1);
        assert_eq!(summary.stats.faults, 1);
    }

    #[tokio::test]
    async fn test_no_resources() {
        let rules = RuleSet::default();
        let cancel = CancellationToken::new();
        let reports: Vec<Report> = enumerate(&[], &rules, &WalkOptions::default(), &cancel).collect().await;
        assert!(reports.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_run_still_completes_every_walk() {
        let resources = resources();
        let rules = RuleSet::default();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut summary = RunSummary::default();
        let reports: Vec<Report> = enumerate(&resources, &rules, &WalkOptions::default(), &cancel).collect().await;
        reports.iter().for_each(|report| summary.record(report));
        assert_eq!(summary.walks, 2);
        assert_eq!(summary.stats.findings, 0);
        assert!(summary.stats.cancelled);
    }
}
