use crate::WalkOptions;
use crate::event::{Finding, WalkEvent, WalkStats};
use async_stream::stream;
use futures::{Stream, StreamExt};
use snuffle_rules::{Candidate, RuleSet, Verdict};
use snuffle_storage::backend::EntryStream;
use snuffle_storage::{EntryKind, ShareBackend, join_path};
use tokio_util::sync::CancellationToken;

/// A directory whose listing is in progress.
struct Frame<'a> {
    path: String,
    depth: usize,
    entries: EntryStream<'a>,
}
impl<'a> Frame<'a> {
    fn open(share: &'a dyn ShareBackend, path: String, depth: usize) -> Self {
        let entries = share.list_dir(&path);
        Self { path, depth, entries }
    }
}

/// Walks a share depth-first, classifying every entry it lists.
///
/// Directories are visited in the order their parent's listing returns
/// them, using an explicit stack of open listings rather than recursion.
/// The root has an empty path, so its children are `/name`.
///
/// - Skipped directories are neither reported nor descended.
/// - Raised directories are reported *and* descended.
/// - Directories nested deeper than [`WalkOptions::max_depth`] are
///   classified but not descended.
/// - A listing refused with `PermissionDenied` ends that sub-tree silently;
///   any other listing error is logged and abandons the rest of that one
///   directory. Siblings and ancestors carry on either way.
/// - `cancel` is checked whenever the walk waits on a listing.
///
/// The stream always ends with a single [`WalkEvent::Complete`].
pub fn walk_share<'a>(
    share: &'a dyn ShareBackend,
    rules: &'a RuleSet,
    options: &'a WalkOptions,
    cancel: &'a CancellationToken,
) -> impl Stream<Item = WalkEvent> + Send + 'a {
    stream!({
        let mut stats = WalkStats { containers: 1, ..Default::default() };
        let mut stack = vec![Frame::open(share, String::new(), 0)];

        while let Some(frame) = stack.last_mut() {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => None,
                item = frame.entries.next() => Some(item),
            };
            let Some(item) = next else {
                tracing::info!(share = share.name(), path = %frame.path, "Walk cancelled");
                stats.cancelled = true;
                break;
            };
            let entry = match item {
                Some(Ok(entry)) => entry,
                None => {
                    stack.pop();
                    continue;
                },
                Some(Err(err)) if err.is_denied() => {
                    tracing::debug!(share = share.name(), path = %frame.path, "Access denied; skipping sub-tree");
                    stats.denied += 1;
                    stack.pop();
                    continue;
                },
                Some(Err(err)) => {
                    tracing::warn!(share = share.name(), path = %frame.path, error = ?err, "Listing failed; abandoning directory");
                    stats.faults += 1;
                    stack.pop();
                    continue;
                },
            };

            stats.entries += 1;
            let path = join_path(&frame.path, &entry.name);
            let depth = frame.depth + 1;
            tracing::trace!(share = share.name(), path = %path, kind = ?entry.kind, "Listed entry");

            match entry.kind {
                EntryKind::Directory => {
                    let verdict = rules.classify(&Candidate::Container { name: &entry.name, path: &path });
                    if verdict == Verdict::Skip {
                        stats.skipped += 1;
                        continue;
                    }
                    if let Verdict::Raise(reason) = verdict {
                        stats.findings += 1;
                        yield WalkEvent::Finding(Finding::new(path.clone(), reason));
                    }
                    if depth > options.max_depth {
                        tracing::warn!(share = share.name(), path = %path, max_depth = options.max_depth, "Too deep; not descending");
                        stats.truncated += 1;
                        continue;
                    }
                    stats.containers += 1;
                    stack.push(Frame::open(share, path, depth));
                },
                EntryKind::File => match rules.classify(&Candidate::File { name: &entry.name, path: &path }) {
                    Verdict::Skip => stats.skipped += 1,
                    Verdict::Raise(reason) => {
                        stats.findings += 1;
                        yield WalkEvent::Finding(Finding::new(path, reason));
                    },
                    Verdict::Pass => {},
                },
            }
        }

        yield WalkEvent::Complete(stats);
    })
}
