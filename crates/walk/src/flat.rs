use crate::event::{Finding, WalkEvent, WalkStats};
use async_stream::stream;
use futures::{Stream, StreamExt};
use snuffle_rules::{Candidate, RuleSet, Verdict};
use snuffle_storage::BucketBackend;
use tokio_util::sync::CancellationToken;

/// Classifies every object key of a bucket, once, in listing order.
///
/// A bucket has no directories to descend, so there is nothing to prune: an
/// error for one object (or one page) is logged and the listing carries on
/// for as long as the backend keeps producing keys. Keys are reported
/// verbatim.
pub fn walk_bucket<'a>(
    bucket: &'a dyn BucketBackend,
    rules: &'a RuleSet,
    cancel: &'a CancellationToken,
) -> impl Stream<Item = WalkEvent> + Send + 'a {
    stream!({
        let mut stats = WalkStats { containers: 1, ..Default::default() };
        let mut objects = bucket.list_objects();

        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => None,
                item = objects.next() => Some(item),
            };
            let key = match next {
                None => {
                    tracing::info!(bucket = bucket.name(), "Walk cancelled");
                    stats.cancelled = true;
                    break;
                },
                Some(None) => break,
                Some(Some(Ok(key))) => key,
                Some(Some(Err(err))) if err.is_denied() => {
                    tracing::debug!(bucket = bucket.name(), "Access denied");
                    stats.denied += 1;
                    continue;
                },
                Some(Some(Err(err))) => {
                    tracing::warn!(bucket = bucket.name(), error = ?err, "Object listing failed");
                    stats.faults += 1;
                    continue;
                },
            };

            stats.entries += 1;
            tracing::trace!(bucket = bucket.name(), key = %key, "Listed object");
            match rules.classify(&Candidate::Blob { path: &key }) {
                Verdict::Skip => stats.skipped += 1,
                Verdict::Raise(reason) => {
                    stats.findings += 1;
                    yield WalkEvent::Finding(Finding::new(key, reason));
                },
                Verdict::Pass => {},
            }
        }

        yield WalkEvent::Complete(stats);
    })
}
