//! S3-compatible storage backend.
//!
//! An [`S3Account`] is one set of credentials against one endpoint; it can
//! discover the buckets those credentials can see and hand out an
//! [`S3Backend`] per bucket. Buckets are flat containers, so only the
//! [`BucketBackend`] view is implemented.
//!
//! # Credentials
//!
//! Credentials are provided explicitly via the configuration file. Each
//! account specifies its own `key_id` and `key_secret`.

use crate::backend::ObjectStream;
use crate::error::{ErrorKind, Result};
use crate::{BucketBackend, validate_path};
use async_stream::stream;
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region, retry::RetryConfig};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use exn::{OptionExt, ResultExt};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::instrument;

/// Generous default for concurrent S3 requests.
const DEFAULT_CONCURRENT_REQUESTS: usize = 100;

/// Error codes that mean "these credentials may not look here".
const DENIED_CODES: &[&str] = &["AccessDenied", "AllAccessDisabled", "InvalidAccessKeyId", "SignatureDoesNotMatch"];

/// One set of credentials against one S3-compatible endpoint.
///
/// # Examples
///
/// ```no_run
/// use snuffle_storage::backend::S3Account;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let account = S3Account::new(
///     "prod-aws",
///     "us-east-1",
///     None::<String>,
///     "access_key_id",
///     "secret_access_key",
/// );
/// for bucket in account.buckets().await? {
///     let backend = account.bucket(bucket, None)?;
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct S3Account {
    name: String,
    client: Client,
    /// Rate limiter for concurrent S3 requests, shared by every bucket.
    rate_limiter: Arc<Semaphore>,
}

impl S3Account {
    /// # Arguments
    /// * `name` - A name for this account (used in display/logging)
    /// * `region` - AWS region or provider-specific region (e.g., "us-west-004" for Backblaze)
    /// * `endpoint` - Custom endpoint URL for S3-compatible services
    /// * `key_id` - AWS/provider access key ID
    /// * `key_secret` - AWS/provider secret access key
    #[instrument(skip_all, fields(name = tracing::field::Empty))]
    pub fn new(
        name: impl Into<String>,
        region: impl Into<String>,
        endpoint: Option<impl Into<String>>,
        key_id: impl Into<String>,
        key_secret: impl Into<String>,
    ) -> Self {
        let name = name.into();
        tracing::Span::current().record("name", name.as_str());
        let credentials = Credentials::new(key_id, key_secret, None, None, "snuffle-config");
        let mut config_builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new(region.into()))
            // Transport-level retries only (1 initial + 3 retries); a
            // failed listing is still terminal for that bucket.
            .retry_config(RetryConfig::standard().with_max_attempts(4))
            // Use path-style addressing for better compatibility with
            // S3-compatible services (Backblaze, MinIO, etc.)
            .force_path_style(true);
        if let Some(endpoint_url) = endpoint {
            config_builder = config_builder.endpoint_url(endpoint_url);
        }
        let client = Client::from_conf(config_builder.build());
        Self {
            name,
            client,
            rate_limiter: Arc::new(Semaphore::new(DEFAULT_CONCURRENT_REQUESTS)),
        }
    }

    /// Names of every bucket these credentials can list.
    #[instrument(skip(self), fields(account = %self.name))]
    pub async fn buckets(&self) -> Result<Vec<String>> {
        let _permit = acquire_permit(&self.rate_limiter).await?;
        let output =
            self.client.list_buckets().send().await.map_err(|err| map_sdk_error(err, &self.name))?;
        let names: Vec<String> = output.buckets().iter().filter_map(|bucket| bucket.name()).map(String::from).collect();
        tracing::debug!(count = names.len(), "Discovered buckets");
        Ok(names)
    }

    /// A flat container for `bucket`, optionally restricted to keys under
    /// `prefix`.
    pub fn bucket(&self, bucket: impl Into<String>, prefix: Option<String>) -> Result<S3Backend> {
        let prefix = prefix
            .map(validate_path)
            .transpose()?
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| p.to_str().map(|s| format!("{s}/")).ok_or_raise(|| ErrorKind::InvalidPath(p.display().to_string())))
            .transpose()?;
        Ok(S3Backend {
            bucket: bucket.into(),
            prefix,
            client: self.client.clone(),
            rate_limiter: self.rate_limiter.clone(),
        })
    }
}

/// A single S3 bucket as a flat container.
///
/// Keys are reported verbatim (including any configured prefix), since they
/// are what an assessor would need to fetch the object.
#[derive(Debug, Clone)]
pub struct S3Backend {
    bucket: String,
    prefix: Option<String>,
    client: Client,
    rate_limiter: Arc<Semaphore>,
}

#[async_trait]
impl BucketBackend for S3Backend {
    fn name(&self) -> &str {
        &self.bucket
    }

    fn list_objects(&self) -> ObjectStream<'_> {
        Box::pin(stream! {
            let mut pages = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .set_prefix(self.prefix.clone())
                .into_paginator()
                .send();
            loop {
                // One permit per page request; released before yielding keys.
                let page = match acquire_permit(&self.rate_limiter).await {
                    Ok(_permit) => pages.next().await,
                    Err(e) => {
                        yield Err(e);
                        return;
                    },
                };
                match page {
                    Some(Ok(output)) => {
                        for key in output.contents().iter().filter_map(|object| object.key()) {
                            yield Ok(key.to_string());
                        }
                    },
                    // Pagination can't continue past a failed page.
                    Some(Err(err)) => match map_sdk_error(err, &self.bucket) {
                        ErrorKind::NotFound(_) => {
                            tracing::debug!(bucket = %self.bucket, "Bucket not found; listing as empty");
                            return;
                        },
                        kind => {
                            yield Err(exn::Exn::from(kind));
                            return;
                        },
                    },
                    None => return,
                }
            }
        })
    }
}

/// Acquire a rate limiter permit before making an S3 API call.
async fn acquire_permit(rate_limiter: &Arc<Semaphore>) -> Result<OwnedSemaphorePermit> {
    rate_limiter
        .clone()
        .acquire_owned()
        .await
        .or_raise(|| ErrorKind::BackendError("S3 request limiter closed".to_string()))
}

fn map_sdk_error<E, R>(err: SdkError<E, R>, target: &str) -> ErrorKind
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match err.code() {
        Some(code) if DENIED_CODES.contains(&code) => ErrorKind::PermissionDenied(target.to_string()),
        Some("NoSuchBucket") => ErrorKind::NotFound(target.to_string()),
        _ => match err {
            SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => {
                ErrorKind::Network(DisplayErrorContext(&err).to_string())
            },
            _ => ErrorKind::BackendError(DisplayErrorContext(&err).to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::error::ErrorMetadata;
    use aws_sdk_s3::operation::list_buckets::{ListBucketsError, ListBucketsOutput};
    use aws_sdk_s3::operation::list_objects_v2::{ListObjectsV2Error, ListObjectsV2Output};
    use aws_sdk_s3::types::{Bucket, Object};
    use aws_smithy_mocks::{Rule, RuleMode, mock, mock_client};
    use futures::StreamExt;

    fn account() -> S3Account {
        S3Account::new("test", "us-east-1", Some("http://localhost:9000"), "id", "secret")
    }

    fn mocked(rules: &[&Rule]) -> Client {
        mock_client!(aws_sdk_s3, RuleMode::Sequential, rules, |config| config
            .retry_config(RetryConfig::disabled()))
    }

    fn mocked_account(rules: &[&Rule]) -> S3Account {
        S3Account { name: "test".to_string(), client: mocked(rules), rate_limiter: Arc::new(Semaphore::new(1)) }
    }

    fn mocked_bucket(rules: &[&Rule]) -> S3Backend {
        mocked_account(rules).bucket("loot", None).unwrap()
    }

    fn page(keys: &[&str], next: Option<&str>) -> ListObjectsV2Output {
        ListObjectsV2Output::builder()
            .set_contents(Some(keys.iter().map(|key| Object::builder().key(*key).build()).collect()))
            .set_next_continuation_token(next.map(String::from))
            .is_truncated(next.is_some())
            .build()
    }

    fn failed_page(code: &'static str) -> Rule {
        mock!(aws_sdk_s3::Client::list_objects_v2)
            .then_error(move || ListObjectsV2Error::generic(ErrorMetadata::builder().code(code).build()))
    }

    #[tokio::test]
    async fn test_list_objects_follows_pages() {
        let first = mock!(aws_sdk_s3::Client::list_objects_v2)
            .match_requests(|req| req.continuation_token().is_none())
            .then_output(|| page(&["backups/a.kdbx", "backups/b.txt"], Some("next")));
        let second = mock!(aws_sdk_s3::Client::list_objects_v2)
            .match_requests(|req| req.continuation_token() == Some("next"))
            .then_output(|| page(&["web.config"], None));
        let keys = mocked_bucket(&[&first, &second]).keys().await.unwrap();
        assert_eq!(keys, vec!["backups/a.kdbx", "backups/b.txt", "web.config"]);
    }

    #[tokio::test]
    async fn test_failed_page_ends_the_listing() {
        let first = mock!(aws_sdk_s3::Client::list_objects_v2).then_output(|| page(&["a.txt"], Some("next")));
        let second = failed_page("InternalError");
        let items: Vec<_> = mocked_bucket(&[&first, &second]).list_objects().collect().await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "a.txt");
        let err = items[1].as_ref().unwrap_err();
        assert!(!err.is_denied());
        assert!(matches!(&**err, ErrorKind::BackendError(_)));
    }

    #[tokio::test]
    async fn test_access_denied_page_is_denied() {
        let denied = failed_page("AccessDenied");
        let items: Vec<_> = mocked_bucket(&[&denied]).list_objects().collect().await;
        assert_eq!(items.len(), 1);
        assert!(items[0].as_ref().unwrap_err().is_denied());
    }

    #[tokio::test]
    async fn test_missing_bucket_lists_as_empty() {
        let missing = failed_page("NoSuchBucket");
        let items: Vec<_> = mocked_bucket(&[&missing]).list_objects().collect().await;
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_discover_buckets() {
        let rule = mock!(aws_sdk_s3::Client::list_buckets).then_output(|| {
            ListBucketsOutput::builder()
                .buckets(Bucket::builder().name("loot").build())
                .buckets(Bucket::builder().name("backups").build())
                .build()
        });
        assert_eq!(mocked_account(&[&rule]).buckets().await.unwrap(), vec!["loot", "backups"]);
    }

    #[tokio::test]
    async fn test_discover_buckets_denied() {
        let rule = mock!(aws_sdk_s3::Client::list_buckets)
            .then_error(|| ListBucketsError::generic(ErrorMetadata::builder().code("AllAccessDisabled").build()));
        assert!(mocked_account(&[&rule]).buckets().await.unwrap_err().is_denied());
    }

    #[tokio::test]
    async fn test_bucket_without_prefix() {
        let backend = account().bucket("loot", None).unwrap();
        assert_eq!(backend.name(), "loot");
        assert_eq!(backend.prefix, None);
    }

    #[tokio::test]
    async fn test_bucket_prefix_is_normalized() {
        let backend = account().bucket("loot", Some("/backups//2023/".to_string())).unwrap();
        assert_eq!(backend.prefix.as_deref(), Some("backups/2023/"));
    }

    #[tokio::test]
    async fn test_bucket_root_prefix_is_dropped() {
        let backend = account().bucket("loot", Some("/".to_string())).unwrap();
        assert_eq!(backend.prefix, None);
    }

    #[tokio::test]
    async fn test_bucket_prefix_traversal_rejected() {
        assert!(account().bucket("loot", Some("../other".to_string())).is_err());
    }
}
