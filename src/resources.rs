//! Turns configured (and ad-hoc) resources into backends the walkers can use.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use snuffle_config::{LocalView, ResourceConfig};
use snuffle_storage::backend::LocalBackend;
use snuffle_walk::Resource;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Configured resources first, in order, then one resource per ad-hoc
/// directory, named after the directory as given.
///
/// A resource that can't be set up is logged and kept without containers,
/// so it still gets its "no shares"/"no buckets" notices.
pub async fn build(configured: &[ResourceConfig], shares: &[PathBuf], buckets: &[PathBuf]) -> Vec<Resource> {
    let mut resources = Vec::with_capacity(configured.len() + shares.len() + buckets.len());
    for config in configured {
        resources.push(settle(config.name(), from_config(config).await));
    }
    for (dirs, view) in [(shares, LocalView::Share), (buckets, LocalView::Bucket)] {
        for dir in dirs {
            let name = dir.display().to_string();
            let resource = std::path::absolute(dir)
                .or_raise(|| ErrorKind::Resource(name.clone()))
                .and_then(|root| local(&name, &root, view));
            resources.push(settle(&name, resource));
        }
    }
    resources
}

fn settle(name: &str, resource: Result<Resource>) -> Resource {
    resource.unwrap_or_else(|err| {
        tracing::warn!(resource = name, error = ?err, "Could not set up resource; it will be reported empty");
        Resource::new(name)
    })
}

async fn from_config(config: &ResourceConfig) -> Result<Resource> {
    match config {
        ResourceConfig::Local { name, root, view } => local(name, root, *view),
        #[cfg(feature = "s3")]
        ResourceConfig::S3 { name, region, endpoint, key_id, key_secret, buckets } => {
            let account = snuffle_storage::backend::S3Account::new(
                name.as_str(),
                region.as_str(),
                endpoint.clone(),
                key_id.as_str(),
                key_secret.expose(),
            );
            s3(name, &account, buckets.as_deref()).await
        },
        #[cfg(not(feature = "s3"))]
        ResourceConfig::S3 { name, .. } => exn::bail!(ErrorKind::Unsupported(name.clone())),
    }
}

fn local(name: &str, root: &Path, view: LocalView) -> Result<Resource> {
    let backend = Arc::new(LocalBackend::new(name, root).or_raise(|| ErrorKind::Resource(name.to_string()))?);
    let mut resource = Resource::new(name);
    if view.is_share() {
        resource = resource.with_share(backend.clone());
    }
    if view.is_bucket() {
        resource = resource.with_bucket(backend);
    }
    Ok(resource)
}

/// Each entry of `buckets` is `bucket` or `bucket/prefix`; without a list,
/// every bucket the credentials can see is walked.
#[cfg(feature = "s3")]
async fn s3(
    name: &str,
    account: &snuffle_storage::backend::S3Account,
    buckets: Option<&[String]>,
) -> Result<Resource> {
    let buckets = match buckets {
        Some(buckets) => buckets.to_vec(),
        None => match account.buckets().await {
            Ok(buckets) => buckets,
            Err(err) if err.is_denied() => {
                tracing::warn!(resource = name, "Not allowed to list buckets");
                Vec::new()
            },
            Err(err) => return Err(err.raise(ErrorKind::Resource(name.to_string()))),
        },
    };
    let mut resource = Resource::new(name);
    for bucket in buckets {
        let (bucket, prefix) = match bucket.split_once('/') {
            Some((bucket, prefix)) => (bucket.to_string(), Some(prefix.to_string())),
            None => (bucket, None),
        };
        let backend = account.bucket(bucket, prefix).or_raise(|| ErrorKind::Resource(name.to_string()))?;
        resource = resource.with_bucket(Arc::new(backend));
    }
    Ok(resource)
}
