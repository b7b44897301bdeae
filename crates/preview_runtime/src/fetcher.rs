//! Pluggable bundle delivery seam.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use shared::protocol::BundleManifest;

/// Fetches a built preview bundle from a delivery endpoint. Hosts substitute
/// their own loading mechanism (HTTP, filesystem, embedded) while the
/// cache and orchestration logic stay identical.
#[async_trait]
pub trait BundleFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<BundleManifest>;
}

/// Fetches bundle manifests over HTTP from a base URL.
pub struct HttpBundleFetcher {
    http: Client,
    base_url: String,
}

impl HttpBundleFetcher {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl BundleFetcher for HttpBundleFetcher {
    async fn fetch(&self, url: &str) -> Result<BundleManifest> {
        let target = format!("{}{}", self.base_url, url);
        let response = self
            .http
            .get(&target)
            .send()
            .await
            .with_context(|| format!("failed to fetch preview bundle from {target}"))?
            .error_for_status()?;
        let manifest = response
            .json()
            .await
            .with_context(|| format!("malformed bundle manifest at {target}"))?;
        Ok(manifest)
    }
}

/// Placeholder for hosts wired without a delivery endpoint.
pub struct MissingBundleFetcher;

#[async_trait]
impl BundleFetcher for MissingBundleFetcher {
    async fn fetch(&self, url: &str) -> Result<BundleManifest> {
        Err(anyhow!("no bundle fetcher is available (requested {url})"))
    }
}
