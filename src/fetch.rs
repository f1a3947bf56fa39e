use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, warn};
use url::Url;

/// Source of page bodies. The pipeline only ever needs a GET.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn get_html(&self, url: &Url) -> Result<String>;
}

/// Plain GETs over a shared reqwest client: no extra headers, no retries.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(8))
            .build()
            .context("failed to build http client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn get_html(&self, url: &Url) -> Result<String> {
        let rsp = self
            .client
            .get(url.as_str())
            .send()
            .await
            .with_context(|| format!("GET {url} failed"))?;

        // Capture before .text() consumes the response
        let status = rsp.status();
        if !status.is_success() {
            // error pages are still HTML; the extractors tolerate what's missing
            warn!(%url, %status, "non-success status");
        }
        let body = rsp
            .text()
            .await
            .with_context(|| format!("reading body of {url} failed"))?;
        debug!(%url, %status, len = body.len(), "fetched");
        Ok(body)
    }
}
