use async_trait::async_trait;
use reqwest::header::{ACCEPT_RANGES, CONTENT_LENGTH, CONTENT_RANGE, COOKIE, RANGE, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::ReadAt;
use anyhow::{Context, Result, anyhow, bail};

/// Request details forwarded to the remote archive host.
#[derive(Debug, Clone)]
pub struct RemoteOptions {
    /// `Cookie` header of the inbound request, if any.
    pub cookie: Option<String>,
    /// `User-Agent` header of the inbound request, if any.
    pub user_agent: Option<String>,
    pub timeout: Duration,
}

impl Default for RemoteOptions {
    fn default() -> Self {
        Self {
            cookie: None,
            user_agent: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// HTTP Range reader for remote archives
pub struct HttpRangeReader {
    client: Client,
    url: String,
    options: RemoteOptions,
    size: u64,
    transferred_bytes: AtomicU64,
}

impl HttpRangeReader {
    /// Create a new HTTP Range reader
    ///
    /// Sends a HEAD request to verify Range support and get the object size.
    /// Servers that refuse HEAD, or answer it without advertising ranges, are
    /// probed once more with a one-byte ranged GET; only that probe's failure
    /// is fatal.
    pub async fn new(url: String, options: RemoteOptions) -> Result<Self> {
        let client = Client::builder().timeout(options.timeout).build()?;
        let mut reader = Self {
            client,
            url,
            options,
            size: 0,
            transferred_bytes: AtomicU64::new(0),
        };

        reader.size = match reader.probe_head().await {
            Ok(Some(size)) => size,
            Ok(None) => reader.probe_range().await?,
            Err(err) => {
                tracing::debug!(url = %reader.url, "HEAD probe failed: {err:#}");
                reader.probe_range().await?
            }
        };
        tracing::debug!(url = %reader.url, size = reader.size, "opened remote archive");

        Ok(reader)
    }

    /// Get total bytes transferred from network
    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes.load(Ordering::Relaxed)
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        let mut builder = builder;
        if let Some(cookie) = &self.options.cookie {
            builder = builder.header(COOKIE, cookie);
        }
        if let Some(user_agent) = &self.options.user_agent {
            builder = builder.header(USER_AGENT, user_agent);
        }
        builder
    }

    async fn probe_head(&self) -> Result<Option<u64>> {
        let resp = self
            .request(self.client.head(&self.url))
            .send()
            .await
            .with_context(|| format!("failed to reach {}", self.url))?;

        if !resp.status().is_success() {
            bail!("HTTP request failed with status: {}", resp.status());
        }

        let accept_ranges = header_str(&resp, ACCEPT_RANGES).unwrap_or("none");
        if !accept_ranges.contains("bytes") {
            return Ok(None);
        }

        Ok(header_str(&resp, CONTENT_LENGTH).and_then(|s| s.parse().ok()))
    }

    async fn probe_range(&self) -> Result<u64> {
        let resp = self
            .request(self.client.get(&self.url))
            .header(RANGE, "bytes=0-0")
            .send()
            .await
            .with_context(|| format!("failed to reach {}", self.url))?;

        if resp.status() != StatusCode::PARTIAL_CONTENT {
            bail!(
                "Remote server does not support Range requests (status: {})",
                resp.status()
            );
        }

        header_str(&resp, CONTENT_RANGE)
            .and_then(total_from_content_range)
            .ok_or_else(|| anyhow!("Remote server did not return a usable Content-Range"))
    }
}

fn header_str(resp: &Response, name: reqwest::header::HeaderName) -> Option<&str> {
    resp.headers().get(name).and_then(|v| v.to_str().ok())
}

/// Total length from a `Content-Range: bytes a-b/total` value.
fn total_from_content_range(value: &str) -> Option<u64> {
    let (_, total) = value.rsplit_once('/')?;
    total.trim().parse().ok()
}

#[async_trait]
impl ReadAt for HttpRangeReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() || offset >= self.size {
            return Ok(0);
        }

        let end = offset + buf.len() as u64 - 1;
        let end = end.min(self.size - 1);
        let expected_size = (end - offset + 1) as usize;

        let mut received = 0;
        while received < expected_size {
            let current_start = offset + received as u64;
            let range = format!("bytes={}-{}", current_start, end);

            let resp = self
                .request(self.client.get(&self.url))
                .header(RANGE, &range)
                .send()
                .await?;

            if resp.status() != StatusCode::PARTIAL_CONTENT {
                bail!("HTTP request failed with status: {}", resp.status());
            }

            let bytes = resp.bytes().await?;
            if bytes.is_empty() {
                bail!("Remote server returned an empty body for {}", range);
            }
            let chunk_len = bytes.len().min(expected_size - received);
            buf[received..received + chunk_len].copy_from_slice(&bytes[..chunk_len]);
            received += chunk_len;

            self.transferred_bytes
                .fetch_add(chunk_len as u64, Ordering::Relaxed);
            tracing::trace!(%range, bytes = chunk_len, "fetched remote range");
        }

        Ok(received)
    }

    fn size(&self) -> u64 {
        self.size
    }
}
