use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Url, header};
use std::collections::VecDeque;
use std::time::Duration;

use super::EntrySource;
use crate::error::{ArchiveError, Result};
use crate::request::Entry;

/// Name used when a URL has no usable last path segment
const FALLBACK_NAME: &str = "download";

/// Remote files fetched over HTTP(S)
///
/// Each URL becomes one entry named after the last segment of the final
/// (post-redirect) URL path. The `Last-Modified` header supplies the
/// modification time when present.
pub struct HttpSource {
    client: Client,
    urls: VecDeque<String>,
}

impl HttpSource {
    pub fn new(urls: Vec<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ArchiveError::read_failure("HTTP client", e))?;

        Ok(Self {
            client,
            urls: urls.into(),
        })
    }

    /// Check whether an input looks like an HTTP(S) URL
    pub fn is_http_url(input: &str) -> bool {
        input.starts_with("http://") || input.starts_with("https://")
    }
}

#[async_trait]
impl EntrySource for HttpSource {
    async fn next_entry(&mut self) -> Result<Option<Entry>> {
        let Some(url) = self.urls.pop_front() else {
            return Ok(None);
        };

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ArchiveError::read_failure(&url, e))?;

        if !resp.status().is_success() {
            return Err(ArchiveError::read_failure(
                &url,
                format!("HTTP request failed with status: {}", resp.status()),
            ));
        }

        let name = file_name_from_url(resp.url());
        let modified_at = resp
            .headers()
            .get(header::LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_http_date)
            .unwrap_or_else(Utc::now);

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ArchiveError::read_failure(&url, e))?;

        tracing::debug!(url = %url, name = %name, size = bytes.len(), "fetched");
        Entry::new(name, bytes.to_vec(), modified_at).map(Some)
    }

    fn remaining(&self) -> Option<usize> {
        Some(self.urls.len())
    }
}

fn file_name_from_url(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .unwrap_or(FALLBACK_NAME)
        .to_string()
}

/// Parse an IMF-fixdate such as `Wed, 21 Oct 2015 07:28:00 GMT`
fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
