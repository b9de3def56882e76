//! HTTP media fetcher.
//!
//! Content hosts block obvious bots, so requests carry a browser-like
//! header set.

use crate::collab::MediaFetcher;
use crate::error::MediaFetchError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, REFERER, USER_AGENT};
use reqwest::Client as HttpClient;
use std::time::Duration;
use tracing::error;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const IMAGE_ACCEPT: &str = "image/avif,image/webp,image/apng,image/svg+xml,image/*,*/*;q=0.8";
const CONTENT_REFERER: &str = "https://www.instagram.com/";

/// Headers sent with every media request.
#[must_use]
pub fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(ACCEPT, HeaderValue::from_static(IMAGE_ACCEPT));
    headers.insert(REFERER, HeaderValue::from_static(CONTENT_REFERER));
    headers.insert("Sec-Fetch-Dest", HeaderValue::from_static("image"));
    headers.insert("Sec-Fetch-Mode", HeaderValue::from_static("no-cors"));
    headers.insert("Sec-Fetch-Site", HeaderValue::from_static("cross-site"));
    headers
}

/// [`MediaFetcher`] over reqwest with a fixed timeout.
pub struct HttpMediaFetcher {
    client: HttpClient,
    timeout: Duration,
}

impl HttpMediaFetcher {
    /// Creates a fetcher whose requests give up after `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let client = HttpClient::builder()
            .timeout(timeout)
            .default_headers(browser_headers())
            .build()
            .unwrap_or_else(|_| HttpClient::new());
        Self { client, timeout }
    }
}

#[async_trait]
impl MediaFetcher for HttpMediaFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, MediaFetchError> {
        let result = async {
            let response = self
                .client
                .get(url)
                .timeout(self.timeout)
                .send()
                .await
                .map_err(|e| self.classify(&e))?;

            let status = response.status();
            if !status.is_success() {
                return Err(MediaFetchError::Status(status.as_u16()));
            }

            let bytes = response.bytes().await.map_err(|e| self.classify(&e))?;
            Ok(bytes.to_vec())
        }
        .await;

        if let Err(e) = &result {
            error!("[Download Failed] URL: {url}: {e}");
        }
        result
    }
}

impl HttpMediaFetcher {
    fn classify(&self, e: &reqwest::Error) -> MediaFetchError {
        if e.is_timeout() {
            MediaFetchError::Timeout(self.timeout.as_secs())
        } else {
            MediaFetchError::Network(e.to_string())
        }
    }
}
