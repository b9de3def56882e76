//! Apify scraper client.
//!
//! Runs the Instagram scraper actor synchronously and reads the dataset
//! items from the same response.

use crate::collab::{ScrapeRequest, Scraper};
use crate::error::IngestionError;
use crate::item::PostRecord;
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use std::time::Duration;

const APIFY_API_BASE: &str = "https://api.apify.com/v2";
// Actor runs routinely take over a minute.
const RUN_TIMEOUT: Duration = Duration::from_secs(300);

/// [`Scraper`] backed by an Apify actor.
pub struct ApifyScraper {
    client: HttpClient,
    token: Option<String>,
    actor_id: String,
    base_url: String,
}

impl ApifyScraper {
    /// Creates a client for `actor_id`. Without a token every scrape fails.
    #[must_use]
    pub fn new(token: Option<String>, actor_id: impl Into<String>) -> Self {
        let client = HttpClient::builder()
            .timeout(RUN_TIMEOUT)
            .build()
            .unwrap_or_else(|_| HttpClient::new());
        Self {
            client,
            token,
            actor_id: actor_id.into(),
            base_url: APIFY_API_BASE.to_string(),
        }
    }

    /// Points the client at another API root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Endpoint that runs the actor and returns its dataset items.
    #[must_use]
    pub fn run_url(&self) -> String {
        format!(
            "{}/acts/{}/run-sync-get-dataset-items",
            self.base_url.trim_end_matches('/'),
            self.actor_id
        )
    }
}

#[async_trait]
impl Scraper for ApifyScraper {
    async fn fetch_posts(&self, request: &ScrapeRequest) -> Result<Vec<PostRecord>, IngestionError> {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| IngestionError::Api("APIFY_TOKEN is not set".to_string()))?;

        let response = self
            .client
            .post(self.run_url())
            .query(&[("token", token)])
            .json(request)
            .send()
            .await
            .map_err(|e| IngestionError::Network(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body = crate::item::truncate_str(body, 500);
            return Err(IngestionError::Api(format!("{status} - {body}")));
        }

        response
            .json::<Vec<PostRecord>>()
            .await
            .map_err(|e| IngestionError::Json(e.without_url().to_string()))
    }
}
