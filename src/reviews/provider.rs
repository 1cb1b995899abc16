use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, COOKIE};
use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::config::ReviewsConfig;

/// Network seam for third-party review data: given a location identifier,
/// returns raw review records or fails with a network error.
#[async_trait]
pub trait ReviewProvider: Send + Sync {
    async fn fetch(&self, location: &str) -> anyhow::Result<Vec<Value>>;
}

/// Production provider backed by the Google reviews proxy API.
pub struct GoogleReviewsClient {
    http: reqwest::Client,
    api_url: String,
}

impl GoogleReviewsClient {
    pub fn new(config: &ReviewsConfig) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if !config.api_cookie.is_empty() {
            headers.insert(
                COOKIE,
                HeaderValue::from_str(&config.api_cookie).context("invalid REVIEWS_API_COOKIE")?,
            );
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .context("build reviews http client")?;

        Ok(Self {
            http,
            api_url: config.api_url.clone(),
        })
    }
}

#[async_trait]
impl ReviewProvider for GoogleReviewsClient {
    #[instrument(skip(self))]
    async fn fetch(&self, location: &str) -> anyhow::Result<Vec<Value>> {
        let response = self
            .http
            .post(format!("{}/google/getReviews", self.api_url))
            .json(&json!({ "selectedLocation": location }))
            .send()
            .await
            .context("reviews provider request failed")?
            .error_for_status()
            .context("reviews provider returned an error status")?;

        let body: Value = response
            .json()
            .await
            .context("reviews provider returned invalid JSON")?;

        let reviews = body
            .get("reviews")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        debug!(count = reviews.len(), "fetched raw reviews");
        Ok(reviews)
    }
}
