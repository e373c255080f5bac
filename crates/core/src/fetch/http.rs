//! reqwest-backed page fetcher.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::config::HttpConfig;
use crate::metrics::{PAGE_FETCHES, PAGE_FETCH_DURATION};

use super::{FetchError, FetchRequest, Page, PageFetcher};

/// Fetches pages over HTTP.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a new HttpFetcher with the given configuration.
    pub fn new(config: &HttpConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { client })
    }

    async fn fetch_inner(&self, request: FetchRequest) -> Result<Page, FetchError> {
        let url = request.url.to_string();

        let response = self
            .client
            .get(request.url.clone())
            .send()
            .await
            .map_err(|e| classify_error(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let body = response.text().await.map_err(|e| FetchError::Body {
            url: url.clone(),
            message: e.to_string(),
        })?;

        Ok(Page {
            url: final_url,
            status: status.as_u16(),
            body,
            ctx: request.ctx,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, request: FetchRequest) -> Result<Page, FetchError> {
        let start = Instant::now();
        debug!(url = %request.url, "Fetching page");

        let result = self.fetch_inner(request).await;

        let outcome = match &result {
            Ok(_) => "ok",
            Err(FetchError::Timeout { .. }) => "timeout",
            Err(FetchError::Connection { .. }) => "connection",
            Err(FetchError::Status { .. }) => "status",
            Err(FetchError::Body { .. }) => "body",
            Err(FetchError::Client(_)) => "client",
        };
        PAGE_FETCHES.with_label_values(&[outcome]).inc();
        PAGE_FETCH_DURATION
            .with_label_values(&[outcome])
            .observe(start.elapsed().as_secs_f64());

        result
    }
}

fn classify_error(url: &str, e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if e.is_connect() {
        FetchError::Connection {
            url: url.to_string(),
            message: e.to_string(),
        }
    } else {
        FetchError::Client(e.to_string())
    }
}
