//! Page fetching abstraction.
//!
//! Engines never talk to the network directly: they hand a [`FetchRequest`]
//! to a [`PageFetcher`] and get the [`Page`] back together with the
//! [`RequestContext`] they attached.

mod context;
mod http;

pub use context::{CorrelationError, RequestContext, MOVIE_INDEX_KEY};
pub use http::HttpFetcher;

use async_trait::async_trait;
use scraper::Html;
use thiserror::Error;
use url::Url;

/// Errors raised while fetching a page.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Connection to {url} failed: {message}")]
    Connection { url: String, message: String },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to read body of {url}: {message}")]
    Body { url: String, message: String },

    #[error("HTTP client error: {0}")]
    Client(String),
}

impl FetchError {
    /// HTTP status carried by the error, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// An outbound page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: Url,
    pub ctx: RequestContext,
}

impl FetchRequest {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            ctx: RequestContext::new(),
        }
    }

    pub fn with_context(url: Url, ctx: RequestContext) -> Self {
        Self { url, ctx }
    }
}

/// A fetched page.
#[derive(Debug, Clone)]
pub struct Page {
    /// Final URL after redirects.
    pub url: Url,
    pub status: u16,
    pub body: String,
    /// Context of the request that produced this page.
    pub ctx: RequestContext,
}

impl Page {
    pub fn document(&self) -> Html {
        Html::parse_document(&self.body)
    }
}

/// Transport used by engines to retrieve pages.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch one page. Non-success statuses are errors.
    async fn fetch(&self, request: FetchRequest) -> Result<Page, FetchError>;
}
