//! Mock page fetcher for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use url::Url;

use crate::fetch::{FetchError, FetchRequest, Page, PageFetcher, RequestContext};

/// A canned response for one URL.
#[derive(Debug, Clone)]
struct MockRoute {
    response: Result<String, FetchError>,
    delay: Option<Duration>,
    context: Option<RequestContext>,
}

/// Mock implementation of the PageFetcher trait.
///
/// Provides controllable behavior for testing:
/// - Serve canned pages by exact URL (unknown URLs answer HTTP 404)
/// - Delay individual pages to force out-of-order completion
/// - Fail individual pages with a chosen error
/// - Hand a page back with a different request context
/// - Record requests and the order in which they completed
///
/// # Example
///
/// ```rust,ignore
/// use cinescrape_core::testing::MockFetcher;
///
/// let fetcher = MockFetcher::new();
/// fetcher.add_page("https://site.example/videos/movies", "<html>...</html>").await;
/// fetcher.add_delayed_page("https://site.example/a", "<html>...</html>", Duration::from_millis(50)).await;
///
/// // Hand Arc::new(fetcher) to an engine, then:
/// let completed = fetcher.completion_order().await;
/// ```
#[derive(Default)]
pub struct MockFetcher {
    routes: Arc<RwLock<HashMap<String, MockRoute>>>,
    requests: Arc<RwLock<Vec<FetchRequest>>>,
    completions: Arc<RwLock<Vec<Url>>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl std::fmt::Debug for MockFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockFetcher")
            .field("routes", &"<routes>")
            .field("requests", &"<requests>")
            .field("completions", &"<completions>")
            .field("max_in_flight", &self.max_in_flight())
            .finish()
    }
}

impl MockFetcher {
    /// Create a new mock fetcher with no routes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `url`.
    pub async fn add_page(&self, url: &str, body: &str) {
        self.insert(url, Ok(body.to_string()), None).await;
    }

    /// Serve `body` for `url` after `delay`.
    pub async fn add_delayed_page(&self, url: &str, body: &str, delay: Duration) {
        self.insert(url, Ok(body.to_string()), Some(delay)).await;
    }

    /// Fail requests for `url` with `error`.
    pub async fn add_failure(&self, url: &str, error: FetchError) {
        self.insert(url, Err(error), None).await;
    }

    /// Fail requests for `url` with `error` after `delay`.
    pub async fn add_delayed_failure(&self, url: &str, error: FetchError, delay: Duration) {
        self.insert(url, Err(error), Some(delay)).await;
    }

    /// Answer requests for `url` with `ctx` instead of the request's context.
    pub async fn override_context(&self, url: &str, ctx: RequestContext) {
        let mut routes = self.routes.write().await;
        if let Some(route) = routes.get_mut(url) {
            route.context = Some(ctx);
        }
    }

    /// Requests received, in dispatch order.
    pub async fn recorded_requests(&self) -> Vec<FetchRequest> {
        self.requests.read().await.clone()
    }

    /// Number of requests received.
    pub async fn request_count(&self) -> usize {
        self.requests.read().await.len()
    }

    /// URLs in the order their responses were produced (successes and failures).
    pub async fn completion_order(&self) -> Vec<Url> {
        self.completions.read().await.clone()
    }

    /// Highest number of requests observed in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn insert(&self, url: &str, response: Result<String, FetchError>, delay: Option<Duration>) {
        self.routes.write().await.insert(
            url.to_string(),
            MockRoute {
                response,
                delay,
                context: None,
            },
        );
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch(&self, request: FetchRequest) -> Result<Page, FetchError> {
        self.requests.write().await.push(request.clone());

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let route = self.routes.read().await.get(request.url.as_str()).cloned();

        if let Some(delay) = route.as_ref().and_then(|r| r.delay) {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.completions.write().await.push(request.url.clone());

        let Some(route) = route else {
            return Err(FetchError::Status {
                url: request.url.to_string(),
                status: 404,
            });
        };

        let body = route.response?;
        Ok(Page {
            url: request.url,
            status: 200,
            body,
            ctx: route.context.unwrap_or(request.ctx),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_serves_registered_page() {
        let fetcher = MockFetcher::new();
        fetcher.add_page("https://example.com/a", "hello").await;

        let request = FetchRequest::with_context(
            Url::parse("https://example.com/a").unwrap(),
            RequestContext::with_movie_index(4),
        );
        let page = fetcher.fetch(request).await.unwrap();

        assert_eq!(page.body, "hello");
        assert_eq!(page.ctx.movie_index(), Ok(4));
        assert_eq!(fetcher.request_count().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_url_is_not_found() {
        let fetcher = MockFetcher::new();
        let request = FetchRequest::new(Url::parse("https://example.com/missing").unwrap());
        let err = fetcher.fetch(request).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_failure_route() {
        let fetcher = MockFetcher::new();
        fetcher
            .add_failure(
                "https://example.com/down",
                FetchError::Timeout {
                    url: "https://example.com/down".to_string(),
                },
            )
            .await;

        let request = FetchRequest::new(Url::parse("https://example.com/down").unwrap());
        let err = fetcher.fetch(request).await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout { .. }));
        assert_eq!(fetcher.completion_order().await.len(), 1);
    }
}
