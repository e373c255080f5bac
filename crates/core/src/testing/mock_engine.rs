//! Mock engine for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use url::Url;

use crate::engine::{Engine, EngineError, Movie, Props, ScrapeReport, SearchResult};

/// Mock implementation of the Engine trait.
///
/// Search results are served by query, listing pages by page number and
/// scrape reports by mode. Anything not configured behaves like an empty
/// site: empty results, and `UnsupportedMode` for unknown modes.
pub struct MockEngine {
    props: Props,
    searches: Arc<RwLock<HashMap<String, Vec<Movie>>>>,
    pages: Arc<RwLock<HashMap<u32, Vec<Movie>>>>,
    scrapes: Arc<RwLock<HashMap<String, ScrapeReport>>>,
    next_error: Arc<RwLock<Option<EngineError>>>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl std::fmt::Debug for MockEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockEngine")
            .field("name", &self.props.name)
            .finish()
    }
}

impl MockEngine {
    /// Create a mock engine registered under `name`.
    pub fn new(name: &str) -> Self {
        let base_url = Url::parse("https://mock.example.com/").expect("valid mock URL");
        let props = Props {
            name: name.to_string(),
            search_url: base_url.join("search").expect("valid mock URL"),
            list_url: base_url.join("list").expect("valid mock URL"),
            base_url,
            description: format!("Mock engine {}", name),
        };

        Self {
            props,
            searches: Arc::new(RwLock::new(HashMap::new())),
            pages: Arc::new(RwLock::new(HashMap::new())),
            scrapes: Arc::new(RwLock::new(HashMap::new())),
            next_error: Arc::new(RwLock::new(None)),
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Serve `movies` for `query`.
    pub async fn set_search_results(&self, query: &str, movies: Vec<Movie>) {
        self.searches.write().await.insert(query.to_string(), movies);
    }

    /// Serve `movies` as listing page `page`.
    pub async fn set_page(&self, page: u32, movies: Vec<Movie>) {
        self.pages.write().await.insert(page, movies);
    }

    /// Serve `report` for scrape mode `mode`.
    pub async fn set_scrape_report(&self, mode: &str, report: ScrapeReport) {
        self.scrapes.write().await.insert(mode.to_string(), report);
    }

    /// Configure the next call to fail with the given error.
    pub async fn set_next_error(&self, error: EngineError) {
        *self.next_error.write().await = Some(error);
    }

    /// Calls received, as "operation:argument".
    pub async fn recorded_calls(&self) -> Vec<String> {
        self.calls.read().await.clone()
    }

    async fn record(&self, call: String) -> Result<(), EngineError> {
        self.calls.write().await.push(call);
        match self.next_error.write().await.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Engine for MockEngine {
    fn props(&self) -> &Props {
        &self.props
    }

    async fn search(&self, query: &str) -> Result<SearchResult, EngineError> {
        self.record(format!("search:{}", query)).await?;
        let movies = self.searches.read().await.get(query).cloned().unwrap_or_default();
        Ok(SearchResult::search(query, movies))
    }

    async fn list(&self, page: u32) -> Result<SearchResult, EngineError> {
        self.record(format!("list:{}", page)).await?;
        if page == 0 {
            return Err(EngineError::InvalidPage(page));
        }
        let movies = self.pages.read().await.get(&page).cloned().unwrap_or_default();
        Ok(SearchResult::listing(movies))
    }

    async fn scrape(&self, mode: &str) -> Result<ScrapeReport, EngineError> {
        self.record(format!("scrape:{}", mode)).await?;
        self.scrapes
            .read()
            .await
            .get(mode)
            .cloned()
            .ok_or_else(|| EngineError::UnsupportedMode {
                engine: self.props.name.clone(),
                mode: mode.to_string(),
            })
    }

    async fn scrape_movies(&self, movies: Vec<Movie>) -> Result<ScrapeReport, EngineError> {
        self.record(format!("scrape_movies:{}", movies.len())).await?;
        Ok(ScrapeReport {
            movies,
            failures: Default::default(),
        })
    }
}
