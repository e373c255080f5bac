//! Scraping engine abstraction.
//!
//! Every supported site is an [`Engine`]: it searches, lists and
//! detail-scrapes its catalog and hands back site-agnostic [`Movie`] and
//! [`SearchResult`] values. Engines are discovered by name through the
//! [`EngineRegistry`].

mod netnaija;
mod registry;
mod types;

pub use netnaija::{Category, NetNaijaEngine, NetNaijaMode};
pub use registry::{get_engine, get_engines, init_engines, EngineRegistry};
pub use types::*;

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use crate::fetch::{CorrelationError, FetchError};

/// Errors that can occur during engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Failed to parse page: {0}")]
    Parse(String),

    #[error("Movie not found: {0}")]
    MovieNotFound(String),

    #[error("Engine not registered: {0}")]
    UnknownEngine(String),

    #[error("Engine already registered: {0}")]
    DuplicateEngine(String),

    #[error("Engine {engine} does not support scrape mode {mode:?}")]
    UnsupportedMode { engine: String, mode: String },

    #[error("Invalid page number: {0} (pages start at 1)")]
    InvalidPage(u32),

    #[error("Lost track of detail request: {0}")]
    Correlation(#[from] CorrelationError),

    #[error("Detail scrape of movie {index} resolved no usable download link")]
    IncompleteScrape { index: usize },

    #[error("Movie {index} has no detail page link")]
    MissingDetailLink { index: usize },

    #[error("Movie index {index} appears more than once in one scrape")]
    DuplicateIndex { index: usize },

    #[error("All {} detail fetches failed", .0.len())]
    AllDetailsFailed(BTreeMap<usize, String>),

    #[error("Engine configuration error: {0}")]
    Config(String),
}

/// Trait implemented by every site adapter.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Static description of the engine.
    fn props(&self) -> &Props;

    /// Registry name, used for logging and display.
    fn name(&self) -> &str {
        &self.props().name
    }

    /// Search the site. Zero hits is an empty result, not an error.
    async fn search(&self, query: &str) -> Result<SearchResult, EngineError>;

    /// One page (1-indexed) of the engine's default catalog.
    async fn list(&self, page: u32) -> Result<SearchResult, EngineError>;

    /// List according to an engine-specific `mode` and resolve download
    /// links for every listed entry.
    async fn scrape(&self, mode: &str) -> Result<ScrapeReport, EngineError>;

    /// Resolve download links for caller-selected stubs.
    async fn scrape_movies(&self, movies: Vec<Movie>) -> Result<ScrapeReport, EngineError>;
}

impl fmt::Display for dyn Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Debug for dyn Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("name", &self.name())
            .field("base_url", &self.props().base_url.as_str())
            .finish()
    }
}
