//! NetNaija engine.
//!
//! Listing pages live under `/videos/movies` and `/videos/series`, paginated
//! as `/page/{n}`. Search is `/search?t={query}`. Each entry links to a
//! detail page holding the download link(s).

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};
use url::Url;

use crate::config::Config;
use crate::fetch::{FetchRequest, Page, PageFetcher};
use crate::metrics::record_engine_operation;
use crate::scrape::DetailCollector;

use super::{
    DownloadLinks, Engine, EngineError, Movie, MovieDetails, Props, ScrapeReport, SearchResult,
};

/// Catalog section of the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Movies,
    Series,
}

impl Category {
    fn path(&self) -> &'static str {
        match self {
            Category::Movies => "videos/movies",
            Category::Series => "videos/series",
        }
    }
}

/// Scrape mode understood by [`NetNaijaEngine::scrape`].
///
/// `movies`, `series` or `latest` (same as `movies`), optionally followed by
/// `:<page>`, e.g. `series:3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetNaijaMode {
    pub category: Category,
    pub page: u32,
}

impl FromStr for NetNaijaMode {
    type Err = EngineError;

    fn from_str(mode: &str) -> Result<Self, Self::Err> {
        let unsupported = || EngineError::UnsupportedMode {
            engine: NetNaijaEngine::NAME.to_string(),
            mode: mode.to_string(),
        };

        let (kind, page) = match mode.trim().split_once(':') {
            Some((kind, page)) => (kind, page.trim().parse().map_err(|_| unsupported())?),
            None => (mode.trim(), 1),
        };

        let category = match kind.trim().to_ascii_lowercase().as_str() {
            "movies" | "latest" => Category::Movies,
            "series" => Category::Series,
            _ => return Err(unsupported()),
        };

        if page == 0 {
            return Err(EngineError::InvalidPage(page));
        }

        Ok(Self { category, page })
    }
}

impl fmt::Display for NetNaijaMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.category {
            Category::Movies => "movies",
            Category::Series => "series",
        };
        write!(f, "{}:{}", kind, self.page)
    }
}

/// CSS selectors for one kind of entry list.
struct EntrySelectors {
    item: &'static str,
    title: &'static str,
    cover: &'static str,
}

const LISTING_ENTRIES: EntrySelectors = EntrySelectors {
    item: "article.file-one",
    title: "h2 a",
    cover: "img",
};

const SEARCH_ENTRIES: EntrySelectors = EntrySelectors {
    item: "article.sr-one",
    title: "h3.result-title a",
    cover: "img",
};

const DETAIL_TITLE: &str = "h1.page-title";
const DETAIL_DESCRIPTION: &str = "div.video-description p";
const DETAIL_SIZE: &str = ".file-size";
const DETAIL_UPLOAD_DATE: &str = "time";
const DETAIL_LINKS: &str = "a.download-link";

/// Engine for thenetnaija.net.
pub struct NetNaijaEngine {
    props: Props,
    fetcher: Arc<dyn PageFetcher>,
    collector: DetailCollector,
}

impl NetNaijaEngine {
    pub const NAME: &'static str = "NetNaija";
    pub const DEFAULT_BASE_URL: &'static str = "https://www.thenetnaija.net";

    /// Create an engine against the public site.
    pub fn new(fetcher: Arc<dyn PageFetcher>, max_concurrent: usize) -> Result<Self, EngineError> {
        Self::with_base_url(Self::DEFAULT_BASE_URL, fetcher, max_concurrent)
    }

    /// Create an engine against a mirror or fixture server.
    pub fn with_base_url(
        base_url: &str,
        fetcher: Arc<dyn PageFetcher>,
        max_concurrent: usize,
    ) -> Result<Self, EngineError> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| EngineError::Config(format!("Invalid base URL {}: {}", base_url, e)))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let search_url = join(&base_url, "search")?;
        let list_url = join(&base_url, Category::Movies.path())?;

        let props = Props {
            name: Self::NAME.to_string(),
            base_url,
            search_url,
            list_url,
            description: "Nigerian movie and series download site".to_string(),
        };

        Ok(Self {
            props,
            collector: DetailCollector::new(Arc::clone(&fetcher), max_concurrent),
            fetcher,
        })
    }

    /// Create an engine from configuration.
    pub fn from_config(config: &Config, fetcher: Arc<dyn PageFetcher>) -> Result<Self, EngineError> {
        let base_url = config
            .engines
            .netnaija
            .base_url
            .as_deref()
            .unwrap_or(Self::DEFAULT_BASE_URL);
        Self::with_base_url(base_url, fetcher, config.scrape.max_concurrent_fetches)
    }

    fn category_url(&self, category: Category, page: u32) -> Result<Url, EngineError> {
        if page <= 1 {
            join(&self.props.base_url, category.path())
        } else {
            join(
                &self.props.base_url,
                &format!("{}/page/{}", category.path(), page),
            )
        }
    }

    fn search_url_for(&self, query: &str) -> Result<Url, EngineError> {
        let raw = format!("{}?t={}", self.props.search_url, urlencoding::encode(query));
        Url::parse(&raw).map_err(|e| EngineError::Parse(format!("Invalid search URL {}: {}", raw, e)))
    }

    /// Fetch one listing page. A missing page is an empty listing.
    async fn fetch_listing(&self, category: Category, page: u32) -> Result<SearchResult, EngineError> {
        if page == 0 {
            return Err(EngineError::InvalidPage(page));
        }

        let url = self.category_url(category, page)?;
        debug!(engine = Self::NAME, url = %url, page, "Fetching listing");

        let page_content = match self.fetcher.fetch(FetchRequest::new(url)).await {
            Ok(p) => p,
            Err(e) if e.is_not_found() => {
                debug!(engine = Self::NAME, page, "Listing page past the end");
                return Ok(SearchResult::listing(vec![]));
            }
            Err(e) => return Err(e.into()),
        };

        let movies = parse_entries(&page_content, &LISTING_ENTRIES)?;
        Ok(SearchResult::listing(movies))
    }

    async fn run_search(&self, query: &str) -> Result<SearchResult, EngineError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(SearchResult::search(query, vec![]));
        }

        let url = self.search_url_for(query)?;
        debug!(engine = Self::NAME, url = %url, "Searching");

        let page = self.fetcher.fetch(FetchRequest::new(url)).await?;
        let movies = parse_entries(&page, &SEARCH_ENTRIES)?;

        debug!(engine = Self::NAME, query, results = movies.len(), "Search complete");
        Ok(SearchResult::search(query, movies))
    }

    async fn run_scrape(&self, mode: &str) -> Result<ScrapeReport, EngineError> {
        let mode: NetNaijaMode = mode.parse()?;
        let listing = self.fetch_listing(mode.category, mode.page).await?;
        info!(
            engine = Self::NAME,
            mode = %mode,
            entries = listing.len(),
            "Scraping listing"
        );
        self.collect(listing.movies).await
    }

    async fn collect(&self, movies: Vec<Movie>) -> Result<ScrapeReport, EngineError> {
        self.collector
            .collect(movies, parse_details)
            .await
            .into_result()
    }
}

#[async_trait]
impl Engine for NetNaijaEngine {
    fn props(&self) -> &Props {
        &self.props
    }

    /// An empty query returns an empty result without a request.
    async fn search(&self, query: &str) -> Result<SearchResult, EngineError> {
        let result = self.run_search(query).await;
        record_engine_operation(Self::NAME, "search", &result);
        result
    }

    /// Pages past the last one (HTTP 404 or no entries) are empty results.
    /// Page 0 is `InvalidPage`.
    async fn list(&self, page: u32) -> Result<SearchResult, EngineError> {
        let result = self.fetch_listing(Category::Movies, page).await;
        record_engine_operation(Self::NAME, "list", &result);
        result
    }

    async fn scrape(&self, mode: &str) -> Result<ScrapeReport, EngineError> {
        let result = self.run_scrape(mode).await;
        record_engine_operation(Self::NAME, "scrape", &result);
        result
    }

    async fn scrape_movies(&self, movies: Vec<Movie>) -> Result<ScrapeReport, EngineError> {
        let result = self.collect(movies).await;
        record_engine_operation(Self::NAME, "scrape_movies", &result);
        result
    }
}

fn join(base: &Url, path: &str) -> Result<Url, EngineError> {
    base.join(path)
        .map_err(|e| EngineError::Config(format!("Cannot join {} onto {}: {}", path, base, e)))
}

fn selector(css: &str) -> Result<Selector, EngineError> {
    Selector::parse(css).map_err(|e| EngineError::Parse(format!("Bad selector {}: {}", css, e)))
}

fn text_of(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn first_text(doc: &Html, css: &str) -> Result<Option<String>, EngineError> {
    let sel = selector(css)?;
    Ok(doc
        .select(&sel)
        .map(text_of)
        .find(|t| !t.is_empty()))
}

/// Split `"Name (2019)"` into name and year.
fn split_title(raw: &str) -> (String, Option<u32>) {
    let raw = raw.trim();
    let caps = regex_lite::Regex::new(r"^(.*?)\s*\((\d{4})\)\s*$")
        .ok()
        .and_then(|re| re.captures(raw));

    match caps {
        Some(caps) => {
            let title = caps.get(1).map(|m| m.as_str().trim()).unwrap_or(raw);
            let year = caps.get(2).and_then(|m| m.as_str().parse().ok());
            (title.to_string(), year)
        }
        None => (raw.to_string(), None),
    }
}

fn is_series_link(url: &Url) -> bool {
    url.path().contains("/videos/series/")
}

/// Parse the entries of a listing or search page into stubs.
///
/// Entries without a title are skipped; indices are assigned in page order
/// over the kept entries.
fn parse_entries(page: &Page, selectors: &EntrySelectors) -> Result<Vec<Movie>, EngineError> {
    let item_sel = selector(selectors.item)?;
    let title_sel = selector(selectors.title)?;
    let cover_sel = selector(selectors.cover)?;

    let doc = page.document();
    let mut movies = Vec::new();

    for item in doc.select(&item_sel) {
        let Some(anchor) = item.select(&title_sel).next() else {
            continue;
        };
        let raw_title = text_of(anchor);
        if raw_title.is_empty() {
            continue;
        }
        let (title, year) = split_title(&raw_title);

        let cover = item
            .select(&cover_sel)
            .next()
            .and_then(|img| img.value().attr("src").or_else(|| img.value().attr("data-src")))
            .and_then(|src| page.url.join(src).ok())
            .map(|u| u.to_string())
            .unwrap_or_default();

        let detail_link = anchor
            .value()
            .attr("href")
            .and_then(|href| page.url.join(href).ok());

        let mut movie = Movie::stub(movies.len(), title, cover);
        movie.year = year;
        if let Some(link) = detail_link {
            movie.is_series = is_series_link(&link);
            movie = movie.with_detail_link(link);
        }
        movies.push(movie);
    }

    Ok(movies)
}

/// Resolve a download anchor. Placeholder anchors (`#`, `javascript:`)
/// and links back to the detail page itself are not downloads.
fn download_link(page: &Page, href: &str) -> Option<Url> {
    let link = page.url.join(href.trim()).ok()?;
    if !matches!(link.scheme(), "http" | "https") {
        return None;
    }

    let mut bare = link.clone();
    bare.set_fragment(None);
    let mut current = page.url.clone();
    current.set_fragment(None);
    if bare == current {
        return None;
    }
    Some(link)
}

/// Parse a detail page.
///
/// Series pages yield every download link in page order, movie pages the
/// first one.
fn parse_details(page: &Page) -> Result<MovieDetails, EngineError> {
    let doc = page.document();

    let link_sel = selector(DETAIL_LINKS)?;
    let mut links: Vec<Url> = Vec::new();
    for anchor in doc.select(&link_sel) {
        if let Some(link) = anchor
            .value()
            .attr("href")
            .and_then(|href| download_link(page, href))
        {
            if !links.contains(&link) {
                links.push(link);
            }
        }
    }

    let links = if is_series_link(&page.url) {
        DownloadLinks::Series(links)
    } else {
        match links.into_iter().next() {
            Some(link) => DownloadLinks::Single(link),
            None => {
                return Err(EngineError::Parse(format!(
                    "No download link on {}",
                    page.url
                )))
            }
        }
    };

    let year = first_text(&doc, DETAIL_TITLE)?.and_then(|t| split_title(&t).1);

    let time_sel = selector(DETAIL_UPLOAD_DATE)?;
    let upload_date = doc.select(&time_sel).next().map(|t| {
        t.value()
            .attr("datetime")
            .map(|d| d.trim().to_string())
            .unwrap_or_else(|| text_of(t))
    });

    Ok(MovieDetails {
        description: first_text(&doc, DETAIL_DESCRIPTION)?,
        size: first_text(&doc, DETAIL_SIZE)?,
        year,
        upload_date,
        links,
    })
}
