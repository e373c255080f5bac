//! Site-agnostic data model shared by every engine.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use url::Url;

use super::EngineError;

/// Static description of an engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Props {
    /// Short registry name (e.g. "NetNaija").
    pub name: String,
    /// Site root.
    pub base_url: Url,
    /// Page that answers search queries.
    pub search_url: Url,
    /// First page of the default catalog listing.
    pub list_url: Url,
    /// Human readable description.
    pub description: String,
}

/// One catalogued entry.
///
/// Created as a stub by `search`/`list` (index, title, cover and detail link)
/// and filled in place by a detail scrape.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    /// Position within the originating result set. Never renumbered.
    pub index: usize,
    pub title: String,
    pub cover_photo_link: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub size: String,
    /// Resolved link for a non-series entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_link: Option<Url>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    #[serde(default)]
    pub is_series: bool,
    /// One link per episode/part, series only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub series_download_links: Vec<Url>,
    #[serde(default)]
    pub upload_date: String,
    /// Page the detail scrape is fetched from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail_link: Option<Url>,
}

/// Download links resolved by a detail scrape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadLinks {
    Single(Url),
    Series(Vec<Url>),
}

/// Fields a detail page contributes to a [`Movie`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieDetails {
    pub description: Option<String>,
    pub size: Option<String>,
    pub year: Option<u32>,
    pub upload_date: Option<String>,
    pub links: DownloadLinks,
}

impl MovieDetails {
    /// Details carrying only download links.
    pub fn with_links(links: DownloadLinks) -> Self {
        Self {
            description: None,
            size: None,
            year: None,
            upload_date: None,
            links,
        }
    }
}

/// Which download-link fields are populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Neither link field is set.
    Missing,
    /// Non-series entry with its single link.
    Single,
    /// Series entry with at least one part link.
    Series,
    /// Both fields set, or the series flag disagrees with the populated field.
    Conflicting,
}

impl Movie {
    /// Create a listing-level stub.
    pub fn stub(index: usize, title: impl Into<String>, cover_photo_link: impl Into<String>) -> Self {
        Self {
            index,
            title: title.into(),
            cover_photo_link: cover_photo_link.into(),
            ..Default::default()
        }
    }

    /// Set the detail page locator.
    pub fn with_detail_link(mut self, link: Url) -> Self {
        self.detail_link = Some(link);
        self
    }

    /// Write the result of a detail scrape into this entry.
    ///
    /// The link fields stay mutually exclusive: a series clears
    /// `download_link`, a single link clears `series_download_links`.
    pub fn apply_details(&mut self, details: MovieDetails) {
        if let Some(description) = details.description {
            self.description = description;
        }
        if let Some(size) = details.size {
            self.size = size;
        }
        if details.year.is_some() {
            self.year = details.year;
        }
        if let Some(upload_date) = details.upload_date {
            self.upload_date = upload_date;
        }

        match details.links {
            DownloadLinks::Single(link) => {
                self.is_series = false;
                self.download_link = Some(link);
                self.series_download_links.clear();
            }
            DownloadLinks::Series(links) => {
                self.is_series = true;
                self.download_link = None;
                self.series_download_links = links;
            }
        }
    }

    pub fn link_state(&self) -> LinkState {
        match (
            self.is_series,
            self.download_link.is_some(),
            self.series_download_links.is_empty(),
        ) {
            (false, false, true) | (true, false, true) => LinkState::Missing,
            (false, true, true) => LinkState::Single,
            (true, false, false) => LinkState::Series,
            _ => LinkState::Conflicting,
        }
    }

    /// Whether a detail scrape resolved this entry's links.
    pub fn is_scraped(&self) -> bool {
        matches!(self.link_state(), LinkState::Single | LinkState::Series)
    }

    /// Best-effort parse of `upload_date`.
    pub fn uploaded_on(&self) -> Option<NaiveDate> {
        let raw = self.upload_date.trim();
        ["%Y-%m-%d", "%d/%m/%Y", "%b %d, %Y", "%B %d, %Y"]
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
    }
}

impl fmt::Display for Movie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.year {
            Some(year) => write!(f, "{} ({})", self.title, year),
            None => write!(f, "{}", self.title),
        }
    }
}

/// Ordered movies plus the query that produced them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// Search query, empty for listings.
    pub query: String,
    pub movies: Vec<Movie>,
}

impl SearchResult {
    pub fn search(query: impl Into<String>, movies: Vec<Movie>) -> Self {
        Self {
            query: query.into(),
            movies,
        }
    }

    pub fn listing(movies: Vec<Movie>) -> Self {
        Self {
            query: String::new(),
            movies,
        }
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    /// Titles in result order.
    pub fn titles(&self) -> Vec<&str> {
        self.movies.iter().map(|m| m.title.as_str()).collect()
    }

    /// First movie whose title equals `title` exactly.
    pub fn get_movie_by_title(&self, title: &str) -> Result<Movie, EngineError> {
        self.movies
            .iter()
            .find(|m| m.title == title)
            .cloned()
            .ok_or_else(|| EngineError::MovieNotFound(title.to_string()))
    }

    /// First movie matching both title and year.
    pub fn get_movie_by_title_and_year(&self, title: &str, year: u32) -> Result<Movie, EngineError> {
        self.movies
            .iter()
            .find(|m| m.title == title && m.year == Some(year))
            .cloned()
            .ok_or_else(|| EngineError::MovieNotFound(format!("{} ({})", title, year)))
    }

    /// Movie carrying the given correlation index.
    pub fn get_movie_by_index(&self, index: usize) -> Result<Movie, EngineError> {
        self.movies
            .iter()
            .find(|m| m.index == index)
            .cloned()
            .ok_or_else(|| EngineError::MovieNotFound(format!("index {}", index)))
    }

    /// Drop movies in place. Indices of the survivors are left untouched.
    pub fn retain<F>(&mut self, predicate: F)
    where
        F: FnMut(&Movie) -> bool,
    {
        self.movies.retain(predicate);
    }
}

/// Outcome of a detail scrape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScrapeReport {
    /// Scraped movies in slot order. Failed slots are absent.
    pub movies: Vec<Movie>,
    /// Failure reason keyed by movie index.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub failures: BTreeMap<usize, String>,
}

impl ScrapeReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed_indices(&self) -> Vec<usize> {
        self.failures.keys().copied().collect()
    }

    /// Scraped movie with the given index, if that slot succeeded.
    pub fn get(&self, index: usize) -> Option<&Movie> {
        self.movies.iter().find(|m| m.index == index)
    }

    /// Fail with `AllDetailsFailed` when nothing was scraped but something
    /// failed. Partial results pass through.
    pub fn into_result(self) -> Result<Self, EngineError> {
        if self.movies.is_empty() && !self.failures.is_empty() {
            return Err(EngineError::AllDetailsFailed(self.failures));
        }
        Ok(self)
    }
}
