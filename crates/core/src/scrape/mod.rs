//! Concurrent detail scraping.
//!
//! A detail scrape fetches one page per stub. The fetches run concurrently
//! and complete in any order, so every request is tagged with the index of
//! the movie that triggered it and every completion is written back into
//! that movie's slot, never into a neighbour's.

use std::collections::{BTreeMap, HashMap};
use std::pin::pin;
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};
use url::Url;

use crate::engine::{EngineError, Movie, MovieDetails, ScrapeReport};
use crate::fetch::{FetchRequest, Page, PageFetcher, RequestContext};
use crate::metrics::{DETAIL_SLOTS, SCRAPE_DURATION};

/// One detail fetch, bound to the slot it fills.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailJob {
    /// Index of the movie whose slot receives the result.
    pub index: usize,
    /// Detail page to fetch.
    pub url: Url,
}

impl DetailJob {
    /// Outbound request, with the movie index stored in its context.
    pub fn request(&self) -> FetchRequest {
        FetchRequest::with_context(self.url.clone(), RequestContext::with_movie_index(self.index))
    }
}

/// Fans detail fetches out over a [`PageFetcher`] and gathers the results by
/// movie index.
#[derive(Clone)]
pub struct DetailCollector {
    fetcher: Arc<dyn PageFetcher>,
    max_concurrent: usize,
}

impl DetailCollector {
    pub fn new(fetcher: Arc<dyn PageFetcher>, max_concurrent: usize) -> Self {
        Self {
            fetcher,
            max_concurrent: max_concurrent.max(1),
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Fetch and parse the detail page of every movie.
    ///
    /// Movies sharing an index, or without a detail link, are rejected
    /// before dispatch. Per-item failures are recorded in the report and do
    /// not stop sibling fetches. Returns once every dispatched fetch has
    /// completed or failed.
    pub async fn collect<P>(&self, movies: Vec<Movie>, parse: P) -> ScrapeReport
    where
        P: Fn(&Page) -> Result<MovieDetails, EngineError> + Sync,
    {
        let start = Instant::now();
        let mut failures: BTreeMap<usize, String> = BTreeMap::new();

        let mut occurrences: HashMap<usize, usize> = HashMap::new();
        for movie in &movies {
            *occurrences.entry(movie.index).or_default() += 1;
        }

        let mut slots: Vec<Movie> = Vec::with_capacity(movies.len());
        let mut positions: HashMap<usize, usize> = HashMap::with_capacity(movies.len());
        let mut jobs: Vec<DetailJob> = Vec::with_capacity(movies.len());

        for movie in movies {
            let index = movie.index;
            if occurrences.get(&index).copied().unwrap_or(0) > 1 {
                reject(&mut failures, index, EngineError::DuplicateIndex { index });
                continue;
            }
            let Some(url) = movie.detail_link.clone() else {
                reject(&mut failures, index, EngineError::MissingDetailLink { index });
                continue;
            };

            positions.insert(index, slots.len());
            slots.push(movie);
            jobs.push(DetailJob { index, url });
        }

        debug!(
            jobs = jobs.len(),
            max_concurrent = self.max_concurrent,
            "Dispatching detail fetches"
        );

        let mut completions = pin!(stream::iter(jobs)
            .map(|job| self.run_job(job, &parse))
            .buffer_unordered(self.max_concurrent));

        while let Some((index, outcome)) = completions.next().await {
            let Some(&position) = positions.get(&index) else {
                // Jobs are only built from known positions.
                warn!(index, "Completion for unknown slot dropped");
                continue;
            };
            let slot = &mut slots[position];

            let outcome = outcome.and_then(|details| {
                slot.apply_details(details);
                if slot.is_scraped() {
                    Ok(())
                } else {
                    Err(EngineError::IncompleteScrape { index })
                }
            });

            match outcome {
                Ok(()) => {
                    DETAIL_SLOTS.with_label_values(&["ok"]).inc();
                    debug!(index, movie = %slot, "Detail scraped");
                }
                Err(e) => {
                    DETAIL_SLOTS.with_label_values(&["failed"]).inc();
                    warn!(index, movie = %slot, error = %e, "Detail scrape failed");
                    failures.insert(index, e.to_string());
                }
            }
        }

        let movies: Vec<Movie> = slots
            .into_iter()
            .filter(|m| !failures.contains_key(&m.index))
            .collect();

        SCRAPE_DURATION
            .with_label_values(&[])
            .observe(start.elapsed().as_secs_f64());
        info!(
            scraped = movies.len(),
            failed = failures.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Detail scrape complete"
        );

        ScrapeReport { movies, failures }
    }

    async fn run_job<P>(&self, job: DetailJob, parse: &P) -> (usize, Result<MovieDetails, EngineError>)
    where
        P: Fn(&Page) -> Result<MovieDetails, EngineError> + Sync,
    {
        let index = job.index;
        (index, self.fetch_details(job, parse).await)
    }

    async fn fetch_details<P>(&self, job: DetailJob, parse: &P) -> Result<MovieDetails, EngineError>
    where
        P: Fn(&Page) -> Result<MovieDetails, EngineError> + Sync,
    {
        let page = self.fetcher.fetch(job.request()).await?;
        page.ctx.expect_movie_index(job.index)?;
        parse(&page)
    }
}

fn reject(failures: &mut BTreeMap<usize, String>, index: usize, error: EngineError) {
    DETAIL_SLOTS.with_label_values(&["rejected"]).inc();
    warn!(index, error = %error, "Movie rejected before dispatch");
    failures.insert(index, error.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::DownloadLinks;
    use crate::testing::{fixtures, MockFetcher};
    use std::time::Duration;

    fn link_parser(page: &Page) -> Result<MovieDetails, EngineError> {
        let link = Url::parse(page.body.trim()).map_err(|e| EngineError::Parse(e.to_string()))?;
        Ok(MovieDetails::with_links(DownloadLinks::Single(link)))
    }

    #[test]
    fn test_job_request_carries_index() {
        let job = DetailJob {
            index: 7,
            url: Url::parse("https://example.com/movie/7").unwrap(),
        };
        let request = job.request();
        assert_eq!(request.url, job.url);
        assert_eq!(request.ctx.movie_index(), Ok(7));
    }

    #[test]
    fn test_concurrency_floor() {
        let collector = DetailCollector::new(Arc::new(MockFetcher::new()), 0);
        assert_eq!(collector.max_concurrent(), 1);
    }

    #[tokio::test]
    async fn test_collect_writes_by_index() {
        let fetcher = Arc::new(MockFetcher::new());
        let mut movies = Vec::new();
        for i in 0..3 {
            let stub = fixtures::stub(i, &format!("Movie {}", i));
            let detail = stub.detail_link.clone().unwrap();
            fetcher
                .add_page(detail.as_str(), &format!("https://dl.example.com/{}.mp4", i))
                .await;
            movies.push(stub);
        }

        let collector = DetailCollector::new(fetcher.clone(), 3);
        let report = collector.collect(movies, link_parser).await;

        assert!(report.is_complete());
        assert_eq!(report.movies.len(), 3);
        for (i, movie) in report.movies.iter().enumerate() {
            assert_eq!(movie.index, i);
            assert_eq!(
                movie.download_link.as_ref().unwrap().as_str(),
                format!("https://dl.example.com/{}.mp4", i)
            );
        }
    }

    #[tokio::test]
    async fn test_collect_rejects_duplicates_and_missing_links() {
        let fetcher = Arc::new(MockFetcher::new());
        let first = fixtures::stub(1, "First");
        let duplicate = fixtures::stub(1, "Duplicate");
        let no_link = Movie::stub(2, "No link", "");
        let ok = fixtures::stub(3, "Ok");
        fetcher
            .add_page(ok.detail_link.as_ref().unwrap().as_str(), "https://dl.example.com/3.mp4")
            .await;

        let collector = DetailCollector::new(fetcher.clone(), 2);
        let report = collector
            .collect(vec![first, duplicate, no_link, ok], link_parser)
            .await;

        assert_eq!(report.failed_indices(), vec![1, 2]);
        assert_eq!(report.movies.len(), 1);
        assert_eq!(report.movies[0].index, 3);
        // Only the valid movie was fetched.
        assert_eq!(fetcher.request_count().await, 1);
    }

    #[tokio::test]
    async fn test_collect_flags_tampered_context() {
        let fetcher = Arc::new(MockFetcher::new());
        let a = fixtures::stub(0, "A");
        let b = fixtures::stub(1, "B");
        let a_url = a.detail_link.clone().unwrap();
        let b_url = b.detail_link.clone().unwrap();
        fetcher.add_page(a_url.as_str(), "https://dl.example.com/a.mp4").await;
        fetcher.add_page(b_url.as_str(), "https://dl.example.com/b.mp4").await;

        // The transport hands page A back with B's index.
        let mut wrong = RequestContext::new();
        wrong.put(crate::fetch::MOVIE_INDEX_KEY, "1");
        fetcher.override_context(a_url.as_str(), wrong).await;

        let collector = DetailCollector::new(fetcher.clone(), 2);
        let report = collector.collect(vec![a, b], link_parser).await;

        assert_eq!(report.failed_indices(), vec![0]);
        assert!(report.failures[&0].contains("expected 0"));
        let b = report.get(1).unwrap();
        assert_eq!(
            b.download_link.as_ref().unwrap().as_str(),
            "https://dl.example.com/b.mp4"
        );
    }

    #[tokio::test]
    async fn test_collect_respects_concurrency_limit() {
        let fetcher = Arc::new(MockFetcher::new());
        let mut movies = Vec::new();
        for i in 0..6 {
            let stub = fixtures::stub(i, &format!("Movie {}", i));
            fetcher
                .add_delayed_page(
                    stub.detail_link.as_ref().unwrap().as_str(),
                    &format!("https://dl.example.com/{}.mp4", i),
                    Duration::from_millis(20),
                )
                .await;
            movies.push(stub);
        }

        let collector = DetailCollector::new(fetcher.clone(), 2);
        let report = collector.collect(movies, link_parser).await;

        assert!(report.is_complete());
        assert!(fetcher.max_in_flight() <= 2);
    }

    #[tokio::test]
    async fn test_collect_incomplete_details_fail_slot() {
        let fetcher = Arc::new(MockFetcher::new());
        let stub = fixtures::stub(0, "Empty series");
        fetcher
            .add_page(stub.detail_link.as_ref().unwrap().as_str(), "")
            .await;

        let collector = DetailCollector::new(fetcher, 1);
        let report = collector
            .collect(vec![stub], |_page: &Page| {
                Ok(MovieDetails::with_links(DownloadLinks::Series(vec![])))
            })
            .await;

        assert!(report.movies.is_empty());
        assert!(report.failures[&0].contains("no usable download link"));
    }
}
