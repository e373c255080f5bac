//! Testing utilities and mock implementations.
//!
//! This module provides a scriptable [`PageFetcher`](crate::fetch::PageFetcher)
//! and a scriptable [`Engine`](crate::engine::Engine), allowing engines and
//! callers to be tested without touching the network.
//!
//! # Example
//!
//! ```rust,ignore
//! use cinescrape_core::testing::{fixtures, MockFetcher};
//!
//! let fetcher = Arc::new(MockFetcher::new());
//! fetcher.add_page(
//!     "https://netnaija.test/videos/movies",
//!     &fixtures::listing_html(&[("Dune (2021)", "/videos/movies/1-dune")]),
//! ).await;
//!
//! let engine = NetNaijaEngine::with_base_url("https://netnaija.test", fetcher, 4)?;
//! ```

mod mock_engine;
mod mock_fetcher;

pub use mock_engine::MockEngine;
pub use mock_fetcher::MockFetcher;

/// Test fixtures and helper functions.
pub mod fixtures {
    use url::Url;

    use crate::engine::Movie;

    /// Host used by [`stub`] links.
    pub const FIXTURE_HOST: &str = "https://fixtures.example.com";

    /// A listing stub with a unique detail link per index.
    pub fn stub(index: usize, title: &str) -> Movie {
        let detail = Url::parse(&format!("{}/movies/{}", FIXTURE_HOST, index))
            .expect("valid fixture URL");
        Movie::stub(
            index,
            title,
            format!("{}/covers/{}.jpg", FIXTURE_HOST, index),
        )
        .with_detail_link(detail)
    }

    fn slug(href: &str) -> &str {
        href.trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(href)
    }

    /// A NetNaija listing page with one entry per `(title, href)`.
    ///
    /// Covers are served from `/covers/{last path segment}.jpg`.
    pub fn listing_html(entries: &[(&str, &str)]) -> String {
        let articles: String = entries
            .iter()
            .map(|(title, href)| {
                format!(
                    r#"<article class="file-one">
  <div class="thumbnail"><a href="{href}"><img src="/covers/{slug}.jpg" alt=""></a></div>
  <div class="info"><h2><a href="{href}">{title}</a></h2></div>
</article>
"#,
                    href = href,
                    slug = slug(href),
                    title = title,
                )
            })
            .collect();

        format!(
            "<!DOCTYPE html><html><head><title>Movies</title></head><body><main class=\"video-files\">\n{}</main></body></html>",
            articles
        )
    }

    /// A NetNaija search result page with one entry per `(title, href)`.
    pub fn search_html(entries: &[(&str, &str)]) -> String {
        let results: String = entries
            .iter()
            .map(|(title, href)| {
                format!(
                    r#"<article class="sr-one">
  <div class="thumbnail"><img data-src="/covers/{slug}.jpg" alt=""></div>
  <h3 class="result-title"><a href="{href}">{title}</a></h3>
</article>
"#,
                    href = href,
                    slug = slug(href),
                    title = title,
                )
            })
            .collect();

        format!(
            "<!DOCTYPE html><html><body><div class=\"search-results\">\n{}</div></body></html>",
            results
        )
    }

    /// A NetNaija detail page.
    ///
    /// Size is "1.2 GB", upload date 2021-10-22 and the description
    /// "About {title}.".
    pub fn detail_html(title: &str, links: &[&str]) -> String {
        let anchors: String = links
            .iter()
            .map(|link| format!("<a class=\"download-link\" href=\"{}\">Download</a>\n", link))
            .collect();

        format!(
            r#"<!DOCTYPE html><html><body>
<h1 class="page-title">{title}</h1>
<div class="video-description"><p>About {title}.</p></div>
<ul class="file-meta">
  <li><span class="file-size">1.2 GB</span></li>
  <li><time datetime="2021-10-22">Oct 22, 2021</time></li>
</ul>
<div class="download-block">
{anchors}</div>
</body></html>"#,
            title = title,
            anchors = anchors,
        )
    }
}
