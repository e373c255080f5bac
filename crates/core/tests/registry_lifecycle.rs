//! Engine registry lifecycle integration tests.
//!
//! These tests verify:
//! - Building the registry from a config file
//! - Disabling engines and overriding their base URL
//! - Lookup of registered and unknown engines
//! - Driving a registered engine end to end through the trait object

use std::io::Write;
use std::sync::Arc;

use tempfile::NamedTempFile;

use cinescrape_core::{
    get_engine, load_config, validate_config,
    testing::{fixtures, MockEngine, MockFetcher},
    Config, Engine, EngineError, EngineRegistry, Movie, ScrapeReport,
};

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(contents.as_bytes())
        .expect("Failed to write config");
    file
}

#[test]
fn test_registry_from_config_file() {
    let file = config_file(
        r#"
[scrape]
max_concurrent_fetches = 2

[engines.netnaija]
base_url = "http://127.0.0.1:8099/nn"
"#,
    );
    let config = load_config(file.path()).unwrap();
    validate_config(&config).unwrap();

    let registry = EngineRegistry::from_config(&config).unwrap();
    let engine = registry.require("NetNaija").unwrap();
    assert_eq!(engine.props().base_url.as_str(), "http://127.0.0.1:8099/nn/");
    assert_eq!(
        engine.props().search_url.as_str(),
        "http://127.0.0.1:8099/nn/search"
    );
}

#[test]
fn test_disabled_engines_are_not_registered() {
    let file = config_file(
        r#"
[engines.netnaija]
enabled = false
"#,
    );
    let config = load_config(file.path()).unwrap();

    let registry = EngineRegistry::from_config(&config).unwrap();
    assert!(registry.is_empty());
    assert!(matches!(
        registry.require("NetNaija"),
        Err(EngineError::UnknownEngine(_))
    ));
}

#[test]
fn test_unknown_engine_lookup_does_not_panic() {
    assert!(get_engine("unknown").is_none());
    assert!(get_engine("").is_none());
    assert!(get_engine("NetNaija").is_some());
}

#[tokio::test]
async fn test_registered_engine_end_to_end() {
    let fetcher = Arc::new(MockFetcher::new());
    fetcher
        .add_page(
            "https://www.thenetnaija.net/search?t=dune",
            &fixtures::search_html(&[("Dune (2021)", "/videos/movies/1-dune")]),
        )
        .await;
    fetcher
        .add_page(
            "https://www.thenetnaija.net/videos/movies/1-dune",
            &fixtures::detail_html("Dune (2021)", &["https://dl.example.com/dune.mp4"]),
        )
        .await;

    let registry = EngineRegistry::with_fetcher(&Config::default(), fetcher.clone()).unwrap();
    let engine = registry.get("NetNaija").unwrap();

    let result = engine.search("dune").await.unwrap();
    let dune = result.get_movie_by_title("Dune").unwrap();
    assert_eq!(dune.to_string(), "Dune (2021)");

    let report = engine.scrape_movies(vec![dune]).await.unwrap();
    let scraped = report.get(0).unwrap();
    assert_eq!(
        scraped.download_link.as_ref().unwrap().as_str(),
        "https://dl.example.com/dune.mp4"
    );
    assert_eq!(scraped.description, "About Dune (2021).");
    assert_eq!(scraped.upload_date, "2021-10-22");
}

#[tokio::test]
async fn test_custom_engines_share_the_registry() {
    let mut registry =
        EngineRegistry::with_fetcher(&Config::default(), Arc::new(MockFetcher::new())).unwrap();

    let mock = Arc::new(MockEngine::new("Mock"));
    mock.set_page(1, vec![fixtures::stub(0, "Listed")]).await;
    mock.set_scrape_report(
        "everything",
        ScrapeReport {
            movies: vec![Movie::stub(0, "Scraped", "")],
            failures: Default::default(),
        },
    )
    .await;
    registry.register(mock.clone()).unwrap();

    assert_eq!(registry.names(), vec!["Mock", "NetNaija"]);

    let engine = registry.require("Mock").unwrap();
    assert_eq!(format!("{}", engine), "Mock");
    assert_eq!(engine.list(1).await.unwrap().titles(), vec!["Listed"]);
    assert!(engine.list(2).await.unwrap().is_empty());
    assert_eq!(engine.scrape("everything").await.unwrap().movies[0].title, "Scraped");
    assert!(matches!(
        engine.scrape("nothing").await,
        Err(EngineError::UnsupportedMode { .. })
    ));

    assert_eq!(
        mock.recorded_calls().await,
        vec!["list:1", "list:2", "scrape:everything", "scrape:nothing"]
    );
}

#[tokio::test]
async fn test_engine_errors_propagate_through_registry() {
    let mut registry = EngineRegistry::new();
    let mock = Arc::new(MockEngine::new("Mock"));
    mock.set_search_results(
        "dune",
        vec![fixtures::stub(0, "Dune"), fixtures::stub(1, "Dune Part Two")],
    )
    .await;
    registry.register(mock.clone()).unwrap();

    let engine = registry.require("Mock").unwrap();
    let result = engine.search("dune").await.unwrap();
    assert_eq!(result.query, "dune");
    assert_eq!(result.titles(), vec!["Dune", "Dune Part Two"]);
    assert_eq!(result.get_movie_by_title("Dune Part Two").unwrap().index, 1);

    mock.set_next_error(EngineError::Parse("layout changed".to_string()))
        .await;
    let err = engine.search("dune").await.unwrap_err();
    assert!(matches!(err, EngineError::Parse(ref msg) if msg == "layout changed"));
    assert_eq!(err.to_string(), "Failed to parse page: layout changed");

    // The error is consumed by the call that hit it.
    assert_eq!(engine.search("dune").await.unwrap().len(), 2);
    assert!(engine.search("other").await.unwrap().is_empty());
}

#[test]
fn test_scrape_modes_are_nameable_by_callers() {
    use cinescrape_core::{Category, NetNaijaMode};

    let mode: NetNaijaMode = "series:4".parse().unwrap();
    assert_eq!(mode.category, Category::Series);
    assert_eq!(mode.page, 4);
    assert_eq!(
        "latest".parse::<NetNaijaMode>().unwrap().category,
        Category::Movies
    );
}
