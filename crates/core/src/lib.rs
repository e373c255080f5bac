pub mod config;
pub mod engine;
pub mod fetch;
pub mod metrics;
pub mod scrape;
pub mod testing;

pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use engine::{
    get_engine, get_engines, init_engines, Category, DownloadLinks, Engine, EngineError,
    EngineRegistry, LinkState, Movie, MovieDetails, NetNaijaEngine, NetNaijaMode, Props,
    ScrapeReport, SearchResult,
};
pub use fetch::{
    CorrelationError, FetchError, FetchRequest, HttpFetcher, Page, PageFetcher, RequestContext,
};
pub use scrape::{DetailCollector, DetailJob};
