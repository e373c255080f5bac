//! Engine catalog.

use std::collections::BTreeMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::fetch::{HttpFetcher, PageFetcher};

use super::{Engine, EngineError, NetNaijaEngine};

/// Builds an engine from configuration. `Ok(None)` means the engine is
/// disabled.
type EngineConstructor =
    fn(&Config, Arc<dyn PageFetcher>) -> Result<Option<Arc<dyn Engine>>, EngineError>;

/// Every engine compiled into the crate.
const CONSTRUCTORS: &[(&str, EngineConstructor)] =
    &[(NetNaijaEngine::NAME, netnaija as EngineConstructor)];

fn netnaija(
    config: &Config,
    fetcher: Arc<dyn PageFetcher>,
) -> Result<Option<Arc<dyn Engine>>, EngineError> {
    if !config.engines.netnaija.enabled {
        return Ok(None);
    }
    let engine = NetNaijaEngine::from_config(config, fetcher)?;
    Ok(Some(Arc::new(engine)))
}

static ENGINES: OnceCell<EngineRegistry> = OnceCell::new();

/// Name -> engine mapping.
#[derive(Default)]
pub struct EngineRegistry {
    engines: BTreeMap<String, Arc<dyn Engine>>,
}

impl std::fmt::Debug for EngineRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineRegistry")
            .field("engines", &self.names())
            .finish()
    }
}

impl EngineRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every enabled engine over one shared HTTP fetcher.
    pub fn from_config(config: &Config) -> Result<Self, EngineError> {
        let fetcher = HttpFetcher::new(&config.http)?;
        Self::with_fetcher(config, Arc::new(fetcher))
    }

    /// Build every enabled engine over the given fetcher.
    pub fn with_fetcher(
        config: &Config,
        fetcher: Arc<dyn PageFetcher>,
    ) -> Result<Self, EngineError> {
        let mut registry = Self::new();
        for (name, constructor) in CONSTRUCTORS {
            match constructor(config, Arc::clone(&fetcher))? {
                Some(engine) => registry.register(engine)?,
                None => debug!(engine = *name, "Engine disabled"),
            }
        }
        info!(engines = ?registry.names(), "Engine registry ready");
        Ok(registry)
    }

    /// Add an engine. Names are unique.
    pub fn register(&mut self, engine: Arc<dyn Engine>) -> Result<(), EngineError> {
        let name = engine.name().to_string();
        if self.engines.contains_key(&name) {
            return Err(EngineError::DuplicateEngine(name));
        }
        self.engines.insert(name, engine);
        Ok(())
    }

    pub fn engines(&self) -> &BTreeMap<String, Arc<dyn Engine>> {
        &self.engines
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Engine>> {
        self.engines.get(name).cloned()
    }

    /// Like [`get`](Self::get), but an unknown name is an error.
    pub fn require(&self, name: &str) -> Result<Arc<dyn Engine>, EngineError> {
        self.get(name)
            .ok_or_else(|| EngineError::UnknownEngine(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.engines.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}

/// Build the process-wide registry from `config`.
///
/// Only the first successful call builds; later calls return the existing
/// registry and ignore `config`.
pub fn init_engines(config: &Config) -> Result<&'static EngineRegistry, EngineError> {
    ENGINES.get_or_try_init(|| EngineRegistry::from_config(config))
}

/// The process-wide registry, built from the default config on first use.
pub fn get_engines() -> Result<&'static EngineRegistry, EngineError> {
    match ENGINES.get() {
        Some(registry) => Ok(registry),
        None => init_engines(&Config::default()),
    }
}

/// Look up an engine in the process-wide registry.
pub fn get_engine(name: &str) -> Option<Arc<dyn Engine>> {
    match get_engines() {
        Ok(registry) => registry.get(name),
        Err(e) => {
            warn!(error = %e, "Engine registry unavailable");
            None
        }
    }
}
