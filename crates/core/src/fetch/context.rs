//! Per-request context carried alongside an outbound fetch.

use std::collections::HashMap;

use thiserror::Error;

/// Context key holding the originating movie index.
pub const MOVIE_INDEX_KEY: &str = "movieIndex";

/// Failure to recover a movie index from a request context.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CorrelationError {
    #[error("request context has no movieIndex entry")]
    Missing,

    #[error("request context movieIndex is not an index: {value:?}")]
    Invalid { value: String },

    #[error("request context points at slot {found}, expected {expected}")]
    Mismatch { expected: usize, found: usize },
}

/// Small string map attached to a request before dispatch and handed back
/// with its page on completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    values: HashMap<String, String>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context tagged with the index of the movie that triggered the fetch.
    pub fn with_movie_index(index: usize) -> Self {
        let mut ctx = Self::new();
        ctx.put(MOVIE_INDEX_KEY, index.to_string());
        ctx
    }

    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Read back the movie index stored by [`RequestContext::with_movie_index`].
    pub fn movie_index(&self) -> Result<usize, CorrelationError> {
        let raw = self.get(MOVIE_INDEX_KEY).ok_or(CorrelationError::Missing)?;
        raw.trim()
            .parse()
            .map_err(|_| CorrelationError::Invalid {
                value: raw.to_string(),
            })
    }

    /// Check that this context belongs to the slot `expected`.
    pub fn expect_movie_index(&self, expected: usize) -> Result<usize, CorrelationError> {
        let found = self.movie_index()?;
        if found != expected {
            return Err(CorrelationError::Mismatch { expected, found });
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movie_index_round_trip() {
        let ctx = RequestContext::with_movie_index(42);
        assert_eq!(ctx.get(MOVIE_INDEX_KEY), Some("42"));
        assert_eq!(ctx.movie_index(), Ok(42));
        assert_eq!(ctx.expect_movie_index(42), Ok(42));
    }

    #[test]
    fn test_missing_index() {
        let ctx = RequestContext::new();
        assert!(ctx.is_empty());
        assert_eq!(ctx.movie_index(), Err(CorrelationError::Missing));
    }

    #[test]
    fn test_invalid_index() {
        let mut ctx = RequestContext::new();
        ctx.put(MOVIE_INDEX_KEY, "seven");
        assert_eq!(
            ctx.movie_index(),
            Err(CorrelationError::Invalid {
                value: "seven".to_string()
            })
        );

        ctx.put(MOVIE_INDEX_KEY, "-1");
        assert!(matches!(ctx.movie_index(), Err(CorrelationError::Invalid { .. })));
    }

    #[test]
    fn test_mismatched_index() {
        let ctx = RequestContext::with_movie_index(1);
        assert_eq!(
            ctx.expect_movie_index(2),
            Err(CorrelationError::Mismatch {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn test_other_keys_are_independent() {
        let mut ctx = RequestContext::with_movie_index(3);
        ctx.put("engine", "NetNaija");
        assert_eq!(ctx.get("engine"), Some("NetNaija"));
        assert_eq!(ctx.remove(MOVIE_INDEX_KEY), Some("3".to_string()));
        assert_eq!(ctx.movie_index(), Err(CorrelationError::Missing));
    }
}
