use url::Url;

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - HTTP timeout is not 0 and the user agent is set
/// - Scrape concurrency is not 0
/// - Engine base URL overrides parse as URLs
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.http.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "http.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.http.user_agent.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "http.user_agent cannot be empty".to_string(),
        ));
    }

    if config.scrape.max_concurrent_fetches == 0 {
        return Err(ConfigError::ValidationError(
            "scrape.max_concurrent_fetches cannot be 0".to_string(),
        ));
    }

    if let Some(base_url) = &config.engines.netnaija.base_url {
        Url::parse(base_url).map_err(|e| {
            ConfigError::ValidationError(format!(
                "engines.netnaija.base_url is not a valid URL: {}",
                e
            ))
        })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_timeout_zero_fails() {
        let mut config = Config::default();
        config.http.timeout_secs = 0;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_blank_user_agent_fails() {
        let mut config = Config::default();
        config.http.user_agent = "  ".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_concurrency_zero_fails() {
        let mut config = Config::default();
        config.scrape.max_concurrent_fetches = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("max_concurrent_fetches"));
    }

    #[test]
    fn test_validate_bad_base_url_fails() {
        let mut config = Config::default();
        config.engines.netnaija.base_url = Some("not a url".to_string());
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("engines.netnaija.base_url"));
    }
}
