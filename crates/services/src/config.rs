use std::env;
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_API_URL: &str = "https://opentdb.com/api.php";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_THROTTLE_SECS: u64 = 5;

/// Runtime knobs for the quiz services.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuizConfig {
    pub api_url: String,
    pub fetch_timeout: Duration,
    pub throttle_interval: Duration,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            throttle_interval: Duration::from_secs(DEFAULT_THROTTLE_SECS),
        }
    }
}

impl QuizConfig {
    /// Read `QUIZ_API_URL`, `QUIZ_FETCH_TIMEOUT_SECS` and `QUIZ_THROTTLE_SECS`,
    /// falling back to defaults for unset variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup("QUIZ_API_URL").filter(|v| !v.trim().is_empty()) {
            config = config.with_api_url(raw)?;
        }
        if let Some(secs) = read_secs(&lookup, "QUIZ_FETCH_TIMEOUT_SECS")? {
            config.fetch_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = read_secs(&lookup, "QUIZ_THROTTLE_SECS")? {
            config.throttle_interval = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Replace the question source endpoint.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidApiUrl` if `raw` is not an absolute http(s) URL.
    pub fn with_api_url(mut self, raw: impl Into<String>) -> Result<Self, ConfigError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        match Url::parse(trimmed) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {
                self.api_url = trimmed.to_owned();
                Ok(self)
            }
            _ => Err(ConfigError::InvalidApiUrl(raw)),
        }
    }
}

fn read_secs(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<u64>, ConfigError> {
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Some(secs)),
        _ => Err(ConfigError::InvalidNumber { var, raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = QuizConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, QuizConfig::default());
        assert_eq!(config.fetch_timeout, Duration::from_secs(10));
        assert_eq!(config.throttle_interval, Duration::from_secs(5));
    }

    #[test]
    fn reads_overrides() {
        let config = QuizConfig::from_lookup(lookup(&[
            ("QUIZ_API_URL", "http://localhost:3000/api/questions"),
            ("QUIZ_FETCH_TIMEOUT_SECS", "3"),
            ("QUIZ_THROTTLE_SECS", "1"),
        ]))
        .unwrap();
        assert_eq!(config.api_url, "http://localhost:3000/api/questions");
        assert_eq!(config.fetch_timeout, Duration::from_secs(3));
        assert_eq!(config.throttle_interval, Duration::from_secs(1));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            QuizConfig::from_lookup(lookup(&[("QUIZ_API_URL", "not a url")])),
            Err(ConfigError::InvalidApiUrl(_))
        ));
        assert!(matches!(
            QuizConfig::from_lookup(lookup(&[("QUIZ_API_URL", "ftp://example.com")])),
            Err(ConfigError::InvalidApiUrl(_))
        ));
        assert!(matches!(
            QuizConfig::from_lookup(lookup(&[("QUIZ_FETCH_TIMEOUT_SECS", "0")])),
            Err(ConfigError::InvalidNumber { .. })
        ));
        assert!(matches!(
            QuizConfig::from_lookup(lookup(&[("QUIZ_THROTTLE_SECS", "soon")])),
            Err(ConfigError::InvalidNumber { .. })
        ));
    }
}
