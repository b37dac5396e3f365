//! Search-wide options.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::fetcher_http::DEFAULT_USER_AGENT;

/// Options shared by the dispatcher and the default HTTP fetcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Connect + read timeout for a single request, in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
    /// Wall-clock budget for a whole search, in seconds. Sources still
    /// running when it expires are abandoned.
    #[serde(default = "default_overall_timeout")]
    pub overall_timeout_secs: u64,
    /// User agent sent upstream.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_fetch_timeout() -> u64 {
    10
}

fn default_overall_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl SearchOptions {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn overall_timeout(&self) -> Duration {
        Duration::from_secs(self.overall_timeout_secs)
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: default_fetch_timeout(),
            overall_timeout_secs: default_overall_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = SearchOptions::default();
        assert_eq!(options.fetch_timeout(), Duration::from_secs(10));
        assert_eq!(options.overall_timeout(), Duration::from_secs(30));
        assert!(options.user_agent.starts_with("Mozilla/5.0"));
    }

    #[test]
    fn test_partial_deserialization() {
        let options: SearchOptions = serde_json::from_str(r#"{"overall_timeout_secs":5}"#).unwrap();
        assert_eq!(options.overall_timeout_secs, 5);
        assert_eq!(options.fetch_timeout_secs, 10);
        assert_eq!(options.user_agent, DEFAULT_USER_AGENT);
    }
}
