/*
[INPUT]:  Endpoint URLs, credentials, reconnect settings
[OUTPUT]: Validated construction settings for both feeds
[POS]:    Configuration layer - library-side settings with defaults
[UPDATE]: When adding feed options or changing default endpoints
*/

use std::fmt;

use url::Url;

use crate::error::{BitfinexError, Result};
use crate::transport::ReconnectPolicy;

/// Public market data endpoint
pub const PUBLIC_WS_URL: &str = "wss://api-pub.bitfinex.com/ws/2";
/// Authenticated endpoint
pub const PRIVATE_WS_URL: &str = "wss://api.bitfinex.com/ws/2";
/// Concurrent channels allowed per public connection
pub const DEFAULT_CHANNEL_CAPACITY: usize = 30;

fn validate_ws_url(raw: &str) -> Result<()> {
    let url = Url::parse(raw)?;
    match url.scheme() {
        "ws" | "wss" => Ok(()),
        other => Err(BitfinexError::Config(format!(
            "unsupported url scheme {other:?}, expected ws or wss"
        ))),
    }
}

/// Settings for [`crate::MarketDataChannel`]
#[derive(Debug, Clone, PartialEq)]
pub struct MarketDataConfig {
    pub url: String,
    pub must_reconnect: bool,
    pub capacity: usize,
    pub reconnect: ReconnectPolicy,
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            url: PUBLIC_WS_URL.to_string(),
            must_reconnect: true,
            capacity: DEFAULT_CHANNEL_CAPACITY,
            reconnect: ReconnectPolicy::default(),
        }
    }
}

impl MarketDataConfig {
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_reconnect(mut self, must_reconnect: bool) -> Self {
        self.must_reconnect = must_reconnect;
        self
    }

    pub fn with_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_ws_url(&self.url)?;
        if self.capacity == 0 {
            return Err(BitfinexError::Config("capacity must be at least 1".into()));
        }
        Ok(())
    }
}

/// Settings for [`crate::TradingSession`]
#[derive(Clone, PartialEq)]
pub struct TradingConfig {
    pub url: String,
    pub api_key: String,
    pub api_secret: String,
    /// Account streams to receive, e.g. `trading`, `wallet`, `funding`
    pub filter: Option<Vec<String>>,
    pub must_reconnect: bool,
    pub reconnect: ReconnectPolicy,
}

impl TradingConfig {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            url: PRIVATE_WS_URL.to_string(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            filter: None,
            must_reconnect: true,
            reconnect: ReconnectPolicy::default(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_filter(mut self, filter: Vec<String>) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_reconnect(mut self, must_reconnect: bool) -> Self {
        self.must_reconnect = must_reconnect;
        self
    }

    pub fn with_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(BitfinexError::Config("api key is required".into()));
        }
        if self.api_secret.is_empty() {
            return Err(BitfinexError::Config("api secret is required".into()));
        }
        validate_ws_url(&self.url)
    }
}

impl fmt::Debug for TradingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TradingConfig")
            .field("url", &self.url)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("filter", &self.filter)
            .field("must_reconnect", &self.must_reconnect)
            .field("reconnect", &self.reconnect)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_defaults() {
        let config = MarketDataConfig::default();
        assert_eq!(config.url, PUBLIC_WS_URL);
        assert!(config.must_reconnect);
        assert_eq!(config.capacity, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_non_ws_scheme() {
        let config = MarketDataConfig::default().with_url("https://api-pub.bitfinex.com/ws/2");
        assert!(matches!(config.validate(), Err(BitfinexError::Config(_))));

        let config = MarketDataConfig::default().with_url("not a url");
        assert!(matches!(config.validate(), Err(BitfinexError::UrlParse(_))));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = MarketDataConfig {
            capacity: 0,
            ..MarketDataConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_trading_requires_credentials() {
        assert!(matches!(
            TradingConfig::new("", "secret").validate(),
            Err(BitfinexError::Config(_))
        ));
        assert!(matches!(
            TradingConfig::new("key", "").validate(),
            Err(BitfinexError::Config(_))
        ));
        assert!(TradingConfig::new("key", "secret").validate().is_ok());
    }

    #[test]
    fn test_trading_debug_redacts_secret() {
        let config = TradingConfig::new("key", "very-secret-value");
        let debug = format!("{config:?}");
        assert!(debug.contains("key"));
        assert!(!debug.contains("very-secret-value"));
    }
}
