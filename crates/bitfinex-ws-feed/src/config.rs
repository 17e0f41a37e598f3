/*
[INPUT]:  YAML configuration file, environment variables for credentials
[OUTPUT]: Parsed feed configuration and adapter construction settings
[POS]:    Configuration layer - feed runner setup
[UPDATE]: When adding new configuration options
*/

use std::time::Duration;

use anyhow::{bail, Context};
use bitfinex_ws_adapter::{
    BookFrequency, BookOptions, BookPrecision, CandleTimeframe, Connector, MarketDataChannel,
    MarketDataConfig, PRIVATE_WS_URL, PUBLIC_WS_URL, ReconnectPolicy, TradingConfig,
};
use serde::{Deserialize, Serialize};

/// Top-level configuration for the feed runner
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedConfig {
    /// Public market data connection
    #[serde(default)]
    pub public: PublicFeedConfig,
    /// Authenticated connection; omitted means public data only
    #[serde(default)]
    pub trading: Option<TradingFeedConfig>,
    /// Backoff shared by both connections
    #[serde(default)]
    pub reconnect: ReconnectConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PublicFeedConfig {
    #[serde(default = "default_public_url")]
    pub url: String,
    #[serde(default = "default_true")]
    pub must_reconnect: bool,
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    #[serde(default)]
    pub subscriptions: Vec<SubscriptionConfig>,
}

impl Default for PublicFeedConfig {
    fn default() -> Self {
        Self {
            url: default_public_url(),
            must_reconnect: true,
            capacity: default_capacity(),
            subscriptions: Vec::new(),
        }
    }
}

/// One channel to subscribe to at startup
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "channel", rename_all = "snake_case")]
pub enum SubscriptionConfig {
    Ticker {
        symbol: String,
    },
    Trades {
        symbol: String,
    },
    Book {
        symbol: String,
        #[serde(default)]
        prec: BookPrecision,
        #[serde(default)]
        freq: BookFrequency,
        #[serde(default = "default_book_len")]
        len: u32,
    },
    RawBook {
        symbol: String,
        #[serde(default = "default_book_len")]
        len: u32,
    },
    Candles {
        symbol: String,
        timeframe: CandleTimeframe,
    },
    Status {
        key: String,
    },
}

impl SubscriptionConfig {
    /// Queue or send this subscription on `channel`
    pub fn apply<C: Connector>(
        &self,
        channel: &mut MarketDataChannel<C>,
    ) -> bitfinex_ws_adapter::Result<()> {
        match self {
            SubscriptionConfig::Ticker { symbol } => channel.subscribe_to_ticker(symbol),
            SubscriptionConfig::Trades { symbol } => channel.subscribe_to_trades(symbol),
            SubscriptionConfig::Book {
                symbol,
                prec,
                freq,
                len,
            } => channel.subscribe_to_books(
                symbol,
                BookOptions {
                    precision: *prec,
                    frequency: *freq,
                    len: *len,
                },
            ),
            SubscriptionConfig::RawBook { symbol, len } => {
                channel.subscribe_to_raw_books(symbol, *len)
            }
            SubscriptionConfig::Candles { symbol, timeframe } => {
                channel.subscribe_to_candles(symbol, *timeframe)
            }
            SubscriptionConfig::Status { key } => channel.subscribe_to_status(key),
        }
    }
}

/// Authenticated connection settings; secrets are read from the environment
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TradingFeedConfig {
    #[serde(default = "default_private_url")]
    pub url: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_api_secret_env")]
    pub api_secret_env: String,
    #[serde(default)]
    pub filter: Option<Vec<String>>,
    #[serde(default = "default_true")]
    pub must_reconnect: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReconnectConfig {
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            jitter_ms: default_jitter_ms(),
        }
    }
}

impl ReconnectConfig {
    pub fn policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            jitter: Duration::from_millis(self.jitter_ms),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_public_url() -> String {
    PUBLIC_WS_URL.to_string()
}

fn default_private_url() -> String {
    PRIVATE_WS_URL.to_string()
}

fn default_capacity() -> usize {
    MarketDataConfig::default().capacity
}

fn default_book_len() -> u32 {
    BookOptions::default().len
}

fn default_api_key_env() -> String {
    "BFX_API_KEY".to_string()
}

fn default_api_secret_env() -> String {
    "BFX_API_SECRET".to_string()
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_jitter_ms() -> u64 {
    250
}

impl FeedConfig {
    /// Load configuration from YAML file
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Check everything that can be checked without credentials or network
    pub fn validate(&self) -> anyhow::Result<()> {
        self.market_data_config()
            .validate()
            .context("invalid public feed settings")?;

        if self.public.subscriptions.len() > self.public.capacity {
            bail!(
                "{} subscriptions configured but only {} concurrent channels are supported",
                self.public.subscriptions.len(),
                self.public.capacity
            );
        }

        if let Some(trading) = &self.trading {
            TradingConfig::new("placeholder", "placeholder")
                .with_url(trading.url.clone())
                .validate()
                .context("invalid trading feed settings")?;
        }
        Ok(())
    }

    pub fn market_data_config(&self) -> MarketDataConfig {
        MarketDataConfig {
            url: self.public.url.clone(),
            must_reconnect: self.public.must_reconnect,
            capacity: self.public.capacity,
            reconnect: self.reconnect.policy(),
        }
    }

    /// Trading settings with credentials read from the process environment
    pub fn trading_config(&self) -> anyhow::Result<Option<TradingConfig>> {
        self.trading_config_with(|name| std::env::var(name).ok())
    }

    /// Trading settings with credentials resolved through `lookup`
    pub fn trading_config_with<F>(&self, lookup: F) -> anyhow::Result<Option<TradingConfig>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(trading) = &self.trading else {
            return Ok(None);
        };

        let api_key = lookup(&trading.api_key_env)
            .with_context(|| format!("environment variable {} is not set", trading.api_key_env))?;
        let api_secret = lookup(&trading.api_secret_env).with_context(|| {
            format!("environment variable {} is not set", trading.api_secret_env)
        })?;

        let mut config = TradingConfig::new(api_key, api_secret)
            .with_url(trading.url.clone())
            .with_reconnect(trading.must_reconnect)
            .with_policy(self.reconnect.policy());
        if let Some(filter) = &trading.filter {
            config = config.with_filter(filter.clone());
        }
        config.validate().context("invalid trading credentials")?;
        Ok(Some(config))
    }
}
