/*
[INPUT]:  Test scenarios for both feeds
[OUTPUT]: Shared fixtures, event builders and signature helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for bitfinex-ws-adapter tests

#![allow(dead_code)]

use bitfinex_ws_adapter::{
    Generation, GenerationEvent, MarketDataChannel, MarketDataConfig, ReconnectPolicy,
    RecordingConnector, TradingConfig, TradingSession, TransportEvent,
};
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha384;

pub const TEST_API_KEY: &str = "test-api-key";
pub const TEST_API_SECRET: &str = "test-api-secret";

/// Public feed on an in-memory transport with immediate reconnects
pub fn market_channel() -> (MarketDataChannel<RecordingConnector>, RecordingConnector) {
    market_channel_with(MarketDataConfig::default())
}

pub fn market_channel_with(
    config: MarketDataConfig,
) -> (MarketDataChannel<RecordingConnector>, RecordingConnector) {
    let connector = RecordingConnector::new();
    let config = config.with_policy(ReconnectPolicy::immediate());
    let channel = MarketDataChannel::new(config, connector.clone())
        .expect("market data channel should build");
    (channel, connector)
}

pub fn trading_config() -> TradingConfig {
    TradingConfig::new(TEST_API_KEY, TEST_API_SECRET).with_policy(ReconnectPolicy::immediate())
}

pub fn trading_session() -> (TradingSession<RecordingConnector>, RecordingConnector) {
    trading_session_with(trading_config())
}

pub fn trading_session_with(
    config: TradingConfig,
) -> (TradingSession<RecordingConnector>, RecordingConnector) {
    let connector = RecordingConnector::new();
    let session =
        TradingSession::new(config, connector.clone()).expect("trading session should build");
    (session, connector)
}

pub fn opened(generation: Generation) -> GenerationEvent {
    GenerationEvent::new(generation, TransportEvent::Opened)
}

pub fn closed(generation: Generation) -> GenerationEvent {
    GenerationEvent::new(generation, TransportEvent::Closed)
}

pub fn message(generation: Generation, value: Value) -> GenerationEvent {
    GenerationEvent::new(generation, TransportEvent::Message(value.to_string()))
}

/// A `subscribed` ack the way the exchange echoes it
pub fn subscribed(channel: &str, chan_id: u64, symbol: &str) -> Value {
    json!({
        "event": "subscribed",
        "channel": channel,
        "chanId": chan_id,
        "symbol": symbol,
        "pair": symbol.trim_start_matches('t'),
    })
}

pub fn unsubscribed(chan_id: u64) -> Value {
    json!({ "event": "unsubscribed", "status": "OK", "chanId": chan_id })
}

/// Reference HMAC-SHA384 hex digest computed straight from the primitives
pub fn hmac_sha384_hex(secret: &str, payload: &str) -> String {
    let mut mac =
        Hmac::<Sha384>::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
