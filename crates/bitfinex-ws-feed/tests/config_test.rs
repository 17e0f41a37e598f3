/*
[INPUT]:  Bundled example configuration
[OUTPUT]: Parsing and validation results
[POS]:    Integration test layer - configuration loading
[UPDATE]: When the configuration format changes
*/

use bitfinex_ws_adapter::{MarketDataChannel, RecordingConnector};
use bitfinex_ws_feed::{FeedConfig, SubscriptionConfig};
use tokio_test::assert_ok;

const EXAMPLE: &str = include_str!("../config/feed.example.yaml");

#[test]
fn test_example_config_parses_and_validates() {
    let config = assert_ok!(FeedConfig::from_yaml(EXAMPLE));
    assert_ok!(config.validate());
    assert_eq!(config.public.subscriptions.len(), 6);
    assert!(matches!(
        config.public.subscriptions[3],
        SubscriptionConfig::RawBook { len: 100, .. }
    ));
    assert!(config.trading.is_some());
}

#[test]
fn test_example_subscriptions_queue_until_open() {
    let config = assert_ok!(FeedConfig::from_yaml(EXAMPLE));
    let connector = RecordingConnector::new();
    let mut channel = assert_ok!(MarketDataChannel::new(config.market_data_config(), connector.clone()));

    for subscription in &config.public.subscriptions {
        assert_ok!(subscription.apply(&mut channel));
    }
    assert_eq!(channel.queued_len(), 6);
    assert!(connector.sent().is_empty());
}

#[test]
fn test_invalid_url_fails_validation() {
    let yaml = "public:\n  url: https://api-pub.bitfinex.com/ws/2\n";
    let config = assert_ok!(FeedConfig::from_yaml(yaml));
    assert!(config.validate().is_err());
}

#[test]
fn test_unknown_channel_rejected() {
    let yaml = "public:\n  subscriptions:\n    - channel: fireworks\n      symbol: tBTCUSD\n";
    assert!(FeedConfig::from_yaml(yaml).is_err());
}
