/*
[INPUT]:  Public feed scenarios on an in-memory transport
[OUTPUT]: Test results for subscription lifecycle, capacity and replay
[POS]:    Integration tests - market data channel
[UPDATE]: When subscription bookkeeping or reconnect rules change
*/

mod common;

use bitfinex_ws_adapter::{
    BitfinexError, BookOptions, CandleTimeframe, FeedEvent, MarketDataChannel, MarketDataConfig,
    RecordingConnector,
};
use common::{closed, market_channel, market_channel_with, message, opened, subscribed, unsubscribed};
use rstest::rstest;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_test::assert_ok;

fn drain_events(rx: &mut mpsc::UnboundedReceiver<FeedEvent>) -> Vec<FeedEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[test]
fn test_queued_until_open_then_drained_lifo() {
    let (mut channel, connector) = market_channel();

    assert_ok!(channel.subscribe_to_ticker("tBTCUSD"));
    assert_ok!(channel.subscribe_to_trades("tETHUSD"));
    assert_ok!(channel.subscribe_to_books("tLTCUSD", BookOptions::default()));
    assert_eq!(channel.queued_len(), 3);
    assert!(connector.sent().is_empty());

    assert_ok!(channel.handle_event(opened(1)));

    let channels: Vec<String> = connector
        .sent_json()
        .iter()
        .map(|frame| frame["channel"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(channels, vec!["book", "trades", "ticker"]);
    assert_eq!(channel.queued_len(), 0);
    assert_eq!(channel.connecting_len(), 3);
    assert!(channel.is_connected());
}

#[test]
fn test_subscribe_while_open_sends_immediately() {
    let (mut channel, connector) = market_channel();
    assert_ok!(channel.handle_event(opened(1)));

    assert_ok!(channel.subscribe_to_ticker("tBTCUSD"));
    assert_eq!(
        connector.sent(),
        vec![r#"{"event":"subscribe","channel":"ticker","symbol":"tBTCUSD"}"#.to_string()]
    );
    assert_eq!(channel.connecting_len(), 1);
}

#[test]
fn test_capacity_rejects_without_sending() {
    let (mut channel, connector) = market_channel();
    assert_ok!(channel.handle_event(opened(1)));

    for i in 0..29u64 {
        assert_ok!(channel.subscribe_to_ticker(&format!("tSYM{i}")));
        assert_ok!(channel.handle_event(message(1, subscribed("ticker", 100 + i, &format!("tSYM{i}")))));
    }
    assert_ok!(channel.subscribe_to_trades("tBTCUSD"));
    assert_eq!(channel.subscriptions().len(), 29);
    assert_eq!(channel.connecting_len(), 1);
    let sent_before = connector.sent().len();

    let err = channel.subscribe_to_ticker("tETHUSD").unwrap_err();
    assert!(matches!(err, BitfinexError::CapacityExceeded { limit: 30 }));
    assert_eq!(connector.sent().len(), sent_before);
}

#[test]
fn test_drain_past_capacity_drops_the_excess() {
    let config = MarketDataConfig {
        capacity: 2,
        ..MarketDataConfig::default()
    };
    let (channel, connector) = market_channel_with(config);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut channel = channel.with_handler(tx);

    assert_ok!(channel.subscribe_to_ticker("tBTCUSD"));
    assert_ok!(channel.subscribe_to_ticker("tETHUSD"));
    assert_ok!(channel.subscribe_to_ticker("tLTCUSD"));

    let err = channel.handle_event(opened(1)).unwrap_err();
    assert!(matches!(err, BitfinexError::CapacityExceeded { limit: 2 }));
    assert_eq!(channel.queued_len(), 0);
    assert_eq!(channel.connecting_len(), 2);

    // The newest request is popped first, while the other two still count as queued
    let symbols: Vec<Value> = connector.sent_json().iter().map(|f| f["symbol"].clone()).collect();
    assert_eq!(symbols, vec![json!("tETHUSD"), json!("tBTCUSD")]);

    let events = drain_events(&mut rx);
    assert_eq!(events[0], FeedEvent::Opened);
    assert!(matches!(&events[1], FeedEvent::Error(text) if text.contains("ticker")));
}

#[test]
fn test_ack_moves_connecting_to_connected() {
    let (mut channel, _connector) = market_channel();
    assert_ok!(channel.subscribe_to_ticker("tBTCUSD"));
    assert_ok!(channel.handle_event(opened(1)));
    assert_ok!(channel.handle_event(message(1, subscribed("ticker", 17, "tBTCUSD"))));

    assert_eq!(channel.connecting_len(), 0);
    let record = channel.find_subscription(17).expect("subscription recorded");
    assert_eq!(record.channel, "ticker");
    assert_eq!(record.params["symbol"], "tBTCUSD");
    assert!(!record.params.contains_key("chanId"));
}

#[test]
fn test_unsubscribe_confirmation_removes_by_chan_id() {
    let (mut channel, connector) = market_channel();
    assert_ok!(channel.handle_event(opened(1)));
    assert_ok!(channel.handle_event(message(1, subscribed("ticker", 1, "tBTCUSD"))));
    assert_ok!(channel.handle_event(message(1, subscribed("trades", 2, "tBTCUSD"))));

    assert_ok!(channel.unsubscribe(1));
    assert_eq!(connector.sent(), vec![r#"{"event":"unsubscribe","chanId":1}"#.to_string()]);
    assert_eq!(channel.subscriptions().len(), 2);

    assert_ok!(channel.handle_event(message(1, unsubscribed(1))));
    assert_eq!(channel.subscriptions().len(), 1);
    assert_eq!(channel.subscriptions()[0].chan_id, 2);

    assert_ok!(channel.handle_event(message(1, unsubscribed(1))));
    assert_eq!(channel.subscriptions().len(), 1);
}

#[test]
fn test_failed_unsubscribe_keeps_subscription() {
    let (mut channel, _connector) = market_channel();
    assert_ok!(channel.handle_event(opened(1)));
    assert_ok!(channel.handle_event(message(1, subscribed("ticker", 1, "tBTCUSD"))));
    assert_ok!(channel.handle_event(message(
        1,
        json!({"event": "unsubscribed", "status": "FAILED", "chanId": 1})
    )));
    assert!(channel.find_subscription(1).is_some());
}

#[test]
fn test_reconnect_replays_connected_subscriptions() {
    let (mut channel, connector) = market_channel();
    assert_ok!(channel.subscribe_to_ticker("tBTCUSD"));
    assert_ok!(channel.subscribe_to_trades("tETHUSD"));
    assert_ok!(channel.handle_event(opened(1)));
    assert_ok!(channel.handle_event(message(1, subscribed("trades", 11, "tETHUSD"))));
    assert_ok!(channel.handle_event(message(1, subscribed("ticker", 10, "tBTCUSD"))));

    assert_ok!(channel.handle_event(closed(1)));
    assert_eq!(channel.generation(), 2);
    assert!(channel.subscriptions().is_empty());
    assert_eq!(channel.queued_len(), 2);
    assert_eq!(connector.opens().len(), 2);

    assert_ok!(channel.handle_event(opened(2)));
    let replayed: Vec<Value> = connector
        .sent_on(2)
        .iter()
        .map(|text| serde_json::from_str(text).unwrap())
        .collect();
    assert_eq!(replayed.len(), 2);
    assert_eq!(replayed[0]["channel"], "ticker");
    assert_eq!(replayed[1]["channel"], "trades");
    for frame in &replayed {
        assert_eq!(frame["event"], "subscribe");
        assert!(frame.get("chanId").is_none());
    }
    assert_eq!(replayed[0]["symbol"], "tBTCUSD");
    assert_eq!(replayed[1]["symbol"], "tETHUSD");
}

#[test]
fn test_queued_requests_survive_failed_connect() {
    let (mut channel, connector) = market_channel();
    assert_ok!(channel.subscribe_to_ticker("tBTCUSD"));
    assert_ok!(channel.handle_event(closed(1)));
    assert_eq!(channel.queued_len(), 1);

    assert_ok!(channel.handle_event(opened(2)));
    assert_eq!(connector.sent_on(2).len(), 1);
}

#[test]
fn test_stale_generation_events_are_ignored() {
    let (mut channel, _connector) = market_channel();
    assert_ok!(channel.handle_event(opened(1)));
    assert_ok!(channel.handle_event(closed(1)));

    assert_ok!(channel.handle_event(message(1, subscribed("ticker", 5, "tBTCUSD"))));
    assert_ok!(channel.handle_event(closed(1)));
    assert!(channel.subscriptions().is_empty());
    assert_eq!(channel.generation(), 2);
}

#[test]
fn test_close_without_reconnect_is_terminal() {
    let config = MarketDataConfig::default().with_reconnect(false);
    let (mut channel, connector) = market_channel_with(config);
    assert_ok!(channel.handle_event(opened(1)));
    assert_ok!(channel.handle_event(closed(1)));

    assert!(channel.is_closed());
    assert_eq!(connector.opens().len(), 1);
    assert!(matches!(channel.subscribe_to_ticker("tBTCUSD"), Err(BitfinexError::Closed)));
}

#[test]
fn test_caller_close_notifies_and_stops() {
    let (channel, connector) = market_channel();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut channel = channel.with_handler(tx);
    assert_ok!(channel.handle_event(opened(1)));

    channel.close();
    channel.close();

    assert_eq!(connector.terminated(), vec![1]);
    assert_eq!(drain_events(&mut rx), vec![FeedEvent::Opened, FeedEvent::Closed]);
    assert!(matches!(channel.unsubscribe(1), Err(BitfinexError::Closed)));

    assert_ok!(channel.handle_event(closed(1)));
    assert_eq!(connector.opens().len(), 1);
}

#[test]
fn test_every_message_is_forwarded() {
    let (channel, _connector) = market_channel();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut channel = channel.with_handler(tx);
    assert_ok!(channel.handle_event(opened(1)));

    let ack = subscribed("ticker", 3, "tBTCUSD");
    let update = json!([3, [7000.1, 10.5, 7000.2, 12.1, -20.0, -0.003, 7000.0, 1200.5, 7100.0, 6900.0]]);
    let heartbeat = json!([3, "hb"]);
    assert_ok!(channel.handle_event(message(1, ack.clone())));
    assert_ok!(channel.handle_event(message(1, update.clone())));
    assert_ok!(channel.handle_event(message(1, heartbeat.clone())));

    assert_eq!(
        drain_events(&mut rx),
        vec![
            FeedEvent::Opened,
            FeedEvent::Message(ack),
            FeedEvent::Message(update),
            FeedEvent::Message(heartbeat),
        ]
    );
}

#[rstest]
#[case::ticker(
    |c: &mut MarketDataChannel<RecordingConnector>| c.subscribe_to_ticker("tBTCUSD"),
    json!({"event": "subscribe", "channel": "ticker", "symbol": "tBTCUSD"})
)]
#[case::trades(
    |c: &mut MarketDataChannel<RecordingConnector>| c.subscribe_to_trades("tBTCUSD"),
    json!({"event": "subscribe", "channel": "trades", "symbol": "tBTCUSD"})
)]
#[case::raw_books(
    |c: &mut MarketDataChannel<RecordingConnector>| c.subscribe_to_raw_books("tBTCUSD", 100),
    json!({"event": "subscribe", "channel": "book", "symbol": "tBTCUSD", "prec": "R0", "len": 100})
)]
#[case::candles(
    |c: &mut MarketDataChannel<RecordingConnector>| c.subscribe_to_candles("tBTCUSD", CandleTimeframe::OneHour),
    json!({"event": "subscribe", "channel": "candles", "key": "trade:1h:tBTCUSD"})
)]
#[case::status(
    |c: &mut MarketDataChannel<RecordingConnector>| c.subscribe_to_status("deriv:tBTCF0:USTF0"),
    json!({"event": "subscribe", "channel": "status", "key": "deriv:tBTCF0:USTF0"})
)]
fn test_channel_wrappers(
    #[case] subscribe: fn(&mut MarketDataChannel<RecordingConnector>) -> bitfinex_ws_adapter::Result<()>,
    #[case] expected: Value,
) {
    let (mut channel, connector) = market_channel();
    assert_ok!(channel.handle_event(opened(1)));
    assert_ok!(subscribe(&mut channel));
    assert_eq!(connector.sent_json(), vec![expected]);
}
