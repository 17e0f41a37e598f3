/*
[INPUT]:  Symbol identifier (e.g., "tBTCUSD")
[OUTPUT]: Ticker, trades and book frames printed as they arrive
[POS]:    Examples - public market data feed
[UPDATE]: When adding new channel wrappers
*/

use bitfinex_ws_adapter::*;
use tokio::sync::mpsc;

/// Example: Stream public market data (no authentication required)
///
/// Subscriptions made before the socket opens are queued and sent on open.
#[tokio::main]
async fn main() {
    println!("=== Bitfinex Market Data Example ===\n");

    let (connector, mut transport_events) = TungsteniteConnector::new();
    let (feed_tx, mut feed_rx) = mpsc::unbounded_channel();

    let mut channel = match MarketDataChannel::new(MarketDataConfig::default(), connector) {
        Ok(channel) => channel.with_handler(feed_tx),
        Err(e) => {
            eprintln!("Failed to create channel: {}", e);
            return;
        }
    };

    let symbol = "tBTCUSD";
    for result in [
        channel.subscribe_to_ticker(symbol),
        channel.subscribe_to_trades(symbol),
        channel.subscribe_to_books(symbol, BookOptions::default()),
    ] {
        if let Err(e) = result {
            eprintln!("✗ Subscribe failed: {}", e);
        }
    }
    println!("✓ {} subscriptions queued\n", channel.queued_len());

    let mut printed = 0;
    while printed < 20 {
        tokio::select! {
            Some(event) = transport_events.recv() => {
                if let Err(e) = channel.handle_event(event) {
                    println!("✗ Error: {}", e);
                }
            }
            Some(event) = feed_rx.recv() => {
                match event {
                    FeedEvent::Opened => println!("✓ Connected"),
                    FeedEvent::Message(message) => {
                        println!("{}", message);
                        printed += 1;
                    }
                    FeedEvent::Closed => println!("✗ Connection closed"),
                    FeedEvent::Error(error) => println!("✗ Error: {}", error),
                }
            }
        }
    }

    println!("\n✓ {} active subscriptions", channel.subscriptions().len());
    channel.close();
    println!("✓ Market data example complete");
}
