/*
[INPUT]:  BFX_API_KEY / BFX_API_SECRET environment variables
[OUTPUT]: Auth result and account snapshots, then a sample order
[POS]:    Examples - authenticated trading session
[UPDATE]: When adding new trading commands
*/

use bitfinex_ws_adapter::*;
use rust_decimal::Decimal;
use tokio::sync::mpsc;

/// Example: Authenticate and place a far-from-market exchange limit order
///
/// WARNING: this places a real order when run with real credentials.
#[tokio::main]
async fn main() {
    println!("=== Bitfinex Trading Example ===\n");

    let (api_key, api_secret) = match (std::env::var("BFX_API_KEY"), std::env::var("BFX_API_SECRET")) {
        (Ok(key), Ok(secret)) => (key, secret),
        _ => {
            eprintln!("Set BFX_API_KEY and BFX_API_SECRET to run this example");
            return;
        }
    };

    let (connector, mut transport_events) = TungsteniteConnector::new();
    let (feed_tx, mut feed_rx) = mpsc::unbounded_channel();
    let config = TradingConfig::new(api_key, api_secret).with_reconnect(false);

    let mut session = match TradingSession::new(config, connector) {
        Ok(session) => session.with_handler(feed_tx),
        Err(e) => {
            eprintln!("Failed to create session: {}", e);
            return;
        }
    };

    let mut order_sent = false;
    let mut frames = 0;
    while frames < 10 {
        tokio::select! {
            Some(event) = transport_events.recv() => {
                if let Err(e) = session.handle_event(event) {
                    println!("✗ Error: {}", e);
                }
            }
            Some(event) = feed_rx.recv() => {
                if let FeedEvent::Message(message) = event {
                    println!("{}", message);
                    frames += 1;
                }
            }
        }

        if session.is_authenticated() && !order_sent {
            let order = NewOrderRequest::new(OrderType::ExchangeLimit, "tBTCUSD", Decimal::new(1, 4))
                .with_price(Decimal::new(1000, 0));
            match session.new_order(order) {
                Ok(()) => println!("✓ Order submitted"),
                Err(e) => println!("✗ Order rejected locally: {}", e),
            }
            order_sent = true;
        }
    }

    session.close();
    println!("\n✓ Trading example complete");
}
