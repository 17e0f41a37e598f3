/*
[INPUT]:  Feed configuration, shutdown token
[OUTPUT]: Running public and trading feeds with every inbound message logged
[POS]:    Runtime layer - drives both feed state machines from socket events
[UPDATE]: When changing event dispatch or shutdown ordering
*/

use anyhow::Context;
use bitfinex_ws_adapter::{
    BitfinexError, FeedHandler, GenerationEvent, MarketDataChannel, TradingSession,
    TungsteniteConnector,
};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::FeedConfig;

/// Logs every notification a feed produces
#[derive(Debug)]
pub struct LogHandler {
    feed: &'static str,
    messages: u64,
}

impl LogHandler {
    pub fn new(feed: &'static str) -> Self {
        Self { feed, messages: 0 }
    }
}

impl FeedHandler for LogHandler {
    fn on_open(&mut self) {
        info!(feed = self.feed, "feed open");
    }

    fn on_message(&mut self, message: &Value) {
        self.messages += 1;
        info!(feed = self.feed, seq = self.messages, message = %message, "feed message");
    }

    fn on_close(&mut self) {
        info!(feed = self.feed, messages = self.messages, "feed closed");
    }

    fn on_error(&mut self, error: &str) {
        warn!(feed = self.feed, error, "feed error");
    }
}

async fn next_event(
    rx: Option<&mut mpsc::UnboundedReceiver<GenerationEvent>>,
) -> Option<GenerationEvent> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

fn report(feed: &str, result: bitfinex_ws_adapter::Result<()>) {
    match result {
        Ok(()) => {}
        Err(BitfinexError::Serialization(err)) => {
            warn!(feed, error = %err, "dropped unparseable frame");
        }
        Err(err) => warn!(feed, error = %err, "feed event failed"),
    }
}

/// Run both feeds until `shutdown` fires or every feed has closed for good
pub async fn run(config: FeedConfig, shutdown: CancellationToken) -> anyhow::Result<()> {
    let trading_config = config.trading_config()?;

    let (public_connector, mut public_rx) = TungsteniteConnector::new();
    let mut market = MarketDataChannel::new(config.market_data_config(), public_connector)
        .context("start public feed")?
        .with_handler(LogHandler::new("public"));
    for subscription in &config.public.subscriptions {
        subscription
            .apply(&mut market)
            .with_context(|| format!("subscribe {subscription:?}"))?;
    }
    info!(
        subscriptions = config.public.subscriptions.len(),
        "public feed started"
    );

    let mut trading = match trading_config {
        Some(trading_config) => {
            let (connector, rx) = TungsteniteConnector::new();
            let session = TradingSession::new(trading_config, connector)
                .context("start trading feed")?
                .with_handler(LogHandler::new("private"));
            info!("trading feed started");
            Some((session, rx))
        }
        None => None,
    };

    loop {
        let trading_done = trading
            .as_ref()
            .is_none_or(|(session, _)| session.is_closed());
        if market.is_closed() && trading_done {
            info!("all feeds closed");
            break;
        }

        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("shutdown requested");
                break;
            }
            Some(event) = public_rx.recv() => {
                report("public", market.handle_event(event));
            }
            Some(event) = next_event(trading.as_mut().map(|(_, rx)| rx)) => {
                if let Some((session, _)) = trading.as_mut() {
                    report("private", session.handle_event(event));
                }
            }
        }
    }

    market.close();
    if let Some((session, _)) = trading.as_mut() {
        session.close();
    }
    info!("feeds stopped");
    Ok(())
}
