/*
[INPUT]:  Subscription requests, transport events
[OUTPUT]: Subscribe/unsubscribe frames, subscription bookkeeping, handler calls
[POS]:    WebSocket layer - public market data feed with capacity and replay
[UPDATE]: When changing subscription lifecycle or adding channel wrappers
*/

use serde_json::Value;
use tracing::{debug, info, warn};

use super::connection::{Connection, ConnectionState};
use super::handler::FeedHandler;
use crate::config::MarketDataConfig;
use crate::error::{BitfinexError, Result};
use crate::transport::{Connector, Generation, GenerationEvent, TransportEvent};
use crate::types::{
    BookFrequency, BookPrecision, CandleTimeframe, ChannelParams, InboundEvent, SubscribeRequest,
    SubscriptionRecord, UnsubscribeMessage,
};

const FEED: &str = "public";

/// Order book subscription options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookOptions {
    pub precision: BookPrecision,
    pub frequency: BookFrequency,
    pub len: u32,
}

impl Default for BookOptions {
    fn default() -> Self {
        Self {
            precision: BookPrecision::P0,
            frequency: BookFrequency::F0,
            len: 25,
        }
    }
}

fn params<const N: usize>(entries: [(&str, Value); N]) -> ChannelParams {
    entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

/// Public market data feed
///
/// Subscriptions move through three stages: queued while the transport is
/// not open, connecting once sent, and connected after the server acks with a
/// channel id. At most `capacity` subscriptions exist across all three stages.
/// When the transport closes and reconnect is enabled, every connected
/// subscription is replayed on the next transport.
pub struct MarketDataChannel<C: Connector> {
    connection: Connection<C>,
    capacity: usize,
    queued: Vec<SubscribeRequest>,
    connecting: usize,
    connected: Vec<SubscriptionRecord>,
    handler: Option<Box<dyn FeedHandler>>,
}

impl<C: Connector> MarketDataChannel<C> {
    /// Validate `config` and request the first transport
    pub fn new(config: MarketDataConfig, connector: C) -> Result<Self> {
        config.validate()?;
        let connection = Connection::open(
            FEED,
            config.url,
            connector,
            config.must_reconnect,
            config.reconnect,
        )?;

        Ok(Self {
            connection,
            capacity: config.capacity,
            queued: Vec::new(),
            connecting: 0,
            connected: Vec::new(),
            handler: None,
        })
    }

    pub fn with_handler(mut self, handler: impl FeedHandler + 'static) -> Self {
        self.handler = Some(Box::new(handler));
        self
    }

    pub fn set_handler(&mut self, handler: impl FeedHandler + 'static) {
        self.handler = Some(Box::new(handler));
    }

    /// Subscribe to `channel` with arbitrary parameters
    ///
    /// Queued until the transport opens; sent immediately otherwise.
    ///
    /// The queue is drained newest first on open, and each request is
    /// admitted against queued + pending + acknowledged channels, the
    /// not-yet-sent ones included. When more than `capacity` requests are
    /// queued, the newest ones are therefore the ones dropped, and
    /// [`handle_event`](Self::handle_event) reports
    /// [`BitfinexError::CapacityExceeded`] for that open.
    pub fn subscribe_to(&mut self, channel: &str, params: ChannelParams) -> Result<()> {
        self.connection.ensure_not_closed()?;
        let request = SubscribeRequest::new(channel, params);

        if !self.connection.is_open() {
            debug!(feed = FEED, channel, queued = self.queued.len() + 1, "subscription queued");
            self.queued.push(request);
            return Ok(());
        }

        self.send_subscribe(&request)
    }

    pub fn subscribe_to_ticker(&mut self, symbol: &str) -> Result<()> {
        self.subscribe_to("ticker", params([("symbol", Value::from(symbol))]))
    }

    pub fn subscribe_to_trades(&mut self, symbol: &str) -> Result<()> {
        self.subscribe_to("trades", params([("symbol", Value::from(symbol))]))
    }

    pub fn subscribe_to_books(&mut self, symbol: &str, options: BookOptions) -> Result<()> {
        self.subscribe_to(
            "book",
            params([
                ("symbol", Value::from(symbol)),
                ("prec", Value::from(options.precision.as_str())),
                ("freq", Value::from(options.frequency.as_str())),
                ("len", Value::from(options.len)),
            ]),
        )
    }

    /// Raw (per-order) book; precision is always `R0`
    pub fn subscribe_to_raw_books(&mut self, symbol: &str, len: u32) -> Result<()> {
        self.subscribe_to(
            "book",
            params([
                ("symbol", Value::from(symbol)),
                ("prec", Value::from(BookPrecision::R0.as_str())),
                ("len", Value::from(len)),
            ]),
        )
    }

    pub fn subscribe_to_candles(&mut self, symbol: &str, timeframe: CandleTimeframe) -> Result<()> {
        let key = format!("trade:{timeframe}:{symbol}");
        self.subscribe_to("candles", params([("key", Value::from(key))]))
    }

    /// Derivatives/liquidation status feed, e.g. `deriv:tBTCF0:USTF0`
    pub fn subscribe_to_status(&mut self, key: &str) -> Result<()> {
        self.subscribe_to("status", params([("key", Value::from(key))]))
    }

    /// Ask the server to drop `chan_id`
    ///
    /// Local bookkeeping only changes when the server confirms.
    pub fn unsubscribe(&mut self, chan_id: u64) -> Result<()> {
        let text = serde_json::to_string(&UnsubscribeMessage::new(chan_id))?;
        self.connection.send(text)?;
        info!(feed = FEED, chan_id, "ws unsubscribe sent");
        Ok(())
    }

    /// Feed one transport event into the state machine
    ///
    /// Events from older generations are ignored. Unparseable frames are
    /// returned as [`BitfinexError::Serialization`] and not forwarded.
    pub fn handle_event(&mut self, event: GenerationEvent) -> Result<()> {
        if !self.connection.accepts(event.generation) {
            debug!(
                feed = FEED,
                generation = event.generation,
                current = self.connection.generation(),
                "stale transport event dropped"
            );
            return Ok(());
        }

        match event.event {
            TransportEvent::Opened => self.on_open(),
            TransportEvent::Message(text) => self.on_message(&text),
            TransportEvent::Closed => self.on_close(),
            TransportEvent::Error(error) => {
                warn!(feed = FEED, generation = event.generation, error = %error, "ws error");
                if let Some(handler) = self.handler.as_mut() {
                    handler.on_error(&error);
                }
                Ok(())
            }
        }
    }

    /// Stop the feed for good
    pub fn close(&mut self) {
        if self.connection.state() == ConnectionState::Closed {
            return;
        }
        self.connection.close();
        self.queued.clear();
        self.connecting = 0;
        self.connected.clear();
        if let Some(handler) = self.handler.as_mut() {
            handler.on_close();
        }
    }

    fn in_use(&self) -> usize {
        self.queued.len() + self.connecting + self.connected.len()
    }

    fn send_subscribe(&mut self, request: &SubscribeRequest) -> Result<()> {
        if self.in_use() >= self.capacity {
            warn!(
                feed = FEED,
                channel = %request.channel,
                limit = self.capacity,
                "subscription rejected at capacity"
            );
            return Err(BitfinexError::CapacityExceeded {
                limit: self.capacity,
            });
        }

        self.connection.send(request.to_message().to_string())?;
        self.connecting += 1;
        info!(feed = FEED, channel = %request.channel, "ws subscribe sent");
        Ok(())
    }

    fn on_open(&mut self) -> Result<()> {
        self.connection.mark_open();
        if let Some(handler) = self.handler.as_mut() {
            handler.on_open();
        }

        let mut rejected = 0usize;
        while let Some(request) = self.queued.pop() {
            match self.send_subscribe(&request) {
                Ok(()) => {}
                Err(BitfinexError::CapacityExceeded { .. }) => {
                    rejected += 1;
                    if let Some(handler) = self.handler.as_mut() {
                        handler.on_error(&format!(
                            "subscription to {} dropped: channel limit {} reached",
                            request.channel, self.capacity
                        ));
                    }
                }
                Err(err) => {
                    self.queued.push(request);
                    return Err(err);
                }
            }
        }

        if rejected > 0 {
            return Err(BitfinexError::CapacityExceeded {
                limit: self.capacity,
            });
        }
        Ok(())
    }

    fn on_message(&mut self, text: &str) -> Result<()> {
        let value: Value = serde_json::from_str(text)?;

        match InboundEvent::classify(&value) {
            InboundEvent::Subscribed(ack) => {
                self.connecting = self.connecting.saturating_sub(1);
                match SubscriptionRecord::from_ack(ack) {
                    Some(record) => {
                        info!(
                            feed = FEED,
                            channel = %record.channel,
                            chan_id = record.chan_id,
                            "ws subscribed"
                        );
                        self.connected.push(record);
                    }
                    None => warn!(feed = FEED, "subscribed ack without channel id"),
                }
            }
            InboundEvent::Unsubscribed {
                chan_id: Some(chan_id),
                ok: true,
            } => match self.connected.iter().position(|record| record.chan_id == chan_id) {
                Some(index) => {
                    let record = self.connected.remove(index);
                    info!(feed = FEED, channel = %record.channel, chan_id, "ws unsubscribed");
                }
                None => debug!(feed = FEED, chan_id, "unsubscribed unknown channel"),
            },
            InboundEvent::Unsubscribed { chan_id, ok: false } => {
                warn!(feed = FEED, ?chan_id, "unsubscribe not confirmed");
            }
            _ => {}
        }

        if let Some(handler) = self.handler.as_mut() {
            handler.on_message(&value);
        }
        Ok(())
    }

    fn on_close(&mut self) -> Result<()> {
        let snapshot = std::mem::take(&mut self.connected);
        let pending = std::mem::take(&mut self.queued);
        self.connecting = 0;

        if let Some(handler) = self.handler.as_mut() {
            handler.on_close();
        }

        if !self.connection.handle_close()? {
            return Ok(());
        }

        info!(
            feed = FEED,
            generation = self.connection.generation(),
            replay = snapshot.len(),
            pending = pending.len(),
            "ws resubscribing after reconnect"
        );
        self.queued = pending;
        self.queued
            .extend(snapshot.iter().map(SubscriptionRecord::to_request));
        Ok(())
    }

    pub fn queued_len(&self) -> usize {
        self.queued.len()
    }

    pub fn connecting_len(&self) -> usize {
        self.connecting
    }

    /// Acknowledged subscriptions, oldest first
    pub fn subscriptions(&self) -> &[SubscriptionRecord] {
        &self.connected
    }

    pub fn find_subscription(&self, chan_id: u64) -> Option<&SubscriptionRecord> {
        self.connected.iter().find(|record| record.chan_id == chan_id)
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_open()
    }

    pub fn is_closed(&self) -> bool {
        self.connection.state() == ConnectionState::Closed
    }

    pub fn generation(&self) -> Generation {
        self.connection.generation()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn feed(&self) -> &'static str {
        self.connection.feed()
    }
}
