/*
[INPUT]:  Connector, URL, reconnect flag and policy
[OUTPUT]: Generation-aware connection bookkeeping shared by both feeds
[POS]:    WebSocket layer - owns the live transport and reconnect decisions
[UPDATE]: When changing reconnect rules or connection states
*/

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{BitfinexError, Result};
use crate::transport::{Connector, Generation, ReconnectPolicy, Transport};

/// Lifecycle of a feed connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Transport requested, not open yet
    Connecting,
    Open,
    /// Closed for good; no further reconnects
    Closed,
}

/// One feed's view of its transport
///
/// Every (re)connect bumps the generation; events tagged with any other
/// generation are stale and must be dropped by the caller.
pub(crate) struct Connection<C: Connector> {
    feed: &'static str,
    url: String,
    connector: C,
    transport: Option<C::Transport>,
    generation: Generation,
    state: ConnectionState,
    must_reconnect: bool,
    policy: ReconnectPolicy,
    attempts: u32,
}

impl<C: Connector> Connection<C> {
    /// Create the connection and request the first transport
    pub(crate) fn open(
        feed: &'static str,
        url: String,
        connector: C,
        must_reconnect: bool,
        policy: ReconnectPolicy,
    ) -> Result<Self> {
        let mut connection = Self {
            feed,
            url,
            connector,
            transport: None,
            generation: 0,
            state: ConnectionState::Connecting,
            must_reconnect,
            policy,
            attempts: 0,
        };
        connection.start(Duration::ZERO)?;
        Ok(connection)
    }

    fn start(&mut self, delay: Duration) -> Result<()> {
        self.generation += 1;
        info!(
            feed = self.feed,
            generation = self.generation,
            delay_ms = delay.as_millis() as u64,
            url = %self.url,
            "ws connecting"
        );
        match self.connector.open(&self.url, self.generation, delay) {
            Ok(transport) => {
                self.transport = Some(transport);
                self.state = ConnectionState::Connecting;
                Ok(())
            }
            Err(err) => {
                warn!(feed = self.feed, generation = self.generation, error = %err, "ws open failed");
                self.state = ConnectionState::Closed;
                Err(err)
            }
        }
    }

    /// Check whether an event from `generation` belongs to the live transport
    pub(crate) fn accepts(&self, generation: Generation) -> bool {
        self.state != ConnectionState::Closed && generation == self.generation
    }

    pub(crate) fn mark_open(&mut self) {
        self.state = ConnectionState::Open;
        self.attempts = 0;
        info!(feed = self.feed, generation = self.generation, "ws connected");
    }

    /// Handle a close of the live transport
    ///
    /// Returns `true` when a new generation was requested.
    pub(crate) fn handle_close(&mut self) -> Result<bool> {
        if let Some(mut transport) = self.transport.take() {
            transport.terminate();
        }

        if !self.must_reconnect {
            self.state = ConnectionState::Closed;
            info!(feed = self.feed, generation = self.generation, "ws closed");
            return Ok(false);
        }

        let delay = self.policy.delay_for(self.attempts);
        self.attempts = self.attempts.saturating_add(1);
        debug!(feed = self.feed, attempt = self.attempts, "ws reconnect scheduled");
        self.start(delay)?;
        Ok(true)
    }

    pub(crate) fn send(&mut self, text: String) -> Result<()> {
        match self.state {
            ConnectionState::Closed => Err(BitfinexError::Closed),
            ConnectionState::Connecting => Err(BitfinexError::NotConnected),
            ConnectionState::Open => match self.transport.as_mut() {
                Some(transport) => transport.send(text),
                None => Err(BitfinexError::NotConnected),
            },
        }
    }

    /// Stop for good: no reconnect, transport terminated
    pub(crate) fn close(&mut self) {
        self.must_reconnect = false;
        if let Some(mut transport) = self.transport.take() {
            transport.terminate();
        }
        self.state = ConnectionState::Closed;
        info!(feed = self.feed, generation = self.generation, "ws closed by caller");
    }

    pub(crate) fn ensure_not_closed(&self) -> Result<()> {
        if self.state == ConnectionState::Closed {
            Err(BitfinexError::Closed)
        } else {
            Ok(())
        }
    }

    pub(crate) fn feed(&self) -> &'static str {
        self.feed
    }

    pub(crate) fn state(&self) -> ConnectionState {
        self.state
    }

    pub(crate) fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    pub(crate) fn generation(&self) -> Generation {
        self.generation
    }

    pub(crate) fn must_reconnect(&self) -> bool {
        self.must_reconnect
    }
}
