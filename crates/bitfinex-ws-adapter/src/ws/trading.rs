/*
[INPUT]:  Credentials, order/offer/calc requests, transport events
[OUTPUT]: Signed auth handshake and `[0, op, null, payload]` command frames
[POS]:    WebSocket layer - authenticated trading session
[UPDATE]: When adding commands or changing the auth flow
*/

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::connection::{Connection, ConnectionState};
use super::handler::FeedHandler;
use crate::auth::{Authenticator, HmacSha384Signer, PayloadSigner};
use crate::config::TradingConfig;
use crate::error::{BitfinexError, Result};
use crate::transport::{Connector, Generation, GenerationEvent, TransportEvent};
use crate::types::{
    CalcRequest, CancelOfferRequest, CancelOrderMultiRequest, CancelOrderRequest, Envelope,
    NewOfferRequest, NewOrderRequest, OpCode, OrderOperation, UpdateOrderRequest,
};

const FEED: &str = "private";

fn client_id_now() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default()
}

/// Authenticated trading session
///
/// Authenticates on every transport open, including reconnects. Commands are
/// validated before anything is sent and are never replayed after a reconnect.
pub struct TradingSession<C: Connector> {
    connection: Connection<C>,
    auth: Authenticator,
    handler: Option<Box<dyn FeedHandler>>,
    authenticated: bool,
}

impl<C: Connector> TradingSession<C> {
    /// Validate `config`, build the HMAC-SHA384 signer and request the first transport
    pub fn new(config: TradingConfig, connector: C) -> Result<Self> {
        let signer = HmacSha384Signer::new(&config.api_secret)?;
        Self::with_signer(config, Box::new(signer), connector)
    }

    /// Like [`TradingSession::new`] with a caller-supplied signer
    pub fn with_signer(
        config: TradingConfig,
        signer: Box<dyn PayloadSigner>,
        connector: C,
    ) -> Result<Self> {
        config.validate()?;
        let TradingConfig {
            url,
            api_key,
            filter,
            must_reconnect,
            reconnect,
            ..
        } = config;

        let connection = Connection::open(FEED, url, connector, must_reconnect, reconnect)?;
        Ok(Self {
            connection,
            auth: Authenticator::new(api_key, signer, filter),
            handler: None,
            authenticated: false,
        })
    }

    pub fn with_handler(mut self, handler: impl FeedHandler + 'static) -> Self {
        self.handler = Some(Box::new(handler));
        self
    }

    pub fn set_handler(&mut self, handler: impl FeedHandler + 'static) {
        self.handler = Some(Box::new(handler));
    }

    /// Send a freshly signed auth message on the live transport
    pub fn authenticate(&mut self) -> Result<()> {
        let message = self.auth.auth_message();
        let text = serde_json::to_string(&message)?;
        self.connection.send(text)?;
        info!(
            feed = FEED,
            generation = self.connection.generation(),
            nonce = message.auth_nonce,
            "ws auth sent"
        );
        Ok(())
    }

    /// Submit a new order
    ///
    /// Group id, client id and affiliate meta are filled in when unset.
    pub fn new_order(&mut self, request: NewOrderRequest) -> Result<()> {
        request.validate()?;
        let order = request.with_defaults(client_id_now());
        self.send_command(OpCode::NewOrder, &order)
    }

    pub fn update_order(&mut self, request: UpdateOrderRequest) -> Result<()> {
        request.validate()?;
        self.send_command(OpCode::UpdateOrder, &request)
    }

    /// Submit a batch of order operations in one frame, preserving order
    pub fn order_multi(&mut self, operations: Vec<OrderOperation>) -> Result<()> {
        if operations.is_empty() {
            return Err(BitfinexError::Validation(
                "order multi: at least one operation is required".into(),
            ));
        }
        for operation in &operations {
            operation.validate()?;
        }

        let base_cid = client_id_now();
        let operations: Vec<OrderOperation> = operations
            .into_iter()
            .enumerate()
            .map(|(index, operation)| match operation {
                OrderOperation::New(order) => {
                    OrderOperation::New(order.with_defaults(base_cid + index as u64))
                }
                other => other,
            })
            .collect();

        self.send_command(OpCode::OrderMulti, &operations)
    }

    pub fn cancel_order(&mut self, request: CancelOrderRequest) -> Result<()> {
        request.validate()?;
        self.send_command(OpCode::CancelOrder, &request)
    }

    pub fn cancel_order_multi(&mut self, request: CancelOrderMultiRequest) -> Result<()> {
        request.validate()?;
        self.send_command(OpCode::CancelOrderMulti, &request)
    }

    pub fn new_offer(&mut self, request: NewOfferRequest) -> Result<()> {
        request.validate()?;
        self.send_command(OpCode::NewOffer, &request)
    }

    pub fn cancel_offer(&mut self, request: CancelOfferRequest) -> Result<()> {
        request.validate()?;
        self.send_command(OpCode::CancelOffer, &request)
    }

    /// Request recalculation of margin, position, wallet or balance figures
    pub fn calc(&mut self, requests: Vec<CalcRequest>) -> Result<()> {
        if requests.is_empty() {
            return Err(BitfinexError::Validation(
                "calc: at least one request is required".into(),
            ));
        }
        for request in &requests {
            request.validate()?;
        }
        self.send_command(OpCode::Calc, &requests)
    }

    fn send_command<T: Serialize>(&mut self, op: OpCode, payload: &T) -> Result<()> {
        let text = serde_json::to_string(&Envelope::new(op, payload))?;
        self.connection.send(text)?;
        debug!(feed = FEED, op = op.as_str(), "ws command sent");
        Ok(())
    }

    /// Feed one transport event into the session
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
            TransportEvent::Opened => {
                self.connection.mark_open();
                if let Some(handler) = self.handler.as_mut() {
                    handler.on_open();
                }
                self.authenticate()
            }
            TransportEvent::Message(text) => self.on_message(&text),
            TransportEvent::Closed => {
                self.authenticated = false;
                if let Some(handler) = self.handler.as_mut() {
                    handler.on_close();
                }
                self.connection.handle_close().map(|_| ())
            }
            TransportEvent::Error(error) => {
                warn!(feed = FEED, generation = event.generation, error = %error, "ws error");
                if let Some(handler) = self.handler.as_mut() {
                    handler.on_error(&error);
                }
                Ok(())
            }
        }
    }

    fn on_message(&mut self, text: &str) -> Result<()> {
        let value: Value = serde_json::from_str(text)?;

        if value.get("event").and_then(Value::as_str) == Some("auth") {
            match value.get("status").and_then(Value::as_str) {
                Some("OK") => {
                    self.authenticated = true;
                    let user_id = value.get("userId").and_then(Value::as_u64);
                    info!(feed = FEED, user_id, "ws authenticated");
                }
                _ => {
                    self.authenticated = false;
                    let reason = value.get("msg").and_then(Value::as_str).unwrap_or_default();
                    warn!(feed = FEED, reason, "ws auth rejected");
                }
            }
        }

        if let Some(handler) = self.handler.as_mut() {
            handler.on_message(&value);
        }
        Ok(())
    }

    /// Stop the session for good
    pub fn close(&mut self) {
        if self.connection.state() == ConnectionState::Closed {
            return;
        }
        self.connection.close();
        self.authenticated = false;
        if let Some(handler) = self.handler.as_mut() {
            handler.on_close();
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_open()
    }

    /// Whether the server accepted the auth handshake on the live transport
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn is_closed(&self) -> bool {
        self.connection.state() == ConnectionState::Closed
    }

    pub fn generation(&self) -> Generation {
        self.connection.generation()
    }

    pub fn api_key(&self) -> &str {
        self.auth.api_key()
    }
}

impl<C: Connector> std::fmt::Debug for TradingSession<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TradingSession")
            .field("auth", &self.auth)
            .field("state", &self.connection.state())
            .field("generation", &self.connection.generation())
            .field("authenticated", &self.authenticated)
            .finish_non_exhaustive()
    }
}
