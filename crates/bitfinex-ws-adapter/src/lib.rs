/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public Bitfinex WebSocket adapter crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod auth;
pub mod config;
pub mod error;
pub mod transport;
pub mod types;
pub mod ws;

// Re-export commonly used types from auth
pub use auth::{Authenticator, HmacSha384Signer, NonceGenerator, PayloadSigner};

pub use config::{MarketDataConfig, TradingConfig, PRIVATE_WS_URL, PUBLIC_WS_URL};
pub use error::{BitfinexError, Result};

// Re-export commonly used types from transport
pub use transport::{
    Connector,
    Generation,
    GenerationEvent,
    ReconnectPolicy,
    RecordingConnector,
    Transport,
    TransportEvent,
    TungsteniteConnector,
};

// Re-export all types
pub use types::*;

// Re-export commonly used types from ws
pub use ws::{
    BookOptions,
    ConnectionState,
    FeedEvent,
    FeedHandler,
    MarketDataChannel,
    TradingSession,
};
