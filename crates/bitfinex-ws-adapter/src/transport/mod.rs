/*
[INPUT]:  URLs, outbound text frames, generation numbers
[OUTPUT]: Generation-tagged open/message/close/error events
[POS]:    Transport layer - seam between the feed state machines and sockets
[UPDATE]: When adding transports or changing the event contract
*/

use std::time::Duration;

use crate::error::Result;

pub mod memory;
pub mod reconnect;
pub mod tungstenite;

pub use memory::{OpenRecord, RecordingConnector, RecordingTransport};
pub use reconnect::ReconnectPolicy;
pub use tungstenite::{TungsteniteConnector, TungsteniteTransport};

/// Identifies one transport instance; bumped on every (re)connect
pub type Generation = u64;

/// Something that happened on a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Opened,
    Message(String),
    Closed,
    Error(String),
}

/// A transport event tagged with the generation that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationEvent {
    pub generation: Generation,
    pub event: TransportEvent,
}

impl GenerationEvent {
    pub fn new(generation: Generation, event: TransportEvent) -> Self {
        Self { generation, event }
    }
}

/// Live handle to one connection attempt
pub trait Transport: Send {
    /// Queue a text frame; never waits for the peer
    fn send(&mut self, text: String) -> Result<()>;

    /// Drop the connection without a close handshake
    fn terminate(&mut self);
}

/// Opens transports
///
/// Events produced by the returned transport must carry `generation`.
/// The connector waits `delay` before dialing.
pub trait Connector: Send {
    type Transport: Transport;

    fn open(
        &mut self,
        url: &str,
        generation: Generation,
        delay: Duration,
    ) -> Result<Self::Transport>;
}
