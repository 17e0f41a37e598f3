/*
[INPUT]:  Lifecycle and message notifications from a feed
[OUTPUT]: Caller-side callbacks or FeedEvents on a channel
[POS]:    WebSocket layer - caller notification seam
[UPDATE]: When adding notification kinds
*/

use serde_json::Value;
use tokio::sync::mpsc;

/// Receives notifications from a feed
///
/// `on_open` and `on_close` fire for every transport, reconnects included.
pub trait FeedHandler: Send {
    fn on_open(&mut self) {}

    /// Every parsed inbound frame, acknowledgments included
    fn on_message(&mut self, _message: &Value) {}

    fn on_close(&mut self) {}

    fn on_error(&mut self, _error: &str) {}
}

/// Owned form of a feed notification
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    Opened,
    Message(Value),
    Closed,
    Error(String),
}

impl FeedHandler for mpsc::UnboundedSender<FeedEvent> {
    fn on_open(&mut self) {
        let _ = self.send(FeedEvent::Opened);
    }

    fn on_message(&mut self, message: &Value) {
        let _ = self.send(FeedEvent::Message(message.clone()));
    }

    fn on_close(&mut self) {
        let _ = self.send(FeedEvent::Closed);
    }

    fn on_error(&mut self, error: &str) {
        let _ = self.send(FeedEvent::Error(error.to_string()));
    }
}
