/*
[INPUT]:  WebSocket URL, generation, dial delay, outbound text frames
[OUTPUT]: GenerationEvents pumped from a tokio-tungstenite socket
[POS]:    Transport layer - production WebSocket transport
[UPDATE]: When changing socket handling, frame decoding or shutdown
*/

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, warn};

use super::{Connector, Generation, GenerationEvent, Transport, TransportEvent};
use crate::error::{BitfinexError, Result};

/// Spawns one socket task per connection attempt
///
/// Every task reports into the single receiver returned by [`TungsteniteConnector::new`].
#[derive(Debug, Clone)]
pub struct TungsteniteConnector {
    events: mpsc::UnboundedSender<GenerationEvent>,
}

impl TungsteniteConnector {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<GenerationEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        (Self { events }, rx)
    }
}

impl Connector for TungsteniteConnector {
    type Transport = TungsteniteTransport;

    fn open(
        &mut self,
        url: &str,
        generation: Generation,
        delay: Duration,
    ) -> Result<TungsteniteTransport> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|err| BitfinexError::Transport(format!("no tokio runtime: {err}")))?;

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let task = runtime.spawn(run_socket(
            url.to_string(),
            generation,
            delay,
            outbound_rx,
            self.events.clone(),
        ));

        Ok(TungsteniteTransport {
            generation,
            outbound: outbound_tx,
            task,
        })
    }
}

/// Handle to a spawned socket task
#[derive(Debug)]
pub struct TungsteniteTransport {
    generation: Generation,
    outbound: mpsc::UnboundedSender<String>,
    task: JoinHandle<()>,
}

impl Transport for TungsteniteTransport {
    fn send(&mut self, text: String) -> Result<()> {
        self.outbound.send(text).map_err(|_| {
            BitfinexError::Transport(format!("socket task {} has stopped", self.generation))
        })
    }

    fn terminate(&mut self) {
        self.task.abort();
    }
}

impl Drop for TungsteniteTransport {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn emit(events: &mpsc::UnboundedSender<GenerationEvent>, generation: Generation, event: TransportEvent) {
    let _ = events.send(GenerationEvent::new(generation, event));
}

async fn run_socket(
    url: String,
    generation: Generation,
    delay: Duration,
    mut outbound_rx: mpsc::UnboundedReceiver<String>,
    events: mpsc::UnboundedSender<GenerationEvent>,
) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let ws_stream = match connect_async(url.as_str()).await {
        Ok((stream, _response)) => stream,
        Err(err) => {
            warn!(generation, url = %url, error = %err, "ws connect failed");
            emit(&events, generation, TransportEvent::Error(err.to_string()));
            emit(&events, generation, TransportEvent::Closed);
            return;
        }
    };

    debug!(generation, url = %url, "ws socket open");
    emit(&events, generation, TransportEvent::Opened);
    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            outbound = outbound_rx.recv() => {
                match outbound {
                    Some(text) => {
                        if let Err(err) = write.send(WsMessage::Text(text.into())).await {
                            emit(&events, generation, TransportEvent::Error(err.to_string()));
                            break;
                        }
                    }
                    None => {
                        let _ = write.send(WsMessage::Close(None)).await;
                        break;
                    }
                }
            }
            incoming = read.next() => {
                match incoming {
                    Some(Ok(WsMessage::Text(text))) => {
                        emit(&events, generation, TransportEvent::Message(text.to_string()));
                    }
                    Some(Ok(WsMessage::Binary(bytes))) => match String::from_utf8(bytes.to_vec()) {
                        Ok(text) => emit(&events, generation, TransportEvent::Message(text)),
                        Err(err) => emit(&events, generation, TransportEvent::Error(err.to_string())),
                    },
                    Some(Ok(WsMessage::Close(_))) => {
                        let _ = write.send(WsMessage::Close(None)).await;
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        emit(&events, generation, TransportEvent::Error(err.to_string()));
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    debug!(generation, "ws socket closed");
    emit(&events, generation, TransportEvent::Closed);
}
