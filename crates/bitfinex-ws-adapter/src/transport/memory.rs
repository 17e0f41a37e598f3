/*
[INPUT]:  Outbound frames and open requests from the feed state machines
[OUTPUT]: Recorded opens, sends and terminations for inspection
[POS]:    Transport layer - in-process transport for tests and dry runs
[UPDATE]: When the Transport/Connector contract changes
*/

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::Value;

use super::{Connector, Generation, Transport};
use crate::error::{BitfinexError, Result};

/// One call to [`Connector::open`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenRecord {
    pub url: String,
    pub generation: Generation,
    pub delay: Duration,
}

#[derive(Debug, Default)]
struct Recorded {
    opens: Vec<OpenRecord>,
    sent: Vec<(Generation, String)>,
    terminated: Vec<Generation>,
    reject_sends: bool,
}

/// Connector that never touches the network
///
/// Clones share one log, so a test can keep a clone after handing the
/// connector to a feed and inspect what the feed did. Events are injected
/// by calling `handle_event` on the feed directly.
#[derive(Debug, Clone, Default)]
pub struct RecordingConnector {
    inner: Arc<Mutex<Recorded>>,
}

impl RecordingConnector {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn opens(&self) -> Vec<OpenRecord> {
        self.lock().opens.clone()
    }

    /// Every frame sent, across generations, oldest first
    pub fn sent(&self) -> Vec<String> {
        self.lock().sent.iter().map(|(_, text)| text.clone()).collect()
    }

    /// Sent frames parsed as JSON; unparseable frames are skipped
    pub fn sent_json(&self) -> Vec<Value> {
        self.lock()
            .sent
            .iter()
            .filter_map(|(_, text)| serde_json::from_str(text).ok())
            .collect()
    }

    pub fn sent_on(&self, generation: Generation) -> Vec<String> {
        self.lock()
            .sent
            .iter()
            .filter(|(g, _)| *g == generation)
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn terminated(&self) -> Vec<Generation> {
        self.lock().terminated.clone()
    }

    pub fn clear_sent(&self) {
        self.lock().sent.clear();
    }

    /// Make every later `send` fail with a transport error
    pub fn reject_sends(&self, reject: bool) {
        self.lock().reject_sends = reject;
    }
}

impl Connector for RecordingConnector {
    type Transport = RecordingTransport;

    fn open(&mut self, url: &str, generation: Generation, delay: Duration) -> Result<RecordingTransport> {
        self.lock().opens.push(OpenRecord {
            url: url.to_string(),
            generation,
            delay,
        });
        Ok(RecordingTransport {
            generation,
            inner: Arc::clone(&self.inner),
        })
    }
}

#[derive(Debug)]
pub struct RecordingTransport {
    generation: Generation,
    inner: Arc<Mutex<Recorded>>,
}

impl Transport for RecordingTransport {
    fn send(&mut self, text: String) -> Result<()> {
        let mut recorded = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if recorded.reject_sends {
            return Err(BitfinexError::Transport("send rejected".to_string()));
        }
        recorded.sent.push((self.generation, text));
        Ok(())
    }

    fn terminate(&mut self) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .terminated
            .push(self.generation);
    }
}
