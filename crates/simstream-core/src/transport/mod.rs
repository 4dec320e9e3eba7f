//! Transport adapter
//!
//! Owns the WebSocket and turns it into an ordered stream of
//! [`TransportEvent`]s. Connecting never blocks the caller: [`connect`]
//! returns at once and completion arrives as [`TransportEvent::Opened`].

mod websocket;

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::{Result, StreamError};

/// Notifications delivered to the session, in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Opened,
    Frame(String),
    Closed { code: u16 },
    Error(String),
}

/// Outgoing side of a connection
pub trait FrameSink: Send + Sync {
    fn send_text(&self, text: String) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LinkState {
    Connecting,
    Open,
    Closed,
}

/// Cloneable handle to a running connection
#[derive(Clone)]
pub struct TransportHandle {
    state: Arc<Mutex<LinkState>>,
    outgoing: mpsc::UnboundedSender<String>,
    /// Fired by `close`; watched while connecting and while open
    cancel: CancellationToken,
}

impl TransportHandle {
    /// Queue a text frame. Fails unless the connection is open.
    pub fn send(&self, text: String) -> Result<()> {
        if *self.state.lock() != LinkState::Open {
            return Err(StreamError::NotConnected);
        }
        self.outgoing
            .send(text)
            .map_err(|_| StreamError::NotConnected)
    }

    /// Request an orderly shutdown; `Closed` follows unless already closed
    pub fn close(&self) {
        self.cancel.cancel();
    }

    pub fn is_open(&self) -> bool {
        *self.state.lock() == LinkState::Open
    }
}

impl FrameSink for TransportHandle {
    fn send_text(&self, text: String) -> Result<()> {
        self.send(text)
    }
}

/// Open a WebSocket connection in the background.
///
/// Must be called from within a tokio runtime.
pub fn connect(endpoint: Url) -> (TransportHandle, mpsc::UnboundedReceiver<TransportEvent>) {
    let state = Arc::new(Mutex::new(LinkState::Connecting));
    let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();

    tokio::spawn(websocket::run(
        endpoint,
        Arc::clone(&state),
        outgoing_rx,
        cancel.clone(),
        event_tx,
    ));

    let handle = TransportHandle {
        state,
        outgoing: outgoing_tx,
        cancel,
    };
    (handle, event_rx)
}
