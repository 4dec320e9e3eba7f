//! Client driver
//!
//! Connects the transport to a [`StreamSession`] and feeds it notifications
//! strictly one at a time until the session closes.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::StreamConfig;
use crate::error::Result;
use crate::host::StreamHost;
use crate::protocol::close::CLOSE_ABNORMAL;
use crate::session::{CloseReport, StreamSession};
use crate::transport::{self, TransportEvent, TransportHandle};

/// A session bound to a live WebSocket connection
pub struct StreamClient<H: StreamHost> {
    session: StreamSession<H>,
    handle: TransportHandle,
    events: mpsc::UnboundedReceiver<TransportEvent>,
}

impl<H: StreamHost> StreamClient<H> {
    /// Start connecting. Returns immediately; call [`run`](Self::run) to
    /// process the connection.
    pub fn connect(config: &StreamConfig, host: H) -> Result<Self> {
        let endpoint = config.endpoint_url()?;
        let (handle, events) = transport::connect(endpoint);
        let session = StreamSession::new(config, host, Arc::new(handle.clone()))?;
        Ok(Self {
            session,
            handle,
            events,
        })
    }

    pub fn session(&self) -> &StreamSession<H> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut StreamSession<H> {
        &mut self.session
    }

    /// Process notifications until the session closes.
    ///
    /// Cancelling `quit` performs a client-initiated close; the loop keeps
    /// draining until the transport confirms it.
    pub async fn run(&mut self, quit: CancellationToken) -> CloseReport {
        if let Some(report) = self.session.close_report() {
            return report;
        }

        let mut quitting = false;
        loop {
            tokio::select! {
                event = self.events.recv() => match event {
                    Some(event) => {
                        if let Some(report) = self.session.handle_transport(event, quitting) {
                            return report;
                        }
                    }
                    None => {
                        warn!("Transport ended without a close notification");
                        return self.session.on_closed(CLOSE_ABNORMAL, quitting);
                    }
                },
                _ = quit.cancelled(), if !quitting => {
                    info!("Quit requested, closing {}", self.session.endpoint());
                    quitting = true;
                    self.handle.close();
                }
            }
        }
    }
}
