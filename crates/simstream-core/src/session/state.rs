//! Session state tracking

use crate::protocol::{RunMode, WorldCatalog};

use super::events::CloseReport;

/// Coarse connection lifecycle; only ever moves forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    #[default]
    Connecting,
    Open,
    Closed,
}

/// Who paused the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PauseOrigin {
    /// Not known since the last timed pause
    #[default]
    Unset,
    /// The client paused on its own (e.g. watchdog), deadline stays put
    Automatic,
    /// A user-visible pause
    Client,
}

/// Mutable state of one streaming session
#[derive(Debug, Default)]
pub struct SessionState {
    pub transport: TransportState,
    pub run_mode: RunMode,
    /// Last simulation time reported by the server, in ms
    pub sim_time: Option<f64>,
    pub deadline: Option<f64>,
    pub pause_origin: PauseOrigin,
    pub worlds: WorldCatalog,
    /// Set once, when the session closes
    pub close: Option<CloseReport>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connecting -> Open. Returns false if not connecting.
    pub fn open(&mut self) -> bool {
        if self.transport != TransportState::Connecting {
            return false;
        }
        self.transport = TransportState::Open;
        self.run_mode = RunMode::Unknown;
        true
    }

    /// Any state -> Closed, recording the outcome
    pub fn close(&mut self, report: CloseReport) {
        self.transport = TransportState::Closed;
        self.run_mode = RunMode::Unknown;
        self.close = Some(report);
    }

    pub fn is_open(&self) -> bool {
        self.transport == TransportState::Open
    }

    pub fn is_closed(&self) -> bool {
        self.transport == TransportState::Closed
    }
}
