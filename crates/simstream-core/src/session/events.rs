//! Session events
//!
//! Events that occur during a streaming session.

use serde::Serialize;

use crate::protocol::{LoadProgress, RunMode, WorldCatalog};

/// Events during a streaming session
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Connection open, handshake sent
    Opened { handshake: String },
    RunModeChanged { mode: RunMode },
    ClockUpdated { time: f64 },
    DeadlineUpdated { deadline: f64 },
    ProgressUpdated { progress: LoadProgress },
    WorldListUpdated { catalog: WorldCatalog },
    SceneReady,
    SceneReset,
    WorldTornDown,
    /// Transport reported an error
    TransportError { detail: String },
    Closed(CloseReport),
    /// Something was dropped or went unhandled
    Diagnostic { kind: DiagnosticKind, detail: String },
}

/// Non-fatal problems, reported but never escalated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Frame matched a rule but a field failed to parse
    MalformedMessage,
    /// Scene frame nobody handled
    UnhandledMessage,
    /// Frame received while not open
    UnexpectedFrame,
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CloseReport {
    pub code: u16,
    pub abnormal: bool,
    pub client_initiated: bool,
}
