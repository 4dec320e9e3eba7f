//! simstream core
//!
//! Client side of the simulation streaming protocol: one WebSocket to a
//! simulation server, a mode handshake, then tagged text frames carrying
//! clock, pause state, loading progress, world lists and scene updates.
//!
//! ```text
//! TransportEvent ──► StreamSession ──► StreamHost callbacks
//!   (websocket)       │   decode()        (clock, toolbar, progress, ...)
//!                     │
//!                     ├──► SessionEvent stream
//!                     └──► SceneCollaborator (unclassified scene frames)
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod host;
pub mod protocol;
pub mod session;
pub mod transport;

// Re-export commonly used types
pub use client::StreamClient;
pub use config::StreamConfig;
pub use error::{Result, StreamError};
pub use host::{format_clock, CloseAlert, SceneCollaborator, StreamHost};
pub use protocol::{decode, DecodeError, RunMode, ServerMessage, ViewMode, Viewport};
pub use session::{CloseReport, DiagnosticKind, SessionEvent, StreamSession};
pub use transport::{FrameSink, TransportEvent, TransportHandle};
