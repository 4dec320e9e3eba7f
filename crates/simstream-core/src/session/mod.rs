//! Streaming session
//!
//! The single long-lived entity for one connection:
//! - `machine`: transition logic and host projection
//! - `state`: lifecycle, run mode, clock and catalog
//! - `events` / `event_bus`: typed event stream for observers
//! - `ready`: one-shot scene-ready continuation

mod event_bus;
mod events;
mod machine;
mod ready;
mod state;

pub use event_bus::SessionEventBus;
pub use events::{CloseReport, DiagnosticKind, SessionEvent};
pub use machine::StreamSession;
pub use ready::{ReadyContinuation, ReadySlot};
pub use state::{PauseOrigin, SessionState, TransportState};
