//! Wire protocol
//!
//! Text frames in both directions, one message per frame:
//! - Server to client: tagged telemetry decoded by [`decode`]
//! - Client to server: the mode handshake and `timeout:` re-arms

pub mod close;
mod decoder;
mod messages;
mod mode;

pub use decoder::{decode, DecodeError};
pub use messages::{ConsoleChannel, LoadProgress, RunMode, ServerMessage, WorldCatalog};
pub use mode::{timeout_message, StreamMode, ViewMode, Viewport, TOOLBAR_HEIGHT};
