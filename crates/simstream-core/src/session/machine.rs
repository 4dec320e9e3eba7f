//! Streaming session state machine
//!
//! Consumes transport notifications one at a time, updates [`SessionState`],
//! drives the host callbacks and emits [`SessionEvent`]s. Every mutation of
//! session state happens here.

use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

use super::event_bus::SessionEventBus;
use super::events::{CloseReport, DiagnosticKind, SessionEvent};
use super::ready::{ReadyContinuation, ReadySlot};
use super::state::{PauseOrigin, SessionState, TransportState};
use crate::config::StreamConfig;
use crate::error::{Result, StreamError};
use crate::host::{CloseAlert, SceneCollaborator, StreamHost};
use crate::protocol::close::is_abnormal;
use crate::protocol::{
    decode, timeout_message, LoadProgress, RunMode, ServerMessage, StreamMode, ViewMode,
    WorldCatalog,
};
use crate::transport::{FrameSink, TransportEvent};

const CONNECTING_STATUS: &str = "Connecting to simulation server...";

/// One streaming connection from connect to close
pub struct StreamSession<H: StreamHost> {
    endpoint: Url,
    mode: StreamMode,
    timeout_budget: Option<u64>,
    reload_url: Option<String>,
    state: SessionState,
    ready: ReadySlot,
    host: H,
    collaborator: Option<Box<dyn SceneCollaborator + Send>>,
    sink: Arc<dyn FrameSink>,
    events: SessionEventBus,
}

impl<H: StreamHost> StreamSession<H> {
    pub fn new(config: &StreamConfig, mut host: H, sink: Arc<dyn FrameSink>) -> Result<Self> {
        let endpoint = config.endpoint_url()?;
        info!("Stream session created for {}", endpoint);
        host.show_status(CONNECTING_STATUS);
        Ok(Self {
            endpoint,
            mode: config.stream_mode(),
            timeout_budget: config.timeout_ms,
            reload_url: config.reload_url().map(str::to_string),
            state: SessionState::new(),
            ready: ReadySlot::new(),
            host,
            collaborator: None,
            sink,
            events: SessionEventBus::new(),
        })
    }

    pub fn with_ready(mut self, continuation: impl FnOnce() + Send + 'static) -> Self {
        self.set_ready(continuation);
        self
    }

    pub fn with_collaborator(mut self, collaborator: Box<dyn SceneCollaborator + Send>) -> Self {
        self.collaborator = Some(collaborator);
        self
    }

    /// Arm the ready continuation, replacing any pending one
    pub fn set_ready(&mut self, continuation: impl FnOnce() + Send + 'static) {
        let boxed: ReadyContinuation = Box::new(continuation);
        if self.ready.arm(boxed) {
            debug!("Pending ready continuation replaced");
        }
    }

    /// Mark the current pause as automatic (true) or user-visible (false)
    pub fn set_auto_paused(&mut self, automatic: bool) {
        self.state.pause_origin = if automatic {
            PauseOrigin::Automatic
        } else {
            PauseOrigin::Client
        };
    }

    pub fn set_timeout_budget(&mut self, budget_ms: Option<u64>) {
        self.timeout_budget = budget_ms;
    }

    /// Receive session events on a channel
    pub fn subscribe(&mut self) -> tokio::sync::mpsc::UnboundedReceiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn transport_state(&self) -> TransportState {
        self.state.transport
    }

    /// Current run mode; always `Unknown` unless open
    pub fn run_mode(&self) -> RunMode {
        self.state.run_mode
    }

    pub fn sim_time(&self) -> Option<f64> {
        self.state.sim_time
    }

    pub fn deadline(&self) -> Option<f64> {
        self.state.deadline
    }

    pub fn pause_origin(&self) -> PauseOrigin {
        self.state.pause_origin
    }

    pub fn timeout_budget(&self) -> Option<u64> {
        self.timeout_budget
    }

    pub fn world_catalog(&self) -> &WorldCatalog {
        &self.state.worlds
    }

    pub fn has_pending_ready(&self) -> bool {
        self.ready.is_pending()
    }

    pub fn close_report(&self) -> Option<CloseReport> {
        self.state.close
    }

    pub fn is_closed(&self) -> bool {
        self.state.is_closed()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Dispatch one transport notification. Returns the close report once the
    /// session has closed.
    pub fn handle_transport(
        &mut self,
        event: TransportEvent,
        quitting: bool,
    ) -> Option<CloseReport> {
        match event {
            TransportEvent::Opened => self.on_opened(),
            TransportEvent::Frame(text) => self.on_frame(&text),
            TransportEvent::Closed { code } => return Some(self.on_closed(code, quitting)),
            TransportEvent::Error(detail) => self.on_error(&detail),
        }
        None
    }

    /// Connection established: negotiate the mode
    pub fn on_opened(&mut self) {
        if !self.state.open() {
            debug!(
                "Ignoring open notification in state {:?}",
                self.state.transport
            );
            return;
        }
        let handshake = self.mode.handshake();
        info!("Stream open, negotiating mode '{}'", handshake);
        self.send(handshake.clone());
        self.events.emit(SessionEvent::Opened { handshake });
    }

    /// Decode and apply one frame
    pub fn on_frame(&mut self, frame: &str) {
        if !self.state.is_open() {
            warn!(
                "Frame received while {:?}, dropping: {:?}",
                self.state.transport, frame
            );
            self.diagnostic(DiagnosticKind::UnexpectedFrame, frame.to_string());
            return;
        }

        match decode(frame) {
            Ok(message) => {
                debug!("Frame decoded: {:?}", message);
                self.apply(message);
            }
            Err(e) => {
                warn!("Dropping malformed frame: {}", e);
                self.diagnostic(DiagnosticKind::MalformedMessage, e.to_string());
            }
        }
    }

    /// Transport closed. Terminal; repeated calls return the first report.
    pub fn on_closed(&mut self, code: u16, quitting: bool) -> CloseReport {
        if let Some(report) = self.state.close {
            debug!("Ignoring close notification ({}) after close", code);
            return report;
        }

        let report = CloseReport {
            code,
            abnormal: is_abnormal(code, quitting),
            client_initiated: quitting,
        };
        self.state.close(report);

        self.host
            .on_error(&format!("Disconnected from {} ({})", self.endpoint, code));
        if report.abnormal {
            warn!("Connection to {} closed abnormally: code={}", self.endpoint, code);
            self.host.alert(&CloseAlert::abnormal(code, self.reload_url.as_deref()));
        } else {
            info!("Connection to {} closed: code={}", self.endpoint, code);
        }
        self.host.destroy_world();

        if self.ready.discard() {
            debug!("Session closed before the scene became ready");
        }
        self.events.emit(SessionEvent::Closed(report));
        self.host.on_close();
        report
    }

    /// Transport error: tear the world down and tell the host
    pub fn on_error(&mut self, detail: &str) {
        if self.state.is_closed() {
            debug!("Ignoring transport error after close: {}", detail);
            return;
        }
        warn!("Transport error on {}: {}", self.endpoint, detail);
        let error = StreamError::Transport(detail.to_string());
        self.host.destroy_world();
        self.host.on_error(&error.to_string());
        self.events.emit(SessionEvent::TransportError {
            detail: detail.to_string(),
        });
    }

    fn apply(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::Ignored { channel } => {
                debug!("Skipping {:?} console frame", channel);
            }
            ServerMessage::WorldListUpdated { catalog } => self.update_worlds(catalog),
            ServerMessage::PauseEntered { time } => self.enter_pause(time),
            ServerMessage::RunModeChanged { mode } => {
                self.set_run_mode(mode);
                if let Some(budget) = self.timeout_budget {
                    self.send(timeout_message(budget));
                }
            }
            ServerMessage::LoadProgress { progress } => self.update_progress(progress),
            ServerMessage::SceneReady => {
                self.set_clock(0.0);
                if self.mode.view == ViewMode::Mjpeg {
                    self.host.hide_progress();
                    if let Some(collaborator) = self.collaborator.as_mut() {
                        collaborator.request_new_size();
                    }
                }
                info!("Scene load completed");
                self.events.emit(SessionEvent::SceneReady);
                self.fulfill_ready();
            }
            ServerMessage::SceneReset => {
                self.host.reset_scene();
                self.host.enable_controls(true);
                info!("Simulation reset finished");
                self.events.emit(SessionEvent::SceneReset);
                self.fulfill_ready();
            }
            ServerMessage::ClockTick { time } => self.set_clock(time),
            ServerMessage::WorldTornDown => {
                info!("Server deleted the current world");
                self.host.destroy_world();
                self.events.emit(SessionEvent::WorldTornDown);
            }
            ServerMessage::Unclassified { text } => self.forward(text),
        }
    }

    fn update_worlds(&mut self, catalog: WorldCatalog) {
        debug!(
            "World list: current={}, {} worlds",
            catalog.current,
            catalog.worlds.len()
        );
        self.host
            .update_world_list(&catalog.current, &catalog.worlds);
        self.state.worlds = catalog.clone();
        self.events.emit(SessionEvent::WorldListUpdated { catalog });
    }

    fn enter_pause(&mut self, time: Option<f64>) {
        self.set_run_mode(RunMode::Paused);
        if let Some(time) = time {
            self.state.pause_origin = PauseOrigin::Unset;
            self.state.sim_time = Some(time);
        }

        let Some(budget) = self.timeout_budget.filter(|b| *b > 0) else {
            return;
        };
        if self.state.pause_origin == PauseOrigin::Automatic {
            return;
        }
        let deadline = budget as f64 + self.state.sim_time.unwrap_or(0.0);
        debug!("Watchdog deadline at {} ms", deadline);
        self.state.deadline = Some(deadline);
        self.host.set_deadline(deadline);
        self.events.emit(SessionEvent::DeadlineUpdated { deadline });
    }

    fn set_run_mode(&mut self, mode: RunMode) {
        info!("Run mode: {}", mode);
        self.state.run_mode = mode;
        self.host.set_toolbar_mode(mode);
        self.events.emit(SessionEvent::RunModeChanged { mode });
    }

    fn update_progress(&mut self, progress: LoadProgress) {
        debug!("Loading {}: {}%", progress.phase, progress.percent);
        self.host.set_progress(&progress);
        self.events.emit(SessionEvent::ProgressUpdated { progress });
    }

    fn set_clock(&mut self, time: f64) {
        self.state.sim_time = Some(time);
        self.host.set_clock(time);
        self.events.emit(SessionEvent::ClockUpdated { time });
    }

    fn forward(&mut self, text: String) {
        let handled = match self.collaborator.as_mut() {
            Some(collaborator) => collaborator.process_server_message(&text),
            None => false,
        };
        if !handled {
            warn!("Unknown message received: {:?}", text);
            self.diagnostic(DiagnosticKind::UnhandledMessage, text);
        }
    }

    fn fulfill_ready(&mut self) {
        if self.ready.fulfill() {
            debug!("Ready continuation fulfilled");
        }
    }

    fn send(&mut self, text: String) {
        if let Err(e) = self.sink.send_text(text) {
            warn!("Failed to send to {}: {}", self.endpoint, e);
            self.host.on_error(&e.to_string());
        }
    }

    fn diagnostic(&mut self, kind: DiagnosticKind, detail: String) {
        self.events.emit(SessionEvent::Diagnostic { kind, detail });
    }
}
