//! Terminal host
//!
//! Renders the session as log lines. The clock is coalesced to one line per
//! simulated second; everything else is printed as it happens.

use simstream_core::protocol::LoadProgress;
use simstream_core::{format_clock, CloseAlert, RunMode, StreamHost};
use tracing::{error, info, warn};

#[derive(Debug, Default)]
pub struct ConsoleHost {
    /// Leave stdout to the JSON event stream
    quiet: bool,
    last_second: Option<u64>,
}

impl ConsoleHost {
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            ..Default::default()
        }
    }

    fn print(&self, line: String) {
        if !self.quiet {
            println!("{}", line);
        }
    }
}

impl StreamHost for ConsoleHost {
    fn show_status(&mut self, message: &str) {
        info!("{}", message);
    }

    fn set_toolbar_mode(&mut self, mode: RunMode) {
        self.print(format!("[mode]     {}", mode));
    }

    fn set_clock(&mut self, time_ms: f64) {
        let second = (time_ms.max(0.0) / 1000.0) as u64;
        if self.last_second == Some(second) && time_ms > 0.0 {
            return;
        }
        self.last_second = Some(second);
        self.print(format!("[clock]    {}", format_clock(time_ms)));
    }

    fn set_deadline(&mut self, deadline_ms: f64) {
        self.print(format!("[timeout]  {}", format_clock(deadline_ms)));
    }

    fn set_progress(&mut self, progress: &LoadProgress) {
        self.print(format!("[loading]  {} {}%", progress.phase, progress.percent));
    }

    fn update_world_list(&mut self, current: &str, worlds: &[String]) {
        for world in worlds {
            let marker = if world == current { "*" } else { " " };
            self.print(format!("[world]  {} {}", marker, world));
        }
    }

    fn reset_scene(&mut self) {
        self.last_second = None;
        self.print("[reset]    simulation reset".to_string());
    }

    fn destroy_world(&mut self) {
        self.print("[world]    destroyed".to_string());
    }

    fn on_error(&mut self, message: &str) {
        warn!("{}", message);
    }

    fn alert(&mut self, alert: &CloseAlert) {
        error!("{}: {}", alert.title, alert.message);
    }
}
