//! Host projection
//!
//! What the session needs from the application embedding it. The session
//! calls these after it has updated its own state, so a host only ever
//! renders; it never decides protocol behavior.

use crate::protocol::{LoadProgress, RunMode};

/// Callbacks implemented by the embedding application
pub trait StreamHost {
    /// Connection status line (shown before any progress arrives)
    fn show_status(&mut self, _message: &str) {}

    fn set_toolbar_mode(&mut self, mode: RunMode);

    /// Simulation clock in milliseconds
    fn set_clock(&mut self, time_ms: f64);

    /// Simulation time at which the auto-pause watchdog fires
    fn set_deadline(&mut self, _deadline_ms: f64) {}

    fn set_progress(&mut self, progress: &LoadProgress);

    fn hide_progress(&mut self) {}

    fn update_world_list(&mut self, current: &str, worlds: &[String]);

    /// Reset the scene and viewpoint after a simulation reset
    fn reset_scene(&mut self) {}

    fn enable_controls(&mut self, _enabled: bool) {}

    /// Drop the current world representation
    fn destroy_world(&mut self);

    fn on_error(&mut self, message: &str);

    /// Blocking user-facing alert for an abnormal close
    fn alert(&mut self, _alert: &CloseAlert) {}

    fn on_close(&mut self) {}
}

/// Renderer that consumes scene-graph frames the session does not understand
pub trait SceneCollaborator {
    /// Returns whether the message was handled
    fn process_server_message(&mut self, text: &str) -> bool;

    /// Ask the server for a frame at the current size (pixel streaming only)
    fn request_new_size(&mut self) {}
}

/// Alert raised when the server drops the connection abnormally
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseAlert {
    pub code: u16,
    pub title: String,
    pub message: String,
    /// Reloading this restarts the simulation
    pub reload_url: Option<String>,
}

impl CloseAlert {
    pub fn abnormal(code: u16, reload_url: Option<&str>) -> Self {
        let mut message = format!("Connection closed abnormally. (Error code: {})", code);
        if let Some(url) = reload_url {
            message.push_str(&format!(
                " Please reset the simulation by reloading {}",
                url
            ));
        }
        Self {
            code,
            title: "Streaming server error".to_string(),
            message,
            reload_url: reload_url.map(str::to_string),
        }
    }
}

/// Format simulation milliseconds as `HH:MM:SS:mmm`
pub fn format_clock(time_ms: f64) -> String {
    let total = if time_ms.is_finite() && time_ms > 0.0 {
        time_ms.floor() as u64
    } else {
        0
    };
    let millis = total % 1000;
    let seconds = (total / 1000) % 60;
    let minutes = (total / 60_000) % 60;
    let hours = total / 3_600_000;
    format!("{:02}:{:02}:{:02}:{:03}", hours, minutes, seconds, millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0.0), "00:00:00:000");
        assert_eq!(format_clock(1532.9), "00:00:01:532");
        assert_eq!(format_clock(3_723_004.0), "01:02:03:004");
        assert_eq!(format_clock(-1.0), "00:00:00:000");
    }

    #[test]
    fn test_abnormal_alert_mentions_code() {
        let alert = CloseAlert::abnormal(1006, Some("https://example.org/sim"));
        assert_eq!(alert.code, 1006);
        assert!(alert.message.contains("1006"));
        assert!(alert.message.contains("https://example.org/sim"));
    }

    #[test]
    fn test_abnormal_alert_without_reload_page() {
        let alert = CloseAlert::abnormal(1011, None);
        assert_eq!(
            alert.message,
            "Connection closed abnormally. (Error code: 1011)"
        );
        assert_eq!(alert.reload_url, None);
    }
}
