//! Client-to-server messages: mode negotiation and watchdog timeout

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Height of the host toolbar, excluded from the streamed image
pub const TOOLBAR_HEIGHT: u32 = 48;

/// How the server should stream the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Scene-graph updates rendered by the client
    #[default]
    X3d,
    /// Server-rendered pixel stream
    Mjpeg,
}

impl ViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X3d => "x3d",
            Self::Mjpeg => "mjpeg",
        }
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "x3d" => Ok(Self::X3d),
            "mjpeg" => Ok(Self::Mjpeg),
            other => Err(format!("unknown view mode '{}' (expected x3d or mjpeg)", other)),
        }
    }
}

/// Size of the host's 3D view in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}

impl FromStr for Viewport {
    type Err = String;

    /// Parse `WIDTHxHEIGHT`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once('x')
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", s))?;
        let width = w
            .trim()
            .parse()
            .map_err(|e| format!("invalid width '{}': {}", w, e))?;
        let height = h
            .trim()
            .parse()
            .map_err(|e| format!("invalid height '{}': {}", h, e))?;
        Ok(Self { width, height })
    }
}

/// Everything needed to build the opening handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamMode {
    pub view: ViewMode,
    pub broadcast: bool,
    pub viewport: Viewport,
}

impl StreamMode {
    /// Text sent once the connection opens.
    ///
    /// Pixel streaming carries the image size and ignores `broadcast`.
    pub fn handshake(&self) -> String {
        match self.view {
            ViewMode::Mjpeg => format!(
                "mjpeg: {}x{}",
                self.viewport.width,
                self.viewport.height.saturating_sub(TOOLBAR_HEIGHT)
            ),
            ViewMode::X3d if self.broadcast => format!("{};broadcast", self.view.as_str()),
            ViewMode::X3d => self.view.as_str().to_string(),
        }
    }
}

/// Re-arms the server-side watchdog
pub fn timeout_message(budget_ms: u64) -> String {
    format!("timeout:{}", budget_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handshake_strings() {
        let mut mode = StreamMode::default();
        assert_eq!(mode.handshake(), "x3d");

        mode.broadcast = true;
        assert_eq!(mode.handshake(), "x3d;broadcast");

        mode.view = ViewMode::Mjpeg;
        mode.viewport = Viewport {
            width: 1024,
            height: 768,
        };
        assert_eq!(mode.handshake(), "mjpeg: 1024x720");
    }

    #[test]
    fn test_mjpeg_tiny_viewport_saturates() {
        let mode = StreamMode {
            view: ViewMode::Mjpeg,
            broadcast: false,
            viewport: Viewport {
                width: 10,
                height: 20,
            },
        };
        assert_eq!(mode.handshake(), "mjpeg: 10x0");
    }

    #[test]
    fn test_viewport_parse() {
        assert_eq!(
            "640x480".parse::<Viewport>().unwrap(),
            Viewport {
                width: 640,
                height: 480
            }
        );
        assert!("640".parse::<Viewport>().is_err());
        assert!("ax480".parse::<Viewport>().is_err());
    }

    #[test]
    fn test_timeout_message() {
        assert_eq!(timeout_message(60000), "timeout:60000");
        assert_eq!(timeout_message(0), "timeout:0");
    }
}
