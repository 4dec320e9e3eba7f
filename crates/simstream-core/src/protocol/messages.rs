//! Decoded server messages

use serde::Serialize;

/// Simulation execution mode as reported by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunMode {
    /// No mode reported yet
    #[default]
    Unknown,
    RealTime,
    Run,
    Fast,
    Paused,
}

impl RunMode {
    /// Parse one of the running-mode tokens sent by the server
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "real-time" => Some(Self::RealTime),
            "run" => Some(Self::Run),
            "fast" => Some(Self::Fast),
            _ => None,
        }
    }

    /// Toolbar token for this mode
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::RealTime => "real-time",
            Self::Run => "run",
            Self::Fast => "fast",
            Self::Paused => "pause",
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::RealTime | Self::Run | Self::Fast)
    }
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Console channels multiplexed on the stream but consumed elsewhere
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleChannel {
    Robot,
    Stdout,
    Stderr,
}

impl ConsoleChannel {
    pub(crate) fn from_frame(frame: &str) -> Option<Self> {
        if frame.starts_with("robot:") {
            Some(Self::Robot)
        } else if frame.starts_with("stdout:") {
            Some(Self::Stdout)
        } else if frame.starts_with("stderr:") {
            Some(Self::Stderr)
        } else {
            None
        }
    }
}

/// Available worlds with the one currently loaded
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorldCatalog {
    pub current: String,
    pub worlds: Vec<String>,
}

impl WorldCatalog {
    pub fn is_current(&self, world: &str) -> bool {
        self.current == world
    }
}

/// Loading progress for one phase of a scene load
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadProgress {
    pub phase: String,
    /// Percentage as sent by the server
    pub percent: String,
}

impl LoadProgress {
    /// Numeric percentage, when the server sent one
    pub fn percent_value(&self) -> Option<f64> {
        self.percent.parse::<f64>().ok().filter(|p| p.is_finite())
    }
}

/// One frame from the server, classified
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Console output meant for another consumer
    Ignored { channel: ConsoleChannel },
    WorldListUpdated { catalog: WorldCatalog },
    PauseEntered { time: Option<f64> },
    RunModeChanged { mode: RunMode },
    LoadProgress { progress: LoadProgress },
    SceneReady,
    SceneReset,
    ClockTick { time: f64 },
    WorldTornDown,
    /// Scene-graph update for the rendering collaborator
    Unclassified { text: String },
}
