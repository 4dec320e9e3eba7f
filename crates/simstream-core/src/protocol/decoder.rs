//! Frame classification
//!
//! Turns one text frame into a [`ServerMessage`]. Rules are tried in order and
//! the first match wins, so console prefixes shadow everything after them.

use thiserror::Error;

use super::messages::{ConsoleChannel, LoadProgress, RunMode, ServerMessage, WorldCatalog};

const WORLD_PREFIX: &str = "world:";
const PAUSE_PREFIX: &str = "pause:";
const LOADING_PREFIX: &str = "loading:";
const TIME_PREFIX: &str = "time: ";

const PAUSED_BY_CLIENT: &str = "paused by client";
const SCENE_LOAD_COMPLETED: &str = "scene load completed";
const RESET_FINISHED: &str = "reset finished";
const DELETE_WORLD: &str = "delete world";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// A frame matched a rule but one of its fields failed to parse
    #[error("malformed message {raw:?}: {reason}")]
    Malformed { raw: String, reason: String },
}

impl DecodeError {
    fn malformed(raw: &str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            raw: raw.to_string(),
            reason: reason.into(),
        }
    }
}

/// Decode a single frame
pub fn decode(frame: &str) -> Result<ServerMessage, DecodeError> {
    if let Some(channel) = ConsoleChannel::from_frame(frame) {
        return Ok(ServerMessage::Ignored { channel });
    }

    if let Some(rest) = frame.strip_prefix(WORLD_PREFIX) {
        let (current, list) = split_field(rest);
        let worlds = list
            .split(';')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect();
        return Ok(ServerMessage::WorldListUpdated {
            catalog: WorldCatalog {
                current: current.to_string(),
                worlds,
            },
        });
    }

    if let Some(rest) = frame.strip_prefix(PAUSE_PREFIX) {
        let rest = rest.trim();
        let time = if rest.is_empty() {
            None
        } else {
            Some(parse_time(frame, rest)?)
        };
        return Ok(ServerMessage::PauseEntered { time });
    }
    if frame == PAUSED_BY_CLIENT {
        return Ok(ServerMessage::PauseEntered { time: None });
    }

    if let Some(mode) = RunMode::from_token(frame) {
        return Ok(ServerMessage::RunModeChanged { mode });
    }

    if let Some(rest) = frame.strip_prefix(LOADING_PREFIX) {
        let (phase, percent) = split_field(rest);
        return Ok(ServerMessage::LoadProgress {
            progress: LoadProgress {
                phase: phase.to_string(),
                percent: percent.to_string(),
            },
        });
    }

    match frame {
        SCENE_LOAD_COMPLETED => return Ok(ServerMessage::SceneReady),
        RESET_FINISHED => return Ok(ServerMessage::SceneReset),
        _ => {}
    }

    if let Some(rest) = frame.strip_prefix(TIME_PREFIX) {
        let time = parse_time(frame, rest.trim())?;
        return Ok(ServerMessage::ClockTick { time });
    }

    if frame == DELETE_WORLD {
        return Ok(ServerMessage::WorldTornDown);
    }

    Ok(ServerMessage::Unclassified {
        text: frame.to_string(),
    })
}

/// Split `sub:value` on its first colon, trimming both sides.
///
/// Without a colon the first field is empty and the whole text is the value.
fn split_field(rest: &str) -> (&str, &str) {
    let rest = rest.trim();
    match rest.split_once(':') {
        Some((head, tail)) => (head.trim(), tail.trim()),
        None => ("", rest),
    }
}

/// Simulation time in milliseconds: finite and non-negative
fn parse_time(frame: &str, text: &str) -> Result<f64, DecodeError> {
    let value = text
        .parse::<f64>()
        .map_err(|e| DecodeError::malformed(frame, format!("invalid time {:?}: {}", text, e)))?;
    if !value.is_finite() || value < 0.0 {
        return Err(DecodeError::malformed(
            frame,
            format!("time out of range: {}", text),
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_prefixes_are_ignored() {
        assert_eq!(
            decode("robot:hello").unwrap(),
            ServerMessage::Ignored {
                channel: ConsoleChannel::Robot
            }
        );
        assert_eq!(
            decode("stdout:time: 12").unwrap(),
            ServerMessage::Ignored {
                channel: ConsoleChannel::Stdout
            }
        );
        // Prefix shadows later rules even when the payload looks like one
        assert_eq!(
            decode("stderr:world:a:b").unwrap(),
            ServerMessage::Ignored {
                channel: ConsoleChannel::Stderr
            }
        );
    }

    #[test]
    fn test_world_list_with_padding() {
        let msg = decode("world: current.wbt : a.wbt ; b.wbt;c.wbt ").unwrap();
        assert_eq!(
            msg,
            ServerMessage::WorldListUpdated {
                catalog: WorldCatalog {
                    current: "current.wbt".to_string(),
                    worlds: vec![
                        "a.wbt".to_string(),
                        "b.wbt".to_string(),
                        "c.wbt".to_string()
                    ],
                }
            }
        );
    }

    #[test]
    fn test_world_list_without_current() {
        let ServerMessage::WorldListUpdated { catalog } = decode("world:a;b").unwrap() else {
            panic!("expected world list");
        };
        assert_eq!(catalog.current, "");
        assert_eq!(catalog.worlds, vec!["a", "b"]);
    }

    #[test]
    fn test_pause_variants() {
        assert_eq!(
            decode("pause:1532.5").unwrap(),
            ServerMessage::PauseEntered { time: Some(1532.5) }
        );
        assert_eq!(
            decode("pause: 20 ").unwrap(),
            ServerMessage::PauseEntered { time: Some(20.0) }
        );
        assert_eq!(
            decode("pause:").unwrap(),
            ServerMessage::PauseEntered { time: None }
        );
        assert_eq!(
            decode("paused by client").unwrap(),
            ServerMessage::PauseEntered { time: None }
        );
        assert!(decode("pause:soon").is_err());
    }

    #[test]
    fn test_run_modes_are_exact() {
        assert_eq!(
            decode("real-time").unwrap(),
            ServerMessage::RunModeChanged {
                mode: RunMode::RealTime
            }
        );
        assert_eq!(
            decode("fast").unwrap(),
            ServerMessage::RunModeChanged { mode: RunMode::Fast }
        );
        assert!(matches!(
            decode("Run").unwrap(),
            ServerMessage::Unclassified { .. }
        ));
        assert!(matches!(
            decode("run ").unwrap(),
            ServerMessage::Unclassified { .. }
        ));
    }

    #[test]
    fn test_loading_fields() {
        let ServerMessage::LoadProgress { progress } =
            decode("loading: Downloading assets : 42").unwrap()
        else {
            panic!("expected progress");
        };
        assert_eq!(progress.phase, "Downloading assets");
        assert_eq!(progress.percent, "42");
        assert_eq!(progress.percent_value(), Some(42.0));

        let ServerMessage::LoadProgress { progress } = decode("loading:50").unwrap() else {
            panic!("expected progress");
        };
        assert_eq!(progress.phase, "");
        assert_eq!(progress.percent, "50");
    }

    #[test]
    fn test_exact_matches() {
        assert_eq!(
            decode("scene load completed").unwrap(),
            ServerMessage::SceneReady
        );
        assert_eq!(decode("reset finished").unwrap(), ServerMessage::SceneReset);
        assert_eq!(decode("delete world").unwrap(), ServerMessage::WorldTornDown);
        assert!(matches!(
            decode("scene load completed!").unwrap(),
            ServerMessage::Unclassified { .. }
        ));
    }

    #[test]
    fn test_time_tick() {
        assert_eq!(
            decode("time: 1024.25").unwrap(),
            ServerMessage::ClockTick { time: 1024.25 }
        );
        // Needs the space after the colon
        assert!(matches!(
            decode("time:10").unwrap(),
            ServerMessage::Unclassified { .. }
        ));
    }

    #[test]
    fn test_malformed_time() {
        let DecodeError::Malformed { raw, .. } = decode("time: abc").unwrap_err();
        assert_eq!(raw, "time: abc");
        assert!(decode("time: -5").is_err());
        assert!(decode("time: NaN").is_err());
        assert!(decode("time: inf").is_err());
    }

    #[test]
    fn test_unclassified_is_verbatim() {
        assert_eq!(
            decode("  <nodes><Shape id='n5'/></nodes>").unwrap(),
            ServerMessage::Unclassified {
                text: "  <nodes><Shape id='n5'/></nodes>".to_string()
            }
        );
    }
}
