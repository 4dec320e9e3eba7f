//! Watch command: follow a live session

use anyhow::{Context, Result};
use clap::Args;
use simstream_core::{StreamClient, StreamConfig, StreamError, ViewMode, Viewport};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::console::ConsoleHost;

#[derive(Debug, Default, Args)]
pub struct WatchArgs {
    /// WebSocket URL of the simulation server (overrides config)
    pub endpoint: Option<String>,

    /// Streaming mode: x3d or mjpeg
    #[arg(short, long)]
    pub mode: Option<ViewMode>,

    /// Join as a spectator
    #[arg(short, long)]
    pub broadcast: bool,

    /// View size for mjpeg streaming, e.g. 800x648
    #[arg(short, long)]
    pub size: Option<Viewport>,

    /// Watchdog budget in milliseconds
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Print session events as JSON lines
    #[arg(long)]
    pub json: bool,

    /// Config file (defaults to the user config directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl WatchArgs {
    /// Flags win over the config file
    pub fn apply(&self, config: &mut StreamConfig) {
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.clone();
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if self.broadcast {
            config.broadcast = true;
        }
        if let Some(size) = self.size {
            config.viewport = size;
        }
        if let Some(timeout) = self.timeout {
            config.timeout_ms = Some(timeout);
        }
    }
}

pub async fn run(args: WatchArgs) -> Result<()> {
    let mut config = StreamConfig::load_or_default(args.config.as_deref())
        .context("Failed to load stream config")?;
    args.apply(&mut config);

    let mut client = StreamClient::connect(&config, ConsoleHost::new(args.json))
        .with_context(|| format!("Failed to start session with {}", config.endpoint))?;
    client
        .session_mut()
        .set_ready(|| info!("Scene ready"));

    let printer = if args.json {
        let mut events = client.session_mut().subscribe();
        Some(tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match serde_json::to_string(&event) {
                    Ok(line) => println!("{}", line),
                    Err(e) => tracing::warn!("Failed to serialize event: {}", e),
                }
            }
        }))
    } else {
        None
    };

    let quit = CancellationToken::new();
    let trigger = quit.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });

    let report = client.run(quit).await;
    drop(client);
    if let Some(printer) = printer {
        printer.await.context("Event printer failed")?;
    }

    if report.abnormal {
        return Err(StreamError::AbnormalClose { code: report.code }.into());
    }
    info!("Session ended (code {})", report.code);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let mut config = StreamConfig {
            endpoint: "ws://file:1".to_string(),
            timeout_ms: Some(10),
            ..Default::default()
        };
        let args = WatchArgs {
            endpoint: Some("ws://flag:2".to_string()),
            mode: Some(ViewMode::Mjpeg),
            size: Some(Viewport {
                width: 320,
                height: 288,
            }),
            ..Default::default()
        };
        args.apply(&mut config);

        assert_eq!(config.endpoint, "ws://flag:2");
        assert_eq!(config.mode, ViewMode::Mjpeg);
        assert_eq!(config.timeout_ms, Some(10));
        assert_eq!(config.stream_mode().handshake(), "mjpeg: 320x240");
    }

    #[test]
    fn test_no_flags_keeps_config() {
        let mut config = StreamConfig {
            broadcast: true,
            ..Default::default()
        };
        let before = config.clone();
        WatchArgs::default().apply(&mut config);
        assert_eq!(config, before);
    }
}
