//! Decode command: classify frames read from stdin, one per line

use anyhow::{Context, Result};
use clap::Args;
use simstream_core::{decode, ServerMessage};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

#[derive(Debug, Default, Args)]
pub struct DecodeArgs {
    /// Stop at the first malformed frame
    #[arg(long)]
    pub strict: bool,
}

fn classify(frame: &str) -> simstream_core::Result<ServerMessage> {
    Ok(decode(frame)?)
}

pub async fn run(args: DecodeArgs) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut number = 0usize;
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        number += 1;
        match classify(&line) {
            Ok(message) => println!("{}", serde_json::to_string(&message)?),
            Err(e) if args.strict => {
                return Err(e).with_context(|| format!("Line {} could not be decoded", number))
            }
            Err(e) => warn!("Line {}: {}", number, e),
        }
    }
    Ok(())
}
