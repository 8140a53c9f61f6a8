//! Interactive demo: every stdin line is spoken through the pool, and lines
//! typed while earlier ones are still rendering talk over each other.
//!
//! ```text
//! cargo run --example talkover
//! ```
//!
//! The engine bundle is downloaded into a temp directory on first run.

use std::io::BufRead;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use squawkbox::{AssetManifest, DecTalkFactory, NoopEmitter, PoolConfig, SpeechPool};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let install_dir = std::env::temp_dir().join("squawkbox-engine");

    let pool = SpeechPool::spawn(
        DecTalkFactory::new(),
        PoolConfig::default(),
        AssetManifest::default(),
        install_dir,
        Arc::new(NoopEmitter::new()),
    )?;

    tracing::info!("type a line to speak it (ctrl-d to quit)");

    for line in std::io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        if !pool.try_speak(&line) {
            tracing::warn!("failed to speak message (probably out of slots?)");
        }
    }

    Ok(())
}
