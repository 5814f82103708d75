use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use chat_server::{
    chat_log::{ChatLog, FileChatLog},
    cli::Cli,
    server::ChatServer,
};

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    let chat_log = Arc::new(
        FileChatLog::open(&config.log_location)
            .await
            .with_context(|| {
                format!("failed to open chat log {}", config.log_location.display())
            })?,
    );

    let server = ChatServer::bind(&config.bind_addr(), Arc::clone(&chat_log)).await?;
    let addr = server.local_addr()?;
    info!("chat server listening on {}", addr);
    info!(path = %chat_log.path().display(), "recording broadcasts");

    let served = server.run_until_ctrl_c().await;
    if let Err(err) = &served {
        warn!("chat server exited with error: {err:?}");
    }

    chat_log.close().await.context("failed to close chat log")?;
    served
}
