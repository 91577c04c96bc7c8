use anyhow::Context;
use tokio_util::sync::CancellationToken;

use bankd_server::{Server, ServerConfig, shutdown};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    bankd_observability::init();

    let mut config = ServerConfig::from_env().context("invalid server configuration")?;
    if let Some(port) = std::env::args().nth(1) {
        let port: u16 = port
            .parse()
            .with_context(|| format!("invalid port {port:?} (usage: bankd-server [PORT])"))?;
        config = config.with_port(port);
    }

    let server = Server::bind(config.clone())
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    let token = CancellationToken::new();
    let signals = shutdown::cancel_on_signal(token.clone());

    server.run(token).await;
    signals.abort();
    Ok(())
}
