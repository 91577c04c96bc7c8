//! Process-level wiring: listener, workers, diagnostics, and graceful drain.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use bankd_ledger::Ledger;

use crate::config::ServerConfig;
use crate::diagnostics::run_diagnostics;
use crate::listener::accept_loop;
use crate::worker::WorkerContext;

/// A bound banking server.
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    ledger: Arc<Ledger>,
    config: Arc<ServerConfig>,
}

impl Server {
    /// Bind the configured address with an empty ledger.
    pub async fn bind(config: ServerConfig) -> io::Result<Self> {
        let listener = TcpListener::bind(config.addr).await?;
        Ok(Self {
            listener,
            ledger: Arc::new(Ledger::new()),
            config: Arc::new(config),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn ledger(&self) -> Arc<Ledger> {
        self.ledger.clone()
    }

    /// Run until `shutdown` is cancelled and the workers have drained.
    ///
    /// Cancelling the token is purely advisory: the listener and every worker
    /// notice it on their next poll. Workers still running once the grace
    /// period elapses are aborted; their sessions are released on drop.
    pub async fn run(self, shutdown: CancellationToken) {
        let Server {
            listener,
            ledger,
            config,
        } = self;

        if let Ok(addr) = listener.local_addr() {
            info!(addr = %addr, "server started");
        }

        let diagnostics = tokio::spawn(run_diagnostics(
            ledger.clone(),
            config.diagnostic_interval,
            shutdown.clone(),
        ));

        let ctx = WorkerContext {
            ledger: ledger.clone(),
            shutdown: shutdown.clone(),
            config: config.clone(),
        };
        let mut workers = accept_loop(listener, ctx).await;

        let drain = async {
            while let Some(joined) = workers.join_next().await {
                if let Err(err) = joined {
                    warn!(error = %err, "connection worker failed");
                }
            }
        };
        if timeout(config.shutdown_grace, drain).await.is_err() {
            warn!(remaining = workers.len(), "grace period elapsed; aborting workers");
            workers.shutdown().await;
        }

        if let Err(err) = diagnostics.await {
            warn!(error = %err, "diagnostic task failed");
        }

        info!(accounts = ledger.len(), "bye");
    }
}
