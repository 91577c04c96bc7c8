//! Accept loop.

use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tokio::time::{sleep, timeout};
use tracing::{Instrument, info, info_span, warn};

use bankd_core::ConnectionId;

use crate::worker::{WorkerContext, WorkerExit, run_worker};

/// Back-off after a failed `accept` (e.g. file descriptor exhaustion).
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Accept connections until shutdown is observed, spawning one worker each.
///
/// `accept` is bounded by the poll interval so the shutdown token is checked at
/// least once per interval. Returns the still-running workers; dropping the
/// listener closes the listening socket.
pub async fn accept_loop(listener: TcpListener, ctx: WorkerContext) -> JoinSet<WorkerExit> {
    let mut workers = JoinSet::new();

    loop {
        reap_finished(&mut workers);

        if ctx.shutdown.is_cancelled() {
            break;
        }

        let accepted = match timeout(ctx.config.poll_interval, listener.accept()).await {
            Ok(accepted) => accepted,
            Err(_elapsed) => continue,
        };

        match accepted {
            Ok((stream, peer)) => {
                if ctx.shutdown.is_cancelled() {
                    drop(stream);
                    break;
                }

                let id = ConnectionId::new();
                let span = info_span!("connection", connection = %id, peer = %peer);
                workers.spawn(run_worker(stream, ctx.clone()).instrument(span));
                info!(connection = %id, peer = %peer, live = workers.len(), "new connection");
            }
            Err(err) => {
                warn!(error = %err, "accept failed");
                sleep(ACCEPT_ERROR_BACKOFF).await;
            }
        }
    }

    drop(listener);
    info!(live = workers.len(), "session acceptor stopped");
    workers
}

fn reap_finished(workers: &mut JoinSet<WorkerExit>) {
    while let Some(joined) = workers.try_join_next() {
        if let Err(err) = joined {
            warn!(error = %err, "connection worker failed");
        }
    }
}
