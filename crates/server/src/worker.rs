//! Connection worker: one per accepted connection.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::{sleep, timeout};
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use bankd_ledger::Ledger;
use bankd_protocol::{MessageCodec, reply};

use crate::config::ServerConfig;
use crate::session::{Disposition, Session};

/// Shared handles every worker receives from the listener.
#[derive(Debug, Clone)]
pub struct WorkerContext {
    pub ledger: Arc<Ledger>,
    pub shutdown: CancellationToken,
    pub config: Arc<ServerConfig>,
}

/// Why a worker stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// Client sent `quit`.
    Quit,
    /// Peer closed the connection or the transport failed.
    Disconnected,
    /// Server shutdown was observed; the client got the notice and a `quit`.
    Shutdown,
}

/// Serve one connection until `quit`, disconnect, or shutdown.
///
/// Reads are bounded by the poll interval; the shutdown token is checked
/// between commands and after every idle poll. Whatever the exit path, the
/// session's account is released before this returns.
pub async fn run_worker<S>(stream: S, ctx: WorkerContext) -> WorkerExit
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let codec = MessageCodec::with_max_length(ctx.config.max_message_len);
    let mut framed = Framed::new(stream, codec);
    let mut session = Session::new(ctx.ledger.clone());

    let exit = loop {
        if ctx.shutdown.is_cancelled() {
            notify_shutdown(&mut framed, ctx.config.notice_delay).await;
            break WorkerExit::Shutdown;
        }

        let next = match timeout(ctx.config.poll_interval, framed.next()).await {
            Ok(next) => next,
            Err(_elapsed) => continue,
        };

        let message = match next {
            Some(Ok(message)) => message,
            Some(Err(err)) => {
                warn!(error = %err, "connection read failed");
                break WorkerExit::Disconnected;
            }
            None => {
                info!("socket closed");
                break WorkerExit::Disconnected;
            }
        };

        debug!(text = %message, "recv");
        let outcome = session.handle(&message);

        if let Err(err) = framed.send(outcome.reply.as_str()).await {
            warn!(error = %err, "failed to write reply");
            break WorkerExit::Disconnected;
        }
        debug!(text = %outcome.reply, "send");

        if outcome.disposition == Disposition::Close {
            break WorkerExit::Quit;
        }
    };

    session.release();
    exit
}

async fn notify_shutdown<S>(framed: &mut Framed<S, MessageCodec>, delay: Duration)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    info!("sending shutdown notice");
    if framed.send(reply::SHUTDOWN_NOTICE).await.is_err() {
        return;
    }
    sleep(delay).await;
    let _ = framed.send(reply::QUIT).await;
}
