//! Termination signal path.

use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Resolve on Ctrl+C or, on unix, SIGTERM.
pub async fn termination_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Exit status used when a second signal cuts the grace period short.
pub const FORCED_EXIT_CODE: i32 = 130;

/// Cancel `shutdown` when a termination signal arrives.
///
/// The task then keeps listening: a second signal while workers drain exits
/// the process immediately with [`FORCED_EXIT_CODE`]. Abort the returned
/// handle once the server has stopped.
pub fn cancel_on_signal(shutdown: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(watch_signals(shutdown, termination_signal, || {
        warn!("second termination signal; exiting without waiting for workers");
        std::process::exit(FORCED_EXIT_CODE);
    }))
}

async fn watch_signals<S, F, X>(shutdown: CancellationToken, mut signal: S, force: X)
where
    S: FnMut() -> F,
    F: Future<Output = ()>,
    X: FnOnce(),
{
    tokio::select! {
        _ = signal() => {
            info!("now server shutdown..");
            shutdown.cancel();
        }
        _ = shutdown.cancelled() => {}
    }

    signal().await;
    force();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::{Notify, oneshot};
    use tokio::time::timeout;

    type Raised = Pin<Box<dyn Future<Output = ()> + Send>>;

    fn raised_by(notify: Arc<Notify>) -> impl FnMut() -> Raised {
        move || {
            let notify = notify.clone();
            Box::pin(async move { notify.notified().await })
        }
    }

    #[tokio::test]
    async fn first_signal_cancels_and_second_forces_exit() {
        let shutdown = CancellationToken::new();
        let signals = Arc::new(Notify::new());
        let (forced_tx, mut forced_rx) = oneshot::channel();

        let task = tokio::spawn(watch_signals(shutdown.clone(), raised_by(signals.clone()), move || {
            let _ = forced_tx.send(());
        }));

        signals.notify_one();
        timeout(Duration::from_secs(1), shutdown.cancelled())
            .await
            .expect("first signal did not cancel");
        assert!(forced_rx.try_recv().is_err());

        signals.notify_one();
        timeout(Duration::from_secs(1), forced_rx)
            .await
            .expect("second signal was ignored")
            .unwrap();
        task.await.unwrap();
    }
}
