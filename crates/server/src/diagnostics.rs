//! Periodic read-only ledger report.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use bankd_ledger::{AccountSnapshot, Ledger};

/// Consistent view of the ledger at one instant.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticReport {
    pub taken_at: DateTime<Utc>,
    pub total: usize,
    pub accounts: Vec<AccountSnapshot>,
}

impl DiagnosticReport {
    pub fn capture(ledger: &Ledger) -> Self {
        let accounts = ledger.snapshot();
        Self {
            taken_at: Utc::now(),
            total: accounts.len(),
            accounts,
        }
    }

    pub fn in_service(&self) -> usize {
        self.accounts.iter().filter(|a| a.in_session).count()
    }

    /// Emit the report as a single structured log event.
    pub fn log(&self) {
        match serde_json::to_string(&self.accounts) {
            Ok(accounts) => info!(
                total = self.total,
                in_service = self.in_service(),
                accounts = %accounts,
                "server diagnostic"
            ),
            Err(err) => warn!(error = %err, "failed to serialize diagnostic report"),
        }
    }
}

/// Log a report every `period` until shutdown; the first report fires one
/// period after start.
pub async fn run_diagnostics(ledger: Arc<Ledger>, period: Duration, shutdown: CancellationToken) {
    report_every(ledger, period, shutdown, |report| report.log()).await;
}

/// Capture a report every `period` and hand it to `sink` until shutdown.
pub async fn report_every<F>(
    ledger: Arc<Ledger>,
    period: Duration,
    shutdown: CancellationToken,
    mut sink: F,
) where
    F: FnMut(DiagnosticReport),
{
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => sink(DiagnosticReport::capture(&ledger)),
        }
    }

    info!("diagnostic timer removed");
}
