//! Async polling orchestrator.
//!
//! Runs [`Processor::run_cycle`] on a fixed interval in a tokio task and
//! forwards a [`CycleReport`] per tick through an `mpsc` channel. The loop
//! stops on [`GradingHandle::shutdown`] (after the in-flight cycle
//! completes), when the handle is dropped, or when the receiver goes away.

use std::time::Duration;

use chrono::{DateTime, Utc};
use grader_core::store::ResultStore;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, MissedTickBehavior};

use crate::processor::{CycleOutcome, Processor};
use crate::source::LogSource;

// ── Public types ──────────────────────────────────────────────────────────────

/// Result of one polling tick, forwarded to the caller.
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// When the cycle finished.
    pub at: DateTime<Utc>,
    /// The cycle outcome, or the rendered error that aborted it.
    pub result: Result<CycleOutcome, String>,
}

// ── GradingOrchestrator ───────────────────────────────────────────────────────

/// Background polling coordinator.
///
/// Call [`GradingOrchestrator::start`] to spin up the polling loop in a
/// dedicated tokio task.
pub struct GradingOrchestrator<S, R> {
    /// Time between the start of consecutive cycles.
    poll_interval: Duration,
    processor: Processor<S, R>,
}

impl<S, R> GradingOrchestrator<S, R>
where
    S: LogSource + Send + 'static,
    R: ResultStore + Send + 'static,
{
    pub fn new(poll_interval: Duration, processor: Processor<S, R>) -> Self {
        Self {
            poll_interval,
            processor,
        }
    }

    /// Start the polling loop.
    ///
    /// Returns the receiving end of the report channel and a
    /// [`GradingHandle`] controlling the loop.
    pub fn start(self) -> (mpsc::Receiver<CycleReport>, GradingHandle) {
        // Buffer a modest number of reports so slow consumers don't stall the loop.
        let (tx, rx) = mpsc::channel(16);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            self.polling_loop(tx, shutdown_rx).await;
        });

        (
            rx,
            GradingHandle {
                handle,
                shutdown: shutdown_tx,
            },
        )
    }

    // ── Private implementation ────────────────────────────────────────────

    /// The first cycle runs immediately, then one per `poll_interval`.
    async fn polling_loop(self, tx: mpsc::Sender<CycleReport>, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::debug!("shutdown requested; exiting polling loop");
                        break;
                    }
                    continue;
                }
            }

            let report = self.tick();

            if tx.send(report).await.is_err() {
                tracing::debug!("report channel closed; exiting polling loop");
                break;
            }
        }
    }

    /// Run one cycle. Errors are logged and reported; they never end the loop.
    fn tick(&self) -> CycleReport {
        let result = match self.processor.run_cycle() {
            Ok(outcome) => {
                tracing::debug!(%outcome, "cycle finished");
                Ok(outcome)
            }
            Err(e) => {
                tracing::warn!(error = %e, "cycle failed; will retry on next poll");
                Err(e.to_string())
            }
        };
        CycleReport {
            at: Utc::now(),
            result,
        }
    }
}

// ── GradingHandle ─────────────────────────────────────────────────────────────

/// A handle to the background polling task.
///
/// Dropping the handle also shuts the loop down.
pub struct GradingHandle {
    handle: tokio::task::JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

impl GradingHandle {
    /// Ask the loop to stop once the current cycle, if any, completes.
    pub fn shutdown(&self) {
        // Only fails when the loop has already exited.
        let _ = self.shutdown.send(true);
    }

    /// Immediately abort the polling loop.
    pub fn abort(&self) {
        self.handle.abort();
    }

    /// Request shutdown and wait for the loop to finish.
    pub async fn stop(self) {
        self.shutdown();
        if let Err(e) = self.handle.await {
            if !e.is_cancelled() {
                tracing::warn!(error = %e, "polling task ended abnormally");
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
