//! Relabel reconciler worker.
//!
//! Polls the relabel outbox for compensating calendar updates left behind by
//! partial failures (calendar mutated, ledger write failed, or the reverse on
//! cancellation) and applies them until the calendar agrees with the ledger
//! again. Join handles are tracked, cancellation is explicit, and stopping
//! waits for the task with a bounded timeout.

use std::sync::Arc;
use std::time::Duration;

use careslot_core::{CalendarPort, RelabelOutbox, UpdateGuard};
use careslot_domain::{CareslotError, RelabelRecord, Result};
use chrono::Utc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Configuration for the relabel reconciler.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Interval between polling attempts
    pub poll_interval: Duration,
    /// Maximum number of records to process per pass
    pub batch_size: usize,
    /// Attempts before a record is abandoned
    pub max_attempts: i64,
    /// Join timeout when stopping
    pub join_timeout: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            batch_size: 16,
            max_attempts: 8,
            join_timeout: Duration::from_secs(5),
        }
    }
}

/// Relabel reconciler with explicit lifecycle management.
pub struct RelabelReconciler {
    outbox: Arc<dyn RelabelOutbox>,
    calendar: Arc<dyn CalendarPort>,
    config: ReconcilerConfig,
    cancellation: CancellationToken,
    task_handle: Option<JoinHandle<()>>,
}

impl RelabelReconciler {
    /// Create a new reconciler with the given configuration.
    pub fn new(
        outbox: Arc<dyn RelabelOutbox>,
        calendar: Arc<dyn CalendarPort>,
        config: ReconcilerConfig,
    ) -> Self {
        Self { outbox, calendar, config, cancellation: CancellationToken::new(), task_handle: None }
    }

    /// Whether the background task is currently running.
    pub fn is_running(&self) -> bool {
        self.task_handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Start the worker, spawning the background processing task.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Err(CareslotError::Internal("reconciler already running".to_string()));
        }

        info!(poll_interval_secs = self.config.poll_interval.as_secs(), "starting reconciler");

        self.cancellation = CancellationToken::new();
        let token = self.cancellation.clone();
        let outbox = Arc::clone(&self.outbox);
        let calendar = Arc::clone(&self.calendar);
        let config = self.config.clone();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(config.poll_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        debug!("reconciler cancelled");
                        break;
                    }
                    _ = interval.tick() => {
                        if let Err(err) = Self::process_due(&outbox, &calendar, &config).await {
                            error!(error = %err, "relabel reconciliation pass failed");
                        }
                    }
                }
            }
        });

        self.task_handle = Some(handle);

        Ok(())
    }

    /// Stop the worker, waiting for the task with a bounded timeout.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> Result<()> {
        self.cancellation.cancel();

        if let Some(handle) = self.task_handle.take() {
            match tokio::time::timeout(self.config.join_timeout, handle).await {
                Ok(Ok(())) => debug!("reconciler stopped"),
                Ok(Err(err)) => {
                    return Err(CareslotError::Internal(format!(
                        "reconciler task join error: {err}"
                    )));
                }
                Err(_) => {
                    warn!("reconciler did not stop within join timeout");
                }
            }
        }

        Ok(())
    }

    /// Apply every due record once: success or a vanished slot completes the
    /// record, anything else reschedules it with backoff until the attempt
    /// budget is spent.
    pub(crate) async fn process_due(
        outbox: &Arc<dyn RelabelOutbox>,
        calendar: &Arc<dyn CalendarPort>,
        config: &ReconcilerConfig,
    ) -> Result<()> {
        let now = Utc::now().timestamp();
        let batch = outbox.due_batch(now, config.batch_size).await?;

        for record in batch {
            match Self::apply(calendar, &record).await {
                Ok(()) => {
                    info!(slot_ref = %record.slot_ref, "compensating relabel applied");
                    outbox.mark_done(&record.id).await?;
                }
                Err(CareslotError::NotFound(_)) => {
                    warn!(slot_ref = %record.slot_ref, "slot vanished upstream; dropping relabel");
                    outbox.mark_done(&record.id).await?;
                }
                Err(err) => {
                    let attempts = record.attempts + 1;
                    if attempts >= config.max_attempts {
                        error!(
                            slot_ref = %record.slot_ref,
                            attempts,
                            error = %err,
                            "giving up on compensating relabel"
                        );
                        outbox.mark_abandoned(&record.id, &err.to_string()).await?;
                    } else {
                        let delay_secs = backoff_delay_ms(attempts as u32).div_ceil(1000) as i64;
                        warn!(
                            slot_ref = %record.slot_ref,
                            attempts,
                            delay_secs,
                            error = %err,
                            "compensating relabel failed; rescheduling"
                        );
                        outbox.mark_failed(&record.id, &err.to_string(), now + delay_secs).await?;
                    }
                }
            }
        }

        Ok(())
    }

    async fn apply(calendar: &Arc<dyn CalendarPort>, record: &RelabelRecord) -> Result<()> {
        let slot = calendar.get_slot(&record.slot_ref).await?;
        let relabeled = slot.with_summary(record.target_summary.clone());
        calendar.update_slot(&relabeled, UpdateGuard::Unconditional).await?;
        Ok(())
    }
}

/// Calculate exponential backoff delay with jitter, in milliseconds.
pub fn backoff_delay_ms(attempt: u32) -> u64 {
    let base_delay = 1000u64;
    let max_delay = 32000u64;

    let delay = base_delay * 2u64.pow(attempt.min(5));
    let capped_delay = delay.min(max_delay);

    // Add ±25% jitter
    use rand::Rng;
    let jitter_range = (capped_delay as f64 * 0.25) as u64;
    let mut rng = rand::thread_rng();
    let jitter = rng.gen_range(0..=jitter_range * 2) as i64 - jitter_range as i64;

    (capped_delay as i64 + jitter).max(0) as u64
}
