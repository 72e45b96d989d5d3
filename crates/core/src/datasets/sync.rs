//! Polling loop that waits for server-side computation
//!
//! [`Dataset::iterate_updated`] repeatedly reloads the records that are not
//! yet terminal, merging status changes into the record map. The loop is
//! bounded by an iteration budget and optionally by a timeout and a
//! cancellation token; all three exits are reported, not raised.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use qcportal_domain::constants::{
    DEFAULT_POLL_BACKOFF_FACTOR, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_POLL_MAX_INTERVAL_SECS,
    DEFAULT_POLL_MAX_ITERATIONS,
};
use qcportal_domain::{DatasetKind, RecordItemQuery, RecordKey, Result};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use super::cache::Dataset;

/// Bounds and pacing for [`Dataset::iterate_updated`]
#[derive(Debug, Clone)]
pub struct PollOptions {
    /// Delay after the first poll
    pub interval: Duration,
    /// Upper bound for the backed-off delay
    pub max_interval: Duration,
    /// Multiplier applied to the delay after each poll
    pub backoff_factor: f64,
    /// Maximum number of polls
    pub max_iterations: u32,
    /// Overall wall-clock bound
    pub timeout: Option<Duration>,
    pub cancel: Option<CancellationToken>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            max_interval: Duration::from_secs(DEFAULT_POLL_MAX_INTERVAL_SECS),
            backoff_factor: DEFAULT_POLL_BACKOFF_FACTOR,
            max_iterations: DEFAULT_POLL_MAX_ITERATIONS,
            timeout: None,
            cancel: None,
        }
    }
}

impl PollOptions {
    #[must_use]
    pub const fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub const fn max_interval(mut self, max_interval: Duration) -> Self {
        self.max_interval = max_interval;
        self
    }

    #[must_use]
    pub const fn backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = factor;
        self
    }

    #[must_use]
    pub const fn max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn cancel_on(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Delay after poll number `attempt` (0-based): `interval * factor^attempt`,
    /// capped at `max_interval`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.backoff_factor.max(1.0);
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let scaled = self.interval.as_secs_f64() * factor.powi(exponent);
        let capped = scaled.min(self.max_interval.as_secs_f64()).max(0.0);
        Duration::try_from_secs_f64(capped).unwrap_or(self.max_interval)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }
}

/// Why the polling loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollExit {
    /// Every tracked record is terminal
    AllTerminal,
    IterationBudgetExhausted,
    TimedOut,
    Cancelled,
}

/// Summary of one [`Dataset::iterate_updated`] call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateReport {
    /// Number of polls issued
    pub iterations: u32,
    /// Pairs whose status changed during the loop
    pub updated: BTreeSet<RecordKey>,
    /// Pairs still not terminal at exit
    pub pending: Vec<RecordKey>,
    pub exit: PollExit,
}

impl UpdateReport {
    pub fn is_complete(&self) -> bool {
        self.exit == PollExit::AllTerminal
    }
}

impl<K: DatasetKind> Dataset<K> {
    /// Poll the server until every cached record is terminal or a bound is hit
    ///
    /// Records with an unknown status count as pending, so a fresh submit can
    /// be followed directly by this call. When no record is cached yet, the
    /// first poll loads every record of the dataset.
    ///
    /// A timeout too large to be represented as a deadline is treated as no
    /// timeout.
    #[instrument(
        skip(self, options),
        fields(dataset_id = self.id(), max_iterations = options.max_iterations)
    )]
    pub async fn iterate_updated(&mut self, options: PollOptions) -> Result<UpdateReport> {
        let deadline = options.timeout.and_then(|t| Instant::now().checked_add(t));
        let mut unseeded = self.record_keys().next().is_none();
        let mut updated = BTreeSet::new();
        let mut iterations = 0;

        let exit = loop {
            let pending = self.pending_keys();
            if pending.is_empty() && !unseeded {
                break PollExit::AllTerminal;
            }
            if options.is_cancelled() {
                break PollExit::Cancelled;
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                break PollExit::TimedOut;
            }
            if iterations >= options.max_iterations {
                break PollExit::IterationBudgetExhausted;
            }

            let changed = if unseeded {
                unseeded = false;
                self.poll_all().await?
            } else {
                self.poll_pending(&pending).await?
            };
            debug!(
                iteration = iterations,
                pending = pending.len(),
                changed = changed.len(),
                "polled records"
            );
            updated.extend(changed);
            iterations += 1;

            if self.pending_keys().is_empty() {
                break PollExit::AllTerminal;
            }
            if iterations >= options.max_iterations {
                break PollExit::IterationBudgetExhausted;
            }

            let mut delay = options.delay_for(iterations - 1);
            if let Some(d) = deadline {
                let remaining = d.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    break PollExit::TimedOut;
                }
                delay = delay.min(remaining);
            }

            if let Some(exit) = wait(delay, options.cancel.as_ref()).await {
                break exit;
            }
        };

        let pending = self.pending_keys();
        info!(
            iterations,
            updated = updated.len(),
            pending = pending.len(),
            ?exit,
            "finished polling"
        );
        Ok(UpdateReport { iterations, updated, pending, exit })
    }

    /// Reload pending pairs, one request per specification
    async fn poll_pending(&mut self, pending: &[RecordKey]) -> Result<Vec<RecordKey>> {
        let mut by_spec: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        for key in pending {
            by_spec
                .entry(key.specification_name.as_str())
                .or_default()
                .push(key.entry_name.clone());
        }

        let mut changed = Vec::new();
        for (spec, entries) in by_spec {
            let query = RecordItemQuery {
                entry_names: Some(entries),
                specification_names: Some(vec![spec.to_string()]),
                status: None,
            };
            changed.extend(self.poll_query(&query).await?);
        }
        Ok(changed)
    }

    /// Load every record of the dataset
    async fn poll_all(&mut self) -> Result<Vec<RecordKey>> {
        self.poll_query(&RecordItemQuery::default()).await
    }

    async fn poll_query(&mut self, query: &RecordItemQuery) -> Result<Vec<RecordKey>> {
        let items = self.port_fetch_items(query).await?;
        let mut changed = Vec::new();
        for item in items {
            let key = item.key();
            if self.merge_item(item) {
                changed.push(key);
            }
        }
        Ok(changed)
    }
}

async fn wait(delay: Duration, cancel: Option<&CancellationToken>) -> Option<PollExit> {
    match cancel {
        Some(token) => {
            tokio::select! {
                () = token.cancelled() => Some(PollExit::Cancelled),
                () = tokio::time::sleep(delay) => None,
            }
        }
        None => {
            tokio::time::sleep(delay).await;
            None
        }
    }
}
