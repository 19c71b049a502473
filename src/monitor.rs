//! Transaction lifecycle monitoring
//!
//! A submitted transaction is tracked through a pending → confirmed/failed
//! state machine by polling the node at a fixed interval, with a
//! caller-supplied deadline after which the monitor reports `TimedOut` (a
//! distinct outcome, not a failure). Each monitored hash is one cooperative
//! tokio task; polls are suspend points, never blocking calls. The node is
//! reached through the [`TransactionFetcher`] seam so the state machine can
//! be driven by mocks in tests.
//!
//! Guarantees per monitored hash: pending updates (if any) always precede the
//! terminal update, exactly one terminal update is delivered, and no polls or
//! callbacks happen after a terminal state or after cancellation
//! (cancellation takes effect within one poll interval).

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::client::TransactionDetail;
use crate::constants::{TX_STATUS_FAILED, TX_STATUS_SUCCESS};
use crate::error::{Error, Result};

/// Lifecycle states of a monitored transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    Pending,
    Confirmed,
    Failed,
    /// The configured deadline elapsed without a terminal node status.
    TimedOut,
}

impl TransactionStatus {
    /// Terminal states stop the monitor.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }
}

/// A broadcast transaction as the caller tracks it.
///
/// The status is monotonic: once terminal it never reverts to pending.
#[derive(Debug, Clone)]
pub struct TransactionRecord {
    pub hash: String,
    pub status: TransactionStatus,
    pub submitted_at: SystemTime,
}

impl TransactionRecord {
    /// New pending record for a freshly broadcast hash.
    pub fn new(hash: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            status: TransactionStatus::Pending,
            submitted_at: SystemTime::now(),
        }
    }

    /// Advance the status, enforcing monotonicity. Returns whether the status
    /// changed; transitions out of a terminal state are ignored.
    pub fn advance(&mut self, next: TransactionStatus) -> bool {
        if self.status.is_terminal() || self.status == next {
            return false;
        }
        self.status = next;
        true
    }
}

/// Node access needed by the monitor.
///
/// Implemented by [`crate::client::KleverClient`]; tests provide scripted
/// implementations.
pub trait TransactionFetcher: Send + Sync {
    /// Fetch the current transaction status snapshot.
    fn transaction(&self, hash: &str) -> impl Future<Output = Result<TransactionDetail>> + Send;

    /// Fetch the full transaction detail, including logs.
    fn transaction_with_results(
        &self,
        hash: &str,
    ) -> impl Future<Output = Result<TransactionDetail>> + Send;
}

impl<T: TransactionFetcher> TransactionFetcher for &T {
    fn transaction(&self, hash: &str) -> impl Future<Output = Result<TransactionDetail>> + Send {
        (**self).transaction(hash)
    }

    fn transaction_with_results(
        &self,
        hash: &str,
    ) -> impl Future<Output = Result<TransactionDetail>> + Send {
        (**self).transaction_with_results(hash)
    }
}

impl<T: TransactionFetcher> TransactionFetcher for Arc<T> {
    fn transaction(&self, hash: &str) -> impl Future<Output = Result<TransactionDetail>> + Send {
        (**self).transaction(hash)
    }

    fn transaction_with_results(
        &self,
        hash: &str,
    ) -> impl Future<Output = Result<TransactionDetail>> + Send {
        (**self).transaction_with_results(hash)
    }
}

/// Poll cadence and deadline for one monitored transaction.
///
/// Both values are caller-supplied; the SDK fixes no defaults.
#[derive(Debug, Clone, Copy)]
pub struct MonitorConfig {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl MonitorConfig {
    pub fn new(poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            poll_interval,
            timeout,
        }
    }
}

/// Terminal result of one monitored transaction.
#[derive(Debug, Clone)]
pub struct TransactionOutcome {
    pub hash: String,
    pub status: TransactionStatus,
    /// Full node detail (with logs) on confirmation or failure
    pub detail: Option<TransactionDetail>,
}

impl TransactionOutcome {
    pub fn is_confirmed(&self) -> bool {
        self.status == TransactionStatus::Confirmed
    }
}

/// Incremental update delivered by a watching monitor.
#[derive(Debug, Clone)]
pub enum TransactionUpdate {
    /// The hash was seen but has no terminal status yet
    Pending { hash: String },
    /// The single terminal update for this hash
    Terminal(TransactionOutcome),
}

/// Polls the node for a submitted hash until it reaches a terminal state or
/// the deadline passes.
pub struct TransactionMonitor<F> {
    fetcher: F,
    config: MonitorConfig,
}

enum PollStep {
    Terminal(TransactionOutcome),
    Pending,
    /// Transient fetch error: logged, polling continues
    Transient,
}

impl<F: TransactionFetcher> TransactionMonitor<F> {
    pub fn new(fetcher: F, config: MonitorConfig) -> Self {
        Self { fetcher, config }
    }

    /// Drive the poll loop inline until a terminal outcome.
    ///
    /// Timing out is a normal outcome (`status == TimedOut`), not an error.
    pub async fn wait(&self, hash: &str) -> Result<TransactionOutcome> {
        let started = Instant::now();
        loop {
            if started.elapsed() >= self.config.timeout {
                info!(hash, "transaction monitor timed out");
                return Ok(TransactionOutcome {
                    hash: hash.to_string(),
                    status: TransactionStatus::TimedOut,
                    detail: None,
                });
            }
            if let PollStep::Terminal(outcome) = self.poll_once(hash).await {
                return Ok(outcome);
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    /// Like [`wait`](Self::wait), but treats the deadline as an error:
    /// a timed-out transaction becomes [`Error::Timeout`].
    pub async fn wait_finalized(&self, hash: &str) -> Result<TransactionOutcome> {
        let outcome = self.wait(hash).await?;
        if outcome.status == TransactionStatus::TimedOut {
            return Err(Error::Timeout {
                hash: hash.to_string(),
                timeout: self.config.timeout,
            });
        }
        Ok(outcome)
    }

    async fn poll_once(&self, hash: &str) -> PollStep {
        match self.fetcher.transaction(hash).await {
            Ok(detail) => match classify(detail.status.as_deref()) {
                TransactionStatus::Confirmed => {
                    info!(hash, "transaction confirmed");
                    let detail = self.fetch_full_detail(hash, detail).await;
                    PollStep::Terminal(TransactionOutcome {
                        hash: hash.to_string(),
                        status: TransactionStatus::Confirmed,
                        detail: Some(detail),
                    })
                }
                TransactionStatus::Failed => {
                    info!(hash, result_code = ?detail.result_code, "transaction failed");
                    PollStep::Terminal(TransactionOutcome {
                        hash: hash.to_string(),
                        status: TransactionStatus::Failed,
                        detail: Some(detail),
                    })
                }
                _ => {
                    debug!(hash, "transaction still pending");
                    PollStep::Pending
                }
            },
            Err(e) => {
                warn!(hash, error = %e, "transient error polling transaction, will retry");
                PollStep::Transient
            }
        }
    }

    /// After confirmation, fetch the detail with logs so the caller can hand
    /// it to the return decoder. Falls back to the status-poll detail if the
    /// follow-up fetch fails.
    async fn fetch_full_detail(&self, hash: &str, fallback: TransactionDetail) -> TransactionDetail {
        match self.fetcher.transaction_with_results(hash).await {
            Ok(detail) => detail,
            Err(e) => {
                warn!(hash, error = %e, "could not fetch transaction results, using status snapshot");
                fallback
            }
        }
    }
}

impl<F> TransactionMonitor<F>
where
    F: TransactionFetcher + Clone + Send + Sync + 'static,
{
    /// Spawn a background task polling the hash, and return a handle
    /// delivering incremental [`TransactionUpdate`]s.
    ///
    /// Dropping the handle (or calling [`MonitorHandle::cancel`]) stops the
    /// task within one poll interval without delivering further updates.
    pub fn watch(&self, hash: &str) -> MonitorHandle {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let (cancel_tx, mut cancel_rx) = watch::channel(false);
        let monitor = TransactionMonitor::new(self.fetcher.clone(), self.config);
        let hash = hash.to_string();
        let task_hash = hash.clone();

        let task = tokio::spawn(async move {
            let started = Instant::now();
            loop {
                if *cancel_rx.borrow() {
                    return;
                }
                if started.elapsed() >= monitor.config.timeout {
                    let _ = update_tx.send(TransactionUpdate::Terminal(TransactionOutcome {
                        hash: task_hash,
                        status: TransactionStatus::TimedOut,
                        detail: None,
                    }));
                    return;
                }
                match monitor.poll_once(&task_hash).await {
                    PollStep::Terminal(outcome) => {
                        if !*cancel_rx.borrow() {
                            let _ = update_tx.send(TransactionUpdate::Terminal(outcome));
                        }
                        return;
                    }
                    PollStep::Pending => {
                        if !*cancel_rx.borrow() {
                            let _ = update_tx.send(TransactionUpdate::Pending {
                                hash: task_hash.clone(),
                            });
                        }
                    }
                    PollStep::Transient => {}
                }
                tokio::select! {
                    _ = cancel_rx.changed() => return,
                    _ = tokio::time::sleep(monitor.config.poll_interval) => {}
                }
            }
        });

        MonitorHandle {
            hash,
            updates: update_rx,
            cancel: cancel_tx,
            task,
        }
    }
}

fn classify(status: Option<&str>) -> TransactionStatus {
    match status {
        Some(TX_STATUS_SUCCESS) => TransactionStatus::Confirmed,
        Some(TX_STATUS_FAILED) => TransactionStatus::Failed,
        _ => TransactionStatus::Pending,
    }
}

/// Handle to a background monitor task.
pub struct MonitorHandle {
    hash: String,
    updates: mpsc::UnboundedReceiver<TransactionUpdate>,
    cancel: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// The monitored transaction hash.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Receive the next update. `None` means the monitor stopped: either the
    /// terminal update was already delivered or the monitor was cancelled.
    pub async fn recv(&mut self) -> Option<TransactionUpdate> {
        self.updates.recv().await
    }

    /// Stop polling. No further updates will be delivered.
    pub fn cancel(&self) {
        let _ = self.cancel.send(true);
    }

    /// Wait for the background task to finish.
    pub async fn join(self) {
        let _ = self.task.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Clone, Copy)]
    enum Step {
        Pending,
        Success,
        Fail,
        Outage,
    }

    /// Fetcher that replays a script, repeating the last step forever.
    #[derive(Clone)]
    struct ScriptedFetcher {
        steps: Arc<Mutex<VecDeque<Step>>>,
        last: Step,
        status_calls: Arc<AtomicUsize>,
        detail_calls: Arc<AtomicUsize>,
    }

    impl ScriptedFetcher {
        fn new(steps: Vec<Step>, last: Step) -> Self {
            Self {
                steps: Arc::new(Mutex::new(steps.into())),
                last,
                status_calls: Arc::new(AtomicUsize::new(0)),
                detail_calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn next_step(&self) -> Step {
            self.steps.lock().unwrap().pop_front().unwrap_or(self.last)
        }

        fn detail_for(step: Step) -> Result<TransactionDetail> {
            match step {
                Step::Pending => Ok(TransactionDetail {
                    status: Some("pending".to_string()),
                    ..Default::default()
                }),
                Step::Success => Ok(TransactionDetail {
                    status: Some("success".to_string()),
                    ..Default::default()
                }),
                Step::Fail => Ok(TransactionDetail {
                    status: Some("fail".to_string()),
                    result_code: Some("out of gas".to_string()),
                    ..Default::default()
                }),
                Step::Outage => Err(Error::Abi("simulated node outage".to_string())),
            }
        }
    }

    impl TransactionFetcher for ScriptedFetcher {
        fn transaction(
            &self,
            _hash: &str,
        ) -> impl Future<Output = Result<TransactionDetail>> + Send {
            self.status_calls.fetch_add(1, Ordering::SeqCst);
            let step = self.next_step();
            async move { Self::detail_for(step) }
        }

        fn transaction_with_results(
            &self,
            _hash: &str,
        ) -> impl Future<Output = Result<TransactionDetail>> + Send {
            self.detail_calls.fetch_add(1, Ordering::SeqCst);
            async move {
                Ok(TransactionDetail {
                    status: Some("success".to_string()),
                    result_code: Some("Ok".to_string()),
                    ..Default::default()
                })
            }
        }
    }

    fn fast_config() -> MonitorConfig {
        MonitorConfig::new(Duration::from_secs(2), Duration::from_secs(60))
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_confirms_after_pending_polls() {
        let fetcher = ScriptedFetcher::new(
            vec![Step::Pending, Step::Pending, Step::Pending],
            Step::Success,
        );
        let monitor = TransactionMonitor::new(fetcher.clone(), fast_config());

        let outcome = monitor.wait("hash-1").await.unwrap();
        assert_eq!(outcome.status, TransactionStatus::Confirmed);
        assert!(outcome.detail.is_some());
        // three pending polls plus the terminal one, then nothing
        assert_eq!(fetcher.status_calls.load(Ordering::SeqCst), 4);
        // full detail fetched exactly once, on confirmation
        assert_eq!(fetcher.detail_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_reports_failure_with_detail() {
        let fetcher = ScriptedFetcher::new(vec![Step::Pending], Step::Fail);
        let monitor = TransactionMonitor::new(fetcher.clone(), fast_config());

        let outcome = monitor.wait("hash-2").await.unwrap();
        assert_eq!(outcome.status, TransactionStatus::Failed);
        assert_eq!(
            outcome.detail.unwrap().result_code.as_deref(),
            Some("out of gas")
        );
        // failure keeps the status snapshot, no extra detail fetch
        assert_eq!(fetcher.detail_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_times_out_without_terminal_status() {
        let fetcher = ScriptedFetcher::new(vec![], Step::Pending);
        let config = MonitorConfig::new(Duration::from_secs(2), Duration::from_secs(10));
        let monitor = TransactionMonitor::new(fetcher.clone(), config);

        let outcome = monitor.wait("hash-3").await.unwrap();
        assert_eq!(outcome.status, TransactionStatus::TimedOut);
        assert!(outcome.detail.is_none());
        // polls at t = 0, 2, 4, 6, 8; none at or after the deadline
        assert_eq!(fetcher.status_calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_finalized_maps_timeout_to_error() {
        let fetcher = ScriptedFetcher::new(vec![], Step::Pending);
        let config = MonitorConfig::new(Duration::from_secs(2), Duration::from_secs(6));
        let monitor = TransactionMonitor::new(fetcher, config);

        let err = monitor.wait_finalized("hash-4").await.unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_do_not_transition() {
        let fetcher = ScriptedFetcher::new(
            vec![Step::Outage, Step::Outage, Step::Pending],
            Step::Success,
        );
        let monitor = TransactionMonitor::new(fetcher.clone(), fast_config());

        let outcome = monitor.wait("hash-5").await.unwrap();
        assert_eq!(outcome.status, TransactionStatus::Confirmed);
        assert_eq!(fetcher.status_calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_emits_pending_then_exactly_one_terminal() {
        let fetcher = ScriptedFetcher::new(vec![Step::Pending, Step::Pending], Step::Success);
        let monitor = TransactionMonitor::new(fetcher.clone(), fast_config());

        let mut handle = monitor.watch("hash-6");
        let mut pending = 0;
        let mut terminal = 0;
        while let Some(update) = handle.recv().await {
            match update {
                TransactionUpdate::Pending { .. } => pending += 1,
                TransactionUpdate::Terminal(outcome) => {
                    assert_eq!(outcome.status, TransactionStatus::Confirmed);
                    terminal += 1;
                }
            }
        }
        assert_eq!(pending, 2);
        assert_eq!(terminal, 1);
        handle.join().await;
        // no polls after the terminal state
        assert_eq!(fetcher.status_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_timeout_emits_single_terminal() {
        let fetcher = ScriptedFetcher::new(vec![], Step::Pending);
        let config = MonitorConfig::new(Duration::from_secs(2), Duration::from_secs(6));
        let monitor = TransactionMonitor::new(fetcher, config);

        let mut handle = monitor.watch("hash-7");
        let mut updates = Vec::new();
        while let Some(update) = handle.recv().await {
            updates.push(update);
        }
        let terminal: Vec<_> = updates
            .iter()
            .filter(|u| matches!(u, TransactionUpdate::Terminal(_)))
            .collect();
        assert_eq!(terminal.len(), 1);
        assert!(matches!(
            terminal[0],
            TransactionUpdate::Terminal(TransactionOutcome {
                status: TransactionStatus::TimedOut,
                ..
            })
        ));
        // the terminal update is the last one delivered
        assert!(matches!(updates.last(), Some(TransactionUpdate::Terminal(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_polls_and_updates() {
        let fetcher = ScriptedFetcher::new(vec![], Step::Pending);
        let monitor = TransactionMonitor::new(fetcher.clone(), fast_config());

        let mut handle = monitor.watch("hash-8");
        // let one pending update through, then cancel
        let first = handle.recv().await;
        assert!(matches!(first, Some(TransactionUpdate::Pending { .. })));
        handle.cancel();

        while let Some(update) = handle.recv().await {
            assert!(
                !matches!(update, TransactionUpdate::Terminal(_)),
                "no terminal update may follow cancellation"
            );
        }
        let polls_at_cancel = fetcher.status_calls.load(Ordering::SeqCst);
        handle.join().await;

        // task is gone; the poll count can never grow again
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(fetcher.status_calls.load(Ordering::SeqCst), polls_at_cancel);
    }

    #[test]
    fn test_record_status_is_monotonic() {
        let mut record = TransactionRecord::new("hash-9");
        assert_eq!(record.status, TransactionStatus::Pending);
        assert!(!record.advance(TransactionStatus::Pending));
        assert!(record.advance(TransactionStatus::Confirmed));
        // terminal states are sticky
        assert!(!record.advance(TransactionStatus::Pending));
        assert!(!record.advance(TransactionStatus::Failed));
        assert_eq!(record.status, TransactionStatus::Confirmed);
    }

    #[test]
    fn test_classify_markers() {
        assert_eq!(classify(Some("success")), TransactionStatus::Confirmed);
        assert_eq!(classify(Some("fail")), TransactionStatus::Failed);
        assert_eq!(classify(Some("pending")), TransactionStatus::Pending);
        assert_eq!(classify(None), TransactionStatus::Pending);
    }
}
