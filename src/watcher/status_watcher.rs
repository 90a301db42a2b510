use alloy_primitives::B256;
use bon::Builder;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn, Instrument, Span};

use super::config::WatchConfig;
use crate::error::{QueryError, WatchError};
use crate::protocol::Cctx;
use crate::spans;
use crate::traits::{CctxQueryClient, Clock};

/// Waits for every CCTX produced by an inbound transaction to reach a
/// terminal status.
///
/// The watch runs in two phases. First the inbound hash is resolved to its
/// CCTX indexes, retrying until the ledger has indexed at least one. Then one
/// task per index polls the ledger until that CCTX is terminal, and the
/// results are gathered in the order the index listed them.
///
/// Query failures are logged and retried. The watch ends early only through
/// the caller's [`CancellationToken`], [`WatchConfig::timeout`] or
/// [`WatchConfig::max_consecutive_failures`].
///
/// # Example
///
/// ```rust,no_run
/// use cctx_relay::providers::{RestCctxQueryClient, TokioClock};
/// use cctx_relay::{StatusWatcher, WatchConfig};
/// use alloy_primitives::B256;
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let watcher = StatusWatcher::builder()
///     .client(Arc::new(RestCctxQueryClient::new("http://localhost:1317")?))
///     .clock(Arc::new(TokioClock::new()))
///     .config(WatchConfig::default())
///     .build();
///
/// let cctxs = watcher
///     .await_terminal(B256::ZERO, CancellationToken::new())
///     .await?;
/// for cctx in cctxs {
///     println!("{} {}", cctx.index(), cctx.status().status);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Builder, Debug)]
pub struct StatusWatcher<Q, C> {
    client: Arc<Q>,
    clock: Arc<C>,
    #[builder(default)]
    config: WatchConfig,
}

impl<Q, C> Clone for StatusWatcher<Q, C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            clock: Arc::clone(&self.clock),
            config: self.config,
        }
    }
}

impl<Q, C> StatusWatcher<Q, C>
where
    Q: CctxQueryClient + 'static,
    C: Clock + 'static,
{
    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    /// Blocks until every CCTX indexed under `inbound_hash` is terminal.
    ///
    /// # Errors
    ///
    /// - [`WatchError::Cancelled`] once `cancel` fires
    /// - [`WatchError::DeadlineExceeded`] when the configured timeout elapses,
    ///   carrying the CCTX that did finish
    /// - [`WatchError::QueryFailuresExhausted`] when failure escalation is
    ///   configured and one key keeps failing
    pub async fn await_terminal(
        &self,
        inbound_hash: B256,
        cancel: CancellationToken,
    ) -> Result<Vec<Cctx>, WatchError> {
        let span = spans::await_terminal(
            &inbound_hash,
            self.config.resolve_interval.as_secs(),
            self.config.poll_interval.as_secs(),
        );

        async move {
            info!(event = "watch_started");

            let result = match self.stream_terminal(inbound_hash, cancel).await {
                Ok(stream) => {
                    Span::current().record("cctx_count", stream.indexes().len());
                    stream.finish().await
                }
                Err(e) => Err(e),
            };

            match &result {
                Ok(cctxs) => info!(cctx_count = cctxs.len(), event = "watch_completed"),
                Err(e) => {
                    spans::record_error(e);
                    warn!(error = %e, event = "watch_failed");
                }
            }
            result
        }
        .instrument(span)
        .await
    }

    /// Resolves `inbound_hash` and starts polling, yielding each CCTX as it
    /// turns terminal.
    ///
    /// Returns once the index is resolved; dropping the stream stops its pollers.
    pub async fn stream_terminal(
        &self,
        inbound_hash: B256,
        cancel: CancellationToken,
    ) -> Result<TerminalStream, WatchError> {
        let deadline = self.config.timeout.map(|timeout| self.clock.now() + timeout);

        let indexes = self
            .resolve(inbound_hash, deadline, &cancel)
            .instrument(spans::resolve_inbound(&inbound_hash))
            .await?;

        Ok(self.spawn_pollers(indexes, deadline, cancel.child_token()))
    }

    async fn resolve(
        &self,
        inbound_hash: B256,
        deadline: Option<Instant>,
        cancel: &CancellationToken,
    ) -> Result<Vec<B256>, WatchError> {
        let mut failures = 0u32;

        loop {
            if let Some(stop) = pause(
                self.clock.as_ref(),
                self.config.resolve_interval,
                deadline,
                cancel,
            )
            .await
            {
                return Err(match stop {
                    Stop::Cancelled => WatchError::Cancelled,
                    Stop::Expired => WatchError::DeadlineExceeded {
                        pending: Vec::new(),
                        completed: Vec::new(),
                    },
                });
            }

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(WatchError::Cancelled),
                result = self.client.inbound_hash_to_cctx(inbound_hash) => result,
                _ = expiry(self.clock.as_ref(), deadline) => {
                    warn!(event = "inbound_hash_query_expired");
                    return Err(WatchError::DeadlineExceeded {
                        pending: Vec::new(),
                        completed: Vec::new(),
                    });
                }
            };

            match result {
                Ok(indexes) if !indexes.is_empty() => {
                    let indexes = dedup(indexes);
                    info!(cctx_count = indexes.len(), event = "inbound_hash_resolved");
                    return Ok(indexes);
                }
                Ok(_) | Err(QueryError::NotFound { .. }) => {
                    failures = 0;
                    debug!(event = "inbound_hash_not_indexed");
                }
                Err(e) => {
                    failures += 1;
                    warn!(error = %e, attempt = failures, event = "inbound_hash_query_failed");
                    if self.config.failures_exhausted(failures) {
                        return Err(WatchError::QueryFailuresExhausted {
                            key: inbound_hash,
                            attempts: failures,
                            last_error: e,
                        });
                    }
                }
            }
        }
    }

    fn spawn_pollers(
        &self,
        indexes: Vec<B256>,
        deadline: Option<Instant>,
        cancel: CancellationToken,
    ) -> TerminalStream {
        let (tx, rx) = mpsc::channel(indexes.len().max(1));
        let mut tasks = JoinSet::new();

        for (position, index) in indexes.iter().copied().enumerate() {
            let client = Arc::clone(&self.client);
            let clock = Arc::clone(&self.clock);
            let config = self.config;
            let cancel = cancel.clone();
            let tx = tx.clone();

            tasks.spawn(
                async move {
                    let outcome = poll_until_terminal(
                        client.as_ref(),
                        clock.as_ref(),
                        index,
                        &config,
                        deadline,
                        &cancel,
                    )
                    .await;
                    if tx.send((position, outcome)).await.is_err() {
                        debug!(event = "watch_receiver_dropped");
                    }
                }
                .instrument(spans::poll_cctx(&index)),
            );
        }

        TerminalStream {
            completed: vec![None; indexes.len()],
            indexes,
            outcomes: rx,
            tasks,
            cancel,
            done: false,
        }
    }
}

/// CCTX of one watch, delivered as each reaches a terminal status.
///
/// Dropping the stream cancels the pollers that are still running.
#[derive(Debug)]
pub struct TerminalStream {
    indexes: Vec<B256>,
    completed: Vec<Option<Cctx>>,
    outcomes: mpsc::Receiver<(usize, PollOutcome)>,
    tasks: JoinSet<()>,
    cancel: CancellationToken,
    done: bool,
}

impl TerminalStream {
    /// Indexes being watched, in ledger order.
    pub fn indexes(&self) -> &[B256] {
        &self.indexes
    }

    /// Returns the next CCTX to turn terminal.
    ///
    /// Yields `None` once all are terminal. After an error is yielded the
    /// stream is finished. A poller that panics ends the stream with
    /// [`WatchError::PollerFailed`].
    pub async fn next(&mut self) -> Option<Result<Cctx, WatchError>> {
        while !self.done {
            let received = tokio::select! {
                biased;
                received = self.outcomes.recv() => received,
                Some(joined) = self.tasks.join_next(), if !self.tasks.is_empty() => {
                    if let Err(e) = joined {
                        let err = self.poller_failed(e);
                        return Some(Err(self.stop(err)));
                    }
                    continue;
                }
            };

            match received {
                Some((position, PollOutcome::Terminal(cctx))) => {
                    self.completed[position] = Some(cctx.clone());
                    return Some(Ok(cctx));
                }
                Some((_, PollOutcome::Expired)) => continue,
                Some((_, PollOutcome::Cancelled)) => {
                    return Some(Err(self.stop(WatchError::Cancelled)));
                }
                Some((position, PollOutcome::Exhausted { attempts, last_error })) => {
                    let err = WatchError::QueryFailuresExhausted {
                        key: self.indexes[position],
                        attempts,
                        last_error,
                    };
                    return Some(Err(self.stop(err)));
                }
                None => {
                    self.done = true;
                    if let Some(e) = self.reap().await {
                        return Some(Err(self.poller_failed(e)));
                    }
                    let pending = self.pending();
                    if pending.is_empty() {
                        return None;
                    }
                    return Some(Err(WatchError::DeadlineExceeded {
                        pending,
                        completed: self.completed.iter().flatten().cloned().collect(),
                    }));
                }
            }
        }
        None
    }

    /// Drives the stream to the end and returns every CCTX in ledger order.
    pub async fn finish(mut self) -> Result<Vec<Cctx>, WatchError> {
        while let Some(item) = self.next().await {
            item?;
        }
        Ok(std::mem::take(&mut self.completed)
            .into_iter()
            .flatten()
            .collect())
    }

    fn pending(&self) -> Vec<B256> {
        self.indexes
            .iter()
            .zip(&self.completed)
            .filter(|(_, cctx)| cctx.is_none())
            .map(|(index, _)| *index)
            .collect()
    }

    fn stop(&mut self, err: WatchError) -> WatchError {
        self.done = true;
        self.cancel.cancel();
        err
    }

    /// Waits for the remaining pollers and returns the first failure.
    async fn reap(&mut self) -> Option<JoinError> {
        let mut failure = None;
        while let Some(joined) = self.tasks.join_next().await {
            if let Err(e) = joined {
                failure.get_or_insert(e);
            }
        }
        failure
    }

    fn poller_failed(&self, e: JoinError) -> WatchError {
        error!(error = %e, event = "cctx_poller_failed");
        WatchError::PollerFailed {
            pending: self.pending(),
            reason: e.to_string(),
        }
    }
}

impl Drop for TerminalStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[derive(Debug)]
enum PollOutcome {
    Terminal(Cctx),
    Cancelled,
    Expired,
    Exhausted { attempts: u32, last_error: QueryError },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    Cancelled,
    Expired,
}

async fn poll_until_terminal<Q, C>(
    client: &Q,
    clock: &C,
    index: B256,
    config: &WatchConfig,
    deadline: Option<Instant>,
    cancel: &CancellationToken,
) -> PollOutcome
where
    Q: CctxQueryClient + ?Sized,
    C: Clock + ?Sized,
{
    let mut failures = 0u32;

    loop {
        match pause(clock, config.poll_interval, deadline, cancel).await {
            Some(Stop::Cancelled) => return PollOutcome::Cancelled,
            Some(Stop::Expired) => {
                debug!(event = "cctx_poll_expired");
                return PollOutcome::Expired;
            }
            None => {}
        }

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return PollOutcome::Cancelled,
            result = client.cctx(index) => result,
            _ = expiry(clock, deadline) => {
                debug!(event = "cctx_query_expired");
                return PollOutcome::Expired;
            }
        };

        match result {
            Ok(cctx) if cctx.is_terminal() => {
                info!(
                    status = %cctx.status().status,
                    status_message = %cctx.status().message,
                    event = "cctx_terminal"
                );
                return PollOutcome::Terminal(cctx);
            }
            Ok(cctx) => {
                failures = 0;
                debug!(status = %cctx.status().status, event = "cctx_pending");
            }
            Err(e) => {
                failures += 1;
                warn!(error = %e, attempt = failures, event = "cctx_query_failed");
                if config.failures_exhausted(failures) {
                    return PollOutcome::Exhausted {
                        attempts: failures,
                        last_error: e,
                    };
                }
            }
        }
    }
}

/// Sleeps for `interval`, cut short so that it never passes `deadline`.
async fn pause<C: Clock + ?Sized>(
    clock: &C,
    interval: Duration,
    deadline: Option<Instant>,
    cancel: &CancellationToken,
) -> Option<Stop> {
    let nap = match deadline {
        Some(deadline) => interval.min(deadline.saturating_duration_since(clock.now())),
        None => interval,
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => return Some(Stop::Cancelled),
        _ = clock.sleep(nap) => {}
    }

    if deadline.is_some_and(|deadline| clock.now() >= deadline) {
        return Some(Stop::Expired);
    }
    None
}

/// Resolves once `deadline` passes; never resolves without one.
async fn expiry<C: Clock + ?Sized>(clock: &C, deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => clock.sleep(deadline.saturating_duration_since(clock.now())).await,
        None => std::future::pending().await,
    }
}

fn dedup(indexes: Vec<B256>) -> Vec<B256> {
    let mut unique = Vec::with_capacity(indexes.len());
    for index in indexes {
        if !unique.contains(&index) {
            unique.push(index);
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::TokioClock;
    use crate::testing::FakeClock;
    use async_trait::async_trait;
    use rstest::rstest;

    /// Ledger whose queries never answer, except for `panics_on`.
    #[derive(Default)]
    struct StuckLedger {
        resolved: Vec<B256>,
        panics_on: Option<B256>,
    }

    #[async_trait]
    impl CctxQueryClient for StuckLedger {
        async fn cctx(&self, index: B256) -> Result<Cctx, QueryError> {
            if self.panics_on == Some(index) {
                panic!("query for {index} blew up");
            }
            std::future::pending().await
        }

        async fn inbound_hash_to_cctx(&self, _inbound_hash: B256) -> Result<Vec<B256>, QueryError> {
            if self.resolved.is_empty() {
                return std::future::pending().await;
            }
            Ok(self.resolved.clone())
        }
    }

    fn stuck_watcher<C: Clock>(ledger: StuckLedger, clock: C, config: WatchConfig) -> StatusWatcher<StuckLedger, C> {
        StatusWatcher::builder()
            .client(Arc::new(ledger))
            .clock(Arc::new(clock))
            .config(config)
            .build()
    }

    #[rstest]
    #[case::resolving(vec![], vec![])]
    #[case::polling(vec![B256::repeat_byte(1)], vec![B256::repeat_byte(1)])]
    #[tokio::test(start_paused = true)]
    async fn test_timeout_bounds_unanswered_query(
        #[case] resolved: Vec<B256>,
        #[case] expected_pending: Vec<B256>,
    ) {
        let ledger = StuckLedger {
            resolved,
            ..Default::default()
        };
        let config = WatchConfig::default().with_timeout(Duration::from_secs(10));
        let watcher = stuck_watcher(ledger, TokioClock::new(), config);

        let result = tokio::time::timeout(
            Duration::from_secs(3_600),
            watcher.await_terminal(B256::repeat_byte(0x77), CancellationToken::new()),
        )
        .await
        .expect("watch outlived its timeout");

        let Err(WatchError::DeadlineExceeded { pending, completed }) = result else {
            panic!("expected deadline, got {result:?}");
        };
        assert_eq!(pending, expected_pending);
        assert!(completed.is_empty());
    }

    #[tokio::test]
    async fn test_poller_panic_ends_watch_without_timeout() {
        let ledger = StuckLedger {
            resolved: vec![B256::repeat_byte(1), B256::repeat_byte(2)],
            panics_on: Some(B256::repeat_byte(2)),
        };
        let watcher = stuck_watcher(ledger, FakeClock::new(), WatchConfig::default());

        let err = watcher
            .await_terminal(B256::repeat_byte(0x77), CancellationToken::new())
            .await
            .unwrap_err();

        let WatchError::PollerFailed { pending, reason } = err else {
            panic!("expected poller failure, got {err:?}");
        };
        assert_eq!(pending, vec![B256::repeat_byte(1), B256::repeat_byte(2)]);
        assert!(reason.contains("panic"), "{reason}");
    }

    #[rstest]
    #[case(vec![], vec![])]
    #[case(vec![1, 2, 1, 3, 2], vec![1, 2, 3])]
    #[case(vec![4, 4, 4], vec![4])]
    fn test_dedup_keeps_first_occurrence(#[case] input: Vec<u8>, #[case] expected: Vec<u8>) {
        let input = input.into_iter().map(B256::repeat_byte).collect();
        let expected: Vec<B256> = expected.into_iter().map(B256::repeat_byte).collect();
        assert_eq!(dedup(input), expected);
    }

    #[tokio::test]
    async fn test_pause_is_clamped_to_deadline() {
        let clock = FakeClock::new();
        let deadline = clock.now() + Duration::from_secs(2);

        let stop = pause(&clock, Duration::from_secs(5), Some(deadline), &CancellationToken::new()).await;

        assert_eq!(stop, Some(Stop::Expired));
        assert_eq!(clock.total_sleep_time(), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_pause_without_deadline() {
        let clock = FakeClock::new();
        let stop = pause(&clock, Duration::from_secs(3), None, &CancellationToken::new()).await;

        assert_eq!(stop, None);
        assert_eq!(clock.sleep_count(), 1);
    }

    #[tokio::test]
    async fn test_pause_observes_cancellation() {
        let clock = FakeClock::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let stop = pause(&clock, Duration::from_secs(3), None, &cancel).await;

        assert_eq!(stop, Some(Stop::Cancelled));
        assert_eq!(clock.sleep_count(), 0);
    }
}
