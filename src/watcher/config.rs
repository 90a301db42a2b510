use std::time::Duration;

/// Default wait before each inbound-hash lookup
pub const DEFAULT_RESOLVE_INTERVAL: Duration = Duration::from_secs(5);

/// Default wait before each per-CCTX status query
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Pacing and bounds for [`StatusWatcher`](super::StatusWatcher).
///
/// By default the watcher retries forever and only stops on cancellation.
/// Set [`timeout`](Self::timeout) or
/// [`max_consecutive_failures`](Self::max_consecutive_failures) to bound it.
///
/// # Examples
///
/// ```rust
/// use cctx_relay::WatchConfig;
/// use std::time::Duration;
///
/// // 5 second resolve interval, 3 second poll interval, no bound
/// let config = WatchConfig::default();
///
/// let config = WatchConfig::default()
///     .with_poll_interval(Duration::from_secs(1))
///     .with_timeout(Duration::from_secs(600))
///     .with_max_consecutive_failures(20);
///
/// // Sub-second pacing for local networks
/// let config = WatchConfig::fast();
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchConfig {
    /// Wait before each inbound-hash lookup.
    pub resolve_interval: Duration,
    /// Wait before each status query, per CCTX.
    pub poll_interval: Duration,
    /// Overall bound on one watch, covering both phases.
    pub timeout: Option<Duration>,
    /// Consecutive failed queries tolerated for a single key before giving up.
    pub max_consecutive_failures: Option<u32>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            resolve_interval: DEFAULT_RESOLVE_INTERVAL,
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
            max_consecutive_failures: None,
        }
    }
}

impl WatchConfig {
    /// 500 ms resolve interval and 250 ms poll interval.
    pub fn fast() -> Self {
        Self {
            resolve_interval: Duration::from_millis(500),
            poll_interval: Duration::from_millis(250),
            ..Self::default()
        }
    }

    pub fn with_resolve_interval(mut self, interval: Duration) -> Self {
        self.resolve_interval = interval;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Gives up on a key after `failures` failed queries in a row.
    ///
    /// Values below one are treated as one.
    pub fn with_max_consecutive_failures(mut self, failures: u32) -> Self {
        self.max_consecutive_failures = Some(failures.max(1));
        self
    }

    /// Returns true once `failures` consecutive failures reach the configured limit.
    pub(crate) fn failures_exhausted(&self, failures: u32) -> bool {
        self.max_consecutive_failures
            .is_some_and(|limit| failures >= limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_default_config() {
        let config = WatchConfig::default();
        assert_eq!(config.resolve_interval, Duration::from_secs(5));
        assert_eq!(config.poll_interval, Duration::from_secs(3));
        assert_eq!(config.timeout, None);
        assert_eq!(config.max_consecutive_failures, None);
    }

    #[test]
    fn test_fast_config_keeps_bounds_unset() {
        let config = WatchConfig::fast();
        assert!(config.poll_interval < DEFAULT_POLL_INTERVAL);
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn test_builder_methods() {
        let config = WatchConfig::default()
            .with_resolve_interval(Duration::from_secs(1))
            .with_poll_interval(Duration::from_secs(2))
            .with_timeout(Duration::from_secs(60))
            .with_max_consecutive_failures(0);
        assert_eq!(config.resolve_interval, Duration::from_secs(1));
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.timeout, Some(Duration::from_secs(60)));
        assert_eq!(config.max_consecutive_failures, Some(1));
    }

    #[rstest]
    #[case::unbounded(None, 1_000, false)]
    #[case::below_limit(Some(3), 2, false)]
    #[case::at_limit(Some(3), 3, true)]
    fn test_failures_exhausted(
        #[case] limit: Option<u32>,
        #[case] failures: u32,
        #[case] expected: bool,
    ) {
        let mut config = WatchConfig::default();
        config.max_consecutive_failures = limit;
        assert_eq!(config.failures_exhausted(failures), expected);
    }
}
