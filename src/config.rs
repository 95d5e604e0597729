use std::path::PathBuf;
use std::time::Duration;

use crate::error::{BrokerError, Result};

/// Tunables for a broker run.
///
/// The defaults mirror a small volunteer deployment: a one-minute lease, a
/// sweep every five seconds, and four local workers polling twice a second.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// How long a worker may hold a task before the sweeper reclaims it.
    pub lease_ttl: Duration,

    /// How often the sweeper scans for expired leases.
    pub sweep_interval: Duration,

    /// How often idle workers and the supervisor poll the broker.
    pub poll_interval: Duration,

    /// Number of local worker loops.
    pub workers: usize,

    /// Where to append completed check reports (one JSON object per line).
    /// `None` disables the sink; reports are still logged.
    pub results_path: Option<PathBuf>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            lease_ttl: Duration::from_secs(60),
            sweep_interval: Duration::from_secs(5),
            poll_interval: Duration::from_millis(500),
            workers: 4,
            results_path: None,
        }
    }
}

impl RunnerConfig {
    pub fn with_lease_ttl(mut self, ttl: Duration) -> Self {
        self.lease_ttl = ttl;
        self
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_results_path(mut self, path: PathBuf) -> Self {
        self.results_path = Some(path);
        self
    }

    /// Reject configurations the broker cannot run with. A zero TTL would
    /// expire leases the instant they are issued, zero intervals would spin,
    /// and zero workers would never drain the backlog.
    pub fn validate(&self) -> Result<()> {
        if self.lease_ttl.is_zero() {
            return Err(BrokerError::InvalidConfig(
                "lease_ttl must be greater than zero".to_string(),
            ));
        }
        if self.sweep_interval.is_zero() {
            return Err(BrokerError::InvalidConfig(
                "sweep_interval must be greater than zero".to_string(),
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(BrokerError::InvalidConfig(
                "poll_interval must be greater than zero".to_string(),
            ));
        }
        if self.workers == 0 {
            return Err(BrokerError::InvalidConfig(
                "workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
