use crate::{SweepError, SweepResult};
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECS: u64 = 2;
pub const DEFAULT_THREADS: usize = 4;
/// More parallel raw-socket probes than this trips ICMP rate limiters.
pub const MAX_THREADS: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SweepConfig {
    pub timeout: Duration,
    pub threads: usize,
}

impl SweepConfig {
    pub fn new(timeout_secs: u64, threads: usize) -> SweepResult<Self> {
        if timeout_secs < 1 {
            return Err(SweepError::Config("timeout must be at least 1 second".to_owned()));
        }
        if threads < 1 {
            return Err(SweepError::Config("must use at least 1 thread".to_owned()));
        }
        if threads > MAX_THREADS {
            return Err(SweepError::Config(format!("thread count cannot be bigger than {MAX_THREADS}")));
        }
        Ok(SweepConfig { timeout: Duration::from_secs(timeout_secs), threads })
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        SweepConfig { timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS), threads: DEFAULT_THREADS }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_defaults() {
        assert_eq!(SweepConfig::new(DEFAULT_TIMEOUT_SECS, DEFAULT_THREADS).unwrap(), SweepConfig::default());
    }

    #[test]
    fn accepts_bounds() {
        assert_eq!(1, SweepConfig::new(1, 1).unwrap().threads);
        assert_eq!(MAX_THREADS, SweepConfig::new(30, MAX_THREADS).unwrap().threads);
        assert_eq!(Duration::from_secs(30), SweepConfig::new(30, 1).unwrap().timeout);
    }

    #[test]
    fn rejects_zero_timeout() {
        assert!(matches!(SweepConfig::new(0, 1), Err(SweepError::Config(_))));
    }

    #[test]
    fn rejects_thread_count_out_of_range() {
        assert!(matches!(SweepConfig::new(2, 0), Err(SweepError::Config(_))));
        assert!(matches!(SweepConfig::new(2, MAX_THREADS + 1), Err(SweepError::Config(_))));
    }
}
