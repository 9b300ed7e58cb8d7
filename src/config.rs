//! Poller configuration
//!
//! Defaults match the production return page; every knob can be overridden
//! from the environment so operators can tune polling without a rebuild.

use std::time::Duration;

/// Configuration for the payment-return poller.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Base URL of the LAWRY backend (no trailing slash).
    pub base_url: String,
    /// Per-request timeout for the status endpoint.
    pub request_timeout: Duration,
    /// Give up (status `unknown`) the instant this many non-terminal
    /// rounds have completed.
    pub max_attempts: u32,
    /// Backoff grows linearly: `base × attempt`, capped below.
    pub backoff_base: Duration,
    /// Upper bound on the delay between polling rounds.
    pub backoff_cap: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            request_timeout: Duration::from_secs(10),
            max_attempts: 25,
            backoff_base: Duration::from_millis(1000),
            backoff_cap: Duration::from_millis(6000),
        }
    }
}

impl PollerConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(base_url) = std::env::var("LAWRY_PAY_BASE_URL") {
            cfg.base_url = base_url.trim_end_matches('/').to_string();
        }
        cfg.request_timeout = std::env::var("LAWRY_PAY_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(cfg.request_timeout);
        cfg.max_attempts = std::env::var("LAWRY_PAY_MAX_ATTEMPTS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(cfg.max_attempts);
        cfg.backoff_base = std::env::var("LAWRY_PAY_BACKOFF_BASE_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(cfg.backoff_base);
        cfg.backoff_cap = std::env::var("LAWRY_PAY_BACKOFF_CAP_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(cfg.backoff_cap);
        cfg
    }

    /// Delay before the next round, after `attempt` non-terminal rounds.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        (self.backoff_base * attempt).min(self.backoff_cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_is_linear_then_capped() {
        let cfg = PollerConfig::default();
        assert_eq!(cfg.backoff_delay(1), Duration::from_millis(1000));
        assert_eq!(cfg.backoff_delay(2), Duration::from_millis(2000));
        assert_eq!(cfg.backoff_delay(5), Duration::from_millis(5000));
        assert_eq!(cfg.backoff_delay(6), Duration::from_millis(6000));
        assert_eq!(cfg.backoff_delay(24), Duration::from_millis(6000));
    }

    #[test]
    fn test_backoff_is_monotonic() {
        let cfg = PollerConfig::default();
        for n in 1..cfg.max_attempts {
            assert!(cfg.backoff_delay(n) <= cfg.backoff_delay(n + 1));
        }
    }

    #[test]
    fn test_default_ceiling() {
        assert_eq!(PollerConfig::default().max_attempts, 25);
    }
}
