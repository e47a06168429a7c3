//! Exponential backoff bookkeeping for HTTP-backed tools
//!
//! Tools record each failure against a key (usually the API host plus endpoint kind)
//! and receive the delay to suggest to the model. A success clears the key.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

const MIN_BACKOFF_SECS: u64 = 5;
const MAX_BACKOFF_SECS: u64 = 60;
/// Errors further apart than this start a fresh backoff sequence
const RESET_AFTER_SECS: u64 = 120;

#[derive(Debug, Clone)]
struct BackoffState {
    current_delay: u64,
    last_error_at: Instant,
    error_count: u32,
}

pub struct HttpRetryManager {
    states: RwLock<HashMap<String, BackoffState>>,
}

impl HttpRetryManager {
    pub fn new() -> Self {
        HttpRetryManager {
            states: RwLock::new(HashMap::new()),
        }
    }

    /// Process-wide instance shared by all tools
    pub fn global() -> &'static HttpRetryManager {
        static INSTANCE: OnceLock<HttpRetryManager> = OnceLock::new();
        INSTANCE.get_or_init(HttpRetryManager::new)
    }

    pub fn record_success(&self, key: &str) {
        if self.states.write().remove(key).is_some() {
            log::debug!("[HTTP_RETRY] Success for '{}', backoff reset", key);
        }
    }

    /// Record a failure and return the seconds to wait before retrying
    pub fn record_error(&self, key: &str) -> u64 {
        let mut states = self.states.write();
        let now = Instant::now();

        let state = states.entry(key.to_string()).or_insert_with(|| BackoffState {
            current_delay: MIN_BACKOFF_SECS,
            last_error_at: now,
            error_count: 0,
        });

        let stale = now.duration_since(state.last_error_at) > Duration::from_secs(RESET_AFTER_SECS);
        if stale {
            state.current_delay = MIN_BACKOFF_SECS;
            state.error_count = 1;
        } else {
            state.error_count += 1;
            if state.error_count > 1 {
                state.current_delay = (state.current_delay * 2).min(MAX_BACKOFF_SECS);
            }
        }
        state.last_error_at = now;

        log::warn!(
            "[HTTP_RETRY] Error #{} for '{}', backoff: {}s",
            state.error_count,
            key,
            state.current_delay
        );

        state.current_delay
    }

    pub fn current_delay(&self, key: &str) -> Option<u64> {
        self.states.read().get(key).map(|s| s.current_delay)
    }

    pub fn is_retryable_status(status: u16) -> bool {
        matches!(status, 408 | 429 | 500 | 502 | 503 | 504 | 520..=524)
    }
}

impl Default for HttpRetryManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Timeouts, connection failures and retryable statuses
pub fn is_reqwest_error_retryable(err: &reqwest::Error) -> bool {
    err.is_timeout()
        || err.is_connect()
        || err
            .status()
            .map(|s| HttpRetryManager::is_retryable_status(s.as_u16()))
            .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_until_cap() {
        let manager = HttpRetryManager::new();
        let delays: Vec<u64> = (0..6).map(|_| manager.record_error("goldrush")).collect();
        assert_eq!(delays, vec![5, 10, 20, 40, 60, 60]);
    }

    #[test]
    fn test_keys_are_independent_and_success_resets() {
        let manager = HttpRetryManager::new();
        manager.record_error("a");
        manager.record_error("a");
        assert_eq!(manager.current_delay("a"), Some(10));
        assert_eq!(manager.current_delay("b"), None);

        manager.record_success("a");
        assert_eq!(manager.current_delay("a"), None);
        assert_eq!(manager.record_error("a"), 5);
    }

    #[test]
    fn test_retryable_statuses() {
        for status in [408, 429, 502, 503, 504, 522] {
            assert!(HttpRetryManager::is_retryable_status(status), "{}", status);
        }
        for status in [200, 400, 401, 404] {
            assert!(!HttpRetryManager::is_retryable_status(status), "{}", status);
        }
    }
}
