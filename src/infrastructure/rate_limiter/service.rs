//! Fixed-window rate limiter service
//!
//! One counter per `{class}:{client_key}` pair. The first request in a
//! window pins the reset instant; every later request inside the window,
//! including denied ones, increments the counter. The window moves only by
//! time, never by traffic.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::types::{EndpointClass, RateLimitDecision};
use crate::config::{RateLimitConfig, RateLimitProfileConfig};
use crate::infrastructure::clock::Clock;

/// Counter state for a single window key
#[derive(Debug)]
struct WindowEntry {
    count: u32,
    reset_at_ms: u64,
}

/// Internal limiter failures; callers never see these because `check`
/// fails open.
#[derive(Debug, Error)]
enum LimiterError {
    #[error("window table lock poisoned")]
    Poisoned,
}

/// Per-process fixed-window rate limiter
pub struct RateLimiter {
    windows: Mutex<HashMap<String, WindowEntry>>,
    config: RateLimitConfig,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            config,
            clock,
        }
    }

    /// Limit profile configured for an endpoint class
    pub fn profile(&self, class: EndpointClass) -> &RateLimitProfileConfig {
        match class {
            EndpointClass::Default => &self.config.default,
            EndpointClass::Auth => &self.config.auth,
            EndpointClass::PasswordReset => &self.config.password_reset,
            EndpointClass::Draft => &self.config.draft,
        }
    }

    /// Count one request against the window for `(class, client_key)`.
    ///
    /// Internal errors fail open: the request is allowed and the incident is
    /// logged, so a broken limiter degrades to no limiting instead of an
    /// outage.
    pub fn check(&self, class: EndpointClass, client_key: &str) -> RateLimitDecision {
        match self.try_check(class, client_key) {
            Ok(decision) => decision,
            Err(e) => {
                warn!(
                    class = class.as_str(),
                    error = %e,
                    "Rate limiter internal error, failing open"
                );
                let profile = self.profile(class);
                RateLimitDecision::allowed(
                    profile.limit,
                    profile.limit.saturating_sub(1),
                    self.clock.now_ms().saturating_add(profile.window_ms),
                    class,
                )
            }
        }
    }

    fn try_check(
        &self,
        class: EndpointClass,
        client_key: &str,
    ) -> Result<RateLimitDecision, LimiterError> {
        let profile = self.profile(class);
        let limit = profile.limit;
        let window_ms = profile.window_ms;
        let now = self.clock.now_ms();

        let mut windows = self.windows.lock().map_err(|_| LimiterError::Poisoned)?;
        let entry = windows
            .entry(format!("{}:{}", class.as_str(), client_key))
            .or_insert(WindowEntry {
                count: 0,
                reset_at_ms: now + window_ms,
            });

        if now >= entry.reset_at_ms {
            entry.count = 0;
            entry.reset_at_ms = now + window_ms;
        }

        // The tipping request is counted too; denials never extend the window.
        entry.count = entry.count.saturating_add(1);

        if entry.count <= limit {
            Ok(RateLimitDecision::allowed(
                limit,
                limit - entry.count,
                entry.reset_at_ms,
                class,
            ))
        } else {
            let retry_after_secs = entry.reset_at_ms.saturating_sub(now).div_ceil(1000);
            Ok(RateLimitDecision::blocked(
                limit,
                entry.reset_at_ms,
                retry_after_secs,
                class,
            ))
        }
    }

    /// Drop counters whose window has passed. Returns the number removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now_ms();
        match self.windows.lock() {
            Ok(mut windows) => {
                let before = windows.len();
                windows.retain(|_, entry| entry.reset_at_ms > now);
                before - windows.len()
            }
            Err(_) => 0,
        }
    }

    /// Spawn the periodic sweep task; it runs until the token is cancelled.
    pub fn start_sweep_task(
        self: Arc<Self>,
        shutdown: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        let period = Duration::from_secs(self.config.sweep_interval_seconds);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = self.sweep();
                        if removed > 0 {
                            debug!(removed, "Swept expired rate limit windows");
                        }
                    }
                    _ = shutdown.cancelled() => {
                        debug!("Rate limit sweep task shutting down");
                        break;
                    }
                }
            }
        })
    }

    #[cfg(test)]
    fn poison_windows(&self) {
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = self.windows.lock().unwrap();
            panic!("poison the window table");
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::ManualClock;

    fn limiter_with(limit: u32, window_ms: u64) -> (Arc<ManualClock>, RateLimiter) {
        let clock = Arc::new(ManualClock::starting_at(1_700_000_000_000));
        let config = RateLimitConfig {
            default: RateLimitProfileConfig::new(limit, window_ms, "slow down"),
            ..RateLimitConfig::default()
        };
        let limiter = RateLimiter::new(config, clock.clone());
        (clock, limiter)
    }

    #[test]
    fn allows_up_to_limit_then_denies_with_retry_after() {
        let (clock, limiter) = limiter_with(3, 60_000);

        for expected_remaining in [2, 1, 0] {
            let decision = limiter.check(EndpointClass::Default, "k1");
            assert!(decision.allowed);
            assert_eq!(decision.remaining, expected_remaining);
            clock.advance_ms(2);
        }

        clock.advance_ms(4);
        let denied = limiter.check(EndpointClass::Default, "k1");
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, 0);
        // 10 ms into a 60 s window rounds up to the full minute.
        assert_eq!(denied.retry_after_secs, Some(60));
    }

    #[test]
    fn window_expiry_opens_a_fresh_window() {
        let (clock, limiter) = limiter_with(2, 60_000);

        assert!(limiter.check(EndpointClass::Default, "k1").allowed);
        assert!(limiter.check(EndpointClass::Default, "k1").allowed);
        assert!(!limiter.check(EndpointClass::Default, "k1").allowed);

        clock.advance_ms(60_001);
        let fresh = limiter.check(EndpointClass::Default, "k1");
        assert!(fresh.allowed);
        assert_eq!(fresh.remaining, 1);
    }

    #[test]
    fn denials_do_not_extend_the_window() {
        let (clock, limiter) = limiter_with(1, 1_000);

        assert!(limiter.check(EndpointClass::Default, "k1").allowed);
        let first_denial = limiter.check(EndpointClass::Default, "k1");
        assert!(!first_denial.allowed);

        // Hammering during the closed window keeps the same reset instant.
        clock.advance_ms(500);
        let second_denial = limiter.check(EndpointClass::Default, "k1");
        assert_eq!(second_denial.reset_at_ms, first_denial.reset_at_ms);
        assert_eq!(second_denial.retry_after_secs, Some(1));

        clock.advance_ms(501);
        assert!(limiter.check(EndpointClass::Default, "k1").allowed);
    }

    #[test]
    fn distinct_keys_have_independent_windows() {
        let (_clock, limiter) = limiter_with(1, 60_000);

        assert!(limiter.check(EndpointClass::Default, "alice").allowed);
        assert!(!limiter.check(EndpointClass::Default, "alice").allowed);
        assert!(limiter.check(EndpointClass::Default, "bob").allowed);
    }

    #[test]
    fn distinct_classes_have_independent_windows() {
        let (_clock, limiter) = limiter_with(1, 60_000);

        assert!(limiter.check(EndpointClass::Default, "k1").allowed);
        assert!(!limiter.check(EndpointClass::Default, "k1").allowed);

        // Same key under another class is a separate counter with the
        // class's own profile (auth default: 10/min).
        let auth = limiter.check(EndpointClass::Auth, "k1");
        assert!(auth.allowed);
        assert_eq!(auth.limit, 10);
    }

    #[test]
    fn sweep_drops_only_expired_windows() {
        let (clock, limiter) = limiter_with(5, 1_000);

        limiter.check(EndpointClass::Default, "stale");
        clock.advance_ms(2_000);
        limiter.check(EndpointClass::Default, "live");

        assert_eq!(limiter.sweep(), 1);
        assert_eq!(limiter.sweep(), 0);
    }

    #[test]
    fn poisoned_lock_fails_open() {
        let (_clock, limiter) = limiter_with(1, 60_000);
        limiter.poison_windows();

        let decision = limiter.check(EndpointClass::Default, "k1");
        assert!(decision.allowed);
        assert_eq!(decision.limit, 1);
    }

    #[tokio::test]
    async fn sweep_task_stops_on_cancellation() {
        let (_clock, limiter) = limiter_with(5, 1_000);
        let limiter = Arc::new(limiter);
        let token = CancellationToken::new();

        let handle = limiter.clone().start_sweep_task(token.clone());
        token.cancel();
        handle.await.expect("sweep task should exit cleanly");
    }
}
