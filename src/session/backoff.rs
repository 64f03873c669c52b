//! Connect pacing for one URL: exponential delays with jitter, and a breaker
//! that stops attempts for a cooldown after too many failures in a row.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tracing::{error, info};

use crate::config::ReconnectionConfig;

#[derive(Debug, Clone)]
pub struct Backoff {
    config: ReconnectionConfig,
    failures: u32,
    tripped_until: Option<Instant>,
}

impl Backoff {
    #[must_use]
    pub const fn new(config: ReconnectionConfig) -> Self {
        Self {
            config,
            failures: 0,
            tripped_until: None,
        }
    }

    #[must_use]
    pub const fn consecutive_failures(&self) -> u32 {
        self.failures
    }

    /// Whether the breaker is holding attempts back right now.
    #[must_use]
    pub fn is_tripped(&self) -> bool {
        self.tripped_until.is_some_and(|until| Instant::now() < until)
    }

    /// Wait before the next attempt.
    ///
    /// Zero until something fails. While tripped, the rest of the cooldown;
    /// once the cooldown is over the failure count starts again from zero.
    pub fn delay(&mut self) -> Duration {
        if let Some(until) = self.tripped_until {
            let left = until.saturating_duration_since(Instant::now());
            if !left.is_zero() {
                return left;
            }
            info!("Reconnect cooldown over");
            self.reset();
        }
        match self.failures {
            0 => Duration::ZERO,
            n => with_jitter(self.step(n)),
        }
    }

    pub fn reset(&mut self) {
        self.failures = 0;
        self.tripped_until = None;
    }

    pub fn record_failure(&mut self) {
        self.failures = self.failures.saturating_add(1);
        if self.failures < self.config.max_consecutive_failures {
            return;
        }
        let cooldown = self.config.cooldown();
        self.tripped_until = Some(Instant::now() + cooldown);
        error!(
            failures = self.failures,
            cooldown_ms = cooldown.as_millis(),
            "Too many failed connects, backing off"
        );
    }

    /// Un-jittered delay after `failures` failed attempts.
    fn step(&self, failures: u32) -> Duration {
        let exponent = i32::try_from(failures.saturating_sub(1)).unwrap_or(i32::MAX);
        let factor = self.config.backoff_multiplier.max(1.0).powi(exponent);
        let initial = self.config.initial_delay();
        let max = self.config.max_delay();
        if !factor.is_finite() || initial.as_secs_f64() * factor >= max.as_secs_f64() {
            return max;
        }
        initial.mul_f64(factor)
    }
}

/// `base` plus up to a fifth of it.
fn with_jitter(base: Duration) -> Duration {
    let spread = base.as_millis() / 5;
    if spread == 0 {
        return base;
    }
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u128::from(d.subsec_nanos()));
    let extra = u64::try_from(seed % (spread + 1)).unwrap_or(0);
    base + Duration::from_millis(extra)
}
