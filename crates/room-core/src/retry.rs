use std::time::Duration;

/// Reconnect backoff schedule for the live channel.
///
/// Delays double per consecutive failure, from the base delay up to a hard
/// ceiling. A server-supplied retry hint can raise an individual delay but
/// never past the ceiling. Randomness is kept out of the schedule itself:
/// [`RetryPolicy::jittered`] takes a pre-rolled fraction, so the reconnect
/// loop rolls the dice and tests pass fixed values.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    base_delay_ms: u64,
    max_delay_ms: u64,
}

impl RetryPolicy {
    pub fn new(base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            base_delay_ms,
            max_delay_ms,
        }
    }

    pub fn base_delay_ms(&self) -> u64 {
        self.base_delay_ms
    }

    pub fn max_delay_ms(&self) -> u64 {
        self.max_delay_ms
    }

    /// Delay before reconnect attempt number `attempt` (zero-based).
    pub fn delay_for_attempt(&self, attempt: u32, retry_after_hint_ms: Option<u64>) -> Duration {
        // Shift cap keeps the doubling well clear of u64 overflow.
        let doubled = self.base_delay_ms.saturating_mul(1 << attempt.min(20));
        let raised = doubled.max(retry_after_hint_ms.unwrap_or(0));
        Duration::from_millis(raised.min(self.max_delay_ms))
    }

    /// Stretch a delay by up to a quarter, scaled by `fraction` in `0..=1`.
    pub fn jittered(&self, delay: Duration, fraction: f64) -> Duration {
        let fraction = fraction.clamp(0.0, 1.0);
        let extra_ms = (delay.as_millis() as f64 / 4.0 * fraction) as u64;
        delay + Duration::from_millis(extra_ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(400, 15_000)
    }
}
