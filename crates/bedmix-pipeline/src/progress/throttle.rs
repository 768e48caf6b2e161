//! Progress throttling.
//!
//! Rate-limits liveness logs and progress writes while a final mix runs.

use std::time::{Duration, Instant};

/// Highest percentage reported before a final mix actually finishes.
const ESTIMATE_CEILING: u8 = 95;

/// Rate-limiter for progress updates.
///
/// Ensures progress updates are not emitted more frequently than the
/// configured interval.
pub struct ProgressThrottle {
    last_emit: Option<Instant>,
    min_interval: Duration,
}

impl ProgressThrottle {
    /// Create a throttle whose first check passes immediately.
    pub const fn new(min_interval: Duration) -> Self {
        Self {
            last_emit: None,
            min_interval,
        }
    }

    /// Create a throttle whose first check passes one interval from now.
    pub fn starting_now(min_interval: Duration) -> Self {
        Self {
            last_emit: Some(Instant::now()),
            min_interval,
        }
    }

    /// Check if enough time has passed to emit another progress update.
    pub fn should_emit(&mut self) -> bool {
        let now = Instant::now();
        match self.last_emit {
            Some(last) if now.duration_since(last) < self.min_interval => false,
            _ => {
                self.last_emit = Some(now);
                true
            }
        }
    }
}

/// Estimated completion of a running final mix.
///
/// Loudness normalization gives no usable progress output, so the estimate is
/// linear in elapsed time against `horizon` and capped below 100.
pub fn estimate_final_percent(elapsed: Duration, horizon: Duration) -> u8 {
    if horizon.is_zero() {
        return ESTIMATE_CEILING;
    }
    let ratio = elapsed.as_secs_f64() / horizon.as_secs_f64() * 100.0;
    // Clamped to 0..=95 before the cast
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let percent = ratio.clamp(0.0, f64::from(ESTIMATE_CEILING)) as u8;
    percent
}
