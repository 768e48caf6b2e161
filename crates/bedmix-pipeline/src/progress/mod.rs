//! Progress estimation and throttling for long-running mixes.

mod throttle;

pub use throttle::{ProgressThrottle, estimate_final_percent};
