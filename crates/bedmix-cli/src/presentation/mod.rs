//! Shared CLI presentation utilities.
//!
//! Keep this module format-only: no pipeline calls, no filesystem access.

pub mod status_display;
pub mod tables;

pub use status_display::{format_progress, format_status, format_waiting};
pub use tables::{format_optional, print_separator, truncate_string};
