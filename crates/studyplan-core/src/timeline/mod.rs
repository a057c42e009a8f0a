//! Time spans and free-window detection.
//!
//! This module provides:
//! - Interval arithmetic (overlap, subtraction, merging)
//! - Day boundaries in the planning time zone
//! - Free-window detection between busy spans

mod gap;
mod interval;

pub use gap::{detect_free_windows, FreeWindow, FreeWindowDetector, DEFAULT_MERGE_GAP_SECONDS};
pub use interval::{
    day_window, local_instant, merge_adjacent, overlaps, subtract, Interval, TimeInterval,
};
