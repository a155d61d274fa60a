//! Simulation clock values.
//!
//! The engine is driven by a caller-supplied clock in whole milliseconds.
//! Callers are expected to pass non-decreasing values; the helpers here
//! saturate instead of underflowing when they don't.

/// A timestamp or span in milliseconds on the simulation clock.
pub type Millis = u64;

/// Milliseconds elapsed from `since` to `now`, or 0 if `now` is earlier.
#[must_use]
pub const fn elapsed(now: Millis, since: Millis) -> Millis {
    now.saturating_sub(since)
}

/// Milliseconds left of a `duration` that started at `start`, as seen at `now`.
#[must_use]
pub const fn remaining(now: Millis, start: Millis, duration: Millis) -> Millis {
    duration.saturating_sub(elapsed(now, start))
}

/// Converts milliseconds to fractional seconds, for display.
#[must_use]
pub fn as_secs_f32(ms: Millis) -> f32 {
    ms as f32 / 1000.0
}
