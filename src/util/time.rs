//! Time utilities for the client simulation

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Get current Unix timestamp in milliseconds
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

/// Tick rate configuration
pub const SIMULATION_TPS: u32 = 30; // 30 ticks per second
pub const DEFAULT_RENDER_FPS: u32 = 60;
pub const TICK_DURATION_MICROS: u64 = 1_000_000 / SIMULATION_TPS as u64;

/// Rate that ball velocities are expressed against (one unit = pixels per 1/60 s)
pub const REFERENCE_RATE: f64 = 60.0;

/// Calculate delta time for physics (in seconds)
pub fn tick_delta() -> f64 {
    1.0 / SIMULATION_TPS as f64
}

/// Duration of one render frame at the given rate
pub fn frame_duration(fps: u32) -> Duration {
    Duration::from_micros(1_000_000 / u64::from(fps.max(1)))
}

/// Millisecond clock used by the kick cooldown.
///
/// The session reads wall time through this trait so tests can drive it by hand.
pub trait Clock: Send {
    fn now_millis(&self) -> u64;
}

/// Wall clock backed by `SystemTime`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        unix_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_delta_matches_rate() {
        assert!((tick_delta() * SIMULATION_TPS as f64 - 1.0).abs() < 1e-12);
        assert_eq!(TICK_DURATION_MICROS, 33_333);
    }

    #[test]
    fn frame_duration_never_divides_by_zero() {
        assert_eq!(frame_duration(0), Duration::from_secs(1));
        assert_eq!(frame_duration(60), Duration::from_micros(16_666));
    }
}
