//! Fixed-rate clocks for the simulation and render loops

use std::time::Duration;

use tokio::time::{interval, Interval, MissedTickBehavior};

use crate::util::time::{frame_duration, tick_delta, TICK_DURATION_MICROS};

/// A periodic timer that drops overdue ticks instead of bursting to catch up.
///
/// The simulation does not accumulate lag: a stalled process resumes with a
/// single step at the fixed `dt`.
#[derive(Debug)]
pub struct FixedClock {
    interval: Interval,
    period: Duration,
    ticks: u64,
}

impl FixedClock {
    pub fn new(period: Duration) -> Self {
        let mut interval = interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self {
            interval,
            period,
            ticks: 0,
        }
    }

    /// 30 Hz physics clock
    pub fn simulation() -> Self {
        Self::new(Duration::from_micros(TICK_DURATION_MICROS))
    }

    /// Display clock at `fps` frames per second
    pub fn render(fps: u32) -> Self {
        Self::new(frame_duration(fps))
    }

    /// Wait for the next tick. The first one completes immediately.
    pub async fn tick(&mut self) -> u64 {
        self.interval.tick().await;
        self.ticks += 1;
        self.ticks
    }

    /// Seconds a simulation step advances, independent of wall time elapsed
    pub fn dt(&self) -> f64 {
        tick_delta()
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Ticks completed so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
