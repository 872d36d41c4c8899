use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameTick {
    /// Time since the first tick of the clock.
    pub elapsed: Duration,

    /// Unclamped time since the previous tick; zero on the first tick.
    pub delta: Duration,

    /// `delta` clamped and in seconds, for animation.
    pub dt: f32,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

impl FrameTick {
    /// Tick for a frame drawn outside any clock (tests, one-shot renders).
    pub fn zero() -> Self {
        Self {
            elapsed: Duration::ZERO,
            delta: Duration::ZERO,
            dt: 0.0,
            frame_index: 0,
        }
    }

    /// `elapsed` in seconds.
    pub fn seconds(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }
}

/// Frame clock producing `FrameTick` snapshots.
///
/// Use one clock per session so sessions do not share delta-time state.
///
/// `dt` is clamped so a paused debugger, a minimized window or a long stall
/// does not produce pathological animation steps.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Option<Instant>,
    last: Option<Instant>,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    /// Creates a clock with default clamps (100us, 250ms).
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            start: None,
            last: None,
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Forgets the previous tick so the next `dt` starts fresh.
    ///
    /// `elapsed` keeps counting from the first tick.
    pub fn reset(&mut self) {
        self.last = None;
    }

    pub fn tick(&mut self) -> FrameTick {
        self.tick_at(Instant::now())
    }

    /// Advances the clock to `now`.
    pub fn tick_at(&mut self, now: Instant) -> FrameTick {
        let start = *self.start.get_or_insert(now);
        let delta = self
            .last
            .map_or(Duration::ZERO, |last| now.saturating_duration_since(last));
        self.last = Some(now);

        let tick = FrameTick {
            elapsed: now.saturating_duration_since(start),
            delta,
            dt: delta.clamp(self.dt_min, self.dt_max).as_secs_f32(),
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        tick
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
