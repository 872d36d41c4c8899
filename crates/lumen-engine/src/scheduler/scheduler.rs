use std::time::Instant;

use super::{CancellationToken, FrameClock, FrameTick};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum FrameMode {
    /// One frame per display refresh until cancelled.
    Continuous,
    /// One frame per `request_redraw`, otherwise idle.
    #[default]
    OnDemand,
}

/// Decides when frames run.
///
/// The driving loop calls `poll` before each potential frame; `None` means
/// nothing to draw. Once the token is cancelled `poll` never yields again and
/// queued requests are dropped.
#[derive(Debug)]
pub struct FrameScheduler {
    mode: FrameMode,
    clock: FrameClock,
    token: CancellationToken,
    pending: u32,
}

impl FrameScheduler {
    pub fn new(mode: FrameMode) -> Self {
        Self::with_token(mode, CancellationToken::new())
    }

    pub fn with_token(mode: FrameMode, token: CancellationToken) -> Self {
        Self {
            mode,
            clock: FrameClock::new(),
            token,
            pending: 0,
        }
    }

    pub fn mode(&self) -> FrameMode {
        self.mode
    }

    /// A clone of the cancellation token, for cancelling from elsewhere.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Queues one frame in on-demand mode. No-op when continuous or cancelled.
    pub fn request_redraw(&mut self) {
        if self.mode == FrameMode::OnDemand && !self.is_cancelled() {
            self.pending = self.pending.saturating_add(1);
        }
    }

    /// Frames queued by `request_redraw` and not yet polled.
    pub fn pending_frames(&self) -> u32 {
        if self.is_cancelled() { 0 } else { self.pending }
    }

    /// Whether the host should ask the platform for a redraw.
    pub fn wants_frame(&self) -> bool {
        !self.is_cancelled() && (self.mode == FrameMode::Continuous || self.pending > 0)
    }

    /// Releases the next frame, if any.
    pub fn poll(&mut self, now: Instant) -> Option<FrameTick> {
        if self.is_cancelled() {
            self.pending = 0;
            return None;
        }
        match self.mode {
            FrameMode::Continuous => Some(self.clock.tick_at(now)),
            FrameMode::OnDemand if self.pending > 0 => {
                self.pending -= 1;
                Some(self.clock.tick_at(now))
            }
            FrameMode::OnDemand => None,
        }
    }

    /// Idempotent.
    pub fn cancel(&mut self) {
        self.token.cancel();
        self.pending = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn on_demand_is_idle_without_requests() {
        let mut s = FrameScheduler::new(FrameMode::OnDemand);
        assert!(!s.wants_frame());
        assert_eq!(s.poll(Instant::now()), None);
    }

    #[test]
    fn each_request_releases_one_frame() {
        let mut s = FrameScheduler::new(FrameMode::OnDemand);
        s.request_redraw();
        s.request_redraw();
        assert_eq!(s.pending_frames(), 2);

        let now = Instant::now();
        assert_eq!(s.poll(now).map(|t| t.frame_index), Some(0));
        assert_eq!(s.poll(now).map(|t| t.frame_index), Some(1));
        assert_eq!(s.poll(now), None);
    }

    #[test]
    fn continuous_ignores_requests_and_always_ticks() {
        let mut s = FrameScheduler::new(FrameMode::Continuous);
        s.request_redraw();
        assert_eq!(s.pending_frames(), 0);
        assert!(s.wants_frame());
        let now = Instant::now();
        assert!(s.poll(now).is_some());
        assert!(s.poll(now).is_some());
    }

    #[test]
    fn cancel_drops_queued_frames() {
        let mut s = FrameScheduler::new(FrameMode::OnDemand);
        s.request_redraw();
        s.cancel();
        s.cancel();
        s.request_redraw();
        assert!(!s.wants_frame());
        assert_eq!(s.poll(Instant::now()), None);
    }

    #[test]
    fn external_token_stops_continuous_loop() {
        let token = CancellationToken::new();
        let mut s = FrameScheduler::with_token(FrameMode::Continuous, token.clone());
        assert!(s.poll(Instant::now()).is_some());
        token.cancel();
        assert_eq!(s.poll(Instant::now()), None);
        assert!(!s.wants_frame());
    }
}
