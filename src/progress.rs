//! Navigation progress indicator.
//!
//! The indicator only shows up for slow navigations: `schedule` arms it,
//! `poll` starts it once the delay has passed, and `stop` ends it from any
//! state. The caller owns the value; there is no ambient timer.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgressState {
    #[default]
    Idle,
    Scheduled { at: Instant },
    Started,
    Stopped,
}

#[derive(Debug, Clone, Default)]
pub struct ProgressIndicator {
    state: ProgressState,
}

impl ProgressIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ProgressState {
        self.state
    }

    pub fn is_visible(&self) -> bool {
        self.state == ProgressState::Started
    }

    /// Arm the indicator to start `delay` after `now`. Ignored while already
    /// running. A delay too large to represent leaves the indicator idle.
    pub fn schedule(&mut self, now: Instant, delay: Duration) {
        if self.state == ProgressState::Started {
            return;
        }
        self.state = match now.checked_add(delay) {
            Some(at) => ProgressState::Scheduled { at },
            None => ProgressState::Idle,
        };
    }

    /// Scheduled → Started once the deadline has passed. Returns true on that transition.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.state {
            ProgressState::Scheduled { at } if now >= at => {
                self.state = ProgressState::Started;
                true
            }
            _ => false,
        }
    }

    /// Any → Stopped. A pending schedule is cancelled.
    pub fn stop(&mut self) {
        self.state = ProgressState::Stopped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_only_after_delay() {
        let t0 = Instant::now();
        let mut progress = ProgressIndicator::new();
        progress.schedule(t0, Duration::from_millis(200));

        assert!(!progress.poll(t0 + Duration::from_millis(100)));
        assert!(!progress.is_visible());
        assert!(progress.poll(t0 + Duration::from_millis(200)));
        assert!(progress.is_visible());
    }

    #[test]
    fn stop_cancels_pending_schedule() {
        let t0 = Instant::now();
        let mut progress = ProgressIndicator::new();
        progress.schedule(t0, Duration::from_millis(200));
        progress.stop();

        assert!(!progress.poll(t0 + Duration::from_secs(1)));
        assert_eq!(progress.state(), ProgressState::Stopped);
    }

    #[test]
    fn rescheduling_while_started_keeps_running() {
        let t0 = Instant::now();
        let mut progress = ProgressIndicator::new();
        progress.schedule(t0, Duration::ZERO);
        progress.poll(t0);
        progress.schedule(t0, Duration::from_secs(5));
        assert!(progress.is_visible());
    }

    #[test]
    fn unrepresentable_delay_stays_idle() {
        let mut progress = ProgressIndicator::new();
        progress.schedule(Instant::now(), Duration::MAX);
        assert_eq!(progress.state(), ProgressState::Idle);
        assert!(!progress.poll(Instant::now()));
    }
}
