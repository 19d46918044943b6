use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Sliding-window limiter mirroring the server's per-client send limit.
#[derive(Debug)]
pub struct SendThrottle {
    max_sends: usize,
    window: Duration,
    sent_at: VecDeque<Instant>,
}

impl SendThrottle {
    pub fn new(max_sends: usize, window: Duration) -> Self {
        Self {
            max_sends,
            window,
            sent_at: VecDeque::new(),
        }
    }

    /// Records a send at `now` if the window has room. `max_sends == 0`
    /// disables the limiter.
    pub fn try_acquire(&mut self, now: Instant) -> bool {
        if self.max_sends == 0 {
            return true;
        }

        while let Some(oldest) = self.sent_at.front() {
            if now.duration_since(*oldest) >= self.window {
                self.sent_at.pop_front();
            } else {
                break;
            }
        }

        if self.sent_at.len() >= self.max_sends {
            return false;
        }
        self.sent_at.push_back(now);
        true
    }

    /// Gives back the slot taken at the most recent `try_acquire`, for sends
    /// that never reached the transport.
    pub fn release_last(&mut self) {
        self.sent_at.pop_back();
    }
}
