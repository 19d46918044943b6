use std::time::Duration;

use crate::config::ReconnectConfig;

const BACKOFF_MULTIPLIER: f64 = 2.0;

/// Exponential backoff for reconnect attempts.
#[derive(Debug, Clone, Copy)]
pub struct BackoffState {
    attempts: u32,
    delay_ms: u64,
    initial_delay_ms: u64,
    max_delay_ms: u64,
    max_attempts: u32,
}

impl BackoffState {
    pub fn new(config: &ReconnectConfig) -> Self {
        Self {
            attempts: 0,
            delay_ms: config.initial_delay_ms,
            initial_delay_ms: config.initial_delay_ms,
            max_delay_ms: config.max_delay_ms,
            max_attempts: config.max_attempts,
        }
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
        self.delay_ms = self.initial_delay_ms;
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }

    /// Advance to the next attempt, returning how long to wait before it.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.is_exhausted() {
            return None;
        }

        let current = self.delay_ms;
        self.attempts += 1;
        self.delay_ms =
            ((self.delay_ms as f64) * BACKOFF_MULTIPLIER).min(self.max_delay_ms as f64) as u64;
        Some(Duration::from_millis(current))
    }
}
