//! Per-seat throttling of repeated player notices.
use std::collections::HashMap;

use keeper_core::{SeatId, Tick};

/// Drops a repeated `(seat, kind)` notice inside a window of ticks.
#[derive(Debug, Clone)]
pub struct NotificationLimiter {
    window: u64,
    last_sent: HashMap<(SeatId, &'static str), Tick>,
}

impl NotificationLimiter {
    pub fn new(window: u64) -> Self {
        Self {
            window,
            last_sent: HashMap::new(),
        }
    }

    /// Returns whether the notice may go out now, and records it if so.
    pub fn allow(&mut self, seat: SeatId, kind: &'static str, now: Tick) -> bool {
        if let Some(last) = self.last_sent.get(&(seat, kind)) {
            if now.since(*last) < self.window {
                return false;
            }
        }
        self.last_sent.insert((seat, kind), now);
        true
    }

    pub fn window(&self) -> u64 {
        self.window
    }
}
