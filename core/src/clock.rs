//! Session clock — owns elapsed game time, pause, and deferred beats.
//!
//! RULE: No narrative delay is implemented as a suspension.
//! A delay is a `Deadline` ("at time T, do X") stored in a
//! `DeferredQueue` and fired by whoever advances the clock.

use crate::types::Seconds;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameClock {
    pub elapsed: Seconds,
    pub paused:  bool,
}

impl Default for GameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl GameClock {
    pub fn new() -> Self {
        Self {
            elapsed: 0.0,
            paused:  true,
        }
    }

    /// Advance by `dt` seconds. Returns the new elapsed time.
    /// A paused clock does not move; negative or non-finite steps count as zero.
    pub fn advance(&mut self, dt: Seconds) -> Seconds {
        if !self.paused {
            self.elapsed += sanitize_dt(dt);
        }
        self.elapsed
    }

    pub fn pause(&mut self)  { self.paused = true;  }
    pub fn resume(&mut self) { self.paused = false; }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Clamp a frame delta to something the simulation can use.
pub fn sanitize_dt(dt: Seconds) -> Seconds {
    if dt.is_finite() && dt > 0.0 { dt } else { 0.0 }
}

/// An action scheduled to fire once the clock reaches `due_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct Deadline<T> {
    pub due_at: Seconds,
    pub action: T,
}

/// Pending deadlines, fired in due order (ties fire in scheduling order).
#[derive(Debug, Clone)]
pub struct DeferredQueue<T> {
    pending: Vec<Deadline<T>>,
}

impl<T> Default for DeferredQueue<T> {
    fn default() -> Self {
        Self { pending: Vec::new() }
    }
}

impl<T> DeferredQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, now: Seconds, delay: Seconds, action: T) {
        let due_at = now + sanitize_dt(delay);
        // Insert after every entry due at or before this one to keep ties FIFO.
        let at = self.pending.partition_point(|d| d.due_at <= due_at);
        self.pending.insert(at, Deadline { due_at, action });
    }

    /// Remove and return every action due at or before `now`.
    pub fn drain_due(&mut self, now: Seconds) -> Vec<T> {
        let split = self.pending.partition_point(|d| d.due_at <= now);
        self.pending.drain(..split).map(|d| d.action).collect()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
