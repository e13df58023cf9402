//! Time sources for budgeted processing.
//!
//! Processors never look up time globally. The host hands them a [`Clock`]
//! when they are constructed:
//!
//! - [`InstantClock`] reads the monotonic platform clock (works on WASM too)
//! - [`ManualClock`] only moves when told to, for hosts that drive time
//!   themselves (replays, fixed-step simulations, tests)

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use instant::Instant;

/// A monotonic millisecond time source.
///
/// Two readings are only meaningful relative to each other, `b - a` is the
/// time that passed between them.
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Platform monotonic clock measured from the moment it was created.
#[derive(Debug, Clone, Copy)]
pub struct InstantClock {
    origin: Instant,
}

impl InstantClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for InstantClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for InstantClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// A clock that only advances when [`advance`](Self::advance) is called.
///
/// Clones share the same time, so a request can hold a clone and "spend"
/// time while it executes.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    bits: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, millis: f64) {
        debug_assert!(millis >= 0.0, "a monotonic clock cannot go backwards");
        // Single writer per frame in practice, but keep it correct under contention.
        let _ = self
            .bits
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                Some((f64::from_bits(bits) + millis).to_bits())
            });
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now_ms(&self) -> f64 {
        (**self).now_ms()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_starts_at_zero_and_is_shared_between_clones() {
        let clock = ManualClock::new();
        let handle = clock.clone();
        assert_eq!(clock.now_ms(), 0.0);

        handle.advance(2.5);
        handle.advance(0.5);
        assert_eq!(clock.now_ms(), 3.0);
    }

    #[test]
    fn instant_clock_is_monotonic() {
        let clock = InstantClock::new();
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(b >= a);
    }
}
