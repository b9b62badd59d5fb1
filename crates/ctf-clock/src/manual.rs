use std::cell::Cell;

use crate::ClockSource;

/// Explicitly advanced 64-bit counter.
///
/// Overflow wraps (standard unsigned arithmetic). The counter lives in a [`Cell`], which makes the
/// type `!Sync`: a stream's clock is advanced and read from the thread that drives the stream.
#[derive(Debug, Default)]
pub struct ManualClock {
    value: Cell<u64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(value: u64) -> Self {
        Self {
            value: Cell::new(value),
        }
    }

    /// Move the clock forward by `delta` ticks, wrapping on overflow.
    pub fn advance(&self, delta: u64) {
        self.value.set(self.value.get().wrapping_add(delta));
    }

    pub fn read(&self) -> u64 {
        self.value.get()
    }
}

impl ClockSource for ManualClock {
    fn clock_value(&self) -> u64 {
        self.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero() {
        assert_eq!(ManualClock::new().read(), 0);
    }

    #[test]
    fn read_has_no_side_effect() {
        let clock = ManualClock::starting_at(7);
        assert_eq!(clock.read(), 7);
        assert_eq!(clock.read(), 7);
        assert_eq!(clock.clock_value(), 7);
    }

    #[test]
    fn advance_wraps_on_overflow() {
        let clock = ManualClock::starting_at(u64::MAX - 1);
        clock.advance(3);
        assert_eq!(clock.read(), 1);
    }

    #[test]
    fn zero_delta_is_a_no_op() {
        let clock = ManualClock::new();
        clock.advance(0);
        assert_eq!(clock.read(), 0);
    }
}
