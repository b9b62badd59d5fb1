#![forbid(unsafe_code)]

//! Logical clock used to timestamp trace events.
//!
//! The clock never advances on its own: the owning process moves it forward explicitly with
//! [`ManualClock::advance`], and the tracer core samples it through [`ClockSource`] each time it
//! serializes an event. Timestamps observed within one packet are therefore non-decreasing as long
//! as events are emitted in advance order.

mod manual;

pub use manual::ManualClock;

/// Anything the tracer core can sample a timestamp from.
pub trait ClockSource {
    fn clock_value(&self) -> u64;
}

impl<T: ClockSource + ?Sized> ClockSource for &T {
    fn clock_value(&self) -> u64 {
        (**self).clock_value()
    }
}
