//! Tick source and bounded busy-waits.
//!
//! One tick is one millisecond. Nothing in the loader sleeps: every wait is
//! a poll loop against a [`Clock`] that is bounded by a tick budget.

use std::time::Instant;

/// Monotonic tick counter.
pub trait Clock {
    /// Current tick count.
    fn now(&self) -> u64;
}

/// Timer subsystem owned by the HAL.
pub trait Timer: Clock {
    /// Start the tick source.
    fn init(&mut self);

    /// Stop the tick source before hand-off.
    fn done(&mut self);
}

/// Spin until `ticks` have elapsed on `clock`.
pub fn busy_wait<C: Clock + ?Sized>(clock: &C, ticks: u64) {
    let start = clock.now();
    while clock.now().wrapping_sub(start) < ticks {
        std::hint::spin_loop();
    }
}

/// Poll `ready` until it returns true or `ticks` elapse.
///
/// Returns whether `ready` succeeded within the budget.
pub fn poll_until<C, F>(clock: &C, ticks: u64, mut ready: F) -> bool
where
    C: Clock + ?Sized,
    F: FnMut() -> bool,
{
    let start = clock.now();
    loop {
        if ready() {
            return true;
        }
        if clock.now().wrapping_sub(start) >= ticks {
            return false;
        }
        std::hint::spin_loop();
    }
}

/// Wall-clock timer for running the loader on a host.
#[derive(Debug, Clone)]
pub struct SystemTimer {
    origin: Instant,
}

impl SystemTimer {
    /// Create a timer counting from now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemTimer {
    fn now(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

impl Timer for SystemTimer {
    fn init(&mut self) {
        self.origin = Instant::now();
    }

    fn done(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct StepClock(Cell<u64>);

    impl Clock for StepClock {
        fn now(&self) -> u64 {
            let t = self.0.get();
            self.0.set(t.wrapping_add(1));
            t
        }
    }

    #[test]
    fn busy_wait_consumes_budget() {
        let clock = StepClock(Cell::new(0));
        busy_wait(&clock, 100);
        assert!(clock.0.get() >= 100);
    }

    #[test]
    fn poll_until_times_out() {
        let clock = StepClock(Cell::new(0));
        assert!(!poll_until(&clock, 10, || false));
    }

    #[test]
    fn poll_until_succeeds_early() {
        let clock = StepClock(Cell::new(0));
        let mut calls = 0;
        assert!(poll_until(&clock, 10, || {
            calls += 1;
            calls == 3
        }));
        assert!(clock.0.get() < 10);
    }

    #[test]
    fn busy_wait_handles_wrapping_counter() {
        let clock = StepClock(Cell::new(u64::MAX - 5));
        // Wrapping subtraction keeps the elapsed count correct across the wrap.
        let start = clock.now();
        busy_wait(&clock, 10);
        assert!(clock.0.get().wrapping_sub(start) >= 10);
    }
}
