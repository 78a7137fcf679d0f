use super::{Journal, SimEvent};
use crate::timer::{Clock, Timer};
use std::cell::Cell;
use std::rc::Rc;

/// Deterministic clock: every `now()` advances time by a fixed step.
///
/// Bounded polls against it terminate without wall-clock sleeping. Clones
/// share the counter.
#[derive(Debug, Clone)]
pub struct SimTimer {
    ticks: Rc<Cell<u64>>,
    step: u64,
    journal: Option<Journal>,
}

impl SimTimer {
    /// Clock advancing `step` ticks per reading.
    pub fn new(step: u64) -> Self {
        Self {
            ticks: Rc::new(Cell::new(0)),
            step,
            journal: None,
        }
    }

    /// Record `init`/`done` in `journal`.
    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Ticks elapsed so far, without advancing.
    pub fn elapsed(&self) -> u64 {
        self.ticks.get()
    }

    fn record(&self, event: SimEvent) {
        if let Some(journal) = &self.journal {
            journal.record(event);
        }
    }
}

impl Clock for SimTimer {
    fn now(&self) -> u64 {
        let t = self.ticks.get();
        self.ticks.set(t.wrapping_add(self.step));
        t
    }
}

impl Timer for SimTimer {
    fn init(&mut self) {
        self.record(SimEvent::TimerInit);
    }

    fn done(&mut self) {
        self.record(SimEvent::TimerDone);
    }
}
