use super::{Journal, SimEvent};
use kestrel_common::hal::bootinfo::BootInfo;
use kestrel_common::hal::error::HalError;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Default)]
struct State {
    address: usize,
    entries: Vec<(usize, usize)>,
    saved: Option<usize>,
    fail_save: bool,
}

/// In-memory boot-info accessor. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct SimBootInfo {
    state: Rc<RefCell<State>>,
    journal: Option<Journal>,
}

impl SimBootInfo {
    /// Empty boot info at address 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record calls in `journal`.
    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Make subsequent `save` calls fail.
    pub fn fail_save(&self, fail: bool) {
        self.state.borrow_mut().fail_save = fail;
    }

    /// Address of the last successful save.
    pub fn saved_at(&self) -> Option<usize> {
        self.state.borrow().saved
    }

    /// Regions added so far.
    pub fn entries(&self) -> Vec<(usize, usize)> {
        self.state.borrow().entries.clone()
    }

    fn record(&self, event: SimEvent) {
        if let Some(journal) = &self.journal {
            journal.record(event);
        }
    }
}

impl BootInfo for SimBootInfo {
    fn set_address(&mut self, addr: usize) {
        self.state.borrow_mut().address = addr;
    }

    fn address(&self) -> usize {
        self.state.borrow().address
    }

    fn add_entries(&mut self, base: usize, size: usize) -> Result<(), HalError> {
        self.state.borrow_mut().entries.push((base, size));
        self.record(SimEvent::BootInfoEntry { base, size });
        Ok(())
    }

    fn save(&mut self) -> Result<(), HalError> {
        let address = {
            let mut state = self.state.borrow_mut();
            if state.fail_save {
                return Err(HalError::Communication(format!(
                    "boot info write at {:#x} failed",
                    state.address
                )));
            }
            state.saved = Some(state.address);
            state.address
        };
        self.record(SimEvent::BootInfoSaved { address });
        Ok(())
    }
}
