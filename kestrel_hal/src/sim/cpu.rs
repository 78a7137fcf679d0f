use super::{Journal, SimEvent};
use crate::arch::Cpu;
use kestrel_common::hal::types::CacheKind;
use std::fmt;

type JumpHook = Box<dyn Fn(usize, usize)>;

/// Simulated CPU.
///
/// Records every call in its journal. A jump runs the optional hook and
/// then returns, which the hand-off treats as a kernel returning.
pub struct SimCpu {
    info: &'static str,
    journal: Option<Journal>,
    jump_hook: Option<JumpHook>,
}

impl SimCpu {
    /// CPU reporting `info`.
    pub fn new(info: &'static str) -> Self {
        Self {
            info,
            journal: None,
            jump_hook: None,
        }
    }

    /// Record calls in `journal`.
    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Run `hook(entry, bootinfo)` when control is transferred.
    pub fn with_jump_hook(mut self, hook: impl Fn(usize, usize) + 'static) -> Self {
        self.jump_hook = Some(Box::new(hook));
        self
    }

    fn record(&self, event: SimEvent) {
        if let Some(journal) = &self.journal {
            journal.record(event);
        }
    }
}

impl fmt::Debug for SimCpu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimCpu").field("info", &self.info).finish()
    }
}

impl Cpu for SimCpu {
    fn info(&self) -> &'static str {
        self.info
    }

    fn interrupts_enable(&self) {
        self.record(SimEvent::InterruptsEnabled);
    }

    fn interrupts_disable(&self) {
        self.record(SimEvent::InterruptsDisabled);
    }

    fn irq_enable(&self, line: u16, priority: u8) {
        self.record(SimEvent::IrqEnabled { line, priority });
    }

    fn irq_disable(&self, line: u16) {
        self.record(SimEvent::IrqDisabled { line });
    }

    fn cache_clean_all(&self) {
        self.record(SimEvent::CacheClean);
    }

    fn cache_invalidate(&self, _kind: CacheKind, _addr: usize, _size: usize) {
        self.record(SimEvent::CacheInvalidate);
    }

    fn cache_invalidate_all(&self, _kind: CacheKind) {
        self.record(SimEvent::CacheInvalidate);
    }

    unsafe fn jump(&self, entry: usize, bootinfo: usize) {
        self.record(SimEvent::Jump { entry, bootinfo });
        if let Some(hook) = &self.jump_hook {
            hook(entry, bootinfo);
        }
    }
}
