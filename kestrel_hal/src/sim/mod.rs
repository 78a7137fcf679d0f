//! Host simulation back ends.
//!
//! Stand-ins for every platform piece so the HAL runs on a development
//! host: a CPU and boot-info accessor that journal their calls, a
//! deterministic clock, in-memory UART and USB endpoints, and a stdin/stdout
//! console. Components share one [`Journal`] so tests can assert on the
//! global order of platform effects.

mod bootinfo;
mod cpu;
mod timer;
mod uart;
mod usb;

pub use bootinfo::SimBootInfo;
pub use cpu::SimCpu;
pub use timer::SimTimer;
pub use uart::{LoopbackUart, StdioUart};
pub use usb::SimUsbEndpoint;

use crate::console::Console;
use crate::core::{Hal, HalParts};
use crate::transports::{SerialTransport, UsbCdcTransport};
use kestrel_common::config::LoaderConfig;
use kestrel_common::hal::error::HalError;
use kestrel_common::hal::transport::{DeviceId, DeviceTransport};
use std::cell::RefCell;
use std::rc::Rc;

/// Platform effect recorded by a simulated component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimEvent {
    /// Global interrupt unmask.
    InterruptsEnabled,
    /// Global interrupt mask.
    InterruptsDisabled,
    /// Controller line enabled.
    IrqEnabled {
        /// Controller line.
        line: u16,
        /// Programmed priority.
        priority: u8,
    },
    /// Controller line disabled.
    IrqDisabled {
        /// Controller line.
        line: u16,
    },
    /// Whole data cache cleaned.
    CacheClean,
    /// Cache invalidated.
    CacheInvalidate,
    /// Control transferred to a kernel.
    Jump {
        /// Entry address.
        entry: usize,
        /// Boot-info pointer in the hand-off register.
        bootinfo: usize,
    },
    /// Boot-info blob persisted.
    BootInfoSaved {
        /// Address written to.
        address: usize,
    },
    /// Loader region described to the kernel.
    BootInfoEntry {
        /// Region base.
        base: usize,
        /// Region size.
        size: usize,
    },
    /// Tick source started.
    TimerInit,
    /// Tick source stopped.
    TimerDone,
    /// Medium brought up.
    TransportInit(String),
    /// Medium released.
    TransportDeinit(String),
}

/// Shared, ordered event log.
#[derive(Debug, Clone, Default)]
pub struct Journal(Rc<RefCell<Vec<SimEvent>>>);

impl Journal {
    /// Empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event.
    pub fn record(&self, event: SimEvent) {
        self.0.borrow_mut().push(event);
    }

    /// Snapshot of all events so far.
    pub fn events(&self) -> Vec<SimEvent> {
        self.0.borrow().clone()
    }

    /// Forget all events.
    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

/// Fully simulated board plus the handles tests poke at.
///
/// `com1` is a serial transport over a [`LoopbackUart`], `usb0` a CDC
/// transport over a [`SimUsbEndpoint`]; the console has its own loopback
/// UART. All effects land in `journal`.
pub struct SimHarness {
    /// Assembled, not yet initialised HAL.
    pub hal: Hal,
    /// Shared event log.
    pub journal: Journal,
    /// Boot-info accessor shared with the HAL.
    pub bootinfo: SimBootInfo,
    /// Console line.
    pub console: LoopbackUart,
    /// Far end of `com1`.
    pub com1: LoopbackUart,
    /// Far end of `usb0`.
    pub usb0: SimUsbEndpoint,
    /// Clock shared by every component.
    pub timer: SimTimer,
}

impl SimHarness {
    /// Assemble a simulated HAL for `config`.
    ///
    /// The CPU reports the configured board's description.
    pub fn new(config: LoaderConfig) -> Result<Self, HalError> {
        let journal = Journal::new();
        let timer = SimTimer::new(1).with_journal(journal.clone());
        let bootinfo = SimBootInfo::new().with_journal(journal.clone());
        let console = LoopbackUart::new();
        let com1 = LoopbackUart::new().with_journal(journal.clone(), "com1");
        let usb0 = SimUsbEndpoint::new().with_journal(journal.clone(), "usb0");
        usb0.set_configured(true);

        let board = crate::board::BoardProfile::for_kind(config.board.kind);
        let serial: Box<dyn DeviceTransport> =
            Box::new(SerialTransport::new(com1.clone(), timer.clone(), 0));
        let cdc: Box<dyn DeviceTransport> =
            Box::new(UsbCdcTransport::new(usb0.clone(), timer.clone(), 1));
        let parts = HalParts {
            cpu: Box::new(SimCpu::new(board.cpu_info).with_journal(journal.clone())),
            timer: Box::new(timer.clone()),
            bootinfo: Box::new(bootinfo.clone()),
            console: Console::new(Box::new(console.clone()), Box::new(timer.clone())),
            transports: vec![(DeviceId::COM1, serial), (DeviceId::ACM0, cdc)],
        };

        Ok(Self {
            hal: Hal::new(config, parts)?,
            journal,
            bootinfo,
            console,
            com1,
            usb0,
            timer,
        })
    }
}
