//! Boot hand-off.
//!
//! The one-way transfer of control from the loader to the kernel. The
//! precondition (a verified entry point) and the boot-info write are
//! checked before anything is torn down, so a refused launch leaves the
//! loader fully operational. Once teardown starts there is no way back.
//!
//! ```text
//! check entry ─► save boot info ─► settle ─► done() ─► mask irqs ─► jump
//!      │               │                                              │
//!      └─ NoValidKernel└─ save error                      LaunchFailed┘
//! ```

use crate::core::Hal;
use crate::timer::busy_wait;
use kestrel_common::hal::error::HalError;
use std::convert::Infallible;
use tracing::{error, info};

impl Hal {
    /// Hand the processor to the kernel.
    ///
    /// Never returns on success. Returns `HalError::LaunchFailed` if the
    /// kernel returns to the loader, with interrupts re-enabled.
    ///
    /// # Errors
    /// - `HalError::NoValidKernel` if no verified entry point is set; no
    ///   state is touched
    /// - the boot-info error if the blob cannot be persisted; no teardown
    ///   has happened yet
    pub fn launch(&mut self) -> Result<Infallible, HalError> {
        let entry = self.launch.kernel_entry.ok_or(HalError::NoValidKernel)?;

        self.bootinfo.save()?;
        let bootinfo = self.bootinfo.address();
        info!("Boot info saved at {:#x}, launching kernel at {}", bootinfo, entry);

        busy_wait(self.timer.as_ref(), self.config.launch.settle_ticks);
        self.done();
        self.cpu.interrupts_disable();

        // SAFETY: the entry was recorded by the image verifier through
        // `set_kernel_entry`, the boot info is persisted, every loader
        // resource is released and interrupts are masked.
        unsafe { self.cpu.jump(entry.addr(), bootinfo) };

        self.cpu.interrupts_enable();
        error!("Kernel at {} returned to the loader", entry);
        Err(HalError::LaunchFailed)
    }
}
