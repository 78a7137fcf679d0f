//! Boot-info accessor contract.
//!
//! The boot-info blob carries the hand-off contract (kernel entry, hardware
//! description) from the loader to the kernel. Its layout belongs to an
//! external module; the HAL only touches it through this trait.

use crate::hal::error::HalError;

/// Accessors the HAL needs on the shared boot-info structure.
pub trait BootInfo {
    /// Set the fixed address the blob is persisted to.
    fn set_address(&mut self, addr: usize);

    /// Address the kernel receives in the hand-off register.
    fn address(&self) -> usize;

    /// Describe a loader-owned memory region to the kernel.
    fn add_entries(&mut self, base: usize, size: usize) -> Result<(), HalError>;

    /// Persist the blob at its address.
    fn save(&mut self) -> Result<(), HalError>;
}
