//! CPU-family seam.
//!
//! Everything that differs between CPU families sits behind [`Cpu`]:
//! global interrupt masking, interrupt-controller line programming, cache
//! maintenance and the control-transfer trampoline. The rest of the HAL is
//! family-independent.
//!
//! Back ends:
//!
//! - [`armv7m`] - Cortex-M7 (i.MX RT117x), NVIC + SCB cache maintenance
//! - [`armv7a`] - Cortex-A9 (Zynq-7000), GIC distributor + CP15 cache maintenance
//! - [`crate::sim::SimCpu`] - Host simulation that journals every call

#[cfg(target_arch = "arm")]
pub mod armv7a;
#[cfg(target_arch = "arm")]
pub mod armv7m;

use kestrel_common::hal::types::CacheKind;

/// Operations every supported CPU family provides.
///
/// # Trampoline contract
///
/// [`Cpu::jump`] transfers control to `entry` with:
///
/// | Item | Value |
/// |------|-------|
/// | Boot-info pointer | `r9` on ARMv7-A and ARMv7-M |
/// | Program counter | `entry` (branch-with-link, Thumb bit honoured) |
/// | Interrupts | globally disabled by the caller |
/// | Caches | data cache cleaned by the caller |
///
/// The call only returns if the kernel returns.
pub trait Cpu {
    /// Human-readable CPU description.
    fn info(&self) -> &'static str;

    /// Unmask interrupts globally.
    fn interrupts_enable(&self);

    /// Mask interrupts globally.
    fn interrupts_disable(&self);

    /// Enable a line at the interrupt controller with the given priority.
    fn irq_enable(&self, line: u16, priority: u8);

    /// Disable a line at the interrupt controller.
    fn irq_disable(&self, line: u16);

    /// Clean the whole data cache to memory.
    fn cache_clean_all(&self);

    /// Invalidate the cache lines covering `[addr, addr + size)`.
    fn cache_invalidate(&self, kind: CacheKind, addr: usize, size: usize);

    /// Invalidate a whole cache.
    fn cache_invalidate_all(&self, kind: CacheKind);

    /// Branch to `entry`, passing `bootinfo` in the hand-off register.
    ///
    /// # Safety
    ///
    /// `entry` must be the entry point of a verified kernel image resident in
    /// memory, and `bootinfo` the address of the persisted boot-info blob.
    /// Interrupts must be disabled and no loader resource may be in use.
    unsafe fn jump(&self, entry: usize, bootinfo: usize);
}

/// Run `f` with interrupts globally masked, then unmask them.
pub fn critical_section<C, R>(cpu: &C, f: impl FnOnce() -> R) -> R
where
    C: Cpu + ?Sized,
{
    cpu.interrupts_disable();
    let result = f();
    cpu.interrupts_enable();
    result
}
