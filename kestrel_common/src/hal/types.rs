//! Value types passed across the HAL seams.

use std::fmt;
use std::num::NonZeroUsize;

/// Hardware-assigned identifier of an interrupt line.
///
/// Valid sources are `[0, size)` where `size` is the board's interrupt table
/// size. Range checking happens in the interrupt table, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IrqSource(pub u16);

impl IrqSource {
    /// Table index of this source.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for IrqSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "irq{}", self.0)
    }
}

/// Entry point of a kernel image that the image collaborator has verified.
///
/// Never null. The loader only ever builds one from an address that came out
/// of image verification, after board address translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelEntry(NonZeroUsize);

impl KernelEntry {
    /// Wrap a verified entry address. Returns `None` for a null address.
    pub fn new(addr: usize) -> Option<Self> {
        NonZeroUsize::new(addr).map(Self)
    }

    /// Physical address control is transferred to.
    #[inline]
    pub fn addr(self) -> usize {
        self.0.get()
    }
}

impl fmt::Display for KernelEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0.get())
    }
}

/// Cache selector for maintenance operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKind {
    /// Data cache.
    Data,
    /// Instruction cache.
    Instruction,
}
