//! ARMv7-A back end (Cortex-A9, Zynq-7000).
//!
//! Only the L1 caches are maintained here; the PL310 outer cache is left
//! enabled and coherent for the kernel to take over.

use super::Cpu;
use core::arch::asm;
use core::ptr;
use kestrel_common::hal::types::CacheKind;

/* GIC distributor */
const GICD_BASE: usize = 0xF8F0_1000;
const GICD_ISENABLER: *mut u32 = (GICD_BASE + 0x100) as *mut u32;
const GICD_ICENABLER: *mut u32 = (GICD_BASE + 0x180) as *mut u32;
const GICD_IPRIORITYR: *mut u8 = (GICD_BASE + 0x400) as *mut u8;
const GIC_PRIO_SHIFT: u8 = 3;

const CACHE_LINE: usize = 32;

#[inline(always)]
fn dsb() {
    unsafe { asm!("dsb", options(nostack, preserves_flags)) };
}

#[inline(always)]
fn isb() {
    unsafe { asm!("isb", options(nostack, preserves_flags)) };
}

/// Which set/way operation to apply to the L1 data cache.
#[derive(Clone, Copy)]
enum SetWayOp {
    Clean,
    Invalidate,
}

/// Cortex-A9 core of the Zynq-7000.
#[derive(Debug, Default)]
pub struct CortexA9;

impl CortexA9 {
    fn dcache_set_way(&self, op: SetWayOp) {
        let ccsidr: u32;
        unsafe {
            asm!("mcr p15, 2, {0}, c0, c0, 0", in(reg) 0u32, options(nostack));
            isb();
            asm!("mrc p15, 1, {0}, c0, c0, 0", out(reg) ccsidr, options(nostack));
        }

        let line_shift = (ccsidr & 0x7) + 4;
        let ways = (ccsidr >> 3) & 0x3FF;
        let sets = (ccsidr >> 13) & 0x7FFF;
        let way_shift = ways.leading_zeros();

        for set in 0..=sets {
            for way in 0..=ways {
                let sw = (way.checked_shl(way_shift).unwrap_or(0)) | (set << line_shift);
                unsafe {
                    match op {
                        SetWayOp::Clean => {
                            asm!("mcr p15, 0, {0}, c7, c10, 2", in(reg) sw, options(nostack))
                        }
                        SetWayOp::Invalidate => {
                            asm!("mcr p15, 0, {0}, c7, c6, 2", in(reg) sw, options(nostack))
                        }
                    }
                }
            }
        }
        dsb();
        isb();
    }
}

impl Cpu for CortexA9 {
    fn info(&self) -> &'static str {
        "Cortex-A9 Zynq 7000"
    }

    fn interrupts_enable(&self) {
        unsafe { asm!("cpsie if", options(nostack, preserves_flags)) };
    }

    fn interrupts_disable(&self) {
        unsafe { asm!("cpsid if", options(nostack, preserves_flags)) };
    }

    fn irq_enable(&self, line: u16, priority: u8) {
        let line = line as usize;
        unsafe {
            ptr::write_volatile(GICD_IPRIORITYR.add(line), priority << GIC_PRIO_SHIFT);
            ptr::write_volatile(GICD_ISENABLER.add(line / 32), 1 << (line % 32));
        }
    }

    fn irq_disable(&self, line: u16) {
        let line = line as usize;
        unsafe { ptr::write_volatile(GICD_ICENABLER.add(line / 32), 1 << (line % 32)) };
        dsb();
    }

    fn cache_clean_all(&self) {
        self.dcache_set_way(SetWayOp::Clean);
    }

    fn cache_invalidate(&self, kind: CacheKind, addr: usize, size: usize) {
        let start = addr & !(CACHE_LINE - 1);
        let end = addr.saturating_add(size);

        dsb();
        for line in (start..end).step_by(CACHE_LINE) {
            unsafe {
                match kind {
                    CacheKind::Data => {
                        asm!("mcr p15, 0, {0}, c7, c6, 1", in(reg) line, options(nostack))
                    }
                    CacheKind::Instruction => {
                        asm!("mcr p15, 0, {0}, c7, c5, 1", in(reg) line, options(nostack))
                    }
                }
            }
        }
        dsb();
        isb();
    }

    fn cache_invalidate_all(&self, kind: CacheKind) {
        match kind {
            CacheKind::Data => self.dcache_set_way(SetWayOp::Invalidate),
            CacheKind::Instruction => {
                unsafe { asm!("mcr p15, 0, {0}, c7, c5, 0", in(reg) 0u32, options(nostack)) };
                dsb();
                isb();
            }
        }
    }

    unsafe fn jump(&self, entry: usize, bootinfo: usize) {
        unsafe {
            asm!(
                "push {{r9}}",
                "mov r9, {bootinfo}",
                "blx {entry}",
                "pop {{r9}}",
                entry = in(reg) entry,
                bootinfo = in(reg) bootinfo,
                clobber_abi("C"),
            );
        }
    }
}
