//! ARMv7-M back end (Cortex-M7, i.MX RT117x).

use super::Cpu;
use core::arch::asm;
use core::ptr;
use kestrel_common::hal::types::CacheKind;

/* NVIC */
const NVIC_ISER: *mut u32 = 0xE000_E100 as *mut u32;
const NVIC_ICER: *mut u32 = 0xE000_E180 as *mut u32;
const NVIC_IPR: *mut u8 = 0xE000_E400 as *mut u8;
const NVIC_PRIO_BITS: u8 = 4;

/* SCB cache maintenance */
const SCB_CCSIDR: *const u32 = 0xE000_ED80 as *const u32;
const SCB_CSSELR: *mut u32 = 0xE000_ED84 as *mut u32;
const SCB_ICIALLU: *mut u32 = 0xE000_EF50 as *mut u32;
const SCB_ICIMVAU: *mut u32 = 0xE000_EF58 as *mut u32;
const SCB_DCIMVAC: *mut u32 = 0xE000_EF5C as *mut u32;
const SCB_DCISW: *mut u32 = 0xE000_EF60 as *mut u32;
const SCB_DCCSW: *mut u32 = 0xE000_EF6C as *mut u32;

const CACHE_LINE: usize = 32;

#[inline(always)]
fn dsb() {
    unsafe { asm!("dsb", options(nostack, preserves_flags)) };
}

#[inline(always)]
fn isb() {
    unsafe { asm!("isb", options(nostack, preserves_flags)) };
}

/// Cortex-M7 core of the i.MX RT117x.
#[derive(Debug, Default)]
pub struct CortexM7;

impl CortexM7 {
    /// Apply `op` to every set/way of the L1 data cache.
    fn dcache_set_way(&self, op: *mut u32) {
        unsafe {
            ptr::write_volatile(SCB_CSSELR, 0);
            dsb();
            let ccsidr = ptr::read_volatile(SCB_CCSIDR);
            let sets = (ccsidr >> 13) & 0x7FFF;
            let ways = (ccsidr >> 3) & 0x3FF;

            for set in (0..=sets).rev() {
                for way in (0..=ways).rev() {
                    let sw = ((set << 5) & 0x3FE0) | ((way << 30) & 0xC000_0000);
                    ptr::write_volatile(op, sw);
                }
            }
        }
        dsb();
        isb();
    }
}

impl Cpu for CortexM7 {
    fn info(&self) -> &'static str {
        "Cortex-M i.MX RT117x"
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
            ptr::write_volatile(NVIC_IPR.add(line), priority << (8 - NVIC_PRIO_BITS));
            ptr::write_volatile(NVIC_ISER.add(line / 32), 1 << (line % 32));
        }
    }

    fn irq_disable(&self, line: u16) {
        let line = line as usize;
        unsafe { ptr::write_volatile(NVIC_ICER.add(line / 32), 1 << (line % 32)) };
        dsb();
        isb();
    }

    fn cache_clean_all(&self) {
        self.dcache_set_way(SCB_DCCSW);
    }

    fn cache_invalidate(&self, kind: CacheKind, addr: usize, size: usize) {
        let reg = match kind {
            CacheKind::Data => SCB_DCIMVAC,
            CacheKind::Instruction => SCB_ICIMVAU,
        };
        let start = addr & !(CACHE_LINE - 1);
        let end = addr.saturating_add(size);

        dsb();
        for line in (start..end).step_by(CACHE_LINE) {
            unsafe { ptr::write_volatile(reg, line as u32) };
        }
        dsb();
        isb();
    }

    fn cache_invalidate_all(&self, kind: CacheKind) {
        match kind {
            CacheKind::Data => self.dcache_set_way(SCB_DCISW),
            CacheKind::Instruction => {
                dsb();
                isb();
                unsafe { ptr::write_volatile(SCB_ICIALLU, 0) };
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
