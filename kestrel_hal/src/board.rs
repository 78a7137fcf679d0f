//! Board profiles.
//!
//! A profile collects the facts the HAL needs about one board: where the
//! boot-info blob lives, how large the interrupt table is, how interrupt
//! sources map to controller lines, which transports exist under which
//! names, how kernel link addresses translate to physical addresses, and
//! which commands the board adds to the base set.

use crate::command_registry::Command;
use crate::commands::board::{CPUINFO, IRQSTAT};
use kestrel_common::config::BoardKind;
use kestrel_common::hal::transport::DeviceId;
use kestrel_common::hal::types::IrqSource;

/// Name → identifier entry of a board's device table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceEntry {
    /// User-facing device name (e.g. "com1").
    pub name: &'static str,
    /// Identifier the transport is registered under.
    pub id: DeviceId,
}

/// Static description of a supported board.
#[derive(Debug)]
pub struct BoardProfile {
    /// Board kind this profile describes.
    pub kind: BoardKind,
    /// Human-readable board name.
    pub name: &'static str,
    /// CPU description reported by simulated cores.
    pub cpu_info: &'static str,
    /// Fixed address the boot-info blob is persisted to.
    pub bootinfo_address: usize,
    /// Number of interrupt sources in the binding table.
    pub size_interrupts: usize,
    /// Sources below this number are core exceptions with no controller line.
    pub exception_count: u16,
    /// Priority programmed for every installed line.
    pub irq_priority: u8,
    /// Address the kernel is linked to run at.
    pub kernel_vaddr: usize,
    /// Physical address the kernel is loaded to.
    pub kernel_paddr: usize,
    /// Loader image region reported to the kernel (base, size), if any.
    pub loader_region: Option<(usize, usize)>,
    /// Device table.
    pub devices: &'static [DeviceEntry],
    /// Commands appended after the base command set.
    pub commands: &'static [Command],
}

const STANDARD_DEVICES: &[DeviceEntry] = &[
    DeviceEntry {
        name: "com1",
        id: DeviceId::COM1,
    },
    DeviceEntry {
        name: "usb0",
        id: DeviceId::ACM0,
    },
];

/// Xilinx Zynq-7000: kernel linked at 0xc0000000, executed from DDR.
pub static ZYNQ7000: BoardProfile = BoardProfile {
    kind: BoardKind::Zynq7000,
    name: "zynq7000",
    cpu_info: "Cortex-A9 Zynq 7000",
    bootinfo_address: 0xFFFF_C000,
    size_interrupts: 96,
    exception_count: 0,
    irq_priority: 1,
    kernel_vaddr: 0xC000_0000,
    kernel_paddr: 0x0010_0000,
    loader_region: None,
    devices: STANDARD_DEVICES,
    commands: &[CPUINFO],
};

/// NXP i.MX RT117x: kernel executes in place, first 16 sources are exceptions.
pub static IMXRT117X: BoardProfile = BoardProfile {
    kind: BoardKind::Imxrt117x,
    name: "imxrt117x",
    cpu_info: "Cortex-M i.MX RT117x",
    bootinfo_address: 0x2020_0000,
    size_interrupts: 16 + 218,
    exception_count: 16,
    irq_priority: 1,
    kernel_vaddr: 0,
    kernel_paddr: 0,
    loader_region: Some((0x2000_0000, 0x0004_0000)),
    devices: STANDARD_DEVICES,
    commands: &[CPUINFO],
};

/// Host simulation board.
pub static SIM: BoardProfile = BoardProfile {
    kind: BoardKind::Sim,
    name: "sim",
    cpu_info: "Host simulation",
    bootinfo_address: 0x0000_1000,
    size_interrupts: 64,
    exception_count: 16,
    irq_priority: 1,
    kernel_vaddr: 0,
    kernel_paddr: 0,
    loader_region: Some((0x0001_0000, 0x0001_0000)),
    devices: STANDARD_DEVICES,
    commands: &[CPUINFO, IRQSTAT],
};

impl BoardProfile {
    /// Profile for a board kind.
    pub fn for_kind(kind: BoardKind) -> &'static BoardProfile {
        match kind {
            BoardKind::Zynq7000 => &ZYNQ7000,
            BoardKind::Imxrt117x => &IMXRT117X,
            BoardKind::Sim => &SIM,
        }
    }

    /// Controller line of an interrupt source, `None` for core exceptions.
    pub fn irq_line(&self, source: IrqSource) -> Option<u16> {
        source.0.checked_sub(self.exception_count)
    }

    /// Translate a kernel link address to the physical address it runs from.
    pub fn kernel_physical(&self, addr: usize) -> usize {
        if self.kernel_vaddr == self.kernel_paddr {
            return addr;
        }
        addr.wrapping_sub(self.kernel_vaddr)
            .wrapping_add(self.kernel_paddr)
    }

    /// Look up a device identifier by its user-facing name.
    pub fn device_by_name(&self, name: &str) -> Option<DeviceId> {
        self.devices.iter().find(|d| d.name == name).map(|d| d.id)
    }

    /// User-facing name of a device identifier.
    pub fn device_name(&self, id: DeviceId) -> Option<&'static str> {
        self.devices.iter().find(|d| d.id == id).map(|d| d.name)
    }
}
