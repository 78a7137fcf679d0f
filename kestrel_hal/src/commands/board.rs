//! Board-specific commands.
//!
//! These are not part of the base set; board profiles list the ones they
//! support and the HAL appends them after the base commands.

use crate::command_registry::Command;
use crate::core::Hal;
use kestrel_common::hal::error::HalError;
use std::fmt::Write;

fn cpuinfo_info() -> &'static str {
    "prints CPU information"
}

fn cpuinfo(hal: &mut Hal, _args: &str) -> Result<(), HalError> {
    let info = hal.cpu().info();
    let board = hal.board().name;
    hal.console().print(format_args!("{info} ({board})\n"));
    Ok(())
}

fn irqstat_info() -> &'static str {
    "lists bound interrupt sources"
}

fn irqstat(hal: &mut Hal, _args: &str) -> Result<(), HalError> {
    let mut out = String::new();
    for source in hal.interrupts().bound_sources() {
        let line = hal.board().irq_line(source);
        match line {
            Some(line) => writeln!(out, "{source}  line {line}").ok(),
            None => writeln!(out, "{source}  exception").ok(),
        };
    }
    if out.is_empty() {
        out.push_str("no handlers installed\n");
    }
    hal.console().print(format_args!("{out}"));
    Ok(())
}

/// `cpuinfo`: CPU family description.
pub const CPUINFO: Command = Command {
    name: "cpuinfo",
    run: cpuinfo,
    info: cpuinfo_info,
};

/// `irqstat`: interrupt sources with a handler bound.
pub const IRQSTAT: Command = Command {
    name: "irqstat",
    run: irqstat,
    info: irqstat_info,
};
