//! `help` - list commands.

use crate::command_registry::{Command, CommandRegistry};
use crate::core::Hal;
use kestrel_common::hal::error::HalError;
use std::fmt::Write;

fn info() -> &'static str {
    "prints this message"
}

fn run(hal: &mut Hal, _args: &str) -> Result<(), HalError> {
    let mut out = String::from("Loader commands:\n");
    for command in hal.commands().iter() {
        writeln!(out, "  {:<10} - {}", command.name, (command.info)()).ok();
    }
    hal.console().print(format_args!("{out}"));
    Ok(())
}

/// Register `help`.
pub fn register(registry: &mut CommandRegistry) {
    registry.register(Command {
        name: "help",
        run,
        info,
    });
}
