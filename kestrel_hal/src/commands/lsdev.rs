//! `lsdev` - list transports.

use crate::command_registry::{Command, CommandRegistry};
use crate::core::Hal;
use crate::transport_registry::TransportState;
use kestrel_common::hal::error::HalError;
use std::fmt::Write;

fn info() -> &'static str {
    "lists devices"
}

fn run(hal: &mut Hal, args: &str) -> Result<(), HalError> {
    if !args.trim().is_empty() {
        return Err(HalError::InvalidArgument("lsdev takes no arguments".to_string()));
    }

    let mut out = String::from("NAME   ID  DRIVER    STATE\n");
    for entry in hal.transports().entries() {
        let state = match entry.state {
            TransportState::Registered => "registered",
            TransportState::Ready => "ready",
            TransportState::Failed => "failed",
            TransportState::Released => "released",
        };
        writeln!(
            out,
            "{:<6} {:>3} {:<9} {}",
            entry.name, entry.id.0, entry.driver, state
        )
        .ok();
    }
    hal.console().print(format_args!("{out}"));
    Ok(())
}

/// Register `lsdev`.
pub fn register(registry: &mut CommandRegistry) {
    registry.register(Command {
        name: "lsdev",
        run,
        info,
    });
}
