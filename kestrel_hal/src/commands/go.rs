//! `go!` - start the kernel.

use crate::command_registry::{Command, CommandRegistry};
use crate::console::RESET_SEQUENCE;
use crate::core::Hal;
use kestrel_common::hal::error::HalError;
use tracing::error;

fn info() -> &'static str {
    "starts the loaded kernel"
}

fn run(hal: &mut Hal, args: &str) -> Result<(), HalError> {
    if !args.trim().is_empty() {
        return Err(HalError::InvalidArgument("go! takes no arguments".to_string()));
    }

    if hal.kernel_entry().is_none() {
        error!("Valid kernel image has not been loaded.");
        return Err(HalError::NoValidKernel);
    }

    tracing::info!("Running");
    hal.console().print(format_args!("\nRunning kernel\n{RESET_SEQUENCE}"));

    match hal.launch() {
        Ok(never) => match never {},
        Err(e) => Err(e),
    }
}

/// Register `go!`.
pub fn register(registry: &mut CommandRegistry) {
    registry.register(Command {
        name: "go!",
        run,
        info,
    });
}
