//! `timeout` - show or set the autoboot countdown.

use crate::command_registry::{Command, CommandRegistry};
use crate::core::Hal;
use kestrel_common::consts::TICKS_PER_SECOND;
use kestrel_common::hal::error::HalError;

fn info() -> &'static str {
    "shows or sets the autoboot timeout, usage: timeout [seconds]"
}

fn run(hal: &mut Hal, args: &str) -> Result<(), HalError> {
    let words: Vec<&str> = args.split_whitespace().collect();
    match words.as_slice() {
        [] => {
            let secs = hal.launch_timeout() / TICKS_PER_SECOND;
            hal.console().print(format_args!("timeout: {secs}\n"));
            Ok(())
        }
        [secs] => {
            let secs: u64 = secs
                .parse()
                .map_err(|_| HalError::InvalidArgument(format!("'{secs}' is not a number")))?;
            hal.set_launch_timeout(secs.saturating_mul(TICKS_PER_SECOND));
            Ok(())
        }
        _ => Err(HalError::InvalidArgument("timeout takes one number".to_string())),
    }
}

/// Register `timeout`.
pub fn register(registry: &mut CommandRegistry) {
    registry.register(Command {
        name: "timeout",
        run,
        info,
    });
}
