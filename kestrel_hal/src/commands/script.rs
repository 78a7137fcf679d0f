//! `script` - show a boot script.

use crate::command_registry::{Command, CommandRegistry};
use crate::core::Hal;
use kestrel_common::consts::PRE_INIT_SCRIPT;
use kestrel_common::hal::error::HalError;

fn info() -> &'static str {
    "shows a boot script, usage: script [name]"
}

fn run(hal: &mut Hal, args: &str) -> Result<(), HalError> {
    let mut words = args.split_whitespace();
    let name = words.next().unwrap_or(PRE_INIT_SCRIPT);
    if words.next().is_some() {
        return Err(HalError::InvalidArgument("script takes one name".to_string()));
    }

    let body = hal
        .config()
        .script(name)
        .ok_or_else(|| HalError::NotFound(format!("script '{name}'")))?
        .to_owned();

    let console = hal.console();
    console.print(format_args!("Script '{name}':\n"));
    for line in body.lines() {
        console.print(format_args!("  {line}\n"));
    }
    Ok(())
}

/// Register `script`.
pub fn register(registry: &mut CommandRegistry) {
    registry.register(Command {
        name: "script",
        run,
        info,
    });
}
