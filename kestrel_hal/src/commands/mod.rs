//! Built-in loader commands.
//!
//! Every command module exposes a `register` function. [`REGISTRATIONS`]
//! lists them in help order and [`register_all`] runs them once while the
//! HAL is assembled, before any command can execute.
//!
//! Board-specific commands live in [`board`] and are appended by the board
//! profile after the base set.

pub mod board;
pub mod go;
pub mod help;
pub mod lsdev;
pub mod script;
pub mod timeout;

use crate::command_registry::CommandRegistry;

/// Registration functions of the base command set, in help order.
pub const REGISTRATIONS: &[fn(&mut CommandRegistry)] = &[
    help::register,
    go::register,
    script::register,
    timeout::register,
    lsdev::register,
];

/// Register the base command set.
pub fn register_all(registry: &mut CommandRegistry) {
    for register in REGISTRATIONS {
        register(registry);
    }
}
