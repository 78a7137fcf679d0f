//! Command registry.
//!
//! Ordered, bounded table of loader commands. Registration order is the
//! order `help` lists commands in. When the table is full further
//! registrations are dropped without an error: registration runs before
//! the console exists, so there is nobody to report to.
//!
//! Names are not required to be unique. A duplicate registration takes a
//! slot and shows up in listings, and [`CommandRegistry::lookup`] returns
//! the earliest entry with the name.

use crate::core::Hal;
use heapless::Vec;
use kestrel_common::consts::MAX_COMMANDS;
use kestrel_common::hal::error::HalError;
use static_assertions::assert_impl_all;
use std::fmt;

/// Command body: receives the HAL context and the argument string.
pub type CommandFn = fn(&mut Hal, &str) -> Result<(), HalError>;

/// One loader command.
#[derive(Clone, Copy)]
pub struct Command {
    /// Name the shell resolves.
    pub name: &'static str,
    /// Command body.
    pub run: CommandFn,
    /// One-line description for `help`.
    pub info: fn() -> &'static str,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command").field("name", &self.name).finish()
    }
}

// Board profiles hold command tables in statics.
assert_impl_all!(Command: Copy, Send, Sync);

/// Registry of loader commands.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: Vec<Command, MAX_COMMANDS>,
}

impl CommandRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `command`. Returns false if the table was full and the
    /// command was dropped.
    pub fn register(&mut self, command: Command) -> bool {
        self.commands.push(command).is_ok()
    }

    /// Append all of `commands`, or none of them if they do not all fit.
    pub fn append(&mut self, commands: &[Command]) -> bool {
        if self.commands.len() + commands.len() > self.commands.capacity() {
            return false;
        }
        self.commands.extend(commands.iter().copied());
        true
    }

    /// First command registered under `name`.
    ///
    /// # Errors
    /// Returns `HalError::NotFound` if no command has that name.
    pub fn lookup(&self, name: &str) -> Result<Command, HalError> {
        self.commands
            .iter()
            .find(|c| c.name == name)
            .copied()
            .ok_or_else(|| HalError::NotFound(format!("command '{name}'")))
    }

    /// Commands in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(_hal: &mut Hal, _args: &str) -> Result<(), HalError> {
        Ok(())
    }

    fn fail(_hal: &mut Hal, _args: &str) -> Result<(), HalError> {
        Err(HalError::InvalidArgument("fail".into()))
    }

    fn info() -> &'static str {
        "test command"
    }

    const NAMES: [&str; MAX_COMMANDS + 4] = [
        "c0", "c1", "c2", "c3", "c4", "c5", "c6", "c7", "c8", "c9", "c10", "c11", "c12", "c13",
        "c14", "c15", "c16", "c17", "c18", "c19", "c20", "c21", "c22", "c23", "c24", "c25",
        "c26", "c27", "c28", "c29", "c30", "c31", "c32", "c33", "c34", "c35",
    ];

    fn cmd(name: &'static str) -> Command {
        Command { name, run: ok, info }
    }

    #[test]
    fn overflow_is_silently_dropped() {
        let mut reg = CommandRegistry::new();
        let accepted = NAMES.iter().filter(|n| reg.register(cmd(**n))).count();

        assert_eq!(accepted, MAX_COMMANDS);
        assert_eq!(reg.len(), MAX_COMMANDS);
        for dropped in &NAMES[MAX_COMMANDS..] {
            assert!(matches!(reg.lookup(dropped), Err(HalError::NotFound(_))));
        }
        let order: std::vec::Vec<_> = reg.iter().map(|c| c.name).collect();
        assert_eq!(order, NAMES[..MAX_COMMANDS]);
    }

    #[test]
    fn duplicates_kept_first_wins() {
        let mut reg = CommandRegistry::new();
        reg.register(cmd("go!"));
        reg.register(Command {
            name: "go!",
            run: fail,
            info,
        });

        assert_eq!(reg.len(), 2);
        assert_eq!(reg.lookup("go!").unwrap().run as usize, ok as CommandFn as usize);
    }

    #[test]
    fn append_is_all_or_nothing() {
        let mut reg = CommandRegistry::new();
        for n in &NAMES[..MAX_COMMANDS - 1] {
            reg.register(cmd(*n));
        }

        let board = [cmd("cpuinfo"), cmd("irqstat")];
        assert!(!reg.append(&board));
        assert_eq!(reg.len(), MAX_COMMANDS - 1);
        assert!(reg.lookup("cpuinfo").is_err());

        assert!(reg.append(&board[..1]));
        assert!(reg.lookup("cpuinfo").is_ok());
    }

    #[test]
    fn unknown_command_not_found() {
        let reg = CommandRegistry::new();
        assert!(matches!(reg.lookup("boot"), Err(HalError::NotFound(_))));
    }
}
