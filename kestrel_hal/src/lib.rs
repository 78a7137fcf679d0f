//! # Kestrel HAL Library
//!
//! Hardware Abstraction Layer of a second-stage boot loader: it brings up
//! minimal hardware state, serves kernel and script bytes from pluggable
//! transports, and performs the one-way hand-off to the loaded kernel.
//!
//! # Module Structure
//!
//! - [`core`](crate::core) - `Hal` context: start-up, teardown, launch state, command execution
//! - [`arch`] - CPU-family seam (interrupt masking, caches, trampoline)
//! - [`board`] - Board profiles (addresses, device table, board commands)
//! - [`interrupts`] - Interrupt binding table and dispatch
//! - [`transport_registry`] - Device-id → transport mapping
//! - [`transports`] - Serial and USB CDC transports
//! - [`console`] - Console output and key decoding
//! - [`handoff`] - Boot hand-off sequence
//! - [`command_registry`] / [`commands`] - Loader commands
//! - [`timer`] - Tick source and bounded busy-waits
//! - [`sim`] - Host simulation backends
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          kestrel_hal                             │
//! │  ┌──────────────┐    ┌──────────────┐    ┌───────────────────┐   │
//! │  │   Commands   │───►│     Hal      │◄──►│ TransportRegistry │   │
//! │  │  (registry)  │    │  (context)   │    │  com1 / usb0      │   │
//! │  └──────────────┘    └──────┬───────┘    └───────────────────┘   │
//! │                             │                                    │
//! │               ┌─────────────┼──────────────┐                     │
//! │               ▼             ▼              ▼                     │
//! │      ┌──────────────┐ ┌───────────┐ ┌────────────┐               │
//! │      │ InterruptTbl │ │  Hand-off │ │ Cpu (arch) │               │
//! │      └──────────────┘ └───────────┘ └────────────┘               │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]

pub mod arch;
pub mod board;
pub mod command_registry;
pub mod commands;
pub mod console;
pub mod core;
pub mod handoff;
pub mod interrupts;
pub mod sim;
pub mod timer;
pub mod transport_registry;
pub mod transports;

// Re-export key types for convenience
pub use crate::board::BoardProfile;
pub use crate::command_registry::{Command, CommandRegistry};
pub use crate::core::{Hal, HalParts, LaunchState};
pub use crate::interrupts::{InterruptTable, Isr};
pub use crate::transport_registry::{TransportRegistry, TransportState};
