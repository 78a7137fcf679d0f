//! Prelude module for common re-exports.
//!
//! ```rust
//! use kestrel_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{BoardKind, ConfigError, ConfigLoader, LoaderConfig, LogLevel};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{MAX_COMMANDS, MAX_DEVICES, MAX_INTERRUPTS, TICKS_PER_SECOND};

// ─── HAL Contract ───────────────────────────────────────────────────
pub use crate::hal::bootinfo::BootInfo;
pub use crate::hal::error::{HalError, errno, to_errno};
pub use crate::hal::transport::{DeviceId, DeviceTransport, Handle, OpenFlags};
pub use crate::hal::types::{CacheKind, IrqSource, KernelEntry};
