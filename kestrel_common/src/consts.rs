//! System-wide constants for the kestrel workspace.
//!
//! Single source of truth for table capacities and timing defaults.

use static_assertions::const_assert;

/// Maximum number of loader commands (base set plus board set).
pub const MAX_COMMANDS: usize = 32;

/// Upper bound on any board's interrupt table size.
pub const MAX_INTERRUPTS: usize = 256;

/// Maximum number of registered device transports.
pub const MAX_DEVICES: usize = 4;

/// Maximum number of simultaneously open handles per transport.
pub const MAX_HANDLES: usize = 4;

/// Timer ticks per second (1 tick = 1 ms).
pub const TICKS_PER_SECOND: u64 = 1000;

/// Default autoboot countdown in seconds.
pub const DEFAULT_LAUNCH_TIMEOUT_S: u64 = 3;

/// Default transmit-flush wait before hand-off, in ticks.
pub const DEFAULT_SETTLE_TICKS: u64 = 100;

/// Poll window for a single blocking console read, in ticks.
pub const CONSOLE_POLL_TICKS: u64 = 500;

/// Stack reserved after the loader image, reported to the kernel.
pub const LOADER_STACK_SIZE: usize = 0x2000;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/kestrel/loader.toml";

/// Name of the script executed at start-up.
pub const PRE_INIT_SCRIPT: &str = "pre-init";

const_assert!(MAX_COMMANDS >= 8);
const_assert!(MAX_INTERRUPTS <= u16::MAX as usize);
const_assert!(MAX_DEVICES <= u8::MAX as usize);
const_assert!(DEFAULT_SETTLE_TICKS > 0);
