//! HAL error taxonomy.
//!
//! Every fallible HAL operation returns [`HalError`]. Commands report failures
//! to the shell through [`HalError::errno`], following the negative-errno
//! convention (`0` = success).

use crate::config::ConfigError;
use crate::hal::types::IrqSource;
use thiserror::Error;

/// Errno values used by the command contract.
pub mod errno {
    /// Success.
    pub const EOK: i32 = 0;
    /// Operation not permitted.
    pub const EPERM: i32 = 1;
    /// No such entry.
    pub const ENOENT: i32 = 2;
    /// Interrupted call.
    pub const EINTR: i32 = 4;
    /// I/O error.
    pub const EIO: i32 = 5;
    /// Exec format error.
    pub const ENOEXEC: i32 = 8;
    /// Invalid argument.
    pub const EINVAL: i32 = 22;
    /// Result out of range.
    pub const ERANGE: i32 = 34;
    /// Timer expired.
    pub const ETIME: i32 = 62;
}

/// Error types for HAL operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HalError {
    /// Malformed command input
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Interrupt source or table capacity exceeded
    #[error("Out of range: {0}")]
    OutOfRange(String),

    /// Unknown device identifier or command name
    #[error("Not found: {0}")]
    NotFound(String),

    /// Hand-off attempted without a verified kernel entry point
    #[error("Valid kernel image has not been loaded")]
    NoValidKernel,

    /// Dispatch to an interrupt source with no handler bound
    #[error("Unhandled interrupt: {0}")]
    Unhandled(IrqSource),

    /// The control-transfer sequence returned to the loader
    #[error("Kernel launch failed: control returned to the loader")]
    LaunchFailed,

    /// Bounded poll expired without data
    #[error("Transport timeout after {0} ticks")]
    TransportTimeout(u64),

    /// Transport or HAL start-up failed
    #[error("Initialization failed: {0}")]
    InitFailed(String),

    /// I/O failure reported by a transport driver
    #[error("Transport communication error: {0}")]
    Communication(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl HalError {
    /// Negative errno reported to the shell for this error.
    pub fn errno(&self) -> i32 {
        let code = match self {
            Self::InvalidArgument(_) | Self::Config(_) => errno::EINVAL,
            Self::OutOfRange(_) => errno::ERANGE,
            Self::NotFound(_) => errno::ENOENT,
            Self::NoValidKernel => errno::ENOEXEC,
            Self::Unhandled(_) => errno::EINTR,
            Self::LaunchFailed => errno::EPERM,
            Self::TransportTimeout(_) => errno::ETIME,
            Self::InitFailed(_) | Self::Communication(_) => errno::EIO,
        };
        -code
    }
}

impl From<ConfigError> for HalError {
    fn from(e: ConfigError) -> Self {
        HalError::Config(e.to_string())
    }
}

/// Convert a command result into the shell's return code.
pub fn to_errno(result: &Result<(), HalError>) -> i32 {
    match result {
        Ok(()) => errno::EOK,
        Err(e) => e.errno(),
    }
}
