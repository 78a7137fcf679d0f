//! Device transport trait and its value types.
//!
//! This module defines:
//! - `DeviceTransport` trait - Uniform byte-stream interface over a physical medium
//! - `DeviceId` - Loader-wide device identifier used for dispatch
//! - `Handle` - Per-open session token returned by a transport
//! - `OpenFlags` - Access mode requested at open time

use crate::hal::error::HalError;
use bitflags::bitflags;
use std::fmt;

/// Loader-wide identifier of a registered transport.
///
/// Small integers, mapped to human-readable names (`"com1"`, `"usb0"`) by
/// the board's device table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(pub u8);

impl DeviceId {
    /// First serial port.
    pub const COM1: DeviceId = DeviceId(0);
    /// First USB CDC-ACM function.
    pub const ACM0: DeviceId = DeviceId(1);
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dev{}", self.0)
    }
}

/// Session token returned by [`DeviceTransport::open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(pub u32);

bitflags! {
    /// Access mode requested at open time.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OpenFlags: u32 {
        /// Open for reading.
        const READ = 1 << 0;
        /// Open for writing.
        const WRITE = 1 << 1;
        /// Create the target if the medium supports it.
        const CREATE = 1 << 2;
    }
}

/// Trait defining the capability set of a device transport.
///
/// The transport registry manages transports through this trait, so new
/// media are added by implementing it and registering the implementation
/// under a [`DeviceId`]; calling code does not change.
///
/// # Lifecycle
///
/// 1. `init()` - Called once during HAL start-up
/// 2. `open()` / `read()` / `write()` / `close()` - Any number of times
/// 3. `deinit()` - Called once during the boot hand-off teardown
///
/// Retries, buffering and protocol framing are the transport's own concern;
/// the registry forwards calls verbatim.
pub trait DeviceTransport {
    /// Driver name (e.g. "serial", "usb-cdc").
    fn name(&self) -> &'static str;

    /// Medium-specific device number (UART index, bulk endpoint number).
    fn device_number(&self) -> u32;

    /// Bring the medium up. Called exactly once by the registry.
    fn init(&mut self) -> Result<(), HalError>;

    /// Open a session on the medium.
    ///
    /// `path` names the object on the far side of the medium; raw byte
    /// streams ignore it.
    fn open(&mut self, path: &str, flags: OpenFlags) -> Result<Handle, HalError>;

    /// Read up to `buf.len()` bytes.
    ///
    /// Polls for at most `timeout` ticks. Returns the number of bytes read
    /// (at least one), or `HalError::TransportTimeout` if nothing arrived.
    fn read(&mut self, handle: Handle, buf: &mut [u8], timeout: u64) -> Result<usize, HalError>;

    /// Write `buf`, returning the number of bytes accepted by the medium.
    fn write(&mut self, handle: Handle, buf: &[u8]) -> Result<usize, HalError>;

    /// Close a session.
    fn close(&mut self, handle: Handle) -> Result<(), HalError>;

    /// Release the medium. Called at most once, only after a successful `init`.
    fn deinit(&mut self) -> Result<(), HalError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_known_ids_are_distinct() {
        assert_ne!(DeviceId::COM1, DeviceId::ACM0);
        assert_eq!(DeviceId::ACM0.to_string(), "dev1");
    }

    #[test]
    fn open_flags_combine() {
        let rw = OpenFlags::READ | OpenFlags::WRITE;
        assert!(rw.contains(OpenFlags::READ));
        assert!(!rw.contains(OpenFlags::CREATE));
    }
}
