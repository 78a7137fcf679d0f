//! Device transports.
//!
//! Each transport adapts one kind of medium to [`DeviceTransport`]:
//!
//! - [`serial::SerialTransport`] - byte stream over a [`Uart`]
//! - [`usb::UsbCdcTransport`] - CDC-ACM stream over a [`UsbBulk`] endpoint pair
//!
//! The medium traits are what a board back end implements; the simulated
//! media live in [`crate::sim`].
//!
//! [`DeviceTransport`]: kestrel_common::hal::transport::DeviceTransport

pub mod serial;
pub mod usb;

use heapless::Vec;
use kestrel_common::consts::MAX_HANDLES;
use kestrel_common::hal::error::HalError;
use kestrel_common::hal::transport::Handle;

pub use serial::SerialTransport;
pub use usb::UsbCdcTransport;

/// Polled UART.
pub trait Uart {
    /// Configure baud rate, framing and FIFOs.
    fn init(&mut self) -> Result<(), HalError>;

    /// Pop one received byte, if any is pending.
    fn read_byte(&mut self) -> Option<u8>;

    /// Queue one byte for transmission.
    fn write_byte(&mut self, byte: u8) -> Result<(), HalError>;

    /// True when no received byte is pending.
    fn rx_empty(&self) -> bool;

    /// Drain the transmitter and disable the peripheral.
    fn deinit(&mut self);
}

/// Bulk IN/OUT endpoint pair of a USB device function.
pub trait UsbBulk {
    /// Attach to the bus and start enumeration.
    fn init(&mut self) -> Result<(), HalError>;

    /// True once the host has selected a configuration.
    fn configured(&self) -> bool;

    /// Copy pending OUT data into `buf`, returning the byte count (possibly 0).
    fn receive(&mut self, buf: &mut [u8]) -> Result<usize, HalError>;

    /// Queue `buf` on the IN endpoint, returning how many bytes were taken.
    fn send(&mut self, buf: &[u8]) -> Result<usize, HalError>;

    /// Detach from the bus.
    fn deinit(&mut self);
}

/// Open-handle bookkeeping shared by the transports.
#[derive(Debug, Default)]
pub(crate) struct HandleSet {
    open: Vec<Handle, MAX_HANDLES>,
    next: u32,
}

impl HandleSet {
    pub(crate) fn allocate(&mut self) -> Result<Handle, HalError> {
        let handle = Handle(self.next);
        self.open
            .push(handle)
            .map_err(|_| HalError::OutOfRange(format!("more than {MAX_HANDLES} open handles")))?;
        self.next = self.next.wrapping_add(1);
        Ok(handle)
    }

    pub(crate) fn check(&self, handle: Handle) -> Result<(), HalError> {
        if self.open.contains(&handle) {
            Ok(())
        } else {
            Err(HalError::InvalidArgument(format!("handle {} is not open", handle.0)))
        }
    }

    pub(crate) fn release(&mut self, handle: Handle) -> Result<(), HalError> {
        let pos = self
            .open
            .iter()
            .position(|h| *h == handle)
            .ok_or_else(|| HalError::InvalidArgument(format!("handle {} is not open", handle.0)))?;
        self.open.swap_remove(pos);
        Ok(())
    }

    pub(crate) fn clear(&mut self) {
        self.open.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_unique_and_bounded() {
        let mut set = HandleSet::default();
        let handles: std::vec::Vec<_> = (0..MAX_HANDLES).map(|_| set.allocate().unwrap()).collect();
        assert_eq!(handles.len(), MAX_HANDLES);
        assert!(matches!(set.allocate(), Err(HalError::OutOfRange(_))));

        set.release(handles[1]).unwrap();
        let again = set.allocate().unwrap();
        assert!(!handles.contains(&again));
    }

    #[test]
    fn closed_handle_rejected() {
        let mut set = HandleSet::default();
        let h = set.allocate().unwrap();
        set.release(h).unwrap();
        assert!(matches!(set.check(h), Err(HalError::InvalidArgument(_))));
        assert!(matches!(set.release(h), Err(HalError::InvalidArgument(_))));
    }
}
