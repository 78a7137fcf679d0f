//! USB CDC-ACM transport.

use super::{HandleSet, UsbBulk};
use crate::timer::{Clock, poll_until};
use kestrel_common::hal::error::HalError;
use kestrel_common::hal::transport::{DeviceTransport, Handle, OpenFlags};
use tracing::debug;

/// [`DeviceTransport`] over the bulk endpoints of a CDC-ACM function.
///
/// Sessions can only be opened once the host has configured the device.
pub struct UsbCdcTransport<E, K> {
    endpoint: E,
    clock: K,
    number: u32,
    handles: HandleSet,
}

impl<E: UsbBulk, K: Clock> UsbCdcTransport<E, K> {
    /// Wrap the bulk endpoint pair `number`, timing reads against `clock`.
    pub fn new(endpoint: E, clock: K, number: u32) -> Self {
        Self {
            endpoint,
            clock,
            number,
            handles: HandleSet::default(),
        }
    }
}

impl<E: UsbBulk, K: Clock> DeviceTransport for UsbCdcTransport<E, K> {
    fn name(&self) -> &'static str {
        "usb-cdc"
    }

    fn device_number(&self) -> u32 {
        self.number
    }

    fn init(&mut self) -> Result<(), HalError> {
        self.endpoint.init()?;
        debug!("USB CDC function {} attached", self.number);
        Ok(())
    }

    fn open(&mut self, _path: &str, _flags: OpenFlags) -> Result<Handle, HalError> {
        if !self.endpoint.configured() {
            return Err(HalError::Communication(
                "USB host has not configured the device".to_string(),
            ));
        }
        self.handles.allocate()
    }

    fn read(&mut self, handle: Handle, buf: &mut [u8], timeout: u64) -> Result<usize, HalError> {
        self.handles.check(handle)?;
        if buf.is_empty() {
            return Ok(0);
        }

        let endpoint = &mut self.endpoint;
        let mut received = Ok(0);
        let ready = poll_until(&self.clock, timeout, || {
            received = endpoint.receive(buf);
            !matches!(received, Ok(0))
        });
        if !ready {
            return Err(HalError::TransportTimeout(timeout));
        }
        received
    }

    fn write(&mut self, handle: Handle, buf: &[u8]) -> Result<usize, HalError> {
        self.handles.check(handle)?;
        let mut sent = 0;
        while sent < buf.len() {
            let n = self.endpoint.send(&buf[sent..])?;
            if n == 0 {
                break;
            }
            sent += n;
        }
        Ok(sent)
    }

    fn close(&mut self, handle: Handle) -> Result<(), HalError> {
        self.handles.release(handle)
    }

    fn deinit(&mut self) -> Result<(), HalError> {
        self.handles.clear();
        self.endpoint.deinit();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimTimer, SimUsbEndpoint};

    #[test]
    fn open_requires_configuration() {
        let ep = SimUsbEndpoint::new();
        let mut t = UsbCdcTransport::new(ep.clone(), SimTimer::new(1), 1);
        t.init().unwrap();
        assert!(matches!(
            t.open("", OpenFlags::READ),
            Err(HalError::Communication(_))
        ));

        ep.set_configured(true);
        assert!(t.open("", OpenFlags::READ).is_ok());
    }

    #[test]
    fn read_and_write_round_trip_through_host() {
        let ep = SimUsbEndpoint::new();
        ep.set_configured(true);
        let mut t = UsbCdcTransport::new(ep.clone(), SimTimer::new(1), 1);
        t.init().unwrap();
        let h = t.open("kernel", OpenFlags::READ | OpenFlags::WRITE).unwrap();

        ep.host_send(b"\x7fELF");
        let mut buf = [0u8; 16];
        assert_eq!(t.read(h, &mut buf, 100), Ok(4));
        assert_eq!(&buf[..4], b"\x7fELF");

        assert_eq!(t.write(h, b"ack"), Ok(3));
        assert_eq!(ep.host_take(), b"ack");
    }

    #[test]
    fn idle_endpoint_times_out() {
        let ep = SimUsbEndpoint::new();
        ep.set_configured(true);
        let mut t = UsbCdcTransport::new(ep, SimTimer::new(1), 1);
        t.init().unwrap();
        let h = t.open("", OpenFlags::READ).unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(t.read(h, &mut buf, 50), Err(HalError::TransportTimeout(50)));
    }
}
