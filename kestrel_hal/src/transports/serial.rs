//! Serial byte-stream transport.

use super::{HandleSet, Uart};
use crate::timer::{Clock, poll_until};
use kestrel_common::hal::error::HalError;
use kestrel_common::hal::transport::{DeviceTransport, Handle, OpenFlags};
use tracing::debug;

/// [`DeviceTransport`] over a polled UART.
///
/// The path given to `open` is ignored: the far side of a serial line is a
/// single byte stream. A read returns as soon as at least one byte arrived
/// and then drains whatever else is already pending, up to the buffer size.
pub struct SerialTransport<U, K> {
    uart: U,
    clock: K,
    port: u32,
    handles: HandleSet,
}

impl<U: Uart, K: Clock> SerialTransport<U, K> {
    /// Wrap `uart` (hardware port `port`), timing reads against `clock`.
    pub fn new(uart: U, clock: K, port: u32) -> Self {
        Self {
            uart,
            clock,
            port,
            handles: HandleSet::default(),
        }
    }

    fn drain(&mut self, buf: &mut [u8]) -> usize {
        let mut n = 0;
        while n < buf.len() {
            match self.uart.read_byte() {
                Some(b) => {
                    buf[n] = b;
                    n += 1;
                }
                None => break,
            }
        }
        n
    }
}

impl<U: Uart, K: Clock> DeviceTransport for SerialTransport<U, K> {
    fn name(&self) -> &'static str {
        "serial"
    }

    fn device_number(&self) -> u32 {
        self.port
    }

    fn init(&mut self) -> Result<(), HalError> {
        self.uart.init()?;
        debug!("Serial port {} up", self.port);
        Ok(())
    }

    fn open(&mut self, _path: &str, _flags: OpenFlags) -> Result<Handle, HalError> {
        self.handles.allocate()
    }

    fn read(&mut self, handle: Handle, buf: &mut [u8], timeout: u64) -> Result<usize, HalError> {
        self.handles.check(handle)?;
        if buf.is_empty() {
            return Ok(0);
        }

        let uart = &self.uart;
        if !poll_until(&self.clock, timeout, || !uart.rx_empty()) {
            return Err(HalError::TransportTimeout(timeout));
        }
        Ok(self.drain(buf))
    }

    fn write(&mut self, handle: Handle, buf: &[u8]) -> Result<usize, HalError> {
        self.handles.check(handle)?;
        for &b in buf {
            self.uart.write_byte(b)?;
        }
        Ok(buf.len())
    }

    fn close(&mut self, handle: Handle) -> Result<(), HalError> {
        self.handles.release(handle)
    }

    fn deinit(&mut self) -> Result<(), HalError> {
        self.handles.clear();
        self.uart.deinit();
        Ok(())
    }
}
