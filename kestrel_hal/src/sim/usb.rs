use super::{Journal, SimEvent};
use crate::transports::UsbBulk;
use kestrel_common::hal::error::HalError;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

#[derive(Debug, Default)]
struct Endpoints {
    out: VecDeque<u8>,
    inbound: Vec<u8>,
    configured: bool,
    fail_init: bool,
    max_packet: usize,
}

/// In-memory CDC bulk endpoint pair. Clones share state; a test keeps one
/// clone as the USB host.
#[derive(Debug, Clone)]
pub struct SimUsbEndpoint {
    ep: Rc<RefCell<Endpoints>>,
    journal: Option<(Journal, &'static str)>,
}

impl SimUsbEndpoint {
    /// Unconfigured endpoint with 64-byte packets.
    pub fn new() -> Self {
        Self {
            ep: Rc::new(RefCell::new(Endpoints {
                max_packet: 64,
                ..Endpoints::default()
            })),
            journal: None,
        }
    }

    /// Make `init` fail, as with no cable attached.
    pub fn failing_init(self) -> Self {
        self.ep.borrow_mut().fail_init = true;
        self
    }

    /// Record `init`/`deinit` in `journal` under `name`.
    pub fn with_journal(mut self, journal: Journal, name: &'static str) -> Self {
        self.journal = Some((journal, name));
        self
    }

    /// Host selects (or drops) the configuration.
    pub fn set_configured(&self, configured: bool) {
        self.ep.borrow_mut().configured = configured;
    }

    /// Host sends bytes on the OUT endpoint.
    pub fn host_send(&self, bytes: &[u8]) {
        self.ep.borrow_mut().out.extend(bytes);
    }

    /// Host collects everything sent on the IN endpoint.
    pub fn host_take(&self) -> Vec<u8> {
        std::mem::take(&mut self.ep.borrow_mut().inbound)
    }

    fn record(&self, event: impl FnOnce(String) -> SimEvent) {
        if let Some((journal, name)) = &self.journal {
            journal.record(event(name.to_string()));
        }
    }
}

impl Default for SimUsbEndpoint {
    fn default() -> Self {
        Self::new()
    }
}

impl UsbBulk for SimUsbEndpoint {
    fn init(&mut self) -> Result<(), HalError> {
        if self.ep.borrow().fail_init {
            return Err(HalError::InitFailed("USB PHY did not come up".to_string()));
        }
        self.record(SimEvent::TransportInit);
        Ok(())
    }

    fn configured(&self) -> bool {
        self.ep.borrow().configured
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<usize, HalError> {
        let mut ep = self.ep.borrow_mut();
        let n = buf.len().min(ep.max_packet).min(ep.out.len());
        for (slot, byte) in buf.iter_mut().zip(ep.out.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn send(&mut self, buf: &[u8]) -> Result<usize, HalError> {
        let mut ep = self.ep.borrow_mut();
        if !ep.configured {
            return Err(HalError::Communication("USB host detached".to_string()));
        }
        let n = buf.len().min(ep.max_packet);
        ep.inbound.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn deinit(&mut self) {
        self.ep.borrow_mut().configured = false;
        self.record(SimEvent::TransportDeinit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receive_is_packet_limited() {
        let host = SimUsbEndpoint::new();
        let mut dev = host.clone();
        host.host_send(&[0xAA; 100]);

        let mut buf = [0u8; 128];
        assert_eq!(dev.receive(&mut buf), Ok(64));
        assert_eq!(dev.receive(&mut buf), Ok(36));
        assert_eq!(dev.receive(&mut buf), Ok(0));
    }

    #[test]
    fn send_needs_configuration() {
        let host = SimUsbEndpoint::new();
        let mut dev = host.clone();
        assert!(dev.send(b"x").is_err());
        host.set_configured(true);
        assert_eq!(dev.send(b"x"), Ok(1));
        assert_eq!(host.host_take(), b"x");
    }
}
