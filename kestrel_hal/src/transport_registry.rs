//! Transport registry.
//!
//! Maps loader-wide [`DeviceId`]s to the transports serving them and owns
//! their lifecycle. Built once during HAL start-up: transports are
//! registered, `init` seals the registry, and from then on the mapping only
//! changes state, never membership.
//!
//! ```text
//! Registered ──init ok──► Ready ──deinit──► Released
//!      │
//!      └──init err──► Failed
//! ```

use heapless::Vec;
use kestrel_common::consts::MAX_DEVICES;
use kestrel_common::hal::error::HalError;
use kestrel_common::hal::transport::{DeviceId, DeviceTransport, Handle, OpenFlags};
use tracing::{debug, info, warn};

/// Lifecycle state of a registered transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    /// Registered, `init` not run yet.
    Registered,
    /// Initialised and serving requests.
    Ready,
    /// `init` failed; requests are refused.
    Failed,
    /// Torn down during hand-off.
    Released,
}

struct Slot {
    id: DeviceId,
    name: &'static str,
    state: TransportState,
    transport: Box<dyn DeviceTransport>,
}

/// Summary of one registry entry, for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportEntry {
    /// Identifier the transport serves.
    pub id: DeviceId,
    /// User-facing device name.
    pub name: &'static str,
    /// Transport driver name.
    pub driver: &'static str,
    /// Medium-specific device number.
    pub device_number: u32,
    /// Current lifecycle state.
    pub state: TransportState,
}

/// Registry of device transports.
///
/// Constructed at start-up and owned by the HAL context. No global state.
pub struct TransportRegistry {
    slots: Vec<Slot, MAX_DEVICES>,
    sealed: bool,
}

impl TransportRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            sealed: false,
        }
    }

    /// Register `transport` under `id` and user-facing `name`.
    ///
    /// # Errors
    /// - `HalError::InvalidArgument` if `id` or `name` is taken, or the
    ///   registry was already initialised
    /// - `HalError::OutOfRange` if the registry is full
    pub fn register(
        &mut self,
        id: DeviceId,
        name: &'static str,
        transport: Box<dyn DeviceTransport>,
    ) -> Result<(), HalError> {
        if self.sealed {
            return Err(HalError::InvalidArgument(format!(
                "cannot register {name}: transports already initialised"
            )));
        }
        if self.slots.iter().any(|s| s.id == id || s.name == name) {
            return Err(HalError::InvalidArgument(format!(
                "device {name} ({id}) is already registered"
            )));
        }

        let driver = transport.name();
        self.slots
            .push(Slot {
                id,
                name,
                state: TransportState::Registered,
                transport,
            })
            .map_err(|_| HalError::OutOfRange(format!("more than {MAX_DEVICES} devices")))?;

        debug!("Registered {} ({}) -> {}", name, id, driver);
        Ok(())
    }

    /// Initialise every registered transport in registration order.
    ///
    /// A failing transport is marked `Failed` and skipped; the others still
    /// come up. Returns the number of transports that are `Ready`.
    /// Calling it again is a no-op.
    pub fn init(&mut self) -> usize {
        if !self.sealed {
            self.sealed = true;
            for slot in self.slots.iter_mut() {
                match slot.transport.init() {
                    Ok(()) => {
                        slot.state = TransportState::Ready;
                        info!("Transport {} ({}) ready", slot.name, slot.transport.name());
                    }
                    Err(e) => {
                        slot.state = TransportState::Failed;
                        warn!("Transport {} failed to initialise: {}", slot.name, e);
                    }
                }
            }
        }
        self.ready_count()
    }

    /// Release every `Ready` transport. Idempotent.
    ///
    /// Transports that never came up are not touched.
    pub fn deinit(&mut self) {
        for slot in self.slots.iter_mut() {
            if slot.state != TransportState::Ready {
                continue;
            }
            if let Err(e) = slot.transport.deinit() {
                warn!("Transport {} deinit failed: {}", slot.name, e);
            }
            slot.state = TransportState::Released;
            debug!("Transport {} released", slot.name);
        }
    }

    /// Number of transports in the `Ready` state.
    pub fn ready_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.state == TransportState::Ready)
            .count()
    }

    /// Lifecycle state of `id`, if registered.
    pub fn state(&self, id: DeviceId) -> Option<TransportState> {
        self.slots.iter().find(|s| s.id == id).map(|s| s.state)
    }

    /// Identifier registered under the user-facing `name`.
    pub fn lookup_name(&self, name: &str) -> Option<DeviceId> {
        self.slots.iter().find(|s| s.name == name).map(|s| s.id)
    }

    /// All entries in registration order.
    pub fn entries(&self) -> impl Iterator<Item = TransportEntry> + '_ {
        self.slots.iter().map(|s| TransportEntry {
            id: s.id,
            name: s.name,
            driver: s.transport.name(),
            device_number: s.transport.device_number(),
            state: s.state,
        })
    }

    /// Transport serving `id`.
    ///
    /// # Errors
    /// - `HalError::NotFound` if `id` is unregistered or already released
    /// - `HalError::InitFailed` if the transport is not initialised
    pub fn resolve(&mut self, id: DeviceId) -> Result<&mut dyn DeviceTransport, HalError> {
        let slot = self
            .slots
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| HalError::NotFound(format!("no transport for {id}")))?;

        match slot.state {
            TransportState::Ready => Ok(slot.transport.as_mut()),
            TransportState::Released => {
                Err(HalError::NotFound(format!("{} was released", slot.name)))
            }
            TransportState::Failed => Err(HalError::InitFailed(format!(
                "{} failed to initialise",
                slot.name
            ))),
            TransportState::Registered => Err(HalError::InitFailed(format!(
                "{} is not initialised",
                slot.name
            ))),
        }
    }

    /// Open a session on device `id`.
    pub fn open(&mut self, id: DeviceId, path: &str, flags: OpenFlags) -> Result<Handle, HalError> {
        self.resolve(id)?.open(path, flags)
    }

    /// Read from a session on device `id`.
    pub fn read(
        &mut self,
        id: DeviceId,
        handle: Handle,
        buf: &mut [u8],
        timeout: u64,
    ) -> Result<usize, HalError> {
        self.resolve(id)?.read(handle, buf, timeout)
    }

    /// Write to a session on device `id`.
    pub fn write(&mut self, id: DeviceId, handle: Handle, buf: &[u8]) -> Result<usize, HalError> {
        self.resolve(id)?.write(handle, buf)
    }

    /// Close a session on device `id`.
    pub fn close(&mut self, id: DeviceId, handle: Handle) -> Result<(), HalError> {
        self.resolve(id)?.close(handle)
    }
}

impl Default for TransportRegistry {
    fn default() -> Self {
        Self::new()
    }
}
