//! Hardware abstraction layer contract.
//!
//! Types shared between the HAL core and its collaborators: the error
//! taxonomy, the device-transport capability set, the boot-info accessors
//! and the small value types passed across those seams.

pub mod bootinfo;
pub mod error;
pub mod transport;
pub mod types;
