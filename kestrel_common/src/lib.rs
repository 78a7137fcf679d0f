//! Kestrel Common Library
//!
//! Shared contract types for the kestrel second-stage boot loader: the HAL
//! error taxonomy, the device-transport capability trait, the boot-info
//! accessor trait, system-wide limits and configuration loading.
//!
//! # Module Structure
//!
//! - [`consts`] - System-wide limits and defaults
//! - [`hal`] - HAL contract types (errors, transports, boot info)
//! - [`config`] - Configuration loading traits and types
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use kestrel_common::prelude::*;
//! ```

pub mod config;
pub mod consts;
pub mod hal;
pub mod prelude;
