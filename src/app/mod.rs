//! Application core: the host-side fabric service.
//!
//! [`service::Host`] owns the slot table and drives hotplug, unplug and
//! power commands.  All interaction with the fabric happens through
//! **port traits** defined in [`ports`], keeping this layer fully testable
//! without real hardware.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
