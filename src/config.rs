//! Fabric configuration parameters
//!
//! Tunables shared by every interface on one host bus.  Loaded by the
//! embedding system (typically from JSON) and handed to
//! [`Host::new`](crate::app::service::Host::new), which validates it.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::connection::CPORT_ID_MAX;
use crate::rpc::codec::Version;

/// Core fabric configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FabricConfig {
    /// Host bus number, used in entity names (`<bus>-<interface>`)
    pub bus_id: u8,

    // --- Control protocol ---
    /// Reserved cport carrying the control protocol on every interface
    pub control_cport_id: u16,
    /// Control protocol major version offered during negotiation
    pub control_version_major: u8,
    /// Control protocol minor version offered during negotiation
    pub control_version_minor: u8,

    // --- Enumeration ---
    /// Largest manifest (bytes) we are willing to fetch
    pub max_manifest_size: u16,
}

impl Default for FabricConfig {
    fn default() -> Self {
        Self {
            bus_id: 1,

            // Control protocol
            control_cport_id: 0,
            control_version_major: 0,
            control_version_minor: 2,

            // Enumeration
            max_manifest_size: 4096,
        }
    }
}

impl FabricConfig {
    pub fn control_version(&self) -> Version {
        Version::new(self.control_version_major, self.control_version_minor)
    }

    /// Reject configurations that cannot work on any fabric.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.control_cport_id > CPORT_ID_MAX {
            return Err(ConfigError::ValidationFailed(
                "control_cport_id exceeds the cport range",
            ));
        }
        // A manifest always carries its 4-byte header.
        if self.max_manifest_size < 4 {
            return Err(ConfigError::ValidationFailed(
                "max_manifest_size is below the manifest header size",
            ));
        }
        Ok(())
    }

    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(|_| ConfigError::Malformed)?;
        config.validate()?;
        Ok(config)
    }
}

/// Errors from loading or validating a [`FabricConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The document is not valid JSON for this schema.
    Malformed,
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "config malformed"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}
