//! Runtime configuration.
//!
//! Every section has working defaults; hosts that want to tune capacities
//! can deserialize a [`TelemuxConfig`] from JSON. Missing fields fall back to
//! their defaults.

use serde::{Deserialize, Serialize};

use crate::error::{TelemuxError, TelemuxResult};
use crate::event::EventQueueConfig;
use crate::listener::RegistryConfig;

#[allow(missing_docs)]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemuxConfig {
    pub registry: RegistryConfig,
    pub events: EventQueueConfig,
}

impl TelemuxConfig {
    /// Parses a JSON configuration document.
    pub fn from_json_str(json: &str) -> TelemuxResult<Self> {
        serde_json::from_str(json).map_err(|e| TelemuxError::Config {
            message: format!("invalid telemux config: {e}"),
        })
    }
}
