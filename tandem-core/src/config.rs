use crate::model::IceServerConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level configuration, usually read from a JSON file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TandemConfig {
    pub transport: TransportConfig,
    pub sync: SyncConfig,
}

/// Peer connection settings shared by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TransportConfig {
    /// STUN/TURN servers. Empty means host candidates only, which is enough when
    /// both endpoints live in the same process.
    pub ice_servers: Vec<IceServerConfig>,
    pub offer_to_receive_audio: bool,
    pub offer_to_receive_video: bool,
    pub control_channel_label: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ice_servers: Vec::new(),
            offer_to_receive_audio: true,
            offer_to_receive_video: true,
            control_channel_label: "sendDataChannel".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SyncConfig {
    pub broadcast_interval_ms: u64,
}

impl SyncConfig {
    pub fn broadcast_interval(&self) -> Duration {
        Duration::from_millis(self.broadcast_interval_ms.max(1))
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            broadcast_interval_ms: 500,
        }
    }
}
