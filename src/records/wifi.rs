use std::fmt;
use std::net::SocketAddr;

use serde_json::{json, Value as JsonValue};

use crate::encoder::encode;
use crate::value::Value;

/// A host name paired with its textual address.
///
/// Encodes as `[host_name, host_address]`.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InetAddress {
    pub host_name: String,
    pub host_address: String,
}

impl InetAddress {
    #[must_use]
    pub fn new(host_name: impl Into<String>, host_address: impl Into<String>) -> Self {
        Self {
            host_name: host_name.into(),
            host_address: host_address.into(),
        }
    }

    pub(crate) fn to_json(&self) -> JsonValue {
        json!([self.host_name, self.host_address])
    }
}

impl fmt::Display for InetAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.host_name, self.host_address)
    }
}

/// A host name and port. Encodes as `[host_name, port]`.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SocketAddress {
    pub host_name: String,
    pub port: u16,
}

impl SocketAddress {
    #[must_use]
    pub fn new(host_name: impl Into<String>, port: u16) -> Self {
        Self {
            host_name: host_name.into(),
            port,
        }
    }

    pub(crate) fn to_json(&self) -> JsonValue {
        json!([self.host_name, self.port])
    }
}

impl From<SocketAddr> for SocketAddress {
    fn from(addr: SocketAddr) -> Self {
        Self::new(addr.ip().to_string(), addr.port())
    }
}

/// One access point seen by a Wi-Fi scan.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WifiScanResult {
    pub bssid: String,
    pub ssid: String,
    pub frequency: i32,
    pub level: i32,
    pub capabilities: String,
    pub timestamp: i64,
}

impl WifiScanResult {
    pub(crate) fn to_json(&self) -> JsonValue {
        json!({
            "BSSID": self.bssid,
            "SSID": self.ssid,
            "frequency": self.frequency,
            "level": self.level,
            "capabilities": self.capabilities,
            "timestamp": self.timestamp,
        })
    }
}

/// A batch of scan results from the background scanner.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WifiScanData {
    pub id: i32,
    pub flags: i32,
    pub results: Vec<WifiScanResult>,
}

impl WifiScanData {
    pub(crate) fn to_json(&self) -> JsonValue {
        json!({
            "Id": self.id,
            "Flags": self.flags,
            "ScanResults": self.results.iter().map(WifiScanResult::to_json).collect::<Vec<_>>(),
        })
    }
}

/// WPA supplicant state of the current connection.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupplicantState {
    Associated,
    Associating,
    Completed,
    Disconnected,
    Dormant,
    FourWayHandshake,
    GroupHandshake,
    Inactive,
    Invalid,
    Scanning,
    Uninitialized,
    /// States without a wire name; encoded as `null`.
    Other,
}

impl SupplicantState {
    /// Lowercase wire name, or `None` for states without one.
    #[must_use]
    pub const fn wire_name(self) -> Option<&'static str> {
        match self {
            Self::Associated => Some("associated"),
            Self::Associating => Some("associating"),
            Self::Completed => Some("completed"),
            Self::Disconnected => Some("disconnected"),
            Self::Dormant => Some("dormant"),
            Self::FourWayHandshake => Some("four_way_handshake"),
            Self::GroupHandshake => Some("group_handshake"),
            Self::Inactive => Some("inactive"),
            Self::Invalid => Some("invalid"),
            Self::Scanning => Some("scanning"),
            Self::Uninitialized => Some("uninitialized"),
            Self::Other => None,
        }
    }
}

/// Current Wi-Fi connection.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WifiInfo {
    pub hidden_ssid: bool,
    pub ip_address: i32,
    pub link_speed: i32,
    pub network_id: i32,
    pub rssi: i32,
    pub bssid: Option<String>,
    pub mac_address: Option<String>,
    pub ssid: Option<String>,
    pub supplicant_state: SupplicantState,
}

impl WifiInfo {
    pub(crate) fn to_json(&self) -> JsonValue {
        json!({
            "hidden_ssid": self.hidden_ssid,
            "ip_address": self.ip_address,
            "link_speed": self.link_speed,
            "network_id": self.network_id,
            "rssi": self.rssi,
            "BSSID": self.bssid,
            "mac_address": self.mac_address,
            "SSID": self.ssid,
            "supplicant_state": self.supplicant_state.wire_name(),
        })
    }
}

/// Coarse network connection state.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkState {
    Connecting,
    Connected,
    Suspended,
    Disconnecting,
    Disconnected,
    Unknown,
}

impl NetworkState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connecting => "CONNECTING",
            Self::Connected => "CONNECTED",
            Self::Suspended => "SUSPENDED",
            Self::Disconnecting => "DISCONNECTING",
            Self::Disconnected => "DISCONNECTED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInfo {
    pub is_available: bool,
    pub is_connected: bool,
    pub is_failover: bool,
    pub is_roaming: bool,
    pub extra_info: Option<String>,
    pub reason: Option<String>,
    pub type_name: String,
    pub subtype_name: String,
    pub state: NetworkState,
}

impl NetworkInfo {
    pub(crate) fn to_json(&self) -> JsonValue {
        json!({
            "isAvailable": self.is_available,
            "isConnected": self.is_connected,
            "isFailover": self.is_failover,
            "isRoaming": self.is_roaming,
            "ExtraInfo": self.extra_info,
            "FailedReason": self.reason,
            "TypeName": self.type_name,
            "SubtypeName": self.subtype_name,
            "State": self.state.as_str(),
        })
    }
}

/// Round-trip-time ranging capabilities of the Wi-Fi chip.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RttCapabilities {
    pub bw_supported: i32,
    pub lci_supported: bool,
    pub lcr_supported: bool,
    pub one_sided_rtt_supported: bool,
    pub preamble_supported: i32,
    pub two_sided_11mc_rtt_supported: bool,
}

impl RttCapabilities {
    pub(crate) fn to_json(&self) -> JsonValue {
        json!({
            "bwSupported": self.bw_supported,
            "lciSupported": self.lci_supported,
            "lcrSupported": self.lcr_supported,
            "oneSidedRttSupported": self.one_sided_rtt_supported,
            "preambleSupported": self.preamble_supported,
            "twoSided11McRttSupported": self.two_sided_11mc_rtt_supported,
        })
    }
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WifiActivityEnergyInfo {
    pub controller_energy_used: i64,
    pub controller_idle_time_millis: i64,
    pub controller_rx_time_millis: i64,
    pub controller_tx_time_millis: i64,
    pub stack_state: i32,
    pub timestamp: i64,
}

impl WifiActivityEnergyInfo {
    pub(crate) fn to_json(&self) -> JsonValue {
        json!({
            // Wire key, spelled as existing clients match it.
            "ControllerEnergyUserd": self.controller_energy_used,
            "ControllerIdleTimeMillis": self.controller_idle_time_millis,
            "ControllerRxTimeMillis": self.controller_rx_time_millis,
            "ControllerTxTimeMillis": self.controller_tx_time_millis,
            "StackState": self.stack_state,
            "TimeStamp": self.timestamp,
        })
    }
}

/// Status codes of a saved network.
pub mod config_status {
    /// Currently connected network.
    pub const CURRENT: i32 = 0;
    /// Disabled; will not be joined automatically.
    pub const DISABLED: i32 = 1;
    /// Enabled and eligible for association.
    pub const ENABLED: i32 = 2;
}

/// A saved Wi-Fi network.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WifiConfiguration {
    pub network_id: i32,
    /// SSID as stored by the platform, usually wrapped in double quotes.
    pub ssid: String,
    pub bssid: Option<String>,
    pub priority: i32,
    pub hidden_ssid: bool,
    pub status: i32,
}

impl WifiConfiguration {
    /// SSID with one pair of surrounding double quotes removed.
    #[must_use]
    pub fn unquoted_ssid(&self) -> &str {
        self.ssid
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .unwrap_or(&self.ssid)
    }

    pub(crate) fn to_json(&self) -> JsonValue {
        let status = match self.status {
            config_status::CURRENT => "CURRENT",
            config_status::DISABLED => "DISABLED",
            config_status::ENABLED => "ENABLED",
            _ => "UNKNOWN",
        };
        json!({
            "networkId": self.network_id,
            "SSID": self.unquoted_ssid(),
            "BSSID": self.bssid,
            "priority": self.priority,
            "hiddenSSID": self.hidden_ssid,
            "status": status,
        })
    }
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WifiP2pDevice {
    pub device_name: String,
    pub device_address: String,
}

impl WifiP2pDevice {
    pub(crate) fn to_json(&self) -> JsonValue {
        json!({
            "Name": self.device_name,
            "Address": self.device_address,
        })
    }
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WifiP2pInfo {
    pub group_formed: bool,
    pub is_group_owner: bool,
    pub group_owner_address: Option<InetAddress>,
}

impl WifiP2pInfo {
    pub(crate) fn to_json(&self) -> JsonValue {
        log::debug!("encoding p2p info");
        json!({
            "groupFormed": self.group_formed,
            "isGroupOwner": self.is_group_owner,
            "groupOwnerAddress": self.group_owner_address.as_ref().map(ToString::to_string),
        })
    }
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WifiP2pGroup {
    pub clients: Vec<WifiP2pDevice>,
    pub interface: Option<String>,
    pub network_name: Option<String>,
    pub owner: Option<WifiP2pDevice>,
    pub passphrase: Option<String>,
    pub network_id: i32,
}

impl WifiP2pGroup {
    pub(crate) fn to_json(&self) -> JsonValue {
        log::debug!("encoding p2p group with {} clients", self.clients.len());
        let clients = Value::collection(self.clients.iter().cloned());
        json!({
            "ClientList": encode(&clients),
            "Interface": self.interface,
            "Networkname": self.network_name,
            "Owner": self.owner.as_ref().map(WifiP2pDevice::to_json),
            "Passphrase": self.passphrase,
            "NetworkId": self.network_id,
        })
    }
}
