//! Platform record types with fixed wire mappings.
//!
//! Every record has one hand-written mapping to a JSON object (or, for the
//! address types, a two-element array). There is no generic field walker:
//! adding a record means adding a variant here and one `to_json` function
//! next to the struct. Keys are part of the wire contract and stay stable.

/// Bluetooth devices, GATT and BLE scan records.
pub mod bluetooth;
/// Location, intents and display records.
pub mod system;
/// Telephony and telecom records.
pub mod telephony;
/// Wi-Fi, P2P and IP addressing records.
pub mod wifi;

use serde_json::Value as JsonValue;

use crate::event::EventEnvelope;

pub use bluetooth::{
    BleAdvertiseSettings, BleScanRecord, BleScanResult, BluetoothDevice, GattCharacteristic,
    GattDescriptor, GattService,
};
pub use system::{Address, DisplayMetrics, Intent, Location, Point};
pub use telephony::{
    AudioState, CellLocation, ModemActivityInfo, NeighboringCellInfo, PhoneAccount,
    PhoneAccountHandle, ServiceStateInfo, SmsMessage, SubscriptionInfo,
};
pub use wifi::{
    InetAddress, NetworkInfo, NetworkState, RttCapabilities, SocketAddress, SupplicantState,
    WifiActivityEnergyInfo, WifiConfiguration, WifiInfo, WifiP2pDevice, WifiP2pGroup,
    WifiP2pInfo, WifiScanData, WifiScanResult,
};

/// All record types with a dedicated wire mapping.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Address(Address),
    AudioState(AudioState),
    Location(Location),
    Intent(Box<Intent>),
    Event(Box<EventEnvelope>),
    Uuid(uuid::Uuid),
    WifiScanResult(WifiScanResult),
    WifiScanData(WifiScanData),
    BleScanResult(BleScanResult),
    BleAdvertiseSettings(BleAdvertiseSettings),
    BluetoothDevice(BluetoothDevice),
    GattService(GattService),
    GattCharacteristic(GattCharacteristic),
    GattDescriptor(GattDescriptor),
    CellLocation(CellLocation),
    NeighboringCellInfo(NeighboringCellInfo),
    WifiInfo(WifiInfo),
    NetworkInfo(NetworkInfo),
    SocketAddress(SocketAddress),
    InetAddress(InetAddress),
    Point(Point),
    SmsMessage(SmsMessage),
    PhoneAccount(PhoneAccount),
    PhoneAccountHandle(PhoneAccountHandle),
    SubscriptionInfo(SubscriptionInfo),
    DisplayMetrics(DisplayMetrics),
    RttCapabilities(RttCapabilities),
    WifiActivityEnergyInfo(WifiActivityEnergyInfo),
    WifiConfiguration(WifiConfiguration),
    WifiP2pDevice(WifiP2pDevice),
    WifiP2pInfo(WifiP2pInfo),
    WifiP2pGroup(WifiP2pGroup),
    ServiceStateInfo(ServiceStateInfo),
    ModemActivityInfo(ModemActivityInfo),
}

impl Record {
    /// Applies the record's fixed mapping.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Address(r) => r.to_json(),
            Self::AudioState(r) => r.to_json(),
            Self::Location(r) => r.to_json(),
            Self::Intent(r) => r.to_json(),
            Self::Event(r) => r.to_json(),
            Self::Uuid(r) => JsonValue::String(r.hyphenated().to_string()),
            Self::WifiScanResult(r) => r.to_json(),
            Self::WifiScanData(r) => r.to_json(),
            Self::BleScanResult(r) => r.to_json(),
            Self::BleAdvertiseSettings(r) => r.to_json(),
            Self::BluetoothDevice(r) => r.to_json(),
            Self::GattService(r) => r.to_json(),
            Self::GattCharacteristic(r) => r.to_json(),
            Self::GattDescriptor(r) => r.to_json(),
            Self::CellLocation(r) => r.to_json(),
            Self::NeighboringCellInfo(r) => r.to_json(),
            Self::WifiInfo(r) => r.to_json(),
            Self::NetworkInfo(r) => r.to_json(),
            Self::SocketAddress(r) => r.to_json(),
            Self::InetAddress(r) => r.to_json(),
            Self::Point(r) => r.to_json(),
            Self::SmsMessage(r) => r.to_json(),
            Self::PhoneAccount(r) => r.to_json(),
            Self::PhoneAccountHandle(r) => r.to_json(),
            Self::SubscriptionInfo(r) => r.to_json(),
            Self::DisplayMetrics(r) => r.to_json(),
            Self::RttCapabilities(r) => r.to_json(),
            Self::WifiActivityEnergyInfo(r) => r.to_json(),
            Self::WifiConfiguration(r) => r.to_json(),
            Self::WifiP2pDevice(r) => r.to_json(),
            Self::WifiP2pInfo(r) => r.to_json(),
            Self::WifiP2pGroup(r) => r.to_json(),
            Self::ServiceStateInfo(r) => r.to_json(),
            Self::ModemActivityInfo(r) => r.to_json(),
        }
    }

    /// Returns the record's type name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Address(_) => "address",
            Self::AudioState(_) => "audio_state",
            Self::Location(_) => "location",
            Self::Intent(_) => "intent",
            Self::Event(_) => "event",
            Self::Uuid(_) => "uuid",
            Self::WifiScanResult(_) => "wifi_scan_result",
            Self::WifiScanData(_) => "wifi_scan_data",
            Self::BleScanResult(_) => "ble_scan_result",
            Self::BleAdvertiseSettings(_) => "ble_advertise_settings",
            Self::BluetoothDevice(_) => "bluetooth_device",
            Self::GattService(_) => "gatt_service",
            Self::GattCharacteristic(_) => "gatt_characteristic",
            Self::GattDescriptor(_) => "gatt_descriptor",
            Self::CellLocation(_) => "cell_location",
            Self::NeighboringCellInfo(_) => "neighboring_cell_info",
            Self::WifiInfo(_) => "wifi_info",
            Self::NetworkInfo(_) => "network_info",
            Self::SocketAddress(_) => "socket_address",
            Self::InetAddress(_) => "inet_address",
            Self::Point(_) => "point",
            Self::SmsMessage(_) => "sms_message",
            Self::PhoneAccount(_) => "phone_account",
            Self::PhoneAccountHandle(_) => "phone_account_handle",
            Self::SubscriptionInfo(_) => "subscription_info",
            Self::DisplayMetrics(_) => "display_metrics",
            Self::RttCapabilities(_) => "rtt_capabilities",
            Self::WifiActivityEnergyInfo(_) => "wifi_activity_energy_info",
            Self::WifiConfiguration(_) => "wifi_configuration",
            Self::WifiP2pDevice(_) => "wifi_p2p_device",
            Self::WifiP2pInfo(_) => "wifi_p2p_info",
            Self::WifiP2pGroup(_) => "wifi_p2p_group",
            Self::ServiceStateInfo(_) => "service_state",
            Self::ModemActivityInfo(_) => "modem_activity_info",
        }
    }
}

macro_rules! record_conversions {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Record {
                fn from(v: $ty) -> Self {
                    Self::$variant(v)
                }
            }

            impl From<$ty> for crate::value::Value {
                fn from(v: $ty) -> Self {
                    Self::Record(Record::$variant(v))
                }
            }
        )*
    };
}

record_conversions! {
    Address => Address,
    AudioState => AudioState,
    Location => Location,
    Uuid => uuid::Uuid,
    WifiScanResult => WifiScanResult,
    WifiScanData => WifiScanData,
    BleScanResult => BleScanResult,
    BleAdvertiseSettings => BleAdvertiseSettings,
    BluetoothDevice => BluetoothDevice,
    GattService => GattService,
    GattCharacteristic => GattCharacteristic,
    GattDescriptor => GattDescriptor,
    CellLocation => CellLocation,
    NeighboringCellInfo => NeighboringCellInfo,
    WifiInfo => WifiInfo,
    NetworkInfo => NetworkInfo,
    SocketAddress => SocketAddress,
    InetAddress => InetAddress,
    Point => Point,
    SmsMessage => SmsMessage,
    PhoneAccount => PhoneAccount,
    PhoneAccountHandle => PhoneAccountHandle,
    SubscriptionInfo => SubscriptionInfo,
    DisplayMetrics => DisplayMetrics,
    RttCapabilities => RttCapabilities,
    WifiActivityEnergyInfo => WifiActivityEnergyInfo,
    WifiConfiguration => WifiConfiguration,
    WifiP2pDevice => WifiP2pDevice,
    WifiP2pInfo => WifiP2pInfo,
    WifiP2pGroup => WifiP2pGroup,
    ServiceStateInfo => ServiceStateInfo,
    ModemActivityInfo => ModemActivityInfo,
}

impl From<Intent> for Record {
    fn from(v: Intent) -> Self {
        Self::Intent(Box::new(v))
    }
}

impl From<Intent> for crate::value::Value {
    fn from(v: Intent) -> Self {
        Self::Record(Record::Intent(Box::new(v)))
    }
}

impl From<EventEnvelope> for Record {
    fn from(v: EventEnvelope) -> Self {
        Self::Event(Box::new(v))
    }
}

impl From<EventEnvelope> for crate::value::Value {
    fn from(v: EventEnvelope) -> Self {
        Self::Record(Record::Event(Box::new(v)))
    }
}

/// Renders bytes as comma-separated signed decimals (`"1,-1,127"`).
///
/// This is the legacy textual form used inside BLE scan records, distinct
/// from the base64 form used for top-level binary values.
pub(crate) fn signed_byte_list(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| i8::from_ne_bytes([*b]).to_string())
        .collect::<Vec<_>>()
        .join(",")
}
