use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

use super::signed_byte_list;
use crate::encoder::encode;
use crate::value::Value;

#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BluetoothDevice {
    pub address: String,
    pub bond_state: i32,
    pub name: Option<String>,
    pub device_type: i32,
}

impl BluetoothDevice {
    pub(crate) fn to_json(&self) -> JsonValue {
        json!({
            "address": self.address,
            "state": self.bond_state,
            "name": self.name,
            "type": self.device_type,
        })
    }
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BleAdvertiseSettings {
    pub mode: i32,
    pub tx_power_level: i32,
    pub connectable: bool,
}

impl BleAdvertiseSettings {
    pub(crate) fn to_json(&self) -> JsonValue {
        json!({
            "mode": self.mode,
            "txPowerLevel": self.tx_power_level,
            "isConnectable": self.connectable,
        })
    }
}

/// Parsed advertisement payload of a BLE scan result.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BleScanRecord {
    pub device_name: Option<String>,
    pub tx_power_level: i32,
    pub advertise_flags: i32,
    /// Manufacturer id and payload, in advertisement order.
    pub manufacturer_data: Vec<(i32, Vec<u8>)>,
    /// Service UUID and payload, in advertisement order.
    pub service_data: Vec<(Uuid, Vec<u8>)>,
    pub service_uuids: Vec<Uuid>,
    /// The raw advertisement bytes.
    pub bytes: Vec<u8>,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BleScanResult {
    pub rssi: i32,
    pub timestamp_nanos: i64,
    pub device: BluetoothDevice,
    pub record: BleScanRecord,
}

impl BleScanResult {
    pub(crate) fn to_json(&self) -> JsonValue {
        let record = &self.record;

        let (manufacturer_ids, manufacturer_data): (Vec<i32>, Vec<String>) = record
            .manufacturer_data
            .iter()
            .map(|(id, data)| (*id, signed_byte_list(data)))
            .unzip();
        let (service_uuid_list, service_data_list): (Vec<String>, Vec<String>) = record
            .service_data
            .iter()
            .map(|(uuid, data)| (uuid.to_string(), signed_byte_list(data)))
            .unzip();
        let service_uuids: String = record
            .service_uuids
            .iter()
            .map(|uuid| format!(",{uuid}"))
            .collect();

        json!({
            "rssi": self.rssi,
            "timestampNanos": self.timestamp_nanos,
            "deviceName": record.device_name,
            "txPowerLevel": record.tx_power_level,
            "advertiseFlags": record.advertise_flags,
            "manufacturerSpecificDataList": manufacturer_data,
            // Wire key, spelled as existing clients match it.
            "manufacturereIdList": manufacturer_ids,
            "serviceUuidList": service_uuid_list,
            "serviceDataList": service_data_list,
            "serviceUuids": service_uuids,
            "scanRecord": signed_byte_list(&record.bytes),
            "deviceInfo": self.device.to_json(),
        })
    }
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GattDescriptor {
    pub instance_id: i32,
    pub permissions: i32,
    /// UUID of the owning characteristic, when attached.
    pub characteristic: Option<Uuid>,
    pub uuid: Uuid,
    pub value: Option<Vec<u8>>,
}

impl GattDescriptor {
    pub(crate) fn to_json(&self) -> JsonValue {
        json!({
            "instanceId": self.instance_id,
            "permissions": self.permissions,
            "characteristic": self.characteristic.map(|u| u.to_string()),
            "uuid": self.uuid.to_string(),
            "value": encode(&Value::from(self.value.clone().map(Value::Bytes))),
        })
    }
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GattCharacteristic {
    pub instance_id: i32,
    pub permissions: i32,
    pub properties: i32,
    pub write_type: i32,
    pub descriptors: Vec<GattDescriptor>,
    pub uuid: Uuid,
    pub value: Option<Vec<u8>>,
}

impl GattCharacteristic {
    pub(crate) fn to_json(&self) -> JsonValue {
        json!({
            "instanceId": self.instance_id,
            "permissions": self.permissions,
            "properties": self.properties,
            "writeType": self.write_type,
            "descriptorsList": encode(&Value::list(self.descriptors.iter().cloned())),
            "uuid": self.uuid.to_string(),
            "value": encode(&Value::from(self.value.clone().map(Value::Bytes))),
        })
    }
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GattService {
    pub instance_id: i32,
    pub service_type: i32,
    pub characteristics: Vec<GattCharacteristic>,
    pub included_services: Vec<GattService>,
    pub uuid: Uuid,
}

impl GattService {
    pub(crate) fn to_json(&self) -> JsonValue {
        json!({
            "instanceId": self.instance_id,
            "type": self.service_type,
            "gattCharacteristicList": encode(&Value::list(self.characteristics.iter().cloned())),
            "includedServices": encode(&Value::list(self.included_services.iter().cloned())),
            "uuid": self.uuid.to_string(),
        })
    }
}
