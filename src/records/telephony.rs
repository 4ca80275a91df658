use serde_json::{json, Map, Value as JsonValue};

use crate::codes::{network_type_name, RegState, UNKNOWN};

const ROUTE_EARPIECE: u32 = 0x1;
const ROUTE_BLUETOOTH: u32 = 0x2;
const ROUTE_WIRED_HEADSET: u32 = 0x4;
const ROUTE_SPEAKER: u32 = 0x8;

/// In-call audio state: mute flag and route bitmask.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AudioState {
    pub is_muted: bool,
    pub route: u32,
}

impl AudioState {
    /// Route bitmask as a comma-separated list (`"EARPIECE, SPEAKER"`).
    #[must_use]
    pub fn route_string(&self) -> String {
        [
            (ROUTE_EARPIECE, "EARPIECE"),
            (ROUTE_BLUETOOTH, "BLUETOOTH"),
            (ROUTE_WIRED_HEADSET, "WIRED_HEADSET"),
            (ROUTE_SPEAKER, "SPEAKER"),
        ]
        .iter()
        .filter(|(bit, _)| self.route & bit == *bit)
        .map(|(_, name)| *name)
        .collect::<Vec<_>>()
        .join(", ")
    }

    pub(crate) fn to_json(&self) -> JsonValue {
        json!({
            "isMuted": self.is_muted,
            "AudioRoute": self.route_string(),
        })
    }
}

/// Serving cell location. Only GSM locations carry fields on the wire.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellLocation {
    Gsm { lac: i32, cid: i32 },
    Other,
}

impl CellLocation {
    pub(crate) fn to_json(&self) -> JsonValue {
        match self {
            Self::Gsm { lac, cid } => json!({ "lac": lac, "cid": cid }),
            Self::Other => JsonValue::Object(Map::new()),
        }
    }
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NeighboringCellInfo {
    pub cid: i32,
    pub rssi: i32,
}

impl NeighboringCellInfo {
    pub(crate) fn to_json(&self) -> JsonValue {
        json!({ "cid": self.cid, "rssi": self.rssi })
    }
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SmsMessage {
    pub originating_address: Option<String>,
    pub message_body: Option<String>,
}

impl SmsMessage {
    pub(crate) fn to_json(&self) -> JsonValue {
        json!({
            "originatingAddress": self.originating_address,
            "messageBody": self.message_body,
        })
    }
}

/// A telecom phone account. Addresses are URIs such as `tel:+15551234`.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhoneAccount {
    pub address: String,
    pub subscription_address: String,
    pub label: String,
    pub short_description: String,
}

impl PhoneAccount {
    pub(crate) fn to_json(&self) -> JsonValue {
        json!({
            "Address": safe_uri_string(&self.address),
            "SubscriptionAddress": safe_uri_string(&self.subscription_address),
            "Label": self.label,
            "ShortDescription": self.short_description,
        })
    }
}

/// Masks the scheme-specific part of personal URIs.
///
/// `tel:+1-555-0100` becomes `tel:xx-xxx-xxxx`; separators `-`, `@` and `.`
/// survive so the shape stays recognizable. Other schemes pass through.
fn safe_uri_string(uri: &str) -> String {
    const MASKED_SCHEMES: [&str; 6] = ["tel", "sip", "sms", "smsto", "mailto", "nfc"];

    let Some((scheme, ssp)) = uri.split_once(':') else {
        return uri.to_string();
    };
    if !MASKED_SCHEMES.iter().any(|s| s.eq_ignore_ascii_case(scheme)) {
        return uri.to_string();
    }

    let mut out = String::with_capacity(uri.len());
    out.push_str(scheme);
    out.push(':');
    out.extend(
        ssp.chars()
            .map(|c| if matches!(c, '-' | '@' | '.') { c } else { 'x' }),
    );
    out
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhoneAccountHandle {
    pub id: String,
    /// Flattened component name, `package/class`.
    pub component_name: String,
}

impl PhoneAccountHandle {
    pub(crate) fn to_json(&self) -> JsonValue {
        json!({
            "id": self.id,
            "ComponentName": self.component_name,
        })
    }
}

/// Identity of one active subscription.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionInfo {
    pub subscription_id: i32,
    pub icc_id: Option<String>,
    pub sim_slot_index: i32,
    pub display_name: Option<String>,
    pub name_source: i32,
    pub icon_tint: i32,
    pub number: Option<String>,
    pub data_roaming: i32,
    pub mcc: i32,
    pub mnc: i32,
}

impl SubscriptionInfo {
    pub(crate) fn to_json(&self) -> JsonValue {
        json!({
            "subscriptionId": self.subscription_id,
            "iccId": self.icc_id,
            "simSlotIndex": self.sim_slot_index,
            "displayName": self.display_name,
            "nameSource": self.name_source,
            "iconTint": self.icon_tint,
            "number": self.number,
            "dataRoaming": self.data_roaming,
            "mcc": self.mcc,
            "mnc": self.mnc,
        })
    }
}

/// Snapshot of a subscription's service state.
///
/// Registration states and network types are raw platform codes; the wire
/// form carries their names.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceStateInfo {
    pub voice_reg_state: i32,
    pub data_reg_state: i32,
    pub operator_name: Option<String>,
    pub operator_numeric: Option<String>,
    pub is_roaming: bool,
    pub is_manual_selection: bool,
    pub voice_network_type: i32,
    pub data_network_type: i32,
}

impl ServiceStateInfo {
    pub(crate) fn to_json(&self) -> JsonValue {
        let reg = |code: i32| RegState::from_code(code).map_or(UNKNOWN, RegState::as_str);
        json!({
            "VoiceRegState": reg(self.voice_reg_state),
            "DataRegState": reg(self.data_reg_state),
            "OperatorName": self.operator_name,
            "OperatorId": self.operator_numeric,
            "Roaming": self.is_roaming,
            "isManualNwSelection": self.is_manual_selection,
            "VoiceRat": network_type_name(self.voice_network_type),
            "DataRat": network_type_name(self.data_network_type),
        })
    }
}

/// Modem power statistics.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModemActivityInfo {
    pub timestamp: i64,
    pub sleep_time_ms: i32,
    pub idle_time_ms: i32,
    /// Transmit time per power level.
    pub tx_time_ms: Vec<i32>,
    pub rx_time_ms: i32,
    pub energy_used: i32,
}

impl ModemActivityInfo {
    pub(crate) fn to_json(&self) -> JsonValue {
        json!({
            "Timestamp": self.timestamp,
            "SleepTimeMs": self.sleep_time_ms,
            "IdleTimeMs": self.idle_time_ms,
            "TxTimeMs": self.tx_time_ms,
            "RxTimeMs": self.rx_time_ms,
            "EnergyUsed": self.energy_used,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_route_lists_every_set_bit() {
        let state = AudioState {
            is_muted: true,
            route: ROUTE_EARPIECE | ROUTE_SPEAKER,
        };
        assert_eq!(
            state.to_json(),
            json!({ "isMuted": true, "AudioRoute": "EARPIECE, SPEAKER" })
        );
        assert_eq!(AudioState::default().route_string(), "");
    }

    #[test]
    fn test_cell_location_other_is_empty_object() {
        assert_eq!(CellLocation::Other.to_json(), json!({}));
        assert_eq!(
            CellLocation::Gsm { lac: 12, cid: 34 }.to_json(),
            json!({ "lac": 12, "cid": 34 })
        );
    }

    #[test]
    fn test_phone_account_masks_tel_addresses() {
        assert_eq!(safe_uri_string("tel:+1-555-0100"), "tel:xx-xxx-xxxx");
        assert_eq!(safe_uri_string("SIP:alice@example.org"), "SIP:xxxxx@xxxxxxx.xxx");
        assert_eq!(safe_uri_string("https://example.org"), "https://example.org");
        assert_eq!(safe_uri_string("no-scheme"), "no-scheme");
    }

    #[test]
    fn test_service_state_uses_wire_names() {
        let info = ServiceStateInfo {
            voice_reg_state: 0,
            data_reg_state: 17,
            operator_name: Some("Carrier".to_string()),
            voice_network_type: 13,
            data_network_type: 18,
            ..ServiceStateInfo::default()
        };
        let out = info.to_json();
        assert_eq!(out["VoiceRegState"], json!("IN_SERVICE"));
        assert_eq!(out["DataRegState"], json!("UNKNOWN"));
        assert_eq!(out["VoiceRat"], json!("lte"));
        assert_eq!(out["DataRat"], json!("iwlan"));
        assert_eq!(out["OperatorId"], JsonValue::Null);
    }
}
