//! Platform integer codes and their stable wire names.
//!
//! The platform reports states as raw integers. Each table here classifies a
//! code into a closed enum; a code outside the table yields `None`, which the
//! listener bindings treat as an unclassifiable notification.

macro_rules! code_table {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident = $code:expr => $wire:literal),* $(,)? }
    ) => {
        $(#[$meta])*
        #[allow(missing_docs)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),*
        }

        impl $name {
            /// Classifies a raw platform code.
            #[must_use]
            pub const fn from_code(code: i32) -> Option<Self> {
                match code {
                    $(c if c == $code => Some(Self::$variant),)*
                    _ => None,
                }
            }

            /// The raw platform code.
            #[must_use]
            pub const fn code(self) -> i32 {
                match self {
                    $(Self::$variant => $code),*
                }
            }

            /// Stable wire name.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire),*
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

code_table! {
    /// Coarse call state of a subscription.
    CallState {
        Idle = 0 => "IDLE",
        Ringing = 1 => "RINGING",
        Offhook = 2 => "OFFHOOK",
    }
}

code_table! {
    /// Precise state of one call level. `-1` (not valid) is not in the table.
    PreciseCallState {
        Idle = 0 => "IDLE",
        Active = 1 => "ACTIVE",
        Holding = 2 => "HOLDING",
        Dialing = 3 => "DIALING",
        Alerting = 4 => "ALERTING",
        Incoming = 5 => "INCOMING",
        Waiting = 6 => "WAITING",
        Disconnected = 7 => "DISCONNECTED",
        Disconnecting = 8 => "DISCONNECTING",
    }
}

code_table! {
    /// Data connection state.
    DataState {
        Disconnected = 0 => "DISCONNECTED",
        Connecting = 1 => "CONNECTING",
        Connected = 2 => "CONNECTED",
        Suspended = 3 => "SUSPENDED",
    }
}

code_table! {
    /// Data connection power state from real-time info.
    DataPowerState {
        Low = 1 => "LOW",
        Medium = 2 => "MEDIUM",
        High = 3 => "HIGH",
        Unknown = i32::MAX => "UNKNOWN",
    }
}

code_table! {
    /// Voice/data registration state.
    RegState {
        InService = 0 => "IN_SERVICE",
        OutOfService = 1 => "OUT_OF_SERVICE",
        EmergencyOnly = 2 => "EMERGENCY_ONLY",
        PowerOff = 3 => "POWER_OFF",
    }
}

/// Wire name used when a state query has no answer.
pub const UNKNOWN: &str = "UNKNOWN";

const NETWORK_TYPES: [&str; 19] = [
    "unknown", "gprs", "edge", "umts", "cdma", "evdo_0", "evdo_a", "1xrtt", "hsdpa", "hsupa",
    "hspa", "iden", "evdo_b", "lte", "ehrpd", "hspap", "gsm", "td_scdma", "iwlan",
];

/// Radio access technology name for a network type code.
///
/// Codes outside the table map to `"unknown"` rather than failing: network
/// type is descriptive, never used to classify a notification.
#[must_use]
pub fn network_type_name(code: i32) -> &'static str {
    usize::try_from(code)
        .ok()
        .and_then(|i| NETWORK_TYPES.get(i).copied())
        .unwrap_or(NETWORK_TYPES[0])
}
