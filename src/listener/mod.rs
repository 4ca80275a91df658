//! Subscription-scoped listener lifecycle.
//!
//! Each subscription owns one binding per [`ListenerKind`]. Bindings are
//! started and stopped through the [`SubscriptionRegistry`], which runs every
//! platform (un)registration on a single control thread.

pub mod binding;
pub mod registry;

use std::fmt;
use std::ops::BitOr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::platform::SubscriptionPurpose;
use crate::records::ServiceStateInfo;

pub use binding::{ListenerBinding, NotificationHandler};
pub use registry::{InitializeReport, RegistryConfig, ShutdownReport, SubscriptionRegistry};

/// Identifier of one radio subscription (SIM profile).
///
/// Ids come from the platform: they are not contiguous and may be zero or
/// negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(i32);

impl SubscriptionId {
    /// Wrap a platform subscription id.
    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    /// The raw platform id.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl From<i32> for SubscriptionId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Platform listen flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ListenMask(u32);

#[allow(missing_docs)]
impl ListenMask {
    /// Stop listening.
    pub const NONE: Self = Self(0);
    pub const SERVICE_STATE: Self = Self(0x0000_0001);
    pub const MESSAGE_WAITING_INDICATOR: Self = Self(0x0000_0004);
    pub const CALL_STATE: Self = Self(0x0000_0020);
    pub const DATA_CONNECTION_STATE: Self = Self(0x0000_0040);
    pub const PRECISE_CALL_STATE: Self = Self(0x0000_0800);
    pub const DATA_CONNECTION_REAL_TIME_INFO: Self = Self(0x0000_2000);

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// True when every flag in `other` is set in `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for ListenMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// The five independently startable listener kinds.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ListenerKind {
    ServiceState,
    CallState,
    DataConnectionState,
    DataConnectionRealtimeInfo,
    VoiceMailState,
}

impl ListenerKind {
    /// Every kind, in bundle order.
    pub const ALL: [Self; 5] = [
        Self::ServiceState,
        Self::CallState,
        Self::DataConnectionState,
        Self::DataConnectionRealtimeInfo,
        Self::VoiceMailState,
    ];

    /// The platform events this kind listens for.
    #[must_use]
    pub const fn event_mask(self) -> ListenMask {
        match self {
            Self::ServiceState => ListenMask::SERVICE_STATE,
            Self::CallState => ListenMask::CALL_STATE.union(ListenMask::PRECISE_CALL_STATE),
            Self::DataConnectionState => ListenMask::DATA_CONNECTION_STATE,
            Self::DataConnectionRealtimeInfo => ListenMask::DATA_CONNECTION_REAL_TIME_INFO,
            Self::VoiceMailState => ListenMask::MESSAGE_WAITING_INDICATOR,
        }
    }

    /// Which default subscription applies when the caller names none.
    #[must_use]
    pub const fn purpose(self) -> SubscriptionPurpose {
        match self {
            Self::CallState => SubscriptionPurpose::Voice,
            Self::DataConnectionState | Self::DataConnectionRealtimeInfo => SubscriptionPurpose::Data,
            Self::ServiceState | Self::VoiceMailState => SubscriptionPurpose::General,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ServiceState => "ServiceState",
            Self::CallState => "CallState",
            Self::DataConnectionState => "DataConnectionState",
            Self::DataConnectionRealtimeInfo => "DataConnectionRealtimeInfo",
            Self::VoiceMailState => "VoiceMailState",
        }
    }
}

impl fmt::Display for ListenerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Call level a precise call-state notification refers to.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallLevel {
    Foreground,
    Ringing,
    Background,
}

#[allow(missing_docs)]
impl CallLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Foreground => "Foreground",
            Self::Ringing => "Ringing",
            Self::Background => "Background",
        }
    }
}

impl fmt::Display for CallLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CallLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::Foreground, Self::Ringing, Self::Background]
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown call level: {s}"))
    }
}

/// Which precise call levels a CallState binding forwards.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallStateFilter {
    pub foreground: bool,
    pub ringing: bool,
    pub background: bool,
}

impl Default for CallStateFilter {
    fn default() -> Self {
        Self {
            foreground: true,
            ringing: false,
            background: false,
        }
    }
}

impl CallStateFilter {
    /// Filter that forwards every level.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            foreground: true,
            ringing: true,
            background: true,
        }
    }

    /// Filter that forwards no precise notifications.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            foreground: false,
            ringing: false,
            background: false,
        }
    }

    #[must_use]
    pub const fn allows(&self, level: CallLevel) -> bool {
        match level {
            CallLevel::Foreground => self.foreground,
            CallLevel::Ringing => self.ringing,
            CallLevel::Background => self.background,
        }
    }

    /// Returns a copy with one level switched on or off.
    #[must_use]
    pub fn with(mut self, level: CallLevel, listen: bool) -> Self {
        match level {
            CallLevel::Foreground => self.foreground = listen,
            CallLevel::Ringing => self.ringing = listen,
            CallLevel::Background => self.background = listen,
        }
        self
    }
}

/// Platform registration state of a binding.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegistrationState {
    Unregistered,
    Registered,
}

/// A notification as the platform delivers it, with raw integer codes.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawNotification {
    ServiceState(ServiceStateInfo),
    CallState {
        state: i32,
        incoming_number: Option<String>,
    },
    PreciseCallState {
        level: CallLevel,
        state: i32,
    },
    DataConnectionState {
        state: i32,
        network_type: i32,
    },
    DataConnectionRealtimeInfo {
        time_nanos: i64,
        power_state: i32,
    },
    MessageWaitingIndicator {
        waiting: bool,
    },
}

impl RawNotification {
    /// The listener kind that handles this notification.
    #[must_use]
    pub const fn kind(&self) -> ListenerKind {
        match self {
            Self::ServiceState(_) => ListenerKind::ServiceState,
            Self::CallState { .. } | Self::PreciseCallState { .. } => ListenerKind::CallState,
            Self::DataConnectionState { .. } => ListenerKind::DataConnectionState,
            Self::DataConnectionRealtimeInfo { .. } => ListenerKind::DataConnectionRealtimeInfo,
            Self::MessageWaitingIndicator { .. } => ListenerKind::VoiceMailState,
        }
    }
}
