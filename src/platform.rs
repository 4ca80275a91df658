//! Platform collaborator traits.
//!
//! The registry and facade never talk to radio hardware directly. Hosts
//! implement these traits over whatever telephony stack they run on; tests
//! implement them with recording fakes.

use std::sync::Arc;

use crate::error::PlatformError;
use crate::listener::{ListenMask, ListenerKind, RawNotification, SubscriptionId};
use crate::records::{ServiceStateInfo, SubscriptionInfo};

/// Callback the platform invokes for every notification on a registration.
///
/// May be called from any thread, concurrently with other callbacks.
pub type NotificationCallback = Arc<dyn Fn(RawNotification) + Send + Sync>;

/// What a default subscription is being resolved for.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionPurpose {
    General,
    Voice,
    Data,
}

/// Enumerates the active subscriptions of the device.
pub trait SubscriptionEnumerator: Send + Sync {
    /// Currently active subscription ids.
    fn active_subscriptions(&self) -> Vec<SubscriptionId>;

    /// The platform default subscription for a purpose, if one is set.
    fn default_subscription(&self, purpose: SubscriptionPurpose) -> Option<SubscriptionId>;
}

/// Platform listener registration service.
pub trait ListenerService: Send + Sync {
    /// Starts delivering notifications matching `mask` to `callback`.
    ///
    /// Registering the same `(sub, kind)` again replaces the previous
    /// callback on the platform side.
    fn register(
        &self,
        sub: SubscriptionId,
        kind: ListenerKind,
        mask: ListenMask,
        callback: NotificationCallback,
    ) -> Result<(), PlatformError>;

    /// Stops delivery for `(sub, kind)`; equivalent to listening with
    /// [`ListenMask::NONE`].
    fn unregister(&self, sub: SubscriptionId, kind: ListenerKind) -> Result<(), PlatformError>;
}

/// Optional point-in-time telephony queries.
///
/// Every method defaults to `None`, meaning the platform has no such
/// capability. Callers must not invent a value in that case.
pub trait TelephonyQueries: Send + Sync {
    /// Current service state snapshot.
    fn service_state(&self, _sub: SubscriptionId) -> Option<ServiceStateInfo> {
        None
    }

    /// Raw call state code.
    fn call_state(&self, _sub: SubscriptionId) -> Option<i32> {
        None
    }

    /// Raw data connection state code.
    fn data_state(&self, _sub: SubscriptionId) -> Option<i32> {
        None
    }

    /// Identity details of a subscription.
    fn subscription_info(&self, _sub: SubscriptionId) -> Option<SubscriptionInfo> {
        None
    }
}

/// Query provider with no capabilities.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoQueries;

impl TelephonyQueries for NoQueries {}
