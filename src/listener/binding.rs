//! Per-(subscription, kind) listener bindings.
//!
//! A [`ListenerBinding`] is the registry-side record of one listener. Each
//! registration hands the platform a fresh [`NotificationHandler`] that holds
//! a snapshot of the binding's filter and a revocation flag. Stopping the
//! binding flips the flag, so anything the platform still delivers on the old
//! registration is discarded.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::codes::{network_type_name, CallState, DataPowerState, DataState, PreciseCallState};
use crate::event::{names, EventEnvelope, EventSink};
use crate::platform::NotificationCallback;
use crate::value::Value;

use super::{CallStateFilter, ListenerKind, RawNotification, RegistrationState, SubscriptionId};

/// Registry-side state of one listener.
#[derive(Debug)]
pub struct ListenerBinding {
    subscription_id: SubscriptionId,
    kind: ListenerKind,
    state: RegistrationState,
    // Pending filter; registered handlers keep their own copy.
    filter: CallStateFilter,
    active: Option<Arc<AtomicBool>>,
}

impl ListenerBinding {
    pub(crate) fn new(subscription_id: SubscriptionId, kind: ListenerKind) -> Self {
        Self {
            subscription_id,
            kind,
            state: RegistrationState::Unregistered,
            filter: CallStateFilter::default(),
            active: None,
        }
    }

    /// Subscription this binding belongs to.
    #[must_use]
    pub const fn subscription_id(&self) -> SubscriptionId {
        self.subscription_id
    }

    /// Listener kind.
    #[must_use]
    pub const fn kind(&self) -> ListenerKind {
        self.kind
    }

    /// Current registration state.
    #[must_use]
    pub const fn state(&self) -> RegistrationState {
        self.state
    }

    /// True while a platform registration is live.
    #[must_use]
    pub const fn is_registered(&self) -> bool {
        matches!(self.state, RegistrationState::Registered)
    }

    /// The filter the next registration will use.
    #[must_use]
    pub const fn filter(&self) -> CallStateFilter {
        self.filter
    }

    pub(crate) fn set_filter(&mut self, filter: CallStateFilter) {
        self.filter = filter;
    }

    /// Builds the handler for a new registration from the current filter.
    pub(crate) fn handler(&self, sink: EventSink) -> NotificationHandler {
        NotificationHandler::new(self.subscription_id, self.kind, self.filter, sink)
    }

    pub(crate) fn mark_registered(&mut self, active: Arc<AtomicBool>) {
        self.state = RegistrationState::Registered;
        self.active = Some(active);
    }

    /// Revokes the current handler and returns to `Unregistered`.
    pub(crate) fn mark_unregistered(&mut self) {
        if let Some(active) = self.active.take() {
            active.store(false, Ordering::Release);
        }
        self.state = RegistrationState::Unregistered;
    }
}

/// Converts raw platform notifications for one registration into envelopes.
#[derive(Debug)]
pub struct NotificationHandler {
    subscription_id: SubscriptionId,
    kind: ListenerKind,
    filter: CallStateFilter,
    active: Arc<AtomicBool>,
    sink: EventSink,
}

impl NotificationHandler {
    /// Creates an active handler.
    #[must_use]
    pub fn new(
        subscription_id: SubscriptionId,
        kind: ListenerKind,
        filter: CallStateFilter,
        sink: EventSink,
    ) -> Self {
        Self {
            subscription_id,
            kind,
            filter,
            active: Arc::new(AtomicBool::new(true)),
            sink,
        }
    }

    /// False once the owning binding was stopped.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub(crate) fn active_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.active)
    }

    /// Classifies, filters and wraps one notification.
    ///
    /// Returns no envelope when the notification belongs to another kind, is
    /// filtered out, or carries a code outside the known tables.
    #[must_use]
    pub fn on_notify(&self, raw: RawNotification) -> Vec<EventEnvelope> {
        if raw.kind() != self.kind {
            log::debug!(
                "{} listener on subscription {} ignoring {:?}",
                self.kind,
                self.subscription_id,
                raw
            );
            return Vec::new();
        }

        match self.convert(raw) {
            Some((name, data)) => vec![EventEnvelope::at(name, data, self.sink.stamp())],
            None => Vec::new(),
        }
    }

    /// Delivers one notification into the event sink.
    ///
    /// Revoked handlers drop everything. A panic during conversion is logged
    /// and the notification is dropped.
    pub fn deliver(&self, raw: RawNotification) {
        if !self.is_active() {
            log::debug!(
                "dropping late notification for stopped {} listener on subscription {}",
                self.kind,
                self.subscription_id
            );
            return;
        }

        let envelopes = match catch_unwind(AssertUnwindSafe(|| self.on_notify(raw))) {
            Ok(envelopes) => envelopes,
            Err(_) => {
                log::error!(
                    "{} listener on subscription {} panicked; notification dropped",
                    self.kind,
                    self.subscription_id
                );
                return;
            }
        };

        for envelope in envelopes {
            // Stop may have landed while converting.
            if !self.is_active() {
                return;
            }
            self.sink.push(envelope);
        }
    }

    /// Wraps the handler into the callback handed to the platform.
    #[must_use]
    pub fn into_callback(self) -> NotificationCallback {
        let handler = Arc::new(self);
        Arc::new(move |raw| handler.deliver(raw))
    }

    fn convert(&self, raw: RawNotification) -> Option<(&'static str, Value)> {
        let sub = Value::Int(self.subscription_id.get());

        match raw {
            RawNotification::ServiceState(info) => {
                let mut json = info.to_json();
                if let JsonValue::Object(map) = &mut json {
                    map.insert(
                        "subscriptionId".to_string(),
                        JsonValue::from(self.subscription_id.get()),
                    );
                }
                Some((names::SERVICE_STATE_CHANGED, Value::Json(json)))
            }
            RawNotification::CallState {
                state,
                incoming_number,
            } => {
                let state = self.classify(CallState::from_code(state), "call state", state)?;
                Some((
                    names::CALL_STATE_CHANGED,
                    Value::map(vec![
                        ("subscriptionId", sub),
                        ("State", Value::from(state.as_str())),
                        ("incomingNumber", Value::from(incoming_number)),
                    ]),
                ))
            }
            RawNotification::PreciseCallState { level, state } => {
                if !self.filter.allows(level) {
                    log::trace!(
                        "precise {} call state filtered on subscription {}",
                        level,
                        self.subscription_id
                    );
                    return None;
                }
                let precise =
                    self.classify(PreciseCallState::from_code(state), "precise call state", state)?;
                Some((
                    names::PRECISE_STATE_CHANGED,
                    Value::map(vec![
                        ("subscriptionId", sub),
                        ("Type", Value::from(level.as_str())),
                        ("State", Value::from(precise.as_str())),
                        ("PreciseCallStateCode", Value::Int(state)),
                    ]),
                ))
            }
            RawNotification::DataConnectionState {
                state,
                network_type,
            } => {
                let state = self.classify(DataState::from_code(state), "data state", state)?;
                Some((
                    names::DATA_CONNECTION_STATE_CHANGED,
                    Value::map(vec![
                        ("subscriptionId", sub),
                        ("DataConnectionState", Value::from(state.as_str())),
                        ("DataNetworkType", Value::from(network_type_name(network_type))),
                    ]),
                ))
            }
            RawNotification::DataConnectionRealtimeInfo {
                time_nanos,
                power_state,
            } => {
                let power = self.classify(
                    DataPowerState::from_code(power_state),
                    "data power state",
                    power_state,
                )?;
                Some((
                    names::DATA_CONNECTION_REAL_TIME_INFO_CHANGED,
                    Value::map(vec![
                        ("subscriptionId", sub),
                        ("Time", Value::Long(time_nanos)),
                        ("DataConnectionPowerState", Value::from(power.as_str())),
                    ]),
                ))
            }
            RawNotification::MessageWaitingIndicator { waiting } => Some((
                names::MESSAGE_WAITING_INDICATOR_CHANGED,
                Value::map(vec![
                    ("subscriptionId", sub),
                    ("MessageWaitingIndicator", Value::Bool(waiting)),
                ]),
            )),
        }
    }

    fn classify<T>(&self, classified: Option<T>, what: &str, code: i32) -> Option<T> {
        if classified.is_none() {
            log::debug!(
                "dropping unclassifiable {what} {code} on subscription {}",
                self.subscription_id
            );
        }
        classified
    }
}
