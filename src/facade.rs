//! Phone facade: the boolean-result operations behind the RPC methods.
//!
//! Every tracking operation reports success as `bool`. Failures (unknown
//! subscription, platform rejection, control queue trouble) are logged and
//! turned into `false`; nothing here panics on bad input.

use std::sync::Arc;

use crate::codes::{CallState, DataState, UNKNOWN};
use crate::config::TelemuxConfig;
use crate::error::{FacadeError, TelemuxError, TelemuxResult};
use crate::event::{event_queue, EventQueue};
use crate::listener::{
    CallLevel, InitializeReport, ListenerKind, RegistrationState, ShutdownReport, SubscriptionId,
    SubscriptionRegistry,
};
use crate::platform::{ListenerService, SubscriptionEnumerator, SubscriptionPurpose, TelephonyQueries};
use crate::records::Record;
use crate::value::Value;

/// Telephony facade over the listener registry and platform queries.
pub struct PhoneFacade {
    registry: Arc<SubscriptionRegistry>,
    enumerator: Arc<dyn SubscriptionEnumerator>,
    queries: Arc<dyn TelephonyQueries>,
}

impl std::fmt::Debug for PhoneFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhoneFacade")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl PhoneFacade {
    /// Creates the facade and builds one bundle per active subscription.
    pub fn new(
        registry: Arc<SubscriptionRegistry>,
        enumerator: Arc<dyn SubscriptionEnumerator>,
        queries: Arc<dyn TelephonyQueries>,
    ) -> Result<Self, FacadeError> {
        let facade = Self {
            registry,
            enumerator,
            queries,
        };
        facade.refresh_subscriptions()?;
        Ok(facade)
    }

    /// Wires an event queue, a registry and the facade from one config.
    pub fn from_config(
        cfg: &TelemuxConfig,
        service: Arc<dyn ListenerService>,
        enumerator: Arc<dyn SubscriptionEnumerator>,
        queries: Arc<dyn TelephonyQueries>,
    ) -> TelemuxResult<(Self, EventQueue)> {
        let (sink, queue) = event_queue(&cfg.events);
        let registry = SubscriptionRegistry::new(cfg.registry.clone(), service, sink)
            .map_err(|e| TelemuxError::internal(format!("failed to spawn listener control thread: {e}")))?;
        let facade = Self::new(Arc::new(registry), enumerator, queries)?;
        Ok((facade, queue))
    }

    /// The underlying registry.
    #[must_use]
    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    /// Starts tracking `kind` on `sub`.
    pub fn start_tracking(&self, kind: ListenerKind, sub: SubscriptionId) -> bool {
        match self.registry.start(sub, kind) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("start tracking {kind} on subscription {sub} failed: {e}");
                false
            }
        }
    }

    /// Stops tracking `kind` on `sub`.
    pub fn stop_tracking(&self, kind: ListenerKind, sub: SubscriptionId) -> bool {
        match self.registry.stop(sub, kind) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("stop tracking {kind} on subscription {sub} failed: {e}");
                false
            }
        }
    }

    /// Starts tracking `kind` on the default subscription for its purpose.
    pub fn start_tracking_default(&self, kind: ListenerKind) -> bool {
        self.default_for(kind)
            .is_some_and(|sub| self.start_tracking(kind, sub))
    }

    /// Stops tracking `kind` on the default subscription for its purpose.
    pub fn stop_tracking_default(&self, kind: ListenerKind) -> bool {
        self.default_for(kind)
            .is_some_and(|sub| self.stop_tracking(kind, sub))
    }

    /// Turns precise call-state listening for one level on or off.
    ///
    /// `level` is `Foreground`, `Ringing` or `Background`, matched without
    /// regard to case. The change applies from the next CallState start.
    pub fn adjust_call_state_listen_level(&self, level: &str, listen: bool, sub: SubscriptionId) -> bool {
        let level: CallLevel = match level.parse() {
            Ok(level) => level,
            Err(e) => {
                log::warn!("adjust listen level on subscription {sub}: {e}");
                return false;
            }
        };

        match self.registry.adjust_filter(sub, level, listen) {
            Ok(_) => true,
            Err(e) => {
                log::warn!("adjust {level} listen level on subscription {sub} failed: {e}");
                false
            }
        }
    }

    /// Like [`Self::adjust_call_state_listen_level`] on the default voice subscription.
    pub fn adjust_call_state_listen_level_default(&self, level: &str, listen: bool) -> bool {
        self.default_for(ListenerKind::CallState)
            .is_some_and(|sub| self.adjust_call_state_listen_level(level, listen, sub))
    }

    /// `Some(true)` when `(sub, kind)` is registered; `None` for an unknown
    /// subscription.
    #[must_use]
    pub fn is_tracking(&self, kind: ListenerKind, sub: SubscriptionId) -> Option<bool> {
        self.registry
            .state(sub, kind)
            .ok()
            .map(|state| state == RegistrationState::Registered)
    }

    /// Rebuilds the bundle map from the currently active subscriptions.
    pub fn refresh_subscriptions(&self) -> Result<InitializeReport, FacadeError> {
        let ids = self.enumerator.active_subscriptions();
        Ok(self.registry.initialize(ids)?)
    }

    /// Service state of `sub`, encoded as a record value.
    pub fn service_state(&self, sub: SubscriptionId) -> Result<Value, FacadeError> {
        self.queries
            .service_state(sub)
            .map(|info| Value::from(Record::from(info)))
            .ok_or(FacadeError::Unsupported {
                capability: "service_state",
            })
    }

    /// Service state of the default subscription.
    pub fn service_state_default(&self) -> Result<Value, FacadeError> {
        let sub = self.default_subscription(SubscriptionPurpose::General)?;
        self.service_state(sub)
    }

    /// Subscription details of `sub`, encoded as a record value.
    pub fn subscription_info(&self, sub: SubscriptionId) -> Result<Value, FacadeError> {
        self.queries
            .subscription_info(sub)
            .map(|info| Value::from(Record::from(info)))
            .ok_or(FacadeError::Unsupported {
                capability: "subscription_info",
            })
    }

    /// Call state name of `sub`: `IDLE`, `RINGING`, `OFFHOOK` or `UNKNOWN`.
    #[must_use]
    pub fn call_state(&self, sub: SubscriptionId) -> String {
        let Some(code) = self.queries.call_state(sub) else {
            return UNKNOWN.to_string();
        };
        CallState::from_code(code).map_or_else(
            || {
                log::error!("unexpected call state {code} on subscription {sub}");
                UNKNOWN.to_string()
            },
            |state| state.as_str().to_string(),
        )
    }

    /// Call state name of the default subscription.
    #[must_use]
    pub fn call_state_default(&self) -> String {
        self.enumerator
            .default_subscription(SubscriptionPurpose::General)
            .map_or_else(|| UNKNOWN.to_string(), |sub| self.call_state(sub))
    }

    /// Data connection state name of `sub`.
    #[must_use]
    pub fn data_connection_state(&self, sub: SubscriptionId) -> String {
        self.queries
            .data_state(sub)
            .and_then(DataState::from_code)
            .map_or(UNKNOWN, DataState::as_str)
            .to_string()
    }

    /// Data connection state name of the default data subscription.
    #[must_use]
    pub fn data_connection_state_default(&self) -> String {
        self.enumerator
            .default_subscription(SubscriptionPurpose::Data)
            .map_or_else(|| UNKNOWN.to_string(), |sub| self.data_connection_state(sub))
    }

    /// Subscriptions the registry currently holds bundles for.
    #[must_use]
    pub fn subscription_ids(&self) -> Vec<SubscriptionId> {
        self.registry.subscriptions().unwrap_or_else(|e| {
            log::warn!("listing subscriptions failed: {e}");
            Vec::new()
        })
    }

    /// The platform default subscription for `purpose`.
    pub fn default_subscription(&self, purpose: SubscriptionPurpose) -> Result<SubscriptionId, FacadeError> {
        self.enumerator
            .default_subscription(purpose)
            .ok_or(FacadeError::NoDefaultSubscription { purpose })
    }

    /// Stops every listener on every subscription.
    pub fn shutdown(&self) -> ShutdownReport {
        match self.registry.shutdown_all() {
            Ok(report) => {
                for failure in &report.failures {
                    log::warn!("shutdown: {failure}");
                }
                log::info!(
                    "phone facade shut down; stopped {} listener(s)",
                    report.stopped
                );
                report
            }
            Err(e) => {
                log::error!("phone facade shutdown failed: {e}");
                ShutdownReport {
                    stopped: 0,
                    failures: vec![e],
                }
            }
        }
    }

    fn default_for(&self, kind: ListenerKind) -> Option<SubscriptionId> {
        let sub = self.enumerator.default_subscription(kind.purpose());
        if sub.is_none() {
            log::warn!("no default {:?} subscription for {kind}", kind.purpose());
        }
        sub
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::error::PlatformError;
    use crate::event::EventQueueConfig;
    use crate::listener::{ListenMask, RegistryConfig};
    use crate::platform::{NoQueries, NotificationCallback};
    use crate::records::ServiceStateInfo;

    struct Subs {
        ids: Vec<i32>,
        voice: Option<i32>,
        data: Option<i32>,
    }

    impl SubscriptionEnumerator for Subs {
        fn active_subscriptions(&self) -> Vec<SubscriptionId> {
            self.ids.iter().copied().map(SubscriptionId::new).collect()
        }

        fn default_subscription(&self, purpose: SubscriptionPurpose) -> Option<SubscriptionId> {
            match purpose {
                SubscriptionPurpose::Voice => self.voice,
                SubscriptionPurpose::Data => self.data,
                SubscriptionPurpose::General => self.ids.first().copied(),
            }
            .map(SubscriptionId::new)
        }
    }

    #[derive(Default)]
    struct Service {
        registered: Mutex<Vec<(SubscriptionId, ListenerKind)>>,
    }

    impl ListenerService for Service {
        fn register(
            &self,
            sub: SubscriptionId,
            kind: ListenerKind,
            _mask: ListenMask,
            _callback: NotificationCallback,
        ) -> Result<(), PlatformError> {
            self.registered.lock().unwrap().push((sub, kind));
            Ok(())
        }

        fn unregister(&self, _sub: SubscriptionId, _kind: ListenerKind) -> Result<(), PlatformError> {
            Ok(())
        }
    }

    struct Queries;

    impl TelephonyQueries for Queries {
        fn service_state(&self, _sub: SubscriptionId) -> Option<ServiceStateInfo> {
            Some(ServiceStateInfo::default())
        }

        fn call_state(&self, sub: SubscriptionId) -> Option<i32> {
            Some(sub.get())
        }

        fn data_state(&self, _sub: SubscriptionId) -> Option<i32> {
            Some(2)
        }
    }

    fn facade(subs: Subs, queries: Arc<dyn TelephonyQueries>) -> (PhoneFacade, Arc<Service>) {
        let service = Arc::new(Service::default());
        let (sink, _queue) = crate::event::event_queue(&EventQueueConfig::default());
        let registry = SubscriptionRegistry::new(
            RegistryConfig::default(),
            Arc::clone(&service) as Arc<dyn ListenerService>,
            sink,
        )
        .unwrap();
        let facade = PhoneFacade::new(Arc::new(registry), Arc::new(subs), queries).unwrap();
        (facade, service)
    }

    fn two_subs() -> Subs {
        Subs {
            ids: vec![1, 2],
            voice: Some(2),
            data: None,
        }
    }

    #[test]
    fn test_new_initializes_active_subscriptions() {
        let (f, _) = facade(two_subs(), Arc::new(NoQueries));
        assert_eq!(f.subscription_ids(), vec![SubscriptionId::new(1), SubscriptionId::new(2)]);
        assert_eq!(f.is_tracking(ListenerKind::CallState, SubscriptionId::new(1)), Some(false));
        assert_eq!(f.is_tracking(ListenerKind::CallState, SubscriptionId::new(9)), None);
    }

    #[test]
    fn test_unknown_subscription_maps_to_false() {
        let (f, _) = facade(two_subs(), Arc::new(NoQueries));
        assert!(!f.start_tracking(ListenerKind::ServiceState, SubscriptionId::new(42)));
        assert!(!f.stop_tracking(ListenerKind::ServiceState, SubscriptionId::new(42)));
        assert!(!f.adjust_call_state_listen_level("Ringing", true, SubscriptionId::new(42)));
    }

    #[test]
    fn test_default_resolution_by_purpose() {
        let (f, service) = facade(two_subs(), Arc::new(NoQueries));
        assert!(f.start_tracking_default(ListenerKind::CallState));
        assert_eq!(
            service.registered.lock().unwrap().clone(),
            vec![(SubscriptionId::new(2), ListenerKind::CallState)]
        );
        // No default data subscription.
        assert!(!f.start_tracking_default(ListenerKind::DataConnectionState));
        assert!(f.stop_tracking_default(ListenerKind::CallState));
    }

    #[test]
    fn test_adjust_listen_level() {
        let (f, _) = facade(two_subs(), Arc::new(NoQueries));
        let sub = SubscriptionId::new(1);
        assert!(f.adjust_call_state_listen_level("ringing", true, sub));
        assert!(f.adjust_call_state_listen_level("FOREGROUND", false, sub));
        assert!(!f.adjust_call_state_listen_level("dialing", true, sub));

        let filter = f.registry().filter(sub).unwrap();
        assert!(filter.ringing);
        assert!(!filter.foreground);
        assert!(!filter.background);

        assert!(f.adjust_call_state_listen_level_default("Background", true));
        assert!(f.registry().filter(SubscriptionId::new(2)).unwrap().background);
    }

    #[test]
    fn test_queries_without_capability() {
        let (f, _) = facade(two_subs(), Arc::new(NoQueries));
        let err = f.service_state(SubscriptionId::new(1)).unwrap_err();
        assert_eq!(
            err,
            FacadeError::Unsupported {
                capability: "service_state"
            }
        );
        assert_eq!(f.call_state(SubscriptionId::new(1)), "UNKNOWN");
        assert_eq!(f.data_connection_state_default(), "UNKNOWN");
    }

    #[test]
    fn test_queries_with_capability() {
        let (f, _) = facade(two_subs(), Arc::new(Queries));
        assert_eq!(f.call_state(SubscriptionId::new(1)), "RINGING");
        assert_eq!(f.call_state(SubscriptionId::new(7)), "UNKNOWN");
        assert_eq!(f.data_connection_state(SubscriptionId::new(1)), "CONNECTED");

        let state = crate::encoder::encode(&f.service_state_default().unwrap());
        assert_eq!(state["VoiceRegState"], "IN_SERVICE");
    }

    #[test]
    fn test_no_default_subscription_error() {
        let subs = Subs {
            ids: Vec::new(),
            voice: None,
            data: None,
        };
        let (f, _) = facade(subs, Arc::new(Queries));
        assert_eq!(
            f.service_state_default().unwrap_err(),
            FacadeError::NoDefaultSubscription {
                purpose: SubscriptionPurpose::General
            }
        );
        assert_eq!(f.call_state_default(), "UNKNOWN");
    }

    #[test]
    fn test_shutdown_reports_stopped() {
        let (f, _) = facade(two_subs(), Arc::new(NoQueries));
        assert!(f.start_tracking(ListenerKind::ServiceState, SubscriptionId::new(1)));
        assert!(f.start_tracking(ListenerKind::VoiceMailState, SubscriptionId::new(2)));
        let report = f.shutdown();
        assert_eq!(report.stopped, 2);
        assert!(report.is_clean());
        assert_eq!(f.shutdown().stopped, 0);
    }
}
