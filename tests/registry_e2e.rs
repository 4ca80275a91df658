use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;

use telemux::{
    event_queue, names, CallLevel, CallStateFilter, EventQueue, EventQueueConfig, ListenMask,
    ListenerKind, ListenerService, NotificationCallback, PlatformError, RawNotification,
    RegistrationState, RegistryConfig, RegistryError, SubscriptionId, SubscriptionRegistry, Value,
};

/// Platform fake that records calls and keeps the live callback per listener.
#[derive(Default)]
struct RecordingService {
    callbacks: Mutex<HashMap<(SubscriptionId, ListenerKind), NotificationCallback>>,
    // Callbacks from earlier registrations, kept to simulate late delivery.
    retired: Mutex<Vec<((SubscriptionId, ListenerKind), NotificationCallback)>>,
    register_calls: AtomicUsize,
    unregister_calls: AtomicUsize,
    fail_unregister_for: Mutex<Vec<SubscriptionId>>,
    panic_register_for: Mutex<Vec<SubscriptionId>>,
    panic_unregister_for: Mutex<Vec<SubscriptionId>>,
}

impl RecordingService {
    fn notify(&self, sub: i32, kind: ListenerKind, raw: RawNotification) {
        let cb = self
            .callbacks
            .lock()
            .unwrap()
            .get(&(SubscriptionId::new(sub), kind))
            .cloned();
        if let Some(cb) = cb {
            cb(raw);
        }
    }

    fn notify_retired(&self, raw: RawNotification) {
        let retired: Vec<NotificationCallback> =
            self.retired.lock().unwrap().iter().map(|(_, cb)| Arc::clone(cb)).collect();
        for cb in retired {
            cb(raw.clone());
        }
    }

    fn is_listening(&self, sub: i32, kind: ListenerKind) -> bool {
        self.callbacks
            .lock()
            .unwrap()
            .contains_key(&(SubscriptionId::new(sub), kind))
    }
}

impl ListenerService for RecordingService {
    fn register(
        &self,
        sub: SubscriptionId,
        kind: ListenerKind,
        mask: ListenMask,
        callback: NotificationCallback,
    ) -> Result<(), PlatformError> {
        assert_eq!(mask, kind.event_mask());
        let explode = self.panic_register_for.lock().unwrap().contains(&sub);
        if explode {
            panic!("radio service died during register");
        }
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        self.callbacks.lock().unwrap().insert((sub, kind), callback);
        Ok(())
    }

    fn unregister(&self, sub: SubscriptionId, kind: ListenerKind) -> Result<(), PlatformError> {
        self.unregister_calls.fetch_add(1, Ordering::SeqCst);
        let explode = self.panic_unregister_for.lock().unwrap().contains(&sub);
        if explode {
            panic!("radio service died during unregister");
        }
        if let Some(cb) = self.callbacks.lock().unwrap().remove(&(sub, kind)) {
            self.retired.lock().unwrap().push(((sub, kind), cb));
        }
        if self.fail_unregister_for.lock().unwrap().contains(&sub) {
            return Err(PlatformError::new("binder transaction failed"));
        }
        Ok(())
    }
}

fn setup(ids: &[i32]) -> (Arc<SubscriptionRegistry>, Arc<RecordingService>, EventQueue) {
    let service = Arc::new(RecordingService::default());
    let (sink, queue) = event_queue(&EventQueueConfig::default());
    let registry = SubscriptionRegistry::new(
        RegistryConfig::default(),
        Arc::clone(&service) as Arc<dyn ListenerService>,
        sink,
    )
    .unwrap();
    registry
        .initialize(ids.iter().copied().map(SubscriptionId::new))
        .unwrap();
    (Arc::new(registry), service, queue)
}

fn sub(id: i32) -> SubscriptionId {
    SubscriptionId::new(id)
}

fn precise(level: CallLevel, state: i32) -> RawNotification {
    RawNotification::PreciseCallState { level, state }
}

#[test]
fn end_to_end_ringing_notification_reaches_queue() {
    let (registry, service, mut queue) = setup(&[1, 2]);
    registry
        .set_filter(sub(1), CallStateFilter::default().with(CallLevel::Ringing, true))
        .unwrap();
    registry.start(sub(1), ListenerKind::CallState).unwrap();

    service.notify(1, ListenerKind::CallState, precise(CallLevel::Ringing, 5));

    let events = queue.drain();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].name(), names::PRECISE_STATE_CHANGED);
    let json = events[0].to_json();
    assert_eq!(json["data"]["subscriptionId"], 1);
    assert_eq!(json["data"]["Type"], "Ringing");
    assert_eq!(json["data"]["State"], "INCOMING");

    for kind in ListenerKind::ALL {
        assert_eq!(registry.state(sub(2), kind).unwrap(), RegistrationState::Unregistered);
    }
    assert!(!service.is_listening(2, ListenerKind::CallState));
}

#[test]
fn ringing_only_filter_drops_foreground() {
    let (registry, service, mut queue) = setup(&[1]);
    let ringing_only = CallStateFilter::none().with(CallLevel::Ringing, true);
    registry.set_filter(sub(1), ringing_only).unwrap();
    registry.start(sub(1), ListenerKind::CallState).unwrap();

    service.notify(1, ListenerKind::CallState, precise(CallLevel::Foreground, 1));
    service.notify(1, ListenerKind::CallState, precise(CallLevel::Ringing, 5));

    let events = queue.drain();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].data().get("Type"), Some(&Value::from("Ringing")));
}

#[test]
fn repeated_start_registers_once() {
    let (registry, service, _queue) = setup(&[3]);
    for _ in 0..5 {
        registry.start(sub(3), ListenerKind::ServiceState).unwrap();
    }
    assert_eq!(service.register_calls.load(Ordering::SeqCst), 1);

    for _ in 0..3 {
        registry.stop(sub(3), ListenerKind::ServiceState).unwrap();
    }
    assert_eq!(service.unregister_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn concurrent_starts_produce_one_registration() {
    let (registry, service, _queue) = setup(&[1, 2]);
    let threads = 16;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|i| {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let target = if i % 2 == 0 { sub(1) } else { sub(2) };
                registry.start(target, ListenerKind::CallState).unwrap();
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(service.register_calls.load(Ordering::SeqCst), 2);
    assert!(service.is_listening(1, ListenerKind::CallState));
    assert!(service.is_listening(2, ListenerKind::CallState));
}

#[test]
fn unknown_subscription_is_rejected_without_state() {
    let (registry, service, _queue) = setup(&[1]);

    assert!(registry.start(sub(-5), ListenerKind::CallState).unwrap_err().is_lookup());
    assert!(registry.stop(sub(-5), ListenerKind::CallState).unwrap_err().is_lookup());
    assert!(registry
        .set_filter(sub(-5), CallStateFilter::all())
        .unwrap_err()
        .is_lookup());
    assert!(registry.state(sub(-5), ListenerKind::CallState).unwrap_err().is_lookup());

    assert_eq!(registry.subscriptions().unwrap(), vec![sub(1)]);
    assert_eq!(service.register_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn filter_change_applies_after_restart() {
    let (registry, service, mut queue) = setup(&[1]);
    registry.start(sub(1), ListenerKind::CallState).unwrap();

    // Registered with the default (foreground only) snapshot.
    registry.set_filter(sub(1), CallStateFilter::all()).unwrap();
    service.notify(1, ListenerKind::CallState, precise(CallLevel::Background, 2));
    assert!(queue.drain().is_empty());

    registry.stop(sub(1), ListenerKind::CallState).unwrap();
    registry.start(sub(1), ListenerKind::CallState).unwrap();
    service.notify(1, ListenerKind::CallState, precise(CallLevel::Background, 2));

    let events = queue.drain();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].data().get("State"), Some(&Value::from("HOLDING")));
}

#[test]
fn late_notifications_after_stop_are_dropped() {
    let (registry, service, mut queue) = setup(&[1]);
    registry.start(sub(1), ListenerKind::VoiceMailState).unwrap();
    registry.stop(sub(1), ListenerKind::VoiceMailState).unwrap();

    service.notify_retired(RawNotification::MessageWaitingIndicator { waiting: true });
    assert!(queue.drain().is_empty());

    // A fresh registration delivers again.
    registry.start(sub(1), ListenerKind::VoiceMailState).unwrap();
    service.notify(
        1,
        ListenerKind::VoiceMailState,
        RawNotification::MessageWaitingIndicator { waiting: true },
    );
    let events = queue.drain();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].name(), names::MESSAGE_WAITING_INDICATOR_CHANGED);
}

#[test]
fn reinitialize_force_stops_registered_bindings() {
    let (registry, service, _queue) = setup(&[1, 2]);
    registry.start(sub(1), ListenerKind::CallState).unwrap();
    registry.start(sub(2), ListenerKind::DataConnectionState).unwrap();

    let report = registry.initialize([sub(2), sub(3)]).unwrap();
    assert_eq!(report.subscriptions, 2);
    assert_eq!(report.force_stopped, 2);
    assert!(report.failures.is_empty());

    assert!(!service.is_listening(1, ListenerKind::CallState));
    assert!(!service.is_listening(2, ListenerKind::DataConnectionState));
    assert_eq!(registry.subscriptions().unwrap(), vec![sub(2), sub(3)]);
    assert_eq!(
        registry.state(sub(2), ListenerKind::DataConnectionState).unwrap(),
        RegistrationState::Unregistered
    );
    assert!(registry.start(sub(1), ListenerKind::CallState).unwrap_err().is_lookup());
}

#[test]
fn shutdown_continues_past_failures() {
    let (registry, service, _queue) = setup(&[1, 2, 3]);
    service.fail_unregister_for.lock().unwrap().push(sub(2));
    for id in [1, 2, 3] {
        registry.start(sub(id), ListenerKind::ServiceState).unwrap();
        registry.start(sub(id), ListenerKind::CallState).unwrap();
    }

    let report = registry.shutdown_all().unwrap();
    assert_eq!(report.stopped, 6);
    assert_eq!(report.failures.len(), 2);
    assert!(report.failures.iter().all(telemux::RegistryError::is_platform));
    assert_eq!(service.unregister_calls.load(Ordering::SeqCst), 6);

    // Failed unregistrations still count as stopped locally.
    for id in [1, 2, 3] {
        assert_eq!(
            registry.state(sub(id), ListenerKind::CallState).unwrap(),
            RegistrationState::Unregistered
        );
    }

    let again = registry.shutdown_all().unwrap();
    assert_eq!(again.stopped, 0);
}

#[test]
fn stop_reports_platform_failure_but_stops_locally() {
    let (registry, service, _queue) = setup(&[8]);
    service.fail_unregister_for.lock().unwrap().push(sub(8));
    registry.start(sub(8), ListenerKind::DataConnectionRealtimeInfo).unwrap();

    let err = registry
        .stop(sub(8), ListenerKind::DataConnectionRealtimeInfo)
        .unwrap_err();
    assert!(err.is_platform());
    assert_eq!(
        registry
            .state(sub(8), ListenerKind::DataConnectionRealtimeInfo)
            .unwrap(),
        RegistrationState::Unregistered
    );
}

#[test]
fn platform_thread_panic_leaves_other_bindings_working() {
    let (registry, service, mut queue) = setup(&[1]);
    registry.start(sub(1), ListenerKind::ServiceState).unwrap();
    registry.start(sub(1), ListenerKind::VoiceMailState).unwrap();

    let svc = Arc::clone(&service);
    let crashed = thread::spawn(move || {
        svc.notify(
            1,
            ListenerKind::ServiceState,
            RawNotification::ServiceState(telemux::records::ServiceStateInfo::default()),
        );
        panic!("platform thread died after delivery");
    })
    .join();
    assert!(crashed.is_err());

    service.notify(
        1,
        ListenerKind::VoiceMailState,
        RawNotification::MessageWaitingIndicator { waiting: false },
    );
    let got: Vec<String> = queue.drain().iter().map(|e| e.name().to_string()).collect();
    assert_eq!(
        got,
        vec![
            names::SERVICE_STATE_CHANGED.to_string(),
            names::MESSAGE_WAITING_INDICATOR_CHANGED.to_string()
        ]
    );
    assert_eq!(
        registry.state(sub(1), ListenerKind::VoiceMailState).unwrap(),
        RegistrationState::Registered
    );
}

#[test]
fn notifications_from_many_threads_keep_per_binding_order() {
    let (registry, service, mut queue) = setup(&[1, 2]);
    registry.start(sub(1), ListenerKind::DataConnectionRealtimeInfo).unwrap();
    registry.start(sub(2), ListenerKind::DataConnectionRealtimeInfo).unwrap();

    let handles: Vec<_> = [1, 2]
        .into_iter()
        .map(|id| {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                for t in 0..100i64 {
                    service.notify(
                        id,
                        ListenerKind::DataConnectionRealtimeInfo,
                        RawNotification::DataConnectionRealtimeInfo {
                            time_nanos: t,
                            power_state: 1,
                        },
                    );
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let events = queue.drain();
    assert_eq!(events.len(), 200);
    for id in [1, 2] {
        let times: Vec<i64> = events
            .iter()
            .filter(|e| e.data().get("subscriptionId") == Some(&Value::Int(id)))
            .filter_map(|e| e.data().get("Time").and_then(Value::as_long))
            .collect();
        assert_eq!(times, (0..100).collect::<Vec<_>>());
    }
}

#[test]
fn dropping_registry_unregisters_everything() {
    let (registry, service, _queue) = setup(&[1]);
    registry.start(sub(1), ListenerKind::CallState).unwrap();
    drop(registry);

    // Drop joins the control thread, which stops what is still registered.
    assert!(!service.is_listening(1, ListenerKind::CallState));
}

fn platform_message(err: &RegistryError) -> &str {
    match err {
        RegistryError::Platform { source, .. } => &source.message,
        other => panic!("expected a platform error, got {other:?}"),
    }
}

#[test]
fn panicking_register_is_isolated_to_its_binding() {
    let (registry, service, _queue) = setup(&[1, 2]);
    service.panic_register_for.lock().unwrap().push(sub(2));

    registry.start(sub(1), ListenerKind::CallState).unwrap();
    let err = registry.start(sub(2), ListenerKind::CallState).unwrap_err();
    assert!(err.is_platform());
    assert!(platform_message(&err).contains("register panicked"));
    assert!(platform_message(&err).contains("radio service died"));
    assert_eq!(
        registry.state(sub(2), ListenerKind::CallState).unwrap(),
        RegistrationState::Unregistered
    );

    // The control thread is still serving every other subscription.
    assert_eq!(
        registry.state(sub(1), ListenerKind::CallState).unwrap(),
        RegistrationState::Registered
    );
    registry.stop(sub(1), ListenerKind::CallState).unwrap();
    assert!(!service.is_listening(1, ListenerKind::CallState));
    assert_eq!(service.unregister_calls.load(Ordering::SeqCst), 1);
    registry.start(sub(1), ListenerKind::VoiceMailState).unwrap();
    assert!(service.is_listening(1, ListenerKind::VoiceMailState));

    // Once the host recovers, the same binding can be started.
    service.panic_register_for.lock().unwrap().clear();
    registry.start(sub(2), ListenerKind::CallState).unwrap();
    assert!(service.is_listening(2, ListenerKind::CallState));
}

#[test]
fn panicking_unregister_still_stops_locally() {
    let (registry, service, _queue) = setup(&[3, 4]);
    registry.start(sub(3), ListenerKind::ServiceState).unwrap();
    registry.start(sub(4), ListenerKind::ServiceState).unwrap();
    service.panic_unregister_for.lock().unwrap().push(sub(3));

    let err = registry.stop(sub(3), ListenerKind::ServiceState).unwrap_err();
    assert!(platform_message(&err).contains("unregister panicked"));
    assert_eq!(
        registry.state(sub(3), ListenerKind::ServiceState).unwrap(),
        RegistrationState::Unregistered
    );

    let report = registry.shutdown_all().unwrap();
    assert_eq!(report.stopped, 1);
    assert!(report.is_clean());
    assert!(!service.is_listening(4, ListenerKind::ServiceState));
}
