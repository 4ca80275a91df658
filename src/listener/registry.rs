//! Subscription registry and its control thread.
//!
//! The registry owns `SubscriptionId -> SubscriptionBundle` on a dedicated
//! thread. Public methods post a `ControlMsg` and block on a one-shot reply,
//! so every listener transition, for every subscription, is applied one at a
//! time in arrival order. Platform callbacks never touch the bundle map: they
//! only hold the handler built at registration time.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, SendTimeoutError, Sender};
use serde::{Deserialize, Serialize};

use crate::error::{PlatformError, RegistryError};
use crate::event::EventSink;
use crate::platform::ListenerService;

use super::binding::ListenerBinding;
use super::{CallLevel, CallStateFilter, ListenerKind, RegistrationState, SubscriptionId};

const CONTROL_THREAD_NAME: &str = "telemux-listener-control";

/// Registry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Max queued control messages (start/stop/initialize).
    pub control_queue_capacity: usize,
    /// How long a caller waits for room in a full control queue.
    pub control_send_timeout_ms: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            control_queue_capacity: 1024,
            control_send_timeout_ms: 5_000,
        }
    }
}

/// Outcome of (re)initializing the bundle map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitializeReport {
    /// Bundles in the new map.
    pub subscriptions: usize,
    /// Registered bindings of the old map that were stopped first.
    pub force_stopped: usize,
    /// Platform failures while force-stopping.
    pub failures: Vec<RegistryError>,
}

/// Outcome of stopping every registered binding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Bindings moved to `Unregistered`.
    pub stopped: usize,
    /// Platform failures; the bindings still count as stopped.
    pub failures: Vec<RegistryError>,
}

impl ShutdownReport {
    /// True when the platform accepted every unregister.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

type Reply<T> = Sender<Result<T, RegistryError>>;

enum ControlMsg {
    Initialize {
        ids: Vec<SubscriptionId>,
        reply: Reply<InitializeReport>,
    },
    Start {
        sub: SubscriptionId,
        kind: ListenerKind,
        reply: Reply<()>,
    },
    Stop {
        sub: SubscriptionId,
        kind: ListenerKind,
        reply: Reply<()>,
    },
    SetFilter {
        sub: SubscriptionId,
        filter: CallStateFilter,
        reply: Reply<()>,
    },
    AdjustFilter {
        sub: SubscriptionId,
        level: CallLevel,
        listen: bool,
        reply: Reply<CallStateFilter>,
    },
    Filter {
        sub: SubscriptionId,
        reply: Reply<CallStateFilter>,
    },
    State {
        sub: SubscriptionId,
        kind: ListenerKind,
        reply: Reply<RegistrationState>,
    },
    Subscriptions {
        reply: Reply<Vec<SubscriptionId>>,
    },
    ShutdownAll {
        reply: Reply<ShutdownReport>,
    },
}

/// Exactly one binding per listener kind for a subscription.
#[derive(Debug)]
struct SubscriptionBundle {
    bindings: [ListenerBinding; 5],
}

impl SubscriptionBundle {
    fn new(sub: SubscriptionId) -> Self {
        Self {
            bindings: ListenerKind::ALL.map(|kind| ListenerBinding::new(sub, kind)),
        }
    }

    fn get(&self, kind: ListenerKind) -> &ListenerBinding {
        &self.bindings[slot(kind)]
    }

    fn get_mut(&mut self, kind: ListenerKind) -> &mut ListenerBinding {
        &mut self.bindings[slot(kind)]
    }
}

const fn slot(kind: ListenerKind) -> usize {
    match kind {
        ListenerKind::ServiceState => 0,
        ListenerKind::CallState => 1,
        ListenerKind::DataConnectionState => 2,
        ListenerKind::DataConnectionRealtimeInfo => 3,
        ListenerKind::VoiceMailState => 4,
    }
}

/// Owns every subscription's listener bindings.
///
/// Construct once and share (e.g. behind an `Arc`). Dropping the registry
/// stops any binding still registered.
pub struct SubscriptionRegistry {
    cfg: RegistryConfig,
    control_tx: Sender<ControlMsg>,
    control_thread: ThreadId,
    join: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl std::fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionRegistry")
            .field("cfg", &self.cfg)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl SubscriptionRegistry {
    /// Spawns the control thread. The registry starts with no subscriptions.
    pub fn new(
        cfg: RegistryConfig,
        service: Arc<dyn ListenerService>,
        sink: EventSink,
    ) -> std::io::Result<Self> {
        let capacity = cfg.control_queue_capacity.max(1);
        let (control_tx, control_rx) = bounded::<ControlMsg>(capacity);

        let join = thread::Builder::new()
            .name(CONTROL_THREAD_NAME.to_string())
            .spawn(move || control_loop(service, sink, control_rx))?;
        let control_thread = join.thread().id();

        Ok(Self {
            cfg,
            control_tx,
            control_thread,
            join: Mutex::new(Some(join)),
            closed: AtomicBool::new(false),
        })
    }

    /// Replaces the bundle map with one fresh bundle per id.
    ///
    /// Registered bindings of the previous map are stopped first.
    pub fn initialize<I>(&self, ids: I) -> Result<InitializeReport, RegistryError>
    where
        I: IntoIterator<Item = SubscriptionId>,
    {
        let ids = ids.into_iter().collect();
        self.call(|reply| ControlMsg::Initialize { ids, reply })
    }

    /// Registers `(sub, kind)` with the platform; a no-op when registered.
    pub fn start(&self, sub: SubscriptionId, kind: ListenerKind) -> Result<(), RegistryError> {
        self.call(|reply| ControlMsg::Start { sub, kind, reply })
    }

    /// Unregisters `(sub, kind)`; a no-op when not registered.
    ///
    /// The binding is stopped locally even when the platform reports an
    /// error, and late notifications from the old registration are dropped.
    pub fn stop(&self, sub: SubscriptionId, kind: ListenerKind) -> Result<(), RegistryError> {
        self.call(|reply| ControlMsg::Stop { sub, kind, reply })
    }

    /// Sets the call-state filter used by the next CallState registration.
    pub fn set_filter(&self, sub: SubscriptionId, filter: CallStateFilter) -> Result<(), RegistryError> {
        self.call(|reply| ControlMsg::SetFilter { sub, filter, reply })
    }

    /// Switches one call level of the pending filter and returns the result.
    pub fn adjust_filter(
        &self,
        sub: SubscriptionId,
        level: CallLevel,
        listen: bool,
    ) -> Result<CallStateFilter, RegistryError> {
        self.call(|reply| ControlMsg::AdjustFilter {
            sub,
            level,
            listen,
            reply,
        })
    }

    /// The pending call-state filter of a subscription.
    pub fn filter(&self, sub: SubscriptionId) -> Result<CallStateFilter, RegistryError> {
        self.call(|reply| ControlMsg::Filter { sub, reply })
    }

    /// Registration state of one binding.
    pub fn state(&self, sub: SubscriptionId, kind: ListenerKind) -> Result<RegistrationState, RegistryError> {
        self.call(|reply| ControlMsg::State { sub, kind, reply })
    }

    /// Known subscription ids, ascending.
    pub fn subscriptions(&self) -> Result<Vec<SubscriptionId>, RegistryError> {
        self.call(|reply| ControlMsg::Subscriptions { reply })
    }

    /// Stops every registered binding, continuing past platform failures.
    ///
    /// Bundles stay in place, so listeners can be started again afterwards.
    pub fn shutdown_all(&self) -> Result<ShutdownReport, RegistryError> {
        self.call(|reply| ControlMsg::ShutdownAll { reply })
    }

    /// The configuration this registry was built with.
    #[must_use]
    pub const fn config(&self) -> &RegistryConfig {
        &self.cfg
    }

    // Post-and-wait hand-off to the control thread.
    fn call<T>(&self, make: impl FnOnce(Reply<T>) -> ControlMsg) -> Result<T, RegistryError> {
        if thread::current().id() == self.control_thread {
            return Err(RegistryError::Reentrant);
        }

        let (reply_tx, reply_rx) = bounded::<Result<T, RegistryError>>(1);
        let timeout = Duration::from_millis(self.cfg.control_send_timeout_ms);
        self.control_tx
            .send_timeout(make(reply_tx), timeout)
            .map_err(|err| match err {
                SendTimeoutError::Timeout(_) => RegistryError::QueueFull {
                    capacity: self.cfg.control_queue_capacity.max(1),
                },
                SendTimeoutError::Disconnected(_) => RegistryError::Disconnected,
            })?;

        reply_rx.recv().map_err(|_| RegistryError::Disconnected)?
    }
}

impl Drop for SubscriptionRegistry {
    fn drop(&mut self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        // Closing the channel ends the loop, which stops anything still
        // registered before the thread exits.
        let (dummy_tx, _) = bounded::<ControlMsg>(1);
        drop(std::mem::replace(&mut self.control_tx, dummy_tx));

        let handle = match self.join.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            if thread::current().id() == self.control_thread {
                // Dropped from inside a platform call; the loop exits once
                // the current message returns.
                return;
            }
            if handle.join().is_err() {
                log::error!("listener control thread panicked");
            }
        }
    }
}

struct ControlState {
    service: Arc<dyn ListenerService>,
    sink: EventSink,
    bundles: HashMap<SubscriptionId, SubscriptionBundle>,
}

fn control_loop(service: Arc<dyn ListenerService>, sink: EventSink, control_rx: Receiver<ControlMsg>) {
    let mut state = ControlState {
        service,
        sink,
        bundles: HashMap::new(),
    };

    while let Ok(msg) = control_rx.recv() {
        match msg {
            ControlMsg::Initialize { ids, reply } => {
                let _ = reply.send(Ok(state.initialize(ids)));
            }
            ControlMsg::Start { sub, kind, reply } => {
                let _ = reply.send(state.start(sub, kind));
            }
            ControlMsg::Stop { sub, kind, reply } => {
                let _ = reply.send(state.stop(sub, kind));
            }
            ControlMsg::SetFilter { sub, filter, reply } => {
                let _ = reply.send(state.bundle_mut(sub).map(|bundle| {
                    bundle.get_mut(ListenerKind::CallState).set_filter(filter);
                }));
            }
            ControlMsg::AdjustFilter {
                sub,
                level,
                listen,
                reply,
            } => {
                let _ = reply.send(state.bundle_mut(sub).map(|bundle| {
                    let binding = bundle.get_mut(ListenerKind::CallState);
                    let filter = binding.filter().with(level, listen);
                    binding.set_filter(filter);
                    filter
                }));
            }
            ControlMsg::Filter { sub, reply } => {
                let _ = reply.send(
                    state
                        .bundle(sub)
                        .map(|bundle| bundle.get(ListenerKind::CallState).filter()),
                );
            }
            ControlMsg::State { sub, kind, reply } => {
                let _ = reply.send(state.bundle(sub).map(|bundle| bundle.get(kind).state()));
            }
            ControlMsg::Subscriptions { reply } => {
                let mut ids: Vec<SubscriptionId> = state.bundles.keys().copied().collect();
                ids.sort_unstable();
                let _ = reply.send(Ok(ids));
            }
            ControlMsg::ShutdownAll { reply } => {
                let _ = reply.send(Ok(state.shutdown_all()));
            }
        }
    }

    let report = state.shutdown_all();
    if report.stopped > 0 {
        log::info!(
            "listener registry closed; stopped {} listener(s) with {} failure(s)",
            report.stopped,
            report.failures.len()
        );
    }
}

impl ControlState {
    fn bundle(&self, sub: SubscriptionId) -> Result<&SubscriptionBundle, RegistryError> {
        self.bundles
            .get(&sub)
            .ok_or(RegistryError::UnknownSubscription { subscription_id: sub })
    }

    fn bundle_mut(&mut self, sub: SubscriptionId) -> Result<&mut SubscriptionBundle, RegistryError> {
        self.bundles
            .get_mut(&sub)
            .ok_or(RegistryError::UnknownSubscription { subscription_id: sub })
    }

    fn initialize(&mut self, ids: Vec<SubscriptionId>) -> InitializeReport {
        let stopped = self.shutdown_all();

        self.bundles = ids
            .into_iter()
            .map(|sub| (sub, SubscriptionBundle::new(sub)))
            .collect();

        log::info!(
            "listener registry initialized with {} subscription(s), force-stopped {}",
            self.bundles.len(),
            stopped.stopped
        );

        InitializeReport {
            subscriptions: self.bundles.len(),
            force_stopped: stopped.stopped,
            failures: stopped.failures,
        }
    }

    fn start(&mut self, sub: SubscriptionId, kind: ListenerKind) -> Result<(), RegistryError> {
        let sink = self.sink.clone();
        let service = Arc::clone(&self.service);
        let binding = self.bundle_mut(sub)?.get_mut(kind);

        if binding.is_registered() {
            log::debug!("{kind} listener on subscription {sub} already registered");
            return Ok(());
        }

        let handler = binding.handler(sink);
        let active = handler.active_flag();
        let callback = handler.into_callback();
        let registered = guarded("register", sub, kind, || {
            service.register(sub, kind, kind.event_mask(), callback)
        });
        match registered {
            Ok(()) => {
                binding.mark_registered(active);
                log::debug!("{kind} listener on subscription {sub} registered");
                Ok(())
            }
            Err(source) => {
                // The platform never saw a working registration.
                active.store(false, Ordering::Release);
                log::warn!("failed to register {kind} listener on subscription {sub}: {source}");
                Err(RegistryError::Platform {
                    subscription_id: sub,
                    kind,
                    source,
                })
            }
        }
    }

    fn stop(&mut self, sub: SubscriptionId, kind: ListenerKind) -> Result<(), RegistryError> {
        let service = Arc::clone(&self.service);
        let binding = self.bundle_mut(sub)?.get_mut(kind);
        Self::stop_binding(service.as_ref(), binding)
    }

    fn stop_binding(service: &dyn ListenerService, binding: &mut ListenerBinding) -> Result<(), RegistryError> {
        if !binding.is_registered() {
            return Ok(());
        }

        let (sub, kind) = (binding.subscription_id(), binding.kind());
        binding.mark_unregistered();
        guarded("unregister", sub, kind, || service.unregister(sub, kind)).map_err(|source| {
            log::warn!("failed to unregister {kind} listener on subscription {sub}: {source}");
            RegistryError::Platform {
                subscription_id: sub,
                kind,
                source,
            }
        })
    }

    fn shutdown_all(&mut self) -> ShutdownReport {
        let mut report = ShutdownReport::default();
        let service = Arc::clone(&self.service);

        let mut subs: Vec<SubscriptionId> = self.bundles.keys().copied().collect();
        subs.sort_unstable();
        for sub in subs {
            let Some(bundle) = self.bundles.get_mut(&sub) else {
                continue;
            };
            for binding in &mut bundle.bindings {
                if !binding.is_registered() {
                    continue;
                }
                report.stopped += 1;
                if let Err(err) = Self::stop_binding(service.as_ref(), binding) {
                    report.failures.push(err);
                }
            }
        }

        report
    }
}

// Runs one platform call on the control thread, turning a panic into a
// `PlatformError` for that binding only.
fn guarded(
    op: &str,
    sub: SubscriptionId,
    kind: ListenerKind,
    call: impl FnOnce() -> Result<(), PlatformError>,
) -> Result<(), PlatformError> {
    catch_unwind(AssertUnwindSafe(call)).unwrap_or_else(|payload| {
        let reason = panic_reason(payload.as_ref());
        log::error!("platform {op} for {kind} listener on subscription {sub} panicked: {reason}");
        Err(PlatformError::new(format!("{op} panicked: {reason}")))
    })
}

fn panic_reason(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
