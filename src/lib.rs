//! # telemux - telephony listener multiplexing and canonical JSON encoding
//!
//! telemux carries the telephony RPC surface of a device-automation agent.
//! It has two halves:
//!
//! - a **subscription registry** that starts and stops per-subscription
//!   listeners on a single control thread and funnels their notifications
//!   into one outbound event queue;
//! - a **value encoder** that turns any [`Value`] (primitives, collections,
//!   binary blobs, platform records) into one canonical JSON tree.
//!
//! ## Core Concepts
//!
//! - **SubscriptionId**: one radio subscription (SIM profile)
//! - **ListenerKind**: service state, call state, data connection state,
//!   data real-time info, voice mail state
//! - **EventEnvelope**: `{name, data, time}` record delivered to clients
//! - **Value / Record**: closed model of everything the encoder accepts
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use telemux::{ListenerKind, PhoneFacade, SubscriptionId, TelemuxConfig};
//!
//! let (facade, mut events) = PhoneFacade::from_config(
//!     &TelemuxConfig::default(),
//!     listener_service,
//!     subscription_enumerator,
//!     Arc::new(telemux::platform::NoQueries),
//! )?;
//!
//! facade.start_tracking(ListenerKind::CallState, SubscriptionId::new(1));
//! for event in events.drain() {
//!     println!("{}", event.to_json());
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Encoding
pub mod codes;
pub mod encoder;
pub mod records;
pub mod value;

// Listener lifecycle and events
pub mod config;
pub mod error;
pub mod event;
pub mod listener;
pub mod platform;

// Facade and RPC surface
pub mod facade;
pub mod rpc;

// Re-export primary types at crate root for convenience
pub use config::TelemuxConfig;
pub use encoder::{encode, encode_all};
pub use error::{FacadeError, PlatformError, RegistryError, RpcError, TelemuxError, TelemuxResult};
pub use event::{event_queue, names, EventEnvelope, EventQueue, EventQueueConfig, EventSink};
pub use facade::PhoneFacade;
pub use listener::{
    CallLevel, CallStateFilter, InitializeReport, ListenMask, ListenerKind, RawNotification,
    RegistrationState, RegistryConfig, ShutdownReport, SubscriptionId, SubscriptionRegistry,
};
pub use platform::{
    ListenerService, NotificationCallback, SubscriptionEnumerator, SubscriptionPurpose,
    TelephonyQueries,
};
pub use records::Record;
pub use value::{Opaque, Value};
