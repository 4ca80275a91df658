//! Error types for telemux.
//!
//! All errors are strongly typed using thiserror. Registry failures stay
//! local to the caller: the facade turns them into boolean results, and the
//! encoder has no error channel at all.

use thiserror::Error;

use crate::listener::{ListenerKind, SubscriptionId};
use crate::platform::SubscriptionPurpose;

/// Failure reported by the platform listener service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("platform rejected listener request: {message}")]
pub struct PlatformError {
    /// Platform-provided reason.
    pub message: String,
}

impl PlatformError {
    /// Creates a platform error from any message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors returned by the subscription registry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unknown subscription id: {subscription_id}")]
    UnknownSubscription {
        subscription_id: SubscriptionId,
    },

    #[error("Listener {kind} on subscription {subscription_id}: {source}")]
    Platform {
        subscription_id: SubscriptionId,
        kind: ListenerKind,
        #[source]
        source: PlatformError,
    },

    #[error("Listener control queue full (capacity {capacity})")]
    QueueFull {
        capacity: usize,
    },

    #[error("Listener control context disconnected")]
    Disconnected,

    #[error("Registry called from its own control context")]
    Reentrant,
}

impl RegistryError {
    /// Returns true for an unknown subscription id.
    #[must_use]
    pub const fn is_lookup(&self) -> bool {
        matches!(self, Self::UnknownSubscription { .. })
    }

    /// Returns true when the platform listener service refused the request.
    #[must_use]
    pub const fn is_platform(&self) -> bool {
        matches!(self, Self::Platform { .. })
    }
}

/// Errors surfaced by the phone facade.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FacadeError {
    #[error("Capability not supported by this platform: {capability}")]
    Unsupported {
        capability: &'static str,
    },

    #[error("No default {purpose:?} subscription is set")]
    NoDefaultSubscription {
        purpose: SubscriptionPurpose,
    },

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
}

/// Errors from the RPC method table.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RpcError {
    #[error("Unknown method: {method}")]
    UnknownMethod {
        method: String,
    },

    #[error("Invalid params for {method}: {reason}")]
    InvalidParams {
        method: String,
        reason: String,
    },

    #[error("Facade error: {0}")]
    Facade(#[from] FacadeError),
}

/// Top-level error type for telemux.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TelemuxError {
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Facade error: {0}")]
    Facade(#[from] FacadeError),

    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Invalid configuration: {message}")]
    Config {
        message: String,
    },

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl TelemuxError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a subscription lookup failure.
    #[must_use]
    pub const fn is_lookup(&self) -> bool {
        match self {
            Self::Registry(e) | Self::Facade(FacadeError::Registry(e)) => e.is_lookup(),
            Self::Rpc(RpcError::Facade(FacadeError::Registry(e))) => e.is_lookup(),
            _ => false,
        }
    }

    /// Returns true if the platform listener service rejected the request.
    #[must_use]
    pub const fn is_platform(&self) -> bool {
        match self {
            Self::Registry(e) | Self::Facade(FacadeError::Registry(e)) => e.is_platform(),
            Self::Rpc(RpcError::Facade(FacadeError::Registry(e))) => e.is_platform(),
            _ => false,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            // A full control queue drains on its own.
            Self::Registry(RegistryError::QueueFull { .. })
            | Self::Facade(FacadeError::Registry(RegistryError::QueueFull { .. })) => true,
            Self::Registry(RegistryError::Platform { .. })
            | Self::Facade(FacadeError::Registry(RegistryError::Platform { .. })) => true,
            _ => false,
        }
    }
}

/// Result type alias for telemux operations.
pub type TelemuxResult<T> = Result<T, TelemuxError>;
