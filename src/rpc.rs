//! RPC method table over the phone facade.
//!
//! Methods are addressed by their established names. Tracking methods come
//! in pairs: `phoneStartTrackingCallState` acts on the default subscription
//! and `phoneStartTrackingCallStateForSubscription` takes the subscription id
//! as its last positional parameter. Results go through the value encoder.

use serde_json::Value as JsonValue;

use crate::encoder::encode;
use crate::error::RpcError;
use crate::facade::PhoneFacade;
use crate::listener::{ListenerKind, SubscriptionId};
use crate::value::Value;

const FOR_SUBSCRIPTION: &str = "ForSubscription";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Toggle {
    Start,
    Stop,
}

const TRACKING_METHODS: &[(&str, ListenerKind, Toggle)] = &[
    ("phoneStartTrackingCallState", ListenerKind::CallState, Toggle::Start),
    ("phoneStopTrackingCallStateChange", ListenerKind::CallState, Toggle::Stop),
    (
        "phoneStartTrackingDataConnectionRTInfoChange",
        ListenerKind::DataConnectionRealtimeInfo,
        Toggle::Start,
    ),
    (
        "phoneStopTrackingDataConnectionRTInfoChange",
        ListenerKind::DataConnectionRealtimeInfo,
        Toggle::Stop,
    ),
    (
        "phoneStartTrackingDataConnectionStateChange",
        ListenerKind::DataConnectionState,
        Toggle::Start,
    ),
    (
        "phoneStopTrackingDataConnectionStateChange",
        ListenerKind::DataConnectionState,
        Toggle::Stop,
    ),
    ("phoneStartTrackingServiceStateChange", ListenerKind::ServiceState, Toggle::Start),
    ("phoneStopTrackingServiceStateChange", ListenerKind::ServiceState, Toggle::Stop),
    ("phoneStartTrackingVoiceMailStateChange", ListenerKind::VoiceMailState, Toggle::Start),
    ("phoneStopTrackingVoiceMailStateChange", ListenerKind::VoiceMailState, Toggle::Stop),
];

/// Names of every method [`dispatch`] accepts.
#[must_use]
pub fn method_names() -> Vec<String> {
    let mut names: Vec<String> = TRACKING_METHODS
        .iter()
        .flat_map(|(base, _, _)| [(*base).to_string(), format!("{base}{FOR_SUBSCRIPTION}")])
        .collect();
    names.extend(
        [
            "phoneAdjustPreciseCallStateListenLevel",
            "phoneAdjustPreciseCallStateListenLevelForSubscription",
            "getServiceState",
            "getServiceStateForSubscription",
            "getCallState",
            "getCallStateForSubscription",
            "getDataConnectionState",
            "getDataConnectionStateForSubscription",
            "phoneGetActiveSubscriptionIds",
        ]
        .map(str::to_string),
    );
    names
}

/// Invokes `method` with positional `params`.
pub fn dispatch(facade: &PhoneFacade, method: &str, params: &[JsonValue]) -> Result<JsonValue, RpcError> {
    let args = Params { method, params };

    let (base, for_sub) = match method.strip_suffix(FOR_SUBSCRIPTION) {
        Some(base) => (base, true),
        None => (method, false),
    };

    if let Some((_, kind, toggle)) = TRACKING_METHODS.iter().find(|(name, _, _)| *name == base) {
        let ok = if for_sub {
            args.expect_len(1)?;
            let sub = args.subscription(0)?;
            match toggle {
                Toggle::Start => facade.start_tracking(*kind, sub),
                Toggle::Stop => facade.stop_tracking(*kind, sub),
            }
        } else {
            args.expect_len(0)?;
            match toggle {
                Toggle::Start => facade.start_tracking_default(*kind),
                Toggle::Stop => facade.stop_tracking_default(*kind),
            }
        };
        return Ok(encode(&Value::Bool(ok)));
    }

    let result = match (base, for_sub) {
        ("phoneAdjustPreciseCallStateListenLevel", false) => {
            args.expect_len(2)?;
            let ok = facade.adjust_call_state_listen_level_default(args.string(0)?, args.bool(1)?);
            Value::Bool(ok)
        }
        ("phoneAdjustPreciseCallStateListenLevel", true) => {
            args.expect_len(3)?;
            let ok = facade.adjust_call_state_listen_level(args.string(0)?, args.bool(1)?, args.subscription(2)?);
            Value::Bool(ok)
        }
        ("getServiceState", false) => {
            args.expect_len(0)?;
            facade.service_state_default()?
        }
        ("getServiceState", true) => {
            args.expect_len(1)?;
            facade.service_state(args.subscription(0)?)?
        }
        ("getCallState", false) => {
            args.expect_len(0)?;
            Value::String(facade.call_state_default())
        }
        ("getCallState", true) => {
            args.expect_len(1)?;
            Value::String(facade.call_state(args.subscription(0)?))
        }
        ("getDataConnectionState", false) => {
            args.expect_len(0)?;
            Value::String(facade.data_connection_state_default())
        }
        ("getDataConnectionState", true) => {
            args.expect_len(1)?;
            Value::String(facade.data_connection_state(args.subscription(0)?))
        }
        ("phoneGetActiveSubscriptionIds", false) => {
            args.expect_len(0)?;
            Value::list(facade.subscription_ids().into_iter().map(SubscriptionId::get))
        }
        _ => {
            return Err(RpcError::UnknownMethod {
                method: method.to_string(),
            })
        }
    };

    Ok(encode(&result))
}

struct Params<'a> {
    method: &'a str,
    params: &'a [JsonValue],
}

impl<'a> Params<'a> {
    fn invalid(&self, reason: impl Into<String>) -> RpcError {
        RpcError::InvalidParams {
            method: self.method.to_string(),
            reason: reason.into(),
        }
    }

    fn expect_len(&self, n: usize) -> Result<(), RpcError> {
        if self.params.len() == n {
            Ok(())
        } else {
            Err(self.invalid(format!("expected {n} param(s), got {}", self.params.len())))
        }
    }

    fn get(&self, idx: usize) -> Result<&'a JsonValue, RpcError> {
        self.params
            .get(idx)
            .ok_or_else(|| self.invalid(format!("missing param {idx}")))
    }

    fn subscription(&self, idx: usize) -> Result<SubscriptionId, RpcError> {
        self.get(idx)?
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .map(SubscriptionId::new)
            .ok_or_else(|| self.invalid(format!("param {idx} must be a 32-bit integer subscription id")))
    }

    fn string(&self, idx: usize) -> Result<&'a str, RpcError> {
        self.get(idx)?
            .as_str()
            .ok_or_else(|| self.invalid(format!("param {idx} must be a string")))
    }

    fn bool(&self, idx: usize) -> Result<bool, RpcError> {
        self.get(idx)?
            .as_bool()
            .ok_or_else(|| self.invalid(format!("param {idx} must be a boolean")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_names_cover_both_forms() {
        let names = method_names();
        assert!(names.iter().any(|n| n == "phoneStartTrackingCallStateForSubscription"));
        assert!(names.iter().any(|n| n == "phoneStopTrackingVoiceMailStateChange"));
        assert!(names.iter().any(|n| n == "getDataConnectionState"));
        assert_eq!(names.len(), 29);
    }

    #[test]
    fn test_param_helpers() {
        let params = [serde_json::json!(3), serde_json::json!("x"), serde_json::json!(true)];
        let args = Params {
            method: "m",
            params: &params,
        };
        assert_eq!(args.subscription(0).unwrap(), SubscriptionId::new(3));
        assert_eq!(args.string(1).unwrap(), "x");
        assert!(args.bool(2).unwrap());
        assert!(args.expect_len(3).is_ok());
        assert!(matches!(args.string(0), Err(RpcError::InvalidParams { .. })));
        assert!(matches!(args.get(5), Err(RpcError::InvalidParams { .. })));

        let big = [serde_json::json!(i64::from(i32::MAX) + 1)];
        let args = Params {
            method: "m",
            params: &big,
        };
        assert!(args.subscription(0).is_err());
    }
}
