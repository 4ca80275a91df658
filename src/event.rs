//! Event envelopes and the outbound event queue.
//!
//! Listener bindings push envelopes through cloneable [`EventSink`]s; the RPC
//! boundary owns the single [`EventQueue`] and drains it. Producers never
//! block: when the queue is full the new envelope is dropped and counted.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, TimeZone, Utc};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

use crate::encoder::encode;
use crate::value::Value;

/// Stable event names clients dispatch on.
pub mod names {
    /// Service state changed.
    pub const SERVICE_STATE_CHANGED: &str = "ServiceStateChanged";
    /// Coarse call state changed.
    pub const CALL_STATE_CHANGED: &str = "CallStateChanged";
    /// Precise state of a foreground, ringing or background call changed.
    pub const PRECISE_STATE_CHANGED: &str = "PreciseStateChanged";
    /// Data connection state changed.
    pub const DATA_CONNECTION_STATE_CHANGED: &str = "DataConnectionStateChanged";
    /// Data connection real-time power info changed.
    pub const DATA_CONNECTION_REAL_TIME_INFO_CHANGED: &str = "DataConnectionRealTimeInfoChanged";
    /// Voice mail waiting indicator changed.
    pub const MESSAGE_WAITING_INDICATOR_CHANGED: &str = "MessageWaitingIndicatorChanged";
}

/// An immutable notification record forwarded to clients.
#[derive(Debug, Clone, PartialEq)]
pub struct EventEnvelope {
    name: String,
    data: Value,
    timestamp: DateTime<Utc>,
}

impl EventEnvelope {
    /// Creates an envelope stamped with the current wall-clock time.
    ///
    /// Envelopes pushed through an [`EventSink`] are stamped by the sink
    /// instead, which keeps timestamps non-decreasing per producer.
    #[must_use]
    pub fn new(name: impl Into<String>, data: Value) -> Self {
        Self::at(name, data, Utc::now())
    }

    /// Creates an envelope with an explicit timestamp.
    #[must_use]
    pub fn at(name: impl Into<String>, data: Value, timestamp: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            data,
            timestamp,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn data(&self) -> &Value {
        &self.data
    }

    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Wire form: `{"name", "data", "time"}` with `time` in epoch millis.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        json!({
            "name": self.name,
            "data": encode(&self.data),
            "time": self.timestamp.timestamp_millis(),
        })
    }
}

/// Event queue configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventQueueConfig {
    /// Max queued envelopes before new ones are dropped.
    pub capacity: usize,
}

impl Default for EventQueueConfig {
    fn default() -> Self {
        Self { capacity: 4096 }
    }
}

/// Creates a connected sink/queue pair.
#[must_use]
pub fn event_queue(cfg: &EventQueueConfig) -> (EventSink, EventQueue) {
    let capacity = cfg.capacity.max(1);
    let (tx, rx) = bounded::<EventEnvelope>(capacity);
    let dropped = Arc::new(AtomicU64::new(0));
    let sink = EventSink {
        tx,
        capacity,
        dropped: Arc::clone(&dropped),
        last_micros: Arc::new(AtomicI64::new(i64::MIN)),
    };
    let queue = EventQueue {
        rx,
        pending: VecDeque::new(),
        dropped,
    };
    (sink, queue)
}

/// Producer handle for the event queue.
///
/// Clones share one clock, so every envelope stamped through the same sink
/// lineage has a timestamp no earlier than the previous one.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: Sender<EventEnvelope>,
    capacity: usize,
    dropped: Arc<AtomicU64>,
    last_micros: Arc<AtomicI64>,
}

impl EventSink {
    /// Stamps and enqueues an event. Returns false if it was dropped.
    pub fn post(&self, name: impl Into<String>, data: Value) -> bool {
        let envelope = EventEnvelope::at(name, data, self.stamp());
        self.push(envelope)
    }

    /// Enqueues a pre-built envelope without restamping it.
    pub fn push(&self, envelope: EventEnvelope) -> bool {
        match self.tx.try_send(envelope) {
            Ok(()) => true,
            Err(TrySendError::Full(ev)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                log::warn!(
                    "event queue full (capacity {}), dropping {}",
                    self.capacity,
                    ev.name()
                );
                false
            }
            Err(TrySendError::Disconnected(ev)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                log::debug!("event queue closed, dropping {}", ev.name());
                false
            }
        }
    }

    /// Number of envelopes dropped because the queue was full or closed.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Wall clock, clamped so it never runs backwards for this sink lineage.
    pub(crate) fn stamp(&self) -> DateTime<Utc> {
        let now = Utc::now().timestamp_micros();
        let prev = self.last_micros.fetch_max(now, Ordering::AcqRel);
        let micros = now.max(prev);
        Utc.timestamp_micros(micros).single().unwrap_or_else(Utc::now)
    }
}

/// The single consumer side of the event stream.
///
/// All methods take `&mut self`: exactly one owner drains the queue.
#[derive(Debug)]
pub struct EventQueue {
    rx: Receiver<EventEnvelope>,
    // Envelopes skipped over by `wait_for`, kept in arrival order.
    pending: VecDeque<EventEnvelope>,
    dropped: Arc<AtomicU64>,
}

impl EventQueue {
    /// Takes the oldest envelope, if any, without blocking.
    pub fn poll(&mut self) -> Option<EventEnvelope> {
        self.pending.pop_front().or_else(|| self.rx.try_recv().ok())
    }

    /// Takes every queued envelope in arrival order.
    pub fn drain(&mut self) -> Vec<EventEnvelope> {
        let mut out: Vec<EventEnvelope> = self.pending.drain(..).collect();
        out.extend(self.rx.try_iter());
        out
    }

    /// Waits up to `timeout` for the next envelope.
    pub fn recv_timeout(&mut self, timeout: Duration) -> Option<EventEnvelope> {
        if let Some(ev) = self.pending.pop_front() {
            return Some(ev);
        }
        match self.rx.recv_timeout(timeout) {
            Ok(ev) => Some(ev),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Waits up to `timeout` for the first envelope named `name`.
    ///
    /// Envelopes with other names stay queued in their original order.
    pub fn wait_for(&mut self, name: &str, timeout: Duration) -> Option<EventEnvelope> {
        if let Some(pos) = self.pending.iter().position(|ev| ev.name() == name) {
            return self.pending.remove(pos);
        }

        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(ev) if ev.name() == name => return Some(ev),
                Ok(ev) => self.pending.push_back(ev),
                Err(_) => return None,
            }
        }
    }

    /// Number of envelopes currently waiting.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len() + self.rx.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops everything currently queued.
    pub fn clear(&mut self) {
        self.pending.clear();
        while self.rx.try_recv().is_ok() {}
    }

    /// Drains every queued envelope into its wire form.
    pub fn drain_json(&mut self) -> JsonValue {
        JsonValue::Array(self.drain().iter().map(EventEnvelope::to_json).collect())
    }

    /// Number of envelopes producers dropped.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_wire_form() {
        let ts = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let ev = EventEnvelope::at(
            names::CALL_STATE_CHANGED,
            Value::map(vec![("State", "RINGING")]),
            ts,
        );
        assert_eq!(
            ev.to_json(),
            json!({
                "name": "CallStateChanged",
                "data": { "State": "RINGING" },
                "time": 1_700_000_000_123i64,
            })
        );
    }

    #[test]
    fn test_envelope_can_be_encoded_as_a_value() {
        let ts = Utc.timestamp_millis_opt(5).unwrap();
        let ev = EventEnvelope::at("x", Value::Int(1), ts);
        let nested = Value::list(vec![ev]);
        assert_eq!(
            encode(&nested),
            json!([{ "name": "x", "data": 1, "time": 5 }])
        );
    }

    #[test]
    fn test_sink_timestamps_never_decrease() {
        let (sink, mut queue) = event_queue(&EventQueueConfig::default());
        let other = sink.clone();
        for i in 0..50 {
            let s = if i % 2 == 0 { &sink } else { &other };
            assert!(s.post("tick", Value::Int(i)));
        }
        let events = queue.drain();
        assert_eq!(events.len(), 50);
        for pair in events.windows(2) {
            assert!(pair[0].timestamp() <= pair[1].timestamp());
        }
    }

    #[test]
    fn test_full_queue_drops_newest_and_counts() {
        let (sink, mut queue) = event_queue(&EventQueueConfig { capacity: 2 });
        assert!(sink.post("a", Value::Null));
        assert!(sink.post("b", Value::Null));
        assert!(!sink.post("c", Value::Null));
        assert_eq!(sink.dropped(), 1);
        assert_eq!(queue.dropped(), 1);

        let names: Vec<String> = queue.drain().iter().map(|e| e.name().to_string()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let (sink, mut queue) = event_queue(&EventQueueConfig { capacity: 0 });
        assert!(sink.post("only", Value::Null));
        assert_eq!(queue.len(), 1);
        assert!(queue.poll().is_some());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_wait_for_keeps_other_events_in_order() {
        let (sink, mut queue) = event_queue(&EventQueueConfig::default());
        sink.post("a", Value::Int(1));
        sink.post("b", Value::Int(2));
        sink.post("a", Value::Int(3));
        sink.post("c", Value::Int(4));

        let c = queue.wait_for("c", Duration::from_millis(50)).unwrap();
        assert_eq!(c.data(), &Value::Int(4));

        let rest: Vec<Value> = queue.drain().into_iter().map(|e| e.data().clone()).collect();
        assert_eq!(rest, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    }

    #[test]
    fn test_wait_for_times_out() {
        let (sink, mut queue) = event_queue(&EventQueueConfig::default());
        sink.post("other", Value::Null);
        assert!(queue.wait_for("missing", Duration::from_millis(10)).is_none());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_post_after_queue_dropped_reports_failure() {
        let (sink, queue) = event_queue(&EventQueueConfig::default());
        drop(queue);
        assert!(!sink.post("late", Value::Null));
        assert_eq!(sink.dropped(), 1);
    }

    #[test]
    fn test_drain_json_and_clear() {
        let (sink, mut queue) = event_queue(&EventQueueConfig::default());
        sink.post("a", Value::Bool(true));
        let out = queue.drain_json();
        assert_eq!(out[0]["name"], json!("a"));
        assert_eq!(out[0]["data"], json!(true));

        sink.post("b", Value::Null);
        queue.clear();
        assert!(queue.is_empty());
    }
}
