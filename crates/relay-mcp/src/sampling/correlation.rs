//! Sampling Response Correlation
//!
//! The id -> waiter table behind server-initiated requests. Outbound ids
//! come from an atomic generator so they never collide; each pending call
//! holds a oneshot sender the response dispatcher completes. Responses for
//! unknown ids are ignored, and a background sweep times out waiters whose
//! deadline passed (a safety net under the caller's own timeout).

// Layer 1: Standard library imports
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

// Layer 2: Third-party crate imports
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

// Layer 3: Internal module imports
use super::error::{SamplingError, SamplingResult};
use crate::protocol::{JsonRpcResponse, RequestId};

/// A waiter for one outbound request
#[derive(Debug)]
struct PendingCall {
    sender: oneshot::Sender<SamplingResult<Value>>,
    created_at: DateTime<Utc>,
    timeout: TimeDelta,
}

impl PendingCall {
    fn is_expired_at(&self, now: &DateTime<Utc>) -> bool {
        now.signed_duration_since(self.created_at) > self.timeout
    }
}

/// Outbound id allocation plus the id -> waiter table
#[derive(Debug)]
pub struct CorrelationTable {
    pending: DashMap<RequestId, PendingCall>,
    id_counter: AtomicI64,
    max_pending: usize,
}

impl CorrelationTable {
    /// Create a table capped at `max_pending` concurrent waiters
    pub fn new(max_pending: usize) -> Self {
        Self {
            pending: DashMap::new(),
            id_counter: AtomicI64::new(1),
            max_pending,
        }
    }

    /// Allocate the next monotonically increasing outbound id
    pub fn next_id(&self) -> RequestId {
        RequestId::new_number(self.id_counter.fetch_add(1, Ordering::SeqCst))
    }

    /// Register a waiter under a fresh id
    ///
    /// # Errors
    ///
    /// Returns `SamplingError::CapacityExceeded` at the cap.
    pub fn register(
        &self,
        timeout: TimeDelta,
    ) -> SamplingResult<(RequestId, oneshot::Receiver<SamplingResult<Value>>)> {
        if self.max_pending > 0 && self.pending.len() >= self.max_pending {
            return Err(SamplingError::CapacityExceeded);
        }

        let id = self.next_id();
        let (sender, receiver) = oneshot::channel();
        self.pending.insert(
            id.clone(),
            PendingCall {
                sender,
                created_at: Utc::now(),
                timeout,
            },
        );
        trace!(request = %id, "sampling waiter registered");
        Ok((id, receiver))
    }

    /// Complete a waiter from an inbound response frame
    ///
    /// Returns whether a waiter was matched. Responses for unknown ids are
    /// ignored: they are late arrivals after timeout or cancellation.
    pub fn correlate(&self, response: JsonRpcResponse) -> bool {
        let Some(id) = response.id.clone() else {
            return false;
        };
        let Some((_, call)) = self.pending.remove(&id) else {
            trace!(request = %id, "response for unknown sampling id ignored");
            return false;
        };

        let outcome = if let Some(result) = response.result {
            Ok(result)
        } else {
            let error = response.error.unwrap_or(Value::Null);
            Err(SamplingError::ClientError {
                code: error.get("code").and_then(Value::as_i64).unwrap_or(-1),
                message: error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error")
                    .to_string(),
            })
        };

        // A dropped receiver means the caller already gave up; fine.
        let _ = call.sender.send(outcome);
        true
    }

    /// Drop a waiter and release it with a cancellation error
    pub fn cancel(&self, id: &RequestId) {
        if let Some((_, call)) = self.pending.remove(id) {
            debug!(request = %id, "sampling waiter cancelled");
            let _ = call.sender.send(Err(SamplingError::Cancelled { id: id.clone() }));
        }
    }

    /// Release every waiter with `ConnectionClosed` (server shutdown)
    pub fn drain(&self) {
        let ids: Vec<RequestId> = self
            .pending
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        for id in ids {
            if let Some((_, call)) = self.pending.remove(&id) {
                let _ = call.sender.send(Err(SamplingError::ConnectionClosed));
            }
        }
    }

    /// Number of waiters currently registered
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Time out waiters whose deadline passed; returns how many
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let expired: Vec<RequestId> = self
            .pending
            .iter()
            .filter(|entry| entry.value().is_expired_at(&now))
            .map(|entry| entry.key().clone())
            .collect();

        let count = expired.len();
        for id in expired {
            if let Some((_, call)) = self.pending.remove(&id) {
                let timeout = call.timeout;
                let _ = call
                    .sender
                    .send(Err(SamplingError::Timeout { id, timeout }));
            }
        }
        if count > 0 {
            debug!(count, "swept expired sampling waiters");
        }
        count
    }

    /// Start the periodic sweep; runs until `shutdown` is cancelled
    pub fn start_sweeper(
        self: &Arc<Self>,
        sweep_interval: Duration,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        let table = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = interval(sweep_interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        table.sweep_expired(Utc::now());
                    }
                    _ = shutdown.cancelled() => break,
                }
            }
            debug!("sampling sweeper shut down");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table() -> CorrelationTable {
        CorrelationTable::new(100)
    }

    #[test]
    fn ids_are_monotonic() {
        let table = table();
        let a = table.next_id();
        let b = table.next_id();
        match (a, b) {
            (RequestId::Number(a), RequestId::Number(b)) => assert!(b > a),
            other => panic!("expected numeric ids, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn correlate_delivers_result() {
        let table = table();
        let (id, receiver) = table.register(TimeDelta::seconds(30)).unwrap();

        assert!(table.correlate(JsonRpcResponse::success(json!({"role": "assistant"}), id)));
        let result = receiver.await.unwrap().unwrap();
        assert_eq!(result["role"], "assistant");
        assert_eq!(table.pending_count(), 0);
    }

    #[tokio::test]
    async fn error_response_becomes_client_error() {
        let table = table();
        let (id, receiver) = table.register(TimeDelta::seconds(30)).unwrap();

        table.correlate(JsonRpcResponse::error(
            json!({"code": -1, "message": "user declined"}),
            Some(id),
        ));
        match receiver.await.unwrap() {
            Err(SamplingError::ClientError { code, message }) => {
                assert_eq!(code, -1);
                assert_eq!(message, "user declined");
            }
            other => panic!("expected client error, got {other:?}"),
        }
    }

    #[test]
    fn unknown_response_ids_ignored() {
        let table = table();
        let (_id, _receiver) = table.register(TimeDelta::seconds(30)).unwrap();

        assert!(!table.correlate(JsonRpcResponse::success(
            json!({}),
            RequestId::new_number(9_999),
        )));
        assert_eq!(table.pending_count(), 1);
    }

    #[tokio::test]
    async fn cancel_releases_waiter() {
        let table = table();
        let (id, receiver) = table.register(TimeDelta::seconds(30)).unwrap();

        table.cancel(&id);
        assert!(matches!(
            receiver.await.unwrap(),
            Err(SamplingError::Cancelled { .. })
        ));
        assert_eq!(table.pending_count(), 0);
    }

    #[tokio::test]
    async fn sweep_times_out_expired_waiters() {
        let table = table();
        let (_id, receiver) = table.register(TimeDelta::milliseconds(1)).unwrap();

        let future = Utc::now() + TimeDelta::seconds(1);
        assert_eq!(table.sweep_expired(future), 1);
        assert!(matches!(
            receiver.await.unwrap(),
            Err(SamplingError::Timeout { .. })
        ));
    }

    #[test]
    fn capacity_cap_enforced() {
        let table = CorrelationTable::new(1);
        let (_id, _receiver) = table.register(TimeDelta::seconds(30)).unwrap();
        assert!(matches!(
            table.register(TimeDelta::seconds(30)),
            Err(SamplingError::CapacityExceeded)
        ));
    }

    #[tokio::test]
    async fn drain_releases_everything() {
        let table = table();
        let (_a, receiver_a) = table.register(TimeDelta::seconds(30)).unwrap();
        let (_b, receiver_b) = table.register(TimeDelta::seconds(30)).unwrap();

        table.drain();
        assert!(matches!(
            receiver_a.await.unwrap(),
            Err(SamplingError::ConnectionClosed)
        ));
        assert!(matches!(
            receiver_b.await.unwrap(),
            Err(SamplingError::ConnectionClosed)
        ));
    }
}
