//! Connection Manager
//!
//! Owns the set of live connections. The invariant: a connection is either
//! in the map (observable by id) or fully torn down, never half-registered.
//! Registration enforces `MaxConnections`; the idle reaper closes
//! connections whose last activity exceeds the configured timeout;
//! broadcast fans a notification to every Ready connection with
//! per-connection failure isolation.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use chrono::{TimeDelta, Utc};
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

// Layer 3: Internal module imports
use super::connection::{Connection, ConnectionError};
use crate::protocol::constants::defaults;
use crate::protocol::{JsonRpcMessage, JsonRpcNotification};

/// Connection manager configuration
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Maximum concurrent connections
    pub max_connections: usize,

    /// Close connections idle longer than this; `None` disables the reaper
    pub idle_timeout: Option<TimeDelta>,

    /// How often the idle reaper wakes
    pub reap_interval: Duration,

    /// Depth of each connection's bounded outbound queue
    pub send_queue_capacity: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            max_connections: defaults::MAX_CONNECTIONS,
            idle_timeout: Some(TimeDelta::seconds(defaults::IDLE_TIMEOUT_SECS)),
            reap_interval: Duration::from_secs(60),
            send_queue_capacity: defaults::SEND_QUEUE_CAPACITY,
        }
    }
}

/// Owner of all live connections, keyed by id
#[derive(Debug)]
pub struct ConnectionManager {
    connections: DashMap<String, Arc<Connection>>,
    config: ConnectionConfig,
}

impl ConnectionManager {
    /// Create a manager
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            connections: DashMap::new(),
            config,
        }
    }

    /// The manager's configuration
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Create and register a connection
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError::LimitExceeded` at `MaxConnections`; the
    /// connection is never observable in that case.
    pub fn open(
        &self,
    ) -> Result<(Arc<Connection>, tokio::sync::mpsc::Receiver<JsonRpcMessage>), ConnectionError>
    {
        if self.connections.len() >= self.config.max_connections {
            warn!(
                limit = self.config.max_connections,
                "connection rejected: limit reached"
            );
            return Err(ConnectionError::LimitExceeded);
        }

        let (connection, receiver) = Connection::new(self.config.send_queue_capacity);
        let connection = Arc::new(connection);
        self.connections
            .insert(connection.id().to_string(), Arc::clone(&connection));
        debug!(connection = %connection.id(), "connection registered");
        Ok((connection, receiver))
    }

    /// Remove a connection from the map
    pub fn deregister(&self, id: &str) -> Option<Arc<Connection>> {
        let removed = self.connections.remove(id).map(|(_, conn)| conn);
        if removed.is_some() {
            debug!(connection = %id, "connection deregistered");
        }
        removed
    }

    /// Look up a connection by id
    pub fn get(&self, id: &str) -> Option<Arc<Connection>> {
        self.connections.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Ids of all live connections
    pub fn ids(&self) -> Vec<String> {
        self.connections
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Number of live connections
    pub fn count(&self) -> usize {
        self.connections.len()
    }

    /// Enqueue a message to one connection by id
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError::NotFound` for unknown ids and
    /// `SendChannelClosed` when the connection is tearing down.
    pub async fn send_to(
        &self,
        id: &str,
        message: JsonRpcMessage,
    ) -> Result<(), ConnectionError> {
        let connection = self
            .get(id)
            .ok_or_else(|| ConnectionError::NotFound(id.to_string()))?;
        connection.send(message).await
    }

    /// Fan a notification out to every Ready connection
    ///
    /// `exclude` skips one connection id (typically the originator). A
    /// failing send is logged and never prevents delivery to the others.
    /// Returns the number of connections the notification was enqueued to.
    pub async fn broadcast(
        &self,
        notification: JsonRpcNotification,
        exclude: Option<&str>,
    ) -> usize {
        let targets: Vec<Arc<Connection>> = self
            .connections
            .iter()
            .filter(|entry| Some(entry.key().as_str()) != exclude)
            .filter(|entry| entry.value().state().is_ready())
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut delivered = 0;
        for connection in targets {
            match connection
                .send(JsonRpcMessage::Notification(notification.clone()))
                .await
            {
                Ok(()) => delivered += 1,
                Err(error) => {
                    warn!(connection = %connection.id(), %error, "broadcast send failed");
                }
            }
        }
        delivered
    }

    /// Fan a notification out to Ready connections subscribed to `uri`
    pub async fn fan_out_to_subscribers(
        &self,
        uri: &str,
        notification: JsonRpcNotification,
    ) -> usize {
        let targets: Vec<Arc<Connection>> = self
            .connections
            .iter()
            .filter(|entry| entry.value().state().is_ready())
            .filter(|entry| entry.value().is_subscribed(uri))
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut delivered = 0;
        for connection in targets {
            match connection
                .send(JsonRpcMessage::Notification(notification.clone()))
                .await
            {
                Ok(()) => delivered += 1,
                Err(error) => {
                    warn!(connection = %connection.id(), %error, "subscription fan-out failed");
                }
            }
        }
        delivered
    }

    /// Begin teardown of every connection
    pub fn close_all(&self, reason: &str) {
        for entry in self.connections.iter() {
            entry.value().begin_close(reason);
        }
    }

    /// Close connections idle beyond the configured timeout
    ///
    /// Returns the ids of the connections closed. Callable directly for
    /// deterministic tests; the reaper task invokes it periodically.
    pub fn reap_idle(&self) -> Vec<String> {
        let Some(timeout) = self.config.idle_timeout else {
            return Vec::new();
        };
        let now = Utc::now();

        let stale: Vec<Arc<Connection>> = self
            .connections
            .iter()
            .filter(|entry| !entry.value().state().is_terminal())
            .filter(|entry| entry.value().idle_for(now) > timeout)
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        stale
            .into_iter()
            .map(|connection| {
                debug!(connection = %connection.id(), "closing idle connection");
                connection.begin_close("idle");
                connection.id().to_string()
            })
            .collect()
    }

    /// Start the idle reaper task; runs until `shutdown` is cancelled
    pub fn start_idle_reaper(self: &Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        let reap_interval = manager.config.reap_interval;
        tokio::spawn(async move {
            let mut ticker = interval(reap_interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        manager.reap_idle();
                    }
                    _ = shutdown.cancelled() => break,
                }
            }
            debug!("idle reaper shut down");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::state::ConnectionState;
    use serde_json::json;

    fn manager(max: usize) -> ConnectionManager {
        ConnectionManager::new(ConnectionConfig {
            max_connections: max,
            ..Default::default()
        })
    }

    fn make_ready(connection: &Arc<Connection>) {
        connection.transition_to(ConnectionState::Connected).unwrap();
        connection
            .transition_to(ConnectionState::Initialized)
            .unwrap();
        connection.transition_to(ConnectionState::Ready).unwrap();
    }

    #[test]
    fn enforces_max_connections() {
        let manager = manager(2);
        let (_a, _ra) = manager.open().unwrap();
        let (_b, _rb) = manager.open().unwrap();
        assert!(matches!(
            manager.open(),
            Err(ConnectionError::LimitExceeded)
        ));
        assert_eq!(manager.count(), 2);
    }

    #[test]
    fn deregister_frees_a_slot() {
        let manager = manager(1);
        let (a, _ra) = manager.open().unwrap();
        assert!(manager.open().is_err());
        manager.deregister(a.id());
        assert!(manager.open().is_ok());
    }

    #[tokio::test]
    async fn broadcast_reaches_only_ready_connections() {
        let manager = manager(8);
        let (ready, mut ready_rx) = manager.open().unwrap();
        let (pending, mut pending_rx) = manager.open().unwrap();
        make_ready(&ready);

        let delivered = manager
            .broadcast(
                JsonRpcNotification::new("notifications/tools/list_changed", None),
                None,
            )
            .await;
        assert_eq!(delivered, 1);
        assert!(ready_rx.try_recv().is_ok());
        assert!(pending_rx.try_recv().is_err());
        drop(pending);
    }

    #[tokio::test]
    async fn broadcast_excludes_requested_connection() {
        let manager = manager(8);
        let (a, mut a_rx) = manager.open().unwrap();
        let (b, mut b_rx) = manager.open().unwrap();
        make_ready(&a);
        make_ready(&b);

        let delivered = manager
            .broadcast(
                JsonRpcNotification::new("notifications/prompts/list_changed", None),
                Some(a.id()),
            )
            .await;
        assert_eq!(delivered, 1);
        assert!(a_rx.try_recv().is_err());
        assert!(b_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn one_failed_send_does_not_block_others() {
        let manager = manager(8);
        let (broken, broken_rx) = manager.open().unwrap();
        let (healthy, mut healthy_rx) = manager.open().unwrap();
        make_ready(&broken);
        make_ready(&healthy);
        drop(broken_rx); // Simulate a dead egress task.

        let delivered = manager
            .broadcast(
                JsonRpcNotification::new("notifications/resources/list_changed", None),
                None,
            )
            .await;
        assert_eq!(delivered, 1);
        assert!(healthy_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn subscription_fan_out_targets_subscribers_only() {
        let manager = manager(8);
        let (subscriber, mut sub_rx) = manager.open().unwrap();
        let (other, mut other_rx) = manager.open().unwrap();
        make_ready(&subscriber);
        make_ready(&other);
        subscriber.subscribe("file:///a/b.txt");

        let delivered = manager
            .fan_out_to_subscribers(
                "file:///a/b.txt",
                JsonRpcNotification::new(
                    "notifications/resources/updated",
                    Some(json!({"uri": "file:///a/b.txt"})),
                ),
            )
            .await;
        assert_eq!(delivered, 1);
        assert!(sub_rx.try_recv().is_ok());
        assert!(other_rx.try_recv().is_err());
    }

    #[test]
    fn reap_idle_closes_only_stale_connections() {
        let manager = Arc::new(ConnectionManager::new(ConnectionConfig {
            idle_timeout: Some(TimeDelta::milliseconds(1)),
            ..Default::default()
        }));
        let (stale, _stale_rx) = manager.open().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(10));
        let (fresh, _fresh_rx) = manager.open().unwrap();

        let reaped = manager.reap_idle();
        assert_eq!(reaped, vec![stale.id().to_string()]);
        assert_eq!(stale.close_reason().as_deref(), Some("idle"));
        assert!(fresh.close_reason().is_none());
    }

    #[test]
    fn close_all_marks_every_connection() {
        let manager = manager(4);
        let (a, _ra) = manager.open().unwrap();
        let (b, _rb) = manager.open().unwrap();
        manager.close_all("shutdown");
        assert_eq!(a.close_reason().as_deref(), Some("shutdown"));
        assert_eq!(b.close_reason().as_deref(), Some("shutdown"));
    }
}
