//! Server Core Runtime
//!
//! Ties the router to transports. `accept` registers a connection and
//! spawns its two tasks: the ingress task reads frames and dispatches
//! through the router; the egress task drains the connection's bounded
//! send channel into the transport sink. Background pumps translate
//! registry events and provider change events into notifications, and
//! sweepers reap idle state. `shutdown` closes every connection, cancels
//! in-flight work and drains send channels with a deadline before
//! discarding.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use futures::future::join_all;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

// Layer 3: Internal module imports
use super::context::ServerContext;
use crate::connection::{Connection, ConnectionError, ConnectionState};
use crate::progress::CONNECTION_CLOSED_REASON;
use crate::protocol::constants::defaults;
use crate::protocol::{JsonRpcMessage, JsonRpcMessageTrait, LogLevel};
use crate::routing::MessageRouter;
use crate::transport::{FrameReceiver, FrameSink, Transport};

/// Which registry family changed, for the list-changed pump
#[derive(Debug, Clone, Copy)]
enum RegistryEventKind {
    Tools,
    Resources,
    Prompts,
    Roots,
}

/// A running MCP server core
pub struct McpServer {
    context: Arc<ServerContext>,
    router: Arc<MessageRouter>,
    shutdown: CancellationToken,
    background: Mutex<Vec<JoinHandle<()>>>,
    connection_tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl McpServer {
    /// Start the server over a built context, spawning pumps and sweepers
    pub(crate) fn start(context: Arc<ServerContext>) -> Self {
        let shutdown = CancellationToken::new();
        let router = Arc::new(MessageRouter::new(Arc::clone(&context)));

        let mut background = Vec::new();

        if let Some(limiter) = &context.rate_limiter {
            background.push(limiter.start_sweeper(shutdown.clone()));
        }
        background.push(context.progress.start_sweeper(shutdown.clone()));
        background.push(context.sampling.table().start_sweeper(
            Duration::from_secs(defaults::SWEEP_INTERVAL_SECS),
            shutdown.clone(),
        ));
        background.push(context.connections.start_idle_reaper(shutdown.clone()));
        if let Some(sessions) = &context.sessions {
            background.push(sessions.start_sweeper(shutdown.clone()));
        }
        background.push(Self::start_registry_pump(&context, shutdown.clone()));
        background.push(Self::start_resource_change_pump(&context, shutdown.clone()));

        info!(
            server = %context.config.server_info.name,
            version = %context.config.server_info.version,
            "server core started"
        );

        Self {
            context,
            router,
            shutdown,
            background: Mutex::new(background),
            connection_tasks: Mutex::new(Vec::new()),
        }
    }

    /// The shared context (registries, bus, managers)
    pub fn context(&self) -> &Arc<ServerContext> {
        &self.context
    }

    /// Emit an application log message through the notification bus
    pub async fn log(&self, level: LogLevel, logger: Option<&str>, data: serde_json::Value) {
        self.context.bus.log(level, logger, data).await;
    }

    /// Registry mutations become list-changed broadcasts
    ///
    /// Observers fire synchronously inside the registries; they push onto
    /// an unbounded channel so the mutation commit never awaits, and this
    /// pump performs the actual broadcast.
    fn start_registry_pump(
        context: &Arc<ServerContext>,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        let (events_tx, mut events_rx) = mpsc::unbounded_channel::<RegistryEventKind>();

        let tx = events_tx.clone();
        context.tools.subscribe(Arc::new(move |_| {
            let _ = tx.send(RegistryEventKind::Tools);
        }));
        let tx = events_tx.clone();
        context.resources.subscribe_events(Arc::new(move |_| {
            let _ = tx.send(RegistryEventKind::Resources);
        }));
        let tx = events_tx.clone();
        context.prompts.subscribe_events(Arc::new(move |_| {
            let _ = tx.send(RegistryEventKind::Prompts);
        }));
        let tx = events_tx;
        context.roots.subscribe_events(Arc::new(move |_| {
            let _ = tx.send(RegistryEventKind::Roots);
        }));

        let context = Arc::clone(context);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    event = events_rx.recv() => match event {
                        Some(RegistryEventKind::Tools) => context.bus.tools_list_changed().await,
                        Some(RegistryEventKind::Resources) => {
                            context.bus.resources_list_changed().await
                        }
                        Some(RegistryEventKind::Prompts) => context.bus.prompts_list_changed().await,
                        Some(RegistryEventKind::Roots) => context.bus.roots_list_changed().await,
                        None => break,
                    },
                    _ = shutdown.cancelled() => break,
                }
            }
            debug!("registry pump shut down");
        })
    }

    /// Provider change events become subscription-scoped updates
    fn start_resource_change_pump(
        context: &Arc<ServerContext>,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        let Some(mut changes) = context.resources.take_change_stream() else {
            // Stream already taken by an earlier server over this registry.
            return tokio::spawn(async {});
        };

        let context = Arc::clone(context);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    uri = changes.recv() => match uri {
                        Some(uri) => {
                            context.bus.resource_updated(&uri).await;
                        }
                        None => break,
                    },
                    _ = shutdown.cancelled() => break,
                }
            }
            debug!("resource change pump shut down");
        })
    }

    /// Accept a transport and run it as a connection
    ///
    /// Spawns the connection's ingress and egress tasks and returns the
    /// connection handle (hosts attach authenticated principals to it).
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError::LimitExceeded` at `MaxConnections`.
    pub async fn accept<T: Transport>(
        &self,
        transport: T,
    ) -> Result<Arc<Connection>, ConnectionError> {
        let (connection, outbound_rx) = self.context.connections.open()?;
        let (frame_rx, frame_sink) = transport.split();

        let egress = tokio::spawn(Self::run_egress(
            Arc::clone(&connection),
            outbound_rx,
            frame_sink,
            self.context.config.drain_deadline,
        ));
        let ingress = tokio::spawn(Self::run_ingress(
            Arc::clone(&self.router),
            Arc::clone(&connection),
            frame_rx,
            self.shutdown.clone(),
        ));

        let mut tasks = self.connection_tasks.lock().await;
        tasks.push(egress);
        tasks.push(ingress);

        Ok(connection)
    }

    /// Ingress: read frames, dispatch, tear down on EOF or close
    async fn run_ingress<R: FrameReceiver>(
        router: Arc<MessageRouter>,
        connection: Arc<Connection>,
        mut frames: R,
        shutdown: CancellationToken,
    ) {
        if connection
            .transition_to(ConnectionState::Connected)
            .is_err()
        {
            return;
        }
        debug!(connection = %connection.id(), "ingress started");

        let closed_token = connection.closed_token();
        loop {
            tokio::select! {
                frame = frames.recv() => match frame {
                    Some(Ok(raw)) => {
                        router.dispatch_frame(&connection, &raw).await;
                    }
                    Some(Err(error)) => {
                        warn!(connection = %connection.id(), %error, "transport fault");
                        connection.begin_close("transport error");
                        break;
                    }
                    None => {
                        connection.begin_close("transport eof");
                        break;
                    }
                },
                _ = closed_token.cancelled() => break,
                _ = shutdown.cancelled() => {
                    connection.begin_close("server shutdown");
                    break;
                }
            }
        }

        Self::teardown(router.server(), &connection);
    }

    /// Egress: drain the bounded channel into the sink
    async fn run_egress<S: FrameSink>(
        connection: Arc<Connection>,
        mut outbound: mpsc::Receiver<JsonRpcMessage>,
        mut sink: S,
        drain_deadline: Duration,
    ) {
        let closed_token = connection.closed_token();
        loop {
            tokio::select! {
                message = outbound.recv() => match message {
                    Some(message) => {
                        let frame = match message.to_json() {
                            Ok(frame) => frame,
                            Err(error) => {
                                warn!(connection = %connection.id(), %error, "outbound encode failed");
                                continue;
                            }
                        };
                        if let Err(error) = sink.send(frame).await {
                            warn!(connection = %connection.id(), %error, "transport write failed");
                            connection.begin_close("transport write failed");
                            break;
                        }
                    }
                    None => break,
                },
                _ = closed_token.cancelled() => {
                    // Drain queued messages (cancelled handlers still flush
                    // their final responses), bounded by the deadline; a
                    // short quiet period means the queue is dry.
                    let deadline = tokio::time::Instant::now() + drain_deadline;
                    let quiet = Duration::from_millis(50);
                    while tokio::time::Instant::now() < deadline {
                        match tokio::time::timeout(quiet, outbound.recv()).await {
                            Ok(Some(message)) => {
                                let Ok(frame) = message.to_json() else { continue };
                                if sink.send(frame).await.is_err() {
                                    break;
                                }
                            }
                            Ok(None) | Err(_) => break,
                        }
                    }
                    break;
                }
            }
        }
        let _ = sink.close().await;
        debug!(connection = %connection.id(), "egress finished");
    }

    /// Final connection teardown: cancel in-flight work, drop state
    fn teardown(context: &Arc<ServerContext>, connection: &Arc<Connection>) {
        let cancelled = context
            .cancellations
            .cancel_all_for_connection(connection.id());
        if cancelled > 0 {
            debug!(
                connection = %connection.id(),
                cancelled,
                reason = CONNECTION_CLOSED_REASON,
                "in-flight requests cancelled at teardown"
            );
        }
        context.progress.drop_for_connection(connection.id());
        context.connections.deregister(connection.id());
        let _ = connection.transition_to(ConnectionState::Closed);
        info!(
            connection = %connection.id(),
            reason = connection.close_reason().as_deref().unwrap_or("eof"),
            "connection closed"
        );
    }

    /// Shut the server down
    ///
    /// Closes every connection, cancels all in-flight operations, releases
    /// sampling waiters and stops background tasks. Pending send channels
    /// get the configured drain deadline before being discarded.
    pub async fn shutdown(&self) {
        info!("server core shutting down");
        self.shutdown.cancel();
        self.context.connections.close_all("server shutdown");
        self.context.sampling.drain();

        let connection_tasks: Vec<JoinHandle<()>> =
            self.connection_tasks.lock().await.drain(..).collect();
        let drain = self.context.config.drain_deadline + Duration::from_secs(1);
        if tokio::time::timeout(drain, join_all(connection_tasks))
            .await
            .is_err()
        {
            warn!("connection tasks did not finish within the drain deadline");
        }

        let background: Vec<JoinHandle<()>> = self.background.lock().await.drain(..).collect();
        if tokio::time::timeout(Duration::from_secs(2), join_all(background))
            .await
            .is_err()
        {
            warn!("background tasks did not finish promptly");
        }
    }
}

impl std::fmt::Debug for McpServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpServer")
            .field("server", &self.context.config.server_info.name)
            .field("connections", &self.context.connections.count())
            .finish()
    }
}
