//! The connection manager: owns the one channel to the game server.
//!
//! Responsibilities:
//! - Opening the channel and reopening it, forever, after every loss
//! - Reading inbound frames in arrival order
//! - Writing outbound actions while connected
//!
//! # Concurrency note
//!
//! `ConnectionManager` never mutates itself from a background task. The
//! helper tasks it spawns (connect attempt, reader, retry timer) only push
//! a [`ChannelEvent`] into the owner's queue; the owner hands each one
//! back through [`handle`](ConnectionManager::handle). Every event carries
//! the generation it was spawned under, and anything from an older
//! generation is dropped, so a late close from a dead channel can never
//! tear down its replacement.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use wizsync_protocol::{ClientAction, JsonCodec};
use wizsync_transport::{Connection, Connector};

use crate::{ConnectionConfig, ConnectionState, PlayerId, SessionError};

/// What a helper task reports back to the manager's owner.
pub enum ChannelEvent<T> {
    /// A connect attempt produced an open channel.
    Opened { generation: u64, connection: Arc<T> },
    /// A connect attempt failed.
    OpenFailed { generation: u64, reason: String },
    /// One inbound frame.
    Frame { generation: u64, data: Vec<u8> },
    /// The channel closed or broke.
    Closed { generation: u64, reason: String },
    /// The reconnect delay has elapsed.
    RetryDue { generation: u64 },
}

impl<T> ChannelEvent<T> {
    /// The generation this event was produced under.
    pub fn generation(&self) -> u64 {
        match self {
            Self::Opened { generation, .. }
            | Self::OpenFailed { generation, .. }
            | Self::Frame { generation, .. }
            | Self::Closed { generation, .. }
            | Self::RetryDue { generation } => *generation,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Opened { .. } => "opened",
            Self::OpenFailed { .. } => "open_failed",
            Self::Frame { .. } => "frame",
            Self::Closed { .. } => "closed",
            Self::RetryDue { .. } => "retry_due",
        }
    }
}

/// What the manager surfaces after handling a [`ChannelEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// The channel is open.
    Connected,
    /// The channel was lost, or an attempt to open it failed. A retry is
    /// already scheduled.
    Disconnected { reason: String },
    /// One inbound frame, unparsed.
    Frame(Vec<u8>),
}

/// Owns the connection to the game server.
///
/// `E` is the owner's queue item type. Helper tasks convert their
/// [`ChannelEvent`]s into it, so the owner can multiplex channel activity
/// with its own commands on one queue.
///
/// ## Lifecycle
///
/// ```text
/// connect() ──→ [Connecting] ──Opened──→ [Connected]
///                    │                       │
///               OpenFailed            Closed / failed send
///                    ▼                       ▼
///              [Disconnected] ←──────────────┘
///                    │
///          sleep(reconnect_delay)
///                    ▼
///                RetryDue ──→ connect()
/// ```
pub struct ConnectionManager<C: Connector, E> {
    connector: Arc<C>,
    player_id: PlayerId,
    url: String,
    config: ConnectionConfig,
    state: ConnectionState,

    /// Bumped on every connect attempt and every loss.
    generation: u64,

    active: Option<Arc<C::Connection>>,
    reader: Option<JoinHandle<()>>,

    /// The in-flight connect attempt or the retry timer; never both.
    pending: Option<JoinHandle<()>>,

    events: mpsc::UnboundedSender<E>,
    attempts: u64,
    closed: bool,
}

impl<C, E> ConnectionManager<C, E>
where
    C: Connector,
    E: From<ChannelEvent<C::Connection>> + Send + 'static,
{
    /// Creates a manager in the `Disconnected` state. Nothing is spawned
    /// until [`connect`](Self::connect) is called.
    pub fn new(
        connector: Arc<C>,
        player_id: PlayerId,
        config: ConnectionConfig,
        events: mpsc::UnboundedSender<E>,
    ) -> Self {
        let url = config.url_for(&player_id);
        Self {
            connector,
            player_id,
            url,
            config,
            state: ConnectionState::Disconnected,
            generation: 0,
            active: None,
            reader: None,
            pending: None,
            events,
            attempts: 0,
            closed: false,
        }
    }

    /// Starts a connect attempt.
    ///
    /// Only acts in `Disconnected`; while connecting or connected this is a
    /// no-op.
    ///
    /// # Errors
    /// Returns [`SessionError::Closed`] after [`close`](Self::close).
    pub fn connect(&mut self) -> Result<(), SessionError> {
        if self.closed {
            return Err(SessionError::Closed);
        }
        if self.state != ConnectionState::Disconnected {
            tracing::trace!(state = %self.state, "connect ignored");
            return Ok(());
        }

        self.generation += 1;
        self.attempts += 1;
        self.state = ConnectionState::Connecting;

        let generation = self.generation;
        let connector = Arc::clone(&self.connector);
        let url = self.url.clone();
        let events = self.events.clone();

        tracing::debug!(url = %self.url, attempt = self.attempts, "connecting");

        let attempt = tokio::spawn(async move {
            let event = match connector.connect(&url).await {
                Ok(connection) => ChannelEvent::Opened {
                    generation,
                    connection: Arc::new(connection),
                },
                Err(e) => ChannelEvent::OpenFailed {
                    generation,
                    reason: e.to_string(),
                },
            };
            let _ = events.send(E::from(event));
        });
        if let Some(previous) = self.pending.replace(attempt) {
            previous.abort();
        }
        Ok(())
    }

    /// Applies one event from a helper task.
    ///
    /// Returns what the owner should surface, if anything. Events from an
    /// older generation and everything after [`close`](Self::close) are
    /// ignored.
    pub fn handle(&mut self, event: ChannelEvent<C::Connection>) -> Option<ConnectionEvent> {
        if self.closed || event.generation() != self.generation {
            tracing::trace!(
                kind = event.kind(),
                generation = event.generation(),
                current = self.generation,
                "stale channel event dropped"
            );
            return None;
        }

        match event {
            ChannelEvent::Opened { connection, .. } => {
                self.pending = None;
                self.state = ConnectionState::Connected;
                self.reader = Some(self.spawn_reader(Arc::clone(&connection)));
                tracing::info!(
                    player_id = %self.player_id,
                    connection_id = %connection.id(),
                    url = %self.url,
                    "connected"
                );
                self.active = Some(connection);
                Some(ConnectionEvent::Connected)
            }
            ChannelEvent::OpenFailed { reason, .. } => {
                self.pending = None;
                tracing::warn!(url = %self.url, error = %reason, "connect failed");
                self.lose(reason)
            }
            ChannelEvent::Frame { data, .. } => {
                tracing::debug!(bytes = data.len(), "frame received");
                Some(ConnectionEvent::Frame(data))
            }
            ChannelEvent::Closed { reason, .. } => {
                tracing::warn!(player_id = %self.player_id, reason = %reason, "connection lost");
                self.lose(reason)
            }
            ChannelEvent::RetryDue { .. } => {
                self.pending = None;
                // `closed` was checked above, so this cannot fail.
                let _ = self.connect();
                None
            }
        }
    }

    /// Encodes `action` and writes it as one text frame.
    ///
    /// # Errors
    /// - [`SessionError::NotConnected`]: no open channel, nothing written
    /// - [`SessionError::Transport`]: the write failed; the channel is
    ///   reported lost and a reconnect follows
    /// - [`SessionError::Closed`]: the manager was closed
    pub async fn send(&self, action: &ClientAction) -> Result<(), SessionError> {
        if self.closed {
            return Err(SessionError::Closed);
        }
        let connection = match (&self.active, self.state) {
            (Some(connection), ConnectionState::Connected) => Arc::clone(connection),
            (_, state) => return Err(SessionError::NotConnected(state)),
        };

        let text = JsonCodec.encode_action(action)?;
        if let Err(e) = connection.send(&text).await {
            // Routed through the queue like any other loss, so it is
            // deduplicated against the reader's own close report.
            let _ = self.events.send(E::from(ChannelEvent::Closed {
                generation: self.generation,
                reason: format!("send failed: {e}"),
            }));
            return Err(e.into());
        }
        tracing::debug!(action = %action.kind(), "action sent");
        Ok(())
    }

    /// Stops for good: cancels the retry timer and any connect attempt,
    /// stops the reader and closes the channel.
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.generation += 1;
        self.abort_tasks();
        if let Some(connection) = self.active.take() {
            if let Err(e) = connection.close().await {
                tracing::debug!(error = %e, "close failed");
            }
        }
        self.state = ConnectionState::Disconnected;
        tracing::info!(player_id = %self.player_id, "connection manager closed");
    }

    /// Current channel state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Number of connect attempts started so far.
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn player_id(&self) -> &PlayerId {
        &self.player_id
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    // -- internals --------------------------------------------------------

    /// Marks the channel lost and schedules the single retry for it.
    fn lose(&mut self, reason: String) -> Option<ConnectionEvent> {
        if self.state == ConnectionState::Disconnected {
            return None;
        }
        self.state = ConnectionState::Disconnected;
        self.generation += 1;
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        if let Some(connection) = self.active.take() {
            tokio::spawn(async move {
                let _ = connection.close().await;
            });
        }
        self.schedule_retry();
        Some(ConnectionEvent::Disconnected { reason })
    }

    fn schedule_retry(&mut self) {
        let generation = self.generation;
        let delay = self.config.reconnect_delay;
        let events = self.events.clone();
        tracing::debug!(delay = ?delay, "reconnect scheduled");

        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(E::from(ChannelEvent::RetryDue { generation }));
        });
        if let Some(previous) = self.pending.replace(timer) {
            previous.abort();
        }
    }

    fn spawn_reader(&self, connection: Arc<C::Connection>) -> JoinHandle<()> {
        let generation = self.generation;
        let events = self.events.clone();
        tokio::spawn(async move {
            loop {
                let (event, done) = match connection.recv().await {
                    Ok(Some(data)) => (ChannelEvent::Frame { generation, data }, false),
                    Ok(None) => (
                        ChannelEvent::Closed {
                            generation,
                            reason: "closed by server".to_string(),
                        },
                        true,
                    ),
                    Err(e) => (
                        ChannelEvent::Closed {
                            generation,
                            reason: e.to_string(),
                        },
                        true,
                    ),
                };
                if events.send(E::from(event)).is_err() || done {
                    break;
                }
            }
        })
    }

    fn abort_tasks(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

impl<C: Connector, E> Drop for ConnectionManager<C, E> {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
