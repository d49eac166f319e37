//! `WizardSession` builder, handle and event loop.
//!
//! This is the entry point for a game client. It ties together all the
//! layers: transport → session → state, and runs them on one Tokio task.
//!
//! Everything that can change the session (a channel event, a player
//! gesture, a close request) is a [`LoopEvent`] on a single queue, handled
//! to completion before the next one is looked at. Observer events leave
//! through a second task, so a slow observer never holds up the loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use wizsync_protocol::{Card, ClientAction};
use wizsync_session::{
    ChannelEvent, ConnectionConfig, ConnectionEvent, ConnectionManager, ConnectionState,
    PlayerId,
};
use wizsync_state::{ActionSubmitter, AllowedActions, Intent, Reconciler, SyncError};
use wizsync_transport::{Connector, WebSocketConnector};

use crate::{DEFAULT_EVENT_CHANNEL_CAPACITY, SessionEvent, WizsyncError};

/// Items on the session loop's queue.
pub(crate) enum LoopEvent<T> {
    Channel(ChannelEvent<T>),
    Command(Command),
}

impl<T> From<ChannelEvent<T>> for LoopEvent<T> {
    fn from(event: ChannelEvent<T>) -> Self {
        Self::Channel(event)
    }
}

/// Requests from a [`SessionHandle`].
pub(crate) enum Command {
    Submit {
        intent: Intent,
        reply: oneshot::Sender<Result<ClientAction, SyncError>>,
    },
    Close {
        reply: oneshot::Sender<()>,
    },
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for configuring and starting a [`WizardSession`].
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use wizsync::prelude::*;
///
/// # async fn demo() {
/// let (handle, mut events) = WizardSession::builder()
///     .host("cards.example.org:8000")
///     .reconnect_delay(Duration::from_secs(2))
///     .start_websocket();
///
/// while let Some(event) = events.recv().await {
///     if let SessionEvent::AffordancesChanged(allowed) = event {
///         if allowed.ready {
///             let _ = handle.ready().await;
///         }
///     }
/// }
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SessionBuilder {
    config: ConnectionConfig,
    player_id: Option<PlayerId>,
    event_channel_capacity: usize,
}

impl SessionBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ConnectionConfig::default(),
            player_id: None,
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
        }
    }

    /// Sets the game server's `host[:port]`.
    pub fn host(mut self, host: &str) -> Self {
        self.config.host = host.to_string();
        self
    }

    /// Connects with `wss://` instead of `ws://`.
    pub fn secure(mut self, secure: bool) -> Self {
        self.config.secure = secure;
        self
    }

    /// Sets the pause between a lost channel and the next attempt.
    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.config.reconnect_delay = delay;
        self
    }

    /// Replaces the whole connection configuration.
    pub fn connection_config(mut self, config: ConnectionConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the observer channel capacity (minimum 1).
    pub fn event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity.max(1);
        self
    }

    /// Uses a fixed player id instead of generating one.
    pub fn player_id(mut self, player_id: PlayerId) -> Self {
        self.player_id = Some(player_id);
        self
    }

    /// Spawns the session loop over `connector` and starts connecting.
    ///
    /// Must be called from within a Tokio runtime. Returns the handle for
    /// submitting actions and the observer's event stream.
    pub fn start<C: Connector>(self, connector: C) -> (SessionHandle<C>, mpsc::Receiver<SessionEvent>) {
        let player_id = self.player_id.unwrap_or_else(PlayerId::generate);
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let (outbox_tx, outbox_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::channel(self.event_channel_capacity);

        let manager = ConnectionManager::new(
            Arc::new(connector),
            player_id.clone(),
            self.config,
            queue_tx.clone(),
        );
        tracing::info!(%player_id, url = %manager.url(), "starting session");

        let session = WizardSession {
            manager,
            reconciler: Reconciler::new(),
            submitter: ActionSubmitter::new(),
            queue: queue_rx,
            outbox: outbox_tx,
            affordances: None,
        };
        tokio::spawn(forward_events(outbox_rx, events_tx));
        let task = tokio::spawn(session.run());

        let handle = SessionHandle {
            player_id,
            commands: queue_tx,
            task,
        };
        (handle, events_rx)
    }

    /// [`start`](Self::start) over a real WebSocket.
    pub fn start_websocket(self) -> (SessionHandle, mpsc::Receiver<SessionEvent>) {
        self.start(WebSocketConnector::new())
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// The user's side of a running session.
///
/// Dropping the handle stops the session loop.
pub struct SessionHandle<C: Connector = WebSocketConnector> {
    player_id: PlayerId,
    commands: mpsc::UnboundedSender<LoopEvent<C::Connection>>,
    task: JoinHandle<()>,
}

impl<C: Connector> SessionHandle<C> {
    pub fn player_id(&self) -> &PlayerId {
        &self.player_id
    }

    /// Submits a gesture. Resolves once the loop has gated it and, if
    /// allowed, written it.
    ///
    /// # Errors
    /// - [`WizsyncError::Sync`] with `ActionNotAllowed` or `ActionLost`
    /// - [`WizsyncError::SessionClosed`] if the loop has stopped
    pub async fn submit(&self, intent: Intent) -> Result<ClientAction, WizsyncError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(LoopEvent::Command(Command::Submit { intent, reply }))
            .map_err(|_| WizsyncError::SessionClosed)?;
        let result = response.await.map_err(|_| WizsyncError::SessionClosed)?;
        Ok(result?)
    }

    pub async fn ready(&self) -> Result<ClientAction, WizsyncError> {
        self.submit(Intent::Ready).await
    }

    pub async fn bid(&self, n_tricks: i64) -> Result<ClientAction, WizsyncError> {
        self.submit(Intent::Bid(n_tricks)).await
    }

    pub async fn play_card(&self, card: Card) -> Result<ClientAction, WizsyncError> {
        self.submit(Intent::PlayCard(card)).await
    }

    /// Stops the session: cancels any pending reconnect and closes the
    /// channel. Actions still in flight are not guaranteed delivered.
    ///
    /// # Errors
    /// Returns [`WizsyncError::SessionClosed`] if the loop already stopped.
    pub async fn close(&self) -> Result<(), WizsyncError> {
        let (reply, done) = oneshot::channel();
        self.commands
            .send(LoopEvent::Command(Command::Close { reply }))
            .map_err(|_| WizsyncError::SessionClosed)?;
        done.await.map_err(|_| WizsyncError::SessionClosed)
    }

    /// Whether the session loop has stopped.
    pub fn is_closed(&self) -> bool {
        self.task.is_finished()
    }
}

impl<C: Connector> Drop for SessionHandle<C> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// ---------------------------------------------------------------------------
// Session loop
// ---------------------------------------------------------------------------

/// A running game client: one connection, one snapshot, one gate.
///
/// Owned entirely by its loop task. Create one with
/// [`WizardSession::builder`] and talk to it through the returned
/// [`SessionHandle`].
pub struct WizardSession<C: Connector> {
    manager: ConnectionManager<C, LoopEvent<C::Connection>>,
    reconciler: Reconciler,
    submitter: ActionSubmitter,
    queue: mpsc::UnboundedReceiver<LoopEvent<C::Connection>>,
    /// Drained by [`forward_events`].
    outbox: mpsc::UnboundedSender<SessionEvent>,
    /// Last affordances reported, to suppress repeats.
    affordances: Option<AllowedActions>,
}

impl WizardSession<WebSocketConnector> {
    /// Creates a new builder.
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }
}

impl<C: Connector> WizardSession<C> {
    async fn run(mut self) {
        if let Err(e) = self.manager.connect() {
            tracing::error!(error = %e, "session could not start");
            return;
        }
        self.publish_affordances();

        while let Some(event) = self.queue.recv().await {
            match event {
                LoopEvent::Channel(event) => match self.manager.handle(event) {
                    Some(ConnectionEvent::Connected) => {
                        // Each connection is a fresh player to the server.
                        self.reconciler.reset_baseline();
                        self.submitter.gate_mut().reset();
                        self.publish(SessionEvent::Connected);
                        self.publish_affordances();
                    }
                    Some(ConnectionEvent::Disconnected { reason }) => {
                        self.publish(SessionEvent::Disconnected { reason });
                        self.publish_affordances();
                    }
                    Some(ConnectionEvent::Frame(data)) => self.on_frame(&data),
                    None => {}
                },
                LoopEvent::Command(Command::Submit { intent, reply }) => {
                    let snapshot = self.reconciler.current_arc();
                    let result = self
                        .submitter
                        .submit(intent, snapshot.as_deref(), &mut self.manager)
                        .await;
                    let _ = reply.send(result);
                    self.publish_affordances();
                }
                LoopEvent::Command(Command::Close { reply }) => {
                    self.manager.close().await;
                    let _ = reply.send(());
                    break;
                }
            }
        }

        tracing::info!(player_id = %self.manager.player_id(), "session loop stopped");
    }

    fn on_frame(&mut self, data: &[u8]) {
        match self.reconciler.apply_snapshot(data) {
            Ok(snapshot) => {
                self.submitter.gate_mut().observe_snapshot(&snapshot);
                self.publish(SessionEvent::Snapshot(snapshot));
                self.publish_affordances();
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    rejected = self.reconciler.rejected(),
                    "malformed snapshot dropped"
                );
                self.publish(SessionEvent::SnapshotRejected {
                    reason: e.to_string(),
                });
            }
        }
    }

    /// Reports the current affordances if they changed.
    fn publish_affordances(&mut self) {
        let connected = self.manager.state() == ConnectionState::Connected;
        let allowed = self
            .submitter
            .gate()
            .allowed_actions(self.reconciler.current())
            .masked(connected);
        if self.affordances.as_ref() == Some(&allowed) {
            return;
        }
        self.affordances = Some(allowed.clone());
        self.publish(SessionEvent::AffordancesChanged(allowed));
    }

    fn publish(&self, event: SessionEvent) {
        if self.outbox.send(event).is_err() {
            tracing::trace!("event forwarder stopped");
        }
    }
}

/// Hands session events to the observer in order.
///
/// Lifecycle events wait for room in the observer channel; the rest are
/// dropped with a warning when it is full. Only this task ever waits on the
/// observer. Ends when the loop stops or the observer goes away.
async fn forward_events(
    mut outbox: mpsc::UnboundedReceiver<SessionEvent>,
    events: mpsc::Sender<SessionEvent>,
) {
    while let Some(event) = outbox.recv().await {
        if event.is_lifecycle() {
            if events.send(event).await.is_err() {
                break;
            }
            continue;
        }
        match events.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                tracing::warn!(event = event.kind(), "event channel full, dropping event");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => break,
        }
    }
    tracing::trace!("no observer for session events");
}
