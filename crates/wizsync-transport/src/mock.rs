//! In-memory connector for tests.
//!
//! [`MockConnector`] hands out [`MockConnection`]s whose far end is a
//! [`MockRemote`] the test drives: it injects inbound frames, closes or
//! breaks the channel, and inspects what the client sent. Connect attempts
//! are recorded with their Tokio instant so reconnect timing can be
//! asserted under `tokio::time::pause()`.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};

use tokio::sync::{mpsc, Mutex};
use tokio::time::Instant;

use crate::{Connection, ConnectionId, Connector, TransportError};

enum Inbound {
    Frame(Vec<u8>),
    Close,
    Error(String),
}

fn lock<T>(m: &StdMutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct Shared {
    failures: AtomicU32,
    next_id: AtomicU64,
    attempts: StdMutex<Vec<(String, Instant)>>,
    remotes_tx: mpsc::UnboundedSender<MockRemote>,
    remotes_rx: Mutex<mpsc::UnboundedReceiver<MockRemote>>,
}

/// A scriptable in-memory [`Connector`].
///
/// Cloning shares the same script and attempt log.
#[derive(Clone)]
pub struct MockConnector {
    shared: Arc<Shared>,
}

impl Default for MockConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConnector {
    /// Creates a connector whose attempts all succeed.
    pub fn new() -> Self {
        let (remotes_tx, remotes_rx) = mpsc::unbounded_channel();
        Self {
            shared: Arc::new(Shared {
                failures: AtomicU32::new(0),
                next_id: AtomicU64::new(1),
                attempts: StdMutex::new(Vec::new()),
                remotes_tx,
                remotes_rx: Mutex::new(remotes_rx),
            }),
        }
    }

    /// Makes the next `n` connect attempts fail.
    pub fn fail_next(&self, n: u32) {
        self.shared.failures.store(n, Ordering::SeqCst);
    }

    /// Number of connect attempts so far, failed ones included.
    pub fn attempt_count(&self) -> usize {
        lock(&self.shared.attempts).len()
    }

    /// Tokio instants at which each connect attempt started.
    pub fn attempt_times(&self) -> Vec<Instant> {
        lock(&self.shared.attempts).iter().map(|(_, at)| *at).collect()
    }

    /// URLs dialed so far, in order.
    pub fn urls(&self) -> Vec<String> {
        lock(&self.shared.attempts)
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    /// Waits for the next successful connect and returns its server end.
    pub async fn accept(&self) -> MockRemote {
        self.shared
            .remotes_rx
            .lock()
            .await
            .recv()
            .await
            .expect("connector holds a sender, channel never closes")
    }
}

impl Connector for MockConnector {
    type Connection = MockConnection;

    async fn connect(&self, url: &str) -> Result<Self::Connection, TransportError> {
        lock(&self.shared.attempts).push((url.to_string(), Instant::now()));

        let should_fail = self
            .shared
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            tracing::debug!(url, "mock connect refused");
            return Err(TransportError::ConnectFailed(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "mock connect refused",
            )));
        }

        let id = ConnectionId::new(self.shared.next_id.fetch_add(1, Ordering::Relaxed));
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let sent = Arc::new(StdMutex::new(Vec::new()));
        let closed = Arc::new(AtomicBool::new(false));

        let remote = MockRemote {
            id,
            inbound: inbound_tx,
            sent: Arc::clone(&sent),
            closed: Arc::clone(&closed),
        };
        // The receiver lives in `shared`, so this only fails if the
        // connector itself is being torn down.
        let _ = self.shared.remotes_tx.send(remote);

        Ok(MockConnection {
            id,
            inbound: Mutex::new(inbound_rx),
            sent,
            closed,
        })
    }
}

/// Client end of an in-memory channel.
pub struct MockConnection {
    id: ConnectionId,
    inbound: Mutex<mpsc::UnboundedReceiver<Inbound>>,
    sent: Arc<StdMutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

impl Connection for MockConnection {
    async fn send(&self, text: &str) -> Result<(), TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::ConnectionClosed(
                "mock connection closed".to_string(),
            ));
        }
        lock(&self.sent).push(text.to_string());
        Ok(())
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        match self.inbound.lock().await.recv().await {
            Some(Inbound::Frame(data)) => Ok(Some(data)),
            // A dropped remote counts as a clean close.
            Some(Inbound::Close) | None => Ok(None),
            Some(Inbound::Error(reason)) => Err(TransportError::ReceiveFailed(
                std::io::Error::new(std::io::ErrorKind::ConnectionReset, reason),
            )),
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

/// Server end of an in-memory channel, held by the test.
///
/// Dropping it closes the channel from the client's point of view.
pub struct MockRemote {
    id: ConnectionId,
    inbound: mpsc::UnboundedSender<Inbound>,
    sent: Arc<StdMutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

impl MockRemote {
    /// The id of the matching client connection.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Delivers a text frame to the client.
    pub fn push_text(&self, text: impl Into<String>) {
        let _ = self.inbound.send(Inbound::Frame(text.into().into_bytes()));
    }

    /// Delivers a raw frame to the client.
    pub fn push_bytes(&self, data: impl Into<Vec<u8>>) {
        let _ = self.inbound.send(Inbound::Frame(data.into()));
    }

    /// Closes the channel cleanly; later client sends fail.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let _ = self.inbound.send(Inbound::Close);
    }

    /// Breaks the channel with a receive error.
    pub fn fail(&self, reason: impl Into<String>) {
        self.closed.store(true, Ordering::SeqCst);
        let _ = self.inbound.send(Inbound::Error(reason.into()));
    }

    /// Every text frame the client has sent so far.
    pub fn sent(&self) -> Vec<String> {
        lock(&self.sent).clone()
    }

    /// Whether either side has closed the channel.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_fail_next_refuses_then_connects() {
        let connector = MockConnector::new();
        connector.fail_next(2);

        assert!(connector.connect("ws://x/ws/a").await.is_err());
        assert!(connector.connect("ws://x/ws/a").await.is_err());
        assert!(connector.connect("ws://x/ws/a").await.is_ok());
        assert_eq!(connector.attempt_count(), 3);
    }

    #[tokio::test]
    async fn test_mock_frames_flow_both_ways() {
        let connector = MockConnector::new();
        let conn = connector.connect("ws://x/ws/a").await.unwrap();
        let remote = connector.accept().await;
        assert_eq!(remote.id(), conn.id());

        remote.push_text("hello");
        assert_eq!(conn.recv().await.unwrap(), Some(b"hello".to_vec()));

        conn.send("world").await.unwrap();
        assert_eq!(remote.sent(), vec!["world".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_remote_close_ends_recv_and_send() {
        let connector = MockConnector::new();
        let conn = connector.connect("ws://x/ws/a").await.unwrap();
        let remote = connector.accept().await;

        remote.close();

        assert_eq!(conn.recv().await.unwrap(), None);
        assert!(matches!(
            conn.send("late").await,
            Err(TransportError::ConnectionClosed(_))
        ));
    }

    #[tokio::test]
    async fn test_mock_remote_fail_surfaces_receive_error() {
        let connector = MockConnector::new();
        let conn = connector.connect("ws://x/ws/a").await.unwrap();
        let remote = connector.accept().await;

        remote.fail("reset by peer");

        assert!(matches!(
            conn.recv().await,
            Err(TransportError::ReceiveFailed(_))
        ));
    }
}
