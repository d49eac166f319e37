//! Turning a player gesture into at most one outbound action.

use std::future::Future;

use wizsync_protocol::ClientAction;
use wizsync_session::{ChannelEvent, ConnectionManager, SessionError};
use wizsync_transport::Connector;

use crate::{GameSnapshot, Intent, PhaseGate, SyncError};

/// Where authorized actions are written.
///
/// Implemented by [`ConnectionManager`]; tests substitute their own.
pub trait ActionSink {
    /// Writes one action.
    ///
    /// # Errors
    /// Any error means the action did not reach the server.
    fn send_action(
        &mut self,
        action: &ClientAction,
    ) -> impl Future<Output = Result<(), SessionError>> + Send;
}

impl<C, E> ActionSink for ConnectionManager<C, E>
where
    C: Connector,
    E: From<ChannelEvent<C::Connection>> + Send + 'static,
{
    async fn send_action(&mut self, action: &ClientAction) -> Result<(), SessionError> {
        self.send(action).await
    }
}

/// Gates, sends and then disables.
///
/// An action is sent at most once. If the write fails it is reported as
/// lost and the control stays disabled until the next snapshot, exactly
/// as if the server had simply not answered yet.
#[derive(Debug, Default)]
pub struct ActionSubmitter {
    gate: PhaseGate,
    sent: u64,
    lost: u64,
}

impl ActionSubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gate(&self) -> &PhaseGate {
        &self.gate
    }

    pub fn gate_mut(&mut self) -> &mut PhaseGate {
        &mut self.gate
    }

    /// Authorizes `intent` against `snapshot`, sends it through `sink` and
    /// marks its control pending.
    ///
    /// # Errors
    /// - [`SyncError::ActionNotAllowed`]: refused by the gate; nothing was
    ///   sent and no flag changed
    /// - [`SyncError::ActionLost`]: authorized but the write failed
    pub async fn submit<S: ActionSink>(
        &mut self,
        intent: Intent,
        snapshot: Option<&GameSnapshot>,
        sink: &mut S,
    ) -> Result<ClientAction, SyncError> {
        let action = match self.gate.authorize(snapshot, &intent) {
            Ok(action) => action,
            Err(reason) => {
                tracing::debug!(action = %intent.kind(), %reason, "intent refused");
                return Err(reason.into());
            }
        };

        let result = sink.send_action(&action).await;
        self.gate.mark_submitted(action.kind());

        match result {
            Ok(()) => {
                self.sent += 1;
                Ok(action)
            }
            Err(e) => {
                self.lost += 1;
                tracing::debug!(action = %action.kind(), error = %e, "action lost");
                Err(SyncError::ActionLost(e))
            }
        }
    }

    /// Actions written successfully.
    pub fn sent(&self) -> u64 {
        self.sent
    }

    /// Actions authorized but not written.
    pub fn lost(&self) -> u64 {
        self.lost
    }
}
