//! Broadcast router: fans [`ServerEvent`]s out to connections.
//!
//! Each connection registers an unbounded sender whose receiving end is
//! drained by that connection's writer task. Delivery to a connection that
//! has gone away is dropped silently; disconnect cleanup catches up via the
//! coordinator's own disconnect path.

use std::collections::HashMap;

use skewer_protocol::ServerEvent;
use skewer_transport::ConnectionId;
use tokio::sync::mpsc;

/// The sending half a connection's writer task listens on.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Routes events to registered connections.
#[derive(Debug, Default)]
pub struct BroadcastRouter {
    senders: HashMap<ConnectionId, EventSender>,
}

impl BroadcastRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection's outbound channel.
    pub fn register(&mut self, connection: ConnectionId, sender: EventSender) {
        self.senders.insert(connection, sender);
    }

    /// Removes a connection's outbound channel.
    pub fn unregister(&mut self, connection: ConnectionId) {
        self.senders.remove(&connection);
    }

    /// Whether events can still be delivered to `connection`.
    pub fn is_connected(&self, connection: ConnectionId) -> bool {
        self.senders
            .get(&connection)
            .is_some_and(|s| !s.is_closed())
    }

    /// Sends an event to a single connection.
    pub fn to_connection(&self, connection: ConnectionId, event: ServerEvent) {
        if let Some(sender) = self.senders.get(&connection) {
            if sender.send(event).is_err() {
                tracing::debug!(%connection, "dropped event for closed connection");
            }
        }
    }

    /// Sends an event to every connection in `targets`.
    pub fn to_each<I>(&self, targets: I, event: &ServerEvent)
    where
        I: IntoIterator<Item = ConnectionId>,
    {
        for connection in targets {
            self.to_connection(connection, event.clone());
        }
    }

    /// Sends an event to every registered connection.
    pub fn to_all(&self, event: &ServerEvent) {
        for (connection, sender) in &self.senders {
            if sender.send(event.clone()).is_err() {
                tracing::debug!(%connection, "dropped event for closed connection");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}
