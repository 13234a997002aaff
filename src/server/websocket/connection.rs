//! WebSocket connection registry.
//!
//! Connections are grouped by user id; a user may hold several sockets at
//! once (browser tabs, devices), each identified by a server-assigned id.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, RwLock};
use tracing::debug;

use super::messages::ServerMessage;
use crate::server::metrics;

const OUTGOING_BUFFER: usize = 32;

#[derive(Debug, Clone, PartialEq)]
pub enum SendError {
    NotConnected,
    /// The receiving side of the channel is gone.
    Disconnected,
    /// The socket is not draining its channel; the message was dropped.
    Full,
}

type UserConnections = HashMap<i64, HashMap<u64, mpsc::Sender<ServerMessage>>>;

fn count_all(conns: &UserConnections) -> usize {
    conns.values().map(HashMap::len).sum()
}

/// Never waits on a slow socket.
fn deliver(sender: &mpsc::Sender<ServerMessage>, message: ServerMessage) -> Result<(), SendError> {
    sender.try_send(message).map_err(|e| match e {
        TrySendError::Full(_) => SendError::Full,
        TrySendError::Closed(_) => SendError::Disconnected,
    })
}

pub struct ConnectionManager {
    /// user_id -> (connection_id -> sender)
    connections: RwLock<UserConnections>,
    next_connection_id: AtomicU64,
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            next_connection_id: AtomicU64::new(1),
        }
    }

    /// Registers a new socket for `user_id`.
    ///
    /// Returns the connection id and the receiver the socket task must drain.
    pub async fn register(&self, user_id: i64) -> (u64, mpsc::Receiver<ServerMessage>) {
        let (tx, rx) = mpsc::channel(OUTGOING_BUFFER);
        let connection_id = self.next_connection_id.fetch_add(1, Ordering::Relaxed);

        let mut conns = self.connections.write().await;
        conns.entry(user_id).or_default().insert(connection_id, tx);
        metrics::set_websocket_connections(count_all(&conns));

        (connection_id, rx)
    }

    /// Removes a connection and drops the user entry once empty.
    pub async fn unregister(&self, user_id: i64, connection_id: u64) {
        let mut conns = self.connections.write().await;
        if let Some(user_conns) = conns.get_mut(&user_id) {
            user_conns.remove(&connection_id);
            if user_conns.is_empty() {
                conns.remove(&user_id);
            }
        }
        metrics::set_websocket_connections(count_all(&conns));
    }

    pub async fn send_to_connection(
        &self,
        user_id: i64,
        connection_id: u64,
        message: ServerMessage,
    ) -> Result<(), SendError> {
        let sender = self
            .connections
            .read()
            .await
            .get(&user_id)
            .and_then(|user_conns| user_conns.get(&connection_id))
            .cloned()
            .ok_or(SendError::NotConnected)?;
        deliver(&sender, message)
    }

    /// Sends a message to every socket of a user.
    ///
    /// Returns the ids of connections that did not take the message, either
    /// closed or with a full buffer.
    pub async fn broadcast_to_user(&self, user_id: i64, message: ServerMessage) -> Vec<u64> {
        let senders: Vec<(u64, mpsc::Sender<ServerMessage>)> = match self
            .connections
            .read()
            .await
            .get(&user_id)
        {
            Some(user_conns) => user_conns
                .iter()
                .map(|(id, sender)| (*id, sender.clone()))
                .collect(),
            None => return Vec::new(),
        };

        senders
            .into_iter()
            .filter_map(|(connection_id, sender)| {
                match deliver(&sender, message.clone()) {
                    Ok(()) => None,
                    Err(e) => {
                        debug!("Connection {} skipped: {:?}", connection_id, e);
                        Some(connection_id)
                    }
                }
            })
            .collect()
    }

    pub async fn connection_count(&self, user_id: i64) -> usize {
        let conns = self.connections.read().await;
        conns.get(&user_id).map(HashMap::len).unwrap_or(0)
    }

    pub async fn total_connections(&self) -> usize {
        count_all(&*self.connections.read().await)
    }
}
