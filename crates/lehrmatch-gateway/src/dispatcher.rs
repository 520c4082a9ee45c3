use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use lehrmatch_types::events::GatewayEvent;

/// Manages all connected chat clients and their match-room memberships.
///
/// Delivery is fire-and-forget: broadcasting pushes onto each member's
/// unbounded channel and never waits for the socket write.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct ConnectionHandle {
    user_id: Uuid,
    tx: mpsc::UnboundedSender<GatewayEvent>,
}

struct DispatcherInner {
    /// All live connections: conn_id -> handle
    connections: RwLock<HashMap<Uuid, ConnectionHandle>>,

    /// Room membership: match_id -> set of conn_ids
    rooms: RwLock<HashMap<Uuid, HashSet<Uuid>>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DispatcherInner {
                connections: RwLock::new(HashMap::new()),
                rooms: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Register a new connection. Returns its id and the event receiver the
    /// socket task drains.
    pub async fn register(&self, user_id: Uuid) -> (Uuid, mpsc::UnboundedReceiver<GatewayEvent>) {
        let conn_id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner
            .connections
            .write()
            .await
            .insert(conn_id, ConnectionHandle { user_id, tx });
        (conn_id, rx)
    }

    /// Drop a connection and purge it from every room it joined.
    pub async fn unregister(&self, conn_id: Uuid) {
        self.inner.connections.write().await.remove(&conn_id);

        let mut rooms = self.inner.rooms.write().await;
        rooms.retain(|_, members| {
            members.remove(&conn_id);
            !members.is_empty()
        });
    }

    pub async fn join_room(&self, match_id: Uuid, conn_id: Uuid) {
        self.inner
            .rooms
            .write()
            .await
            .entry(match_id)
            .or_default()
            .insert(conn_id);
    }

    pub async fn leave_room(&self, match_id: Uuid, conn_id: Uuid) {
        let mut rooms = self.inner.rooms.write().await;
        if let Some(members) = rooms.get_mut(&match_id) {
            members.remove(&conn_id);
            if members.is_empty() {
                rooms.remove(&match_id);
            }
        }
    }

    /// Send an event to every member of a match room, the sender's other
    /// connections included.
    pub async fn broadcast_to_room(&self, match_id: Uuid, event: GatewayEvent) {
        self.fan_out(match_id, None, event).await;
    }

    /// Send an event to every room member except one connection — used for
    /// typing indicators and read receipts, which must not echo back.
    pub async fn broadcast_to_room_except(
        &self,
        match_id: Uuid,
        except_conn: Uuid,
        event: GatewayEvent,
    ) {
        self.fan_out(match_id, Some(except_conn), event).await;
    }

    /// Send an event to a single connection.
    pub async fn send_to_conn(&self, conn_id: Uuid, event: GatewayEvent) {
        let connections = self.inner.connections.read().await;
        if let Some(handle) = connections.get(&conn_id) {
            let _ = handle.tx.send(event);
        }
    }

    async fn fan_out(&self, match_id: Uuid, except: Option<Uuid>, event: GatewayEvent) {
        let rooms = self.inner.rooms.read().await;
        let Some(members) = rooms.get(&match_id) else {
            return;
        };

        let connections = self.inner.connections.read().await;
        for conn_id in members {
            if Some(*conn_id) == except {
                continue;
            }
            if let Some(handle) = connections.get(conn_id) {
                let _ = handle.tx.send(event.clone());
            }
        }
    }

    /// The user behind a connection, if it is still registered.
    pub async fn user_of(&self, conn_id: Uuid) -> Option<Uuid> {
        self.inner
            .connections
            .read()
            .await
            .get(&conn_id)
            .map(|h| h.user_id)
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typing_event(match_id: Uuid, user_id: Uuid) -> GatewayEvent {
        GatewayEvent::Typing {
            match_id,
            user_id,
            is_typing: true,
        }
    }

    #[tokio::test]
    async fn room_broadcast_reaches_all_members() {
        let dispatcher = Dispatcher::new();
        let match_id = Uuid::new_v4();

        let (conn_a, mut rx_a) = dispatcher.register(Uuid::new_v4()).await;
        let (conn_b, mut rx_b) = dispatcher.register(Uuid::new_v4()).await;
        dispatcher.join_room(match_id, conn_a).await;
        dispatcher.join_room(match_id, conn_b).await;

        dispatcher
            .broadcast_to_room(match_id, typing_event(match_id, Uuid::new_v4()))
            .await;

        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_ok());
    }

    #[tokio::test]
    async fn except_sender_broadcast_skips_one_connection() {
        let dispatcher = Dispatcher::new();
        let match_id = Uuid::new_v4();

        let (conn_a, mut rx_a) = dispatcher.register(Uuid::new_v4()).await;
        let (conn_b, mut rx_b) = dispatcher.register(Uuid::new_v4()).await;
        dispatcher.join_room(match_id, conn_a).await;
        dispatcher.join_room(match_id, conn_b).await;

        dispatcher
            .broadcast_to_room_except(match_id, conn_a, typing_event(match_id, Uuid::new_v4()))
            .await;

        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_ok());
    }

    #[tokio::test]
    async fn non_members_receive_nothing() {
        let dispatcher = Dispatcher::new();
        let match_id = Uuid::new_v4();

        let (conn_a, mut rx_a) = dispatcher.register(Uuid::new_v4()).await;
        let (_conn_b, mut rx_b) = dispatcher.register(Uuid::new_v4()).await;
        dispatcher.join_room(match_id, conn_a).await;

        dispatcher
            .broadcast_to_room(match_id, typing_event(match_id, Uuid::new_v4()))
            .await;

        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn unregister_cleans_up_room_membership() {
        let dispatcher = Dispatcher::new();
        let match_id = Uuid::new_v4();

        let (conn_a, mut rx_a) = dispatcher.register(Uuid::new_v4()).await;
        dispatcher.join_room(match_id, conn_a).await;
        dispatcher.unregister(conn_a).await;

        dispatcher
            .broadcast_to_room(match_id, typing_event(match_id, Uuid::new_v4()))
            .await;

        assert!(rx_a.try_recv().is_err());
        assert!(dispatcher.user_of(conn_a).await.is_none());
    }

    #[tokio::test]
    async fn leaving_a_room_stops_delivery() {
        let dispatcher = Dispatcher::new();
        let match_id = Uuid::new_v4();

        let (conn_a, mut rx_a) = dispatcher.register(Uuid::new_v4()).await;
        dispatcher.join_room(match_id, conn_a).await;
        dispatcher.leave_room(match_id, conn_a).await;

        dispatcher
            .broadcast_to_room(match_id, typing_event(match_id, Uuid::new_v4()))
            .await;

        assert!(rx_a.try_recv().is_err());
    }
}
