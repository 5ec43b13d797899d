//! Broadcast engine
//!
//! Fans events out to sessions selected from the registry. Delivery is a
//! non-blocking enqueue onto each session's outbound queue, so a slow
//! client only loses its own events. Sessions whose queue has closed are
//! reported back to the caller for cleanup; the engine never mutates state.

use tracing::{debug, warn};

use crate::error::SendError;
use crate::message::ServerMessage;
use crate::registry::SessionRegistry;
use crate::types::SessionId;

/// Outcome of a single delivery attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Enqueued for the session's writer
    Delivered,
    /// Queue full, event dropped for this session
    Dropped,
    /// Connection gone, session should be cleaned up
    Closed,
    /// No such session
    Missing,
}

/// Result of a fan-out
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Sessions the event was enqueued for
    pub delivered: usize,
    /// Sessions whose connection has closed
    pub closed: Vec<SessionId>,
}

/// Read-only view over the registry used to deliver events
pub struct Broadcaster<'a> {
    sessions: &'a SessionRegistry,
}

impl<'a> Broadcaster<'a> {
    pub fn new(sessions: &'a SessionRegistry) -> Self {
        Self { sessions }
    }

    /// Deliver one event to one session
    pub fn send_to(&self, id: SessionId, event: ServerMessage) -> Delivery {
        let Some(session) = self.sessions.get(id) else {
            return Delivery::Missing;
        };
        if !session.is_open() {
            return Delivery::Closed;
        }

        match session.try_send(event) {
            Ok(()) => Delivery::Delivered,
            Err(SendError::ChannelFull) => {
                warn!("Outbound queue full for {}, dropping event", id);
                Delivery::Dropped
            }
            Err(SendError::ChannelClosed) => {
                debug!("Session {} closed, marking for cleanup", id);
                Delivery::Closed
            }
        }
    }

    /// Deliver to every authenticated session currently in `room`
    pub fn broadcast_room(&self, room: &str, event: &ServerMessage) -> BroadcastReport {
        self.fan_out(self.sessions.sessions_in_room(room), event)
    }

    /// Deliver to every registered session
    pub fn broadcast_all(&self, event: &ServerMessage) -> BroadcastReport {
        self.fan_out(self.sessions.all(), event)
    }

    fn fan_out(
        &self,
        targets: impl Iterator<Item = SessionId>,
        event: &ServerMessage,
    ) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        for id in targets {
            match self.send_to(id, event.clone()) {
                Delivery::Delivered => report.delivered += 1,
                Delivery::Closed => report.closed.push(id),
                Delivery::Dropped | Delivery::Missing => {}
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::RoomDirectory;
    use tokio::sync::mpsc;

    fn join(
        registry: &mut SessionRegistry,
        rooms: &RoomDirectory,
        name: &str,
        room: &str,
    ) -> (SessionId, mpsc::Receiver<ServerMessage>) {
        let (tx, rx) = mpsc::channel(8);
        let id = registry.register(tx);
        registry.authenticate(id, name, rooms).unwrap();
        registry.set_room(id, room).unwrap();
        (id, rx)
    }

    #[tokio::test]
    async fn test_broadcast_room_is_scoped() {
        let mut registry = SessionRegistry::new();
        let rooms = RoomDirectory::new();
        let (_a, mut rx_a) = join(&mut registry, &rooms, "alice", "Global");
        let (_b, mut rx_b) = join(&mut registry, &rooms, "bob", "Global");
        let (_c, mut rx_c) = join(&mut registry, &rooms, "carol", "Dev");

        let event = ServerMessage::system("hello Global");
        let report = Broadcaster::new(&registry).broadcast_room("Global", &event);

        assert_eq!(report.delivered, 2);
        assert!(report.closed.is_empty());
        assert_eq!(rx_a.try_recv().unwrap(), event);
        assert_eq!(rx_b.try_recv().unwrap(), event);
        assert!(rx_c.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_all_includes_unauthenticated() {
        let mut registry = SessionRegistry::new();
        let rooms = RoomDirectory::new();
        let (_a, mut rx_a) = join(&mut registry, &rooms, "alice", "Dev");
        let (tx, mut rx_anon) = mpsc::channel(8);
        registry.register(tx);

        let event = ServerMessage::UserCount { count: 1 };
        let report = Broadcaster::new(&registry).broadcast_all(&event);

        assert_eq!(report.delivered, 2);
        assert_eq!(rx_a.try_recv().unwrap(), event);
        assert_eq!(rx_anon.try_recv().unwrap(), event);
    }

    #[tokio::test]
    async fn test_broadcast_room_skips_unauthenticated() {
        let mut registry = SessionRegistry::new();
        let (tx, mut rx_anon) = mpsc::channel(8);
        registry.register(tx);

        let report = Broadcaster::new(&registry)
            .broadcast_room("Global", &ServerMessage::system("nobody"));
        assert_eq!(report.delivered, 0);
        assert!(rx_anon.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_closed_sessions_reported() {
        let mut registry = SessionRegistry::new();
        let rooms = RoomDirectory::new();
        let (a, rx_a) = join(&mut registry, &rooms, "alice", "Global");
        let (_b, mut rx_b) = join(&mut registry, &rooms, "bob", "Global");
        drop(rx_a);

        let event = ServerMessage::system("still here");
        let report = Broadcaster::new(&registry).broadcast_room("Global", &event);

        assert_eq!(report.delivered, 1);
        assert_eq!(report.closed, vec![a]);
        assert_eq!(rx_b.try_recv().unwrap(), event);
    }

    #[tokio::test]
    async fn test_send_to_full_queue_drops() {
        let mut registry = SessionRegistry::new();
        let (tx, mut rx) = mpsc::channel(1);
        let id = registry.register(tx);
        let broadcaster = Broadcaster::new(&registry);

        assert_eq!(
            broadcaster.send_to(id, ServerMessage::UserCount { count: 1 }),
            Delivery::Delivered
        );
        assert_eq!(
            broadcaster.send_to(id, ServerMessage::UserCount { count: 2 }),
            Delivery::Dropped
        );
        assert_eq!(
            broadcaster.send_to(SessionId::new(), ServerMessage::UserCount { count: 3 }),
            Delivery::Missing
        );
        assert_eq!(rx.try_recv().unwrap(), ServerMessage::UserCount { count: 1 });
    }

    #[tokio::test]
    async fn test_full_queue_does_not_stall_others() {
        let mut registry = SessionRegistry::new();
        let rooms = RoomDirectory::new();

        let (slow_tx, _slow_rx) = mpsc::channel(1);
        let slow = registry.register(slow_tx);
        registry.authenticate(slow, "slow", &rooms).unwrap();
        let (_fast, mut fast_rx) = join(&mut registry, &rooms, "fast", "Global");

        let broadcaster = Broadcaster::new(&registry);
        assert_eq!(
            broadcaster.send_to(slow, ServerMessage::system("fill")),
            Delivery::Delivered
        );

        for i in 0..5 {
            let event = ServerMessage::system(format!("event {}", i));
            let report = if i % 2 == 0 {
                broadcaster.broadcast_room("Global", &event)
            } else {
                broadcaster.broadcast_all(&event)
            };
            assert_eq!(report.delivered, 1);
            assert!(report.closed.is_empty());
        }

        for i in 0..5 {
            assert_eq!(
                fast_rx.try_recv().unwrap(),
                ServerMessage::system(format!("event {}", i))
            );
        }
        assert!(registry.get(slow).is_some());
    }
}
