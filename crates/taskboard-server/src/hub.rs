//! Per-board broadcast rooms for WebSocket push.

use std::collections::HashMap;

use tokio::sync::mpsc;

struct Room {
    clients: HashMap<u64, mpsc::UnboundedSender<String>>,
    next_client_id: u64,
}

impl Room {
    fn new() -> Self {
        Self {
            clients: HashMap::new(),
            next_client_id: 1,
        }
    }
}

/// Rooms keyed by board id. A room appears with its first subscriber and
/// is dropped with its last.
pub struct BoardHub {
    rooms: HashMap<String, Room>,
}

impl BoardHub {
    pub fn new() -> Self {
        Self {
            rooms: HashMap::new(),
        }
    }

    /// Register a client for a board room. Returns (client_id, receiver).
    pub fn register(&mut self, board_id: &str) -> (u64, mpsc::UnboundedReceiver<String>) {
        let room = self
            .rooms
            .entry(board_id.to_string())
            .or_insert_with(Room::new);
        let client_id = room.next_client_id;
        room.next_client_id += 1;
        let (tx, rx) = mpsc::unbounded_channel();
        room.clients.insert(client_id, tx);
        (client_id, rx)
    }

    pub fn unregister(&mut self, board_id: &str, client_id: u64) {
        if let Some(room) = self.rooms.get_mut(board_id) {
            room.clients.remove(&client_id);
            if room.clients.is_empty() {
                self.rooms.remove(board_id);
            }
        }
    }

    /// Send a message to every client in a board room. Closed receivers
    /// are ignored; their sessions unregister on disconnect.
    pub fn broadcast(&self, board_id: &str, msg: &str) {
        if let Some(room) = self.rooms.get(board_id) {
            for tx in room.clients.values() {
                let _ = tx.send(msg.to_string());
            }
        }
    }

    pub fn has_clients(&self, board_id: &str) -> bool {
        self.rooms
            .get(board_id)
            .is_some_and(|r| !r.clients.is_empty())
    }
}

impl Default for BoardHub {
    fn default() -> Self {
        Self::new()
    }
}
