//! Shared game state: work zones from the map, remote peers from the relay.

use glam::Vec2;
use serde_json::Value;
use std::collections::HashMap;

use crate::map::WorkZone;

/// Last-known state of a remote player, fed by relay presence messages.
#[derive(Debug, Clone)]
pub struct PeerPresence {
    pub id: u64,
    pub position: Vec2,
    pub name: String,
}

/// State every component update may read and write.
pub struct GameState {
    pub work_zones: Vec<WorkZone>,
    pub peers: HashMap<u64, PeerPresence>,
    pub running: bool,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    pub fn new() -> Self {
        Self {
            work_zones: Vec::new(),
            peers: HashMap::new(),
            running: true,
        }
    }

    /// True when `pos` lies inside any work zone.
    pub fn in_work_zone(&self, pos: Vec2) -> bool {
        self.work_zones.iter().any(|z| z.contains(pos))
    }

    /// Fold one relay message into the peer table. Unknown types are
    /// ignored; the relay forwards whatever other clients send.
    pub fn apply_net_message(&mut self, message: &Value) {
        match message.get("type").and_then(Value::as_str) {
            Some("presence") => {
                let Some(id) = message.get("id").and_then(Value::as_u64) else {
                    return;
                };
                let x = message.get("x").and_then(Value::as_f64).unwrap_or(0.0) as f32;
                let y = message.get("y").and_then(Value::as_f64).unwrap_or(0.0) as f32;
                let name = message
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or("peer")
                    .to_string();
                let previous = self.peers.insert(
                    id,
                    PeerPresence {
                        id,
                        position: Vec2::new(x, y),
                        name,
                    },
                );
                if previous.is_none() {
                    let peer = &self.peers[&id];
                    log::info!("peer {} ({}) joined", peer.id, peer.name);
                }
            }
            Some("disconnect") => {
                if let Some(id) = message.get("id").and_then(Value::as_u64) {
                    if self.peers.remove(&id).is_some() {
                        log::info!("peer {id} left");
                    }
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn presence_upserts_and_disconnect_removes() {
        let mut state = GameState::new();
        state.apply_net_message(&json!({"type": "presence", "id": 4, "x": 2.0, "y": 3.0, "name": "ada"}));
        assert_eq!(state.peers[&4].position, Vec2::new(2.0, 3.0));

        state.apply_net_message(&json!({"type": "presence", "id": 4, "x": 5.0, "y": 3.0, "name": "ada"}));
        assert_eq!(state.peers[&4].position, Vec2::new(5.0, 3.0));

        state.apply_net_message(&json!({"type": "disconnect", "id": 4}));
        assert!(state.peers.is_empty());
    }

    #[test]
    fn unknown_types_are_ignored() {
        let mut state = GameState::new();
        state.apply_net_message(&json!({"type": "chat", "text": "hi"}));
        assert!(state.peers.is_empty());
    }

    #[test]
    fn work_zone_lookup() {
        let mut state = GameState::new();
        state.work_zones.push(WorkZone::around(Vec2::new(4.0, 4.0), 1.5));
        assert!(state.in_work_zone(Vec2::new(4.5, 3.0)));
        assert!(!state.in_work_zone(Vec2::new(8.0, 8.0)));
    }
}
