use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::dynamics::Telemetry;
use crate::physics::PhysicsWorld;
use crate::spawn::SpawnManager;

#[derive(Debug, Serialize)]
pub struct PlayerSnapshot<'a> {
    pub id: &'a str,
    pub telemetry: &'a Telemetry,
}

/// Everything the server pushes to clients.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage<'a> {
    Welcome { player_id: &'a str, slot: usize },
    Pong,
    Snapshot { tick: u64, players: Vec<PlayerSnapshot<'a>> },
}

impl ServerMessage<'_> {
    pub fn to_json(&self) -> Option<String> {
        match serde_json::to_string(self) {
            Ok(s) => Some(s),
            Err(e) => {
                warn!(error = %e, "failed to encode server message");
                None
            }
        }
    }
}

pub struct SharedGameState {
    pub tick: u64,
    pub clients: Vec<UnboundedSender<String>>,
    pub spawns: SpawnManager,
}

impl Default for SharedGameState {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedGameState {
    pub fn new() -> Self {
        Self {
            tick: 0,
            clients: Vec::new(),
            spawns: SpawnManager::new(),
        }
    }

    pub fn register_client(&mut self, tx: UnboundedSender<String>) {
        self.clients.push(tx);
        debug!(clients = self.clients.len(), "client registered");
    }

    /// Build and send a telemetry snapshot of every car to all clients.
    pub fn broadcast_snapshot(&mut self, physics: &PhysicsWorld) {
        self.clients.retain(|tx| !tx.is_closed());
        if self.clients.is_empty() {
            return;
        }

        let mut players: Vec<PlayerSnapshot<'_>> = physics
            .vehicles
            .iter()
            .map(|(id, v)| PlayerSnapshot { id, telemetry: &v.telemetry })
            .collect();
        players.sort_by(|a, b| a.id.cmp(b.id));

        let Some(json) = (ServerMessage::Snapshot { tick: self.tick, players }).to_json() else {
            return;
        };

        for tx in &self.clients {
            let _ = tx.send(json.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::VehicleConstants;
    use tokio::sync::mpsc;

    #[test]
    fn snapshot_reaches_clients_as_tagged_json() {
        let mut physics = PhysicsWorld::new(VehicleConstants::default());
        let mut game = SharedGameState::new();
        let spawn = game.spawns.allocate_spawn("p1".into());
        physics.spawn_vehicle_for_player(spawn.player_id, spawn.transform);

        let (tx, mut rx) = mpsc::unbounded_channel();
        game.register_client(tx);
        game.tick = 7;
        game.broadcast_snapshot(&physics);

        let msg = rx.try_recv().unwrap();
        let v: serde_json::Value = serde_json::from_str(&msg).unwrap();
        assert_eq!(v["type"], "snapshot");
        assert_eq!(v["tick"], 7);
        assert_eq!(v["players"][0]["id"], "p1");
        assert_eq!(v["players"][0]["telemetry"]["gear"], 0);
    }

    #[test]
    fn closed_clients_are_dropped() {
        let physics = PhysicsWorld::new(VehicleConstants::default());
        let mut game = SharedGameState::new();
        let (tx, rx) = mpsc::unbounded_channel();
        game.register_client(tx);
        drop(rx);
        game.broadcast_snapshot(&physics);
        assert!(game.clients.is_empty());
    }

    #[test]
    fn welcome_and_pong_shapes() {
        let w = ServerMessage::Welcome { player_id: "abc", slot: 2 }.to_json().unwrap();
        assert_eq!(w, r#"{"type":"welcome","player_id":"abc","slot":2}"#);
        assert_eq!(ServerMessage::Pong.to_json().unwrap(), r#"{"type":"pong"}"#);
    }
}
