use std::net::SocketAddr;
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::accept_async;
use tracing::{debug, info, warn};
use tungstenite::Message;
use uuid::Uuid;

use crate::dynamics::{ControlInput, TireCompound, Weather};
use crate::physics::PhysicsWorld;
use crate::state::{ServerMessage, SharedGameState};

/// Everything a client may send.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Input(ControlInput),
    Tires { compound: TireCompound },
    Weather { weather: Weather },
    Ping,
}

impl ClientMessage {
    pub fn from_json(txt: &str) -> Option<Self> {
        match serde_json::from_str(txt) {
            Ok(m) => Some(m),
            Err(e) => {
                debug!(error = %e, "ignoring malformed client message");
                None
            }
        }
    }
}

pub async fn start_websocket_server(
    addr: SocketAddr,
    state: Arc<Mutex<SharedGameState>>,
    physics: Arc<Mutex<PhysicsWorld>>,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;

    info!(%addr, "websocket listening");

    loop {
        let (raw, peer) = match listener.accept().await {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "accept failed");
                continue;
            }
        };

        tokio::spawn(handle_connection(
            raw,
            peer,
            Arc::clone(&state),
            Arc::clone(&physics),
        ));
    }
}

async fn handle_connection(
    raw: TcpStream,
    peer: SocketAddr,
    state: Arc<Mutex<SharedGameState>>,
    physics: Arc<Mutex<PhysicsWorld>>,
) {
    let ws = match accept_async(raw).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!(%peer, error = %e, "websocket handshake failed");
            return;
        }
    };
    let (mut write, mut read) = ws.split();

    // -------------------------------
    // 1) Create outgoing message channel
    // -------------------------------
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    // -------------------------------
    // 2) Spawn send-loop task
    // -------------------------------
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if write.send(Message::Text(msg)).await.is_err() {
                break;
            }
        }
    });

    // -------------------------------
    // 3) Grid slot + physics body
    // -------------------------------
    let player_id = Uuid::new_v4().to_string();
    let spawn = {
        let mut game = state.lock().await;
        game.register_client(tx.clone());
        game.spawns.allocate_spawn(player_id.clone())
    };
    physics
        .lock()
        .await
        .spawn_vehicle_for_player(player_id.clone(), spawn.transform);

    info!(player = %player_id, %peer, slot = spawn.slot, "player connected");

    if let Some(welcome) = (ServerMessage::Welcome { player_id: &player_id, slot: spawn.slot }).to_json() {
        let _ = tx.send(welcome);
    }

    // -------------------------------
    // 4) Main receive loop
    // -------------------------------
    while let Some(msg) = read.next().await {
        let msg = match msg {
            Ok(m) => m,
            Err(_) => break,
        };

        if msg.is_close() {
            break;
        }
        if !msg.is_text() {
            continue;
        }
        let Ok(text) = msg.to_text() else { continue };
        let Some(parsed) = ClientMessage::from_json(text) else { continue };

        match parsed {
            ClientMessage::Ping => {
                if let Some(pong) = ServerMessage::Pong.to_json() {
                    let _ = tx.send(pong);
                }
            }
            ClientMessage::Input(input) => {
                physics.lock().await.apply_player_input(&player_id, input);
            }
            ClientMessage::Tires { compound } => {
                physics.lock().await.set_tires(&player_id, compound);
            }
            ClientMessage::Weather { weather } => {
                physics.lock().await.set_weather(weather);
            }
        }
    }

    info!(player = %player_id, "player disconnected");
    physics.lock().await.remove_vehicle(&player_id);
    state.lock().await.spawns.release(&player_id);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_input_with_missing_fields() {
        let m = ClientMessage::from_json(r#"{"type":"input","forward":true,"left":true}"#).unwrap();
        assert_eq!(
            m,
            ClientMessage::Input(ControlInput { forward: true, left: true, ..Default::default() })
        );
    }

    #[test]
    fn parses_tires_weather_ping() {
        assert_eq!(
            ClientMessage::from_json(r#"{"type":"tires","compound":"soft"}"#),
            Some(ClientMessage::Tires { compound: TireCompound::Soft })
        );
        assert_eq!(
            ClientMessage::from_json(r#"{"type":"weather","weather":"light_rain"}"#),
            Some(ClientMessage::Weather { weather: Weather::LightRain })
        );
        assert_eq!(ClientMessage::from_json(r#"{"type":"ping"}"#), Some(ClientMessage::Ping));
    }

    #[test]
    fn rejects_unknown_or_malformed() {
        assert_eq!(ClientMessage::from_json(r#"{"type":"teleport"}"#), None);
        assert_eq!(ClientMessage::from_json("not json"), None);
        assert_eq!(ClientMessage::from_json(r#"{"type":"tires","compound":"slick"}"#), None);
    }
}
