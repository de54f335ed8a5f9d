use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::{Duration, interval};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use racer_dynamics::dynamics::{DynamicsError, DynamicsResult, VehicleConstants};
use racer_dynamics::net::start_websocket_server;
use racer_dynamics::physics::PhysicsWorld;
use racer_dynamics::state::SharedGameState;

const TICK_DT: f32 = 1.0 / 60.0;
const DEFAULT_BIND: &str = "0.0.0.0:9001";

fn load_constants() -> DynamicsResult<VehicleConstants> {
    match std::env::var("RACER_VEHICLE_CONFIG") {
        Ok(path) => {
            let c = VehicleConstants::from_path(&path)?;
            info!(%path, "loaded vehicle constants");
            Ok(c)
        }
        Err(_) => Ok(VehicleConstants::default()),
    }
}

fn bind_addr() -> DynamicsResult<SocketAddr> {
    let raw = std::env::var("RACER_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
    raw.parse()
        .map_err(|_| DynamicsError::Invalid(format!("RACER_BIND is not a socket address: {raw}")))
}

#[tokio::main]
async fn main() -> DynamicsResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let constants = load_constants().inspect_err(|e| error!(error = %e, "bad vehicle config"))?;
    let addr = bind_addr()?;

    info!(mass = constants.mass, max_kmh = constants.max_speed_kmh, "starting racer server");

    let state = Arc::new(Mutex::new(SharedGameState::new()));
    let physics = Arc::new(Mutex::new(PhysicsWorld::new(constants)));

    // Start WebSocket server
    {
        let state = Arc::clone(&state);
        let physics = Arc::clone(&physics);
        tokio::spawn(async move {
            if let Err(e) = start_websocket_server(addr, state, physics).await {
                error!(%addr, error = %e, "websocket server stopped");
            }
        });
    }

    // Fixed timestep: ~60 Hz
    let mut ticker = interval(Duration::from_millis(16));

    loop {
        ticker.tick().await;

        // physics, then state; net.rs never holds both
        let mut phys = physics.lock().await;
        phys.step(TICK_DT);

        // Advance tick + broadcast snapshot
        let mut game = state.lock().await;
        game.tick += 1;
        game.broadcast_snapshot(&phys);
    }
}
