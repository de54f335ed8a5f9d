//! Arcade racing vehicle dynamics, plus the rapier/WebSocket host that drives it.

pub mod dynamics;
pub mod net;
pub mod physics;
pub mod spawn;
pub mod state;
