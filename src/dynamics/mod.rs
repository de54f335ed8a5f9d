//! dynamics - engine-agnostic arcade vehicle model (pure types + per-tick solver)

pub mod types;
pub mod config;
pub mod error;
pub mod modifiers;
pub mod forces;
pub mod weight_transfer;
pub mod grip;
pub mod drift;
pub mod steering;
pub mod stability;
pub mod telemetry;
pub mod state;
pub mod solve;

pub use types::*;
pub use config::{StabilityLimits, VehicleConstants, GT_COUPE};
pub use error::{DynamicsError, DynamicsResult, Recovery};
pub use modifiers::{compose, CurbContact, ModifierSet, TireCompound, Weather};
pub use drift::DriftState;
pub use state::VehicleState;
pub use telemetry::Telemetry;
pub use solve::{TickOutput, VehicleDynamics};
