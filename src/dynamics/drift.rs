// ==============================================================================
// drift.rs — DRIFT STATE MACHINE (HYSTERESIS)
// ------------------------------------------------------------------------------
//     Gripped  -> Drifting   |α| > entry * mod  AND  speed > min_drift_speed
//     Drifting -> Gripped    |α| < exit  * mod
//
// exit < entry (checked at config validation) leaves a band where the state
// simply holds, so the car cannot chatter between the two.
// ==============================================================================

use serde::Serialize;

use crate::dynamics::config::VehicleConstants;
use crate::dynamics::modifiers::ModifierSet;
use crate::dynamics::types::ms;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftState {
    #[default]
    Gripped,
    Drifting,
}

impl DriftState {
    pub fn is_drifting(&self) -> bool {
        matches!(self, DriftState::Drifting)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriftThresholds {
    pub entry_deg: f32,
    pub exit_deg: f32,
    pub min_speed: f32, // m/s
}

impl DriftThresholds {
    pub fn new(c: &VehicleConstants, m: &ModifierSet) -> Self {
        Self {
            entry_deg: c.drift_entry_deg * m.drift_entry_angle,
            exit_deg: c.drift_exit_deg * m.drift_entry_angle,
            min_speed: ms(c.min_drift_speed_kmh),
        }
    }
}

pub fn update_drift_state(prev: DriftState, slip_deg: f32, speed: f32, t: &DriftThresholds) -> DriftState {
    let slip = slip_deg.abs();
    match prev {
        DriftState::Gripped => {
            if slip > t.entry_deg && speed.abs() > t.min_speed {
                DriftState::Drifting
            } else {
                DriftState::Gripped
            }
        }
        DriftState::Drifting => {
            if slip < t.exit_deg {
                DriftState::Gripped
            } else {
                DriftState::Drifting
            }
        }
    }
}
