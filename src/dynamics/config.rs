// ==============================================================================
// config.rs — VEHICLE CONSTANTS (LOADED ONCE, NEVER MUTATED)
// ------------------------------------------------------------------------------
// Units: SI unless the field name says otherwise (_kmh, _deg).
// Every field has a default so a JSON file only needs the values it overrides.
// ==============================================================================

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dynamics::error::{DynamicsError, DynamicsResult};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilityLimits {
    pub max_linear_velocity: f32,   // m/s, per output component
    pub max_angular_velocity: f32,  // rad/s, per output component
    pub world_extent: f32,          // m, |position| beyond this is treated as corrupt
    pub stuck_speed: f32,           // m/s, "actual speed is near zero"
    pub stuck_divergence: f32,      // m/s, internal vs actual gap that counts as stuck
    pub stuck_blend: f32,           // 0..1 pull toward actual per stuck tick
}

impl Default for StabilityLimits {
    fn default() -> Self {
        DEFAULT_LIMITS
    }
}

pub const DEFAULT_LIMITS: StabilityLimits = StabilityLimits {
    max_linear_velocity: 120.0,
    max_angular_velocity: 4.0,
    world_extent: 10_000.0,
    stuck_speed: 0.5,
    stuck_divergence: 6.0,
    stuck_blend: 0.5,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleConstants {
    // --- Chassis ---
    pub mass: f32,                   // kg
    pub wheelbase: f32,              // m (front axle to rear axle)
    pub track_width: f32,            // m (left to right)
    pub cg_height: f32,              // m
    pub front_weight_fraction: f32,  // 0..1 static load on the front axle
    pub wheel_radius: f32,           // m

    // --- Engine + brakes ---
    pub engine_force_low: f32,       // N, flat below 60 km/h
    pub engine_force_mid: f32,       // N, at 150 km/h
    pub engine_force_high: f32,      // N, at 250 km/h
    pub engine_force_min: f32,       // N, asymptote of the top-end tail
    pub reverse_force: f32,          // N
    pub engine_braking_force: f32,   // N, coasting
    pub brake_force: f32,            // N
    pub full_brake_multiplier: f32,  // `brake` input vs `backward` braking
    pub max_speed_kmh: f32,
    pub max_reverse_speed_kmh: f32,

    // --- Aero ---
    pub air_density: f32,            // kg/m³
    pub drag_coefficient: f32,       // Cd
    pub frontal_area: f32,           // m²
    pub downforce_coefficient: f32,  // Cl

    // --- DRS ---
    pub drs_activation_kmh: f32,
    pub drs_drag_multiplier: f32,
    pub drs_downforce_multiplier: f32,
    pub drs_boost_min_kmh: f32,
    pub drs_boost_max_kmh: f32,
    pub drs_boost_low: f32,          // N at drs_boost_min_kmh
    pub drs_boost_high: f32,         // N at drs_boost_max_kmh

    // --- Tires ---
    pub base_grip: f32,
    pub optimal_slip_deg: f32,
    pub slip_falloff_per_deg: f32,
    pub load_sensitivity: f32,       // grip lost per unit of load above nominal
    pub handbrake_rear_grip: f32,    // rear grip fraction with handbrake
    pub power_oversteer_rear_grip: f32,
    pub downforce_grip_factor: f32,
    pub lateral_transfer_penalty: f32,
    pub crawl_speed: f32,            // m/s, below this slip angle is not measured

    // --- Weight transfer ---
    pub longitudinal_transfer_factor: f32,
    pub lateral_transfer_factor: f32,

    // --- Steering ---
    pub max_steer_deg: f32,          // at rest
    pub mid_steer_deg: f32,          // at steer_band_low_kmh
    pub min_steer_deg: f32,          // from steer_band_high_kmh up
    pub steer_band_low_kmh: f32,
    pub steer_band_high_kmh: f32,
    pub steer_speed_deg: f32,        // deg/s toward the held direction
    pub centering_speed_deg: f32,    // deg/s back to center at rest
    pub centering_speed_gain: f32,   // extra centering per km/h
    pub max_turn_radius: f32,        // m, larger radii are treated as straight

    // --- Turn dynamics ---
    pub turn_influence: f32,
    pub drift_turn_influence: f32,
    pub drift_yaw_gain: f32,         // rad/s of extra yaw per rad of slip
    pub max_angular_velocity: f32,   // rad/s while gripped
    pub max_drift_angular_velocity: f32,
    pub angular_blend_rate: f32,     // 1/s toward target from engine yaw
    pub roll_pitch_damping: f32,     // 1/s

    // --- Drift ---
    pub drift_entry_deg: f32,
    pub drift_exit_deg: f32,
    pub min_drift_speed_kmh: f32,
    pub grip_lateral_correction: f32,  // 1/s lateral velocity decay while gripped
    pub drift_lateral_correction: f32, // 1/s while drifting

    // --- Smoothing rates (1/s) ---
    pub speed_smoothing: f32,
    pub g_smoothing: f32,
    pub slip_smoothing: f32,

    pub limits: StabilityLimits,
}

pub const GT_COUPE: VehicleConstants = VehicleConstants {
    mass: 1250.0,
    wheelbase: 2.6,
    track_width: 1.6,
    cg_height: 0.45,
    front_weight_fraction: 0.45,
    wheel_radius: 0.34,

    engine_force_low: 9000.0,
    engine_force_mid: 6500.0,
    engine_force_high: 4200.0,
    engine_force_min: 900.0,
    reverse_force: 4000.0,
    engine_braking_force: 500.0,
    brake_force: 15_000.0,
    full_brake_multiplier: 1.4,
    max_speed_kmh: 320.0,
    max_reverse_speed_kmh: 45.0,

    air_density: 1.225,
    drag_coefficient: 0.32,
    frontal_area: 2.0,
    downforce_coefficient: 1.1,

    drs_activation_kmh: 100.0,
    drs_drag_multiplier: 0.75,
    drs_downforce_multiplier: 0.6,
    drs_boost_min_kmh: 100.0,
    drs_boost_max_kmh: 300.0,
    drs_boost_low: 600.0,
    drs_boost_high: 1400.0,

    base_grip: 1.0,
    optimal_slip_deg: 8.0,
    slip_falloff_per_deg: 0.03,
    load_sensitivity: 0.3,
    handbrake_rear_grip: 0.35,
    power_oversteer_rear_grip: 0.8,
    downforce_grip_factor: 0.5,
    lateral_transfer_penalty: 0.3,
    crawl_speed: 1.0,

    longitudinal_transfer_factor: 1.0,
    lateral_transfer_factor: 1.0,

    max_steer_deg: 32.0,
    mid_steer_deg: 14.0,
    min_steer_deg: 5.0,
    steer_band_low_kmh: 80.0,
    steer_band_high_kmh: 220.0,
    steer_speed_deg: 120.0,
    centering_speed_deg: 160.0,
    centering_speed_gain: 0.01,
    max_turn_radius: 2000.0,

    turn_influence: 1.0,
    drift_turn_influence: 1.35,
    drift_yaw_gain: 1.5,
    max_angular_velocity: 2.2,
    max_drift_angular_velocity: 3.2,
    angular_blend_rate: 30.0,
    roll_pitch_damping: 12.0,

    drift_entry_deg: 12.0,
    drift_exit_deg: 5.0,
    min_drift_speed_kmh: 35.0,
    grip_lateral_correction: 14.0,
    drift_lateral_correction: 2.0,

    speed_smoothing: 15.0,
    g_smoothing: 8.0,
    slip_smoothing: 20.0,

    limits: DEFAULT_LIMITS,
};

impl Default for VehicleConstants {
    fn default() -> Self {
        GT_COUPE
    }
}

fn invalid(msg: String) -> DynamicsError {
    DynamicsError::Invalid(msg)
}

fn require_positive(name: &str, v: f32) -> DynamicsResult<()> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be > 0, got {v}")))
    }
}

impl VehicleConstants {
    pub fn from_json(json: &str) -> DynamicsResult<Self> {
        let constants: Self = serde_json::from_str(json)?;
        constants.validate()?;
        Ok(constants)
    }

    pub fn from_path(path: impl AsRef<Path>) -> DynamicsResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| DynamicsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> DynamicsResult<()> {
        for (name, v) in [
            ("mass", self.mass),
            ("wheelbase", self.wheelbase),
            ("track_width", self.track_width),
            ("cg_height", self.cg_height),
            ("wheel_radius", self.wheel_radius),
            ("max_speed_kmh", self.max_speed_kmh),
            ("air_density", self.air_density),
            ("frontal_area", self.frontal_area),
            ("base_grip", self.base_grip),
            ("optimal_slip_deg", self.optimal_slip_deg),
            ("max_turn_radius", self.max_turn_radius),
            ("max_angular_velocity", self.max_angular_velocity),
            ("max_drift_angular_velocity", self.max_drift_angular_velocity),
            ("angular_blend_rate", self.angular_blend_rate),
            ("speed_smoothing", self.speed_smoothing),
            ("g_smoothing", self.g_smoothing),
            ("slip_smoothing", self.slip_smoothing),
            ("limits.max_linear_velocity", self.limits.max_linear_velocity),
            ("limits.max_angular_velocity", self.limits.max_angular_velocity),
            ("limits.world_extent", self.limits.world_extent),
        ] {
            require_positive(name, v)?;
        }

        if !(0.0..1.0).contains(&self.front_weight_fraction) || self.front_weight_fraction == 0.0 {
            return Err(invalid(format!(
                "front_weight_fraction must be in (0, 1), got {}",
                self.front_weight_fraction
            )));
        }
        if self.max_reverse_speed_kmh < 0.0 {
            return Err(invalid(format!(
                "max_reverse_speed_kmh must be >= 0, got {}",
                self.max_reverse_speed_kmh
            )));
        }
        if self.engine_force_min < 0.0 || self.engine_force_min > self.engine_force_high {
            return Err(invalid(format!(
                "engine_force_min must be in [0, engine_force_high], got {}",
                self.engine_force_min
            )));
        }
        if self.drift_exit_deg < 0.0 || self.drift_exit_deg >= self.drift_entry_deg {
            return Err(invalid(format!(
                "drift_exit_deg must be >= 0 and < drift_entry_deg ({} vs {})",
                self.drift_exit_deg, self.drift_entry_deg
            )));
        }
        if !(self.min_steer_deg <= self.mid_steer_deg && self.mid_steer_deg <= self.max_steer_deg)
            || self.max_steer_deg >= 89.0
        {
            return Err(invalid(format!(
                "steer angles must satisfy min <= mid <= max < 89 deg, got {} / {} / {}",
                self.min_steer_deg, self.mid_steer_deg, self.max_steer_deg
            )));
        }
        if self.steer_band_low_kmh >= self.steer_band_high_kmh {
            return Err(invalid(format!(
                "steer_band_low_kmh must be < steer_band_high_kmh, got {} / {}",
                self.steer_band_low_kmh, self.steer_band_high_kmh
            )));
        }
        if self.drs_boost_min_kmh >= self.drs_boost_max_kmh {
            return Err(invalid(format!(
                "drs_boost_min_kmh must be < drs_boost_max_kmh, got {} / {}",
                self.drs_boost_min_kmh, self.drs_boost_max_kmh
            )));
        }
        if !(0.0..=1.0).contains(&self.limits.stuck_blend) {
            return Err(invalid(format!(
                "limits.stuck_blend must be in [0, 1], got {}",
                self.limits.stuck_blend
            )));
        }
        Ok(())
    }

    pub fn max_speed(&self) -> f32 {
        crate::dynamics::types::ms(self.max_speed_kmh)
    }

    pub fn max_reverse_speed(&self) -> f32 {
        crate::dynamics::types::ms(self.max_reverse_speed_kmh)
    }

    /// Static weight, N.
    pub fn weight(&self) -> f32 {
        self.mass * crate::dynamics::types::GRAVITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_constants_validate() {
        assert!(VehicleConstants::default().validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let c = VehicleConstants::from_json(r#"{"mass": 900.0, "limits": {"stuck_blend": 0.25}}"#)
            .unwrap();
        assert_eq!(c.mass, 900.0);
        assert_eq!(c.wheelbase, GT_COUPE.wheelbase);
        assert_eq!(c.limits.stuck_blend, 0.25);
        assert_eq!(c.limits.max_linear_velocity, DEFAULT_LIMITS.max_linear_velocity);
    }

    #[test]
    fn rejects_inverted_drift_band() {
        let c = VehicleConstants { drift_exit_deg: 15.0, ..Default::default() };
        assert!(matches!(c.validate(), Err(DynamicsError::Invalid(_))));
    }

    #[test]
    fn rejects_zero_mass() {
        let err = VehicleConstants::from_json(r#"{"mass": 0.0}"#).unwrap_err();
        assert!(err.to_string().contains("mass"));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        assert!(matches!(
            VehicleConstants::from_json("{ mass: }"),
            Err(DynamicsError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            VehicleConstants::from_path("/definitely/not/here.json"),
            Err(DynamicsError::Io { .. })
        ));
    }
}
