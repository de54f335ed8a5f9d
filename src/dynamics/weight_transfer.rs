// ==============================================================================
// weight_transfer.rs — LONGITUDINAL / LATERAL LOAD TRANSFER
// ------------------------------------------------------------------------------
//     long_transfer = long_g * g * m * h / wheelbase * long_factor
//     lat_transfer  = |lat_g| * g * m * h / track   * lat_factor
//
// Vertical load (weight + downforce) is split by the static front fraction;
// acceleration moves load rearward, braking moves it forward. The G inputs are
// the smoothed values held in VehicleState, so grip never sees a raw spike.
// ==============================================================================

use crate::dynamics::config::VehicleConstants;
use crate::dynamics::types::GRAVITY;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AxleLoads {
    pub front: f32,                 // N
    pub rear: f32,                  // N
    pub total: f32,                 // N, weight + downforce
    pub longitudinal_transfer: f32, // N, +ve = toward the rear
    pub lateral_transfer: f32,      // N, magnitude
}

pub fn longitudinal_transfer(c: &VehicleConstants, longitudinal_g: f32) -> f32 {
    (longitudinal_g * GRAVITY * c.mass * c.cg_height / c.wheelbase) * c.longitudinal_transfer_factor
}

pub fn lateral_transfer(c: &VehicleConstants, lateral_g: f32) -> f32 {
    (lateral_g.abs() * GRAVITY * c.mass * c.cg_height / c.track_width) * c.lateral_transfer_factor
}

/// Per-axle normal loads from smoothed G (in g) and current downforce (N).
pub fn axle_loads(c: &VehicleConstants, longitudinal_g: f32, lateral_g: f32, downforce: f32) -> AxleLoads {
    let total = c.weight() + downforce.max(0.0);
    let front_base = total * c.front_weight_fraction;
    let rear_base = total - front_base;

    let long = longitudinal_transfer(c, longitudinal_g);

    // Neither axle goes light past zero
    let long = long.clamp(-rear_base, front_base);

    AxleLoads {
        front: front_base - long,
        rear: rear_base + long,
        total,
        longitudinal_transfer: long,
        lateral_transfer: lateral_transfer(c, lateral_g),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_split_follows_front_fraction() {
        let c = VehicleConstants::default();
        let loads = axle_loads(&c, 0.0, 0.0, 0.0);
        assert!((loads.front - c.weight() * c.front_weight_fraction).abs() < 1e-2);
        assert!((loads.front + loads.rear - c.weight()).abs() < 1e-2);
    }

    #[test]
    fn acceleration_loads_the_rear() {
        let c = VehicleConstants::default();
        let still = axle_loads(&c, 0.0, 0.0, 0.0);
        let accel = axle_loads(&c, 0.5, 0.0, 0.0);
        let brake = axle_loads(&c, -0.8, 0.0, 0.0);
        assert!(accel.rear > still.rear && accel.front < still.front);
        assert!(brake.front > still.front && brake.rear < still.rear);
    }

    #[test]
    fn loads_never_go_negative() {
        let c = VehicleConstants::default();
        let extreme = axle_loads(&c, -50.0, 0.0, 0.0);
        assert!(extreme.rear >= 0.0);
        assert!((extreme.front - extreme.total).abs() < 1e-2);
    }

    #[test]
    fn lateral_transfer_ignores_direction() {
        let c = VehicleConstants::default();
        assert_eq!(lateral_transfer(&c, 1.2), lateral_transfer(&c, -1.2));
        assert!(lateral_transfer(&c, 1.2) > 0.0);
    }

    #[test]
    fn downforce_adds_vertical_load() {
        let c = VehicleConstants::default();
        let loads = axle_loads(&c, 0.0, 0.0, 2000.0);
        assert!((loads.total - (c.weight() + 2000.0)).abs() < 1e-2);
    }
}
