// ==============================================================================
// grip.rs — TIRE SLIP + GRIP (SIMPLIFIED PACEJKA-STYLE CURVE)
// ==============================================================================
// slip angle α = atan2(v_lat, |v_long|)   (degrees)
//
// efficiency(α):
//     |α| <  α_opt   0.7 -> 1.0 ramp
//     |α| >= α_opt   1.0 - (|α| - α_opt) * falloff, floored at 0.5
//
// per-axle grip = base * friction_mod * efficiency * load_factor(axle load)
//
// Rear axle extras (above min drift speed):
// - handbrake      -> rear * handbrake_rear_grip
// - power oversteer -> rear * power_oversteer_rear_grip (throttle + steer)
//
// combined = (0.6 * rear + 0.4 * front)
//          * (1 + downforce / weight * k_df)
//          * (1 - lat_transfer / weight * k_lat)
// sanitized to a finite positive value (fallback 1.0).
// ==============================================================================

use crate::dynamics::config::VehicleConstants;
use crate::dynamics::modifiers::ModifierSet;
use crate::dynamics::types::{ControlInput, ms};
use crate::dynamics::weight_transfer::AxleLoads;

const EFFICIENCY_AT_ZERO_SLIP: f32 = 0.7;
const EFFICIENCY_FLOOR: f32 = 0.5;
const LOAD_FACTOR_FLOOR: f32 = 0.6;
const REAR_WEIGHT: f32 = 0.6;
const MIN_COMBINED_GRIP: f32 = 0.05;

/// Slip angle in degrees, signed by the lateral component. Zero at crawl speed.
pub fn slip_angle_deg(c: &VehicleConstants, lateral: f32, forward: f32) -> f32 {
    if lateral.abs() < c.crawl_speed && forward.abs() < c.crawl_speed {
        return 0.0;
    }
    lateral.atan2(forward.abs()).to_degrees()
}

pub fn slip_efficiency(c: &VehicleConstants, slip_deg: f32) -> f32 {
    let a = slip_deg.abs();
    let opt = c.optimal_slip_deg;
    if a < opt {
        EFFICIENCY_AT_ZERO_SLIP + (1.0 - EFFICIENCY_AT_ZERO_SLIP) * (a / opt)
    } else {
        (1.0 - (a - opt) * c.slip_falloff_per_deg).max(EFFICIENCY_FLOOR)
    }
}

/// 1.0 up to the nominal (static) load, then a mild penalty per unit overload.
pub fn load_factor(c: &VehicleConstants, load: f32, nominal: f32) -> f32 {
    if nominal <= 0.0 {
        return 1.0;
    }
    let ratio = load / nominal;
    if ratio <= 1.0 {
        1.0
    } else {
        (1.0 - (ratio - 1.0) * c.load_sensitivity).clamp(LOAD_FACTOR_FLOOR, 1.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GripResult {
    pub efficiency: f32,
    pub front: f32,
    pub rear: f32,
    pub combined: f32,
}

pub fn solve_grip(
    c: &VehicleConstants,
    m: &ModifierSet,
    input: &ControlInput,
    slip_deg: f32,
    speed: f32,
    loads: &AxleLoads,
    downforce: f32,
) -> GripResult {
    let efficiency = slip_efficiency(c, slip_deg);
    let base = c.base_grip * m.friction_slip * efficiency;

    let weight = c.weight();
    let nominal_front = weight * c.front_weight_fraction;
    let nominal_rear = weight - nominal_front;

    let front = base * load_factor(c, loads.front, nominal_front);
    let mut rear = base * load_factor(c, loads.rear, nominal_rear);

    let above_drift_speed = speed.abs() > ms(c.min_drift_speed_kmh);
    if above_drift_speed {
        if input.handbrake {
            rear *= c.handbrake_rear_grip;
        }
        if input.forward && input.is_steering() {
            rear *= c.power_oversteer_rear_grip;
        }
    }

    let mut combined = REAR_WEIGHT * rear + (1.0 - REAR_WEIGHT) * front;
    combined *= 1.0 + downforce.max(0.0) / weight * c.downforce_grip_factor;
    combined *= (1.0 - loads.lateral_transfer / weight * c.lateral_transfer_penalty).max(0.0);

    let combined = if combined.is_finite() && combined > 0.0 {
        combined.max(MIN_COMBINED_GRIP)
    } else {
        1.0
    };

    GripResult { efficiency, front, rear, combined }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::weight_transfer::axle_loads;

    fn setup() -> (VehicleConstants, AxleLoads) {
        let c = VehicleConstants::default();
        let loads = axle_loads(&c, 0.0, 0.0, 0.0);
        (c, loads)
    }

    #[test]
    fn efficiency_peaks_at_optimal_slip() {
        let (c, _) = setup();
        assert!((slip_efficiency(&c, 0.0) - 0.7).abs() < 1e-6);
        assert!((slip_efficiency(&c, c.optimal_slip_deg) - 1.0).abs() < 1e-6);
        assert!(slip_efficiency(&c, c.optimal_slip_deg + 5.0) < 1.0);
        assert_eq!(slip_efficiency(&c, 90.0), 0.5);
        assert_eq!(slip_efficiency(&c, -4.0), slip_efficiency(&c, 4.0));
    }

    #[test]
    fn slip_angle_is_zero_at_crawl() {
        let (c, _) = setup();
        assert_eq!(slip_angle_deg(&c, 0.2, 0.3), 0.0);
        assert!((slip_angle_deg(&c, 10.0, 10.0) - 45.0).abs() < 1e-3);
        assert!(slip_angle_deg(&c, -5.0, -20.0) < 0.0);
    }

    #[test]
    fn overload_is_mildly_penalised() {
        let (c, _) = setup();
        assert_eq!(load_factor(&c, 500.0, 1000.0), 1.0);
        let f = load_factor(&c, 1500.0, 1000.0);
        assert!(f < 1.0 && f >= LOAD_FACTOR_FLOOR);
    }

    #[test]
    fn handbrake_reduces_rear_grip_above_drift_speed() {
        let (c, loads) = setup();
        let m = ModifierSet::IDENTITY;
        let speed = ms(60.0);
        let free = solve_grip(&c, &m, &ControlInput::default(), 3.0, speed, &loads, 0.0);
        let pulled = solve_grip(
            &c,
            &m,
            &ControlInput { handbrake: true, ..Default::default() },
            3.0,
            speed,
            &loads,
            0.0,
        );
        assert!(pulled.rear < free.rear);
        assert_eq!(pulled.front, free.front);
    }

    #[test]
    fn handbrake_ignored_when_slow() {
        let (c, loads) = setup();
        let m = ModifierSet::IDENTITY;
        let input = ControlInput { handbrake: true, ..Default::default() };
        let slow = solve_grip(&c, &m, &input, 0.0, 2.0, &loads, 0.0);
        let free = solve_grip(&c, &m, &ControlInput::default(), 0.0, 2.0, &loads, 0.0);
        assert_eq!(slow.rear, free.rear);
    }

    #[test]
    fn power_oversteer_reduces_rear_grip() {
        let (c, loads) = setup();
        let m = ModifierSet::IDENTITY;
        let speed = ms(80.0);
        let straight = solve_grip(&c, &m, &ControlInput { forward: true, ..Default::default() }, 3.0, speed, &loads, 0.0);
        let turning = solve_grip(
            &c,
            &m,
            &ControlInput { forward: true, left: true, ..Default::default() },
            3.0,
            speed,
            &loads,
            0.0,
        );
        assert!(turning.rear < straight.rear);
    }

    #[test]
    fn downforce_increases_combined_grip() {
        let (c, loads) = setup();
        let m = ModifierSet::IDENTITY;
        let none = solve_grip(&c, &m, &ControlInput::default(), 3.0, 40.0, &loads, 0.0);
        let some = solve_grip(&c, &m, &ControlInput::default(), 3.0, 40.0, &loads, 3000.0);
        assert!(some.combined > none.combined);
    }

    #[test]
    fn non_finite_grip_falls_back_to_one() {
        let (c, loads) = setup();
        let m = ModifierSet { friction_slip: f32::NAN, ..ModifierSet::IDENTITY };
        let r = solve_grip(&c, &m, &ControlInput::default(), 0.0, 10.0, &loads, 0.0);
        assert_eq!(r.combined, 1.0);
    }
}
