// ==============================================================================
// forces.rs — LONGITUDINAL FORCE MODEL (ENGINE + AERO + DRS + BRAKES)
// ==============================================================================
// Engine curve (km/h bands, continuous at every breakpoint):
//
//     kmh < 60         low
//     60  .. 150       low  -> mid   (linear)
//     150 .. 250       mid  -> high  (linear)
//     250 ..           min + (high - min) / (1 + ((kmh - 250) / 60)^2)
//
// Aero (quadratic in speed, modifier-scaled coefficients):
//
//     drag      = 0.5 * rho * Cd_eff * A * v^2
//     downforce = 0.5 * rho * Cl_eff * A * v^2
//
// DRS trades drag and downforce for straight-line speed above the activation
// speed, plus a boost force interpolated across the boost window.
//
// Output:
// - LongitudinalResult { speed, acceleration, downforce, ... }
// where downforce feeds weight transfer and grip.
// ==============================================================================

use crate::dynamics::config::VehicleConstants;
use crate::dynamics::modifiers::ModifierSet;
use crate::dynamics::types::{ControlInput, kmh, lerp};

const BAND_LOW_KMH: f32 = 60.0;
const BAND_MID_KMH: f32 = 150.0;
const BAND_HIGH_KMH: f32 = 250.0;
const TAIL_SPAN_KMH: f32 = 60.0;

/// Below this the car counts as stopped for brake/reverse decisions.
const STOP_SPEED: f32 = 0.1; // m/s

#[inline]
fn sign_or_zero(v: f32) -> f32 {
    if v > 0.0 { 1.0 } else if v < 0.0 { -1.0 } else { 0.0 }
}

// ====================================================================
// Engine curve
// ====================================================================

/// Raw engine force (N) at `speed` (m/s, either direction).
pub fn engine_force(c: &VehicleConstants, speed: f32) -> f32 {
    let v = kmh(speed.abs());

    if v < BAND_LOW_KMH {
        c.engine_force_low
    } else if v < BAND_MID_KMH {
        let t = (v - BAND_LOW_KMH) / (BAND_MID_KMH - BAND_LOW_KMH);
        lerp(c.engine_force_low, c.engine_force_mid, t)
    } else if v < BAND_HIGH_KMH {
        let t = (v - BAND_MID_KMH) / (BAND_HIGH_KMH - BAND_MID_KMH);
        lerp(c.engine_force_mid, c.engine_force_high, t)
    } else {
        let x = (v - BAND_HIGH_KMH) / TAIL_SPAN_KMH;
        c.engine_force_min + (c.engine_force_high - c.engine_force_min) / (1.0 + x * x)
    }
}

// ====================================================================
// Aero + DRS
// ====================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AeroForces {
    pub drag_coefficient: f32, // effective Cd after modifiers + DRS
    pub drag: f32,             // N, always >= 0
    pub downforce: f32,        // N, always >= 0
    pub drs_active: bool,
    pub drs_boost: f32,        // N, added to engine force while driving
}

/// Extra DRS force across the boost window; zero outside it.
pub fn drs_boost(c: &VehicleConstants, speed: f32) -> f32 {
    let v = kmh(speed.abs());
    if v < c.drs_boost_min_kmh || v > c.drs_boost_max_kmh {
        return 0.0;
    }
    let t = (v - c.drs_boost_min_kmh) / (c.drs_boost_max_kmh - c.drs_boost_min_kmh);
    lerp(c.drs_boost_low, c.drs_boost_high, t)
}

pub fn aero_forces(c: &VehicleConstants, m: &ModifierSet, speed: f32, drs_held: bool) -> AeroForces {
    let drs_active = drs_held && kmh(speed.abs()) >= c.drs_activation_kmh;

    let mut cd = c.drag_coefficient * m.drag;
    let mut cl = c.downforce_coefficient * m.downforce;
    if drs_active {
        cd *= c.drs_drag_multiplier;
        cl *= c.drs_downforce_multiplier;
    }

    let q = 0.5 * c.air_density * c.frontal_area * speed * speed;

    AeroForces {
        drag_coefficient: cd,
        drag: (q * cd).max(0.0),
        downforce: (q * cl).max(0.0),
        drs_active,
        drs_boost: if drs_active { drs_boost(c, speed) } else { 0.0 },
    }
}

// ====================================================================
// Result of longitudinal solve
// ====================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LongitudinalResult {
    pub speed: f32,        // m/s, new signed longitudinal speed (clamped)
    pub acceleration: f32, // m/s², realised over the tick
    pub drive_force: f32,  // N, engine/reverse + DRS boost
    pub brake_force: f32,  // N, magnitude
    pub aero: AeroForces,
}

/// One tick of longitudinal dynamics for signed `speed` (m/s, +forward).
pub fn solve_longitudinal(
    c: &VehicleConstants,
    m: &ModifierSet,
    input: &ControlInput,
    speed: f32,
    dt: f32,
) -> LongitudinalResult {
    let aero = aero_forces(c, m, speed, input.drs);
    let moving_forward = speed > STOP_SPEED;
    let moving = speed.abs() > STOP_SPEED;

    // -------------------------
    // BRAKE
    // -------------------------
    let brake_force = if input.brake && moving {
        c.brake_force * c.full_brake_multiplier * m.brake_efficiency
    } else if input.backward && moving_forward {
        c.brake_force * m.brake_efficiency
    } else {
        0.0
    };

    // -------------------------
    // DRIVE (engine / reverse)
    // -------------------------
    let mut drive_force = 0.0;
    if !input.brake {
        if input.forward {
            drive_force += engine_force(c, speed) * m.engine_efficiency + aero.drs_boost;
        }
        if input.backward && !moving_forward {
            drive_force -= c.reverse_force * m.engine_efficiency;
        }
    }

    // Coasting: engine braking on top of drag
    let coasting = !input.forward && !input.backward;
    let engine_braking = if coasting && moving { c.engine_braking_force } else { 0.0 };

    let resistive = aero.drag + brake_force + engine_braking;
    let net = drive_force - resistive * sign_or_zero(speed);

    let accel = net / c.mass;
    let mut new_speed = speed + accel * dt;

    // Resistance alone never reverses the direction of travel
    let flipped = speed != 0.0 && new_speed * speed < 0.0;
    let driven_that_way = drive_force != 0.0 && sign_or_zero(drive_force) == sign_or_zero(new_speed);
    if flipped && !driven_that_way {
        new_speed = 0.0;
    }

    let max_fwd = c.max_speed() * m.max_speed;
    let max_rev = c.max_reverse_speed() * m.max_speed;
    new_speed = new_speed.clamp(-max_rev, max_fwd);

    LongitudinalResult {
        speed: new_speed,
        acceleration: if dt > 0.0 { (new_speed - speed) / dt } else { 0.0 },
        drive_force,
        brake_force,
        aero,
    }
}
