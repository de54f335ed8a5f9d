// ==============================================================================
// telemetry.rs — TELEMETRY SNAPSHOT (PLAIN DATA FOR HUD / NETWORK)
// ------------------------------------------------------------------------------
// Speed comes from the clamped velocity actually written back, not from the
// internal target. Gear is a fixed km/h table; -1 reversing, 0 stationary.
// ==============================================================================

use std::f32::consts::TAU;

use nalgebra::{UnitQuaternion, Vector3};
use serde::Serialize;

use crate::dynamics::types::kmh;

/// Upshift points (km/h). Gear n is selected above entry n-1.
pub const GEAR_TABLE_KMH: [f32; 6] = [45.0, 85.0, 125.0, 170.0, 215.0, 260.0];

const STATIONARY_KMH: f32 = 1.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Telemetry {
    pub speed_kmh: f32,
    pub gear: i8,
    pub position: [f32; 3],
    pub rotation: [f32; 4],        // quaternion x, y, z, w
    pub steer_angle_deg: f32,
    pub wheel_rotations: [f32; 4], // rad, FL FR RL RR
    pub drifting: bool,
}

/// Gear for a signed forward speed (m/s).
pub fn gear_for(forward_speed: f32) -> i8 {
    let v = kmh(forward_speed);
    if v.abs() < STATIONARY_KMH {
        return 0;
    }
    if v < 0.0 {
        return -1;
    }
    let upshifts = GEAR_TABLE_KMH.iter().filter(|&&t| v >= t).count();
    (upshifts + 1) as i8
}

/// Roll each wheel forward by `speed / radius * dt`, wrapped to [0, 2π).
pub fn advance_wheels(rotations: &mut [f32; 4], forward_speed: f32, wheel_radius: f32, dt: f32) {
    if wheel_radius <= 0.0 {
        return;
    }
    let delta = forward_speed / wheel_radius * dt;
    if !delta.is_finite() {
        return;
    }
    for r in rotations.iter_mut() {
        *r = (*r + delta).rem_euclid(TAU);
    }
}

pub struct TelemetryFrame<'a> {
    pub velocity: &'a Vector3<f32>,
    pub forward_speed: f32,
    pub position: &'a Vector3<f32>,
    pub rotation: &'a UnitQuaternion<f32>,
    pub steer_angle_deg: f32,
    pub wheel_rotations: [f32; 4],
    pub drifting: bool,
}

pub fn emit(frame: &TelemetryFrame<'_>) -> Telemetry {
    let q = frame.rotation.quaternion();
    Telemetry {
        speed_kmh: kmh(frame.velocity.norm()),
        gear: gear_for(frame.forward_speed),
        position: [frame.position.x, frame.position.y, frame.position.z],
        rotation: [q.i, q.j, q.k, q.w],
        steer_angle_deg: frame.steer_angle_deg,
        wheel_rotations: frame.wheel_rotations,
        drifting: frame.drifting,
    }
}
