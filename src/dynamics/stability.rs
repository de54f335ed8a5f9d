// ==============================================================================
// stability.rs — STABILITY GUARD (NUMERICAL RECOVERY + OUTPUT CLAMPS)
// ------------------------------------------------------------------------------
// Pre-tick:  inspect() flags non-finite engine state. The caller zeroes the
//            car, resets smoothing, and skips the tick; a bad transform also
//            teleports to spawn.
// Mid-tick:  stuck_speed() pulls a runaway internal speed back toward what the
//            engine actually reports when the body is wedged.
// Post-tick: clamp_output() bounds every component written back.
//
// Zeroing masks the cause. Runaway at extreme steer/speed combinations is a
// known limitation, not something this module tries to diagnose.
// ==============================================================================

use nalgebra::Vector3;

use crate::dynamics::config::StabilityLimits;
use crate::dynamics::types::{EngineState, vec_is_finite};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corruption {
    /// Velocities are bad but the body is somewhere sensible.
    Velocity,
    /// Position or orientation is bad (or outside the world); teleport.
    Transform,
}

impl Corruption {
    pub fn needs_teleport(&self) -> bool {
        matches!(self, Corruption::Transform)
    }
}

pub fn inspect(engine: &EngineState, limits: &StabilityLimits) -> Option<Corruption> {
    let position_ok = vec_is_finite(&engine.position)
        && engine.position.x.abs() <= limits.world_extent
        && engine.position.y.abs() <= limits.world_extent
        && engine.position.z.abs() <= limits.world_extent;
    let rotation_ok = engine.rotation.quaternion().coords.iter().all(|v| v.is_finite());

    if !position_ok || !rotation_ok {
        return Some(Corruption::Transform);
    }
    if !vec_is_finite(&engine.linear_velocity) || !vec_is_finite(&engine.angular_velocity) {
        return Some(Corruption::Velocity);
    }
    None
}

/// Blended internal speed when the body is wedged, `None` otherwise.
///
/// `planar` is the full horizontal speed: a car sliding sideways has almost
/// no forward component but is not wedged.
pub fn stuck_speed(limits: &StabilityLimits, internal: f32, actual: f32, planar: f32) -> Option<f32> {
    if planar.abs() < limits.stuck_speed && (internal - actual).abs() > limits.stuck_divergence {
        Some(internal + (actual - internal) * limits.stuck_blend)
    } else {
        None
    }
}

#[inline]
fn clamp_vec(v: &Vector3<f32>, max: f32) -> Vector3<f32> {
    Vector3::new(
        v.x.clamp(-max, max),
        v.y.clamp(-max, max),
        v.z.clamp(-max, max),
    )
}

/// Replace non-finite components with zero, then clamp each to its limit.
pub fn clamp_output(
    limits: &StabilityLimits,
    linear: &Vector3<f32>,
    angular: &Vector3<f32>,
) -> (Vector3<f32>, Vector3<f32>) {
    let linear = linear.map(|x| if x.is_finite() { x } else { 0.0 });
    let angular = angular.map(|x| if x.is_finite() { x } else { 0.0 });
    (
        clamp_vec(&linear, limits.max_linear_velocity),
        clamp_vec(&angular, limits.max_angular_velocity),
    )
}
