//! Core shared types for `dynamics` (engine-agnostic).
// dynamics/types.rs

use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

pub const GRAVITY: f32 = 9.81;   // m/s²
pub const MS_TO_KMH: f32 = 3.6;

// ----- tiny scalar helpers -----
#[inline] pub fn lerp(a: f32, b: f32, t: f32) -> f32 { a + (b - a) * t }
#[inline] pub fn kmh(ms: f32) -> f32 { ms * MS_TO_KMH }
#[inline] pub fn ms(kmh: f32) -> f32 { kmh / MS_TO_KMH }

#[inline]
pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Frame-rate independent exponential blend weight: 1 - e^(-rate*dt).
#[inline]
pub fn blend_factor(rate: f32, dt: f32) -> f32 {
    (1.0 - (-rate * dt).exp()).clamp(0.0, 1.0)
}

/// Replace non-finite values with `fallback`.
#[inline]
pub fn sanitize(v: f32, fallback: f32) -> f32 {
    if v.is_finite() { v } else { fallback }
}

#[inline]
pub fn vec_is_finite(v: &Vector3<f32>) -> bool {
    v.x.is_finite() && v.y.is_finite() && v.z.is_finite()
}

// ============================================
// ----- per-tick inputs ----------------------
// ============================================

/// Driver intent for one tick. Assembled upstream from every input source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlInput {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub brake: bool,
    pub handbrake: bool,
    pub drs: bool,
}

impl ControlInput {
    /// -1 (right) .. 1 (left), 0 when both or neither are held.
    pub fn steer_direction(&self) -> f32 {
        match (self.left, self.right) {
            (true, false) => 1.0,
            (false, true) => -1.0,
            _ => 0.0,
        }
    }

    pub fn is_steering(&self) -> bool {
        self.steer_direction() != 0.0
    }
}

/// Rigid body state reported by the physics engine at the start of a tick.
///
/// Chassis basis convention: +Z forward, +Y up, +X left (right-handed).
#[derive(Debug, Clone, Copy)]
pub struct EngineState {
    pub position: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub linear_velocity: Vector3<f32>,
    pub angular_velocity: Vector3<f32>,
}

impl EngineState {
    pub fn at_rest(transform: Transform) -> Self {
        Self {
            position: transform.position,
            rotation: transform.rotation,
            linear_velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
}

impl Transform {
    pub fn new(position: Vector3<f32>, yaw: f32) -> Self {
        Self {
            position,
            rotation: UnitQuaternion::from_axis_angle(&Vector3::y_axis(), yaw),
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self { position: Vector3::zeros(), rotation: UnitQuaternion::identity() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steer_direction_cancels_when_both_held() {
        let input = ControlInput { left: true, right: true, ..Default::default() };
        assert_eq!(input.steer_direction(), 0.0);
        assert!(!input.is_steering());
    }

    #[test]
    fn blend_factor_is_bounded() {
        assert_eq!(blend_factor(10.0, 0.0), 0.0);
        assert!(blend_factor(10.0, 1.0) > 0.99);
        assert!(blend_factor(10.0, 1.0) <= 1.0);
    }

    #[test]
    fn control_input_deserializes_missing_fields_as_false() {
        let input: ControlInput = serde_json::from_str(r#"{"forward":true}"#).unwrap();
        assert!(input.forward);
        assert!(!input.brake && !input.drs);
    }

    #[test]
    fn yaw_transform_turns_forward_toward_left() {
        let t = Transform::new(Vector3::zeros(), std::f32::consts::FRAC_PI_2);
        let fwd = t.rotation * Vector3::z();
        assert!((fwd.x - 1.0).abs() < 1e-5);
    }
}
