use nalgebra::Vector3;

use crate::dynamics::drift::DriftState;

/// Exponentially smoothed quantities. They persist across ticks so grip and
/// steering never react to a single-frame spike.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Smoothed {
    pub speed: f32,            // m/s, signed
    pub lateral_g: f32,        // g
    pub longitudinal_g: f32,   // g
    pub slip_angle_deg: f32,
    pub angular_velocity: f32, // rad/s, yaw
}

/// Mutable per-car state. Owned by one `VehicleDynamics`, mutated once per tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VehicleState {
    pub speed: f32,                     // m/s, internal longitudinal target
    pub lateral_speed: f32,             // m/s, +left, after correction
    pub linear_velocity: Vector3<f32>,  // last target velocity written back
    pub angular_velocity: f32,          // rad/s, last yaw rate written back
    pub steer_angle_deg: f32,
    pub wheel_rotation: [f32; 4],       // rad, FL FR RL RR
    pub drift: DriftState,
    pub smoothed: Smoothed,
}

impl VehicleState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero every dynamic quantity. Wheel angles are cosmetic and survive.
    pub fn reset(&mut self) {
        let wheels = self.wheel_rotation;
        *self = Self { wheel_rotation: wheels, ..Self::default() };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_zeroes_dynamics_but_keeps_wheels() {
        let mut s = VehicleState {
            speed: 12.0,
            angular_velocity: 1.0,
            steer_angle_deg: 8.0,
            wheel_rotation: [1.0, 2.0, 3.0, 4.0],
            drift: DriftState::Drifting,
            smoothed: Smoothed { speed: 11.0, slip_angle_deg: 14.0, ..Default::default() },
            ..Default::default()
        };
        s.reset();
        assert_eq!(s.speed, 0.0);
        assert_eq!(s.smoothed, Smoothed::default());
        assert_eq!(s.drift, DriftState::Gripped);
        assert_eq!(s.wheel_rotation, [1.0, 2.0, 3.0, 4.0]);
    }
}
