// ==============================================================================
// solve.rs — PER-TICK VEHICLE INTEGRATION
// ==============================================================================
// integrate(dt, input, engine, modifiers) runs, in order:
//
//   1) Stability pre-check       (bad engine state -> reset, skip tick)
//   2) Chassis basis + measured forward/lateral speed
//   3) Stuck guard               (wedged body -> blend internal speed)
//   4) Force model               (engine, aero, DRS, brakes -> new speed)
//   5) Weight transfer           (smoothed G -> axle loads)
//   6) Slip + grip
//   7) Drift state machine
//   8) Steer ramp + turn dynamics
//   9) Lateral correction + target velocity (planar magnitude <= |speed|)
//  10) Output clamp + telemetry
//
// All intermediates live on the stack or in FrameScratch; nothing allocates.
// ==============================================================================

use nalgebra::{UnitQuaternion, Vector3};
use tracing::{debug, trace, warn};

use crate::dynamics::config::VehicleConstants;
use crate::dynamics::drift::{DriftState, DriftThresholds, update_drift_state};
use crate::dynamics::error::Recovery;
use crate::dynamics::forces::{LongitudinalResult, solve_longitudinal};
use crate::dynamics::grip::{GripResult, slip_angle_deg, solve_grip};
use crate::dynamics::modifiers::ModifierSet;
use crate::dynamics::stability::{self, Corruption};
use crate::dynamics::state::VehicleState;
use crate::dynamics::steering::{TurnInputs, TurnResult, solve_turn, update_steer_angle};
use crate::dynamics::telemetry::{self, Telemetry, TelemetryFrame};
use crate::dynamics::types::{
    ControlInput, EngineState, GRAVITY, Transform, blend_factor, lerp, sanitize,
};
use crate::dynamics::weight_transfer::{AxleLoads, axle_loads};

/// Lateral correction used when the computed one is not finite.
const FALLBACK_LATERAL_CORRECTION: f32 = 0.5;

/// Reused every tick; holds the chassis basis and the velocities being built.
#[derive(Debug, Clone, Copy)]
pub struct FrameScratch {
    pub forward: Vector3<f32>, // planar, unit
    pub left: Vector3<f32>,    // planar, unit
    pub target_velocity: Vector3<f32>,
    pub target_angular: Vector3<f32>,
}

impl Default for FrameScratch {
    fn default() -> Self {
        Self {
            forward: Vector3::z(),
            left: Vector3::x(),
            target_velocity: Vector3::zeros(),
            target_angular: Vector3::zeros(),
        }
    }
}

impl FrameScratch {
    /// Planar chassis basis from the engine rotation. Keeps the previous basis
    /// if the nose points straight up or down.
    fn update_basis(&mut self, rotation: &UnitQuaternion<f32>) {
        let mut fwd = rotation * Vector3::z();
        fwd.y = 0.0;
        let n = fwd.norm();
        if n > 1e-4 && n.is_finite() {
            self.forward = fwd / n;
            self.left = Vector3::y().cross(&self.forward);
        }
    }
}

/// Everything one tick produces for the physics engine and telemetry.
#[derive(Debug, Clone, Copy)]
pub struct TickOutput {
    /// Target velocity. x/z are computed; y is the engine's own value.
    pub linear_velocity: Vector3<f32>,
    /// Target angular velocity. y is the yaw target; x/z are damped toward zero.
    pub angular_velocity: Vector3<f32>,
    /// Set when the stability guard needs the body moved back to spawn.
    pub teleport: Option<Transform>,
    pub recovery: Recovery,
    pub drift: DriftState,
    pub telemetry: Telemetry,
}

/// Intermediate values of the last completed tick, for debugging and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickDiagnostics {
    pub longitudinal: LongitudinalResult,
    pub loads: AxleLoads,
    pub grip: GripResult,
    pub turn: TurnResult,
    pub lateral_correction: f32,
}

pub struct VehicleDynamics {
    constants: VehicleConstants,
    spawn: Transform,
    state: VehicleState,
    scratch: FrameScratch,
    diagnostics: TickDiagnostics,
}

impl VehicleDynamics {
    pub fn new(constants: VehicleConstants, spawn: Transform) -> Self {
        let mut scratch = FrameScratch::default();
        scratch.update_basis(&spawn.rotation);
        Self {
            constants,
            spawn,
            state: VehicleState::new(),
            scratch,
            diagnostics: TickDiagnostics::default(),
        }
    }

    pub fn constants(&self) -> &VehicleConstants {
        &self.constants
    }

    pub fn state(&self) -> &VehicleState {
        &self.state
    }

    pub fn spawn(&self) -> Transform {
        self.spawn
    }

    pub fn diagnostics(&self) -> &TickDiagnostics {
        &self.diagnostics
    }

    pub fn integrate(
        &mut self,
        dt: f32,
        input: &ControlInput,
        engine: &EngineState,
        modifiers: &ModifierSet,
    ) -> TickOutput {
        let c = self.constants;
        let dt = sanitize(dt, 0.0).max(0.0);

        // 1) Stability pre-check
        if let Some(corruption) = stability::inspect(engine, &c.limits) {
            return self.recover(corruption, engine);
        }

        let m = modifiers.sanitized();

        // 2) Basis + measured speeds
        self.scratch.update_basis(&engine.rotation);
        let actual_forward = engine.linear_velocity.dot(&self.scratch.forward);
        let actual_lateral = engine.linear_velocity.dot(&self.scratch.left);
        let actual_planar = actual_forward.hypot(actual_lateral);

        // 3) Stuck guard
        let mut recovery = Recovery::None;
        if let Some(blended) = stability::stuck_speed(&c.limits, self.state.speed, actual_forward, actual_planar) {
            debug!(internal = self.state.speed, actual = actual_forward, blended, "stuck guard engaged");
            self.state.speed = blended;
            recovery = Recovery::StuckBlend;
        }

        // 4) Force model
        let long = solve_longitudinal(&c, &m, input, self.state.speed, dt);
        let speed = sanitize(long.speed, 0.0);

        let s = &mut self.state.smoothed;
        s.speed = sanitize(lerp(s.speed, speed, blend_factor(c.speed_smoothing, dt)), speed);

        // 5) Weight transfer
        let g_blend = blend_factor(c.g_smoothing, dt);
        let long_g = long.acceleration / GRAVITY;
        let lat_g = s.angular_velocity.abs() * speed.abs() / GRAVITY;
        s.longitudinal_g = sanitize(lerp(s.longitudinal_g, long_g, g_blend), 0.0);
        s.lateral_g = sanitize(lerp(s.lateral_g, lat_g, g_blend), 0.0);
        let loads = axle_loads(&c, s.longitudinal_g, s.lateral_g, long.aero.downforce);

        // 6) Slip + grip
        let raw_slip = slip_angle_deg(&c, actual_lateral, actual_forward);
        s.slip_angle_deg = sanitize(
            lerp(s.slip_angle_deg, raw_slip, blend_factor(c.slip_smoothing, dt)),
            0.0,
        );
        let slip = s.slip_angle_deg;
        let smoothed_speed = s.speed;
        let grip = solve_grip(&c, &m, input, slip, speed, &loads, long.aero.downforce);

        // 7) Drift state machine
        let thresholds = DriftThresholds::new(&c, &m);
        let drift = update_drift_state(self.state.drift, slip, smoothed_speed, &thresholds);
        if drift != self.state.drift {
            debug!(?drift, slip, speed = smoothed_speed, "drift state changed");
        }
        self.state.drift = drift;
        let sliding = drift.is_drifting() || input.handbrake;

        // 8) Steering + turn dynamics
        self.state.steer_angle_deg =
            update_steer_angle(&c, &m, input, self.state.steer_angle_deg, smoothed_speed, dt);
        let turn = solve_turn(
            &c,
            &TurnInputs {
                speed,
                steer_deg: self.state.steer_angle_deg,
                slip_deg: slip,
                grip: grip.combined,
                drifting: drift.is_drifting(),
                handbrake: input.handbrake,
                engine_angular: [engine.angular_velocity.x, engine.angular_velocity.y, engine.angular_velocity.z],
                dt,
            },
        );
        if turn.degenerate && self.state.steer_angle_deg != 0.0 {
            trace!(steer = self.state.steer_angle_deg, "degenerate turn geometry, yaw target zeroed");
        }
        let yaw = sanitize(turn.yaw, 0.0);

        // 9) Lateral correction
        let rate = if sliding {
            c.drift_lateral_correction * m.drift_lateral_correction
        } else {
            c.grip_lateral_correction
        };
        let correction = sanitize(blend_factor(rate * grip.combined, dt), FALLBACK_LATERAL_CORRECTION);
        let lateral = sanitize(actual_lateral * (1.0 - correction), 0.0);

        // Rotating the heading must not pump energy into the slide
        let mut planar = self.scratch.forward * speed + self.scratch.left * lateral;
        let cap = speed.abs().max(c.crawl_speed);
        let mag = planar.norm();
        if mag > cap {
            planar *= cap / mag;
        }
        let lateral = planar.dot(&self.scratch.left);
        self.scratch.target_velocity = Vector3::new(planar.x, engine.linear_velocity.y, planar.z);
        self.scratch.target_angular = Vector3::new(turn.roll, yaw, turn.pitch);

        // 10) Clamp + telemetry
        let (linear, angular) = stability::clamp_output(
            &c.limits,
            &self.scratch.target_velocity,
            &self.scratch.target_angular,
        );

        let st = &mut self.state;
        st.speed = speed;
        st.lateral_speed = lateral;
        st.linear_velocity = linear;
        st.angular_velocity = angular.y;
        st.smoothed.angular_velocity = angular.y; // yaw is already blended in solve_turn

        let forward_out = linear.dot(&self.scratch.forward);
        telemetry::advance_wheels(&mut st.wheel_rotation, forward_out, c.wheel_radius, dt);

        self.diagnostics = TickDiagnostics {
            longitudinal: long,
            loads,
            grip,
            turn,
            lateral_correction: correction,
        };

        TickOutput {
            linear_velocity: linear,
            angular_velocity: angular,
            teleport: None,
            recovery,
            drift,
            telemetry: telemetry::emit(&TelemetryFrame {
                velocity: &linear,
                forward_speed: forward_out,
                position: &engine.position,
                rotation: &engine.rotation,
                steer_angle_deg: st.steer_angle_deg,
                wheel_rotations: st.wheel_rotation,
                drifting: drift.is_drifting(),
            }),
        }
    }

    fn recover(&mut self, corruption: Corruption, engine: &EngineState) -> TickOutput {
        warn!(?corruption, "non-finite vehicle state, resetting");
        self.state.reset();
        self.scratch.target_velocity = Vector3::zeros();
        self.scratch.target_angular = Vector3::zeros();

        let teleport = corruption.needs_teleport().then_some(self.spawn);
        let at = teleport.unwrap_or(Transform {
            position: engine.position,
            rotation: engine.rotation,
        });
        self.scratch.update_basis(&at.rotation);

        TickOutput {
            linear_velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
            teleport,
            recovery: Recovery::Reset,
            drift: DriftState::Gripped,
            telemetry: telemetry::emit(&TelemetryFrame {
                velocity: &Vector3::zeros(),
                forward_speed: 0.0,
                position: &at.position,
                rotation: &at.rotation,
                steer_angle_deg: 0.0,
                wheel_rotations: self.state.wheel_rotation,
                drifting: false,
            }),
        }
    }
}
