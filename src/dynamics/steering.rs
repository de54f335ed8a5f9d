// ==============================================================================
// steering.rs — STEER RAMP + TURN DYNAMICS (ACKERMANN YAW RATE)
// ==============================================================================
// Responsibilities:
// - Speed-dependent steering limit (large at rest, small at top speed)
// - Ramp the steer angle toward the held direction, self-center otherwise
// - Convert steer angle into a target yaw rate (bicycle / Ackermann model)
// - Scale by grip, add drift rotation, cap, and blend from the engine's yaw
// - Damp roll and pitch toward zero (yaw-only chassis)
// ------------------------------------------------------------------------------
//     R = wheelbase / tan(|δ|)          (degenerate tan or huge R -> ω = 0)
//     ω = v / R * sign(δ)
//     ω_target = ω * influence(grip, drifting) + drift_yaw
//     ω_out = lerp(ω_engine, clamp(ω_target, ±cap), blend(dt))
//
// Sign convention: +δ steers left, +ω yaws left (about +Y).
// ==============================================================================

use crate::dynamics::config::VehicleConstants;
use crate::dynamics::modifiers::ModifierSet;
use crate::dynamics::types::{ControlInput, blend_factor, kmh, lerp, smoothstep};

const MIN_TAN: f32 = 1e-4;

/// Steering limit in degrees at `speed` (m/s).
pub fn max_steer_deg(c: &VehicleConstants, m: &ModifierSet, speed: f32) -> f32 {
    let v = kmh(speed.abs());
    let deg = if v <= c.steer_band_low_kmh {
        let t = smoothstep(v / c.steer_band_low_kmh);
        lerp(c.max_steer_deg, c.mid_steer_deg, t)
    } else if v <= c.steer_band_high_kmh {
        let t = smoothstep((v - c.steer_band_low_kmh) / (c.steer_band_high_kmh - c.steer_band_low_kmh));
        lerp(c.mid_steer_deg, c.min_steer_deg, t)
    } else {
        c.min_steer_deg
    };
    deg * m.max_steer_angle
}

/// Advance the steer angle (degrees) by one tick.
pub fn update_steer_angle(
    c: &VehicleConstants,
    m: &ModifierSet,
    input: &ControlInput,
    steer_deg: f32,
    speed: f32,
    dt: f32,
) -> f32 {
    let limit = max_steer_deg(c, m, speed);
    let dir = input.steer_direction();

    let (target, rate) = if dir != 0.0 {
        (dir * limit, c.steer_speed_deg * m.steer_response)
    } else {
        (0.0, c.centering_speed_deg * (1.0 + kmh(speed.abs()) * c.centering_speed_gain))
    };

    let max_step = rate * dt;
    let next = steer_deg + (target - steer_deg).clamp(-max_step, max_step);
    next.clamp(-limit.max(steer_deg.abs()), limit.max(steer_deg.abs()))
}

/// Bicycle-model yaw rate. `None` when the geometry is degenerate
/// (near-zero tangent or radius beyond `max_turn_radius`).
pub fn ackermann_yaw_rate(c: &VehicleConstants, speed: f32, steer_deg: f32) -> Option<f32> {
    let tan = steer_deg.to_radians().abs().tan();
    if !tan.is_finite() || tan < MIN_TAN {
        return None;
    }
    let radius = c.wheelbase / tan;
    if !radius.is_finite() || radius > c.max_turn_radius {
        return None;
    }
    Some(speed / radius * steer_deg.signum())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TurnInputs {
    pub speed: f32,           // m/s signed, +forward
    pub steer_deg: f32,
    pub slip_deg: f32,        // smoothed, signed
    pub grip: f32,            // combined grip
    pub drifting: bool,
    pub handbrake: bool,
    pub engine_angular: [f32; 3], // world angular velocity reported by the engine
    pub dt: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TurnResult {
    pub target_yaw: f32, // capped target before blending
    pub yaw: f32,        // blended toward target from the engine's yaw
    pub roll: f32,       // damped world-x rate
    pub pitch: f32,      // damped world-z rate
    pub degenerate: bool,
}

pub fn solve_turn(c: &VehicleConstants, t: &TurnInputs) -> TurnResult {
    let (base, degenerate) = match ackermann_yaw_rate(c, t.speed, t.steer_deg) {
        Some(w) => (w, false),
        None => (0.0, true),
    };

    let influence = if t.drifting { c.drift_turn_influence } else { c.turn_influence };
    let mut target = base * influence * t.grip.clamp(0.5, 1.5);

    // Sliding rear pushes the nose further into the turn
    if t.drifting || t.handbrake {
        let dir = if t.speed < 0.0 { -1.0 } else { 1.0 };
        target += -t.slip_deg.to_radians() * c.drift_yaw_gain * dir;
    }

    let cap = if t.drifting { c.max_drift_angular_velocity } else { c.max_angular_velocity };
    let target = target.clamp(-cap, cap);

    let [ex, ey, ez] = t.engine_angular;
    let yaw = lerp(ey, target, blend_factor(c.angular_blend_rate, t.dt));

    let damp = (-c.roll_pitch_damping * t.dt).exp();

    TurnResult {
        target_yaw: target,
        yaw,
        roll: ex * damp,
        pitch: ez * damp,
        degenerate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::types::ms;

    fn c() -> VehicleConstants {
        VehicleConstants::default()
    }

    #[test]
    fn steer_limit_shrinks_with_speed() {
        let c = c();
        let m = ModifierSet::IDENTITY;
        let rest = max_steer_deg(&c, &m, 0.0);
        let band = max_steer_deg(&c, &m, ms(c.steer_band_low_kmh));
        let top = max_steer_deg(&c, &m, ms(300.0));
        assert_eq!(rest, c.max_steer_deg);
        assert!((band - c.mid_steer_deg).abs() < 1e-3);
        assert_eq!(top, c.min_steer_deg);
        assert!(rest > band && band > top);
    }

    #[test]
    fn steer_ramps_at_configured_rate() {
        let c = c();
        let m = ModifierSet::IDENTITY;
        let left = ControlInput { left: true, ..Default::default() };
        let a = update_steer_angle(&c, &m, &left, 0.0, 0.0, 0.1);
        assert!((a - c.steer_speed_deg * 0.1).abs() < 1e-4);
        let right = ControlInput { right: true, ..Default::default() };
        let b = update_steer_angle(&c, &m, &right, 0.0, 0.0, 0.1);
        assert!(b < 0.0);
    }

    #[test]
    fn steer_self_centers() {
        let c = c();
        let m = ModifierSet::IDENTITY;
        let mut a = 20.0;
        for _ in 0..100 {
            a = update_steer_angle(&c, &m, &ControlInput::default(), a, 10.0, 0.016);
        }
        assert_eq!(a, 0.0);
    }

    #[test]
    fn steer_never_exceeds_limit_when_held() {
        let c = c();
        let m = ModifierSet::IDENTITY;
        let left = ControlInput { left: true, ..Default::default() };
        let mut a = 0.0;
        for _ in 0..200 {
            a = update_steer_angle(&c, &m, &left, a, 0.0, 0.016);
        }
        assert!((a - c.max_steer_deg).abs() < 1e-3);
    }

    #[test]
    fn degenerate_geometry_yields_none() {
        let c = c();
        assert!(ackermann_yaw_rate(&c, 30.0, 0.0).is_none());
        assert!(ackermann_yaw_rate(&c, 30.0, 0.001).is_none());
        // tan(0.05°) clears MIN_TAN but the radius is ~3 km
        assert!(c.wheelbase / 0.05f32.to_radians().tan() > c.max_turn_radius);
        assert!(ackermann_yaw_rate(&c, 30.0, 0.05).is_none());
        assert!(ackermann_yaw_rate(&c, 30.0, -0.05).is_none());
        assert!(ackermann_yaw_rate(&c, 30.0, 10.0).is_some());
    }

    #[test]
    fn yaw_rate_sign_follows_steer_and_direction() {
        let c = c();
        assert!(ackermann_yaw_rate(&c, 10.0, 10.0).unwrap() > 0.0);
        assert!(ackermann_yaw_rate(&c, 10.0, -10.0).unwrap() < 0.0);
        assert!(ackermann_yaw_rate(&c, -10.0, 10.0).unwrap() < 0.0);
    }

    #[test]
    fn turn_is_capped() {
        let c = c();
        let t = TurnInputs {
            speed: 80.0,
            steer_deg: 30.0,
            grip: 1.5,
            dt: 1.0,
            ..Default::default()
        };
        let r = solve_turn(&c, &t);
        assert!(r.target_yaw <= c.max_angular_velocity + 1e-6);
        let drifting = solve_turn(&c, &TurnInputs { drifting: true, ..t });
        assert!(drifting.target_yaw > r.target_yaw);
        assert!(drifting.target_yaw <= c.max_drift_angular_velocity + 1e-6);
    }

    #[test]
    fn roll_and_pitch_decay() {
        let c = c();
        let t = TurnInputs { engine_angular: [1.0, 0.0, -1.0], dt: 0.016, grip: 1.0, ..Default::default() };
        let r = solve_turn(&c, &t);
        assert!(r.roll.abs() < 1.0 && r.roll > 0.0);
        assert!(r.pitch.abs() < 1.0 && r.pitch < 0.0);
        assert!(r.degenerate);
        assert_eq!(r.target_yaw, 0.0);
    }
}
