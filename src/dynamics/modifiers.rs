// ==============================================================================
// modifiers.rs — MODIFIER COMPOSER (WEATHER × TIRE COMPOUND × CURB)
// ------------------------------------------------------------------------------
// Each collaborator hands over a plain multiplier bundle. The effective set is
// the field-wise product. An inactive collaborator (no curb contact) is the
// identity. Composition is total: bad fields are repaired, never rejected.
//
// Presets below stand in for the external weather / tire-wear / curb systems
// when the host has nothing better to feed.
// ==============================================================================

use serde::{Deserialize, Serialize};

/// Floor that keeps every multiplier strictly positive.
pub const MIN_MULTIPLIER: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModifierSet {
    pub friction_slip: f32,
    pub drag: f32,
    pub downforce: f32,
    pub engine_efficiency: f32,
    pub brake_efficiency: f32,
    pub steer_response: f32,
    pub max_steer_angle: f32,
    pub drift_entry_angle: f32,
    pub drift_lateral_correction: f32,
    pub max_speed: f32,
}

impl Default for ModifierSet {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ModifierSet {
    pub const IDENTITY: ModifierSet = ModifierSet {
        friction_slip: 1.0,
        drag: 1.0,
        downforce: 1.0,
        engine_efficiency: 1.0,
        brake_efficiency: 1.0,
        steer_response: 1.0,
        max_steer_angle: 1.0,
        drift_entry_angle: 1.0,
        drift_lateral_correction: 1.0,
        max_speed: 1.0,
    };

    /// Field-wise product.
    pub fn combine(&self, other: &ModifierSet) -> ModifierSet {
        ModifierSet {
            friction_slip: self.friction_slip * other.friction_slip,
            drag: self.drag * other.drag,
            downforce: self.downforce * other.downforce,
            engine_efficiency: self.engine_efficiency * other.engine_efficiency,
            brake_efficiency: self.brake_efficiency * other.brake_efficiency,
            steer_response: self.steer_response * other.steer_response,
            max_steer_angle: self.max_steer_angle * other.max_steer_angle,
            drift_entry_angle: self.drift_entry_angle * other.drift_entry_angle,
            drift_lateral_correction: self.drift_lateral_correction * other.drift_lateral_correction,
            max_speed: self.max_speed * other.max_speed,
        }
    }

    /// Non-finite fields fall back to 1.0, non-positive ones to `MIN_MULTIPLIER`.
    pub fn sanitized(&self) -> ModifierSet {
        let fix = |v: f32| {
            if !v.is_finite() {
                1.0
            } else if v <= 0.0 {
                MIN_MULTIPLIER
            } else {
                v
            }
        };
        ModifierSet {
            friction_slip: fix(self.friction_slip),
            drag: fix(self.drag),
            downforce: fix(self.downforce),
            engine_efficiency: fix(self.engine_efficiency),
            brake_efficiency: fix(self.brake_efficiency),
            steer_response: fix(self.steer_response),
            max_steer_angle: fix(self.max_steer_angle),
            drift_entry_angle: fix(self.drift_entry_angle),
            drift_lateral_correction: fix(self.drift_lateral_correction),
            max_speed: fix(self.max_speed),
        }
    }
}

/// Compose weather × tire compound × curb contact into one effective set.
pub fn compose(weather: &ModifierSet, tire: &ModifierSet, curb: Option<&ModifierSet>) -> ModifierSet {
    let base = weather.sanitized().combine(&tire.sanitized());
    match curb {
        Some(c) => base.combine(&c.sanitized()).sanitized(),
        None => base.sanitized(),
    }
}

// ====================================================================
// Presets
// ====================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weather {
    #[default]
    Dry,
    Overcast,
    LightRain,
    HeavyRain,
}

impl Weather {
    pub fn is_wet(&self) -> bool {
        matches!(self, Weather::LightRain | Weather::HeavyRain)
    }

    pub fn modifiers(&self) -> ModifierSet {
        match self {
            Weather::Dry => ModifierSet::IDENTITY,
            Weather::Overcast => ModifierSet {
                friction_slip: 0.97,
                ..ModifierSet::IDENTITY
            },
            Weather::LightRain => ModifierSet {
                friction_slip: 0.8,
                drag: 1.03,
                brake_efficiency: 0.85,
                steer_response: 0.9,
                drift_entry_angle: 0.85,
                drift_lateral_correction: 0.85,
                max_speed: 0.95,
                ..ModifierSet::IDENTITY
            },
            Weather::HeavyRain => ModifierSet {
                friction_slip: 0.62,
                drag: 1.06,
                brake_efficiency: 0.7,
                steer_response: 0.8,
                max_steer_angle: 0.95,
                drift_entry_angle: 0.7,
                drift_lateral_correction: 0.7,
                max_speed: 0.88,
                ..ModifierSet::IDENTITY
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TireCompound {
    Soft,
    #[default]
    Medium,
    Hard,
    Intermediate,
    Wet,
}

impl TireCompound {
    /// Compound multipliers for the given weather. Slicks lose extra grip in
    /// the wet; rain compounds give some back there and overheat in the dry.
    pub fn modifiers(&self, weather: Weather) -> ModifierSet {
        let wet = weather.is_wet();
        match (self, wet) {
            (TireCompound::Soft, false) => ModifierSet {
                friction_slip: 1.08,
                steer_response: 1.05,
                drift_entry_angle: 1.05,
                ..ModifierSet::IDENTITY
            },
            (TireCompound::Medium, false) => ModifierSet::IDENTITY,
            (TireCompound::Hard, false) => ModifierSet {
                friction_slip: 0.94,
                steer_response: 0.97,
                ..ModifierSet::IDENTITY
            },
            (TireCompound::Intermediate, false) => ModifierSet {
                friction_slip: 0.88,
                max_speed: 0.97,
                ..ModifierSet::IDENTITY
            },
            (TireCompound::Wet, false) => ModifierSet {
                friction_slip: 0.8,
                drag: 1.02,
                max_speed: 0.94,
                ..ModifierSet::IDENTITY
            },
            (TireCompound::Soft | TireCompound::Medium | TireCompound::Hard, true) => ModifierSet {
                friction_slip: 0.85,
                drift_lateral_correction: 0.85,
                ..ModifierSet::IDENTITY
            },
            (TireCompound::Intermediate, true) => ModifierSet {
                friction_slip: 1.1,
                drift_lateral_correction: 1.05,
                ..ModifierSet::IDENTITY
            },
            (TireCompound::Wet, true) => ModifierSet {
                friction_slip: 1.2,
                brake_efficiency: 1.1,
                drift_lateral_correction: 1.1,
                ..ModifierSet::IDENTITY
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurbContact {
    #[default]
    None,
    Flat,
    Sausage,
}

impl CurbContact {
    pub fn modifiers(&self) -> Option<ModifierSet> {
        match self {
            CurbContact::None => None,
            CurbContact::Flat => Some(ModifierSet {
                friction_slip: 0.9,
                drift_entry_angle: 0.9,
                ..ModifierSet::IDENTITY
            }),
            CurbContact::Sausage => Some(ModifierSet {
                friction_slip: 0.7,
                steer_response: 0.8,
                drift_entry_angle: 0.75,
                drift_lateral_correction: 0.8,
                max_speed: 0.9,
                ..ModifierSet::IDENTITY
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_composition_is_exact() {
        let id = ModifierSet::IDENTITY;
        let out = compose(&id, &id, Some(&id));
        assert_eq!(out, ModifierSet::IDENTITY);
        assert_eq!(compose(&id, &id, None), ModifierSet::IDENTITY);
    }

    #[test]
    fn composition_is_multiplicative() {
        let w = ModifierSet { friction_slip: 0.8, drag: 1.1, ..ModifierSet::IDENTITY };
        let t = ModifierSet { friction_slip: 0.5, ..ModifierSet::IDENTITY };
        let c = ModifierSet { friction_slip: 0.5, max_speed: 0.9, ..ModifierSet::IDENTITY };
        let out = compose(&w, &t, Some(&c));
        assert!((out.friction_slip - 0.2).abs() < 1e-6);
        assert!((out.drag - 1.1).abs() < 1e-6);
        assert!((out.max_speed - 0.9).abs() < 1e-6);
    }

    #[test]
    fn inactive_curb_is_identity() {
        let w = Weather::HeavyRain.modifiers();
        let t = TireCompound::Wet.modifiers(Weather::HeavyRain);
        assert_eq!(compose(&w, &t, None), compose(&w, &t, CurbContact::None.modifiers().as_ref()));
    }

    #[test]
    fn repairs_invalid_fields() {
        let bad = ModifierSet { drag: f32::NAN, downforce: -2.0, ..ModifierSet::IDENTITY };
        let out = compose(&bad, &ModifierSet::IDENTITY, None);
        assert_eq!(out.drag, 1.0);
        assert_eq!(out.downforce, MIN_MULTIPLIER);
    }

    #[test]
    fn all_presets_are_positive() {
        for weather in [Weather::Dry, Weather::Overcast, Weather::LightRain, Weather::HeavyRain] {
            for tire in [
                TireCompound::Soft,
                TireCompound::Medium,
                TireCompound::Hard,
                TireCompound::Intermediate,
                TireCompound::Wet,
            ] {
                for curb in [CurbContact::None, CurbContact::Flat, CurbContact::Sausage] {
                    let m = compose(&weather.modifiers(), &tire.modifiers(weather), curb.modifiers().as_ref());
                    assert_eq!(m, m.sanitized());
                    assert!(m.friction_slip > 0.0 && m.max_speed > 0.0);
                }
            }
        }
    }

    #[test]
    fn wet_tires_beat_slicks_in_rain() {
        let w = Weather::HeavyRain;
        let slick = compose(&w.modifiers(), &TireCompound::Soft.modifiers(w), None);
        let wet = compose(&w.modifiers(), &TireCompound::Wet.modifiers(w), None);
        assert!(wet.friction_slip > slick.friction_slip);
    }
}
