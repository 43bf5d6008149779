//! Бросок с зарядом
//!
//! impulse = forward × base(class) × lerp(1, max_charge_multiplier, charge / max_charge_time)

use bevy::prelude::*;

use crate::components::WeightClass;
use crate::config::InteractionConfig;

/// Нормализованный заряд [0, 1]
pub fn charge_fraction(config: &InteractionConfig, charge: f32) -> f32 {
    if config.max_charge_time <= 0.0 {
        return 1.0;
    }
    (charge / config.max_charge_time).clamp(0.0, 1.0)
}

/// Множитель силы для заряда: 1 → max_charge_multiplier
pub fn charge_multiplier(config: &InteractionConfig, charge: f32) -> f32 {
    let t = charge_fraction(config, charge);
    1.0 + (config.max_charge_multiplier - 1.0) * t
}

/// Накопить заряд (frame dt), clamp в [0, max_charge_time]
pub fn accumulate_charge(config: &InteractionConfig, charge: f32, dt: f32) -> f32 {
    (charge + dt).clamp(0.0, config.max_charge_time.max(0.0))
}

pub fn throw_impulse(config: &InteractionConfig, class: WeightClass, forward: Vec3, charge: f32) -> Vec3 {
    forward.normalize_or_zero() * config.base_force(class) * charge_multiplier(config, charge)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> InteractionConfig {
        InteractionConfig {
            medium_throw_force: 5.0,
            max_charge_time: 1.5,
            max_charge_multiplier: 2.0,
            ..default()
        }
    }

    #[test]
    fn test_full_charge_doubles_medium_throw() {
        let config = config();
        let impulse = throw_impulse(&config, WeightClass::Medium, Vec3::NEG_Z, 1.5);
        assert!((impulse.length() - 10.0).abs() < 1e-5);
    }

    #[test]
    fn test_impulse_monotonic_and_bounded() {
        let config = config();
        let mut previous = 0.0;

        for step in 0..=40 {
            let charge = step as f32 * 0.05;
            let magnitude = throw_impulse(&config, WeightClass::Medium, Vec3::X, charge).length();

            assert!(magnitude >= previous, "charge {} dropped impulse", charge);
            assert!(magnitude <= 10.0 + 1e-5);
            previous = magnitude;
        }
    }

    #[test]
    fn test_uncharged_throw_uses_base_force() {
        let config = config();
        let impulse = throw_impulse(&config, WeightClass::Medium, Vec3::new(0.0, 0.0, -3.0), 0.0);
        assert!((impulse - Vec3::new(0.0, 0.0, -5.0)).length() < 1e-5);
    }

    #[test]
    fn test_charge_accumulation_clamps() {
        let config = config();
        let mut charge = 0.0;
        for _ in 0..200 {
            charge = accumulate_charge(&config, charge, 1.0 / 60.0);
        }
        assert_eq!(charge, 1.5);
    }
}
