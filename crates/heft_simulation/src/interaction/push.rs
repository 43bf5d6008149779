//! Толкание Heavy объектов
//!
//! - Idle + throw → одиночный горизонтальный толчок (профиль не трогаем)
//! - Interacting(Push) → облегчённый push профиль, заряженный толчок,
//!   resting профиль возвращается через `push_reset_delay` (ProfileReset)

use bevy::prelude::*;

use super::throw::charge_multiplier;
use crate::components::{PushProfiles, RigidBodyState};
use crate::config::InteractionConfig;

/// Отложенный возврат resting профиля
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct ProfileReset {
    pub remaining: f32,
}

impl ProfileReset {
    pub fn new(delay: f32) -> Self {
        Self {
            remaining: delay.max(0.0),
        }
    }

    /// true когда пора вернуть профиль
    pub fn tick(&mut self, dt: f32) -> bool {
        self.remaining -= dt;
        self.remaining <= 0.0
    }
}

/// Горизонтальный импульс толчка (заряд 0 = базовая сила)
pub fn push_impulse(config: &InteractionConfig, horizontal_forward: Vec3, charge: f32) -> Vec3 {
    let direction = Vec3::new(horizontal_forward.x, 0.0, horizontal_forward.z).normalize_or_zero();
    direction * config.push_force * charge_multiplier(config, charge)
}

pub fn engage_push_profile(body: &mut RigidBodyState, profiles: &PushProfiles) {
    body.set_profile(profiles.push);
}

pub fn restore_resting_profile(body: &mut RigidBodyState, profiles: &PushProfiles) {
    body.set_profile(profiles.resting);
}

/// Система: tick ProfileReset, по истечении вернуть resting профиль
pub fn tick_profile_resets(
    mut commands: Commands,
    time: Res<Time<Fixed>>,
    mut resets: Query<(Entity, &mut ProfileReset, &mut RigidBodyState, &PushProfiles)>,
) {
    let dt = time.delta_secs();

    for (entity, mut reset, mut body, profiles) in resets.iter_mut() {
        if !reset.tick(dt) {
            continue;
        }

        restore_resting_profile(&mut body, profiles);
        commands.entity(entity).remove::<ProfileReset>();
        crate::logger::log(&format!("{:?}: resting profile restored", entity));
    }
}
