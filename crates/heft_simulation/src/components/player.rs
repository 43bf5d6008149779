//! Player компоненты: marker, здоровье, направление взгляда

use bevy::prelude::*;

use super::RigidBodyState;
use crate::input::PlayerInputState;
use crate::interaction::InteractionController;

/// Marker component для player-controlled entity
///
/// Враги ищут цели через `With<Player>`.
#[derive(Component, Debug, Clone, Copy, Default)]
#[require(PlayerStats, LookState, RigidBodyState, PlayerInputState, InteractionController)]
pub struct Player;

/// Здоровье игрока
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct PlayerStats {
    pub health: i32,
}

impl Default for PlayerStats {
    fn default() -> Self {
        Self { health: 100 }
    }
}

impl PlayerStats {
    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Возвращает true если игрок умер ЭТИМ уроном
    pub fn take_damage(&mut self, amount: i32) -> bool {
        let was_alive = self.is_alive();
        self.health -= amount;
        was_alive && !self.is_alive()
    }
}

/// Yaw/pitch камеры (градусы) + высота глаз
///
/// Yaw поворачивает тело, pitch только камеру.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct LookState {
    pub yaw: f32,
    pub pitch: f32,
    pub eye_height: f32,
}

impl Default for LookState {
    fn default() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            eye_height: 1.6,
        }
    }
}

impl LookState {
    /// Применить look input: x → yaw (вправо), y → pitch (вверх)
    pub fn apply_look(&mut self, input: Vec2, look_speed: f32, look_limit: f32, dt: f32) {
        self.yaw -= input.x * look_speed * dt;
        self.pitch += input.y * look_speed * dt;
        self.pitch = self.pitch.clamp(-look_limit, look_limit);
    }

    /// Rotation тела (только yaw)
    pub fn body_rotation(&self) -> Quat {
        Quat::from_rotation_y(self.yaw.to_radians())
    }

    /// Rotation камеры (yaw + pitch)
    pub fn view_rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw.to_radians(), self.pitch.to_radians(), 0.0)
    }

    /// Луч взгляда из глаз (Bevy forward = -Z)
    pub fn view_ray(&self, feet: Vec3) -> ViewRay {
        ViewRay {
            origin: feet + Vec3::Y * self.eye_height,
            forward: self.view_rotation() * Vec3::NEG_Z,
        }
    }
}

/// Точка обзора + направление (нормализовано)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewRay {
    pub origin: Vec3,
    pub forward: Vec3,
}

impl ViewRay {
    /// Горизонтальная проекция forward (для push импульса)
    pub fn horizontal_forward(&self) -> Vec3 {
        Vec3::new(self.forward.x, 0.0, self.forward.z).normalize_or_zero()
    }
}
