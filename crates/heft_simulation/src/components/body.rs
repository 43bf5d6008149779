//! Rigid body state (наш источник истины для velocity/mass)
//!
//! Headless режим интегрирует его сам, Rapier режим синхронизирует в
//! `Velocity`/`Damping`/`AdditionalMassProperties` перед physics step.

use bevy::prelude::*;

use super::PhysicsProfile;

const MIN_MASS: f32 = 0.001;

#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct RigidBodyState {
    /// Линейная скорость (m/s)
    pub velocity: Vec3,
    /// Угловая скорость (rad/s)
    pub angular_velocity: Vec3,
    pub mass: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    /// true пока объект в руках (позицию ставит контроллер)
    pub kinematic: bool,
    pub use_gravity: bool,
}

impl Default for RigidBodyState {
    fn default() -> Self {
        Self::from_profile(PhysicsProfile::default())
    }
}

impl RigidBodyState {
    pub fn from_profile(profile: PhysicsProfile) -> Self {
        Self {
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            mass: profile.mass,
            linear_damping: profile.linear_damping,
            angular_damping: profile.angular_damping,
            kinematic: false,
            use_gravity: true,
        }
    }

    /// Мгновенный импульс (ForceMode.Impulse): Δv = J / m
    ///
    /// Kinematic тела импульсы игнорируют.
    pub fn apply_impulse(&mut self, impulse: Vec3) {
        if self.kinematic {
            return;
        }
        self.velocity += impulse / self.mass.max(MIN_MASS);
    }

    pub fn zero_velocities(&mut self) {
        self.velocity = Vec3::ZERO;
        self.angular_velocity = Vec3::ZERO;
    }

    /// Отключить физику (объект в руках)
    pub fn make_kinematic(&mut self) {
        self.kinematic = true;
        self.use_gravity = false;
        self.zero_velocities();
    }

    /// Вернуть физику после drop/throw
    pub fn make_dynamic(&mut self) {
        self.kinematic = false;
        self.use_gravity = true;
        self.zero_velocities();
    }

    pub fn profile(&self) -> PhysicsProfile {
        PhysicsProfile {
            mass: self.mass,
            linear_damping: self.linear_damping,
            angular_damping: self.angular_damping,
        }
    }

    pub fn set_profile(&mut self, profile: PhysicsProfile) {
        self.mass = profile.mass;
        self.linear_damping = profile.linear_damping;
        self.angular_damping = profile.angular_damping;
    }
}
