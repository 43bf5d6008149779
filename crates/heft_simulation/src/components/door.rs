//! Дверь на петле
//!
//! Два режима привода:
//! - Hinge: мотор с целевой угловой скоростью (continuous velocity control)
//! - Manual: контроллер сам накапливает угол (speed × dt)
//!
//! Угол в градусах, инвариант: 0 ≤ angle ≤ max_angle.

use bevy::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct HingeMotor {
    /// deg/s
    pub target_velocity: f32,
    pub max_force: f32,
    pub enabled: bool,
}

impl Default for HingeMotor {
    fn default() -> Self {
        Self {
            target_velocity: 0.0,
            max_force: 0.0,
            enabled: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub enum DoorDrive {
    Hinge(HingeMotor),
    Manual,
}

#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Door {
    pub angle: f32,
    pub max_angle: f32,
    /// Rotation закрытой двери (угол 0)
    pub closed_rotation: Quat,
    pub drive: DoorDrive,
}

impl Door {
    pub fn new(max_angle: f32, closed_rotation: Quat, drive: DoorDrive) -> Self {
        Self {
            angle: 0.0,
            max_angle,
            closed_rotation,
            drive,
        }
    }

    pub fn is_fully_open(&self) -> bool {
        self.angle >= self.max_angle
    }

    /// Сдвинуть угол на delta градусов, с clamp в [0, max_angle]
    pub fn advance(&mut self, delta: f32) {
        self.angle = (self.angle + delta).clamp(0.0, self.max_angle);
    }

    /// Текущая rotation двери (открывается в сторону -Y yaw)
    pub fn rotation(&self) -> Quat {
        self.closed_rotation * Quat::from_rotation_y(-self.angle.to_radians())
    }

    pub fn hinge_mut(&mut self) -> Option<&mut HingeMotor> {
        match &mut self.drive {
            DoorDrive::Hinge(motor) => Some(motor),
            DoorDrive::Manual => None,
        }
    }

    /// Угол, восстановленный из текущей rotation (для Rapier, где поворот делает solver)
    pub fn angle_from_rotation(&self, rotation: Quat) -> f32 {
        let local = self.closed_rotation.inverse() * rotation;
        let (yaw, _, _) = local.to_euler(EulerRot::YXZ);
        (-yaw.to_degrees()).clamp(0.0, self.max_angle)
    }
}
