//! Дверь: пока interact зажат, мотор крутит петлю (или копится ручной угол)

use bevy::prelude::*;

use crate::components::{Door, DoorDrive};
use crate::config::InteractionConfig;

/// Начать взаимодействие: включить мотор
pub fn engage_door(door: &mut Door, config: &InteractionConfig) {
    if let Some(motor) = door.hinge_mut() {
        motor.target_velocity = config.door_motor_velocity;
        motor.max_force = config.door_motor_force;
        motor.enabled = true;
    }
}

/// Отпустить дверь: мотор стоп
pub fn release_door(door: &mut Door) {
    if let Some(motor) = door.hinge_mut() {
        motor.target_velocity = 0.0;
        motor.enabled = false;
    }
}

/// Один physics шаг удержания двери. Возвращает true если дверь полностью открыта.
///
/// Hinge: угол двигает интегратор бэкенда, здесь только держим мотор включённым.
/// Manual: угол += door_manual_speed × dt, rotation пишем сами.
pub fn drive_door(door: &mut Door, transform: &mut Transform, config: &InteractionConfig, dt: f32) -> bool {
    match door.drive {
        DoorDrive::Hinge(_) => engage_door(door, config),
        DoorDrive::Manual => {
            door.advance(config.door_manual_speed * dt);
            transform.rotation = door.rotation();
        }
    }

    door.is_fully_open()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::HingeMotor;

    #[test]
    fn test_manual_door_reaches_max_and_stops() {
        let config = InteractionConfig::default();
        let mut door = Door::new(90.0, Quat::IDENTITY, DoorDrive::Manual);
        let mut transform = Transform::default();
        let dt = 1.0 / 60.0;

        let mut steps = 0;
        while !drive_door(&mut door, &mut transform, &config, dt) {
            assert!(door.angle <= door.max_angle);
            steps += 1;
            assert!(steps < 1000);
        }

        // 90° при 60°/s ≈ 1.5 s
        assert!((89..=91).contains(&steps), "steps = {}", steps);
        assert_eq!(door.angle, 90.0);
        assert_eq!(transform.rotation, door.rotation());
    }

    #[test]
    fn test_hinge_engage_and_release() {
        let config = InteractionConfig::default();
        let mut door = Door::new(90.0, Quat::IDENTITY, DoorDrive::Hinge(HingeMotor::default()));
        let mut transform = Transform::default();

        assert!(!drive_door(&mut door, &mut transform, &config, 0.1));
        let DoorDrive::Hinge(motor) = door.drive else {
            panic!("hinge expected");
        };
        assert!(motor.enabled);
        assert_eq!(motor.target_velocity, config.door_motor_velocity);
        // Угол hinge двери двигает бэкенд, не контроллер
        assert_eq!(door.angle, 0.0);

        release_door(&mut door);
        let DoorDrive::Hinge(motor) = door.drive else {
            panic!("hinge expected");
        };
        assert!(!motor.enabled);
    }
}
