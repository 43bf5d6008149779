//! Конфигурация симуляции
//!
//! Все параметры геймплея собраны в `GameConfig` (Resource).
//! Загрузка из JSON опциональна, `GameConfig::default()` даёт рабочие значения.

use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::WeightClass;

/// Ошибки загрузки/валидации конфига
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Корневой конфиг
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub interaction: InteractionConfig,
    pub player: PlayerConfig,
    pub objects: ObjectConfig,
    pub physics: PhysicsConfig,
    pub spawn: SpawnConfig,
    pub enemy: EnemyConfig,
}

impl GameConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Проверка инвариантов между полями (то, что serde проверить не может)
    pub fn validate(&self) -> Result<(), ConfigError> {
        let i = &self.interaction;

        positive("interaction.pickup_range", i.pickup_range)?;
        positive("interaction.pickup_radius", i.pickup_radius)?;
        positive("interaction.max_hold_distance", i.max_hold_distance)?;
        positive("interaction.object_radius", i.object_radius)?;
        positive("interaction.max_charge_time", i.max_charge_time)?;
        positive("interaction.door_max_angle", i.door_max_angle)?;

        if i.min_hold_distance < 0.0 || i.min_hold_distance >= i.max_hold_distance {
            return Err(ConfigError::Invalid {
                field: "interaction.min_hold_distance",
                reason: format!(
                    "must be in [0, max_hold_distance={}), got {}",
                    i.max_hold_distance, i.min_hold_distance
                ),
            });
        }

        if i.wall_check_radius <= 0.0 || i.wall_check_radius > i.object_radius {
            return Err(ConfigError::Invalid {
                field: "interaction.wall_check_radius",
                reason: format!(
                    "must be in (0, object_radius={}], got {}",
                    i.object_radius, i.wall_check_radius
                ),
            });
        }

        if i.max_charge_multiplier < 1.0 {
            return Err(ConfigError::Invalid {
                field: "interaction.max_charge_multiplier",
                reason: format!("must be >= 1.0, got {}", i.max_charge_multiplier),
            });
        }

        let s = &self.spawn;
        chance("spawn.light_chance", s.light_chance)?;
        chance("spawn.medium_chance", s.medium_chance)?;
        chance("spawn.heavy_chance", s.heavy_chance)?;
        chance("spawn.door_chance", s.door_chance)?;

        if s.spawn_delay < 0.0 {
            return Err(ConfigError::Invalid {
                field: "spawn.spawn_delay",
                reason: format!("must be >= 0, got {}", s.spawn_delay),
            });
        }

        positive("player.look_limit", self.player.look_limit)?;
        positive("enemy.attack_range", self.enemy.attack_range)?;
        positive("enemy.detection_range", self.enemy.detection_range)?;

        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("must be > 0, got {}", value),
        })
    }
}

fn chance(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("must be in [0, 1], got {}", value),
        })
    }
}

/// Параметры контроллера взаимодействия (pickup / hold / throw / push / door)
///
/// Углы в градусах, расстояния в метрах, время в секундах.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Дальность sphere cast при подборе
    pub pickup_range: f32,
    /// Радиус sphere cast
    pub pickup_radius: f32,
    pub max_hold_distance: f32,
    /// Минимальная дистанция от камеры до поверхности перед ней
    pub min_hold_distance: f32,
    pub floor_check_distance: f32,
    /// Приблизительный радиус удерживаемого объекта
    pub object_radius: f32,
    /// Радиус overlap-проверки стен (чуть меньше object_radius, иначе касание пола = overlap)
    pub wall_check_radius: f32,
    /// true → объект разворачивается лицом к игроку
    pub face_holder: bool,
    /// deg/s для rotate input
    pub rotate_speed: f32,
    pub drop_impulse: f32,
    pub light_throw_force: f32,
    pub medium_throw_force: f32,
    pub push_force: f32,
    pub max_charge_time: f32,
    pub max_charge_multiplier: f32,
    /// Задержка возврата resting профиля Heavy после толчка
    pub push_reset_delay: f32,
    /// Дальше этого Heavy/Door отпускается автоматически
    pub max_interact_distance: f32,
    pub door_max_angle: f32,
    /// deg/s
    pub door_motor_velocity: f32,
    pub door_motor_force: f32,
    /// deg/s (fallback без hinge)
    pub door_manual_speed: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            pickup_range: 5.0,
            pickup_radius: 0.2,
            max_hold_distance: 2.0,
            min_hold_distance: 0.2,
            floor_check_distance: 1.0,
            object_radius: 0.3,
            wall_check_radius: 0.25,
            face_holder: false,
            rotate_speed: 90.0,
            drop_impulse: 2.0,
            light_throw_force: 8.0,
            medium_throw_force: 5.0,
            push_force: 10.0,
            max_charge_time: 1.5,
            max_charge_multiplier: 2.0,
            push_reset_delay: 1.0,
            max_interact_distance: 3.5,
            door_max_angle: 90.0,
            door_motor_velocity: 90.0,
            door_motor_force: 50.0,
            door_manual_speed: 60.0,
        }
    }
}

impl InteractionConfig {
    /// Базовая сила броска/толчка по весовому классу
    pub fn base_force(&self, class: WeightClass) -> f32 {
        match class {
            WeightClass::Light => self.light_throw_force,
            WeightClass::Medium => self.medium_throw_force,
            WeightClass::Heavy => self.push_force,
            // Дверь не бросается; значение нужно только для полноты match
            WeightClass::Door => 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub move_speed: f32,
    pub jump_force: f32,
    /// deg/s на единицу look axis
    pub look_speed: f32,
    /// Ограничение pitch (±, градусы)
    pub look_limit: f32,
    pub ground_check_distance: f32,
    pub eye_height: f32,
    pub health: i32,
    /// Масса тела игрока (jump_force: импульс, делится на массу)
    pub mass: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            move_speed: 5.0,
            jump_force: 5.0,
            look_speed: 120.0,
            look_limit: 80.0,
            ground_check_distance: 0.4,
            eye_height: 1.6,
            health: 100,
            mass: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectConfig {
    /// Ниже этой скорости удар не наносит урона
    pub min_impact_speed: f32,
}

impl Default for ObjectConfig {
    fn default() -> Self {
        Self {
            min_impact_speed: 5.0,
        }
    }
}

/// Параметры headless интегратора (в Rapier режиме не используются)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: f32,
    pub ground_height: f32,
    /// Множитель горизонтальной скорости при контакте с полом
    pub ground_friction: f32,
    /// Доля скорости после удара об актора
    pub restitution: f32,
    /// Ниже этой скорости касание пола не считается ударом
    pub impact_report_speed: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: -9.81,
            ground_height: 0.0,
            ground_friction: 0.8,
            restitution: 0.3,
            impact_report_speed: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    pub light_chance: f32,
    pub medium_chance: f32,
    pub heavy_chance: f32,
    pub door_chance: f32,
    /// Пауза между спавнами (секунды, 0 → всё в одном тике)
    pub spawn_delay: f32,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            light_chance: 0.5,
            medium_chance: 0.5,
            heavy_chance: 0.7,
            door_chance: 0.7,
            spawn_delay: 0.5,
        }
    }
}

impl SpawnConfig {
    pub fn chance(&self, class: WeightClass) -> f32 {
        match class {
            WeightClass::Light => self.light_chance,
            WeightClass::Medium => self.medium_chance,
            WeightClass::Heavy => self.heavy_chance,
            WeightClass::Door => self.door_chance,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyConfig {
    pub detection_range: f32,
    pub attack_range: f32,
    pub attack_damage: i32,
    pub attack_cooldown: f32,
    pub stun_duration: f32,
    /// Скорость удара объектом, которая оглушает врага
    pub stun_impact_speed: f32,
    pub move_speed: f32,
    pub eye_height: f32,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            detection_range: 10.0,
            attack_range: 1.8,
            attack_damage: 35,
            attack_cooldown: 1.5,
            stun_duration: 3.0,
            stun_impact_speed: 4.0,
            move_speed: 3.5,
            eye_height: 1.5,
        }
    }
}
