//! Интерактивные объекты: весовой класс, здоровье, score

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::RigidBodyState;

/// Множитель score для тега вне четырёх весовых классов
pub const UNKNOWN_TAG_MULTIPLIER: f32 = 10.0;

/// Весовой класс объекта (бывший string tag)
///
/// Определяет режим взаимодействия:
/// - Light/Medium: берутся в руки (hold), бросаются
/// - Heavy: толкаются (push), временно облегчённый physics профиль
/// - Door: вращаются на петле (hinge motor или ручной угол)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Reflect, Serialize, Deserialize)]
pub enum WeightClass {
    Light,
    Medium,
    Heavy,
    Door,
}

impl WeightClass {
    pub const ALL: [WeightClass; 4] = [
        WeightClass::Light,
        WeightClass::Medium,
        WeightClass::Heavy,
        WeightClass::Door,
    ];

    /// Парсинг тега (case-insensitive, как сравнивались теги префабов)
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|class| class.tag().eq_ignore_ascii_case(tag))
    }

    pub fn tag(self) -> &'static str {
        match self {
            WeightClass::Light => "Light",
            WeightClass::Medium => "Medium",
            WeightClass::Heavy => "Heavy",
            WeightClass::Door => "Door",
        }
    }

    pub fn score_multiplier(self) -> f32 {
        match self {
            WeightClass::Light => 10.0,
            WeightClass::Medium => 20.0,
            WeightClass::Heavy => 50.0,
            WeightClass::Door => 30.0,
        }
    }

    /// Light/Medium можно держать в руках
    pub fn is_holdable(self) -> bool {
        matches!(self, WeightClass::Light | WeightClass::Medium)
    }

    /// Heavy/Door спавнятся первым проходом (на root точках)
    pub fn is_anchor(self) -> bool {
        !self.is_holdable()
    }
}

/// Множитель score по строковому тегу (неизвестный тег → 10)
pub fn tag_multiplier(tag: &str) -> f32 {
    WeightClass::from_tag(tag)
        .map(WeightClass::score_multiplier)
        .unwrap_or(UNKNOWN_TAG_MULTIPLIER)
}

/// Интерактивный объект
///
/// Инвариант: объект с health <= 0 удаляется из мира (см. objects::impact).
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
#[require(RigidBodyState)]
pub struct Interactable {
    pub class: WeightClass,
    pub health: i32,
    pub score_multiplier: f32,
    /// Выставляется при первом взаимодействии; до этого удары не наносят урона
    pub interacted: bool,
}

impl Interactable {
    pub fn new(class: WeightClass) -> Self {
        Self {
            class,
            health: 100,
            score_multiplier: 1.0,
            interacted: false,
        }
    }

    pub fn with_health(mut self, health: i32) -> Self {
        self.health = health;
        self
    }

    pub fn with_score_multiplier(mut self, multiplier: f32) -> Self {
        self.score_multiplier = multiplier;
        self
    }

    /// score = round(health × tag multiplier × score multiplier)
    pub fn score(&self) -> i32 {
        (self.health as f32 * self.class.score_multiplier() * self.score_multiplier).round() as i32
    }

    pub fn is_destroyed(&self) -> bool {
        self.health <= 0
    }

    /// Применить урон. Возвращает true если объект разрушен ЭТИМ ударом.
    pub fn take_damage(&mut self, amount: i32) -> bool {
        let was_alive = !self.is_destroyed();
        self.health -= amount;
        was_alive && self.is_destroyed()
    }
}

/// Масса + демпфирование (один physics профиль)
#[derive(Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
pub struct PhysicsProfile {
    pub mass: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
}

impl Default for PhysicsProfile {
    fn default() -> Self {
        Self {
            mass: 1.0,
            linear_damping: 0.05,
            angular_damping: 0.05,
        }
    }
}

/// Два профиля Heavy объекта: в покое и во время толкания
///
/// Push профиль легче и с меньшим трением, чтобы игрок мог сдвинуть объект.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct PushProfiles {
    pub resting: PhysicsProfile,
    pub push: PhysicsProfile,
}

impl Default for PushProfiles {
    fn default() -> Self {
        Self {
            resting: PhysicsProfile {
                mass: 100.0,
                linear_damping: 5.0,
                angular_damping: 5.0,
            },
            push: PhysicsProfile {
                mass: 20.0,
                linear_damping: 0.5,
                angular_damping: 1.0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heavy_score_example() {
        let object = Interactable::new(WeightClass::Heavy);
        assert_eq!(object.score(), 5000);
    }

    #[test]
    fn test_score_per_class() {
        assert_eq!(Interactable::new(WeightClass::Light).score(), 1000);
        assert_eq!(Interactable::new(WeightClass::Medium).score(), 2000);
        assert_eq!(Interactable::new(WeightClass::Door).score(), 3000);
    }

    #[test]
    fn test_score_rounds() {
        let object = Interactable::new(WeightClass::Light)
            .with_health(33)
            .with_score_multiplier(0.25);
        // 33 × 10 × 0.25 = 82.5 → 83 (round half away from zero)
        assert_eq!(object.score(), 83);
    }

    #[test]
    fn test_tag_parsing_case_insensitive() {
        assert_eq!(WeightClass::from_tag("heavy"), Some(WeightClass::Heavy));
        assert_eq!(WeightClass::from_tag("DOOR"), Some(WeightClass::Door));
        assert_eq!(WeightClass::from_tag("Player"), None);
    }

    #[test]
    fn test_unknown_tag_multiplier() {
        assert_eq!(tag_multiplier("Untagged"), 10.0);
        assert_eq!(tag_multiplier("Medium"), 20.0);
    }

    #[test]
    fn test_take_damage_reports_destruction_once() {
        let mut object = Interactable::new(WeightClass::Light).with_health(10);

        assert!(!object.take_damage(4));
        assert_eq!(object.health, 6);

        assert!(object.take_damage(6));
        assert!(object.is_destroyed());

        // Уже разрушен, повторно не сообщаем
        assert!(!object.take_damage(3));
    }
}
