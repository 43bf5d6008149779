//! World компоненты: probe volumes (для headless запросов), триггеры, spawn origin

use std::collections::BTreeSet;

use bevy::prelude::*;

/// Слой для physics запросов
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum ProbeLayer {
    /// Стены, пол, статическая геометрия (hold/floor/wall проверки, line of sight)
    Environment,
    /// Интерактивные объекты (sphere cast при подборе)
    Pickup,
    /// Игрок и враги
    Actor,
}

/// Битовая маска слоёв
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub struct ProbeMask(pub u8);

impl ProbeMask {
    pub const NONE: ProbeMask = ProbeMask(0);
    pub const ENVIRONMENT: ProbeMask = ProbeMask(1 << 0);
    pub const PICKUP: ProbeMask = ProbeMask(1 << 1);
    pub const ACTOR: ProbeMask = ProbeMask(1 << 2);
    pub const ALL: ProbeMask = ProbeMask(0b111);

    pub fn contains(self, layer: ProbeLayer) -> bool {
        self.0 & ProbeMask::from(layer).0 != 0
    }
}

impl From<ProbeLayer> for ProbeMask {
    fn from(layer: ProbeLayer) -> Self {
        match layer {
            ProbeLayer::Environment => ProbeMask::ENVIRONMENT,
            ProbeLayer::Pickup => ProbeMask::PICKUP,
            ProbeLayer::Actor => ProbeMask::ACTOR,
        }
    }
}

impl std::ops::BitOr for ProbeMask {
    type Output = ProbeMask;

    fn bitor(self, rhs: Self) -> Self::Output {
        ProbeMask(self.0 | rhs.0)
    }
}

/// Форма probe volume
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub enum ProbeShape {
    Sphere { radius: f32 },
    /// Axis-aligned box (rotation игнорируется в headless запросах)
    Cuboid { half_extents: Vec3 },
}

impl ProbeShape {
    /// Расстояние от центра до низа формы
    pub fn half_height(&self) -> f32 {
        match self {
            ProbeShape::Sphere { radius } => *radius,
            ProbeShape::Cuboid { half_extents } => half_extents.y,
        }
    }
}

/// Коллайдер для headless physics запросов
///
/// В Rapier режиме дублируется Rapier `Collider` (см. physics::rapier).
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct ProbeVolume {
    pub shape: ProbeShape,
    pub layer: ProbeLayer,
    /// Смещение центра относительно Transform (игрок: Transform на уровне ног)
    pub offset: Vec3,
}

impl ProbeVolume {
    pub fn sphere(radius: f32, layer: ProbeLayer) -> Self {
        Self {
            shape: ProbeShape::Sphere { radius },
            layer,
            offset: Vec3::ZERO,
        }
    }

    pub fn cuboid(half_extents: Vec3, layer: ProbeLayer) -> Self {
        Self {
            shape: ProbeShape::Cuboid { half_extents },
            layer,
            offset: Vec3::ZERO,
        }
    }

    pub fn with_offset(mut self, offset: Vec3) -> Self {
        self.offset = offset;
        self
    }

    /// Высота от Transform до низа формы (для посадки на пол)
    pub fn rest_offset(&self) -> f32 {
        self.shape.half_height() - self.offset.y
    }
}

/// Trigger volume (axis-aligned box вокруг Transform)
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
#[require(TriggerOccupants)]
pub struct TriggerVolume {
    pub half_extents: Vec3,
}

impl TriggerVolume {
    pub fn contains(&self, center: Vec3, point: Vec3) -> bool {
        let d = (point - center).abs();
        d.x <= self.half_extents.x && d.y <= self.half_extents.y && d.z <= self.half_extents.z
    }
}

/// Кто сейчас внутри триггера (для enter/exit diff в headless режиме)
#[derive(Component, Debug, Clone, Default)]
pub struct TriggerOccupants(pub BTreeSet<Entity>);

/// Kill zone: объекты возвращаются на свою spawn точку
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct KillZone;

/// Откуда объект заспавнен (respawn / kill zone reset)
#[derive(Component, Debug, Clone, PartialEq)]
pub struct SpawnOrigin {
    pub point: String,
    pub position: Vec3,
    pub rotation: Quat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_contains() {
        let mask = ProbeMask::ENVIRONMENT | ProbeMask::PICKUP;
        assert!(mask.contains(ProbeLayer::Environment));
        assert!(mask.contains(ProbeLayer::Pickup));
        assert!(!mask.contains(ProbeLayer::Actor));
        assert!(!ProbeMask::NONE.contains(ProbeLayer::Actor));
    }

    #[test]
    fn test_trigger_contains() {
        let trigger = TriggerVolume {
            half_extents: Vec3::new(1.0, 1.0, 1.0),
        };
        let center = Vec3::new(5.0, 0.0, 0.0);

        assert!(trigger.contains(center, Vec3::new(5.5, 0.5, -0.9)));
        assert!(!trigger.contains(center, Vec3::new(3.5, 0.0, 0.0)));
    }

    #[test]
    fn test_rest_offset_with_feet_pivot() {
        let volume = ProbeVolume::sphere(0.4, ProbeLayer::Actor).with_offset(Vec3::Y * 0.9);
        assert!((volume.rest_offset() - (-0.5)).abs() < 1e-6);

        let crate_box = ProbeVolume::cuboid(Vec3::splat(0.25), ProbeLayer::Pickup);
        assert_eq!(crate_box.rest_offset(), 0.25);
    }
}
