//! Objects domain: spawn интерактивного объекта, урон от ударов, kill zone
//!
//! Урон: только после первого взаимодействия (`interacted`),
//! damage = round(relative_speed) если скорость > min_impact_speed.
//! health <= 0 → ObjectDestroyed + despawn.

use std::collections::BTreeSet;

use bevy::prelude::*;

use crate::components::{
    Door, DoorDrive, HingeMotor, Interactable, KillZone, PhysicsProfile, ProbeLayer, ProbeShape, ProbeVolume,
    PushProfiles, RigidBodyState, SpawnOrigin, WeightClass,
};
use crate::config::GameConfig;
use crate::physics::{ImpactEvent, TriggerEvent};
use crate::SimulationSet;

/// Объект разрушен ударом (entity уже в очереди на despawn)
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct ObjectDestroyed {
    pub entity: Entity,
    pub class: WeightClass,
    pub position: Vec3,
}

/// Описание объекта для spawn (из префаба или вручную)
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSpec {
    pub name: String,
    pub class: WeightClass,
    pub health: i32,
    pub score_multiplier: f32,
    pub profile: PhysicsProfile,
    pub shape: ProbeShape,
    /// Только для Door: true → hinge мотор, false → ручной угол
    pub hinge: bool,
}

impl ObjectSpec {
    pub fn new(name: impl Into<String>, class: WeightClass) -> Self {
        let shape = match class {
            WeightClass::Light => ProbeShape::Sphere { radius: 0.2 },
            WeightClass::Medium => ProbeShape::Sphere { radius: 0.3 },
            WeightClass::Heavy => ProbeShape::Cuboid {
                half_extents: Vec3::splat(0.6),
            },
            WeightClass::Door => ProbeShape::Cuboid {
                half_extents: Vec3::new(0.5, 1.0, 0.05),
            },
        };
        let profile = match class {
            WeightClass::Heavy => PushProfiles::default().resting,
            _ => PhysicsProfile::default(),
        };

        Self {
            name: name.into(),
            class,
            health: 100,
            score_multiplier: 1.0,
            profile,
            shape,
            hinge: false,
        }
    }
}

/// Spawn интерактивного объекта
///
/// - Heavy: PushProfiles (resting = профиль префаба)
/// - Door: Door компонент, тело kinematic (угол ведёт контроллер/мотор)
pub fn spawn_object(
    commands: &mut Commands,
    spec: &ObjectSpec,
    transform: Transform,
    origin: Option<SpawnOrigin>,
    config: &GameConfig,
) -> Entity {
    let mut body = RigidBodyState::from_profile(spec.profile);

    let mut entity = commands.spawn((
        Name::new(spec.name.clone()),
        Interactable::new(spec.class)
            .with_health(spec.health)
            .with_score_multiplier(spec.score_multiplier),
        transform,
        ProbeVolume {
            shape: spec.shape,
            layer: ProbeLayer::Pickup,
            offset: Vec3::ZERO,
        },
    ));

    match spec.class {
        WeightClass::Heavy => {
            entity.insert(PushProfiles {
                resting: spec.profile,
                ..default()
            });
        }
        WeightClass::Door => {
            let drive = if spec.hinge {
                DoorDrive::Hinge(HingeMotor::default())
            } else {
                DoorDrive::Manual
            };
            entity.insert(Door::new(config.interaction.door_max_angle, transform.rotation, drive));
            body.kinematic = true;
            body.use_gravity = false;
        }
        WeightClass::Light | WeightClass::Medium => {}
    }

    entity.insert(body);
    if let Some(origin) = origin {
        entity.insert(origin);
    }

    entity.id()
}

/// Урон от удара (None если удар не засчитывается)
pub fn impact_damage(interactable: &Interactable, relative_speed: f32, min_impact_speed: f32) -> Option<i32> {
    if !interactable.interacted || relative_speed <= min_impact_speed {
        return None;
    }
    Some(relative_speed.round() as i32)
}

/// Система: ImpactEvent → урон, разрушение
///
/// Объект в руках (kinematic) урона не получает.
pub fn apply_impact_damage(
    mut commands: Commands,
    config: Res<GameConfig>,
    mut impacts: EventReader<ImpactEvent>,
    mut objects: Query<(&mut Interactable, &RigidBodyState, &Transform, Option<&Name>)>,
    mut destroyed: EventWriter<ObjectDestroyed>,
) {
    let mut removed = BTreeSet::new();

    for impact in impacts.read() {
        if removed.contains(&impact.entity) {
            continue;
        }
        let Ok((mut interactable, body, transform, name)) = objects.get_mut(impact.entity) else {
            continue;
        };
        if body.kinematic {
            continue;
        }

        let Some(damage) = impact_damage(&interactable, impact.relative_speed, config.objects.min_impact_speed) else {
            continue;
        };

        let label = name.map(|name| name.as_str().to_string()).unwrap_or_else(|| format!("{:?}", impact.entity));
        let killed = interactable.take_damage(damage);
        crate::logger::log(&format!(
            "{} took {} impact damage (health {})",
            label, damage, interactable.health
        ));

        if killed {
            removed.insert(impact.entity);
            destroyed.write(ObjectDestroyed {
                entity: impact.entity,
                class: interactable.class,
                position: transform.translation,
            });
            commands.entity(impact.entity).despawn();
            crate::logger::log_info(&format!("{} destroyed", label));
        }
    }
}

/// Система: объект в kill zone → назад на spawn точку, скорости в ноль
pub fn apply_kill_zones(
    mut triggers: EventReader<TriggerEvent>,
    zones: Query<(), With<KillZone>>,
    mut objects: Query<(&mut Transform, Option<&mut RigidBodyState>, Option<&SpawnOrigin>, Option<&Name>), Without<KillZone>>,
) {
    for event in triggers.read() {
        let TriggerEvent::Entered { trigger, other } = *event else {
            continue;
        };
        if !zones.contains(trigger) {
            continue;
        }
        let Ok((mut transform, body, origin, name)) = objects.get_mut(other) else {
            continue;
        };

        let Some(origin) = origin else {
            let label = name.map(|name| name.as_str().to_string()).unwrap_or_else(|| format!("{:?}", other));
            crate::logger::log_warning(&format!(
                "Object {} entered kill zone but has no spawn point defined!",
                label
            ));
            continue;
        };

        transform.translation = origin.position;
        transform.rotation = origin.rotation;
        if let Some(mut body) = body {
            body.zero_velocities();
        }
        crate::logger::log(&format!("{:?} returned to spawn point {}", other, origin.point));
    }
}

/// Objects Plugin
///
/// FixedUpdate (Resolve): apply_impact_damage → apply_kill_zones
pub struct ObjectsPlugin;

impl Plugin for ObjectsPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<ObjectDestroyed>().add_systems(
            FixedUpdate,
            (apply_impact_damage, apply_kill_zones)
                .chain()
                .in_set(SimulationSet::Resolve),
        );
    }
}
