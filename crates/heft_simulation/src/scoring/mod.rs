//! Scoring domain: score зоны (триггер + множество объектов внутри)
//!
//! Total = сумма Interactable::score() по ровно тем объектам, что внутри.
//! Пересчёт на enter/exit/destroy, без инкрементальных дельт.

use std::collections::BTreeSet;

use bevy::prelude::*;

use crate::components::{Interactable, Player};
use crate::objects::{apply_impact_damage, ObjectDestroyed};
use crate::physics::TriggerEvent;
use crate::SimulationSet;

/// Score зона (ставится вместе с TriggerVolume)
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct ScoreZone {
    pub members: BTreeSet<Entity>,
    pub total: i32,
}

impl ScoreZone {
    /// true если объект новый
    pub fn insert(&mut self, entity: Entity) -> bool {
        self.members.insert(entity)
    }

    pub fn remove(&mut self, entity: Entity) -> bool {
        self.members.remove(&entity)
    }

    /// Пересчёт total; entity без score (уже despawned) пропускаются
    pub fn recompute(&mut self, score_of: impl Fn(Entity) -> Option<i32>) -> i32 {
        self.total = self.members.iter().filter_map(|entity| score_of(*entity)).sum();
        self.total
    }
}

/// Total зоны изменился (или пересчитан)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreChanged {
    pub zone: Entity,
    pub total: i32,
}

fn recompute_zone(zone_entity: Entity, zone: &mut ScoreZone, objects: &Query<&Interactable>) -> ScoreChanged {
    let total = zone.recompute(|entity| objects.get(entity).ok().map(Interactable::score));
    crate::logger::log(&format!("Total Score: {}", total));

    ScoreChanged {
        zone: zone_entity,
        total,
    }
}

/// Система: trigger enter/exit → членство в зонах
pub fn track_score_zones(
    mut triggers: EventReader<TriggerEvent>,
    mut zones: Query<&mut ScoreZone>,
    objects: Query<&Interactable>,
    players: Query<(), With<Player>>,
    mut changed: EventWriter<ScoreChanged>,
) {
    for event in triggers.read() {
        let (zone_entity, other, entered) = match *event {
            TriggerEvent::Entered { trigger, other } => (trigger, other, true),
            TriggerEvent::Exited { trigger, other } => (trigger, other, false),
        };
        let Ok(mut zone) = zones.get_mut(zone_entity) else {
            continue;
        };

        if players.contains(other) {
            let action = if entered { "entered" } else { "left" };
            crate::logger::log(&format!("Player {} score zone", action));
            recompute_zone(zone_entity, &mut zone, &objects);
            continue;
        }
        if !objects.contains(other) {
            continue;
        }

        let updated = if entered { zone.insert(other) } else { zone.remove(other) };
        if updated {
            changed.write(recompute_zone(zone_entity, &mut zone, &objects));
        }
    }
}

/// Система: разрушенный объект убирается из всех зон
pub fn forget_destroyed_objects(
    mut destroyed: EventReader<ObjectDestroyed>,
    mut zones: Query<(Entity, &mut ScoreZone)>,
    objects: Query<&Interactable>,
    mut changed: EventWriter<ScoreChanged>,
) {
    for event in destroyed.read() {
        for (zone_entity, mut zone) in zones.iter_mut() {
            if zone.remove(event.entity) {
                changed.write(recompute_zone(zone_entity, &mut zone, &objects));
            }
        }
    }
}

/// Scoring Plugin
///
/// FixedUpdate (Resolve): track_score_zones, forget_destroyed_objects (после урона)
pub struct ScoringPlugin;

impl Plugin for ScoringPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<ScoreChanged>().add_systems(
            FixedUpdate,
            (
                track_score_zones,
                forget_destroyed_objects.after(apply_impact_damage),
            )
                .in_set(SimulationSet::Resolve),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_sums_contained_set_once() {
        let mut zone = ScoreZone::default();
        let a = Entity::from_raw(1);
        let b = Entity::from_raw(2);
        let score_of = |entity: Entity| Some(if entity == a { 1000 } else { 5000 });

        assert!(zone.insert(a));
        assert!(!zone.insert(a));
        assert!(zone.insert(b));
        assert_eq!(zone.recompute(score_of), 6000);

        assert!(zone.remove(a));
        assert_eq!(zone.recompute(score_of), 5000);
    }

    #[test]
    fn test_missing_members_score_zero() {
        let mut zone = ScoreZone::default();
        zone.insert(Entity::from_raw(1));
        zone.insert(Entity::from_raw(2));

        let total = zone.recompute(|entity| (entity == Entity::from_raw(2)).then_some(2000));
        assert_eq!(total, 2000);
    }

    #[test]
    fn test_heavy_object_score() {
        assert_eq!(Interactable::new(crate::components::WeightClass::Heavy).score(), 5000);
    }
}
