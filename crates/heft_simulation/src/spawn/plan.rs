//! Двухпроходный план спавна (чистая функция от layout + RNG)
//!
//! Pass 1: root точки Heavy/Door, roll `<= chance`; успешный спавн раскрывает
//! дочерние точки префаба (рекурсивно, только active, в мировых координатах).
//! Pass 2: все собранные точки (roots + дети) Light/Medium с chance > 0.

use std::collections::BTreeMap;

use bevy::prelude::*;
use rand::Rng;

use super::layout::{PrefabDef, SpawnLayout, SpawnPointDef};
use crate::components::{SpawnOrigin, WeightClass};
use crate::config::SpawnConfig;
use crate::objects::ObjectSpec;

/// Один запланированный спавн
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedSpawn {
    pub spec: ObjectSpec,
    pub transform: Transform,
    pub origin: SpawnOrigin,
}

/// Точка в мировых координатах
#[derive(Debug, Clone)]
struct WorldPoint {
    name: String,
    tag: String,
    transform: Transform,
}

impl WorldPoint {
    fn resolve(def: &SpawnPointDef, parent: &Transform) -> Self {
        Self {
            name: def.name.clone(),
            tag: def.tag.clone(),
            transform: parent.mul_transform(def.local_transform()),
        }
    }
}

struct Planner<'a> {
    layout: &'a SpawnLayout,
    counters: BTreeMap<String, u32>,
    planned: Vec<PlannedSpawn>,
}

impl<'a> Planner<'a> {
    /// Спавн случайного префаба с тегом точки; возвращает префаб и его transform
    fn spawn_at<R: Rng + ?Sized>(
        &mut self,
        point: &WorldPoint,
        class: WeightClass,
        rng: &mut R,
    ) -> Option<(&'a PrefabDef, Transform)> {
        let candidates: Vec<&'a PrefabDef> = self
            .layout
            .prefabs
            .iter()
            .filter(|prefab| prefab.matches(&point.tag))
            .collect();

        if candidates.is_empty() {
            crate::logger::log_warning(&format!("No valid objects for tag {} at {}", point.tag, point.name));
            return None;
        }

        let prefab = candidates[rng.gen_range(0..candidates.len())];
        let (Some(body), Some(shape)) = (prefab.body, prefab.shape) else {
            let missing = if prefab.body.is_none() { "rigid body" } else { "collider shape" };
            crate::logger::log_warning(&format!(
                "Prefab {} lacks {}, skipping spawn at {}",
                prefab.name, missing, point.name
            ));
            return None;
        };

        let counter = self.counters.entry(prefab.name.clone()).or_insert(0);
        *counter += 1;
        let name = format!("{}{}", prefab.name, counter);
        crate::logger::log(&format!("Spawned {} at {}", name, point.name));

        let mut spec = ObjectSpec::new(name, class);
        spec.health = prefab.health;
        spec.score_multiplier = prefab.score_multiplier;
        spec.profile = body;
        spec.shape = shape.into();
        spec.hinge = prefab.hinge;

        self.planned.push(PlannedSpawn {
            spec,
            transform: point.transform,
            origin: SpawnOrigin {
                point: point.name.clone(),
                position: point.transform.translation,
                rotation: point.transform.rotation,
            },
        });

        Some((prefab, point.transform))
    }
}

/// Рекурсивно собрать active дочерние точки
fn collect_children(defs: &[SpawnPointDef], parent: &Transform, out: &mut Vec<WorldPoint>) {
    for def in defs.iter().filter(|def| def.active) {
        let point = WorldPoint::resolve(def, parent);
        let transform = point.transform;
        out.push(point);
        collect_children(&def.children, &transform, out);
    }
}

/// План спавна уровня
///
/// Детерминирован при одинаковом RNG: порядок точек = порядок в layout,
/// дети добавляются сразу после спавна своего префаба.
pub fn plan_spawns<R: Rng + ?Sized>(layout: &SpawnLayout, config: &SpawnConfig, rng: &mut R) -> Vec<PlannedSpawn> {
    let mut planner = Planner {
        layout,
        counters: BTreeMap::new(),
        planned: Vec::new(),
    };

    let roots: Vec<WorldPoint> = layout
        .root_points
        .iter()
        .filter(|def| def.active)
        .map(|def| WorldPoint::resolve(def, &Transform::IDENTITY))
        .collect();
    crate::logger::log(&format!("Collected {} root spawn points", roots.len()));

    let mut points = roots.clone();

    for root in &roots {
        let Some(class) = WeightClass::from_tag(&root.tag).filter(|class| class.is_anchor()) else {
            continue;
        };
        if rng.gen::<f32>() > config.chance(class) {
            continue;
        }
        if let Some((prefab, transform)) = planner.spawn_at(root, class, rng) {
            collect_children(&prefab.spawn_points, &transform, &mut points);
        }
    }

    crate::logger::log(&format!("After Heavy/Door pass, collected {} spawn points", points.len()));

    for point in &points {
        let Some(class) = WeightClass::from_tag(&point.tag).filter(|class| class.is_holdable()) else {
            continue;
        };
        let chance = config.chance(class);
        if chance <= 0.0 || rng.gen::<f32>() > chance {
            continue;
        }
        planner.spawn_at(point, class, rng);
    }

    planner.planned
}
