//! Spawn domain: заселение уровня интерактивными объектами
//!
//! Архитектура:
//! - layout: JSON описание точек и префабов (Resource `SpawnLayout`)
//! - plan: двухпроходный план (чистая функция, DeterministicRng)
//! - SpawnQueue: план выдаётся по одному объекту каждые `spawn_delay` секунд

use std::collections::VecDeque;

use bevy::prelude::*;

pub mod layout;
pub mod plan;

pub use layout::{PrefabDef, ShapeDef, SpawnLayout, SpawnPointDef};
pub use plan::{plan_spawns, PlannedSpawn};

use crate::config::GameConfig;
use crate::objects::spawn_object;
use crate::{DeterministicRng, SimulationSet};

/// Очередь запланированных спавнов (multi-frame state вместо coroutine)
#[derive(Resource, Debug, Default)]
pub struct SpawnQueue {
    pending: VecDeque<PlannedSpawn>,
    cooldown: f32,
    released: usize,
}

impl SpawnQueue {
    pub fn new(plan: Vec<PlannedSpawn>) -> Self {
        Self {
            pending: plan.into(),
            cooldown: 0.0,
            released: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Сколько объектов уже выдано
    pub fn released(&self) -> usize {
        self.released
    }

    /// Продвинуть таймер; первый объект выдаётся сразу, дальше раз в `delay`
    ///
    /// delay <= 0 → вся очередь за один тик.
    pub fn tick(&mut self, dt: f32, delay: f32) -> Vec<PlannedSpawn> {
        let mut ready = Vec::new();
        if self.pending.is_empty() {
            return ready;
        }

        self.cooldown -= dt;
        while self.cooldown <= 0.0 {
            let Some(next) = self.pending.pop_front() else {
                break;
            };
            ready.push(next);
            if delay > 0.0 {
                self.cooldown += delay;
            }
        }

        self.released += ready.len();
        ready
    }
}

/// Startup: план по SpawnLayout (если уровень его задал)
pub fn seed_spawn_queue(
    layout: Option<Res<SpawnLayout>>,
    config: Res<GameConfig>,
    mut rng: ResMut<DeterministicRng>,
    mut queue: ResMut<SpawnQueue>,
) {
    let Some(layout) = layout else {
        return;
    };

    let plan = plan_spawns(&layout, &config.spawn, &mut rng.rng);
    crate::logger::log_info(&format!("Spawn plan ready: {} objects", plan.len()));
    *queue = SpawnQueue::new(plan);
}

/// Система: выдача спавнов из очереди
pub fn release_spawns(
    mut commands: Commands,
    time: Res<Time<Fixed>>,
    config: Res<GameConfig>,
    mut queue: ResMut<SpawnQueue>,
) {
    if queue.is_empty() {
        return;
    }

    for spawn in queue.tick(time.delta_secs(), config.spawn.spawn_delay) {
        let entity = spawn_object(&mut commands, &spawn.spec, spawn.transform, Some(spawn.origin), &config);
        let profile = spawn.spec.profile;
        crate::logger::log(&format!(
            "Configured {} ({:?}): Mass={}, Drag={}, AngularDrag={}",
            spawn.spec.name, entity, profile.mass, profile.linear_damping, profile.angular_damping
        ));
    }
}

/// Spawn Plugin
///
/// Startup: seed_spawn_queue
/// FixedUpdate (Resolve): release_spawns
pub struct SpawnPlugin;

impl Plugin for SpawnPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SpawnQueue>()
            .add_systems(Startup, seed_spawn_queue)
            .add_systems(FixedUpdate, release_spawns.in_set(SimulationSet::Resolve));
    }
}
