//! Physics query service + backends
//!
//! Ядро (interaction controller, AI line of sight, ground check) видит только
//! trait `PhysicsQueries`. Реализации:
//! - headless: аналитические запросы по `ProbeVolume` + простой интегратор
//! - rapier: запросы через bevy_rapier3d, наше `RigidBodyState` синкается в Rapier
//!
//! Коллбеки столкновений/триггеров обоих бэкендов приходят как
//! `ImpactEvent` / `TriggerEvent`.

use bevy::prelude::*;

use crate::components::{ProbeLayer, ProbeMask};
use crate::SimulationSet;

pub mod headless;
pub mod rapier;

pub use headless::{HeadlessQueries, ProbeEntry};
pub use rapier::RapierQueries;

/// Какой бэкенд отвечает на physics запросы
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhysicsBackend {
    #[default]
    Headless,
    Rapier,
}

impl PhysicsBackend {
    /// Бэкенд, уже вставленный PhysicsPlugin'ом (по умолчанию headless)
    pub fn configured(app: &App) -> Self {
        app.world().get_resource::<PhysicsBackend>().copied().unwrap_or_default()
    }
}

/// Попадание луча / sphere cast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeHit {
    pub entity: Entity,
    pub point: Vec3,
    pub normal: Vec3,
    /// Расстояние вдоль луча от origin
    pub distance: f32,
}

/// Фильтр запроса: маска слоёв + исключённые entity (держатель, сам объект)
#[derive(Debug, Clone, Copy)]
pub struct ProbeFilter<'a> {
    pub mask: ProbeMask,
    pub exclude: &'a [Entity],
}

impl<'a> ProbeFilter<'a> {
    pub fn new(mask: ProbeMask) -> Self {
        Self { mask, exclude: &[] }
    }

    pub fn excluding(mut self, exclude: &'a [Entity]) -> Self {
        self.exclude = exclude;
        self
    }

    pub fn accepts(&self, entity: Entity, layer: ProbeLayer) -> bool {
        self.mask.contains(layer) && !self.exclude.contains(&entity)
    }
}

/// Physics query service (ray cast, sphere cast, sphere overlap)
///
/// Направления не обязаны быть нормализованы; нулевое направление → None.
pub trait PhysicsQueries {
    fn ray_cast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: &ProbeFilter,
    ) -> Option<ProbeHit>;

    fn sphere_cast(
        &self,
        origin: Vec3,
        direction: Vec3,
        radius: f32,
        max_distance: f32,
        filter: &ProbeFilter,
    ) -> Option<ProbeHit>;

    /// Все entity, пересекающие сферу (отсортированы по Entity)
    fn overlap_sphere(&self, center: Vec3, radius: f32, filter: &ProbeFilter) -> Vec<Entity>;
}

/// Trigger callback (enter/exit), общий для обоих бэкендов
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEvent {
    Entered { trigger: Entity, other: Entity },
    Exited { trigger: Entity, other: Entity },
}

/// Collision callback: тело `entity` ударилось о `other` (None = пол headless бэкенда)
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct ImpactEvent {
    pub entity: Entity,
    pub other: Option<Entity>,
    pub relative_speed: f32,
}

/// Physics Plugin
///
/// Headless порядок (FixedUpdate):
/// 1. Probe: refresh_probe_snapshot
/// 2. Integrate: integrate_headless_bodies, integrate_headless_hinges
/// 3. Contacts: detect_trigger_overlaps
///
/// Rapier порядок:
/// 1. Probe: forward_rapier_collisions, read_back_rapier_velocities
/// 2. Integrate: attach/sync тел и hinge моторов (Rapier step идёт в FixedPostUpdate)
///
/// Update тоже синкает тела после Control: импульс броска из input фазы
/// должен попасть в Rapier до следующего step.
pub struct PhysicsPlugin {
    pub backend: PhysicsBackend,
}

impl Plugin for PhysicsPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.backend)
            .add_event::<TriggerEvent>()
            .add_event::<ImpactEvent>();

        match self.backend {
            PhysicsBackend::Headless => {
                app.init_resource::<HeadlessQueries>()
                    .add_systems(
                        FixedUpdate,
                        (
                            headless::refresh_probe_snapshot.in_set(SimulationSet::Probe),
                            (headless::integrate_headless_bodies, headless::integrate_headless_hinges)
                                .chain()
                                .in_set(SimulationSet::Integrate),
                            headless::detect_trigger_overlaps.in_set(SimulationSet::Contacts),
                        ),
                    )
                    // Input фаза (Update) тоже делает запросы, snapshot должен быть свежим
                    .add_systems(
                        Update,
                        headless::refresh_probe_snapshot.in_set(SimulationSet::Probe),
                    );
            }
            PhysicsBackend::Rapier => {
                app.add_systems(
                    FixedUpdate,
                    (
                        (rapier::forward_rapier_collisions, rapier::read_back_rapier_velocities)
                            .chain()
                            .in_set(SimulationSet::Probe),
                        (
                            rapier::attach_rapier_bodies,
                            rapier::attach_rapier_triggers,
                            rapier::sync_bodies_to_rapier,
                            rapier::drive_rapier_hinges,
                        )
                            .chain()
                            .in_set(SimulationSet::Integrate),
                    ),
                )
                .add_systems(
                    Update,
                    rapier::sync_bodies_to_rapier.in_set(SimulationSet::Integrate),
                );
            }
        }
    }
}
