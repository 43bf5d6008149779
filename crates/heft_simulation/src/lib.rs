//! HEFT Simulation Core
//!
//! ECS-симуляция на Bevy 0.16: подбор/бросок/толкание объектов, двери,
//! score зоны, spawn manager, враги на behavior tree.
//!
//! Расписание:
//! - PreUpdate: latch input событий в `PlayerInputState`
//! - FixedUpdate (60Hz): Probe → Control → Integrate → Contacts → Resolve
//! - Update: применение input к контроллерам (Probe → Control → Integrate)
//!
//! Physics бэкенд выбирается через `PhysicsBackend` (headless или Rapier).

use bevy::prelude::*;
use bevy_rapier3d::prelude::{NoUserData, RapierPhysicsPlugin};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod ai;
pub mod components;
pub mod config;
pub mod input;
pub mod interaction;
pub mod logger;
pub mod objects;
pub mod physics;
pub mod player;
pub mod scoring;
pub mod spawn;

// Re-export для удобства
pub use ai::{AIPlugin, Blackboard, Enemy, EnemyController, NavAgent, Status};
pub use components::*;
pub use config::{ConfigError, GameConfig};
pub use input::{InputPlugin, PlayerInputEvent, PlayerInputState};
pub use interaction::{InteractionController, InteractionEvent, InteractionPlugin, InteractionState};
pub use logger::*;
pub use objects::{ObjectDestroyed, ObjectsPlugin};
pub use physics::{ImpactEvent, PhysicsBackend, PhysicsPlugin, PhysicsQueries, TriggerEvent};
pub use player::{PlayerDamaged, PlayerDied, PlayerPlugin};
pub use scoring::{ScoreChanged, ScoreZone, ScoringPlugin};
pub use spawn::{SpawnLayout, SpawnPlugin, SpawnQueue};

/// Порядок фаз внутри тика
///
/// Одинаковый для FixedUpdate и Update.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    /// Snapshot/read back physics состояния
    Probe,
    /// Контроллеры: interaction, player, AI
    Control,
    /// Интеграция тел / sync в Rapier
    Integrate,
    /// Trigger enter/exit, impact callbacks
    Contacts,
    /// Реакции на события: урон, score, kill zone, despawn
    Resolve,
}

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin {
    pub backend: PhysicsBackend,
}

impl Default for SimulationPlugin {
    fn default() -> Self {
        Self {
            backend: PhysicsBackend::Headless,
        }
    }
}

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        // Config/RNG могли вставить раньше (main загружает JSON)
        if !app.world().contains_resource::<GameConfig>() {
            app.init_resource::<GameConfig>();
        }
        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(42));
        }

        configure_simulation_sets(app, FixedUpdate);
        configure_simulation_sets(app, Update);

        app.add_plugins((
            PhysicsPlugin {
                backend: self.backend,
            },
            InputPlugin,
            PlayerPlugin,
            InteractionPlugin,
            ObjectsPlugin,
            ScoringPlugin,
            SpawnPlugin,
            AIPlugin,
        ));
    }
}

fn configure_simulation_sets(app: &mut App, schedule: impl bevy::ecs::schedule::ScheduleLabel) {
    app.configure_sets(
        schedule,
        (
            SimulationSet::Probe,
            SimulationSet::Control,
            SimulationSet::Integrate,
            SimulationSet::Contacts,
            SimulationSet::Resolve,
        )
            .chain(),
    );
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_hz(60.0)); // 60Hz FixedUpdate

    app
}

/// Полная игра поверх headless App
///
/// Rapier бэкенд дополнительно подключает TransformPlugin и Rapier step в fixed schedule.
pub fn create_simulation_app(seed: u64, config: GameConfig, backend: PhysicsBackend) -> App {
    let mut app = create_headless_app(seed);
    app.insert_resource(config);

    if backend == PhysicsBackend::Rapier {
        app.add_plugins((
            TransformPlugin,
            RapierPhysicsPlugin::<NoUserData>::default().in_fixed_schedule(),
        ));
    }

    app.add_plugins(SimulationPlugin { backend });
    app
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
