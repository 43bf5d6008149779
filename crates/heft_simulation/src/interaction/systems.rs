//! ECS системы interaction controller'а
//!
//! Логика в `controller`, здесь только:
//! - сбор ControlContext из Player компонентов
//! - выбор PhysicsQueries (headless snapshot или RapierContext)
//! - применение ControlOutput (события, ProfileReset)

use bevy::prelude::*;
use bevy_rapier3d::prelude::ReadRapierContext;

use super::controller::{ControlContext, ControlOutput, InteractionController, ObjectAccess, ObjectMut};
use super::push::ProfileReset;
use super::InteractionEvent;
use crate::components::{Door, Interactable, LookState, Player, PushProfiles, RigidBodyState, WeightClass};
use crate::config::GameConfig;
use crate::input::PlayerInputState;
use crate::physics::{HeadlessQueries, PhysicsQueries, RapierQueries};

/// Игроки с контроллером
pub type ControlledPlayers<'w, 's> = Query<
    'w,
    's,
    (
        Entity,
        &'static Transform,
        &'static LookState,
        &'static PlayerInputState,
        &'static mut InteractionController,
    ),
    With<Player>,
>;

/// Интерактивные объекты (Without<Player>: Transform игрока читается параллельно)
pub type InteractableObjects<'w, 's> = Query<
    'w,
    's,
    (
        &'static mut Interactable,
        &'static mut RigidBodyState,
        &'static mut Transform,
        Option<&'static mut Door>,
        Option<&'static PushProfiles>,
    ),
    Without<Player>,
>;

impl ObjectAccess for InteractableObjects<'_, '_> {
    fn object_mut(&mut self, entity: Entity) -> Option<ObjectMut<'_>> {
        let (interactable, body, transform, door, profiles) = self.get_mut(entity).ok()?;

        Some(ObjectMut {
            interactable: interactable.into_inner(),
            body: body.into_inner(),
            transform: transform.into_inner(),
            door: door.map(Mut::into_inner),
            profiles: profiles.copied(),
        })
    }

    fn class(&self, entity: Entity) -> Option<WeightClass> {
        self.get(entity).ok().map(|(interactable, ..)| interactable.class)
    }

    fn position(&self, entity: Entity) -> Option<Vec3> {
        self.get(entity).ok().map(|(_, _, transform, ..)| transform.translation)
    }

    fn contains(&self, entity: Entity) -> bool {
        Query::contains(self, entity)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Phase {
    Input,
    Physics,
}

fn run_controllers<P: PhysicsQueries + ?Sized>(
    phase: Phase,
    physics: &P,
    ground_height: Option<f32>,
    dt: f32,
    config: &GameConfig,
    players: &mut ControlledPlayers,
    objects: &mut InteractableObjects,
    commands: &mut Commands,
    events: &mut EventWriter<InteractionEvent>,
) {
    for (holder, transform, look, input, mut controller) in players.iter_mut() {
        let ctx = ControlContext {
            holder,
            view: look.view_ray(transform.translation),
            yaw: look.yaw,
            ground_height,
            config: &config.interaction,
            dt,
        };

        let mut out = ControlOutput::default();
        match phase {
            Phase::Input => controller.apply_input(input, &ctx, physics, objects, &mut out),
            Phase::Physics => controller.physics_step(&ctx, physics, objects, &mut out),
        }

        apply_output(out, commands, events);
    }
}

fn apply_output(out: ControlOutput, commands: &mut Commands, events: &mut EventWriter<InteractionEvent>) {
    for entity in out.cancelled_resets {
        if let Ok(mut entity_commands) = commands.get_entity(entity) {
            entity_commands.remove::<ProfileReset>();
        }
    }

    for (entity, delay) in out.profile_resets {
        if let Ok(mut entity_commands) = commands.get_entity(entity) {
            entity_commands.insert(ProfileReset::new(delay));
        }
    }

    for event in out.events {
        events.write(event);
    }
}

/// Система: input фаза (headless)
pub fn apply_interaction_input_headless(
    mut commands: Commands,
    time: Res<Time>,
    config: Res<GameConfig>,
    queries: Res<HeadlessQueries>,
    mut players: ControlledPlayers,
    mut objects: InteractableObjects,
    mut events: EventWriter<InteractionEvent>,
) {
    run_controllers(
        Phase::Input,
        &*queries,
        Some(config.physics.ground_height),
        time.delta_secs(),
        &config,
        &mut players,
        &mut objects,
        &mut commands,
        &mut events,
    );
}

/// Система: physics фаза (headless)
pub fn step_interaction_headless(
    mut commands: Commands,
    time: Res<Time<Fixed>>,
    config: Res<GameConfig>,
    queries: Res<HeadlessQueries>,
    mut players: ControlledPlayers,
    mut objects: InteractableObjects,
    mut events: EventWriter<InteractionEvent>,
) {
    run_controllers(
        Phase::Physics,
        &*queries,
        Some(config.physics.ground_height),
        time.delta_secs(),
        &config,
        &mut players,
        &mut objects,
        &mut commands,
        &mut events,
    );
}

/// Система: input фаза (Rapier)
pub fn apply_interaction_input_rapier(
    mut commands: Commands,
    time: Res<Time>,
    config: Res<GameConfig>,
    rapier: ReadRapierContext,
    mut players: ControlledPlayers,
    mut objects: InteractableObjects,
    mut events: EventWriter<InteractionEvent>,
) {
    let Ok(context) = rapier.single() else {
        crate::logger::log_error("Rapier context not found, interaction input skipped");
        return;
    };
    let queries = RapierQueries::new(context);

    run_controllers(
        Phase::Input,
        &queries,
        None,
        time.delta_secs(),
        &config,
        &mut players,
        &mut objects,
        &mut commands,
        &mut events,
    );
}

/// Система: physics фаза (Rapier)
pub fn step_interaction_rapier(
    mut commands: Commands,
    time: Res<Time<Fixed>>,
    config: Res<GameConfig>,
    rapier: ReadRapierContext,
    mut players: ControlledPlayers,
    mut objects: InteractableObjects,
    mut events: EventWriter<InteractionEvent>,
) {
    let Ok(context) = rapier.single() else {
        crate::logger::log_error("Rapier context not found, interaction step skipped");
        return;
    };
    let queries = RapierQueries::new(context);

    run_controllers(
        Phase::Physics,
        &queries,
        None,
        time.delta_secs(),
        &config,
        &mut players,
        &mut objects,
        &mut commands,
        &mut events,
    );
}
