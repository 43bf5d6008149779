//! Interaction domain: подбор, бросок, толкание, двери
//!
//! Архитектура:
//! - controller: state machine (Idle / Holding / Interacting), без ECS
//! - hold / throw / push / door: чистые функции отдельных действий
//! - systems: ECS обвязка, по одной обёртке на physics бэкенд

use bevy::prelude::*;

use crate::components::WeightClass;
use crate::physics::PhysicsBackend;
use crate::SimulationSet;

pub mod controller;
pub mod door;
pub mod hold;
pub mod push;
pub mod systems;
pub mod throw;

#[cfg(test)]
mod controller_tests;

pub use controller::{
    ControlContext, ControlOutput, HeldObject, InteractMode, InteractingObject, InteractionController,
    InteractionState, ObjectAccess, ObjectMut,
};
pub use push::ProfileReset;

/// События взаимодействия (on_pickup / on_drop и остальные переходы)
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub enum InteractionEvent {
    PickedUp {
        holder: Entity,
        object: Entity,
        class: WeightClass,
    },
    Dropped {
        holder: Entity,
        object: Entity,
    },
    /// Отпускание с броском: для объекта это и есть on_drop (отдельного Dropped нет)
    Thrown {
        holder: Entity,
        object: Entity,
        impulse: Vec3,
    },
    Pushed {
        holder: Entity,
        object: Entity,
        impulse: Vec3,
    },
    InteractionStarted {
        holder: Entity,
        object: Entity,
        class: WeightClass,
    },
    InteractionEnded {
        holder: Entity,
        object: Entity,
    },
    /// Дверь дошла до max угла (после этого release)
    DoorOpened {
        holder: Entity,
        door: Entity,
    },
}

/// Interaction Plugin
///
/// Update (Control): input фаза контроллера.
/// FixedUpdate (Control): hold point / дверь / auto-release.
/// FixedUpdate (Resolve): возврат resting профиля Heavy объектов.
pub struct InteractionPlugin;

impl Plugin for InteractionPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<InteractionEvent>().add_systems(
            FixedUpdate,
            push::tick_profile_resets.in_set(SimulationSet::Resolve),
        );

        match PhysicsBackend::configured(app) {
            PhysicsBackend::Headless => {
                app.add_systems(
                    Update,
                    systems::apply_interaction_input_headless.in_set(SimulationSet::Control),
                )
                .add_systems(
                    FixedUpdate,
                    systems::step_interaction_headless.in_set(SimulationSet::Control),
                );
            }
            PhysicsBackend::Rapier => {
                app.add_systems(
                    Update,
                    systems::apply_interaction_input_rapier.in_set(SimulationSet::Control),
                )
                .add_systems(
                    FixedUpdate,
                    systems::step_interaction_rapier.in_set(SimulationSet::Control),
                );
            }
        }
    }
}
