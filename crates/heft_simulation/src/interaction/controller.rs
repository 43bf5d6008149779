//! Interaction controller: state machine подбора / броска / толкания / двери
//!
//! Две фазы:
//! - `apply_input` (Update, frame dt): interact/throw/rotate input
//! - `physics_step` (FixedUpdate): hold point, auto-drop, дверь, auto-release
//!
//! Мир скрыт за `ObjectAccess` (ECS query или mock в тестах) и `PhysicsQueries`.
//! Побочные эффекты, которые требуют Commands/EventWriter, копятся в `ControlOutput`.

use bevy::prelude::*;

use super::door::{drive_door, engage_door, release_door};
use super::hold::{held_rotation, hold_point, resolve_hold_target};
use super::push::{engage_push_profile, push_impulse};
use super::throw::{accumulate_charge, throw_impulse};
use super::InteractionEvent;
use crate::components::{
    Door, Interactable, ProbeMask, PushProfiles, RigidBodyState, ViewRay, WeightClass,
};
use crate::config::InteractionConfig;
use crate::input::PlayerInputState;
use crate::logger::{log, log_info, log_warning};
use crate::physics::{PhysicsQueries, ProbeFilter};

/// Объект в руках (Light/Medium)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeldObject {
    pub entity: Entity,
    pub class: WeightClass,
    /// Дополнительный yaw (градусы) от rotate input
    pub rotation_offset: f32,
    /// Заряд броска (сек), Some пока throw зажат
    pub charge: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InteractMode {
    /// Heavy: push профиль включён, опциональный заряд толчка
    Push { charge: Option<f32> },
    Door,
}

/// Объект во взаимодействии без подбора (Heavy/Door)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractingObject {
    pub entity: Entity,
    pub class: WeightClass,
    pub mode: InteractMode,
}

/// Held и interacting взаимоисключающие по построению
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    Holding(HeldObject),
    Interacting(InteractingObject),
}

/// Мутабельный view на интерактивный объект
pub struct ObjectMut<'a> {
    pub interactable: &'a mut Interactable,
    pub body: &'a mut RigidBodyState,
    pub transform: &'a mut Transform,
    pub door: Option<&'a mut Door>,
    pub profiles: Option<PushProfiles>,
}

/// Доступ к интерактивным объектам по Entity
///
/// `object_mut` только там, где реально пишем: в ECS он помечает компоненты changed.
pub trait ObjectAccess {
    fn object_mut(&mut self, entity: Entity) -> Option<ObjectMut<'_>>;

    fn class(&self, entity: Entity) -> Option<WeightClass>;

    fn position(&self, entity: Entity) -> Option<Vec3>;

    fn contains(&self, entity: Entity) -> bool {
        self.class(entity).is_some()
    }
}

/// Держатель и его точка обзора на этом шаге
#[derive(Debug, Clone, Copy)]
pub struct ControlContext<'a> {
    pub holder: Entity,
    pub view: ViewRay,
    /// Yaw держателя (градусы)
    pub yaw: f32,
    /// Неявная плоскость пола (headless бэкенд), None у Rapier
    pub ground_height: Option<f32>,
    pub config: &'a InteractionConfig,
    pub dt: f32,
}

/// Побочные эффекты шага (применяются ECS системой)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlOutput {
    pub events: Vec<InteractionEvent>,
    /// (entity, delay): вернуть resting профиль через delay
    pub profile_resets: Vec<(Entity, f32)>,
    /// Отменить ожидающий ProfileReset (объект снова взят в работу)
    pub cancelled_resets: Vec<Entity>,
}

/// Per-player controller
#[derive(Component, Debug, Clone, Default)]
pub struct InteractionController {
    pub state: InteractionState,
}

impl InteractionController {
    pub fn is_idle(&self) -> bool {
        self.state == InteractionState::Idle
    }

    pub fn held(&self) -> Option<Entity> {
        match self.state {
            InteractionState::Holding(held) => Some(held.entity),
            _ => None,
        }
    }

    pub fn interacting(&self) -> Option<Entity> {
        match self.state {
            InteractionState::Interacting(object) => Some(object.entity),
            _ => None,
        }
    }

    /// Текущая цель (held или interacting)
    pub fn target(&self) -> Option<Entity> {
        self.held().or(self.interacting())
    }

    /// Input фаза (frame rate)
    pub fn apply_input<P, O>(
        &mut self,
        input: &PlayerInputState,
        ctx: &ControlContext,
        physics: &P,
        objects: &mut O,
        out: &mut ControlOutput,
    ) where
        P: PhysicsQueries + ?Sized,
        O: ObjectAccess + ?Sized,
    {
        self.forget_missing_target(objects);

        if input.interact_pressed {
            match self.state {
                InteractionState::Idle => self.try_acquire(ctx, physics, objects, out),
                InteractionState::Holding(_) => self.drop_held(ctx, objects, out),
                InteractionState::Interacting(_) => self.release(ctx, objects, out),
            }
        }

        // Дверь работает пока interact зажат
        if input.interact_released {
            if let InteractionState::Interacting(InteractingObject {
                mode: InteractMode::Door,
                ..
            }) = self.state
            {
                self.release(ctx, objects, out);
            }
        }

        if input.throw_pressed {
            if self.is_idle() {
                self.push_in_front(ctx, physics, objects, out);
            } else {
                self.start_charge();
            }
        } else if input.throw_held {
            self.accumulate_charge(ctx);
        }

        if input.throw_released {
            match self.state {
                InteractionState::Holding(HeldObject { charge: Some(_), .. }) => {
                    self.throw_held(ctx, objects, out)
                }
                InteractionState::Interacting(InteractingObject {
                    mode: InteractMode::Push { charge: Some(_) },
                    ..
                }) => self.charged_push(ctx, objects, out),
                _ => {}
            }
        }

        if input.rotate_axis != 0.0 {
            if let InteractionState::Holding(held) = &mut self.state {
                held.rotation_offset += input.rotate_axis * ctx.config.rotate_speed * ctx.dt;
            }
        }
    }

    /// Physics фаза (fixed rate)
    pub fn physics_step<P, O>(&mut self, ctx: &ControlContext, physics: &P, objects: &mut O, out: &mut ControlOutput)
    where
        P: PhysicsQueries + ?Sized,
        O: ObjectAccess + ?Sized,
    {
        self.forget_missing_target(objects);

        match self.state {
            InteractionState::Idle => {}
            InteractionState::Holding(held) => self.update_held(held, ctx, physics, objects, out),
            InteractionState::Interacting(object) => self.update_interacting(object, ctx, objects, out),
        }
    }

    /// Drop: физика обратно, лёгкий импульс вперёд. Без объекта в руках no-op.
    pub fn drop_held<O: ObjectAccess + ?Sized>(&mut self, ctx: &ControlContext, objects: &mut O, out: &mut ControlOutput) {
        let InteractionState::Holding(held) = self.state else {
            return;
        };
        self.state = InteractionState::Idle;

        if let Some(object) = objects.object_mut(held.entity) {
            object.body.make_dynamic();
            object.body.apply_impulse(ctx.view.forward * ctx.config.drop_impulse);
        }

        out.events.push(InteractionEvent::Dropped {
            holder: ctx.holder,
            object: held.entity,
        });
        log_info(&format!("Dropped: {:?}", held.entity));
    }

    /// Throw с накопленным зарядом. Без объекта в руках no-op.
    pub fn throw_held<O: ObjectAccess + ?Sized>(&mut self, ctx: &ControlContext, objects: &mut O, out: &mut ControlOutput) {
        let InteractionState::Holding(held) = self.state else {
            return;
        };
        self.state = InteractionState::Idle;

        let impulse = throw_impulse(ctx.config, held.class, ctx.view.forward, held.charge.unwrap_or(0.0));
        if let Some(object) = objects.object_mut(held.entity) {
            object.body.make_dynamic();
            object.body.apply_impulse(impulse);
        }

        out.events.push(InteractionEvent::Thrown {
            holder: ctx.holder,
            object: held.entity,
            impulse,
        });
        // Для объекта бросок тоже drop
        log_info(&format!("Dropped: {:?}", held.entity));
        log_info(&format!("Threw {:?} with impulse {:.2}", held.entity, impulse.length()));
    }

    /// Отпустить Heavy/Door
    pub fn release<O: ObjectAccess + ?Sized>(&mut self, ctx: &ControlContext, objects: &mut O, out: &mut ControlOutput) {
        let InteractionState::Interacting(interacting) = self.state else {
            return;
        };
        self.state = InteractionState::Idle;

        match interacting.mode {
            InteractMode::Push { .. } => {
                out.profile_resets.push((interacting.entity, ctx.config.push_reset_delay));
            }
            InteractMode::Door => {
                if let Some(ObjectMut { door: Some(door), .. }) = objects.object_mut(interacting.entity) {
                    release_door(door);
                }
            }
        }

        out.events.push(InteractionEvent::InteractionEnded {
            holder: ctx.holder,
            object: interacting.entity,
        });
        log(&format!("Released {:?}", interacting.entity));
    }

    fn try_acquire<P, O>(&mut self, ctx: &ControlContext, physics: &P, objects: &mut O, out: &mut ControlOutput)
    where
        P: PhysicsQueries + ?Sized,
        O: ObjectAccess + ?Sized,
    {
        let config = ctx.config;
        let exclude = [ctx.holder];
        let filter = ProbeFilter::new(ProbeMask::PICKUP).excluding(&exclude);

        let Some(hit) = physics.sphere_cast(
            ctx.view.origin,
            ctx.view.forward,
            config.pickup_radius,
            config.pickup_range,
            &filter,
        ) else {
            return;
        };

        let Some(class) = objects.class(hit.entity) else {
            return;
        };

        let hold_exclude = [ctx.holder, hit.entity];
        let hold_target = hold_point(physics, &ctx.view, &hold_exclude, config);
        if class.is_holdable() && hold_target.is_none() {
            log(&format!("Pickup of {:?} blocked: no valid hold point", hit.entity));
            return;
        }

        let Some(object) = objects.object_mut(hit.entity) else {
            return;
        };

        match class {
            WeightClass::Light | WeightClass::Medium => {
                let Some(point) = hold_target else {
                    return;
                };

                object.body.make_kinematic();
                object.transform.translation = point;
                object.transform.rotation = held_rotation(ctx.yaw, 0.0, config);
                object.interactable.interacted = true;

                self.state = InteractionState::Holding(HeldObject {
                    entity: hit.entity,
                    class,
                    rotation_offset: 0.0,
                    charge: None,
                });
                out.events.push(InteractionEvent::PickedUp {
                    holder: ctx.holder,
                    object: hit.entity,
                    class,
                });
                log_info(&format!("Picked up: {:?} ({})", hit.entity, class.tag()));
            }
            WeightClass::Heavy => {
                if let Some(profiles) = object.profiles {
                    engage_push_profile(object.body, &profiles);
                }
                object.interactable.interacted = true;

                self.state = InteractionState::Interacting(InteractingObject {
                    entity: hit.entity,
                    class,
                    mode: InteractMode::Push { charge: None },
                });
                out.cancelled_resets.push(hit.entity);
                out.events.push(InteractionEvent::InteractionStarted {
                    holder: ctx.holder,
                    object: hit.entity,
                    class,
                });
                log_info(&format!("Started pushing {:?}", hit.entity));
            }
            WeightClass::Door => {
                let Some(door) = object.door else {
                    log_warning(&format!("{:?} tagged Door but has no Door component", hit.entity));
                    return;
                };
                engage_door(door, config);
                object.interactable.interacted = true;

                self.state = InteractionState::Interacting(InteractingObject {
                    entity: hit.entity,
                    class,
                    mode: InteractMode::Door,
                });
                out.events.push(InteractionEvent::InteractionStarted {
                    holder: ctx.holder,
                    object: hit.entity,
                    class,
                });
                log_info(&format!("Started opening door {:?}", hit.entity));
            }
        }
    }

    /// Idle + throw: одиночный толчок Heavy объекта перед игроком
    fn push_in_front<P, O>(&mut self, ctx: &ControlContext, physics: &P, objects: &mut O, out: &mut ControlOutput)
    where
        P: PhysicsQueries + ?Sized,
        O: ObjectAccess + ?Sized,
    {
        let config = ctx.config;
        let exclude = [ctx.holder];
        let filter = ProbeFilter::new(ProbeMask::PICKUP).excluding(&exclude);

        let Some(hit) = physics.sphere_cast(
            ctx.view.origin,
            ctx.view.forward,
            config.pickup_radius,
            config.pickup_range,
            &filter,
        ) else {
            return;
        };

        if objects.class(hit.entity) != Some(WeightClass::Heavy) {
            return;
        }
        let Some(object) = objects.object_mut(hit.entity) else {
            return;
        };

        let impulse = push_impulse(config, ctx.view.horizontal_forward(), 0.0);
        object.body.apply_impulse(impulse);
        object.interactable.interacted = true;

        out.events.push(InteractionEvent::Pushed {
            holder: ctx.holder,
            object: hit.entity,
            impulse,
        });
        log_info(&format!("Pushed {:?}", hit.entity));
    }

    /// Interacting(Push) + throw released: заряженный толчок и release
    fn charged_push<O: ObjectAccess + ?Sized>(&mut self, ctx: &ControlContext, objects: &mut O, out: &mut ControlOutput) {
        let InteractionState::Interacting(InteractingObject {
            entity,
            mode: InteractMode::Push { charge },
            ..
        }) = self.state
        else {
            return;
        };

        let impulse = push_impulse(ctx.config, ctx.view.horizontal_forward(), charge.unwrap_or(0.0));
        if let Some(object) = objects.object_mut(entity) {
            object.body.apply_impulse(impulse);
        }

        out.events.push(InteractionEvent::Pushed {
            holder: ctx.holder,
            object: entity,
            impulse,
        });
        log_info(&format!("Pushed {:?} (charged)", entity));

        self.release(ctx, objects, out);
    }

    fn start_charge(&mut self) {
        match &mut self.state {
            InteractionState::Holding(held) => held.charge = Some(0.0),
            InteractionState::Interacting(InteractingObject {
                mode: InteractMode::Push { charge },
                ..
            }) => *charge = Some(0.0),
            _ => {}
        }
    }

    fn accumulate_charge(&mut self, ctx: &ControlContext) {
        let charge = match &mut self.state {
            InteractionState::Holding(held) => &mut held.charge,
            InteractionState::Interacting(InteractingObject {
                mode: InteractMode::Push { charge },
                ..
            }) => charge,
            _ => return,
        };

        if let Some(value) = charge {
            *value = accumulate_charge(ctx.config, *value, ctx.dt);
        }
    }

    fn update_held<P, O>(&mut self, held: HeldObject, ctx: &ControlContext, physics: &P, objects: &mut O, out: &mut ControlOutput)
    where
        P: PhysicsQueries + ?Sized,
        O: ObjectAccess + ?Sized,
    {
        let exclude = [ctx.holder, held.entity];

        let blocked = {
            let Some(object) = objects.object_mut(held.entity) else {
                return;
            };

            match resolve_hold_target(
                physics,
                &ctx.view,
                object.transform.translation,
                &exclude,
                ctx.ground_height,
                ctx.config,
            ) {
                Some(target) => {
                    object.transform.translation = target;
                    object.transform.rotation = held_rotation(ctx.yaw, held.rotation_offset, ctx.config);
                    object.body.zero_velocities();
                    false
                }
                None => true,
            }
        };

        if blocked {
            log(&format!("Hold point for {:?} blocked, dropping", held.entity));
            self.drop_held(ctx, objects, out);
        }
    }

    fn update_interacting<O: ObjectAccess + ?Sized>(
        &mut self,
        interacting: InteractingObject,
        ctx: &ControlContext,
        objects: &mut O,
        out: &mut ControlOutput,
    ) {
        let Some(position) = objects.position(interacting.entity) else {
            return;
        };

        if position.distance(ctx.view.origin) > ctx.config.max_interact_distance {
            log(&format!("{:?} out of reach, releasing", interacting.entity));
            self.release(ctx, objects, out);
            return;
        }

        if interacting.mode != InteractMode::Door {
            return;
        }

        let fully_open = match objects.object_mut(interacting.entity) {
            Some(ObjectMut {
                door: Some(door),
                transform,
                ..
            }) => drive_door(door, transform, ctx.config, ctx.dt),
            _ => false,
        };

        if fully_open {
            out.events.push(InteractionEvent::DoorOpened {
                holder: ctx.holder,
                door: interacting.entity,
            });
            self.release(ctx, objects, out);
        }
    }

    /// Цель пропала из мира (разрушена) → Idle
    fn forget_missing_target<O: ObjectAccess + ?Sized>(&mut self, objects: &mut O) {
        let Some(target) = self.target() else {
            return;
        };

        if !objects.contains(target) {
            log_warning(&format!("Interaction target {:?} no longer exists, resetting controller", target));
            self.state = InteractionState::Idle;
        }
    }
}
