//! Unit тесты interaction controller'а (без App)
//!
//! Physics: HeadlessQueries с ручным snapshot'ом.
//! Объекты: BTreeMap вместо ECS query.

use std::collections::BTreeMap;

use bevy::prelude::*;

use super::controller::*;
use super::InteractionEvent;
use crate::components::*;
use crate::config::InteractionConfig;
use crate::input::PlayerInputState;
use crate::logger::{set_logger, BufferLogger};
use crate::physics::{HeadlessQueries, ProbeEntry};

const HOLDER: u32 = 1;
const DT: f32 = 1.0 / 60.0;

struct MockObject {
    interactable: Interactable,
    body: RigidBodyState,
    transform: Transform,
    door: Option<Door>,
    profiles: Option<PushProfiles>,
}

#[derive(Default)]
struct MockWorld {
    objects: BTreeMap<Entity, MockObject>,
}

impl ObjectAccess for MockWorld {
    fn object_mut(&mut self, entity: Entity) -> Option<ObjectMut<'_>> {
        let object = self.objects.get_mut(&entity)?;
        Some(ObjectMut {
            interactable: &mut object.interactable,
            body: &mut object.body,
            transform: &mut object.transform,
            door: object.door.as_mut(),
            profiles: object.profiles,
        })
    }

    fn class(&self, entity: Entity) -> Option<WeightClass> {
        self.objects.get(&entity).map(|object| object.interactable.class)
    }

    fn position(&self, entity: Entity) -> Option<Vec3> {
        self.objects.get(&entity).map(|object| object.transform.translation)
    }
}

/// Игрок в (0, 0, 0), смотрит в -Z, объект перед ним на 1.5 м на высоте глаз
struct Scene {
    config: InteractionConfig,
    physics: HeadlessQueries,
    world: MockWorld,
    controller: InteractionController,
    entries: Vec<ProbeEntry>,
}

impl Scene {
    fn new() -> Self {
        Self {
            config: InteractionConfig::default(),
            physics: HeadlessQueries::default(),
            world: MockWorld::default(),
            controller: InteractionController::default(),
            entries: Vec::new(),
        }
    }

    fn add_object(&mut self, index: u32, class: WeightClass, position: Vec3) -> Entity {
        let entity = Entity::from_raw(index);
        let profiles = (class == WeightClass::Heavy).then(PushProfiles::default);
        let body = match profiles {
            Some(profiles) => RigidBodyState::from_profile(profiles.resting),
            None => RigidBodyState::default(),
        };
        let door = (class == WeightClass::Door).then(|| Door::new(90.0, Quat::IDENTITY, DoorDrive::Manual));

        self.world.objects.insert(
            entity,
            MockObject {
                interactable: Interactable::new(class),
                body,
                transform: Transform::from_translation(position),
                door,
                profiles,
            },
        );
        self.entries.push(ProbeEntry {
            entity,
            center: position,
            shape: ProbeShape::Sphere { radius: 0.3 },
            layer: ProbeLayer::Pickup,
        });
        self.physics = HeadlessQueries::new(self.entries.clone());
        entity
    }

    fn add_wall(&mut self, index: u32, front_z: f32) {
        self.entries.push(ProbeEntry {
            entity: Entity::from_raw(index),
            center: Vec3::new(0.0, 1.5, front_z - 0.5),
            shape: ProbeShape::Cuboid {
                half_extents: Vec3::new(5.0, 3.0, 0.5),
            },
            layer: ProbeLayer::Environment,
        });
        self.physics = HeadlessQueries::new(self.entries.clone());
    }

    fn input(&mut self, input: PlayerInputState) -> ControlOutput {
        let mut out = ControlOutput::default();
        let ctx = context(&self.config, DT);
        self.controller
            .apply_input(&input, &ctx, &self.physics, &mut self.world, &mut out);
        out
    }

    fn step(&mut self) -> ControlOutput {
        let mut out = ControlOutput::default();
        let ctx = context(&self.config, DT);
        self.controller
            .physics_step(&ctx, &self.physics, &mut self.world, &mut out);
        out
    }

    fn object(&self, entity: Entity) -> &MockObject {
        &self.world.objects[&entity]
    }
}

fn context(config: &InteractionConfig, dt: f32) -> ControlContext<'_> {
    ControlContext {
        holder: Entity::from_raw(HOLDER),
        view: ViewRay {
            origin: Vec3::new(0.0, 1.6, 0.0),
            forward: Vec3::NEG_Z,
        },
        yaw: 0.0,
        ground_height: None,
        config,
        dt,
    }
}

fn press_interact() -> PlayerInputState {
    PlayerInputState {
        interact_pressed: true,
        interact_held: true,
        ..default()
    }
}

fn release_interact() -> PlayerInputState {
    PlayerInputState {
        interact_released: true,
        ..default()
    }
}

fn press_throw() -> PlayerInputState {
    PlayerInputState {
        throw_pressed: true,
        throw_held: true,
        ..default()
    }
}

fn hold_throw() -> PlayerInputState {
    PlayerInputState {
        throw_held: true,
        ..default()
    }
}

fn release_throw() -> PlayerInputState {
    PlayerInputState {
        throw_released: true,
        ..default()
    }
}

fn eye_level(z: f32) -> Vec3 {
    Vec3::new(0.0, 1.6, z)
}

/// Ровно одно из held/interacting после acquire, оба None после release
fn assert_exclusive(controller: &InteractionController) {
    assert!(
        !(controller.held().is_some() && controller.interacting().is_some()),
        "held and interacting at the same time"
    );
}

#[test]
fn test_pickup_light_object() {
    let mut scene = Scene::new();
    let object = scene.add_object(10, WeightClass::Light, eye_level(-1.5));

    let out = scene.input(press_interact());

    assert_eq!(scene.controller.held(), Some(object));
    assert_eq!(scene.controller.interacting(), None);
    assert!(out.events.contains(&InteractionEvent::PickedUp {
        holder: Entity::from_raw(HOLDER),
        object,
        class: WeightClass::Light,
    }));

    let held = scene.object(object);
    assert!(held.body.kinematic);
    assert!(!held.body.use_gravity);
    assert!(held.interactable.interacted);
    // Открытое пространство → hold point на max_hold_distance
    assert!((held.transform.translation - eye_level(-2.0)).length() < 1e-4);
}

#[test]
fn test_acquire_sets_exactly_one_slot_per_class() {
    for class in WeightClass::ALL {
        let mut scene = Scene::new();
        let object = scene.add_object(10, class, eye_level(-1.5));

        scene.input(press_interact());
        assert_exclusive(&scene.controller);
        assert_eq!(scene.controller.target(), Some(object), "{:?} not acquired", class);

        if class.is_holdable() {
            assert_eq!(scene.controller.held(), Some(object));
        } else {
            assert_eq!(scene.controller.interacting(), Some(object));
        }

        // Interact ещё раз → drop / release
        scene.input(press_interact());
        assert!(scene.controller.is_idle(), "{:?} not released", class);
        assert_eq!(scene.controller.target(), None);
    }
}

#[test]
fn test_drop_reenables_physics_with_forward_impulse() {
    let mut scene = Scene::new();
    let object = scene.add_object(10, WeightClass::Medium, eye_level(-1.5));
    scene.input(press_interact());

    let out = scene.input(press_interact());

    assert!(scene.controller.is_idle());
    let dropped = scene.object(object);
    assert!(!dropped.body.kinematic);
    assert!(dropped.body.use_gravity);
    // drop_impulse 2, mass 1 → 2 m/s вперёд
    assert!((dropped.body.velocity - Vec3::new(0.0, 0.0, -2.0)).length() < 1e-4);
    assert!(matches!(out.events.as_slice(), [InteractionEvent::Dropped { .. }]));
}

#[test]
fn test_holding_blocks_second_acquisition() {
    let mut scene = Scene::new();
    let first = scene.add_object(10, WeightClass::Light, eye_level(-1.5));
    scene.input(press_interact());
    assert_eq!(scene.controller.held(), Some(first));

    // Второй объект прямо перед игроком
    let second = scene.add_object(11, WeightClass::Light, eye_level(-1.0));
    scene.input(press_interact());

    assert!(scene.controller.is_idle(), "interact while holding must drop");
    assert!(!scene.object(second).body.kinematic);
    assert!(!scene.object(second).interactable.interacted);
}

#[test]
fn test_pickup_blocked_by_close_wall() {
    let mut scene = Scene::new();
    scene.add_object(10, WeightClass::Light, eye_level(-0.5));
    scene.add_wall(20, -0.1);

    let out = scene.input(press_interact());

    assert!(scene.controller.is_idle());
    assert!(out.events.is_empty());
}

#[test]
fn test_held_object_auto_drops_when_wall_too_close() {
    let mut scene = Scene::new();
    let object = scene.add_object(10, WeightClass::Light, eye_level(-1.5));
    scene.input(press_interact());

    scene.step();
    assert_eq!(scene.controller.held(), Some(object));

    scene.add_wall(20, -0.15);
    let out = scene.step();

    assert!(scene.controller.is_idle());
    assert!(!scene.object(object).body.kinematic);
    assert!(out
        .events
        .iter()
        .any(|event| matches!(event, InteractionEvent::Dropped { object: o, .. } if *o == object)));
}

#[test]
fn test_hold_point_stops_in_front_of_wall() {
    let mut scene = Scene::new();
    let object = scene.add_object(10, WeightClass::Light, eye_level(-1.0));
    scene.input(press_interact());

    scene.add_wall(20, -1.5);
    scene.step();

    assert_eq!(scene.controller.held(), Some(object));
    let z = scene.object(object).transform.translation.z;
    assert!((z - (-1.2)).abs() < 1e-4, "z = {}", z);
}

#[test]
fn test_charged_throw_impulse() {
    let mut scene = Scene::new();
    let object = scene.add_object(10, WeightClass::Medium, eye_level(-1.5));
    scene.input(press_interact());

    scene.input(press_throw());
    for _ in 0..200 {
        scene.input(hold_throw());
    }
    let out = scene.input(release_throw());

    assert!(scene.controller.is_idle());
    // Medium base 5 × max multiplier 2, mass 1
    let velocity = scene.object(object).body.velocity;
    assert!((velocity - Vec3::new(0.0, 0.0, -10.0)).length() < 1e-3, "velocity = {:?}", velocity);
    assert!(matches!(out.events.as_slice(), [InteractionEvent::Thrown { .. }]));
}

#[test]
fn test_throw_logs_drop_notification() {
    let buffer = BufferLogger::default();
    set_logger(Box::new(buffer.clone()));

    let mut scene = Scene::new();
    let object = scene.add_object(4242, WeightClass::Light, eye_level(-1.5));
    scene.input(press_interact());
    scene.input(PlayerInputState {
        throw_pressed: true,
        throw_released: true,
        ..default()
    });

    assert!(scene.controller.is_idle());
    let expected = format!("Dropped: {:?}", object);
    let lines = buffer.lines.lock().map(|lines| lines.clone()).unwrap_or_default();
    assert!(
        lines.iter().any(|line| line.contains("[INFO]") && line.contains(&expected)),
        "no drop line in {:?}",
        lines
    );
}

#[test]
fn test_quick_throw_uses_base_force() {
    let mut scene = Scene::new();
    let object = scene.add_object(10, WeightClass::Light, eye_level(-1.5));
    scene.input(press_interact());

    scene.input(PlayerInputState {
        throw_pressed: true,
        throw_released: true,
        ..default()
    });

    assert!(scene.controller.is_idle());
    let speed = scene.object(object).body.velocity.length();
    assert!((speed - scene.config.light_throw_force).abs() < 1e-3);
}

#[test]
fn test_throw_and_drop_without_object_are_noops() {
    let mut scene = Scene::new();
    scene.add_object(10, WeightClass::Light, eye_level(-1.5));

    let out = scene.input(release_throw());
    assert_eq!(out, ControlOutput::default());

    let mut out = ControlOutput::default();
    let ctx = context(&scene.config, DT);
    let mut controller = InteractionController::default();
    controller.drop_held(&ctx, &mut scene.world, &mut out);
    controller.throw_held(&ctx, &mut scene.world, &mut out);
    controller.release(&ctx, &mut scene.world, &mut out);

    assert!(controller.is_idle());
    assert_eq!(out, ControlOutput::default());
}

#[test]
fn test_rotate_input_spins_held_object() {
    let mut scene = Scene::new();
    scene.add_object(10, WeightClass::Light, eye_level(-1.5));
    scene.input(press_interact());

    for _ in 0..60 {
        scene.input(PlayerInputState {
            rotate_axis: 1.0,
            ..default()
        });
    }

    let InteractionState::Holding(held) = scene.controller.state else {
        panic!("expected holding");
    };
    // rotate_speed 90°/s × 1 s
    assert!((held.rotation_offset - 90.0).abs() < 1e-2);
}

#[test]
fn test_heavy_interaction_swaps_profiles() {
    let mut scene = Scene::new();
    let object = scene.add_object(10, WeightClass::Heavy, eye_level(-1.5));
    let profiles = PushProfiles::default();

    let out = scene.input(press_interact());
    assert_eq!(scene.object(object).body.profile(), profiles.push);
    assert_eq!(out.cancelled_resets, vec![object]);

    let out = scene.input(press_interact());
    assert!(scene.controller.is_idle());
    assert_eq!(out.profile_resets, vec![(object, scene.config.push_reset_delay)]);
}

#[test]
fn test_idle_push_is_one_shot_without_profile_change() {
    let mut scene = Scene::new();
    let object = scene.add_object(10, WeightClass::Heavy, eye_level(-1.5));
    let resting = PushProfiles::default().resting;

    let out = scene.input(press_throw());

    assert!(scene.controller.is_idle());
    let pushed = scene.object(object);
    assert_eq!(pushed.body.profile(), resting);
    assert_eq!(pushed.body.velocity.y, 0.0);
    // push_force 10 / resting mass 100
    assert!((pushed.body.velocity.length() - 0.1).abs() < 1e-4);
    assert!(out.profile_resets.is_empty());
}

#[test]
fn test_idle_push_ignores_light_objects() {
    let mut scene = Scene::new();
    let object = scene.add_object(10, WeightClass::Light, eye_level(-1.5));

    let out = scene.input(press_throw());

    assert!(out.events.is_empty());
    assert_eq!(scene.object(object).body.velocity, Vec3::ZERO);
}

#[test]
fn test_charged_push_releases_and_schedules_reset() {
    let mut scene = Scene::new();
    let object = scene.add_object(10, WeightClass::Heavy, eye_level(-1.5));
    scene.input(press_interact());

    scene.input(press_throw());
    for _ in 0..120 {
        scene.input(hold_throw());
    }
    let out = scene.input(release_throw());

    assert!(scene.controller.is_idle());
    assert_eq!(out.profile_resets, vec![(object, scene.config.push_reset_delay)]);

    let expected = scene.config.push_force * scene.config.max_charge_multiplier;
    let impulse = out
        .events
        .iter()
        .find_map(|event| match event {
            InteractionEvent::Pushed { impulse, .. } => Some(*impulse),
            _ => None,
        })
        .expect("push event");
    assert!((impulse.length() - expected).abs() < 1e-3);
    assert_eq!(impulse.y, 0.0);
}

#[test]
fn test_heavy_auto_release_when_out_of_reach() {
    let mut scene = Scene::new();
    let object = scene.add_object(10, WeightClass::Heavy, eye_level(-1.5));
    scene.input(press_interact());

    scene.step();
    assert_eq!(scene.controller.interacting(), Some(object));

    if let Some(far) = scene.world.objects.get_mut(&object) {
        far.transform.translation = eye_level(-10.0);
    }
    let out = scene.step();

    assert!(scene.controller.is_idle());
    assert_eq!(out.profile_resets.len(), 1);
}

#[test]
fn test_manual_door_opens_to_max_then_releases() {
    let mut scene = Scene::new();
    let door = scene.add_object(10, WeightClass::Door, eye_level(-1.5));
    scene.input(press_interact());
    assert_eq!(scene.controller.interacting(), Some(door));

    let mut opened = false;
    for _ in 0..200 {
        let out = scene.step();
        let angle = scene.object(door).door.as_ref().map(|d| d.angle).unwrap_or_default();
        assert!(angle <= 90.0, "angle {} above max", angle);

        if out.events.iter().any(|event| matches!(event, InteractionEvent::DoorOpened { .. })) {
            opened = true;
            break;
        }
    }

    assert!(opened);
    assert!(scene.controller.is_idle(), "reaching max angle forces release");
    assert_eq!(scene.object(door).door.as_ref().map(|d| d.angle), Some(90.0));
}

#[test]
fn test_door_released_with_interact_button() {
    let mut scene = Scene::new();
    let door = scene.add_object(10, WeightClass::Door, eye_level(-1.5));
    if let Some(object) = scene.world.objects.get_mut(&door) {
        object.door = Some(Door::new(90.0, Quat::IDENTITY, DoorDrive::Hinge(HingeMotor::default())));
    }

    scene.input(press_interact());
    scene.step();
    let motor_enabled = |scene: &Scene| match scene.object(door).door.as_ref().map(|d| d.drive) {
        Some(DoorDrive::Hinge(motor)) => motor.enabled,
        _ => false,
    };
    assert!(motor_enabled(&scene));

    scene.input(release_interact());
    assert!(scene.controller.is_idle());
    assert!(!motor_enabled(&scene));
}

#[test]
fn test_destroyed_target_resets_controller() {
    let mut scene = Scene::new();
    let object = scene.add_object(10, WeightClass::Light, eye_level(-1.5));
    scene.input(press_interact());

    scene.world.objects.remove(&object);
    let out = scene.step();

    assert!(scene.controller.is_idle());
    assert!(out.events.is_empty());
}
