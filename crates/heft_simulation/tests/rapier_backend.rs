//! Rapier backend integration test
//!
//! Та же игра, но запросы и интеграция через bevy_rapier3d (step в FixedPostUpdate).
//!
//! Проверяем:
//! - hinge дверь: мотор крутит joint до лимита, контроллер отпускает на max_angle
//! - объект падает на коллайдер пола и остаётся на нём

use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use heft_simulation::objects::{spawn_object, ObjectSpec};
use heft_simulation::player::spawn_player;
use heft_simulation::*;

#[derive(Resource, Default)]
struct OpenedDoors(Vec<Entity>);

fn record_opened_doors(mut events: EventReader<InteractionEvent>, mut opened: ResMut<OpenedDoors>) {
    for event in events.read() {
        if let InteractionEvent::DoorOpened { door, .. } = event {
            opened.0.push(*door);
        }
    }
}

fn create_rapier_app() -> App {
    let mut app = create_simulation_app(42, GameConfig::default(), PhysicsBackend::Rapier);
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(1.0 / 60.0)))
        .init_resource::<OpenedDoors>()
        .add_systems(Last, record_opened_doors);

    app.world_mut().spawn((
        Name::new("Floor"),
        Transform::from_xyz(0.0, -0.5, 0.0),
        ProbeVolume::cuboid(Vec3::new(20.0, 0.5, 20.0), ProbeLayer::Environment),
    ));

    // Startup + Rapier context
    app.update();
    app
}

fn spawn(app: &mut App, spec: ObjectSpec, transform: Transform) -> Entity {
    let config = app.world().resource::<GameConfig>().clone();
    let entity = spawn_object(&mut app.world_mut().commands(), &spec, transform, None, &config);
    app.world_mut().flush();
    entity
}

#[test]
fn test_hinge_door_opens_to_max_and_releases() {
    let mut app = create_rapier_app();
    let config = app.world().resource::<GameConfig>().clone();
    let player = spawn_player(&mut app.world_mut().commands(), Vec3::ZERO, &config.player);
    app.world_mut().flush();

    let mut spec = ObjectSpec::new("Door1", WeightClass::Door);
    spec.hinge = true;
    // Чуть выше пола, чтобы трение не мешало мотору
    let door = spawn(&mut app, spec, Transform::from_xyz(0.0, 1.05, -1.5));

    // Коллайдеры попадают в Rapier на первом step
    for _ in 0..3 {
        app.update();
    }

    app.world_mut().send_event(PlayerInputEvent::InteractPressed);
    app.update();
    let controller = app.world().get::<InteractionController>(player).cloned().unwrap();
    assert_eq!(controller.interacting(), Some(door));

    // 90° при 90°/s ≈ 60 шагов
    let mut released_at = None;
    for update in 0..240 {
        app.update();
        let controller = app.world().get::<InteractionController>(player).unwrap();
        if controller.is_idle() {
            released_at = Some(update);
            break;
        }
    }

    assert!(released_at.is_some(), "door never reached its limit");
    assert_eq!(app.world().resource::<OpenedDoors>().0, vec![door]);

    let door_state = app.world().get::<Door>(door).cloned().unwrap();
    assert!(door_state.angle <= door_state.max_angle);
    assert!(door_state.angle > door_state.max_angle - 5.0, "angle = {}", door_state.angle);

    match door_state.drive {
        DoorDrive::Hinge(motor) => assert!(!motor.enabled),
        DoorDrive::Manual => panic!("expected hinge drive"),
    }
}

#[test]
fn test_dropped_object_rests_on_floor_collider() {
    let mut app = create_rapier_app();
    let cup = spawn(
        &mut app,
        ObjectSpec::new("Cup1", WeightClass::Light),
        Transform::from_xyz(0.0, 2.0, 0.0),
    );

    for _ in 0..180 {
        app.update();
    }

    // Шар радиуса 0.2 на полу y = 0
    let y = app.world().get::<Transform>(cup).unwrap().translation.y;
    assert!((y - 0.2).abs() < 0.1, "cup y = {}", y);
    let body = app.world().get::<RigidBodyState>(cup).unwrap();
    assert!(body.velocity.length() < 0.5, "velocity = {:?}", body.velocity);
}
