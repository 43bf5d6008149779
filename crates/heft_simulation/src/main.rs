//! Headless симуляция HEFT
//!
//! Запускает Bevy App без рендера: демо уровень + скриптованный input.
//!
//! Использование:
//!   heft_simulation [config.json] [--layout level.json] [--rapier] [--seed N]

use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use heft_simulation::ai::spawn_enemy;
use heft_simulation::objects::{spawn_object, ObjectSpec};
use heft_simulation::player::spawn_player;
use heft_simulation::spawn::{PrefabDef, ShapeDef, SpawnPointDef};
use heft_simulation::*;

const TICKS: usize = 900;

#[derive(Debug)]
struct Args {
    config: Option<String>,
    layout: Option<String>,
    backend: PhysicsBackend,
    seed: u64,
}

/// Разбор аргументов: непонятное логируем warning'ом и пропускаем
fn parse_args(raw: impl IntoIterator<Item = String>) -> Args {
    let mut args = Args {
        config: None,
        layout: None,
        backend: PhysicsBackend::Headless,
        seed: 42,
    };

    let mut raw = raw.into_iter();
    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "--rapier" => args.backend = PhysicsBackend::Rapier,
            "--layout" => match raw.next() {
                Some(path) => args.layout = Some(path),
                None => log_warning("--layout requires a path, using the demo layout"),
            },
            "--seed" => match raw.next().map(|value| (value.parse::<u64>(), value)) {
                Some((Ok(seed), _)) => args.seed = seed,
                Some((Err(_), value)) => {
                    log_warning(&format!("Invalid --seed '{}', using {}", value, args.seed));
                }
                None => log_warning(&format!("--seed requires a value, using {}", args.seed)),
            },
            flag if flag.starts_with("--") => log_warning(&format!("Unknown flag '{}' ignored", flag)),
            _ if args.config.is_some() => log_warning(&format!("Extra argument '{}' ignored", arg)),
            _ => args.config = Some(arg),
        }
    }

    args
}

/// Встроенный уровень: две полки с точками наверху + точки на полу
fn demo_layout() -> SpawnLayout {
    let shelf = PrefabDef::new(
        "Shelf",
        "Heavy",
        PhysicsProfile {
            mass: 100.0,
            linear_damping: 5.0,
            angular_damping: 5.0,
        },
        ShapeDef::Cuboid {
            half_extents: [1.0, 1.0, 0.3],
        },
    )
    .with_spawn_points(vec![
        SpawnPointDef::new("ShelfTop", "Light", Vec3::new(0.0, 1.2, 0.0)),
    ]);

    SpawnLayout {
        root_points: vec![
            SpawnPointDef::new("EastWall", "Heavy", Vec3::new(6.0, 1.0, -6.0)),
            SpawnPointDef::new("WestWall", "Heavy", Vec3::new(-6.0, 1.0, -6.0)),
            SpawnPointDef::new("Rug", "Medium", Vec3::new(-3.0, 0.5, 3.0)),
        ],
        prefabs: vec![
            shelf,
            PrefabDef::new("Mug", "Light", PhysicsProfile::default(), ShapeDef::Sphere { radius: 0.15 }),
            PrefabDef::new("Vase", "Medium", PhysicsProfile::default(), ShapeDef::Sphere { radius: 0.3 }),
        ],
    }
}

/// Статика и сценарные объекты перед игроком
fn spawn_demo_scene(commands: &mut Commands, config: &GameConfig) -> Entity {
    commands.spawn((
        Name::new("Floor"),
        Transform::from_xyz(0.0, -0.5, 0.0),
        ProbeVolume::cuboid(Vec3::new(20.0, 0.5, 20.0), ProbeLayer::Environment),
    ));
    commands.spawn((
        Name::new("ScoreZone"),
        Transform::from_xyz(0.0, 1.0, -8.0),
        TriggerVolume {
            half_extents: Vec3::new(3.0, 1.0, 2.0),
        },
        ScoreZone::default(),
    ));
    commands.spawn((
        Name::new("KillZone"),
        Transform::from_xyz(0.0, 1.0, -14.0),
        TriggerVolume {
            half_extents: Vec3::new(10.0, 1.0, 1.0),
        },
        KillZone,
    ));

    let player = spawn_player(commands, Vec3::ZERO, &config.player);

    let mug_origin = SpawnOrigin {
        point: "Counter".to_string(),
        position: Vec3::new(0.0, 1.6, -2.0),
        rotation: Quat::IDENTITY,
    };
    spawn_object(
        commands,
        &ObjectSpec::new("Mug0", WeightClass::Light),
        Transform::from_translation(mug_origin.position),
        Some(mug_origin),
        config,
    );
    spawn_object(
        commands,
        &ObjectSpec::new("Crate0", WeightClass::Heavy),
        Transform::from_xyz(0.0, 0.6, -4.0),
        None,
        config,
    );
    spawn_object(
        commands,
        &ObjectSpec::new("Door0", WeightClass::Door),
        Transform::from_xyz(1.5, 1.0, 0.0),
        None,
        config,
    );

    spawn_enemy(commands, Vec3::new(8.0, 0.0, 6.0), &config.enemy);
    player
}

/// Скрипт input: (тик, событие)
fn input_script() -> Vec<(usize, PlayerInputEvent)> {
    vec![
        // Взять кружку, зарядить бросок, бросить в ящик
        (10, PlayerInputEvent::InteractPressed),
        (11, PlayerInputEvent::InteractReleased),
        (40, PlayerInputEvent::ThrowPressed),
        (100, PlayerInputEvent::ThrowReleased),
        // Толкнуть ящик
        (160, PlayerInputEvent::ThrowPressed),
        (161, PlayerInputEvent::ThrowReleased),
        // Поворот направо к двери и открыть её
        (200, PlayerInputEvent::Look(Vec2::new(1.0, 0.0))),
        (245, PlayerInputEvent::Look(Vec2::ZERO)),
        (260, PlayerInputEvent::InteractPressed),
        (400, PlayerInputEvent::InteractReleased),
        // Пройтись и прыгнуть
        (420, PlayerInputEvent::Move(Vec2::new(0.0, 1.0))),
        (480, PlayerInputEvent::Jump),
        (520, PlayerInputEvent::Move(Vec2::ZERO)),
    ]
}

fn report_progress(app: &mut App, tick: usize, player: Entity) {
    let world = app.world_mut();
    let entity_count = world.entities().len();

    let health = world
        .get::<PlayerStats>(player)
        .map(|stats| stats.health.to_string())
        .unwrap_or_else(|| "dead".to_string());

    let mut zones = world.query::<&ScoreZone>();
    let score: i32 = zones.iter(world).map(|zone| zone.total).sum();

    println!(
        "Tick {}: {} entities, player health {}, score {}",
        tick, entity_count, health, score
    );
}

fn main() -> Result<(), ConfigError> {
    init_logger();
    let args = parse_args(std::env::args().skip(1));

    let config = match &args.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    let layout = match &args.layout {
        Some(path) => SpawnLayout::load(path)?,
        None => demo_layout(),
    };

    println!(
        "Starting HEFT headless simulation (seed: {}, backend: {:?})",
        args.seed, args.backend
    );

    let mut app = create_simulation_app(args.seed, config.clone(), args.backend);
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(1.0 / 60.0)))
        .insert_resource(layout);

    let player = spawn_demo_scene(&mut app.world_mut().commands(), &config);
    app.world_mut().flush();

    let script = input_script();

    for tick in 0..TICKS {
        for (_, event) in script.iter().filter(|(at, _)| *at == tick) {
            app.world_mut().send_event(*event);
        }

        app.update();

        if tick % 60 == 0 {
            report_progress(&mut app, tick, player);
        }
    }

    report_progress(&mut app, TICKS, player);
    println!("Simulation complete!");
    Ok(())
}
