//! Player domain: движение, взгляд, прыжок, здоровье
//!
//! - look (Update, до контроллеров): yaw/pitch из look axis
//! - movement (FixedUpdate): горизонтальная скорость от move axis
//! - jump (Update): импульс вверх, только на земле (луч вниз)
//! - урон: PlayerDamaged → при health <= 0 PlayerDied + despawn

use std::collections::BTreeSet;

use bevy::prelude::*;
use bevy_rapier3d::prelude::ReadRapierContext;

use crate::components::{
    LookState, Player, PlayerStats, ProbeLayer, ProbeMask, ProbeVolume, RigidBodyState,
};
use crate::config::{GameConfig, PlayerConfig};
use crate::input::PlayerInputState;
use crate::physics::{HeadlessQueries, PhysicsBackend, PhysicsQueries, ProbeFilter, RapierQueries};
use crate::SimulationSet;

/// Подъём origin луча над ступнями (луч не стартует внутри пола)
const GROUND_PROBE_LIFT: f32 = 0.05;

/// Игроку нанесён урон
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerDamaged {
    pub player: Entity,
    pub source: Option<Entity>,
    pub amount: i32,
    pub remaining: i32,
}

/// Игрок умер (entity будет despawned)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerDied {
    pub player: Entity,
}

/// Spawn игрока: ступни в `position`, коробка 0.8 × 1.8 × 0.8
pub fn spawn_player(commands: &mut Commands, position: Vec3, config: &PlayerConfig) -> Entity {
    commands
        .spawn((
            Name::new("Player"),
            Player,
            Transform::from_translation(position),
            LookState {
                eye_height: config.eye_height,
                ..default()
            },
            PlayerStats {
                health: config.health,
            },
            RigidBodyState {
                mass: config.mass,
                ..default()
            },
            ProbeVolume::cuboid(Vec3::new(0.4, 0.9, 0.4), ProbeLayer::Actor).with_offset(Vec3::Y * 0.9),
        ))
        .id()
}

/// Нанести урон игроку: обновляет PlayerStats, логирует, возвращает событие
pub fn damage_player(player: Entity, stats: &mut PlayerStats, amount: i32, source: Option<Entity>) -> PlayerDamaged {
    stats.take_damage(amount);
    crate::logger::log_info(&format!("Health: {}", stats.health));

    PlayerDamaged {
        player,
        source,
        amount,
        remaining: stats.health,
    }
}

/// Горизонтальная скорость из move axis (y = вперёд) в мире, по yaw тела
pub fn movement_velocity(look: &LookState, move_axis: Vec2, move_speed: f32) -> Vec3 {
    let local = Vec3::new(move_axis.x, 0.0, -move_axis.y);
    look.body_rotation() * local * move_speed
}

/// Луч вниз от ступней (ground_check_distance)
pub fn is_grounded<P: PhysicsQueries + ?Sized>(physics: &P, player: Entity, feet: Vec3, distance: f32) -> bool {
    let exclude = [player];
    let filter = ProbeFilter::new(ProbeMask::ENVIRONMENT | ProbeMask::PICKUP).excluding(&exclude);

    physics
        .ray_cast(feet + Vec3::Y * GROUND_PROBE_LIFT, Vec3::NEG_Y, distance + GROUND_PROBE_LIFT, &filter)
        .is_some()
}

/// Система: look input → yaw/pitch, yaw поворачивает тело
pub fn apply_player_look(
    time: Res<Time>,
    config: Res<GameConfig>,
    mut players: Query<(&PlayerInputState, &mut LookState, &mut Transform), With<Player>>,
) {
    let dt = time.delta_secs();

    for (input, mut look, mut transform) in players.iter_mut() {
        if input.look_axis == Vec2::ZERO {
            continue;
        }
        look.apply_look(input.look_axis, config.player.look_speed, config.player.look_limit, dt);
        transform.rotation = look.body_rotation();
    }
}

/// Система: move input → горизонтальная скорость (вертикальную не трогаем)
pub fn apply_player_movement(
    config: Res<GameConfig>,
    mut players: Query<(&PlayerInputState, &LookState, &mut RigidBodyState), With<Player>>,
) {
    for (input, look, mut body) in players.iter_mut() {
        let velocity = movement_velocity(look, input.move_axis, config.player.move_speed);
        body.velocity.x = velocity.x;
        body.velocity.z = velocity.z;
    }
}

type JumpingPlayers<'w, 's> =
    Query<'w, 's, (Entity, &'static PlayerInputState, &'static Transform, &'static mut RigidBodyState), With<Player>>;

fn apply_jumps<P: PhysicsQueries + ?Sized>(
    physics: &P,
    config: &PlayerConfig,
    ground_height: Option<f32>,
    players: &mut JumpingPlayers,
) {
    for (entity, input, transform, mut body) in players.iter_mut() {
        if !input.jump_pressed {
            continue;
        }

        let feet = transform.translation;
        let on_plane = ground_height.is_some_and(|height| feet.y - height <= config.ground_check_distance);
        if !on_plane && !is_grounded(physics, entity, feet, config.ground_check_distance) {
            continue;
        }

        body.velocity.y = body.velocity.y.max(0.0);
        body.apply_impulse(Vec3::Y * config.jump_force);
    }
}

/// Система: прыжок (headless; пол уровня тоже считается землёй)
pub fn apply_player_jump_headless(
    config: Res<GameConfig>,
    queries: Res<HeadlessQueries>,
    mut players: JumpingPlayers,
) {
    apply_jumps(&*queries, &config.player, Some(config.physics.ground_height), &mut players);
}

/// Система: прыжок (Rapier)
pub fn apply_player_jump_rapier(config: Res<GameConfig>, rapier: ReadRapierContext, mut players: JumpingPlayers) {
    let Ok(context) = rapier.single() else {
        crate::logger::log_error("Rapier context not found, jump skipped");
        return;
    };
    apply_jumps(&RapierQueries::new(context), &config.player, None, &mut players);
}

/// Система: смерть игрока (health <= 0 → PlayerDied + despawn)
pub fn resolve_player_deaths(
    mut commands: Commands,
    mut damaged: EventReader<PlayerDamaged>,
    players: Query<&PlayerStats, With<Player>>,
    mut died: EventWriter<PlayerDied>,
) {
    let mut dead = BTreeSet::new();

    for event in damaged.read() {
        let Ok(stats) = players.get(event.player) else {
            continue;
        };
        if stats.is_alive() || !dead.insert(event.player) {
            continue;
        }

        died.write(PlayerDied { player: event.player });
        commands.entity(event.player).despawn();
        crate::logger::log_info(&format!("Player {:?} died", event.player));
    }
}

/// Player Plugin
pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<PlayerDamaged>()
            .add_event::<PlayerDied>()
            .add_systems(Update, apply_player_look.before(SimulationSet::Control))
            .add_systems(
                FixedUpdate,
                (
                    apply_player_movement.in_set(SimulationSet::Control),
                    resolve_player_deaths.in_set(SimulationSet::Resolve),
                ),
            );

        match PhysicsBackend::configured(app) {
            PhysicsBackend::Headless => {
                app.add_systems(Update, apply_player_jump_headless.in_set(SimulationSet::Control));
            }
            PhysicsBackend::Rapier => {
                app.add_systems(Update, apply_player_jump_rapier.in_set(SimulationSet::Control));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::ProbeShape;
    use crate::physics::ProbeEntry;

    #[test]
    fn test_forward_move_follows_yaw() {
        let mut look = LookState::default();
        let forward = movement_velocity(&look, Vec2::new(0.0, 1.0), 5.0);
        assert!((forward - Vec3::new(0.0, 0.0, -5.0)).length() < 1e-5);

        // Поворот направо на 90°: вперёд становится +X
        look.apply_look(Vec2::new(1.0, 0.0), 90.0, 80.0, 1.0);
        let turned = movement_velocity(&look, Vec2::new(0.0, 1.0), 5.0);
        assert!((turned - Vec3::new(5.0, 0.0, 0.0)).length() < 1e-4, "turned = {:?}", turned);
    }

    #[test]
    fn test_grounded_on_floor_volume() {
        let floor = ProbeEntry {
            entity: Entity::from_raw(5),
            center: Vec3::new(0.0, -0.5, 0.0),
            shape: ProbeShape::Cuboid {
                half_extents: Vec3::new(10.0, 0.5, 10.0),
            },
            layer: ProbeLayer::Environment,
        };
        let physics = HeadlessQueries::new(vec![floor]);
        let player = Entity::from_raw(1);

        assert!(is_grounded(&physics, player, Vec3::ZERO, 0.4));
        assert!(is_grounded(&physics, player, Vec3::Y * 0.3, 0.4));
        assert!(!is_grounded(&physics, player, Vec3::Y * 1.0, 0.4));
    }

    #[test]
    fn test_damage_player_reports_remaining() {
        let mut stats = PlayerStats::default();
        let event = damage_player(Entity::from_raw(1), &mut stats, 35, None);

        assert_eq!(event.amount, 35);
        assert_eq!(event.remaining, 65);
        assert_eq!(stats.health, 65);
    }
}
