//! AI domain: враги на behavior tree
//!
//! Архитектура:
//! - behavior: evaluator (Sequence/Selector, condition/action lifecycle)
//! - components: Blackboard, EnemyController (stun), NavAgent, EnemyContext
//! - nodes: LineOfSightCheck, RangeDetector, Stun, Chase, Attack
//!
//! Порядок в FixedUpdate:
//! 1. Control: tick деревьев → steer_nav_agents
//! 2. Resolve: stun_on_impact (удар объектом → is_stunned)

use bevy::prelude::*;
use bevy_rapier3d::prelude::ReadRapierContext;

pub mod behavior;
pub mod components;
pub mod nodes;

#[cfg(test)]
mod behavior_tests;

pub use behavior::{Action, Condition, Node, Status};
pub use components::{
    BehaviorTree, Blackboard, Enemy, EnemyContext, EnemyController, EnemyHit, NavAgent, TargetSnapshot,
};
pub use nodes::{default_enemy_tree, Attack, Chase, IsStunned, LineOfSightCheck, RangeDetector, Stun};

use crate::components::{Interactable, LookState, Player, PlayerStats, ProbeLayer, ProbeVolume, RigidBodyState};
use crate::config::{EnemyConfig, GameConfig};
use crate::physics::{HeadlessQueries, ImpactEvent, PhysicsBackend, PhysicsQueries, RapierQueries};
use crate::player::{damage_player, PlayerDamaged};
use crate::SimulationSet;

/// Spawn врага: ступни в `position`, дерево по умолчанию
pub fn spawn_enemy(commands: &mut Commands, position: Vec3, config: &EnemyConfig) -> Entity {
    commands
        .spawn((
            Name::new("Enemy"),
            Enemy,
            EnemyController::default(),
            Blackboard::from_config(config),
            NavAgent {
                speed: config.move_speed,
                ..default()
            },
            BehaviorTree::new(default_enemy_tree()),
            Transform::from_translation(position),
            RigidBodyState::default(),
            ProbeVolume::cuboid(Vec3::new(0.4, 0.9, 0.4), ProbeLayer::Actor).with_offset(Vec3::Y * 0.9),
        ))
        .id()
}

type Enemies<'w, 's> = Query<
    'w,
    's,
    (
        Entity,
        &'static Transform,
        &'static mut Blackboard,
        Option<&'static mut EnemyController>,
        &'static mut NavAgent,
        &'static mut BehaviorTree,
    ),
    With<Enemy>,
>;

type TargetPlayers<'w, 's> =
    Query<'w, 's, (Entity, &'static Transform, &'static LookState, &'static mut PlayerStats), With<Player>>;

/// Один тик всех деревьев + применение ударов
fn tick_enemies(
    physics: &dyn PhysicsQueries,
    config: &EnemyConfig,
    dt: f32,
    enemies: &mut Enemies,
    players: &mut TargetPlayers,
    damaged: &mut EventWriter<PlayerDamaged>,
) {
    let targets: Vec<TargetSnapshot> = players
        .iter()
        .map(|(entity, transform, look, stats)| TargetSnapshot {
            entity,
            position: transform.translation,
            eye: transform.translation + Vec3::Y * look.eye_height,
            alive: stats.is_alive(),
        })
        .collect();

    let mut hits = Vec::new();

    for (entity, transform, mut blackboard, mut controller, mut agent, mut tree) in enemies.iter_mut() {
        if let Some(controller) = controller.as_deref_mut() {
            controller.tick(dt, &mut *agent);
        }
        blackboard.attack_cooldown = (blackboard.attack_cooldown - dt).max(0.0);

        let mut ctx = EnemyContext {
            entity,
            position: transform.translation,
            eye: nodes::enemy_eye(transform, config.eye_height),
            blackboard: &mut *blackboard,
            controller: controller.as_deref_mut(),
            agent: &mut *agent,
            targets: &targets,
            physics,
            config,
            hits: Vec::new(),
        };
        tree.root.tick(&mut ctx);
        hits.append(&mut ctx.hits);
    }

    for hit in hits {
        let Ok((_, _, _, mut stats)) = players.get_mut(hit.target) else {
            continue;
        };
        if !stats.is_alive() {
            continue;
        }
        damaged.write(damage_player(hit.target, &mut stats, hit.damage, Some(hit.attacker)));
    }
}

/// Система: tick деревьев (headless)
pub fn tick_enemy_trees_headless(
    time: Res<Time<Fixed>>,
    config: Res<GameConfig>,
    queries: Res<HeadlessQueries>,
    mut enemies: Enemies,
    mut players: TargetPlayers,
    mut damaged: EventWriter<PlayerDamaged>,
) {
    tick_enemies(&*queries, &config.enemy, time.delta_secs(), &mut enemies, &mut players, &mut damaged);
}

/// Система: tick деревьев (Rapier)
pub fn tick_enemy_trees_rapier(
    time: Res<Time<Fixed>>,
    config: Res<GameConfig>,
    rapier: ReadRapierContext,
    mut enemies: Enemies,
    mut players: TargetPlayers,
    mut damaged: EventWriter<PlayerDamaged>,
) {
    let Ok(context) = rapier.single() else {
        crate::logger::log_error("Rapier context not found, enemy AI skipped");
        return;
    };
    let queries = RapierQueries::new(context);
    tick_enemies(&queries, &config.enemy, time.delta_secs(), &mut enemies, &mut players, &mut damaged);
}

/// Система: NavAgent → горизонтальная скорость тела
pub fn steer_nav_agents(mut agents: Query<(&NavAgent, &Transform, &mut RigidBodyState), With<Enemy>>) {
    for (agent, transform, mut body) in agents.iter_mut() {
        let velocity = agent.desired_velocity(transform.translation);
        body.velocity.x = velocity.x;
        body.velocity.z = velocity.z;
    }
}

/// Система: интерактивный объект ударил врага быстрее stun_impact_speed → is_stunned
pub fn stun_on_impact(
    config: Res<GameConfig>,
    mut impacts: EventReader<ImpactEvent>,
    mut enemies: Query<&mut Blackboard, With<Enemy>>,
    objects: Query<(), With<Interactable>>,
) {
    for impact in impacts.read() {
        if impact.relative_speed <= config.enemy.stun_impact_speed {
            continue;
        }
        let Some(other) = impact.other else {
            continue;
        };

        let enemy = if enemies.contains(other) && objects.contains(impact.entity) {
            other
        } else if enemies.contains(impact.entity) && objects.contains(other) {
            impact.entity
        } else {
            continue;
        };

        let Ok(mut blackboard) = enemies.get_mut(enemy) else {
            continue;
        };
        if !blackboard.is_stunned {
            blackboard.is_stunned = true;
            crate::logger::log(&format!(
                "Enemy {:?} hit at {:.1} m/s, stunning",
                enemy, impact.relative_speed
            ));
        }
    }
}

/// AI Plugin
///
/// Регистрирует AI системы в FixedUpdate для детерминизма.
pub struct AIPlugin;

impl Plugin for AIPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(FixedUpdate, stun_on_impact.in_set(SimulationSet::Resolve));

        match PhysicsBackend::configured(app) {
            PhysicsBackend::Headless => {
                app.add_systems(
                    FixedUpdate,
                    (tick_enemy_trees_headless, steer_nav_agents)
                        .chain()
                        .in_set(SimulationSet::Control),
                );
            }
            PhysicsBackend::Rapier => {
                app.add_systems(
                    FixedUpdate,
                    (tick_enemy_trees_rapier, steer_nav_agents)
                        .chain()
                        .in_set(SimulationSet::Control),
                );
            }
        }
    }
}
