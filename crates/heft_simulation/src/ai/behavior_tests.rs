//! Tests for behavior tree evaluator и узлов врага.

use bevy::prelude::*;

use super::behavior::{Condition, Node, Status};
use super::components::{Blackboard, EnemyContext, EnemyController, EnemyHit, NavAgent, TargetSnapshot};
use super::nodes::{default_enemy_tree, Attack, Chase, IsStunned, LineOfSightCheck, RangeDetector, Stun};
use crate::components::{ProbeLayer, ProbeShape};
use crate::config::EnemyConfig;
use crate::physics::{HeadlessQueries, ProbeEntry};

const ENEMY: Entity = Entity::PLACEHOLDER;

struct Flag(bool);

impl Condition for Flag {
    fn is_true(&self, _ctx: &EnemyContext) -> bool {
        self.0
    }
}

/// Враг в начале координат, глаза на 1.5
struct Fixture {
    blackboard: Blackboard,
    controller: Option<EnemyController>,
    agent: NavAgent,
    targets: Vec<TargetSnapshot>,
    physics: HeadlessQueries,
    config: EnemyConfig,
}

impl Fixture {
    fn new() -> Self {
        let config = EnemyConfig::default();
        Self {
            blackboard: Blackboard::from_config(&config),
            controller: Some(EnemyController::default()),
            agent: NavAgent::default(),
            targets: Vec::new(),
            physics: HeadlessQueries::new(Vec::new()),
            config,
        }
    }

    fn with_player(mut self, index: u32, position: Vec3) -> Self {
        self.targets.push(TargetSnapshot {
            entity: Entity::from_raw(index),
            position,
            eye: position + Vec3::Y * 1.5,
            alive: true,
        });
        self
    }

    fn move_player(&mut self, position: Vec3) {
        self.targets[0].position = position;
        self.targets[0].eye = position + Vec3::Y * 1.5;
    }

    fn tick(&mut self, node: &mut Node) -> (Status, Vec<EnemyHit>) {
        let mut ctx = EnemyContext {
            entity: ENEMY,
            position: Vec3::ZERO,
            eye: Vec3::Y * 1.5,
            blackboard: &mut self.blackboard,
            controller: self.controller.as_mut(),
            agent: &mut self.agent,
            targets: &self.targets,
            physics: &self.physics,
            config: &self.config,
            hits: Vec::new(),
        };
        let status = node.tick(&mut ctx);
        (status, ctx.hits)
    }
}

#[test]
fn test_sequence_and_selector_semantics() {
    let mut fixture = Fixture::new();

    let mut sequence = Node::sequence(vec![Node::condition(Flag(true)), Node::condition(Flag(false))]);
    assert_eq!(fixture.tick(&mut sequence).0, Status::Failure);

    let mut selector = Node::selector(vec![Node::condition(Flag(false)), Node::condition(Flag(true))]);
    assert_eq!(fixture.tick(&mut selector).0, Status::Success);

    let mut empty = Node::sequence(Vec::new());
    assert_eq!(fixture.tick(&mut empty).0, Status::Success);
}

#[test]
fn test_range_detector_picks_nearest_alive() {
    let mut fixture = Fixture::new()
        .with_player(1, Vec3::new(0.0, 0.0, -3.0))
        .with_player(2, Vec3::new(5.0, 0.0, 0.0))
        .with_player(3, Vec3::new(0.0, 0.0, 8.0));
    fixture.targets[0].alive = false;

    let mut node = Node::action(RangeDetector);
    assert_eq!(fixture.tick(&mut node).0, Status::Success);
    assert_eq!(fixture.blackboard.target, Some(Entity::from_raw(2)));
    assert_eq!(fixture.blackboard.last_seen, Some(Vec3::new(5.0, 0.0, 0.0)));
}

#[test]
fn test_range_detector_fails_out_of_range() {
    let mut fixture = Fixture::new().with_player(1, Vec3::new(0.0, 0.0, -30.0));
    fixture.blackboard.target = Some(Entity::from_raw(1));

    let mut node = Node::action(RangeDetector);
    assert_eq!(fixture.tick(&mut node).0, Status::Failure);
    assert_eq!(fixture.blackboard.target, None);
}

#[test]
fn test_line_of_sight_blocked_by_wall() {
    let mut fixture = Fixture::new().with_player(1, Vec3::new(0.0, 0.0, -5.0));
    fixture.blackboard.target = Some(Entity::from_raw(1));

    let mut node = Node::condition(LineOfSightCheck);
    assert_eq!(fixture.tick(&mut node).0, Status::Success);

    fixture.physics = HeadlessQueries::new(vec![ProbeEntry {
        entity: Entity::from_raw(50),
        center: Vec3::new(0.0, 1.0, -2.5),
        shape: ProbeShape::Cuboid {
            half_extents: Vec3::new(2.0, 2.0, 0.1),
        },
        layer: ProbeLayer::Environment,
    }]);
    assert_eq!(fixture.tick(&mut node).0, Status::Failure);
}

#[test]
fn test_line_of_sight_without_target() {
    let mut fixture = Fixture::new();
    let mut node = Node::condition(LineOfSightCheck);
    assert_eq!(fixture.tick(&mut node).0, Status::Failure);
}

#[test]
fn test_stun_without_controller_fails() {
    let mut fixture = Fixture::new();
    fixture.controller = None;
    fixture.blackboard.is_stunned = true;

    let mut node = Node::action(Stun);
    assert_eq!(fixture.tick(&mut node).0, Status::Failure);
    assert!(fixture.blackboard.is_stunned);
}

#[test]
fn test_stun_stops_agent_and_clears_flag() {
    let mut fixture = Fixture::new();
    fixture.blackboard.is_stunned = true;

    let mut tree = Node::sequence(vec![Node::condition(IsStunned), Node::action(Stun)]);
    assert_eq!(fixture.tick(&mut tree).0, Status::Success);

    assert!(!fixture.blackboard.is_stunned);
    assert!(fixture.agent.is_stopped);
    assert_eq!(fixture.controller.as_ref().and_then(|c| c.stun_remaining), Some(3.0));
}

#[test]
fn test_stun_timer_recovers_agent() {
    let mut controller = EnemyController::default();
    let mut agent = NavAgent::default();

    controller.stun(2.0, &mut agent);
    assert!(agent.is_stopped);

    assert!(!controller.tick(1.0, &mut agent));
    assert!(controller.is_stunned());
    assert!(controller.tick(1.0, &mut agent));
    assert!(!controller.is_stunned());
    assert!(!agent.is_stopped);
}

#[test]
fn test_restun_keeps_longer_duration() {
    let mut controller = EnemyController::default();
    let mut agent = NavAgent::default();

    controller.stun(3.0, &mut agent);
    controller.stun(1.0, &mut agent);
    assert_eq!(controller.stun_remaining, Some(3.0));
}

#[test]
fn test_attack_respects_cooldown() {
    let mut fixture = Fixture::new().with_player(1, Vec3::new(0.0, 0.0, -1.0));
    fixture.blackboard.target = Some(Entity::from_raw(1));

    let mut node = Node::action(Attack);
    let (status, hits) = fixture.tick(&mut node);
    assert_eq!(status, Status::Success);
    assert_eq!(
        hits,
        vec![EnemyHit {
            attacker: ENEMY,
            target: Entity::from_raw(1),
            damage: 35,
        }]
    );
    assert_eq!(fixture.blackboard.attack_cooldown, 1.5);

    let (status, hits) = fixture.tick(&mut node);
    assert_eq!(status, Status::Running);
    assert!(hits.is_empty());

    fixture.blackboard.attack_cooldown = 0.0;
    let (status, hits) = fixture.tick(&mut node);
    assert_eq!(status, Status::Success);
    assert_eq!(hits.len(), 1);
}

#[test]
fn test_attack_without_target_fails() {
    let mut fixture = Fixture::new();
    let mut node = Node::action(Attack);
    let (status, hits) = fixture.tick(&mut node);
    assert_eq!(status, Status::Failure);
    assert!(hits.is_empty());
}

#[test]
fn test_default_tree_chases_then_attacks() {
    let mut fixture = Fixture::new().with_player(1, Vec3::new(0.0, 0.0, -5.0));
    let mut tree = default_enemy_tree();

    let (status, hits) = fixture.tick(&mut tree);
    assert_eq!(status, Status::Running);
    assert!(hits.is_empty());
    assert_eq!(fixture.agent.destination, Some(Vec3::new(0.0, 0.0, -5.0)));

    fixture.move_player(Vec3::new(0.0, 0.0, -1.0));
    let (status, hits) = fixture.tick(&mut tree);
    assert_eq!(status, Status::Success);
    assert_eq!(hits.len(), 1);
    assert_eq!(fixture.agent.destination, None);
}

#[test]
fn test_stun_interrupts_running_chase() {
    let mut fixture = Fixture::new().with_player(1, Vec3::new(0.0, 0.0, -5.0));
    let mut tree = Node::selector(vec![
        Node::sequence(vec![Node::condition(IsStunned), Node::action(Stun)]),
        Node::sequence(vec![Node::action(RangeDetector), Node::action(Chase)]),
    ]);

    assert_eq!(fixture.tick(&mut tree).0, Status::Running);
    assert!(fixture.agent.destination.is_some());

    // Удар объектом: следующий тик уходит в stun ветку, chase прерван
    fixture.blackboard.is_stunned = true;
    assert_eq!(fixture.tick(&mut tree).0, Status::Success);
    assert_eq!(fixture.agent.destination, None);
    assert!(fixture.agent.is_stopped);
}

#[test]
fn test_nav_agent_steering() {
    let mut agent = NavAgent {
        destination: Some(Vec3::new(3.0, 5.0, 4.0)),
        speed: 2.0,
        is_stopped: false,
    };

    let velocity = agent.desired_velocity(Vec3::ZERO);
    assert!((velocity - Vec3::new(1.2, 0.0, 1.6)).length() < 1e-5);

    agent.is_stopped = true;
    assert_eq!(agent.desired_velocity(Vec3::ZERO), Vec3::ZERO);

    agent.is_stopped = false;
    assert_eq!(agent.desired_velocity(Vec3::new(3.0, 0.0, 3.95)), Vec3::ZERO);
}
