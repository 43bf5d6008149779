//! Узлы поведения врага
//!
//! Дерево по умолчанию:
//! ```text
//! Selector
//! ├── Sequence: IsStunned → Stun
//! └── Sequence: RangeDetector → LineOfSightCheck → Chase → Attack
//! ```

use bevy::prelude::*;

use super::behavior::{Action, Condition, Node, Status};
use super::components::{EnemyContext, EnemyHit};
use crate::components::ProbeMask;
use crate::physics::ProbeFilter;

/// Blackboard.is_stunned выставлен
pub struct IsStunned;

impl Condition for IsStunned {
    fn is_true(&self, ctx: &EnemyContext) -> bool {
        ctx.blackboard.is_stunned
    }
}

/// Цель в радиусе и между глазами нет геометрии
pub struct LineOfSightCheck;

impl Condition for LineOfSightCheck {
    fn is_true(&self, ctx: &EnemyContext) -> bool {
        let Some(target) = ctx.target() else {
            return false;
        };

        let to_target = target.eye - ctx.eye;
        let distance = to_target.length();
        if distance > ctx.blackboard.detection_range {
            return false;
        }
        if distance <= f32::EPSILON {
            return true;
        }

        let filter = ProbeFilter::new(ProbeMask::ENVIRONMENT);
        ctx.physics
            .ray_cast(ctx.eye, to_target / distance, distance, &filter)
            .is_none()
    }
}

/// Ближайший живой игрок в detection_range → target
pub struct RangeDetector;

impl Action for RangeDetector {
    fn on_update(&mut self, ctx: &mut EnemyContext) -> Status {
        let position = ctx.position;
        let range = ctx.blackboard.detection_range;

        let nearest = ctx
            .targets
            .iter()
            .filter(|target| target.alive)
            .map(|target| (target, target.position.distance(position)))
            .filter(|(_, distance)| *distance <= range)
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(target, _)| *target);

        ctx.blackboard.target = nearest.map(|target| target.entity);
        match nearest {
            Some(target) => {
                ctx.blackboard.last_seen = Some(target.position);
                Status::Success
            }
            None => Status::Failure,
        }
    }
}

/// Оглушение врага на stun_duration
pub struct Stun;

impl Action for Stun {
    fn on_update(&mut self, ctx: &mut EnemyContext) -> Status {
        let Some(controller) = ctx.controller.as_deref_mut() else {
            crate::logger::log_error("Enemy controller not found!");
            return Status::Failure;
        };

        controller.stun(ctx.blackboard.stun_duration, ctx.agent);
        ctx.blackboard.is_stunned = false;
        Status::Success
    }
}

/// Преследование цели до attack_range
pub struct Chase;

impl Action for Chase {
    fn on_update(&mut self, ctx: &mut EnemyContext) -> Status {
        let Some(target) = ctx.target().copied() else {
            return Status::Failure;
        };

        let distance = ctx.distance_to(&target);
        if distance <= ctx.blackboard.attack_range {
            return Status::Success;
        }
        if distance > ctx.blackboard.detection_range {
            return Status::Failure;
        }

        ctx.agent.destination = Some(target.position);
        ctx.blackboard.last_seen = Some(target.position);
        Status::Running
    }

    fn on_end(&mut self, ctx: &mut EnemyContext) {
        ctx.agent.destination = None;
    }
}

/// Удар по цели (attack_damage), не чаще attack_cooldown
pub struct Attack;

impl Action for Attack {
    fn on_start(&mut self, ctx: &mut EnemyContext) -> Status {
        if ctx.blackboard.target.is_none() {
            return Status::Failure;
        }
        Status::Running
    }

    fn on_update(&mut self, ctx: &mut EnemyContext) -> Status {
        let Some(target) = ctx.target().copied() else {
            return Status::Failure;
        };
        if ctx.controller.as_deref().is_some_and(|controller| controller.is_stunned()) {
            return Status::Failure;
        }
        if ctx.distance_to(&target) > ctx.blackboard.attack_range {
            return Status::Failure;
        }
        if ctx.blackboard.attack_cooldown > 0.0 {
            return Status::Running;
        }

        ctx.hits.push(EnemyHit {
            attacker: ctx.entity,
            target: target.entity,
            damage: ctx.config.attack_damage,
        });
        ctx.blackboard.attack_cooldown = ctx.config.attack_cooldown;
        Status::Success
    }
}

/// Дерево врага по умолчанию
pub fn default_enemy_tree() -> Node {
    Node::selector(vec![
        Node::sequence(vec![Node::condition(IsStunned), Node::action(Stun)]),
        Node::sequence(vec![
            Node::action(RangeDetector),
            Node::condition(LineOfSightCheck),
            Node::action(Chase),
            Node::action(Attack),
        ]),
    ])
}

/// Точка глаз врага
pub fn enemy_eye(transform: &Transform, eye_height: f32) -> Vec3 {
    transform.translation + Vec3::Y * eye_height
}
