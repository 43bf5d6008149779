//! AI компоненты: blackboard, controller (stun), nav agent, дерево

use bevy::prelude::*;

use super::behavior::Node;
use crate::components::RigidBodyState;
use crate::config::EnemyConfig;
use crate::physics::PhysicsQueries;

/// Маркер врага
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
#[require(Blackboard, NavAgent, RigidBodyState)]
pub struct Enemy;

/// Типизированный blackboard врага
#[derive(Component, Debug, Clone, PartialEq, Reflect)]
#[reflect(Component)]
pub struct Blackboard {
    pub target: Option<Entity>,
    /// Выставляется ударом объекта, сбрасывается Stun узлом
    pub is_stunned: bool,
    pub stun_duration: f32,
    pub detection_range: f32,
    pub attack_range: f32,
    pub last_seen: Option<Vec3>,
    /// Сколько секунд до следующей атаки
    pub attack_cooldown: f32,
}

impl Default for Blackboard {
    fn default() -> Self {
        Self::from_config(&EnemyConfig::default())
    }
}

impl Blackboard {
    pub fn from_config(config: &EnemyConfig) -> Self {
        Self {
            target: None,
            is_stunned: false,
            stun_duration: config.stun_duration,
            detection_range: config.detection_range,
            attack_range: config.attack_range,
            last_seen: None,
            attack_cooldown: 0.0,
        }
    }
}

/// Навигация: движение к destination (без pathfinding)
#[derive(Component, Debug, Clone, PartialEq, Reflect)]
#[reflect(Component)]
pub struct NavAgent {
    pub destination: Option<Vec3>,
    pub speed: f32,
    pub is_stopped: bool,
}

impl Default for NavAgent {
    fn default() -> Self {
        Self {
            destination: None,
            speed: EnemyConfig::default().move_speed,
            is_stopped: false,
        }
    }
}

impl NavAgent {
    /// Ближе этого к destination агент стоит
    pub const STOPPING_DISTANCE: f32 = 0.1;

    /// Горизонтальная скорость к destination (ноль если остановлен/пришёл)
    pub fn desired_velocity(&self, position: Vec3) -> Vec3 {
        if self.is_stopped {
            return Vec3::ZERO;
        }
        let Some(destination) = self.destination else {
            return Vec3::ZERO;
        };

        let mut to_target = destination - position;
        to_target.y = 0.0;
        if to_target.length() <= Self::STOPPING_DISTANCE {
            return Vec3::ZERO;
        }
        to_target.normalize_or_zero() * self.speed
    }
}

/// Контроллер врага: оглушение с таймером восстановления
#[derive(Component, Debug, Clone, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct EnemyController {
    /// Сколько осталось до восстановления (None = не оглушён)
    pub stun_remaining: Option<f32>,
}

impl EnemyController {
    /// Остановить агента на `duration` секунд (повторный stun продлевает до большего)
    pub fn stun(&mut self, duration: f32, agent: &mut NavAgent) {
        crate::logger::log(&format!("has been stunned for {} seconds!", duration));
        agent.is_stopped = true;

        let remaining = self.stun_remaining.map_or(duration, |left| left.max(duration));
        self.stun_remaining = Some(remaining);
    }

    pub fn is_stunned(&self) -> bool {
        self.stun_remaining.is_some()
    }

    /// Продвинуть таймер; true в тике восстановления
    pub fn tick(&mut self, dt: f32, agent: &mut NavAgent) -> bool {
        let Some(remaining) = self.stun_remaining.as_mut() else {
            return false;
        };

        *remaining -= dt;
        if *remaining > 0.0 {
            return false;
        }

        self.stun_remaining = None;
        agent.is_stopped = false;
        crate::logger::log("AI has recovered from stun.");
        true
    }
}

/// Дерево поведения врага
#[derive(Component)]
pub struct BehaviorTree {
    pub root: Node,
}

impl BehaviorTree {
    pub fn new(root: Node) -> Self {
        Self { root }
    }
}

/// Потенциальная цель (снимок игрока на тик)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetSnapshot {
    pub entity: Entity,
    pub position: Vec3,
    pub eye: Vec3,
    pub alive: bool,
}

/// Удар врага по цели (применяется системой после тика дерева)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnemyHit {
    pub attacker: Entity,
    pub target: Entity,
    pub damage: i32,
}

/// Всё, что видят узлы дерева во время тика
pub struct EnemyContext<'a> {
    pub entity: Entity,
    pub position: Vec3,
    pub eye: Vec3,
    pub blackboard: &'a mut Blackboard,
    pub controller: Option<&'a mut EnemyController>,
    pub agent: &'a mut NavAgent,
    pub targets: &'a [TargetSnapshot],
    pub physics: &'a dyn PhysicsQueries,
    pub config: &'a EnemyConfig,
    pub hits: Vec<EnemyHit>,
}

impl EnemyContext<'_> {
    pub fn target(&self) -> Option<&TargetSnapshot> {
        let target = self.blackboard.target?;
        self.targets.iter().find(|snapshot| snapshot.entity == target && snapshot.alive)
    }

    /// Горизонтальная дистанция до цели
    pub fn distance_to(&self, target: &TargetSnapshot) -> f32 {
        let mut delta = target.position - self.position;
        delta.y = 0.0;
        delta.length()
    }
}
