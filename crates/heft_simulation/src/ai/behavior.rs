//! Behavior tree: Sequence/Selector + condition/action листья
//!
//! Композиты реактивные: каждый тик оценка идёт с первого ребёнка, а
//! прерванная running ветка получает `on_end` (abort).
//!
//! Жизненный цикл action:
//! - on_start (первый тик) → если Running, в этом же тике on_update
//! - on_update → Running/Success/Failure
//! - on_end при завершении или abort

use super::components::EnemyContext;

/// Результат тика узла
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Running,
    Success,
    Failure,
}

/// Условие (мгновенная проверка)
pub trait Condition: Send + Sync {
    fn is_true(&self, ctx: &EnemyContext) -> bool;
}

/// Действие с жизненным циклом
pub trait Action: Send + Sync {
    fn on_start(&mut self, _ctx: &mut EnemyContext) -> Status {
        Status::Running
    }

    fn on_update(&mut self, ctx: &mut EnemyContext) -> Status;

    fn on_end(&mut self, _ctx: &mut EnemyContext) {}
}

/// Action + флаг "уже стартовал"
pub struct ActionNode {
    action: Box<dyn Action>,
    started: bool,
}

impl ActionNode {
    fn tick(&mut self, ctx: &mut EnemyContext) -> Status {
        if !self.started {
            self.started = true;
            let status = self.action.on_start(ctx);
            if status != Status::Running {
                self.finish(ctx);
                return status;
            }
        }

        let status = self.action.on_update(ctx);
        if status != Status::Running {
            self.finish(ctx);
        }
        status
    }

    fn finish(&mut self, ctx: &mut EnemyContext) {
        self.started = false;
        self.action.on_end(ctx);
    }

    fn abort(&mut self, ctx: &mut EnemyContext) {
        if self.started {
            self.finish(ctx);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompositeKind {
    Sequence,
    Selector,
}

pub struct Composite {
    kind: CompositeKind,
    children: Vec<Node>,
    running: Option<usize>,
}

impl Composite {
    fn tick(&mut self, ctx: &mut EnemyContext) -> Status {
        // Sequence продолжает на Success, Selector на Failure
        let proceed = match self.kind {
            CompositeKind::Sequence => Status::Success,
            CompositeKind::Selector => Status::Failure,
        };

        for index in 0..self.children.len() {
            let status = self.children[index].tick(ctx);
            if status == proceed {
                continue;
            }

            self.abort_other(index, ctx);
            self.running = (status == Status::Running).then_some(index);
            return status;
        }

        self.abort_other(self.children.len(), ctx);
        self.running = None;
        proceed
    }

    /// Abort ранее running ребёнка, если это не `index`
    fn abort_other(&mut self, index: usize, ctx: &mut EnemyContext) {
        if let Some(previous) = self.running.filter(|previous| *previous != index) {
            self.children[previous].abort(ctx);
        }
    }

    fn abort(&mut self, ctx: &mut EnemyContext) {
        if let Some(previous) = self.running.take() {
            self.children[previous].abort(ctx);
        }
    }
}

/// Узел дерева
pub enum Node {
    Composite(Composite),
    Condition(Box<dyn Condition>),
    Action(ActionNode),
}

impl Node {
    pub fn sequence(children: Vec<Node>) -> Self {
        Node::Composite(Composite {
            kind: CompositeKind::Sequence,
            children,
            running: None,
        })
    }

    pub fn selector(children: Vec<Node>) -> Self {
        Node::Composite(Composite {
            kind: CompositeKind::Selector,
            children,
            running: None,
        })
    }

    pub fn condition(condition: impl Condition + 'static) -> Self {
        Node::Condition(Box::new(condition))
    }

    pub fn action(action: impl Action + 'static) -> Self {
        Node::Action(ActionNode {
            action: Box::new(action),
            started: false,
        })
    }

    pub fn tick(&mut self, ctx: &mut EnemyContext) -> Status {
        match self {
            Node::Composite(composite) => composite.tick(ctx),
            Node::Condition(condition) => {
                if condition.is_true(ctx) {
                    Status::Success
                } else {
                    Status::Failure
                }
            }
            Node::Action(action) => action.tick(ctx),
        }
    }

    /// Прервать running ветку (on_end всем начатым action)
    pub fn abort(&mut self, ctx: &mut EnemyContext) {
        match self {
            Node::Composite(composite) => composite.abort(ctx),
            Node::Condition(_) => {}
            Node::Action(action) => action.abort(ctx),
        }
    }
}
