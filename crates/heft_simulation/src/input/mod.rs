//! Player input: дискретные события → latched состояние на кадр
//!
//! Внешний слой (клиент, тест, демо скрипт) шлёт `PlayerInputEvent`.
//! PreUpdate складывает их в `PlayerInputState` каждого игрока:
//! - оси (move/look/rotate) держатся до следующего изменения
//! - pressed/released флаги живут ровно один кадр

use bevy::prelude::*;

use crate::components::Player;

/// Input события (single-player: применяются ко всем `Player`)
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub enum PlayerInputEvent {
    /// x = вправо, y = вперёд, [-1, 1]
    Move(Vec2),
    /// x = поворот вправо, y = вверх
    Look(Vec2),
    Jump,
    InteractPressed,
    InteractReleased,
    ThrowPressed,
    ThrowReleased,
    /// Ось вращения объекта в руках
    Rotate(f32),
}

/// Input состояние игрока на текущий кадр
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct PlayerInputState {
    pub move_axis: Vec2,
    pub look_axis: Vec2,
    pub rotate_axis: f32,

    pub jump_pressed: bool,
    pub interact_pressed: bool,
    pub interact_released: bool,
    pub throw_pressed: bool,
    pub throw_released: bool,

    pub interact_held: bool,
    pub throw_held: bool,
}

impl PlayerInputState {
    /// Сбросить одно-кадровые флаги
    pub fn begin_frame(&mut self) {
        self.jump_pressed = false;
        self.interact_pressed = false;
        self.interact_released = false;
        self.throw_pressed = false;
        self.throw_released = false;
    }

    pub fn apply(&mut self, event: PlayerInputEvent) {
        match event {
            PlayerInputEvent::Move(axis) => self.move_axis = axis.clamp_length_max(1.0),
            PlayerInputEvent::Look(axis) => self.look_axis = axis,
            PlayerInputEvent::Rotate(axis) => self.rotate_axis = axis.clamp(-1.0, 1.0),
            PlayerInputEvent::Jump => self.jump_pressed = true,
            PlayerInputEvent::InteractPressed => {
                self.interact_pressed = true;
                self.interact_held = true;
            }
            PlayerInputEvent::InteractReleased => {
                self.interact_released = true;
                self.interact_held = false;
            }
            PlayerInputEvent::ThrowPressed => {
                self.throw_pressed = true;
                self.throw_held = true;
            }
            PlayerInputEvent::ThrowReleased => {
                self.throw_released = true;
                self.throw_held = false;
            }
        }
    }
}

/// Система: latch input событий (PreUpdate)
pub fn latch_player_input(
    mut events: EventReader<PlayerInputEvent>,
    mut players: Query<&mut PlayerInputState, With<Player>>,
) {
    let frame_events: Vec<PlayerInputEvent> = events.read().copied().collect();

    for mut state in players.iter_mut() {
        state.begin_frame();
        for event in &frame_events {
            state.apply(*event);
        }
    }
}

pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<PlayerInputEvent>()
            .add_systems(PreUpdate, latch_player_input);
    }
}
