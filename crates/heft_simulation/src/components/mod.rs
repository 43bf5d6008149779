//! ECS Components, общие для нескольких доменов
//!
//! Организация:
//! - object: весовой класс, Interactable, physics профили
//! - body: состояние rigid body (velocity, mass, kinematic)
//! - door: дверь (hinge motor / manual rotation)
//! - player: player marker, здоровье, look (yaw/pitch)
//! - world: probe volumes, триггеры, spawn origin

pub mod body;
pub mod door;
pub mod object;
pub mod player;
pub mod world;

pub use body::*;
pub use door::*;
pub use object::*;
pub use player::*;
pub use world::*;
