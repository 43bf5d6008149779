//! Hold point: куда ставить объект в руках
//!
//! 1. Луч взгляда по Environment: нет попадания → origin + forward × max_hold_distance,
//!    попадание → точка перед поверхностью (hit − forward × object_radius).
//!    Поверхность ближе min_hold_distance → hold point невалиден (auto-drop).
//! 2. Луч вниз от текущей позиции объекта: не опускаться ниже floor + object_radius.
//!    Плоскость земли headless мира (ground_height) тоже считается полом.
//! 3. Overlap сферы wall_check_radius со стенами → невалиден.

use bevy::prelude::*;

use crate::components::{ProbeMask, ViewRay};
use crate::config::InteractionConfig;
use crate::physics::{PhysicsQueries, ProbeFilter};

/// Шаг 1: точка удержания по лучу взгляда (None = стена вплотную)
pub fn hold_point<P: PhysicsQueries + ?Sized>(
    physics: &P,
    view: &ViewRay,
    exclude: &[Entity],
    config: &InteractionConfig,
) -> Option<Vec3> {
    let filter = ProbeFilter::new(ProbeMask::ENVIRONMENT).excluding(exclude);

    match physics.ray_cast(view.origin, view.forward, config.max_hold_distance, &filter) {
        None => Some(view.origin + view.forward * config.max_hold_distance),
        Some(hit) if hit.distance < config.min_hold_distance => None,
        Some(hit) => Some(hit.point - view.forward * config.object_radius),
    }
}

/// Шаги 2-3: clamp над полом + проверка стен
///
/// `ground_height`: неявная плоскость пола (headless), у Rapier пол только коллайдеры.
pub fn resolve_hold_target<P: PhysicsQueries + ?Sized>(
    physics: &P,
    view: &ViewRay,
    object_position: Vec3,
    exclude: &[Entity],
    ground_height: Option<f32>,
    config: &InteractionConfig,
) -> Option<Vec3> {
    let mut target = hold_point(physics, view, exclude, config)?;
    let filter = ProbeFilter::new(ProbeMask::ENVIRONMENT).excluding(exclude);

    let floor = physics
        .ray_cast(object_position, Vec3::NEG_Y, config.floor_check_distance, &filter)
        .map(|hit| hit.point.y)
        .into_iter()
        .chain(ground_height)
        .reduce(f32::max);

    if let Some(floor) = floor {
        let min_height = floor + config.object_radius;
        if target.y < min_height {
            target.y = min_height;
        }
    }

    if !physics.overlap_sphere(target, config.wall_check_radius, &filter).is_empty() {
        return None;
    }

    Some(target)
}

/// Rotation объекта в руках: yaw держателя (или лицом к нему) × rotation offset
pub fn held_rotation(holder_yaw: f32, rotation_offset: f32, config: &InteractionConfig) -> Quat {
    let facing = if config.face_holder { holder_yaw + 180.0 } else { holder_yaw };
    Quat::from_rotation_y(facing.to_radians()) * Quat::from_rotation_y(rotation_offset.to_radians())
}
