//! Headless physics бэкенд (без Rapier)
//!
//! - Запросы: аналитика луч/сфера × сфера/AABB по snapshot'у `ProbeVolume`
//! - Интеграция: gravity + damping + position += velocity * dt, посадка на опору
//! - Триггеры: центр entity внутри AABB триггера, enter/exit через diff
//!
//! Детерминизм: snapshot отсортирован по Entity, обход триггеров через BTreeSet.

use std::collections::BTreeSet;

use bevy::prelude::*;

use super::{ImpactEvent, PhysicsQueries, ProbeFilter, ProbeHit, TriggerEvent};
use crate::components::{
    Door, DoorDrive, Interactable, Player, ProbeLayer, ProbeMask, ProbeShape, ProbeVolume,
    RigidBodyState, TriggerOccupants, TriggerVolume,
};
use crate::config::GameConfig;

const PARALLEL_EPSILON: f32 = 1e-8;
const SUPPORT_MARGIN: f32 = 0.05;

/// Один volume в snapshot'е (мировой центр)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeEntry {
    pub entity: Entity,
    pub center: Vec3,
    pub shape: ProbeShape,
    pub layer: ProbeLayer,
}

/// Snapshot всех probe volumes на момент начала тика
#[derive(Resource, Debug, Clone, Default)]
pub struct HeadlessQueries {
    entries: Vec<ProbeEntry>,
}

impl HeadlessQueries {
    pub fn new(mut entries: Vec<ProbeEntry>) -> Self {
        entries.sort_by_key(|entry| entry.entity);
        Self { entries }
    }

    pub fn entries(&self) -> &[ProbeEntry] {
        &self.entries
    }

    fn candidates<'a>(&'a self, filter: &'a ProbeFilter<'a>) -> impl Iterator<Item = &'a ProbeEntry> + 'a {
        self.entries
            .iter()
            .filter(move |entry| filter.accepts(entry.entity, entry.layer))
    }

    /// Общий путь для ray/sphere cast: луч против формы, раздутой на `inflate`
    fn cast(
        &self,
        origin: Vec3,
        direction: Vec3,
        inflate: f32,
        max_distance: f32,
        filter: &ProbeFilter,
    ) -> Option<ProbeHit> {
        let dir = direction.normalize_or_zero();
        if dir == Vec3::ZERO {
            return None;
        }

        let mut best: Option<ProbeHit> = None;

        for entry in self.candidates(filter) {
            let Some((distance, normal)) = ray_vs_shape(origin, dir, entry, inflate) else {
                continue;
            };

            if distance > max_distance {
                continue;
            }

            if best.map_or(true, |hit| distance < hit.distance) {
                // Точка контакта на поверхности цели (для sphere cast сдвигаем на радиус)
                let point = origin + dir * distance - normal * inflate;
                best = Some(ProbeHit {
                    entity: entry.entity,
                    point,
                    normal,
                    distance,
                });
            }
        }

        best
    }
}

impl PhysicsQueries for HeadlessQueries {
    fn ray_cast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: &ProbeFilter,
    ) -> Option<ProbeHit> {
        self.cast(origin, direction, 0.0, max_distance, filter)
    }

    fn sphere_cast(
        &self,
        origin: Vec3,
        direction: Vec3,
        radius: f32,
        max_distance: f32,
        filter: &ProbeFilter,
    ) -> Option<ProbeHit> {
        self.cast(origin, direction, radius.max(0.0), max_distance, filter)
    }

    fn overlap_sphere(&self, center: Vec3, radius: f32, filter: &ProbeFilter) -> Vec<Entity> {
        self.candidates(filter)
            .filter(|entry| match entry.shape {
                ProbeShape::Sphere { radius: r } => entry.center.distance(center) < r + radius,
                ProbeShape::Cuboid { half_extents } => {
                    let closest = center.clamp(entry.center - half_extents, entry.center + half_extents);
                    closest.distance(center) < radius
                }
            })
            .map(|entry| entry.entity)
            .collect()
    }
}

/// Луч против формы (раздутой на inflate). Возвращает (distance, normal).
fn ray_vs_shape(origin: Vec3, dir: Vec3, entry: &ProbeEntry, inflate: f32) -> Option<(f32, Vec3)> {
    match entry.shape {
        ProbeShape::Sphere { radius } => {
            let distance = ray_vs_sphere(origin, dir, entry.center, radius + inflate)?;
            let normal = (origin + dir * distance - entry.center).normalize_or_zero();
            let normal = if normal == Vec3::ZERO { -dir } else { normal };
            Some((distance, normal))
        }
        ProbeShape::Cuboid { half_extents } => {
            let extents = half_extents + Vec3::splat(inflate);
            ray_vs_aabb(origin, dir, entry.center - extents, entry.center + extents)
        }
    }
}

/// Origin внутри сферы → попадание на distance 0
fn ray_vs_sphere(origin: Vec3, dir: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let m = origin - center;
    let b = m.dot(dir);
    let c = m.length_squared() - radius * radius;

    if c <= 0.0 {
        return Some(0.0);
    }
    if b > 0.0 {
        return None;
    }

    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }

    Some((-b - discriminant.sqrt()).max(0.0))
}

/// Slab test. Origin внутри AABB → попадание на distance 0 с normal = -dir.
fn ray_vs_aabb(origin: Vec3, dir: Vec3, min: Vec3, max: Vec3) -> Option<(f32, Vec3)> {
    let mut t_enter = f32::NEG_INFINITY;
    let mut t_exit = f32::INFINITY;
    let mut normal = Vec3::ZERO;

    for axis in 0..3 {
        let o = origin[axis];
        let d = dir[axis];

        if d.abs() < PARALLEL_EPSILON {
            if o < min[axis] || o > max[axis] {
                return None;
            }
            continue;
        }

        let inv = 1.0 / d;
        let mut t1 = (min[axis] - o) * inv;
        let mut t2 = (max[axis] - o) * inv;
        if t1 > t2 {
            std::mem::swap(&mut t1, &mut t2);
        }

        if t1 > t_enter {
            t_enter = t1;
            let mut axis_normal = Vec3::ZERO;
            axis_normal[axis] = -d.signum();
            normal = axis_normal;
        }
        t_exit = t_exit.min(t2);

        if t_enter > t_exit {
            return None;
        }
    }

    if t_exit < 0.0 {
        return None;
    }
    if t_enter < 0.0 {
        return Some((0.0, -dir));
    }

    Some((t_enter, normal))
}

/// Система: пересобрать snapshot probe volumes
pub fn refresh_probe_snapshot(
    mut snapshot: ResMut<HeadlessQueries>,
    volumes: Query<(Entity, &Transform, &ProbeVolume)>,
) {
    let entries = volumes
        .iter()
        .map(|(entity, transform, volume)| ProbeEntry {
            entity,
            center: transform.translation + volume.offset,
            shape: volume.shape,
            layer: volume.layer,
        })
        .collect();

    *snapshot = HeadlessQueries::new(entries);
}

/// Система: интеграция dynamic тел (headless)
///
/// - gravity если use_gravity
/// - damping: v *= 1 / (1 + dt * damping)
/// - посадка на опору (пол или volume под объектом) → ImpactEvent при заметной скорости
/// - удар Pickup объекта об актора → ImpactEvent { other: Some(actor) } + отскок
pub fn integrate_headless_bodies(
    time: Res<Time<Fixed>>,
    config: Res<GameConfig>,
    queries: Res<HeadlessQueries>,
    mut bodies: Query<(Entity, &mut Transform, &mut RigidBodyState, Option<&ProbeVolume>)>,
    mut impacts: EventWriter<ImpactEvent>,
) {
    let dt = time.delta_secs();
    if dt <= 0.0 {
        return;
    }

    let physics = &config.physics;

    for (entity, mut transform, mut body, volume) in bodies.iter_mut() {
        if body.kinematic {
            continue;
        }

        if body.use_gravity {
            body.velocity.y += physics.gravity * dt;
        }

        let linear_factor = 1.0 / (1.0 + dt * body.linear_damping);
        let angular_factor = 1.0 / (1.0 + dt * body.angular_damping);
        body.velocity *= linear_factor;
        body.angular_velocity *= angular_factor;

        let step = body.velocity * dt;
        transform.translation += step;

        if body.angular_velocity.length_squared() > 0.0 {
            transform.rotate(Quat::from_scaled_axis(body.angular_velocity * dt));
        }

        let exclude = [entity];
        let rest_offset = volume.map(ProbeVolume::rest_offset).unwrap_or(0.0);

        // Опора: пол уровня или верх volume под нами
        let probe_origin = transform.translation + Vec3::Y * step.y.abs();
        let probe_length = rest_offset.max(0.0) + 2.0 * step.y.abs() + SUPPORT_MARGIN;
        let support = queries
            .ray_cast(
                probe_origin,
                Vec3::NEG_Y,
                probe_length,
                &ProbeFilter::new(ProbeMask::ENVIRONMENT | ProbeMask::PICKUP).excluding(&exclude),
            )
            .map(|hit| hit.point.y)
            .unwrap_or(f32::NEG_INFINITY);
        let floor = support.max(physics.ground_height);

        let bottom = transform.translation.y - rest_offset;
        if bottom <= floor && body.velocity.y <= 0.0 {
            let speed = body.velocity.length();
            if speed >= physics.impact_report_speed {
                impacts.write(ImpactEvent {
                    entity,
                    other: None,
                    relative_speed: speed,
                });
            }

            transform.translation.y = floor + rest_offset;
            body.velocity.y = 0.0;
            body.velocity.x *= physics.ground_friction;
            body.velocity.z *= physics.ground_friction;
            body.angular_velocity *= physics.ground_friction;
        }

        // Удар брошенного объекта об актора
        let Some(volume) = volume else {
            continue;
        };
        if volume.layer != ProbeLayer::Pickup {
            continue;
        }

        let speed = body.velocity.length();
        if speed < physics.impact_report_speed {
            continue;
        }

        let hits = queries.overlap_sphere(
            transform.translation + volume.offset,
            volume.shape.half_height(),
            &ProbeFilter::new(ProbeMask::ACTOR).excluding(&exclude),
        );

        if let Some(&actor) = hits.first() {
            impacts.write(ImpactEvent {
                entity,
                other: Some(actor),
                relative_speed: speed,
            });
            body.velocity = -body.velocity * physics.restitution;
        }
    }
}

/// Система: hinge мотор двери (headless): угол += target_velocity * dt
pub fn integrate_headless_hinges(
    time: Res<Time<Fixed>>,
    mut doors: Query<(&mut Door, &mut Transform)>,
) {
    let dt = time.delta_secs();

    for (mut door, mut transform) in doors.iter_mut() {
        let DoorDrive::Hinge(motor) = door.drive else {
            continue;
        };
        if !motor.enabled {
            continue;
        }

        door.advance(motor.target_velocity * dt);
        transform.rotation = door.rotation();
    }
}

/// Система: enter/exit для trigger volumes (headless)
///
/// Кандидаты: интерактивные объекты и игрок.
pub fn detect_trigger_overlaps(
    mut triggers: Query<(Entity, &Transform, &TriggerVolume, &mut TriggerOccupants)>,
    candidates: Query<(Entity, &Transform), Or<(With<Interactable>, With<Player>)>>,
    mut events: EventWriter<TriggerEvent>,
) {
    for (trigger, trigger_transform, volume, mut occupants) in triggers.iter_mut() {
        let inside: BTreeSet<Entity> = candidates
            .iter()
            .filter(|(entity, _)| *entity != trigger)
            .filter(|(_, transform)| volume.contains(trigger_transform.translation, transform.translation))
            .map(|(entity, _)| entity)
            .collect();

        for &other in inside.difference(&occupants.0) {
            events.write(TriggerEvent::Entered { trigger, other });
        }
        for &other in occupants.0.difference(&inside) {
            events.write(TriggerEvent::Exited { trigger, other });
        }

        occupants.0 = inside;
    }
}
