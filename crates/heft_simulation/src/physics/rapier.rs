//! Rapier бэкенд (bevy_rapier3d)
//!
//! Источник истины для скорости остаётся `RigidBodyState`:
//! - Update/FixedUpdate (Integrate): RigidBodyState → Velocity/RigidBody/Damping
//! - Rapier step (FixedPostUpdate)
//! - следующий FixedUpdate (Probe): CollisionEvent → наши события, затем Velocity → RigidBodyState
//!
//! Слои: Environment = GROUP_1, Pickup = GROUP_2, Actor = GROUP_3.

use bevy::prelude::*;
use bevy_rapier3d::parry::shape::Ball;
use bevy_rapier3d::prelude::*;
use bevy_rapier3d::rapier::geometry::CollisionEventFlags;

use super::{ImpactEvent, PhysicsQueries, ProbeFilter, ProbeHit, TriggerEvent};
use crate::components::{
    Door, DoorDrive, ProbeLayer, ProbeMask, ProbeShape, ProbeVolume, RigidBodyState,
    TriggerOccupants, TriggerVolume,
};
use crate::config::GameConfig;

fn layer_group(layer: ProbeLayer) -> Group {
    match layer {
        ProbeLayer::Environment => Group::GROUP_1,
        ProbeLayer::Pickup => Group::GROUP_2,
        ProbeLayer::Actor => Group::GROUP_3,
    }
}

fn mask_groups(mask: ProbeMask) -> Group {
    let mut groups = Group::NONE;
    for layer in [ProbeLayer::Environment, ProbeLayer::Pickup, ProbeLayer::Actor] {
        if mask.contains(layer) {
            groups |= layer_group(layer);
        }
    }
    groups
}

fn probe_collider(volume: &ProbeVolume) -> Collider {
    let shape = match volume.shape {
        ProbeShape::Sphere { radius } => Collider::ball(radius),
        ProbeShape::Cuboid { half_extents } => {
            Collider::cuboid(half_extents.x, half_extents.y, half_extents.z)
        }
    };

    if volume.offset == Vec3::ZERO {
        shape
    } else {
        Collider::compound(vec![(volume.offset, Quat::IDENTITY, shape)])
    }
}

/// PhysicsQueries поверх RapierContext (берётся через `ReadRapierContext::single()`)
pub struct RapierQueries<'a> {
    pub context: RapierContext<'a>,
}

impl<'a> RapierQueries<'a> {
    pub fn new(context: RapierContext<'a>) -> Self {
        Self { context }
    }
}

impl PhysicsQueries for RapierQueries<'_> {
    fn ray_cast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: &ProbeFilter,
    ) -> Option<ProbeHit> {
        let dir = direction.normalize_or_zero();
        if dir == Vec3::ZERO {
            return None;
        }

        let exclude = filter.exclude;
        let predicate = |entity: Entity| !exclude.contains(&entity);
        let query_filter = QueryFilter::default()
            .groups(CollisionGroups::new(Group::ALL, mask_groups(filter.mask)))
            .exclude_sensors()
            .predicate(&predicate);

        let (entity, intersection) =
            self.context
                .cast_ray_and_get_normal(origin, dir, max_distance, true, query_filter)?;

        Some(ProbeHit {
            entity,
            point: intersection.point,
            normal: intersection.normal,
            distance: intersection.time_of_impact,
        })
    }

    fn sphere_cast(
        &self,
        origin: Vec3,
        direction: Vec3,
        radius: f32,
        max_distance: f32,
        filter: &ProbeFilter,
    ) -> Option<ProbeHit> {
        let dir = direction.normalize_or_zero();
        if dir == Vec3::ZERO {
            return None;
        }

        let exclude = filter.exclude;
        let predicate = |entity: Entity| !exclude.contains(&entity);
        let query_filter = QueryFilter::default()
            .groups(CollisionGroups::new(Group::ALL, mask_groups(filter.mask)))
            .exclude_sensors()
            .predicate(&predicate);

        let options = ShapeCastOptions {
            max_time_of_impact: max_distance,
            target_distance: 0.0,
            stop_at_penetration: true,
            compute_impact_geometry_on_penetration: true,
        };

        let (entity, hit) = self.context.cast_shape(
            origin,
            Quat::IDENTITY,
            dir,
            &Ball::new(radius),
            options,
            query_filter,
        )?;

        let center = origin + dir * hit.time_of_impact;
        let normal = hit
            .details
            .map(|details| details.normal2)
            .filter(|normal| normal.length_squared() > 0.0)
            .unwrap_or(-dir);

        Some(ProbeHit {
            entity,
            point: center - normal * radius,
            normal,
            distance: hit.time_of_impact,
        })
    }

    fn overlap_sphere(&self, center: Vec3, radius: f32, filter: &ProbeFilter) -> Vec<Entity> {
        let exclude = filter.exclude;
        let predicate = |entity: Entity| !exclude.contains(&entity);
        let query_filter = QueryFilter::default()
            .groups(CollisionGroups::new(Group::ALL, mask_groups(filter.mask)))
            .exclude_sensors()
            .predicate(&predicate);

        let mut hits = Vec::new();
        self.context.intersect_shape(
            center,
            Quat::IDENTITY,
            &Ball::new(radius),
            query_filter,
            |entity| {
                hits.push(entity);
                true
            },
        );

        hits.sort();
        hits.dedup();
        hits
    }
}

/// Система: Rapier компоненты для новых probe volumes
///
/// - есть RigidBodyState → Dynamic (actors с заблокированным вращением)
/// - нет RigidBodyState → Fixed (стены, пол)
/// - hinge дверь → revolute joint к fixed якорю
pub fn attach_rapier_bodies(
    mut commands: Commands,
    config: Res<GameConfig>,
    added: Query<
        (Entity, &Transform, &ProbeVolume, Option<&RigidBodyState>, Option<&Door>),
        Added<ProbeVolume>,
    >,
) {
    for (entity, transform, volume, body, door) in added.iter() {
        let Ok(mut entity_commands) = commands.get_entity(entity) else {
            continue;
        };

        entity_commands.insert((
            probe_collider(volume),
            CollisionGroups::new(layer_group(volume.layer), Group::ALL),
            Friction::coefficient(config.physics.ground_friction),
            Restitution::coefficient(config.physics.restitution),
        ));

        let Some(body) = body else {
            entity_commands.insert(RigidBody::Fixed);
            continue;
        };

        entity_commands.insert((
            RigidBody::Dynamic,
            Velocity {
                linvel: body.velocity,
                angvel: body.angular_velocity,
            },
            Damping {
                linear_damping: body.linear_damping,
                angular_damping: body.angular_damping,
            },
            ColliderMassProperties::Mass(body.mass),
            GravityScale(1.0),
            ActiveEvents::COLLISION_EVENTS,
            Ccd::enabled(),
        ));

        // Игрок и враги не опрокидываются
        if volume.layer == ProbeLayer::Actor {
            entity_commands.insert(LockedAxes::ROTATION_LOCKED);
        }

        if let Some(Door {
            drive: DoorDrive::Hinge(motor),
            max_angle,
            ..
        }) = door
        {
            let anchor = commands
                .spawn((
                    RigidBody::Fixed,
                    Transform::from_translation(transform.translation),
                    GlobalTransform::default(),
                ))
                .id();

            let mut joint = RevoluteJointBuilder::new(Vec3::Y)
                .limits([-max_angle.to_radians(), 0.0])
                .build();
            joint.set_motor_velocity(0.0, motor.max_force.max(1.0));

            commands.entity(entity).insert(ImpulseJoint::new(anchor, joint));
        }
    }
}

/// Система: Sensor + события для trigger volumes
pub fn attach_rapier_triggers(
    mut commands: Commands,
    added: Query<(Entity, &TriggerVolume), Added<TriggerVolume>>,
) {
    for (entity, trigger) in added.iter() {
        let extents = trigger.half_extents;
        commands.entity(entity).insert((
            Collider::cuboid(extents.x, extents.y, extents.z),
            Sensor,
            ActiveEvents::COLLISION_EVENTS,
            ActiveCollisionTypes::all(),
        ));
    }
}

/// Система: RigidBodyState → Rapier компоненты
///
/// Kinematic (в руках / manual дверь) → KinematicPositionBased, позицию ставит контроллер.
/// Hinge дверь всегда Dynamic, её крутит мотор.
pub fn sync_bodies_to_rapier(
    mut bodies: Query<(
        &RigidBodyState,
        &mut RigidBody,
        &mut Velocity,
        &mut Damping,
        &mut GravityScale,
        &mut ColliderMassProperties,
        Option<&Door>,
    )>,
) {
    for (state, mut body, mut velocity, mut damping, mut gravity, mut mass, door) in bodies.iter_mut() {
        let hinged = matches!(door.map(|door| door.drive), Some(DoorDrive::Hinge(_)));
        let target = if state.kinematic && !hinged {
            RigidBody::KinematicPositionBased
        } else {
            RigidBody::Dynamic
        };

        if *body != target {
            *body = target;
        }

        // Скорость hinge двери принадлежит мотору
        if !hinged {
            velocity.linvel = state.velocity;
            velocity.angvel = state.angular_velocity;
        }
        damping.linear_damping = state.linear_damping;
        damping.angular_damping = state.angular_damping;
        gravity.0 = if state.use_gravity { 1.0 } else { 0.0 };

        let desired = ColliderMassProperties::Mass(state.mass);
        if *mass != desired {
            *mass = desired;
        }
    }
}

/// Система: hinge мотор Door → revolute joint motor, угол читаем из Transform
pub fn drive_rapier_hinges(mut doors: Query<(&mut Door, &Transform, &mut ImpulseJoint)>) {
    for (mut door, transform, mut joint) in doors.iter_mut() {
        let DoorDrive::Hinge(motor) = door.drive else {
            continue;
        };

        if let TypedJoint::RevoluteJoint(revolute) = &mut joint.data {
            let velocity = if motor.enabled {
                -motor.target_velocity.to_radians()
            } else {
                0.0
            };
            revolute.set_motor_velocity(velocity, motor.max_force.max(1.0));
        }

        let angle = door.angle_from_rotation(transform.rotation);
        door.angle = angle;
    }
}

/// Система: Velocity (после Rapier step) → RigidBodyState
pub fn read_back_rapier_velocities(mut bodies: Query<(&mut RigidBodyState, &Velocity)>) {
    for (mut state, velocity) in bodies.iter_mut() {
        if state.kinematic {
            continue;
        }
        state.velocity = velocity.linvel;
        state.angular_velocity = velocity.angvel;
    }
}

/// Система: Rapier CollisionEvent → TriggerEvent / ImpactEvent
///
/// Выполняется до read back, поэтому скорость удара берётся до solver'а.
pub fn forward_rapier_collisions(
    mut collisions: EventReader<CollisionEvent>,
    mut triggers: Query<&mut TriggerOccupants, With<TriggerVolume>>,
    bodies: Query<&RigidBodyState>,
    mut trigger_events: EventWriter<TriggerEvent>,
    mut impacts: EventWriter<ImpactEvent>,
) {
    for collision in collisions.read() {
        let (a, b, flags, started) = match *collision {
            CollisionEvent::Started(a, b, flags) => (a, b, flags, true),
            CollisionEvent::Stopped(a, b, flags) => (a, b, flags, false),
        };

        if flags.contains(CollisionEventFlags::SENSOR) {
            let (trigger, other) = if triggers.contains(a) { (a, b) } else { (b, a) };
            let Ok(mut occupants) = triggers.get_mut(trigger) else {
                continue;
            };

            if started {
                if occupants.0.insert(other) {
                    trigger_events.write(TriggerEvent::Entered { trigger, other });
                }
            } else if occupants.0.remove(&other) {
                trigger_events.write(TriggerEvent::Exited { trigger, other });
            }
            continue;
        }

        if !started {
            continue;
        }

        let velocity_of = |entity: Entity| bodies.get(entity).map(|body| body.velocity).unwrap_or(Vec3::ZERO);
        let relative_speed = (velocity_of(a) - velocity_of(b)).length();

        impacts.write(ImpactEvent {
            entity: a,
            other: Some(b),
            relative_speed,
        });
        impacts.write(ImpactEvent {
            entity: b,
            other: Some(a),
            relative_speed,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_groups() {
        assert_eq!(mask_groups(ProbeMask::NONE), Group::NONE);
        assert_eq!(
            mask_groups(ProbeMask::ENVIRONMENT | ProbeMask::ACTOR),
            Group::GROUP_1 | Group::GROUP_3
        );
        assert_eq!(mask_groups(ProbeMask::ALL), Group::GROUP_1 | Group::GROUP_2 | Group::GROUP_3);
    }
}
