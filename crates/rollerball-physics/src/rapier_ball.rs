//! A ball rigid body living in the rapier world

use glam::Vec3;
use rapier3d::prelude::*;

use crate::body::{BallBody, ContactPoint, ForceMode, SurfaceId};
use crate::PhysicsWorld;

/// Body and collider handles of one ball
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BallHandle {
    pub body: RigidBodyHandle,
    pub collider: ColliderHandle,
}

/// Ball body configuration
#[derive(Debug, Clone)]
pub struct BallBodyConfig {
    /// Sphere radius (default: 0.5m)
    pub radius: f32,
    /// Mass density of the sphere
    pub density: f32,
    /// Surface friction. Rolling is cosmetic, so the body slides by default.
    pub friction: f32,
    /// Bounciness
    pub restitution: f32,
}

impl Default for BallBodyConfig {
    fn default() -> Self {
        Self {
            radius: 0.5,
            density: 1.0,
            friction: 0.0,
            restitution: 0.0,
        }
    }
}

/// Borrowed view of one ball inside a [`PhysicsWorld`], implementing [`BallBody`]
pub struct RapierBall<'w> {
    world: &'w mut PhysicsWorld,
    handle: BallHandle,
}

impl<'w> RapierBall<'w> {
    pub(crate) fn new(world: &'w mut PhysicsWorld, handle: BallHandle) -> Self {
        Self { world, handle }
    }

    pub fn handle(&self) -> BallHandle {
        self.handle
    }
}

pub(crate) fn surface_id(handle: ColliderHandle) -> SurfaceId {
    let (index, generation) = handle.into_raw_parts();
    SurfaceId(((generation as u64) << 32) | index as u64)
}

pub(crate) fn to_glam(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

pub(crate) fn to_rapier(v: Vec3) -> Vector<Real> {
    vector![v.x, v.y, v.z]
}

impl BallBody for RapierBall<'_> {
    fn position(&self) -> Vec3 {
        self.world
            .get_rigid_body(self.handle.body)
            .map(|body| to_glam(body.translation()))
            .unwrap_or(Vec3::ZERO)
    }

    fn velocity(&self) -> Vec3 {
        self.world
            .get_rigid_body(self.handle.body)
            .map(|body| to_glam(body.linvel()))
            .unwrap_or(Vec3::ZERO)
    }

    fn set_velocity(&mut self, velocity: Vec3) {
        if let Some(body) = self.world.get_rigid_body_mut(self.handle.body) {
            body.set_linvel(to_rapier(velocity), true);
        }
    }

    fn add_force(&mut self, force: Vec3, mode: ForceMode) {
        match mode {
            ForceMode::Acceleration => {
                *self
                    .world
                    .pending_accelerations
                    .entry(self.handle.body)
                    .or_insert(Vec3::ZERO) += force;
            }
            ForceMode::Impulse => {
                if let Some(body) = self.world.get_rigid_body_mut(self.handle.body) {
                    body.apply_impulse(to_rapier(force), true);
                }
            }
        }
    }

    fn contacts(&self) -> Vec<ContactPoint> {
        let own = self.handle.collider;
        let mut contacts = Vec::new();

        for pair in self.world.narrow_phase.contact_pairs_with(own) {
            if !pair.has_any_active_contact {
                continue;
            }

            // Manifold normals point away from collider1
            let ball_is_first = pair.collider1 == own;
            let other = if ball_is_first {
                pair.collider2
            } else {
                pair.collider1
            };

            for manifold in &pair.manifolds {
                let mut normal = to_glam(&manifold.data.normal);
                if ball_is_first {
                    normal = -normal;
                }
                let Some(normal) = normal.try_normalize() else {
                    continue;
                };

                for contact in &manifold.data.solver_contacts {
                    contacts.push(ContactPoint::new(
                        normal,
                        Vec3::new(contact.point.x, contact.point.y, contact.point.z),
                        surface_id(other),
                    ));
                }
            }
        }

        contacts
    }

    fn set_collider_radius(&mut self, radius: f32) {
        let radius = radius.max(rollerball_core::math::MIN_DIVISOR);
        if let Some(collider) = self.world.collider_set.get_mut(self.handle.collider) {
            // set_shape flags the collider for a broad-phase and mass update
            let unchanged = collider
                .shape()
                .as_ball()
                .is_some_and(|ball| (ball.radius - radius).abs() <= f32::EPSILON);
            if !unchanged {
                collider.set_shape(SharedShape::ball(radius));
            }
        }
    }

    fn probe(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<ContactPoint> {
        let direction = direction.try_normalize()?;
        let filter = QueryFilter::default().exclude_rigid_body(self.handle.body);
        self.world
            .raycast_detailed(origin, direction, max_distance, filter)
            .map(|hit| ContactPoint::new(hit.normal, hit.point, surface_id(hit.collider)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn shape_ptr(world: &PhysicsWorld, handle: BallHandle) -> *const () {
        let collider = world.get_collider(handle.collider).unwrap();
        Arc::as_ptr(&collider.shared_shape().0) as *const ()
    }

    #[test]
    fn test_collider_radius_only_rebuilt_on_change() {
        let mut world = PhysicsWorld::new();
        let handle = world
            .spawn_ball(&BallBodyConfig::default(), Vec3::ZERO)
            .unwrap();
        let spawned = shape_ptr(&world, handle);

        world.ball_mut(handle).unwrap().set_collider_radius(0.5);
        assert_eq!(shape_ptr(&world, handle), spawned);

        world.ball_mut(handle).unwrap().set_collider_radius(0.4);
        let resized = shape_ptr(&world, handle);
        assert_ne!(resized, spawned);
        let collider = world.get_collider(handle.collider).unwrap();
        assert_eq!(collider.shape().as_ball().unwrap().radius, 0.4);

        world.ball_mut(handle).unwrap().set_collider_radius(0.4);
        assert_eq!(shape_ptr(&world, handle), resized);
    }
}
