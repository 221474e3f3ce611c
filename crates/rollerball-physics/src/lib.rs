//! RollerBall Physics - Physics world adapter using rapier3d
//!
//! Provides the [`BallBody`] interface the controller consumes, a rapier3d
//! backed world hosting balls and static level geometry, and an in-memory
//! body for headless tests.

mod body;
mod error;
mod memory;
mod rapier_ball;

pub use body::{BallBody, ContactPoint, ForceMode, SurfaceId};
pub use error::PhysicsError;
pub use memory::MemoryBody;
pub use rapier_ball::{BallBodyConfig, BallHandle, RapierBall};

use std::collections::HashMap;

use glam::{Quat, Vec3};
use nalgebra::Unit;
use rapier3d::prelude::*;
use tracing::debug;

use rapier_ball::{to_glam, to_rapier};

/// Physics world configuration
#[derive(Debug, Clone)]
pub struct PhysicsConfig {
    /// Gravity vector for bodies other than balls (default: -9.81 on Y axis)
    pub gravity: Vec3,
    /// Physics timestep (default: 1/50)
    pub timestep: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            timestep: 1.0 / 50.0,
        }
    }
}

/// The main physics world containing all simulation state
pub struct PhysicsWorld {
    /// Configuration
    pub config: PhysicsConfig,

    /// Rigid body storage
    pub rigid_body_set: RigidBodySet,
    /// Collider storage
    pub collider_set: ColliderSet,
    /// Impulse joint storage
    pub impulse_joint_set: ImpulseJointSet,
    /// Multi-body joint storage
    pub multibody_joint_set: MultibodyJointSet,

    /// Integration parameters
    integration_parameters: IntegrationParameters,
    /// Physics pipeline
    physics_pipeline: PhysicsPipeline,
    /// Island manager
    island_manager: IslandManager,
    /// Broad phase collision detection
    broad_phase: DefaultBroadPhase,
    /// Narrow phase collision detection
    pub(crate) narrow_phase: NarrowPhase,
    /// Continuous collision detection solver
    ccd_solver: CCDSolver,
    /// Query pipeline for raycasts and shape casts
    query_pipeline: QueryPipeline,

    /// Mass-independent accelerations queued by ball controllers
    pub(crate) pending_accelerations: HashMap<RigidBodyHandle, Vec3>,
}

impl PhysicsWorld {
    /// Create a new physics world with default configuration
    pub fn new() -> Self {
        Self::with_config(PhysicsConfig::default())
    }

    /// Create a new physics world with custom configuration
    pub fn with_config(config: PhysicsConfig) -> Self {
        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = config.timestep;

        Self {
            config,
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            pending_accelerations: HashMap::new(),
        }
    }

    /// Fixed step duration in seconds
    pub fn timestep(&self) -> f32 {
        self.config.timestep
    }

    /// Step the physics simulation
    pub fn step(&mut self) {
        let dt = self.config.timestep;
        for (handle, acceleration) in self.pending_accelerations.drain() {
            if let Some(body) = self.rigid_body_set.get_mut(handle) {
                let velocity = *body.linvel() + to_rapier(acceleration * dt);
                body.set_linvel(velocity, true);
            }
        }

        let gravity = to_rapier(self.config.gravity);

        self.physics_pipeline.step(
            &gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );

        // Update query pipeline after physics step
        self.query_pipeline.update(&self.collider_set);
    }

    /// Spawn a ball. Balls ignore world gravity: their controller applies its
    /// own effective gravity every step.
    pub fn spawn_ball(
        &mut self,
        config: &BallBodyConfig,
        position: Vec3,
    ) -> Result<BallHandle, PhysicsError> {
        if config.radius.is_nan() || config.radius <= 0.0 {
            return Err(PhysicsError::InvalidRadius(config.radius));
        }

        let rigid_body = RigidBodyBuilder::dynamic()
            .translation(to_rapier(position))
            .gravity_scale(0.0)
            .linear_damping(0.0)
            .angular_damping(0.0)
            .lock_rotations()
            .can_sleep(false)
            .ccd_enabled(true)
            .build();
        let collider = ColliderBuilder::ball(config.radius)
            .density(config.density)
            .friction(config.friction)
            .restitution(config.restitution)
            .build();

        let (body, collider) = self.add_dynamic_body(rigid_body, collider);
        debug!(?body, ?position, radius = config.radius, "spawned ball");
        Ok(BallHandle { body, collider })
    }

    /// Borrow a ball as a [`BallBody`] for one controller update
    pub fn ball_mut(&mut self, handle: BallHandle) -> Result<RapierBall<'_>, PhysicsError> {
        if self.rigid_body_set.get(handle.body).is_none() {
            return Err(PhysicsError::UnknownBall(handle.body));
        }
        Ok(RapierBall::new(self, handle))
    }

    /// Remove a ball and forget anything queued for it
    pub fn despawn_ball(&mut self, handle: BallHandle) {
        self.pending_accelerations.remove(&handle.body);
        self.remove_rigid_body(handle.body);
    }

    /// Add a static collider (ground, walls, etc.)
    pub fn add_static_collider(&mut self, collider: Collider) -> ColliderHandle {
        self.collider_set.insert(collider)
    }

    /// Add a dynamic rigid body with a collider
    pub fn add_dynamic_body(
        &mut self,
        rigid_body: RigidBody,
        collider: Collider,
    ) -> (RigidBodyHandle, ColliderHandle) {
        let rb_handle = self.rigid_body_set.insert(rigid_body);
        let col_handle =
            self.collider_set
                .insert_with_parent(collider, rb_handle, &mut self.rigid_body_set);
        (rb_handle, col_handle)
    }

    /// Remove a rigid body and its colliders
    pub fn remove_rigid_body(&mut self, handle: RigidBodyHandle) {
        self.rigid_body_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
    }

    /// Get a rigid body by handle
    pub fn get_rigid_body(&self, handle: RigidBodyHandle) -> Option<&RigidBody> {
        self.rigid_body_set.get(handle)
    }

    /// Get a mutable rigid body by handle
    pub fn get_rigid_body_mut(&mut self, handle: RigidBodyHandle) -> Option<&mut RigidBody> {
        self.rigid_body_set.get_mut(handle)
    }

    /// Get a collider by handle
    pub fn get_collider(&self, handle: ColliderHandle) -> Option<&Collider> {
        self.collider_set.get(handle)
    }

    /// Cast a ray and get detailed hit information
    pub fn raycast_detailed(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: QueryFilter,
    ) -> Option<RaycastHit> {
        let ray = Ray::new(
            point![origin.x, origin.y, origin.z],
            to_rapier(direction),
        );

        self.query_pipeline
            .cast_ray_and_get_normal(
                &self.rigid_body_set,
                &self.collider_set,
                &ray,
                max_distance,
                true,
                filter,
            )
            .map(|(handle, intersection)| RaycastHit {
                collider: handle,
                distance: intersection.time_of_impact,
                point: origin + direction * intersection.time_of_impact,
                normal: to_glam(&intersection.normal),
            })
    }

    /// Create a ground plane collider
    pub fn create_ground(&mut self, y: f32) -> ColliderHandle {
        let normal = Unit::new_normalize(vector![0.0, 1.0, 0.0]);
        let ground = ColliderBuilder::halfspace(normal)
            .translation(vector![0.0, y, 0.0])
            .friction(0.0)
            .restitution(0.0)
            .build();
        self.add_static_collider(ground)
    }

    /// Create a static box collider
    pub fn create_static_box(
        &mut self,
        half_extents: Vec3,
        position: Vec3,
        rotation: Quat,
    ) -> ColliderHandle {
        let (axis, angle) = rotation.to_axis_angle();
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .translation(to_rapier(position))
            .rotation(to_rapier(axis * angle))
            .friction(0.0)
            .build();
        self.add_static_collider(collider)
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Detailed raycast hit information
#[derive(Debug, Clone)]
pub struct RaycastHit {
    /// The collider that was hit
    pub collider: ColliderHandle,
    /// Distance along the ray to the hit point
    pub distance: f32,
    /// World-space hit point
    pub point: Vec3,
    /// Surface normal at hit point
    pub normal: Vec3,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_physics_world_creation() {
        let world = PhysicsWorld::new();
        assert_eq!(world.config.gravity, Vec3::new(0.0, -9.81, 0.0));
    }

    #[test]
    fn test_ground_creation() {
        let mut world = PhysicsWorld::new();
        let ground = world.create_ground(0.0);
        assert!(world.get_collider(ground).is_some());
    }

    #[test]
    fn test_raycast() {
        let mut world = PhysicsWorld::new();
        world.create_ground(0.0);
        world.query_pipeline.update(&world.collider_set);

        let hit = world.raycast_detailed(
            Vec3::new(0.0, 10.0, 0.0),
            Vec3::new(0.0, -1.0, 0.0),
            100.0,
            QueryFilter::default(),
        );
        let hit = hit.expect("ray should hit the ground");
        assert!((hit.distance - 10.0).abs() < 1e-3);
        assert!(hit.normal.y > 0.99);
    }

    #[test]
    fn test_spawn_ball_rejects_bad_radius() {
        let mut world = PhysicsWorld::new();
        let config = BallBodyConfig {
            radius: 0.0,
            ..Default::default()
        };
        assert_eq!(
            world.spawn_ball(&config, Vec3::ZERO),
            Err(PhysicsError::InvalidRadius(0.0))
        );
    }

    #[test]
    fn test_acceleration_applied_on_step() {
        let mut world = PhysicsWorld::new();
        let handle = world
            .spawn_ball(&BallBodyConfig::default(), Vec3::new(0.0, 10.0, 0.0))
            .unwrap();
        world
            .ball_mut(handle)
            .unwrap()
            .add_force(Vec3::new(0.0, -10.0, 0.0), ForceMode::Acceleration);
        world.step();

        let velocity = world.ball_mut(handle).unwrap().velocity();
        assert!((velocity.y + 10.0 * world.timestep()).abs() < 1e-4);
    }

    #[test]
    fn test_ball_ignores_world_gravity() {
        let mut world = PhysicsWorld::new();
        let handle = world
            .spawn_ball(&BallBodyConfig::default(), Vec3::new(0.0, 10.0, 0.0))
            .unwrap();
        for _ in 0..10 {
            world.step();
        }
        let velocity = world.ball_mut(handle).unwrap().velocity();
        assert!(velocity.length() < 1e-6);
    }

    #[test]
    fn test_despawned_ball_is_unknown() {
        let mut world = PhysicsWorld::new();
        let handle = world
            .spawn_ball(&BallBodyConfig::default(), Vec3::ZERO)
            .unwrap();
        world.despawn_ball(handle);
        assert!(matches!(
            world.ball_mut(handle),
            Err(PhysicsError::UnknownBall(_))
        ));
    }
}
