use rapier3d::prelude::RigidBodyHandle;

/// Errors that can occur when managing balls in the physics world.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PhysicsError {
    #[error("ball radius must be positive, got {0}")]
    InvalidRadius(f32),

    #[error("no ball registered for body {0:?}")]
    UnknownBall(RigidBodyHandle),
}
