//! The interface the ball controller consumes from a physics backend

use glam::Vec3;

/// How a force passed to [`BallBody::add_force`] is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceMode {
    /// Mass-independent acceleration, integrated over the next step
    Acceleration,
    /// Instant change in momentum, divided by the body's mass
    Impulse,
}

/// Opaque identity of the surface a contact belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SurfaceId(pub u64);

/// One contact between the ball and another collider
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactPoint {
    /// Unit surface normal, pointing away from the touched surface toward the ball
    pub normal: Vec3,
    /// World-space contact position
    pub point: Vec3,
    /// The collider that was touched
    pub surface: SurfaceId,
}

impl ContactPoint {
    pub fn new(normal: Vec3, point: Vec3, surface: SurfaceId) -> Self {
        Self {
            normal,
            point,
            surface,
        }
    }
}

/// A single simulated ball as seen by the controller.
///
/// Implementations wrap a rigid body in some physics backend. Every method is
/// called from inside the fixed-step pass; the controller never holds on to
/// the body between steps.
pub trait BallBody {
    /// Current world-space position of the ball's center
    fn position(&self) -> Vec3;

    /// Current linear velocity
    fn velocity(&self) -> Vec3;

    /// Overwrite the linear velocity
    fn set_velocity(&mut self, velocity: Vec3);

    /// Queue a force for the coming step
    fn add_force(&mut self, force: Vec3, mode: ForceMode);

    /// Every contact currently touching the ball, gathered in one query
    fn contacts(&self) -> Vec<ContactPoint>;

    /// Resize the ball's collider (used by squash-and-stretch)
    fn set_collider_radius(&mut self, radius: f32);

    /// Cast a ray from `origin` and report the first surface hit, if the
    /// backend supports scene queries
    fn probe(&self, _origin: Vec3, _direction: Vec3, _max_distance: f32) -> Option<ContactPoint> {
        None
    }
}
