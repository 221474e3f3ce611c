//! In-memory ball body
//!
//! A backend-free [`BallBody`] whose contacts are scripted by the caller.
//! Used for deterministic replays and for exercising the controller without
//! a collision pipeline.

use glam::Vec3;

use crate::body::{BallBody, ContactPoint, ForceMode};

/// A point-mass ball with caller-supplied contacts
#[derive(Debug, Clone)]
pub struct MemoryBody {
    /// Center position
    pub position: Vec3,
    /// Linear velocity
    pub velocity: Vec3,
    /// Mass used for impulses
    pub mass: f32,
    /// Collider radius as last set by the controller
    pub radius: f32,
    /// Contacts reported on the next query
    pub contacts: Vec<ContactPoint>,
    /// Hit reported by [`BallBody::probe`]
    pub probe_hit: Option<ContactPoint>,
    /// Acceleration queued for the next step
    pending_acceleration: Vec3,
}

impl MemoryBody {
    /// Create a body at rest at `position`
    pub fn new(position: Vec3, radius: f32) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            mass: 1.0,
            radius,
            contacts: Vec::new(),
            probe_hit: None,
            pending_acceleration: Vec3::ZERO,
        }
    }

    /// Replace the reported contacts with a single ground contact below the ball
    pub fn touch(&mut self, normal: Vec3) {
        let normal = normal.normalize_or_zero();
        self.contacts = vec![ContactPoint::new(
            normal,
            self.position - normal * self.radius,
            Default::default(),
        )];
    }

    /// Drop every contact
    pub fn lift(&mut self) {
        self.contacts.clear();
    }

    /// Acceleration that will be integrated on the next step
    pub fn pending_acceleration(&self) -> Vec3 {
        self.pending_acceleration
    }

    /// Integrate queued accelerations and advance the position
    pub fn step(&mut self, dt: f32) {
        self.velocity += self.pending_acceleration * dt;
        self.pending_acceleration = Vec3::ZERO;
        self.position += self.velocity * dt;
    }
}

impl BallBody for MemoryBody {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    fn add_force(&mut self, force: Vec3, mode: ForceMode) {
        match mode {
            ForceMode::Acceleration => self.pending_acceleration += force,
            ForceMode::Impulse => self.velocity += force / self.mass.max(f32::EPSILON),
        }
    }

    fn contacts(&self) -> Vec<ContactPoint> {
        self.contacts.clone()
    }

    fn set_collider_radius(&mut self, radius: f32) {
        self.radius = radius;
    }

    fn probe(&self, _origin: Vec3, _direction: Vec3, _max_distance: f32) -> Option<ContactPoint> {
        self.probe_hit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acceleration_integrates_on_step() {
        let mut body = MemoryBody::new(Vec3::ZERO, 0.5);
        body.add_force(Vec3::new(0.0, -10.0, 0.0), ForceMode::Acceleration);
        assert_eq!(body.velocity, Vec3::ZERO);

        body.step(0.1);
        assert!((body.velocity.y + 1.0).abs() < 1e-6);
        assert_eq!(body.pending_acceleration(), Vec3::ZERO);
    }

    #[test]
    fn test_impulse_is_immediate() {
        let mut body = MemoryBody::new(Vec3::ZERO, 0.5);
        body.mass = 2.0;
        body.add_force(Vec3::new(4.0, 0.0, 0.0), ForceMode::Impulse);
        assert_eq!(body.velocity, Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_touch_places_contact_below() {
        let mut body = MemoryBody::new(Vec3::new(0.0, 1.0, 0.0), 0.5);
        body.touch(Vec3::Y);
        let contacts = body.contacts();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].point, Vec3::new(0.0, 0.5, 0.0));
    }
}
