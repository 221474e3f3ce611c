use glam::{Quat, Vec3};
use rollerball_physics::{BallBody, BallBodyConfig, ForceMode, PhysicsWorld};

const GRAVITY: Vec3 = Vec3::new(0.0, -9.81, 0.0);

fn drop_ball(world: &mut PhysicsWorld, position: Vec3, steps: usize) -> rollerball_physics::BallHandle {
    let handle = world
        .spawn_ball(&BallBodyConfig::default(), position)
        .unwrap();
    for _ in 0..steps {
        world
            .ball_mut(handle)
            .unwrap()
            .add_force(GRAVITY, ForceMode::Acceleration);
        world.step();
    }
    handle
}

#[test]
fn resting_ball_reports_upward_ground_normal() {
    let mut world = PhysicsWorld::new();
    world.create_ground(0.0);
    let handle = drop_ball(&mut world, Vec3::new(0.0, 1.0, 0.0), 120);

    let ball = world.ball_mut(handle).unwrap();
    let contacts = ball.contacts();
    assert!(!contacts.is_empty(), "ball should be touching the ground");
    for contact in &contacts {
        assert!(contact.normal.y > 0.99, "normal {:?}", contact.normal);
        assert!((contact.normal.length() - 1.0).abs() < 1e-4);
    }
    assert!(ball.position().y > 0.4);
}

#[test]
fn airborne_ball_has_no_contacts() {
    let mut world = PhysicsWorld::new();
    world.create_ground(0.0);
    let handle = world
        .spawn_ball(&BallBodyConfig::default(), Vec3::new(0.0, 5.0, 0.0))
        .unwrap();
    world.step();

    assert!(world.ball_mut(handle).unwrap().contacts().is_empty());
}

#[test]
fn ramp_contact_is_tilted() {
    let mut world = PhysicsWorld::new();
    let tilt = Quat::from_rotation_x(30f32.to_radians());
    world.create_static_box(Vec3::new(5.0, 0.5, 5.0), Vec3::ZERO, tilt);
    let handle = drop_ball(&mut world, Vec3::new(0.0, 1.5, 0.0), 30);

    let contacts = world.ball_mut(handle).unwrap().contacts();
    let expected = tilt * Vec3::Y;
    assert!(
        contacts.iter().any(|c| c.normal.dot(expected) > 0.99),
        "contacts {contacts:?}"
    );
}

#[test]
fn probe_finds_ground_below() {
    let mut world = PhysicsWorld::new();
    world.create_ground(0.0);
    let handle = world
        .spawn_ball(&BallBodyConfig::default(), Vec3::new(0.0, 2.0, 0.0))
        .unwrap();
    world.step();

    let ball = world.ball_mut(handle).unwrap();
    let hit = ball
        .probe(ball.position(), Vec3::NEG_Y, 5.0)
        .expect("probe should hit the ground");
    assert!(hit.normal.y > 0.99);
    assert!(hit.point.y.abs() < 1e-3);
}
