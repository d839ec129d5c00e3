#![allow(clippy::float_cmp)]

use super::*;

const EPSILON: f64 = 1e-3;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

// =============================================================
// Bodies
// =============================================================

#[test]
fn new_world_is_empty() {
    assert_eq!(PhysicsWorld::new().body_count(), 0);
}

#[test]
fn add_box_body_starts_at_top_left() {
    let mut world = PhysicsWorld::new();
    let h = world.add_box_body(10.0, 20.0, 32.0, 32.0);
    assert!(world.contains(h));
    assert_eq!(world.position(h), Some(Point::new(10.0, 20.0)));
    assert_eq!(world.body_count(), 1);
}

#[test]
fn remove_body_drops_it() {
    let mut world = PhysicsWorld::new();
    let h = world.add_box_body(0.0, 0.0, 0.0, 0.0);
    assert!(world.remove_body(h));
    assert!(!world.contains(h));
    assert_eq!(world.position(h), None);
    assert!(!world.remove_body(h));
}

#[test]
fn set_position_teleports() {
    let mut world = PhysicsWorld::new();
    let h = world.add_box_body(0.0, 0.0, 8.0, 8.0);
    assert!(world.set_position(h, 50.0, -4.0));
    assert_eq!(world.position(h), Some(Point::new(50.0, -4.0)));
}

#[test]
fn unknown_handle_is_rejected() {
    let mut world = PhysicsWorld::new();
    let h = world.add_box_body(0.0, 0.0, 8.0, 8.0);
    world.remove_body(h);
    assert!(!world.set_position(h, 1.0, 1.0));
    assert!(!world.set_velocity(h, 1.0, 1.0));
    assert_eq!(world.velocity(h), None);
}

// =============================================================
// Stepping
// =============================================================

#[test]
fn zero_gravity_body_stays_put() {
    let mut world = PhysicsWorld::new();
    let h = world.add_box_body(5.0, 5.0, 10.0, 10.0);
    for _ in 0..10 {
        world.step(1.0 / 60.0);
    }
    let p = world.position(h).unwrap();
    assert!(approx_eq(p.x, 5.0));
    assert!(approx_eq(p.y, 5.0));
}

#[test]
fn velocity_integrates_over_delta() {
    let mut world = PhysicsWorld::new();
    let h = world.add_box_body(0.0, 0.0, 10.0, 10.0);
    world.set_velocity(h, 60.0, 0.0);
    world.step(0.5);
    let p = world.position(h).unwrap();
    assert!(approx_eq(p.x, 30.0), "x was {}", p.x);
    assert!(approx_eq(p.y, 0.0));
}

#[test]
fn non_positive_delta_is_ignored() {
    let mut world = PhysicsWorld::new();
    let h = world.add_box_body(0.0, 0.0, 10.0, 10.0);
    world.set_velocity(h, 60.0, 0.0);
    world.step(0.0);
    world.step(-1.0);
    world.step(f64::NAN);
    assert_eq!(world.position(h), Some(Point::new(0.0, 0.0)));
}

#[test]
fn body_precision_matches_stored_position() {
    let mut world = PhysicsWorld::new();
    let h = world.add_box_body(0.1, 0.0, 8.0, 8.0);
    let stored = world.position(h).unwrap().x;
    assert_ne!(stored, 0.1);
    assert_eq!(stored, body_precision(0.1));
}
