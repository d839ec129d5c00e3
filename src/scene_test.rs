#![allow(clippy::float_cmp)]

use super::*;

fn make_box(x: f64, y: f64, w: f64, h: f64) -> SceneObject {
    SceneObject::new_box(Rect::new(x, y, w, h), "green")
}

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

// =============================================================
// Membership
// =============================================================

#[test]
fn default_scene_has_canvas_sized_camera() {
    let scene = Scene::default();
    assert!(scene.is_empty());
    assert_eq!(scene.camera.rect(), Rect::new(0.0, 0.0, DEFAULT_CANVAS_WIDTH, DEFAULT_CANVAS_HEIGHT));
}

#[test]
fn add_appends_in_paint_order() {
    let mut scene = Scene::default();
    let a = scene.add(make_box(0.0, 0.0, 1.0, 1.0));
    let b = scene.add(make_box(0.0, 0.0, 1.0, 1.0));
    assert_eq!(scene.ids(), vec![a, b]);
    assert_eq!(scene.len(), 2);
    assert!(scene.contains(a));
}

#[test]
fn remove_returns_object_and_drops_body() {
    let mut scene = Scene::default();
    let a = scene.add(make_box(0.0, 0.0, 4.0, 4.0));
    scene.enable_physics(a).unwrap();
    assert_eq!(scene.physics().body_count(), 1);

    let removed = scene.remove(a).unwrap();
    assert_eq!(removed.uuid(), a);
    assert!(!removed.has_physics());
    assert_eq!(scene.physics().body_count(), 0);
    assert!(scene.remove(a).is_none());
}

#[test]
fn clear_keeps_camera() {
    let mut scene = Scene::new(Rect::new(5.0, 5.0, 10.0, 10.0));
    scene.add(make_box(0.0, 0.0, 1.0, 1.0).with_user_id("a"));
    scene.clear();
    assert!(scene.is_empty());
    assert_eq!(scene.find_by_user_id("a"), None);
    assert_eq!(scene.camera.x, 5.0);
}

// =============================================================
// Hit testing
// =============================================================

#[test]
fn object_at_prefers_topmost() {
    let mut scene = Scene::default();
    let bottom = scene.add(make_box(0.0, 0.0, 20.0, 20.0));
    let top = scene.add(make_box(10.0, 10.0, 20.0, 20.0));
    assert_eq!(scene.object_at(pt(15.0, 15.0)), Some(top));
    assert_eq!(scene.object_at(pt(5.0, 5.0)), Some(bottom));
    assert_eq!(scene.object_at(pt(100.0, 100.0)), None);
}

#[test]
fn object_at_is_inclusive_on_edges() {
    let mut scene = Scene::default();
    let a = scene.add(make_box(0.0, 0.0, 10.0, 10.0));
    assert_eq!(scene.object_at(pt(10.0, 10.0)), Some(a));
}

#[test]
fn object_at_follows_reordering() {
    let mut scene = Scene::default();
    let a = scene.add(make_box(0.0, 0.0, 10.0, 10.0));
    let b = scene.add(make_box(0.0, 0.0, 10.0, 10.0));
    assert_eq!(scene.object_at(pt(1.0, 1.0)), Some(b));
    scene.bring_to_front(a);
    assert_eq!(scene.object_at(pt(1.0, 1.0)), Some(a));
    scene.send_to_back(a);
    assert_eq!(scene.object_at(pt(1.0, 1.0)), Some(b));
}

#[test]
fn objects_inside_marquee_scenario() {
    let mut scene = Scene::default();
    let a = scene.add(make_box(0.0, 0.0, 10.0, 10.0));
    let b = scene.add(make_box(5.0, 5.0, 10.0, 10.0));
    scene.add(make_box(-10.0, -10.0, 5.0, 5.0));
    let marquee = Rect::new(-5.0, -5.0, 35.0, 35.0);
    assert_eq!(scene.objects_inside(marquee), vec![a, b]);
}

#[test]
fn bounds_of_spans_selection() {
    let mut scene = Scene::default();
    let a = scene.add(make_box(0.0, 0.0, 10.0, 10.0));
    let b = scene.add(make_box(20.0, 5.0, 10.0, 10.0));
    assert_eq!(scene.bounds_of(&[a, b]), Some(Rect::new(0.0, 0.0, 30.0, 15.0)));
    assert_eq!(scene.bounds_of(&[]), None);
}

// =============================================================
// User ids
// =============================================================

#[test]
fn find_by_user_id_first_in_order_wins() {
    let mut scene = Scene::default();
    let first = scene.add(make_box(0.0, 0.0, 1.0, 1.0).with_user_id("dup"));
    scene.add(make_box(0.0, 0.0, 1.0, 1.0).with_user_id("dup"));
    assert_eq!(scene.find_by_user_id("dup"), Some(first));
}

#[test]
fn find_by_user_id_survives_direct_write() {
    let mut scene = Scene::default();
    let a = scene.add(make_box(0.0, 0.0, 1.0, 1.0));
    scene.get_mut(a).unwrap().id = Some("late".into());
    assert_eq!(scene.find_by_user_id("late"), Some(a));
}

#[test]
fn set_user_id_unknown_object_errors() {
    let mut scene = Scene::default();
    let ghost = ObjectId::new_v4();
    assert_eq!(scene.set_user_id(ghost, Some("x".into())), Err(SceneError::UnknownObject(ghost)));
}

#[test]
fn rebuild_id_index_after_removal_exposes_duplicate() {
    let mut scene = Scene::default();
    let first = scene.add(make_box(0.0, 0.0, 1.0, 1.0).with_user_id("dup"));
    let second = scene.add(make_box(0.0, 0.0, 1.0, 1.0).with_user_id("dup"));
    scene.remove(first);
    scene.rebuild_id_index();
    assert_eq!(scene.find_by_user_id("dup"), Some(second));
}

// =============================================================
// Physics
// =============================================================

#[test]
fn enable_physics_unknown_object_errors() {
    let mut scene = Scene::default();
    let ghost = ObjectId::new_v4();
    assert_eq!(scene.enable_physics(ghost), Err(SceneError::UnknownObject(ghost)));
}

#[test]
fn enable_physics_is_idempotent() {
    let mut scene = Scene::default();
    let a = scene.add(make_box(0.0, 0.0, 4.0, 4.0));
    let h1 = scene.enable_physics(a).unwrap();
    let h2 = scene.enable_physics(a).unwrap();
    assert_eq!(h1, h2);
    assert_eq!(scene.physics().body_count(), 1);
}

#[test]
fn disable_physics_removes_body() {
    let mut scene = Scene::default();
    let a = scene.add(make_box(0.0, 0.0, 4.0, 4.0));
    scene.enable_physics(a).unwrap();
    assert!(scene.disable_physics(a));
    assert!(!scene.get(a).unwrap().has_physics());
    assert!(!scene.disable_physics(a));
}

#[test]
fn commit_physics_writes_body_position() {
    let mut scene = Scene::default();
    let a = scene.add(make_box(0.0, 0.0, 4.0, 4.0));
    let still = scene.add(make_box(50.0, 50.0, 4.0, 4.0));
    scene.enable_physics(a).unwrap();
    assert!(scene.set_body_velocity(a, 60.0, 0.0));
    assert!(!scene.set_body_velocity(still, 1.0, 1.0));

    scene.step_physics(0.5);
    assert_eq!(scene.get(a).unwrap().x, 0.0);
    scene.commit_physics();

    assert!((scene.get(a).unwrap().x - 30.0).abs() < 1e-3);
    assert_eq!(scene.get(still).unwrap().x, 50.0);
}

#[test]
fn commit_physics_keeps_exact_coordinates_of_resting_bodies() {
    let mut scene = Scene::default();
    let a = scene.add(make_box(0.0, 0.0, 4.0, 4.0));
    scene.enable_physics(a).unwrap();
    scene.proxy(a).unwrap().set_position(0.1, 0.3);
    assert!(scene.set_body_velocity(a, 0.0, 20.0));

    scene.step_physics(0.5);
    scene.commit_physics();

    let object = scene.get(a).unwrap();
    assert_eq!(object.x, 0.1);
    assert!((object.y - 10.3).abs() < 1e-3);
}

#[test]
fn reset_bodies_snaps_to_objects_and_stops() {
    let mut scene = Scene::default();
    let a = scene.add(make_box(0.0, 0.0, 4.0, 4.0));
    let body = scene.enable_physics(a).unwrap();
    scene.set_body_velocity(a, 10.0, 10.0);
    scene.get_mut(a).unwrap().x = 25.0;

    scene.reset_bodies();

    assert_eq!(scene.physics().position(body), Some(pt(25.0, 0.0)));
    assert_eq!(scene.physics().velocity(body), Some(pt(0.0, 0.0)));
}

#[test]
fn reset_sandboxes_discards_handlers() {
    let mut scene = Scene::default();
    let a = scene.add(make_box(0.0, 0.0, 4.0, 4.0));
    let handler = rhai::FnPtr::new("h").unwrap();
    scene.proxy(a).unwrap().on(crate::sandbox::SandboxEvent::Click, handler);
    scene.reset_sandboxes();
    assert_eq!(scene.get(a).unwrap().sandbox().handler_count(), 0);
    assert_eq!(scene.get(a).unwrap().sandbox().object(), a);
}
