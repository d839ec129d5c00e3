#![allow(clippy::float_cmp)]

use super::*;
use crate::consts::DEFAULT_SCRIPT_MAX_OPERATIONS;
use crate::object::SceneObject;
use crate::rect::Rect;
use crate::scene::Scene;

// =============================================================
// Helpers
// =============================================================

fn runtime() -> Runtime {
    Runtime::new(DEFAULT_SCRIPT_MAX_OPERATIONS)
}

fn frame() -> FrameSize {
    FrameSize { width: 300.0, height: 150.0 }
}

fn add_scripted(scene: &mut Scene, rect: Rect, script: &str) -> ObjectId {
    let mut object = SceneObject::new_box(rect, "green");
    object.script = script.to_owned();
    scene.add(object)
}

fn assert_close(actual: f64, expected: f64) {
    assert!((actual - expected).abs() < 1e-3, "expected {expected}, got {actual}");
}

// =============================================================
// Initialization
// =============================================================

#[test]
fn initialize_run_puts_bodies_back_on_objects() {
    let mut scene = Scene::default();
    let id = add_scripted(&mut scene, Rect::new(4.0, 8.0, 10.0, 10.0), "");
    let body = scene.enable_physics(id).unwrap();
    scene.physics_mut().set_position(body, 100.0, 100.0);
    scene.physics_mut().set_velocity(body, 5.0, 5.0);
    let scene = scene.into_handle();

    runtime().initialize_run(&scene, frame(), &PressedKeys::new());

    let s = scene.borrow();
    assert_eq!(s.physics().position(body), Some(crate::camera::Point::new(4.0, 8.0)));
    assert_eq!(s.physics().velocity(body), Some(crate::camera::Point::new(0.0, 0.0)));
}

#[test]
fn initialize_run_rebuilds_id_index() {
    let mut scene = Scene::default();
    let id = add_scripted(&mut scene, Rect::default(), "");
    scene.get_mut(id).unwrap().id = Some("late".into());
    let scene = scene.into_handle();

    runtime().initialize_run(&scene, frame(), &PressedKeys::new());

    assert_eq!(scene.borrow().find_by_user_id("late"), Some(id));
}

#[test]
fn initialize_run_reports_failures_per_object() {
    let mut scene = Scene::default();
    add_scripted(&mut scene, Rect::default(), "this.x = ;");
    let ok = add_scripted(&mut scene, Rect::default(), "this.x = 9.0;");
    let scene = scene.into_handle();

    let errors = runtime().initialize_run(&scene, frame(), &PressedKeys::new());

    assert_eq!(errors.len(), 1);
    assert_eq!(scene.borrow().get(ok).unwrap().x, 9.0);
}

// =============================================================
// Frames
// =============================================================

#[test]
fn first_frame_uses_nominal_delta() {
    let mut scene = Scene::default();
    let id = add_scripted(&mut scene, Rect::new(0.0, 0.0, 10.0, 10.0), "");
    scene.enable_physics(id).unwrap();
    let scene = scene.into_handle();
    let mut rt = runtime();
    rt.initialize_run(&scene, frame(), &PressedKeys::new());
    scene.borrow_mut().set_body_velocity(id, 60.0, 0.0);

    rt.run_frame(&scene, 5_000.0);

    assert_close(scene.borrow().get(id).unwrap().x, 1.0);
}

#[test]
fn later_frames_use_wall_clock_delta() {
    let mut scene = Scene::default();
    let id = add_scripted(&mut scene, Rect::new(0.0, 0.0, 10.0, 10.0), "");
    scene.enable_physics(id).unwrap();
    let scene = scene.into_handle();
    let mut rt = runtime();
    rt.initialize_run(&scene, frame(), &PressedKeys::new());
    scene.borrow_mut().set_body_velocity(id, 60.0, 0.0);

    rt.run_frame(&scene, 1_000.0);
    rt.run_frame(&scene, 1_500.0);

    assert_close(scene.borrow().get(id).unwrap().x, 31.0);
}

#[test]
fn frame_handlers_see_previous_committed_position() {
    let mut scene = Scene::default();
    let id = add_scripted(&mut scene, Rect::new(0.0, 0.0, 10.0, 10.0), "this.on_frame(|| { this.width = this.x; });");
    scene.enable_physics(id).unwrap();
    let scene = scene.into_handle();
    let mut rt = runtime();
    assert!(rt.initialize_run(&scene, frame(), &PressedKeys::new()).is_empty());
    scene.borrow_mut().set_body_velocity(id, 120.0, 0.0);

    for n in 0..5 {
        let committed = scene.borrow().get(id).unwrap().x;
        rt.run_frame(&scene, f64::from(n) * 16.0);
        let s = scene.borrow();
        let object = s.get(id).unwrap();
        assert_eq!(object.width, committed);
        assert!(object.x > committed);
    }
}

#[test]
fn failing_frame_handler_does_not_stop_others() {
    let mut scene = Scene::default();
    add_scripted(&mut scene, Rect::default(), r#"this.on_frame(|| { throw "bad"; });"#);
    let ok = add_scripted(&mut scene, Rect::default(), "this.on_frame(|| { this.x += 1.0; });");
    let scene = scene.into_handle();
    let mut rt = runtime();
    rt.initialize_run(&scene, frame(), &PressedKeys::new());

    let errors = rt.run_frame(&scene, 0.0);

    assert_eq!(errors.len(), 1);
    assert_eq!(scene.borrow().get(ok).unwrap().x, 1.0);
}

#[test]
fn objects_without_bodies_keep_script_positions() {
    let mut scene = Scene::default();
    let id = add_scripted(&mut scene, Rect::default(), "this.on_frame(|| { this.y += 2.0; });");
    let scene = scene.into_handle();
    let mut rt = runtime();
    rt.initialize_run(&scene, frame(), &PressedKeys::new());

    rt.run_frame(&scene, 0.0);
    rt.run_frame(&scene, 16.0);

    assert_eq!(scene.borrow().get(id).unwrap().y, 4.0);
}

// =============================================================
// Events
// =============================================================

#[test]
fn click_runs_handlers() {
    let mut scene = Scene::default();
    let id = add_scripted(&mut scene, Rect::new(50.0, 0.0, 1.0, 1.0), crate::consts::DEFAULT_SCRIPT);
    let scene = scene.into_handle();
    let mut rt = runtime();
    rt.initialize_run(&scene, frame(), &PressedKeys::new());

    rt.dispatch_click(&scene, id).unwrap();

    assert_eq!(scene.borrow().get(id).unwrap().x, 0.0);
}

#[test]
#[should_panic(expected = "not in the scene")]
fn click_on_foreign_object_panics() {
    let scene = Scene::default().into_handle();
    let _ = runtime().dispatch_click(&scene, ObjectId::new_v4());
}

#[test]
fn keypress_reaches_every_object() {
    let mut scene = Scene::default();
    let script = r#"this.on_keypress(|evt| { if evt.key == "ArrowDown" { this.y += 1.0; } });"#;
    let a = add_scripted(&mut scene, Rect::default(), script);
    let b = add_scripted(&mut scene, Rect::default(), script);
    let scene = scene.into_handle();
    let mut rt = runtime();
    rt.initialize_run(&scene, frame(), &PressedKeys::new());

    assert!(rt.dispatch_keypress_to_all(&scene, "ArrowDown").is_empty());

    let s = scene.borrow();
    assert_eq!(s.get(a).unwrap().y, 1.0);
    assert_eq!(s.get(b).unwrap().y, 1.0);
}
