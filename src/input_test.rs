#![allow(clippy::clone_on_copy, clippy::float_cmp)]

use super::*;

fn shift() -> Modifiers {
    Modifiers { shift: true, ..Default::default() }
}

// =============================================================
// Mode
// =============================================================

#[test]
fn mode_default_is_editing() {
    assert_eq!(Mode::default(), Mode::Editing);
}

#[test]
fn mode_toggles() {
    assert_eq!(Mode::Editing.toggled(), Mode::Running);
    assert_eq!(Mode::Running.toggled(), Mode::Editing);
}

#[test]
fn mode_serializes_lowercase() {
    assert_eq!(serde_json::to_string(&Mode::Running).unwrap(), "\"running\"");
}

// =============================================================
// Modifiers
// =============================================================

#[test]
fn modifiers_default_all_false() {
    let m = Modifiers::default();
    assert!(!m.shift);
    assert!(!m.ctrl);
    assert!(!m.alt);
    assert!(!m.meta);
    assert!(!m.cmd());
}

#[test]
fn cmd_is_ctrl_or_meta() {
    assert!(Modifiers { ctrl: true, ..Default::default() }.cmd());
    assert!(Modifiers { meta: true, ..Default::default() }.cmd());
    assert!(!shift().cmd());
}

#[test]
fn modifier_names_include_side() {
    assert_eq!(modifier_key_names(shift(), KeyLocation::Left), vec!["shift", "shift-left"]);
    assert_eq!(modifier_key_names(shift(), KeyLocation::Right), vec!["shift", "shift-right"]);
    assert_eq!(modifier_key_names(shift(), KeyLocation::Standard), vec!["shift"]);
}

#[test]
fn modifier_names_follow_fixed_order() {
    let all = Modifiers { shift: true, ctrl: true, alt: true, meta: true };
    assert_eq!(modifier_key_names(all, KeyLocation::Standard), vec!["meta", "ctrl", "shift", "alt"]);
    assert!(modifier_key_names(Modifiers::default(), KeyLocation::Left).is_empty());
}

// =============================================================
// PressedKeys
// =============================================================

#[test]
fn pressed_keys_tracks_down_and_up() {
    let keys = PressedKeys::new();
    keys.key_down(&Key::from("a"), Modifiers::default(), KeyLocation::Standard);
    assert!(keys.is_pressed("a"));
    keys.key_up(&Key::from("a"), Modifiers::default(), KeyLocation::Standard);
    assert!(!keys.is_pressed("a"));
}

#[test]
fn pressed_keys_records_modifiers() {
    let keys = PressedKeys::new();
    keys.key_down(&Key::from("Shift"), shift(), KeyLocation::Left);
    assert!(keys.all_pressed(&["Shift", "shift", "shift-left"]));
    assert!(!keys.is_pressed("shift-right"));
}

#[test]
fn all_pressed_requires_every_key() {
    let keys = PressedKeys::new();
    keys.key_down(&Key::from("ArrowUp"), Modifiers::default(), KeyLocation::Standard);
    assert!(keys.all_pressed(&["ArrowUp"]));
    assert!(!keys.all_pressed(&["ArrowUp", "ArrowLeft"]));
    assert!(keys.all_pressed::<&str>(&[]));
}

#[test]
fn pressed_keys_clones_share_state() {
    let keys = PressedKeys::new();
    let view = keys.clone();
    keys.key_down(&Key::from("x"), Modifiers::default(), KeyLocation::Standard);
    assert!(view.is_pressed("x"));
    keys.clear();
    assert!(!view.is_pressed("x"));
}

// =============================================================
// Selection
// =============================================================

#[test]
fn selection_of_empty_is_idle() {
    assert_eq!(Selection::of(vec![]), Selection::Idle);
    assert!(Selection::Idle.is_empty());
}

#[test]
fn selection_single() {
    let a = ObjectId::new_v4();
    let b = ObjectId::new_v4();
    assert_eq!(Selection::of(vec![a]).single(), Some(a));
    assert_eq!(Selection::of(vec![a, b]).single(), None);
    assert!(Selection::of(vec![a, b]).contains(b));
}

// =============================================================
// ResizeHandle
// =============================================================

#[test]
fn handle_anchors_on_corners() {
    let r = Rect::new(0.0, 0.0, 10.0, 20.0);
    assert_eq!(ResizeHandle::TopLeft.anchor(r), Point::new(0.0, 0.0));
    assert_eq!(ResizeHandle::BottomRight.anchor(r), Point::new(10.0, 20.0));
    assert_eq!(ResizeHandle::TopRight.anchor(r), Point::new(10.0, 0.0));
    assert_eq!(ResizeHandle::BottomLeft.anchor(r), Point::new(0.0, 20.0));
}

#[test]
fn handle_hit_rect_is_centered() {
    let r = Rect::new(0.0, 0.0, 10.0, 10.0);
    assert_eq!(ResizeHandle::BottomRight.hit_rect(r, 4.0), Rect::new(8.0, 8.0, 4.0, 4.0));
}

#[test]
fn resize_bottom_right_grows() {
    let start = Rect::new(0.0, 0.0, 10.0, 10.0);
    assert_eq!(ResizeHandle::BottomRight.resize(start, Point::new(5.0, 3.0)), Rect::new(0.0, 0.0, 15.0, 13.0));
}

#[test]
fn resize_top_left_keeps_opposite_corner() {
    let start = Rect::new(10.0, 10.0, 10.0, 10.0);
    let out = ResizeHandle::TopLeft.resize(start, Point::new(-5.0, 2.0));
    assert_eq!(out, Rect::new(5.0, 12.0, 15.0, 8.0));
    assert_eq!(out.right(), start.right());
    assert_eq!(out.bottom(), start.bottom());
}

// =============================================================
// CursorState
// =============================================================

#[test]
fn cursor_default_is_idle() {
    assert!(CursorState::default().is_idle());
}

#[test]
fn cursor_styles() {
    let moving = CursorState::Moving { client_start: Point::default(), targets: vec![] };
    assert_eq!(moving.style(), CursorStyle::Grabbing);
    assert_eq!(CursorState::WillPan.style(), CursorStyle::Grab);
    assert_eq!(CursorState::PlacingText.style(), CursorStyle::Text);
    assert_eq!(CursorState::PlacingBox.style(), CursorStyle::Crosshair);
    assert_eq!(CursorState::Idle.style(), CursorStyle::Unset);
    assert_eq!(CursorStyle::Grabbing.as_css(), "grabbing");
    assert_eq!(CursorStyle::Unset.as_css(), "unset");
}

#[test]
fn marquee_is_normalized() {
    let state = CursorState::Selecting {
        canvas_start: Point::new(30.0, 30.0),
        client_start: Point::default(),
        size: Point::new(-35.0, -35.0),
    };
    assert_eq!(state.marquee(), Some(Rect::new(-5.0, -5.0, 35.0, 35.0)));
    assert_eq!(CursorState::Idle.marquee(), None);
}
