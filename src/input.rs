//! Input model: modes, modifier keys, mouse buttons, the live pressed-key
//! set, the editor selection, and the cursor state machine's states.
//!
//! `CursorState` is the gesture tracked between pointer-down and pointer-up.
//! Each active variant carries what the engine needs to apply incremental
//! moves and to revert cleanly when the gesture is cancelled.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::camera::Point;
use crate::object::ObjectId;
use crate::rect::Rect;

/// Whether the scene is being edited or simulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Editing,
    Running,
}

impl Mode {
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Editing => Self::Running,
            Self::Running => Self::Editing,
        }
    }
}

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    /// The platform command modifier: Ctrl or Meta.
    #[must_use]
    pub fn cmd(self) -> bool {
        self.ctrl || self.meta
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Primary,
    Middle,
    Secondary,
}

/// A keyboard key as reported by the browser (e.g. `"Backspace"`, `"a"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Physical side a key event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyLocation {
    #[default]
    Standard,
    Left,
    Right,
}

/// Names added to the pressed-key set for held modifiers, e.g. `"shift"`
/// and `"shift-left"`.
#[must_use]
pub fn modifier_key_names(modifiers: Modifiers, location: KeyLocation) -> Vec<String> {
    let held = [("meta", modifiers.meta), ("ctrl", modifiers.ctrl), ("shift", modifiers.shift), ("alt", modifiers.alt)];
    let mut names = Vec::new();
    for (name, on) in held {
        if !on {
            continue;
        }
        names.push(name.to_owned());
        match location {
            KeyLocation::Left => names.push(format!("{name}-left")),
            KeyLocation::Right => names.push(format!("{name}-right")),
            KeyLocation::Standard => {}
        }
    }
    names
}

/// Keys currently held down, shared with running scripts.
#[derive(Debug, Clone, Default)]
pub struct PressedKeys(Rc<RefCell<HashSet<String>>>);

impl PressedKeys {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_down(&self, key: &Key, modifiers: Modifiers, location: KeyLocation) {
        let mut set = self.0.borrow_mut();
        set.insert(key.0.clone());
        set.extend(modifier_key_names(modifiers, location));
    }

    pub fn key_up(&self, key: &Key, modifiers: Modifiers, location: KeyLocation) {
        let mut set = self.0.borrow_mut();
        set.remove(&key.0);
        for name in modifier_key_names(modifiers, location) {
            set.remove(&name);
        }
    }

    /// True only when every key in `keys` is held.
    #[must_use]
    pub fn all_pressed<S: AsRef<str>>(&self, keys: &[S]) -> bool {
        let set = self.0.borrow();
        keys.iter().all(|k| set.contains(k.as_ref()))
    }

    #[must_use]
    pub fn is_pressed(&self, key: &str) -> bool {
        self.0.borrow().contains(key)
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

/// Objects selected in the editor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    Idle,
    Objects(Vec<ObjectId>),
}

impl Selection {
    /// Build a selection, collapsing an empty list to `Idle`.
    #[must_use]
    pub fn of(ids: Vec<ObjectId>) -> Self {
        if ids.is_empty() { Self::Idle } else { Self::Objects(ids) }
    }

    #[must_use]
    pub fn ids(&self) -> &[ObjectId] {
        match self {
            Self::Idle => &[],
            Self::Objects(ids) => ids,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids().is_empty()
    }

    #[must_use]
    pub fn single(&self) -> Option<ObjectId> {
        match self.ids() {
            [only] => Some(*only),
            _ => None,
        }
    }

    #[must_use]
    pub fn contains(&self, id: ObjectId) -> bool {
        self.ids().contains(&id)
    }
}

/// Something a move gesture drags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveTarget {
    Object(ObjectId),
    /// The editor's detached viewport camera.
    EditorCamera,
}

/// A move target with its position when the gesture began.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveStart {
    pub target: MoveTarget,
    pub start: Point,
}

/// Corner handle of a selection box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeHandle {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl ResizeHandle {
    pub const ALL: [Self; 4] = [Self::TopLeft, Self::TopRight, Self::BottomLeft, Self::BottomRight];

    /// Corner of `rect` this handle sits on.
    #[must_use]
    pub fn anchor(self, rect: Rect) -> Point {
        let r = rect.normalize();
        match self {
            Self::TopLeft => Point::new(r.x, r.y),
            Self::TopRight => Point::new(r.right(), r.y),
            Self::BottomLeft => Point::new(r.x, r.bottom()),
            Self::BottomRight => Point::new(r.right(), r.bottom()),
        }
    }

    /// Square hit area of this handle, centered on its corner.
    #[must_use]
    pub fn hit_rect(self, rect: Rect, size: f64) -> Rect {
        let c = self.anchor(rect);
        Rect::new(c.x - size / 2.0, c.y - size / 2.0, size, size)
    }

    /// `start` resized by dragging this corner by `delta`.
    #[must_use]
    pub fn resize(self, start: Rect, delta: Point) -> Rect {
        let Rect { x, y, width, height } = start;
        match self {
            Self::TopLeft => Rect::new(x + delta.x, y + delta.y, width - delta.x, height - delta.y),
            Self::TopRight => Rect::new(x, y + delta.y, width + delta.x, height - delta.y),
            Self::BottomLeft => Rect::new(x + delta.x, y, width - delta.x, height + delta.y),
            Self::BottomRight => Rect::new(x, y, width + delta.x, height + delta.y),
        }
    }
}

/// Global cursor style shown for a cursor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorStyle {
    Unset,
    Grab,
    Grabbing,
    Text,
    Crosshair,
}

impl CursorStyle {
    /// CSS `cursor` value.
    #[must_use]
    pub fn as_css(self) -> &'static str {
        match self {
            Self::Unset => "unset",
            Self::Grab => "grab",
            Self::Grabbing => "grabbing",
            Self::Text => "text",
            Self::Crosshair => "crosshair",
        }
    }
}

/// The in-progress pointer gesture.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CursorState {
    /// No gesture in progress.
    #[default]
    Idle,
    /// Dragging one or more objects, or the editor camera.
    Moving {
        /// Client-space pointer position at pointer-down.
        client_start: Point,
        /// Start-position snapshot of every dragged target.
        targets: Vec<MoveStart>,
    },
    /// Dragging a marquee.
    Selecting {
        /// World-space anchor of the marquee.
        canvas_start: Point,
        client_start: Point,
        /// Marquee size in world units. Either component may be negative.
        size: Point,
    },
    /// Resizing a single object by a corner handle.
    Transforming { object: ObjectId, handle: ResizeHandle, client_start: Point, start_rect: Rect },
    /// The text tool is armed; the next canvas press places a text object.
    PlacingText,
    /// The box tool is armed; the next canvas press places a box.
    PlacingBox,
    /// Sticky pan tool: the next canvas press starts dragging the editor camera.
    WillPan,
}

impl CursorState {
    #[must_use]
    pub fn style(&self) -> CursorStyle {
        match self {
            Self::Moving { .. } => CursorStyle::Grabbing,
            Self::WillPan => CursorStyle::Grab,
            Self::PlacingText => CursorStyle::Text,
            Self::PlacingBox => CursorStyle::Crosshair,
            Self::Idle | Self::Selecting { .. } | Self::Transforming { .. } => CursorStyle::Unset,
        }
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// The marquee rect while selecting, normalized.
    #[must_use]
    pub fn marquee(&self) -> Option<Rect> {
        match self {
            Self::Selecting { canvas_start, size, .. } => {
                Some(Rect::new(canvas_start.x, canvas_start.y, size.x, size.y).normalize())
            }
            Self::Idle
            | Self::Moving { .. }
            | Self::Transforming { .. }
            | Self::PlacingText
            | Self::PlacingBox
            | Self::WillPan => None,
        }
    }
}

/// Tools the host toolbar can arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Text,
    Box,
    Pan,
}

/// Canvas placement and live key state the engine reads when translating
/// host events.
#[derive(Debug, Clone)]
pub struct InputContext {
    pub keys: PressedKeys,
    /// Canvas element's top-left corner in client space.
    pub canvas_origin: Point,
    pub dpr: f64,
    pub canvas_width: f64,
    pub canvas_height: f64,
}

impl InputContext {
    #[must_use]
    pub fn new(canvas_width: f64, canvas_height: f64) -> Self {
        Self { keys: PressedKeys::new(), canvas_origin: Point::default(), dpr: 1.0, canvas_width, canvas_height }
    }
}
