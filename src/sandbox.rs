//! Per-object scripting sandbox and the accessor façade scripts write through.
//!
//! Each [`SceneObject`] owns one [`Sandbox`]: the compiled program plus the
//! click, frame and keypress handlers its script registered. Handlers are
//! appended in registration order and never removed; the whole sandbox is
//! replaced on run entry.
//!
//! [`ObjectProxy`] is the only way script-driven code mutates an object.
//! Writing `x` or `y` through it also repositions the attached physics body,
//! so the simulator and the logical object never drift apart while a body
//! is attached. Plain field writes on [`SceneObject`] leave the body alone.

#[cfg(test)]
#[path = "sandbox_test.rs"]
mod sandbox_test;

use std::rc::Rc;

use rhai::{AST, FnPtr};

use crate::object::{ObjectId, SceneObject};
use crate::physics::PhysicsWorld;
use crate::rect::{Direction, Rect, cardinal_direction, rect_center, rect_overlap, vector_from_a_to_b};
use crate::scene::IdIndex;

/// Which handler list an event goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SandboxEvent {
    Click,
    Frame,
    Keypress,
}

impl SandboxEvent {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::Frame => "frame",
            Self::Keypress => "keypress",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Sandbox {
    object: ObjectId,
    program: Option<Rc<AST>>,
    click_handlers: Vec<FnPtr>,
    frame_handlers: Vec<FnPtr>,
    keypress_handlers: Vec<FnPtr>,
}

impl Sandbox {
    #[must_use]
    pub fn new(object: ObjectId) -> Self {
        Self { object, program: None, click_handlers: Vec::new(), frame_handlers: Vec::new(), keypress_handlers: Vec::new() }
    }

    /// The object this sandbox belongs to.
    #[must_use]
    pub fn object(&self) -> ObjectId {
        self.object
    }

    #[must_use]
    pub fn program(&self) -> Option<Rc<AST>> {
        self.program.clone()
    }

    pub(crate) fn install_program(&mut self, program: Rc<AST>) {
        self.program = Some(program);
    }

    pub fn push_handler(&mut self, event: SandboxEvent, handler: FnPtr) {
        self.handlers_mut(event).push(handler);
    }

    #[must_use]
    pub fn handlers(&self, event: SandboxEvent) -> &[FnPtr] {
        match event {
            SandboxEvent::Click => &self.click_handlers,
            SandboxEvent::Frame => &self.frame_handlers,
            SandboxEvent::Keypress => &self.keypress_handlers,
        }
    }

    fn handlers_mut(&mut self, event: SandboxEvent) -> &mut Vec<FnPtr> {
        match event {
            SandboxEvent::Click => &mut self.click_handlers,
            SandboxEvent::Frame => &mut self.frame_handlers,
            SandboxEvent::Keypress => &mut self.keypress_handlers,
        }
    }

    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.click_handlers.len() + self.frame_handlers.len() + self.keypress_handlers.len()
    }
}

/// Mutable view of one object that keeps its physics body and the scene's
/// user-id index consistent.
pub struct ObjectProxy<'a> {
    object: &'a mut SceneObject,
    physics: &'a mut PhysicsWorld,
    ids: &'a mut IdIndex,
}

impl<'a> ObjectProxy<'a> {
    pub(crate) fn new(object: &'a mut SceneObject, physics: &'a mut PhysicsWorld, ids: &'a mut IdIndex) -> Self {
        Self { object, physics, ids }
    }

    #[must_use]
    pub fn object_id(&self) -> ObjectId {
        self.object.uuid()
    }

    #[must_use]
    pub fn x(&self) -> f64 {
        self.object.x
    }

    pub fn set_x(&mut self, x: f64) {
        self.object.x = x;
        self.sync_body();
    }

    #[must_use]
    pub fn y(&self) -> f64 {
        self.object.y
    }

    pub fn set_y(&mut self, y: f64) {
        self.object.y = y;
        self.sync_body();
    }

    /// Set both coordinates with a single body reposition.
    pub fn set_position(&mut self, x: f64, y: f64) {
        self.object.x = x;
        self.object.y = y;
        self.sync_body();
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.object.width
    }

    pub fn set_width(&mut self, width: f64) {
        self.object.width = width;
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.object.height
    }

    pub fn set_height(&mut self, height: f64) {
        self.object.height = height;
    }

    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.object.id.as_deref()
    }

    pub fn set_id(&mut self, id: Option<String>) {
        let uuid = self.object.uuid();
        if let Some(old) = self.object.id.take() {
            self.ids.release(&old, uuid);
        }
        if let Some(new) = &id {
            self.ids.claim(new, uuid);
        }
        self.object.id = id;
    }

    #[must_use]
    pub fn rect(&self) -> Rect {
        self.object.rect()
    }

    #[must_use]
    pub fn is_colliding(&self, other: Rect) -> bool {
        rect_overlap(self.rect(), other)
    }

    /// Angle in degrees from this object's center to `other`'s center.
    ///
    /// Screen space: +y points down, so an object above gives a negative angle.
    #[must_use]
    pub fn angle_to_object(&self, other: Rect) -> f64 {
        vector_from_a_to_b(rect_center(self.rect()), rect_center(other)).1
    }

    #[must_use]
    pub fn cardinal_direction_to_object(&self, other: Rect) -> Direction {
        cardinal_direction(self.angle_to_object(other))
    }

    pub fn on(&mut self, event: SandboxEvent, handler: FnPtr) {
        self.object.sandbox.push_handler(event, handler);
    }

    fn sync_body(&mut self) {
        if let Some(handle) = self.object.physics_body {
            self.physics.set_position(handle, self.object.x, self.object.y);
        }
    }
}
