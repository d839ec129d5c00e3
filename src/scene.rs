//! The scene: every object in paint order, the run camera, the physics world,
//! and the user-id index scripts look objects up through.
//!
//! Shared between the editor, the runtime and script callbacks as a
//! [`SceneHandle`]. Nothing holds a borrow of it across a script call.

#[cfg(test)]
#[path = "scene_test.rs"]
mod scene_test;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::camera::Point;
use crate::consts::{DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH};
use crate::object::{ObjectId, SceneObject};
use crate::ordered_set::OrderedSet;
use crate::physics::{BodyHandle, PhysicsWorld, body_precision};
use crate::rect::{Rect, min_spanning_rect, rect_subset};
use crate::sandbox::{ObjectProxy, Sandbox};

/// Shared, single-threaded handle to a scene.
pub type SceneHandle = Rc<RefCell<Scene>>;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("no object {0} in scene")]
    UnknownObject(ObjectId),
}

/// User id → object lookup. When several objects share an id, the first in
/// paint order at the last rebuild owns it.
#[derive(Debug, Default)]
pub struct IdIndex {
    by_id: HashMap<String, ObjectId>,
}

impl IdIndex {
    pub(crate) fn claim(&mut self, id: &str, object: ObjectId) {
        self.by_id.entry(id.to_owned()).or_insert(object);
    }

    pub(crate) fn release(&mut self, id: &str, object: ObjectId) {
        if self.by_id.get(id) == Some(&object) {
            self.by_id.remove(id);
        }
    }

    fn get(&self, id: &str) -> Option<ObjectId> {
        self.by_id.get(id).copied()
    }

    fn clear(&mut self) {
        self.by_id.clear();
    }
}

#[derive(Debug)]
pub struct Scene {
    objects: HashMap<ObjectId, SceneObject>,
    order: OrderedSet<ObjectId>,
    /// Camera the running scene is viewed through.
    pub camera: SceneObject,
    physics: PhysicsWorld,
    ids: IdIndex,
    /// Outline physics bodies and sprite bounds when rendering.
    pub debug_boxes: bool,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(Rect::new(0.0, 0.0, DEFAULT_CANVAS_WIDTH, DEFAULT_CANVAS_HEIGHT))
    }
}

impl Scene {
    /// An empty scene whose run camera covers `camera`.
    #[must_use]
    pub fn new(camera: Rect) -> Self {
        Self {
            objects: HashMap::new(),
            order: OrderedSet::new(),
            camera: SceneObject::camera(camera),
            physics: PhysicsWorld::new(),
            ids: IdIndex::default(),
            debug_boxes: false,
        }
    }

    #[must_use]
    pub fn into_handle(self) -> SceneHandle {
        Rc::new(RefCell::new(self))
    }

    // --- Membership ---

    /// Append an object on top of the paint order.
    pub fn add(&mut self, object: SceneObject) -> ObjectId {
        let uuid = object.uuid();
        if let Some(id) = &object.id {
            self.ids.claim(id, uuid);
        }
        self.order.add(uuid);
        self.objects.insert(uuid, object);
        uuid
    }

    /// Remove an object, tearing down its physics body.
    pub fn remove(&mut self, id: ObjectId) -> Option<SceneObject> {
        if !self.order.delete(&id) {
            return None;
        }
        let mut object = self.objects.remove(&id)?;
        if let Some(handle) = object.physics_body.take() {
            self.physics.remove_body(handle);
        }
        if let Some(user_id) = &object.id {
            self.ids.release(user_id, id);
        }
        Some(object)
    }

    /// Drop every object and body. The run camera is kept.
    pub fn clear(&mut self) {
        let ids: Vec<ObjectId> = self.order.iter().copied().collect();
        for id in ids {
            self.remove(id);
        }
        self.ids.clear();
    }

    #[must_use]
    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(&id)
    }

    /// Direct mutable access. Position writes here do not move physics bodies.
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.get_mut(&id)
    }

    #[must_use]
    pub fn contains(&self, id: ObjectId) -> bool {
        self.order.has(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Object ids in paint order (bottom first).
    #[must_use]
    pub fn ids(&self) -> Vec<ObjectId> {
        self.order.iter().copied().collect()
    }

    /// Objects in paint order.
    pub fn iter(&self) -> impl Iterator<Item = &SceneObject> {
        self.order.iter().filter_map(|id| self.objects.get(id))
    }

    #[must_use]
    pub fn order(&self) -> &OrderedSet<ObjectId> {
        &self.order
    }

    // --- Queries ---

    /// Topmost object whose rect contains `point`.
    #[must_use]
    pub fn object_at(&self, point: Point) -> Option<ObjectId> {
        self.order.iter().rev().copied().find(|id| self.objects.get(id).is_some_and(|o| o.rect().contains_point(point)))
    }

    /// Objects lying strictly inside `area`, in paint order.
    #[must_use]
    pub fn objects_inside(&self, area: Rect) -> Vec<ObjectId> {
        self.iter().filter(|o| rect_subset(o.rect(), area)).map(SceneObject::uuid).collect()
    }

    #[must_use]
    pub fn bounds_of(&self, ids: &[ObjectId]) -> Option<Rect> {
        let rects: Vec<Rect> = ids.iter().filter_map(|id| self.objects.get(id)).map(SceneObject::rect).collect();
        min_spanning_rect(&rects)
    }

    /// Look up an object by its user-assigned id.
    #[must_use]
    pub fn find_by_user_id(&self, user_id: &str) -> Option<ObjectId> {
        if let Some(id) = self.ids.get(user_id) {
            if self.objects.get(&id).is_some_and(|o| o.id.as_deref() == Some(user_id)) {
                return Some(id);
            }
        }
        // Index is stale after a direct field write; fall back to a scan.
        self.iter().find(|o| o.id.as_deref() == Some(user_id)).map(SceneObject::uuid)
    }

    /// Rename an object, keeping the id index current.
    pub fn set_user_id(&mut self, id: ObjectId, user_id: Option<String>) -> Result<(), SceneError> {
        let mut proxy = self.proxy(id).ok_or(SceneError::UnknownObject(id))?;
        proxy.set_id(user_id);
        Ok(())
    }

    pub fn rebuild_id_index(&mut self) {
        self.ids.clear();
        for id in self.order.iter() {
            if let Some(user_id) = self.objects.get(id).and_then(|o| o.id.as_deref()) {
                self.ids.claim(user_id, *id);
            }
        }
    }

    // --- Ordering ---

    pub fn move_to_index(&mut self, id: ObjectId, index: usize) -> bool {
        self.order.move_to_index(index, &id)
    }

    pub fn bring_to_front(&mut self, id: ObjectId) -> bool {
        let last = self.order.len();
        self.order.move_to_index(last, &id)
    }

    pub fn send_to_back(&mut self, id: ObjectId) -> bool {
        self.order.move_to_index(0, &id)
    }

    // --- Scripting ---

    /// Script-facing accessor for `id`.
    pub fn proxy(&mut self, id: ObjectId) -> Option<ObjectProxy<'_>> {
        let object = self.objects.get_mut(&id)?;
        Some(ObjectProxy::new(object, &mut self.physics, &mut self.ids))
    }

    /// Replace every object's sandbox with a fresh, empty one.
    pub fn reset_sandboxes(&mut self) {
        for object in self.objects.values_mut() {
            object.sandbox = Sandbox::new(object.uuid());
        }
    }

    // --- Physics ---

    /// Attach a physics body to `id`, or return the one already attached.
    pub fn enable_physics(&mut self, id: ObjectId) -> Result<BodyHandle, SceneError> {
        let object = self.objects.get_mut(&id).ok_or(SceneError::UnknownObject(id))?;
        if let Some(handle) = object.physics_body {
            return Ok(handle);
        }
        let handle = self.physics.add_box_body(object.x, object.y, object.width, object.height);
        object.physics_body = Some(handle);
        tracing::debug!(object = %id, "physics enabled");
        Ok(handle)
    }

    /// Detach and destroy `id`'s physics body. Returns whether one existed.
    pub fn disable_physics(&mut self, id: ObjectId) -> bool {
        let Some(handle) = self.objects.get_mut(&id).and_then(|o| o.physics_body.take()) else {
            return false;
        };
        self.physics.remove_body(handle)
    }

    #[must_use]
    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.physics
    }

    /// Set `id`'s body velocity. Returns `false` if it has no body.
    pub fn set_body_velocity(&mut self, id: ObjectId, vx: f64, vy: f64) -> bool {
        match self.objects.get(&id).and_then(|o| o.physics_body) {
            Some(handle) => self.physics.set_velocity(handle, vx, vy),
            None => false,
        }
    }

    /// Move every attached body back onto its object and stop it.
    pub fn reset_bodies(&mut self) {
        for object in self.objects.values() {
            if let Some(handle) = object.physics_body {
                self.physics.set_position(handle, object.x, object.y);
                self.physics.set_velocity(handle, 0.0, 0.0);
            }
        }
    }

    pub fn step_physics(&mut self, dt_secs: f64) {
        self.physics.step(dt_secs);
    }

    /// Overwrite each attached object's `x`/`y` with its body position.
    ///
    /// Bodies hold single precision, so a coordinate the body hasn't moved
    /// off keeps the object's exact value.
    #[allow(clippy::float_cmp)]
    pub fn commit_physics(&mut self) {
        for object in self.objects.values_mut() {
            if let Some(pos) = object.physics_body.and_then(|h| self.physics.position(h)) {
                if pos.x != body_precision(object.x) {
                    object.x = pos.x;
                }
                if pos.y != body_precision(object.y) {
                    object.y = pos.y;
                }
            }
        }
    }
}
