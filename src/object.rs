//! Scene objects: the sprites, boxes, text labels and cameras a scene holds.
//!
//! Every object carries the same geometry and identity fields; variant data
//! lives in [`ObjectKind`]. Editor code mutates geometry by plain field
//! assignment. Only writes routed through [`crate::sandbox::ObjectProxy`]
//! keep an attached physics body in sync.

#[cfg(test)]
#[path = "object_test.rs"]
mod object_test;

use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::consts::{DEFAULT_SCRIPT, DEFAULT_TEXT_COLOR};
use crate::physics::BodyHandle;
use crate::rect::Rect;
use crate::sandbox::Sandbox;
use crate::tiles::{SpriteLocation, TileError, Tiles};

/// Unique identifier for a scene object. Regenerated on every construction.
pub type ObjectId = Uuid;

/// Discriminant of an object variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classname {
    Sprite,
    Box,
    Text,
    Camera,
}

impl Classname {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sprite => "Sprite",
            Self::Box => "Box",
            Self::Text => "Text",
            Self::Camera => "Camera",
        }
    }

    /// Parse a document `$type` tag.
    #[must_use]
    pub fn from_type_tag(tag: &str) -> Option<Self> {
        match tag {
            "Sprite" => Some(Self::Sprite),
            "Box" => Some(Self::Box),
            "Text" => Some(Self::Text),
            "Camera" => Some(Self::Camera),
            _ => None,
        }
    }
}

/// Variant-specific data.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectKind {
    /// One tile of the loaded atlas, drawn at its native size.
    Sprite(SpriteLocation),
    /// Solid filled rectangle.
    Box { color: String },
    /// Single line of text. Width and height are re-measured on every paint.
    Text { text: String, color: String },
    /// Viewport onto the scene. Paints nothing.
    Camera,
}

/// A single object in the scene.
#[derive(Debug)]
pub struct SceneObject {
    uuid: ObjectId,
    /// User-assigned name that scripts look objects up by.
    pub id: Option<String>,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Source text evaluated against the sandbox on run entry.
    pub script: String,
    pub kind: ObjectKind,
    pub(crate) physics_body: Option<BodyHandle>,
    pub(crate) sandbox: Sandbox,
}

impl SceneObject {
    fn with_kind(kind: ObjectKind, rect: Rect) -> Self {
        let uuid = Uuid::new_v4();
        Self {
            uuid,
            id: None,
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            script: DEFAULT_SCRIPT.to_owned(),
            kind,
            physics_body: None,
            sandbox: Sandbox::new(uuid),
        }
    }

    /// A sprite showing tile `index` of `tiles`, sized to one tile.
    ///
    /// # Errors
    ///
    /// Returns [`TileError::IndexOutOfRange`] if the atlas has no such tile.
    pub fn sprite(tiles: &Tiles, index: usize, x: f64, y: f64) -> Result<Self, TileError> {
        let location = tiles.location(index)?;
        let size = f64::from(tiles.sprite_size());
        Ok(Self::with_kind(ObjectKind::Sprite(location), Rect::new(x, y, size, size)))
    }

    #[must_use]
    pub fn new_box(rect: Rect, color: impl Into<String>) -> Self {
        Self::with_kind(ObjectKind::Box { color: color.into() }, rect)
    }

    /// A text label at `(x, y)`. Its size is zero until first painted.
    #[must_use]
    pub fn text(x: f64, y: f64, text: impl Into<String>) -> Self {
        let kind = ObjectKind::Text { text: text.into(), color: DEFAULT_TEXT_COLOR.to_owned() };
        Self::with_kind(kind, Rect::new(x, y, 0.0, 0.0))
    }

    #[must_use]
    pub fn camera(rect: Rect) -> Self {
        Self::with_kind(ObjectKind::Camera, rect)
    }

    #[must_use]
    pub fn with_user_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn uuid(&self) -> ObjectId {
        self.uuid
    }

    #[must_use]
    pub fn classname(&self) -> Classname {
        match self.kind {
            ObjectKind::Sprite(_) => Classname::Sprite,
            ObjectKind::Box { .. } => Classname::Box,
            ObjectKind::Text { .. } => Classname::Text,
            ObjectKind::Camera => Classname::Camera,
        }
    }

    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn set_rect(&mut self, rect: Rect) {
        self.x = rect.x;
        self.y = rect.y;
        self.width = rect.width;
        self.height = rect.height;
    }

    #[must_use]
    pub fn physics_body(&self) -> Option<BodyHandle> {
        self.physics_body
    }

    #[must_use]
    pub fn has_physics(&self) -> bool {
        self.physics_body.is_some()
    }

    #[must_use]
    pub fn sandbox(&self) -> &Sandbox {
        &self.sandbox
    }

    /// Primitive fields plus variant-derived fields, ready to be tagged with
    /// `$type` and written into a document.
    ///
    /// Returns `None` when the geometry has no JSON representation.
    #[must_use]
    pub fn serial_repr(&self) -> Option<Map<String, Value>> {
        if !self.rect().is_finite() {
            return None;
        }
        let mut map = Map::new();
        if let ObjectKind::Camera = self.kind {
            map.insert("x".into(), json!(self.x));
            map.insert("y".into(), json!(self.y));
            map.insert("w".into(), json!(self.width));
            map.insert("h".into(), json!(self.height));
            return Some(map);
        }
        map.insert("x".into(), json!(self.x));
        map.insert("y".into(), json!(self.y));
        map.insert("width".into(), json!(self.width));
        map.insert("height".into(), json!(self.height));
        if let Some(id) = &self.id {
            map.insert("id".into(), json!(id));
        }
        map.insert("_script".into(), json!(self.script));
        map.insert("_uuid".into(), json!(self.uuid.to_string()));
        map.insert("physics".into(), json!(self.has_physics()));
        match &self.kind {
            ObjectKind::Sprite(location) => {
                map.insert("imageUrl".into(), json!(location.to_string()));
            }
            ObjectKind::Box { color } => {
                map.insert("color".into(), json!(color));
            }
            ObjectKind::Text { text, color } => {
                map.insert("text".into(), json!(text));
                map.insert("color".into(), json!(color));
            }
            ObjectKind::Camera => {}
        }
        Some(map)
    }
}
