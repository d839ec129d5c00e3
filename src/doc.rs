//! Document format: a scene and its atlas reference as versioned JSON.
//!
//! Every non-plain value is written as an object carrying a `$type` tag next
//! to its serial fields:
//!
//! ```text
//! { "$type": "Doc_V1",
//!   "tiles": { "$type": "Tiles", "url": ..., "spriteSize": ... },
//!   "engineState": { "$type": "EngineState",
//!                    "camera": { "$type": "Camera", "x", "y", "w", "h" },
//!                    "objects": [ { "$type": "Sprite", ... }, ... ] } }
//! ```
//!
//! Values with no representation are logged and left out. Loading is strict:
//! an unknown `$type`, a missing field, or a sprite whose atlas isn't the
//! loaded one fails the whole load.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::consts::{DEFAULT_BOX_COLOR, DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH};
use crate::object::{Classname, ObjectKind, SceneObject};
use crate::rect::Rect;
use crate::scene::{Scene, SceneError};
use crate::tiles::{SpriteLocation, TileError, Tiles};

const TYPE_KEY: &str = "$type";
const DOC_TYPE: &str = "Doc_V1";
const TILES_TYPE: &str = "Tiles";
const STATE_TYPE: &str = "EngineState";

#[derive(Debug, thiserror::Error)]
pub enum DocError {
    #[error("malformed document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid data type: {0}")]
    InvalidRoot(String),
    #[error("can't hydrate {0}")]
    UnknownType(String),
    #[error("{type_tag} is missing field {field}")]
    MissingField { type_tag: &'static str, field: &'static str },
    #[error("no tilemap to reference for sprite: {0}")]
    NoTilemap(String),
    #[error("unknown tilemap for sprite: {0}")]
    UnknownTilemap(String),
    #[error(transparent)]
    Tiles(#[from] TileError),
    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// The atlas a document refers to, before its image is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TilesDescriptor {
    pub url: String,
    pub sprite_size: u32,
}

impl From<&Tiles> for TilesDescriptor {
    fn from(tiles: &Tiles) -> Self {
        Self { url: tiles.url().to_owned(), sprite_size: tiles.sprite_size() }
    }
}

/// A loaded document.
#[derive(Debug)]
pub struct Document {
    pub scene: Scene,
    pub tiles: Option<TilesDescriptor>,
}

// =============================================================
// Serialization
// =============================================================

/// Serialize a scene and its atlas reference as a `Doc_V1` document.
///
/// # Errors
///
/// Returns [`DocError::Json`] if the encoder fails.
pub fn serialize_document(scene: &Scene, tiles: Option<&Tiles>, pretty: bool) -> Result<String, DocError> {
    let objects: Vec<Value> = scene.iter().filter_map(tagged_object).collect();

    let mut state = Map::new();
    state.insert(TYPE_KEY.into(), json!(STATE_TYPE));
    if let Some(camera) = tagged_object(&scene.camera) {
        state.insert("camera".into(), camera);
    }
    state.insert("objects".into(), Value::Array(objects));

    let tiles = tiles.map_or(Value::Null, |t| {
        let descriptor = TilesDescriptor::from(t);
        json!({ TYPE_KEY: TILES_TYPE, "url": descriptor.url, "spriteSize": descriptor.sprite_size })
    });

    let root = json!({ TYPE_KEY: DOC_TYPE, "tiles": tiles, "engineState": Value::Object(state) });
    let text = if pretty { serde_json::to_string_pretty(&root)? } else { serde_json::to_string(&root)? };
    Ok(text)
}

/// A single object as a tagged JSON blob, as used for clipboard copies.
///
/// Returns `None` (with a warning) when the object has no representation.
#[must_use]
pub fn serialize_object(object: &SceneObject) -> Option<String> {
    tagged_object(object).map(|v| v.to_string())
}

fn tagged_object(object: &SceneObject) -> Option<Value> {
    let Some(mut fields) = object.serial_repr() else {
        tracing::warn!(object = %object.uuid(), classname = object.classname().as_str(), "can't serialize object");
        return None;
    };
    fields.insert(TYPE_KEY.into(), json!(object.classname().as_str()));
    Some(Value::Object(fields))
}

// =============================================================
// Hydration
// =============================================================

/// Read the atlas descriptor out of a document without hydrating it, so the
/// host can load the atlas image first.
///
/// # Errors
///
/// Fails on malformed JSON or a root that isn't a `Doc_V1`.
pub fn peek_tiles(text: &str) -> Result<Option<TilesDescriptor>, DocError> {
    let root = parse_root(text)?;
    tiles_of(&root)
}

/// Hydrate a `Doc_V1` document. Sprites are resolved against `atlas`.
///
/// Every object gets a fresh uuid; objects saved with physics get a new body.
///
/// # Errors
///
/// Fails on malformed JSON, a non-`Doc_V1` root, an unknown object type, a
/// missing required field, or a sprite whose atlas is absent or different.
pub fn deserialize(text: &str, atlas: Option<&Tiles>) -> Result<Document, DocError> {
    let root = parse_root(text)?;
    let tiles = tiles_of(&root)?;
    let state = root
        .get("engineState")
        .filter(|v| v.is_object())
        .ok_or(DocError::MissingField { type_tag: DOC_TYPE, field: "engineState" })?;

    let camera = match state.get("camera").filter(|v| !v.is_null()) {
        Some(value) => hydrate_camera(value)?,
        None => Rect::new(0.0, 0.0, DEFAULT_CANVAS_WIDTH, DEFAULT_CANVAS_HEIGHT),
    };

    let mut scene = Scene::new(camera);
    let objects = state.get("objects").and_then(Value::as_array).map_or(&[][..], Vec::as_slice);
    for value in objects {
        if value.is_null() {
            continue;
        }
        let object = hydrate_object(value, atlas)?;
        let physics = value.get("physics").and_then(Value::as_bool).unwrap_or(false);
        let id = scene.add(object);
        if physics {
            scene.enable_physics(id)?;
        }
    }

    tracing::info!(objects = scene.len(), "document hydrated");
    Ok(Document { scene, tiles })
}

/// Parse a clipboard blob, accepting only a tagged sprite.
///
/// # Errors
///
/// Fails on malformed JSON, any `$type` other than `Sprite`, or an
/// unresolvable atlas reference.
pub fn hydrate_clipboard_sprite(text: &str, atlas: Option<&Tiles>) -> Result<SceneObject, DocError> {
    let value: Value = serde_json::from_str(text)?;
    match type_tag(&value) {
        Some("Sprite") => hydrate_object(&value, atlas),
        other => Err(DocError::UnknownType(other.unwrap_or_default().to_owned())),
    }
}

/// Rebuild one tagged object.
///
/// # Errors
///
/// See [`deserialize`].
pub fn hydrate_object(value: &Value, atlas: Option<&Tiles>) -> Result<SceneObject, DocError> {
    let tag = type_tag(value).unwrap_or_default();
    let classname = Classname::from_type_tag(tag).ok_or_else(|| DocError::UnknownType(tag.to_owned()))?;
    let name = classname.as_str();

    let x = number(value, name, "x")?;
    let y = number(value, name, "y")?;
    let mut object = match classname {
        Classname::Sprite => {
            let reference = string(value, name, "imageUrl")?;
            let location: SpriteLocation = reference.parse()?;
            let tiles = atlas.ok_or_else(|| DocError::NoTilemap(location.tiles_url.clone()))?;
            if tiles.url() != location.tiles_url {
                return Err(DocError::UnknownTilemap(location.tiles_url));
            }
            SceneObject::sprite(tiles, location.index, x, y)?
        }
        Classname::Box => {
            let rect = Rect::new(x, y, number(value, name, "width")?, number(value, name, "height")?);
            let color = value.get("color").and_then(Value::as_str).unwrap_or(DEFAULT_BOX_COLOR);
            SceneObject::new_box(rect, color)
        }
        Classname::Text => {
            let mut object = SceneObject::text(x, y, value.get("text").and_then(Value::as_str).unwrap_or_default());
            if let (ObjectKind::Text { color, .. }, Some(saved)) = (&mut object.kind, value.get("color").and_then(Value::as_str)) {
                saved.clone_into(color);
            }
            object
        }
        // The run camera lives outside the object list.
        Classname::Camera => return Err(DocError::UnknownType(tag.to_owned())),
    };

    if let Some(width) = value.get("width").and_then(Value::as_f64) {
        object.width = width;
    }
    if let Some(height) = value.get("height").and_then(Value::as_f64) {
        object.height = height;
    }
    object.id = value.get("id").and_then(Value::as_str).map(str::to_owned);
    if let Some(script) = value.get("_script").and_then(Value::as_str) {
        script.clone_into(&mut object.script);
    }
    Ok(object)
}

fn hydrate_camera(value: &Value) -> Result<Rect, DocError> {
    let tag = Classname::Camera.as_str();
    Ok(Rect::new(number(value, tag, "x")?, number(value, tag, "y")?, number(value, tag, "w")?, number(value, tag, "h")?))
}

fn parse_root(text: &str) -> Result<Value, DocError> {
    let root: Value = serde_json::from_str(text)?;
    match type_tag(&root) {
        Some(DOC_TYPE) => Ok(root),
        other => Err(DocError::InvalidRoot(other.unwrap_or("untagged").to_owned())),
    }
}

fn tiles_of(root: &Value) -> Result<Option<TilesDescriptor>, DocError> {
    match root.get("tiles") {
        None | Some(Value::Null) => Ok(None),
        Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
    }
}

fn type_tag(value: &Value) -> Option<&str> {
    value.get(TYPE_KEY).and_then(Value::as_str)
}

fn number(value: &Value, type_tag: &'static str, field: &'static str) -> Result<f64, DocError> {
    value.get(field).and_then(Value::as_f64).ok_or(DocError::MissingField { type_tag, field })
}

fn string<'a>(value: &'a Value, type_tag: &'static str, field: &'static str) -> Result<&'a str, DocError> {
    value.get(field).and_then(Value::as_str).ok_or(DocError::MissingField { type_tag, field })
}
