//! Rendering: draws the scene through a camera onto a [`Painter`].
//!
//! The painter is the only seam to an actual drawing surface. The browser
//! adapter implements it over a 2D canvas context; the binary and the tests
//! use headless painters. Apart from text objects, whose size is re-measured
//! on every paint, rendering never mutates the scene.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use crate::consts::{
    BACKGROUND_COLOR, CAMERA_OUTLINE_COLOR, DEBUG_BODY_COLOR, DEBUG_SPRITE_COLOR, HANDLE_SIZE, MARQUEE_COLOR,
    SELECTION_COLOR,
};
use crate::input::{CursorState, ResizeHandle, Selection};
use crate::object::{ObjectKind, SceneObject};
use crate::physics::PhysicsWorld;
use crate::rect::Rect;
use crate::scene::Scene;
use crate::tiles::{TileError, Tiles};

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("canvas call failed: {0}")]
    Canvas(String),
    #[error("sprite atlas {0} is not loaded")]
    MissingAtlas(String),
    #[error(transparent)]
    Tile(#[from] TileError),
}

/// Result of measuring a string with the painter's current font.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextMetrics {
    pub width: f64,
    pub ascent: f64,
    pub descent: f64,
}

impl TextMetrics {
    #[must_use]
    pub fn height(&self) -> f64 {
        self.ascent + self.descent
    }
}

/// A 2D drawing surface.
pub trait Painter {
    /// Reset the transform and fill the whole surface with `color`.
    fn clear(&mut self, color: &str, width: f64, height: f64) -> Result<(), RenderError>;

    /// Replace the current transform with a translation.
    fn set_translation(&mut self, dx: f64, dy: f64) -> Result<(), RenderError>;

    fn fill_rect(&mut self, rect: Rect, color: &str) -> Result<(), RenderError>;

    fn stroke_rect(&mut self, rect: Rect, color: &str) -> Result<(), RenderError>;

    /// Draw `text` with its baseline's left end at `(x, y)`.
    fn fill_text(&mut self, text: &str, x: f64, y: f64, color: &str) -> Result<(), RenderError>;

    fn measure_text(&mut self, text: &str) -> Result<TextMetrics, RenderError>;

    /// Copy `source` from the atlas image at `tiles_url` into `dest`.
    fn draw_tile(&mut self, tiles_url: &str, source: Rect, dest: Rect) -> Result<(), RenderError>;
}

/// Where and how large the scene is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Camera the scene is viewed through.
    pub camera: Rect,
    pub width: f64,
    pub height: f64,
}

// =============================================================
// Scene
// =============================================================

/// Draw the whole scene: background, objects in paint order, debug boxes
/// when enabled, and the outline of the scene's run camera.
///
/// A sprite whose atlas isn't loaded (or whose tile is out of range) is
/// skipped with a warning and the rest of the frame is still drawn.
///
/// # Errors
///
/// Returns the first painter failure.
pub fn render_scene(
    painter: &mut dyn Painter,
    scene: &mut Scene,
    atlas: Option<&Tiles>,
    viewport: Viewport,
) -> Result<(), RenderError> {
    painter.clear(BACKGROUND_COLOR, viewport.width, viewport.height)?;
    painter.set_translation(viewport.camera.x, viewport.camera.y)?;

    let debug = scene.debug_boxes;
    for id in scene.ids() {
        if debug {
            if let Some(object) = scene.get(id) {
                paint_debug_boxes(painter, object, scene.physics())?;
            }
        }
        if let Some(object) = scene.get_mut(id) {
            match paint_object(painter, object, atlas) {
                Ok(()) => {}
                Err(err @ (RenderError::MissingAtlas(_) | RenderError::Tile(_))) => {
                    tracing::warn!(object = %id, error = %err, "skipping unpaintable object");
                }
                Err(err) => return Err(err),
            }
        }
    }

    painter.stroke_rect(scene.camera.rect(), CAMERA_OUTLINE_COLOR)
}

/// Paint one object at its current geometry.
///
/// Text objects take their width and height from measuring their content.
///
/// # Errors
///
/// Returns the first painter failure.
pub fn paint_object(painter: &mut dyn Painter, object: &mut SceneObject, atlas: Option<&Tiles>) -> Result<(), RenderError> {
    match &object.kind {
        ObjectKind::Sprite(location) => {
            let tiles = atlas
                .filter(|t| t.url() == location.tiles_url)
                .ok_or_else(|| RenderError::MissingAtlas(location.tiles_url.clone()))?;
            let source = tiles.source_rect(location.index)?;
            let dest = Rect::new(object.x.round(), object.y.round(), source.width, source.height);
            painter.draw_tile(&location.tiles_url, source, dest)
        }
        ObjectKind::Box { color } => painter.fill_rect(object.rect(), color),
        ObjectKind::Text { text, color } => {
            let metrics = painter.measure_text(text)?;
            object.width = metrics.width;
            object.height = metrics.height();
            painter.fill_text(text, object.x, object.y + object.height, color)
        }
        ObjectKind::Camera => Ok(()),
    }
}

fn paint_debug_boxes(painter: &mut dyn Painter, object: &SceneObject, physics: &PhysicsWorld) -> Result<(), RenderError> {
    if let Some(pos) = object.physics_body().and_then(|h| physics.position(h)) {
        painter.fill_rect(Rect::new(pos.x, pos.y, object.width, object.height), DEBUG_BODY_COLOR)?;
    }
    if matches!(object.kind, ObjectKind::Sprite(_)) {
        painter.fill_rect(object.rect(), DEBUG_SPRITE_COLOR)?;
    }
    Ok(())
}

// =============================================================
// Editing overlays
// =============================================================

/// Draw the selection box and the marquee on top of an editing-mode frame.
///
/// Corner handles are shown only for a single selection, the only case that
/// can be resized.
///
/// # Errors
///
/// Returns the first painter failure.
pub fn render_editing_overlay(
    painter: &mut dyn Painter,
    scene: &Scene,
    selection: &Selection,
    cursor: &CursorState,
) -> Result<(), RenderError> {
    if let Some(bounds) = scene.bounds_of(selection.ids()) {
        painter.stroke_rect(bounds, SELECTION_COLOR)?;
        if selection.single().is_some() {
            for handle in ResizeHandle::ALL {
                painter.fill_rect(handle.hit_rect(bounds, HANDLE_SIZE), SELECTION_COLOR)?;
            }
        }
    }
    if let Some(marquee) = cursor.marquee() {
        painter.fill_rect(marquee, MARQUEE_COLOR)?;
    }
    Ok(())
}

// =============================================================
// Headless painter
// =============================================================

/// Painter that draws nothing and measures text with a fixed-pitch font.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadlessPainter {
    pub char_width: f64,
    pub ascent: f64,
    pub descent: f64,
}

impl Default for HeadlessPainter {
    fn default() -> Self {
        Self { char_width: 6.0, ascent: 8.0, descent: 2.0 }
    }
}

impl Painter for HeadlessPainter {
    fn clear(&mut self, _color: &str, _width: f64, _height: f64) -> Result<(), RenderError> {
        Ok(())
    }

    fn set_translation(&mut self, _dx: f64, _dy: f64) -> Result<(), RenderError> {
        Ok(())
    }

    fn fill_rect(&mut self, _rect: Rect, _color: &str) -> Result<(), RenderError> {
        Ok(())
    }

    fn stroke_rect(&mut self, _rect: Rect, _color: &str) -> Result<(), RenderError> {
        Ok(())
    }

    fn fill_text(&mut self, _text: &str, _x: f64, _y: f64, _color: &str) -> Result<(), RenderError> {
        Ok(())
    }

    #[allow(clippy::cast_precision_loss)]
    fn measure_text(&mut self, text: &str) -> Result<TextMetrics, RenderError> {
        Ok(TextMetrics { width: text.chars().count() as f64 * self.char_width, ascent: self.ascent, descent: self.descent })
    }

    fn draw_tile(&mut self, _tiles_url: &str, _source: Rect, _dest: Rect) -> Result<(), RenderError> {
        Ok(())
    }
}
