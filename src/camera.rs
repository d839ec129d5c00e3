//! Points, vector helpers, and the translation a camera applies to the scene.
//!
//! Cameras in the scene are ordinary [`crate::object::SceneObject`]s of the
//! `Camera` variant. Drawing through one translates the scene by the camera's
//! `x`/`y`, so moving the camera right moves the drawn world right as well
//! (grab-to-pan semantics in the editor).

#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use crate::rect::Rect;

/// A point in client, canvas, or world space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn sub(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    #[must_use]
    pub fn add(self, other: Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    #[must_use]
    pub fn div(self, factor: f64) -> Point {
        Point::new(self.x / factor, self.y / factor)
    }

    #[must_use]
    pub fn floor(self) -> Point {
        Point::new(self.x.floor(), self.y.floor())
    }
}

/// Translation applied when drawing the scene through a camera.
///
/// `pan_x` / `pan_y` are the camera's `x` / `y`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewTransform {
    pub pan_x: f64,
    pub pan_y: f64,
}

impl ViewTransform {
    /// Build the transform for a camera rect.
    #[must_use]
    pub fn from_camera(camera: Rect) -> Self {
        Self { pan_x: camera.x, pan_y: camera.y }
    }

    /// Convert a canvas-space point to world coordinates.
    #[must_use]
    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point::new(screen.x - self.pan_x, screen.y - self.pan_y)
    }

    /// Convert a world-space point to canvas coordinates.
    #[must_use]
    pub fn world_to_screen(&self, world: Point) -> Point {
        Point::new(world.x + self.pan_x, world.y + self.pan_y)
    }
}

/// Convert a pointer's client coordinates to pixel-snapped world coordinates.
///
/// `canvas_origin` is the canvas element's top-left in client space and `dpr`
/// the display pixel ratio.
#[must_use]
pub fn client_to_world(client: Point, canvas_origin: Point, dpr: f64, view: ViewTransform) -> Point {
    let canvas = client.sub(canvas_origin).div(dpr);
    view.screen_to_world(Point::new(canvas.x.round(), canvas.y.round()))
}
