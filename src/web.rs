//! Browser adapter: a [`Painter`] over a 2D canvas context, a
//! [`DocumentStore`] over `localStorage`, and [`Engine`], which wraps
//! [`EngineCore`] and carries out the actions that touch the page.
//!
//! Actions that need host cooperation beyond this (clipboard access, atlas
//! image loads, save confirmation) are handed back to the caller.

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement, Storage};

use crate::camera::Point;
use crate::config::EngineConfig;
use crate::engine::{Action, AsyncTicket, EngineCore, EngineError};
use crate::input::CursorStyle;
use crate::rect::Rect;
use crate::render::{Painter, RenderError, TextMetrics};
use crate::storage::{DocumentStore, SaveOutcome, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum WebError {
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("dom: {0}")]
    Dom(String),
}

fn describe(value: &JsValue) -> String {
    format!("{value:?}")
}

fn canvas_error(value: JsValue) -> RenderError {
    RenderError::Canvas(describe(&value))
}

// =============================================================
// Canvas painter
// =============================================================

/// Draws onto a canvas 2D context. Sprites come from the one atlas image
/// currently installed.
pub struct CanvasPainter {
    ctx: CanvasRenderingContext2d,
    atlas: Option<(String, HtmlImageElement)>,
}

impl CanvasPainter {
    #[must_use]
    pub fn new(ctx: CanvasRenderingContext2d) -> Self {
        Self { ctx, atlas: None }
    }

    pub fn set_atlas(&mut self, url: impl Into<String>, image: HtmlImageElement) {
        self.atlas = Some((url.into(), image));
    }
}

impl Painter for CanvasPainter {
    fn clear(&mut self, color: &str, width: f64, height: f64) -> Result<(), RenderError> {
        self.ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0).map_err(canvas_error)?;
        self.ctx.set_fill_style_str(color);
        self.ctx.fill_rect(0.0, 0.0, width, height);
        Ok(())
    }

    fn set_translation(&mut self, dx: f64, dy: f64) -> Result<(), RenderError> {
        self.ctx.set_transform(1.0, 0.0, 0.0, 1.0, dx, dy).map_err(canvas_error)
    }

    fn fill_rect(&mut self, rect: Rect, color: &str) -> Result<(), RenderError> {
        self.ctx.set_fill_style_str(color);
        self.ctx.fill_rect(rect.x, rect.y, rect.width, rect.height);
        Ok(())
    }

    fn stroke_rect(&mut self, rect: Rect, color: &str) -> Result<(), RenderError> {
        self.ctx.set_stroke_style_str(color);
        self.ctx.stroke_rect(rect.x, rect.y, rect.width, rect.height);
        Ok(())
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64, color: &str) -> Result<(), RenderError> {
        self.ctx.set_fill_style_str(color);
        self.ctx.fill_text(text, x, y).map_err(canvas_error)
    }

    fn measure_text(&mut self, text: &str) -> Result<TextMetrics, RenderError> {
        let metrics = self.ctx.measure_text(text).map_err(canvas_error)?;
        Ok(TextMetrics {
            width: metrics.width(),
            ascent: metrics.actual_bounding_box_ascent(),
            descent: metrics.actual_bounding_box_descent(),
        })
    }

    fn draw_tile(&mut self, tiles_url: &str, source: Rect, dest: Rect) -> Result<(), RenderError> {
        let Some((_, image)) = self.atlas.as_ref().filter(|(url, _)| url == tiles_url) else {
            return Err(RenderError::MissingAtlas(tiles_url.to_owned()));
        };
        self.ctx
            .draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
                image,
                source.x,
                source.y,
                source.width,
                source.height,
                dest.x,
                dest.y,
                dest.width,
                dest.height,
            )
            .map_err(canvas_error)
    }
}

// =============================================================
// localStorage
// =============================================================

/// Document store backed by the window's `localStorage`.
pub struct LocalStorageStore {
    storage: Storage,
}

impl LocalStorageStore {
    /// # Errors
    ///
    /// Returns [`StorageError::Unavailable`] outside a window or when the
    /// browser denies storage access.
    pub fn open() -> Result<Self, StorageError> {
        let window = web_sys::window().ok_or_else(|| StorageError::Unavailable("no window".into()))?;
        let storage = window
            .local_storage()
            .map_err(|e| StorageError::Unavailable(describe(&e)))?
            .ok_or_else(|| StorageError::Unavailable("localStorage disabled".into()))?;
        Ok(Self { storage })
    }
}

impl DocumentStore for LocalStorageStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage.get_item(key).map_err(|e| StorageError::Unavailable(describe(&e)))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage
            .set_item(key, value)
            .map_err(|e| StorageError::Write { key: key.to_owned(), message: describe(&e) })
    }
}

// =============================================================
// Page cursor
// =============================================================

/// Show `style` as the page-wide mouse cursor.
///
/// # Errors
///
/// Returns [`WebError::Dom`] when there is no document body.
pub fn apply_cursor(style: CursorStyle) -> Result<(), WebError> {
    let body = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.body())
        .ok_or_else(|| WebError::Dom("no document body".into()))?;
    body.style().set_property("cursor", style.as_css()).map_err(|e| WebError::Dom(describe(&e)))
}

// =============================================================
// Engine
// =============================================================

/// The canvas engine: an [`EngineCore`] bound to a canvas element.
pub struct Engine {
    canvas: HtmlCanvasElement,
    painter: CanvasPainter,
    pub core: EngineCore,
}

impl Engine {
    /// # Errors
    ///
    /// Returns [`RenderError::Canvas`] when the canvas has no 2D context.
    pub fn new(canvas: HtmlCanvasElement, config: EngineConfig) -> Result<Self, RenderError> {
        let ctx = canvas
            .get_context("2d")
            .map_err(canvas_error)?
            .ok_or_else(|| RenderError::Canvas("no 2d context".into()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|obj| RenderError::Canvas(format!("unexpected context {obj:?}")))?;
        let core = EngineCore::new(config);
        tracing::info!(width = canvas.width(), height = canvas.height(), "canvas engine created");
        Ok(Self { canvas, painter: CanvasPainter::new(ctx), core })
    }

    #[must_use]
    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    /// Update the canvas placement and drawing-buffer size.
    pub fn set_viewport(&mut self, origin: Point, dpr: f64, width: f64, height: f64) {
        self.core.set_canvas(origin, dpr, width, height);
    }

    /// Carry out the actions this adapter can handle itself (cursor and
    /// redraws) and return the rest for the host.
    ///
    /// # Errors
    ///
    /// Returns the first DOM or render failure.
    pub fn apply(&mut self, actions: Vec<Action>) -> Result<Vec<Action>, WebError> {
        let mut rest = Vec::new();
        let mut redraw = false;
        for action in actions {
            match action {
                Action::SetCursor(style) => apply_cursor(style)?,
                Action::RenderNeeded => redraw = true,
                other => rest.push(other),
            }
        }
        if redraw {
            self.core.render(&mut self.painter)?;
        }
        Ok(rest)
    }

    /// The atlas image requested with `ticket` finished loading.
    ///
    /// # Errors
    ///
    /// Returns the engine's error for a bad image or a waiting document
    /// that fails to hydrate.
    pub fn atlas_image_loaded(
        &mut self,
        ticket: AsyncTicket,
        url: &str,
        image: HtmlImageElement,
    ) -> Result<Vec<Action>, WebError> {
        let loaded = self.core.atlas_loaded(ticket, url, image.natural_width(), image.natural_height());
        if self.core.tiles().is_some_and(|t| t.url() == url) {
            self.painter.set_atlas(url, image);
        }
        self.apply(loaded?)
    }

    /// Advance and draw one animation frame.
    ///
    /// # Errors
    ///
    /// Returns the first canvas failure.
    pub fn tick(&mut self, now_ms: f64) -> Result<(), RenderError> {
        self.core.tick(now_ms, &mut self.painter)
    }

    /// Save the document to `localStorage`.
    ///
    /// # Errors
    ///
    /// Returns storage and serialization failures.
    pub fn save(&self, confirm_overwrite: impl FnOnce() -> bool) -> Result<SaveOutcome, WebError> {
        let mut store = LocalStorageStore::open()?;
        Ok(self.core.save(&mut store, confirm_overwrite)?)
    }

    /// Load the document saved in `localStorage`.
    ///
    /// # Errors
    ///
    /// Returns storage and hydration failures.
    pub fn load(&mut self) -> Result<Vec<Action>, WebError> {
        let store = LocalStorageStore::open()?;
        let actions = self.core.load(&store)?;
        self.apply(actions)
    }
}
