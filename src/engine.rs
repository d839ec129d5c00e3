//! `EngineCore`: the editor's cursor state machine, keyboard surface,
//! clipboard and atlas plumbing, persistence glue, and run-mode switching.
//!
//! Handlers take host events and return [`Action`]s for the host to carry
//! out. Nothing here touches the browser, so the whole editor runs natively
//! in tests; `crate::web` wraps it for a canvas element.
//!
//! Host work that completes later (atlas image loads, clipboard reads) is
//! requested with an [`AsyncTicket`]. A completion whose ticket no longer
//! matches the current document is dropped, and clipboard completions must
//! also match the mode they were requested in.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use crate::camera::{Point, ViewTransform, client_to_world};
use crate::config::EngineConfig;
use crate::consts::{
    CLIPBOARD_MIME, DEFAULT_BOX_COLOR, DEFAULT_TEXT, HANDLE_SIZE, NUDGE_STEP, NUDGE_STEP_LARGE, PLACED_BOX_SIZE,
    WHEEL_PAN_DIVISOR,
};
use crate::doc::{self, DocError, Document, TilesDescriptor};
use crate::input::{
    Button, CursorState, CursorStyle, InputContext, Key, KeyLocation, Mode, Modifiers, MoveStart, MoveTarget,
    ResizeHandle, Selection, Tool,
};
use crate::object::{ObjectId, ObjectKind, SceneObject};
use crate::rect::Rect;
use crate::render::{self, Painter, RenderError, Viewport};
use crate::runtime::Runtime;
use crate::scene::{Scene, SceneError, SceneHandle};
use crate::script::FrameSize;
use crate::storage::{self, DocumentStore, SaveOutcome, StorageError};
use crate::tiles::{TileError, Tiles};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Doc(#[from] DocError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Tiles(#[from] TileError),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error("no sprite atlas has been requested")]
    NoAtlas,
}

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    RenderNeeded,
    SetCursor(CursorStyle),
    ModeChanged(Mode),
    SelectionChanged,
    /// Suppress the browser's default handling of the event.
    PreventDefault,
    CopyToClipboard { mime: &'static str, text: String },
    /// Read the clipboard and pass its items to [`EngineCore::paste_clipboard`].
    ReadClipboard(AsyncTicket),
    /// Persist the document through [`EngineCore::save`].
    SaveRequested,
    /// Load the atlas image and report back through [`EngineCore::atlas_loaded`].
    LoadAtlas { url: String, sprite_size: u32, ticket: AsyncTicket },
}

/// Identifies the document and mode an async request was made in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AsyncTicket {
    pub document: u64,
    pub mode: Mode,
}

/// One clipboard entry as read by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardItem {
    pub mime: String,
    pub text: String,
}

impl ClipboardItem {
    #[must_use]
    pub fn new(mime: impl Into<String>, text: impl Into<String>) -> Self {
        Self { mime: mime.into(), text: text.into() }
    }
}

/// A sprite placed before its atlas finished loading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingSprite {
    pub index: usize,
    pub position: Point,
}

/// The sprite atlas, which arrives asynchronously.
#[derive(Debug)]
pub enum AtlasSlot {
    Empty,
    Loading {
        ticket: AsyncTicket,
        descriptor: TilesDescriptor,
        /// Atlas the current scene is drawn from until this load commits.
        previous: Option<Tiles>,
        /// Document text waiting for this atlas before it can hydrate.
        pending_document: Option<String>,
        pending_sprites: Vec<PendingSprite>,
    },
    Ready(Tiles),
}

/// Core engine state: all editor and runtime logic that doesn't depend on
/// the canvas element.
pub struct EngineCore {
    config: EngineConfig,
    scene: SceneHandle,
    atlas: AtlasSlot,
    /// Detached camera the editor views the scene through.
    editor_camera: Rect,
    mode: Mode,
    selection: Selection,
    cursor: CursorState,
    pub input: InputContext,
    runtime: Runtime,
    /// Bumped whenever a new document is installed.
    document: u64,
}

impl EngineCore {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let viewport = Rect::new(0.0, 0.0, config.canvas_width, config.canvas_height);
        let mut scene = Scene::new(viewport);
        scene.debug_boxes = config.debug_boxes;
        Self {
            scene: scene.into_handle(),
            atlas: AtlasSlot::Empty,
            editor_camera: viewport,
            mode: Mode::Editing,
            selection: Selection::Idle,
            cursor: CursorState::Idle,
            input: InputContext::new(config.canvas_width, config.canvas_height),
            runtime: Runtime::new(config.script_max_operations),
            document: 0,
            config,
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn scene(&self) -> &SceneHandle {
        &self.scene
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    #[must_use]
    pub fn cursor(&self) -> &CursorState {
        &self.cursor
    }

    #[must_use]
    pub fn editor_camera(&self) -> Rect {
        self.editor_camera
    }

    #[must_use]
    pub fn atlas(&self) -> &AtlasSlot {
        &self.atlas
    }

    /// The loaded atlas, if any.
    #[must_use]
    pub fn tiles(&self) -> Option<&Tiles> {
        match &self.atlas {
            AtlasSlot::Ready(tiles) => Some(tiles),
            AtlasSlot::Empty | AtlasSlot::Loading { .. } => None,
        }
    }

    /// The atlas the current scene's sprites are drawn from: the loaded
    /// one, or while another is loading, the one it would replace.
    #[must_use]
    pub fn scene_tiles(&self) -> Option<&Tiles> {
        match &self.atlas {
            AtlasSlot::Ready(tiles) => Some(tiles),
            AtlasSlot::Loading { previous, .. } => previous.as_ref(),
            AtlasSlot::Empty => None,
        }
    }

    /// Ticket for a request made now.
    #[must_use]
    pub fn ticket(&self) -> AsyncTicket {
        AsyncTicket { document: self.document, mode: self.mode }
    }

    // --- Canvas ---

    /// Record where the canvas sits and how large it is.
    pub fn set_canvas(&mut self, origin: Point, dpr: f64, width: f64, height: f64) {
        self.input.canvas_origin = origin;
        self.input.dpr = dpr;
        self.input.canvas_width = width;
        self.input.canvas_height = height;
    }

    fn world_point(&self, client: Point, camera: Rect) -> Point {
        client_to_world(client, self.input.canvas_origin, self.input.dpr, ViewTransform::from_camera(camera))
    }

    // --- Mode ---

    /// Switch between editing and running. Entering run mode evaluates every
    /// script in a fresh sandbox; any gesture in progress is cancelled.
    pub fn set_mode(&mut self, mode: Mode) -> Vec<Action> {
        if mode == self.mode {
            return Vec::new();
        }
        let before = self.cursor.style();
        let actions = self.toggle_mode();
        self.finish(before, actions)
    }

    fn toggle_mode(&mut self) -> Vec<Action> {
        self.cancel_gesture();
        self.mode = self.mode.toggled();
        match self.mode {
            Mode::Running => {
                let frame = FrameSize { width: self.input.canvas_width, height: self.input.canvas_height };
                let failed = self.runtime.initialize_run(&self.scene, frame, &self.input.keys).len();
                tracing::info!(failed, "entered run mode");
            }
            Mode::Editing => {
                self.runtime.reset_clock();
                tracing::info!("entered editing mode");
            }
        }
        vec![Action::PreventDefault, Action::ModeChanged(self.mode), Action::RenderNeeded]
    }

    // --- Tools ---

    /// Arm a tool, or disarm it when it is already armed.
    pub fn set_tool(&mut self, tool: Tool) -> Vec<Action> {
        if self.mode == Mode::Running {
            return Vec::new();
        }
        let before = self.cursor.style();
        let armed = match tool {
            Tool::Text => CursorState::PlacingText,
            Tool::Box => CursorState::PlacingBox,
            Tool::Pan => CursorState::WillPan,
        };
        let was_armed = self.cursor == armed;
        self.cancel_gesture();
        if !was_armed {
            self.cursor = armed;
        }
        self.finish(before, vec![Action::RenderNeeded])
    }

    // --- Pointer ---

    pub fn on_pointer_down(&mut self, client: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        let before = self.cursor.style();
        let actions = match self.mode {
            Mode::Running => self.run_pointer_down(client, button),
            Mode::Editing => self.edit_pointer_down(client, button, modifiers),
        };
        self.finish(before, actions)
    }

    fn run_pointer_down(&mut self, client: Point, button: Button) -> Vec<Action> {
        if button != Button::Primary {
            return Vec::new();
        }
        let hit = {
            let scene = self.scene.borrow();
            scene.object_at(self.world_point(client, scene.camera.rect()))
        };
        let Some(id) = hit else {
            return Vec::new();
        };
        if let Err(err) = self.runtime.dispatch_click(&self.scene, id) {
            tracing::warn!(object = %id, error = %err, "click handler failed");
        }
        vec![Action::RenderNeeded]
    }

    fn edit_pointer_down(&mut self, client: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        match button {
            Button::Middle => {
                self.cancel_gesture();
                self.start_camera_move(client);
                return vec![Action::RenderNeeded];
            }
            Button::Secondary => return Vec::new(),
            Button::Primary => {}
        }

        let world = self.world_point(client, self.editor_camera);
        match self.cursor {
            CursorState::PlacingText => {
                self.scene.borrow_mut().add(SceneObject::text(world.x, world.y, DEFAULT_TEXT));
                self.cursor = CursorState::Idle;
                vec![Action::RenderNeeded]
            }
            CursorState::PlacingBox => {
                let rect = Rect::new(world.x, world.y, PLACED_BOX_SIZE, PLACED_BOX_SIZE);
                let mut scene = self.scene.borrow_mut();
                let id = scene.add(SceneObject::new_box(rect, DEFAULT_BOX_COLOR));
                if let Err(err) = scene.enable_physics(id) {
                    tracing::warn!(object = %id, error = %err, "placed box has no body");
                }
                self.cursor = CursorState::Idle;
                vec![Action::RenderNeeded]
            }
            CursorState::WillPan => {
                self.start_camera_move(client);
                vec![Action::RenderNeeded]
            }
            CursorState::Idle => self.idle_pointer_down(client, world, modifiers),
            CursorState::Moving { .. } | CursorState::Selecting { .. } | CursorState::Transforming { .. } => {
                Vec::new()
            }
        }
    }

    fn idle_pointer_down(&mut self, client: Point, world: Point, modifiers: Modifiers) -> Vec<Action> {
        let scene = self.scene.borrow();

        if let Some(id) = self.selection.single() {
            if let Some(start_rect) = scene.get(id).map(SceneObject::rect) {
                let bounds = start_rect.normalize();
                let grabbed = ResizeHandle::ALL.into_iter().find(|h| h.hit_rect(bounds, HANDLE_SIZE).contains_point(world));
                if let Some(handle) = grabbed {
                    self.cursor = CursorState::Transforming { object: id, handle, client_start: client, start_rect: bounds };
                    return vec![Action::RenderNeeded];
                }
            }
        }

        let Some(hit) = scene.object_at(world) else {
            self.cursor = CursorState::Selecting { canvas_start: world, client_start: client, size: Point::default() };
            return vec![Action::RenderNeeded];
        };

        let mut actions = Vec::new();
        if !self.selection.contains(hit) {
            let mut ids = if modifiers.shift { self.selection.ids().to_vec() } else { Vec::new() };
            ids.push(hit);
            self.selection = Selection::of(ids);
            actions.push(Action::SelectionChanged);
        }
        let targets = self
            .selection
            .ids()
            .iter()
            .filter_map(|id| {
                scene.get(*id).map(|o| MoveStart { target: MoveTarget::Object(*id), start: Point::new(o.x, o.y) })
            })
            .collect();
        self.cursor = CursorState::Moving { client_start: client, targets };
        actions.push(Action::RenderNeeded);
        actions
    }

    fn start_camera_move(&mut self, client: Point) {
        let start = Point::new(self.editor_camera.x, self.editor_camera.y);
        self.cursor =
            CursorState::Moving { client_start: client, targets: vec![MoveStart { target: MoveTarget::EditorCamera, start }] };
    }

    pub fn on_pointer_move(&mut self, client: Point) -> Vec<Action> {
        if self.mode == Mode::Running {
            return Vec::new();
        }
        let dpr = self.input.dpr;
        match &mut self.cursor {
            CursorState::Moving { client_start, targets } => {
                let delta = client.sub(*client_start).div(dpr).floor();
                move_targets(&self.scene, &mut self.editor_camera, targets, delta);
                vec![Action::RenderNeeded]
            }
            CursorState::Selecting { client_start, size, .. } => {
                *size = client.sub(*client_start).div(dpr);
                vec![Action::RenderNeeded]
            }
            CursorState::Transforming { object, handle, client_start, start_rect } => {
                let delta = client.sub(*client_start).div(dpr).floor();
                set_object_rect(&self.scene, *object, handle.resize(*start_rect, delta).normalize());
                vec![Action::RenderNeeded]
            }
            CursorState::Idle | CursorState::PlacingText | CursorState::PlacingBox | CursorState::WillPan => Vec::new(),
        }
    }

    pub fn on_pointer_up(&mut self, _client: Point) -> Vec<Action> {
        if self.mode == Mode::Running {
            return Vec::new();
        }
        let before = self.cursor.style();
        let marquee = self.cursor.marquee();
        let actions = match std::mem::take(&mut self.cursor) {
            CursorState::Moving { targets, .. } => {
                if let [MoveStart { target: MoveTarget::EditorCamera, .. }] = targets.as_slice() {
                    self.cursor = CursorState::WillPan;
                }
                vec![Action::RenderNeeded]
            }
            CursorState::Selecting { .. } => {
                let inside = marquee.map(|area| self.scene.borrow().objects_inside(area)).unwrap_or_default();
                self.selection = Selection::of(inside);
                vec![Action::SelectionChanged, Action::RenderNeeded]
            }
            CursorState::Transforming { .. } => vec![Action::RenderNeeded],
            other @ (CursorState::Idle | CursorState::PlacingText | CursorState::PlacingBox | CursorState::WillPan) => {
                self.cursor = other;
                Vec::new()
            }
        };
        self.finish(before, actions)
    }

    /// Context menu: abandon the current gesture.
    pub fn on_context_menu(&mut self) -> Vec<Action> {
        let before = self.cursor.style();
        self.cancel_gesture();
        self.finish(before, vec![Action::PreventDefault, Action::RenderNeeded])
    }

    /// Return to idle without committing: moves and resizes are put back to
    /// their starting geometry and a marquee selects nothing.
    fn cancel_gesture(&mut self) {
        match std::mem::take(&mut self.cursor) {
            CursorState::Moving { targets, .. } => {
                move_targets(&self.scene, &mut self.editor_camera, &targets, Point::default());
            }
            CursorState::Transforming { object, start_rect, .. } => set_object_rect(&self.scene, object, start_rect),
            CursorState::Idle
            | CursorState::Selecting { .. }
            | CursorState::PlacingText
            | CursorState::PlacingBox
            | CursorState::WillPan => {}
        }
    }

    /// Wheel pans the editor camera.
    pub fn on_wheel(&mut self, delta: Point) -> Vec<Action> {
        if self.mode == Mode::Running {
            return Vec::new();
        }
        self.editor_camera.x -= (delta.x / WHEEL_PAN_DIVISOR).round();
        self.editor_camera.y -= (delta.y / WHEEL_PAN_DIVISOR).round();
        vec![Action::PreventDefault, Action::RenderNeeded]
    }

    // --- Keyboard ---

    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers, location: KeyLocation, repeat: bool) -> Vec<Action> {
        self.input.keys.key_down(key, modifiers, location);
        if repeat {
            return Vec::new();
        }
        let before = self.cursor.style();
        let actions = if modifiers.cmd() && key.as_str() == "Enter" {
            self.toggle_mode()
        } else {
            match self.mode {
                Mode::Running => {
                    let failed = self.runtime.dispatch_keypress_to_all(&self.scene, key.as_str()).len();
                    tracing::trace!(key = key.as_str(), failed, "keypress dispatched");
                    vec![Action::PreventDefault, Action::RenderNeeded]
                }
                Mode::Editing => self.edit_key_down(key, modifiers),
            }
        };
        self.finish(before, actions)
    }

    pub fn on_key_up(&mut self, key: &Key, modifiers: Modifiers, location: KeyLocation) -> Vec<Action> {
        self.input.keys.key_up(key, modifiers, location);
        Vec::new()
    }

    fn edit_key_down(&mut self, key: &Key, modifiers: Modifiers) -> Vec<Action> {
        let cmd = modifiers.cmd();
        match key.as_str() {
            "Backspace" => self.delete_selection(),
            "Escape" => {
                self.cancel_gesture();
                let mut actions = vec![Action::RenderNeeded];
                if !self.selection.is_empty() {
                    self.selection = Selection::Idle;
                    actions.push(Action::SelectionChanged);
                }
                actions
            }
            "c" | "C" if cmd => self.copy_selection(),
            "v" | "V" if cmd => self.request_paste(),
            "s" | "S" if cmd => vec![Action::PreventDefault, Action::SaveRequested],
            "ArrowLeft" => self.nudge(-1.0, 0.0, modifiers.shift),
            "ArrowRight" => self.nudge(1.0, 0.0, modifiers.shift),
            "ArrowUp" => self.nudge(0.0, -1.0, modifiers.shift),
            "ArrowDown" => self.nudge(0.0, 1.0, modifiers.shift),
            " " => {
                self.editor_camera.x = 0.0;
                self.editor_camera.y = 0.0;
                vec![Action::PreventDefault, Action::RenderNeeded]
            }
            "Tab" => self.cycle_selection(modifiers.shift),
            "]" => self.restack(true),
            "[" => self.restack(false),
            _ => Vec::new(),
        }
    }

    fn delete_selection(&mut self) -> Vec<Action> {
        if self.selection.is_empty() {
            return Vec::new();
        }
        let mut scene = self.scene.borrow_mut();
        for id in self.selection.ids() {
            scene.remove(*id);
        }
        tracing::debug!(count = self.selection.ids().len(), "deleted selection");
        self.selection = Selection::Idle;
        vec![Action::SelectionChanged, Action::RenderNeeded]
    }

    /// Move the selection by one step, or pan the view when nothing is
    /// selected.
    fn nudge(&mut self, dx: f64, dy: f64, large: bool) -> Vec<Action> {
        let step = if large { NUDGE_STEP_LARGE } else { NUDGE_STEP };
        let (dx, dy) = (dx * step, dy * step);
        if self.selection.is_empty() {
            self.editor_camera.x -= dx;
            self.editor_camera.y -= dy;
        } else {
            let mut scene = self.scene.borrow_mut();
            for id in self.selection.ids() {
                if let Some(mut proxy) = scene.proxy(*id) {
                    let (x, y) = (proxy.x() + dx, proxy.y() + dy);
                    proxy.set_position(x, y);
                }
            }
        }
        vec![Action::PreventDefault, Action::RenderNeeded]
    }

    fn cycle_selection(&mut self, backwards: bool) -> Vec<Action> {
        let next = {
            let scene = self.scene.borrow();
            let current = self.selection.ids().first();
            let next = if backwards { scene.order().previous_before(current) } else { scene.order().next_after(current) };
            next.copied()
        };
        let Some(next) = next else {
            return vec![Action::PreventDefault];
        };
        self.selection = Selection::of(vec![next]);
        vec![Action::PreventDefault, Action::SelectionChanged, Action::RenderNeeded]
    }

    fn restack(&mut self, to_front: bool) -> Vec<Action> {
        if self.selection.is_empty() {
            return Vec::new();
        }
        let mut scene = self.scene.borrow_mut();
        let mut ids = self.selection.ids().to_vec();
        ids.sort_by_key(|id| scene.order().index_of(id));
        if to_front {
            for id in ids {
                scene.bring_to_front(id);
            }
        } else {
            for id in ids.into_iter().rev() {
                scene.send_to_back(id);
            }
        }
        vec![Action::RenderNeeded]
    }

    // --- Clipboard ---

    fn copy_selection(&self) -> Vec<Action> {
        let scene = self.scene.borrow();
        let Some(object) = self.selection.ids().first().and_then(|id| scene.get(*id)) else {
            return Vec::new();
        };
        if !matches!(object.kind, ObjectKind::Sprite(_)) {
            return Vec::new();
        }
        match doc::serialize_object(object) {
            Some(text) => vec![Action::PreventDefault, Action::CopyToClipboard { mime: CLIPBOARD_MIME, text }],
            None => Vec::new(),
        }
    }

    fn request_paste(&self) -> Vec<Action> {
        if self.tiles().is_none() {
            return Vec::new();
        }
        vec![Action::PreventDefault, Action::ReadClipboard(self.ticket())]
    }

    /// Paste sprites read from the clipboard. Items are taken in order up
    /// to the first one that isn't a sprite blob; the last pasted sprite
    /// becomes the selection.
    pub fn paste_clipboard(&mut self, ticket: AsyncTicket, items: &[ClipboardItem]) -> Vec<Action> {
        if ticket != self.ticket() {
            tracing::warn!(?ticket, current = ?self.ticket(), "dropping stale clipboard read");
            return Vec::new();
        }
        let AtlasSlot::Ready(tiles) = &self.atlas else {
            return Vec::new();
        };

        let mut pasted = None;
        for item in items {
            if item.mime != CLIPBOARD_MIME {
                break;
            }
            match doc::hydrate_clipboard_sprite(&item.text, Some(tiles)) {
                Ok(sprite) => pasted = Some(self.scene.borrow_mut().add(sprite)),
                Err(err) => {
                    tracing::debug!(error = %err, "clipboard item is not a sprite");
                    break;
                }
            }
        }

        let Some(id) = pasted else {
            return Vec::new();
        };
        self.selection = Selection::of(vec![id]);
        vec![Action::SelectionChanged, Action::RenderNeeded]
    }

    // --- Atlas ---

    /// Start loading an atlas. Sprites placed before it arrives are kept
    /// and created once it does.
    pub fn request_atlas(&mut self, url: impl Into<String>, sprite_size: u32) -> Vec<Action> {
        let url = url.into();
        let ticket = self.ticket();
        tracing::info!(url = %url, sprite_size, "atlas requested");
        let previous = self.take_scene_tiles();
        self.atlas = AtlasSlot::Loading {
            ticket,
            descriptor: TilesDescriptor { url: url.clone(), sprite_size },
            previous,
            pending_document: None,
            pending_sprites: Vec::new(),
        };
        vec![Action::LoadAtlas { url, sprite_size, ticket }]
    }

    fn awaits_atlas(&self, ticket: AsyncTicket, url: &str) -> bool {
        match &self.atlas {
            AtlasSlot::Loading { ticket: expected, descriptor, .. } => {
                expected.document == ticket.document && ticket.document == self.document && descriptor.url == url
            }
            AtlasSlot::Empty | AtlasSlot::Ready(_) => false,
        }
    }

    /// The host finished loading the atlas image at `url`.
    ///
    /// The new atlas is installed together with the document waiting on it.
    /// When either fails the previous atlas and scene stay in place. Sprites
    /// placed during the load are created against whichever atlas the slot
    /// ends up holding.
    ///
    /// # Errors
    ///
    /// Returns a [`TileError`] for an image that can't hold a single tile,
    /// or the hydration error of a document that was waiting on this atlas.
    pub fn atlas_loaded(
        &mut self,
        ticket: AsyncTicket,
        url: &str,
        image_width: u32,
        image_height: u32,
    ) -> Result<Vec<Action>, EngineError> {
        if !self.awaits_atlas(ticket, url) {
            tracing::warn!(url, ?ticket, document = self.document, "dropping stale atlas load");
            return Ok(Vec::new());
        }
        let AtlasSlot::Loading { descriptor, previous, pending_document, pending_sprites, .. } =
            std::mem::replace(&mut self.atlas, AtlasSlot::Empty)
        else {
            return Ok(Vec::new());
        };

        let tiles = match Tiles::new(descriptor.url, descriptor.sprite_size, image_width, image_height) {
            Ok(tiles) => tiles,
            Err(err) => {
                tracing::warn!(url, error = %err, "atlas image is unusable");
                self.settle_atlas(previous, pending_sprites);
                return Err(err.into());
            }
        };

        let document = match pending_document.as_deref().map(|text| doc::deserialize(text, Some(&tiles))).transpose() {
            Ok(document) => document,
            Err(err) => {
                tracing::warn!(url, error = %err, "document waiting on atlas failed to hydrate");
                self.settle_atlas(previous, pending_sprites);
                return Err(err.into());
            }
        };

        tracing::info!(url, tiles = tiles.len(), "atlas ready");
        let mut actions = document.map(|document| self.install_document(document)).unwrap_or_default();
        self.settle_atlas(Some(tiles), pending_sprites);
        actions.push(Action::RenderNeeded);
        Ok(actions)
    }

    /// The host could not load the atlas image. The atlas it would have
    /// replaced stays in use.
    pub fn atlas_failed(&mut self, ticket: AsyncTicket, url: &str, message: &str) {
        if !self.awaits_atlas(ticket, url) {
            return;
        }
        tracing::warn!(url, message, "atlas failed to load");
        if let AtlasSlot::Loading { previous, pending_sprites, .. } = std::mem::replace(&mut self.atlas, AtlasSlot::Empty) {
            self.settle_atlas(previous, pending_sprites);
        }
    }

    /// Install `tiles` as the ready atlas (or none) and create the sprites
    /// that were waiting on a load.
    fn settle_atlas(&mut self, tiles: Option<Tiles>, pending_sprites: Vec<PendingSprite>) {
        self.atlas = tiles.map_or(AtlasSlot::Empty, AtlasSlot::Ready);
        for PendingSprite { index, position } in pending_sprites {
            if let Err(err) = self.add_sprite(index, position) {
                tracing::warn!(index, error = %err, "dropping deferred sprite");
            }
        }
    }

    /// Empty the slot, returning the atlas the current scene is drawn from.
    fn take_scene_tiles(&mut self) -> Option<Tiles> {
        match std::mem::replace(&mut self.atlas, AtlasSlot::Empty) {
            AtlasSlot::Ready(tiles) => Some(tiles),
            AtlasSlot::Loading { previous, .. } => previous,
            AtlasSlot::Empty => None,
        }
    }

    /// Place tile `index` at world `position`, deferring it while the atlas
    /// is still loading.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NoAtlas`] when no atlas was requested, or a
    /// [`TileError`] for an index outside the atlas.
    pub fn place_sprite(&mut self, index: usize, position: Point) -> Result<Vec<Action>, EngineError> {
        if let AtlasSlot::Loading { pending_sprites, .. } = &mut self.atlas {
            pending_sprites.push(PendingSprite { index, position });
            return Ok(Vec::new());
        }
        self.add_sprite(index, position)?;
        Ok(vec![Action::RenderNeeded])
    }

    fn add_sprite(&self, index: usize, position: Point) -> Result<ObjectId, EngineError> {
        let tiles = self.tiles().ok_or(EngineError::NoAtlas)?;
        let sprite = SceneObject::sprite(tiles, index, position.x, position.y)?;
        Ok(self.scene.borrow_mut().add(sprite))
    }

    // --- Documents ---

    /// Serialize the current scene as a `Doc_V1` document.
    ///
    /// # Errors
    ///
    /// Returns [`DocError::Json`] if encoding fails.
    pub fn document_text(&self, pretty: bool) -> Result<String, EngineError> {
        Ok(doc::serialize_document(&self.scene.borrow(), self.scene_tiles(), pretty)?)
    }

    /// Replace the scene with a document. When the document names an atlas
    /// other than the loaded one, that atlas is requested first and the
    /// document hydrates once it arrives.
    ///
    /// # Errors
    ///
    /// Returns the [`DocError`] of a malformed document; the current scene
    /// is kept.
    pub fn load_document_text(&mut self, text: &str) -> Result<Vec<Action>, EngineError> {
        let Some(descriptor) = doc::peek_tiles(text)? else {
            return self.hydrate_document(text);
        };
        if self.tiles().is_some_and(|t| TilesDescriptor::from(t) == descriptor) {
            return self.hydrate_document(text);
        }

        let ticket = self.ticket();
        tracing::info!(url = %descriptor.url, "document waits for its atlas");
        let action = Action::LoadAtlas { url: descriptor.url.clone(), sprite_size: descriptor.sprite_size, ticket };
        let previous = self.take_scene_tiles();
        self.atlas = AtlasSlot::Loading {
            ticket,
            descriptor,
            previous,
            pending_document: Some(text.to_owned()),
            pending_sprites: Vec::new(),
        };
        Ok(vec![action])
    }

    fn hydrate_document(&mut self, text: &str) -> Result<Vec<Action>, EngineError> {
        let document = doc::deserialize(text, self.tiles())?;
        Ok(self.install_document(document))
    }

    fn install_document(&mut self, mut document: Document) -> Vec<Action> {
        document.scene.debug_boxes = self.config.debug_boxes;
        let objects = document.scene.len();
        *self.scene.borrow_mut() = document.scene;

        self.document += 1;
        self.cursor = CursorState::Idle;
        self.selection = Selection::Idle;
        let mut actions = vec![Action::SelectionChanged, Action::SetCursor(CursorStyle::Unset)];
        if self.mode == Mode::Running {
            self.mode = Mode::Editing;
            self.runtime.reset_clock();
            actions.push(Action::ModeChanged(Mode::Editing));
        }
        tracing::info!(document = self.document, objects, "document loaded");
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Save the document under the configured key.
    ///
    /// # Errors
    ///
    /// Propagates serialization and store failures.
    pub fn save(
        &self,
        store: &mut dyn DocumentStore,
        confirm_overwrite: impl FnOnce() -> bool,
    ) -> Result<SaveOutcome, EngineError> {
        let text = self.document_text(false)?;
        Ok(storage::save_document(store, &self.config.storage_key, &text, confirm_overwrite)?)
    }

    /// Load the document saved under the configured key.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] when nothing is saved, or the
    /// document's hydration error.
    pub fn load(&mut self, store: &dyn DocumentStore) -> Result<Vec<Action>, EngineError> {
        let text = storage::load_document(store, &self.config.storage_key)?;
        self.load_document_text(&text)
    }

    /// Whether a document is saved under the configured key.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn has_saved_document(&self, store: &dyn DocumentStore) -> Result<bool, EngineError> {
        Ok(storage::has_document(store, &self.config.storage_key)?)
    }

    // --- Frame ---

    /// Advance one animation frame and draw it. In running mode this runs
    /// the frame loop first; editing mode only draws.
    ///
    /// # Errors
    ///
    /// Returns the first painter failure.
    pub fn tick(&mut self, now_ms: f64, painter: &mut dyn Painter) -> Result<(), RenderError> {
        if self.mode == Mode::Running {
            let failed = self.runtime.run_frame(&self.scene, now_ms).len();
            if failed > 0 {
                tracing::debug!(failed, "frame had handler failures");
            }
        }
        self.render(painter)
    }

    /// Draw the scene through the camera for the current mode.
    ///
    /// # Errors
    ///
    /// Returns the first painter failure.
    pub fn render(&self, painter: &mut dyn Painter) -> Result<(), RenderError> {
        let mut scene = self.scene.borrow_mut();
        let camera = match self.mode {
            Mode::Running => scene.camera.rect(),
            Mode::Editing => self.editor_camera,
        };
        let viewport = Viewport { camera, width: self.input.canvas_width, height: self.input.canvas_height };
        render::render_scene(painter, &mut scene, self.scene_tiles(), viewport)?;
        if self.mode == Mode::Editing {
            render::render_editing_overlay(painter, &scene, &self.selection, &self.cursor)?;
        }
        Ok(())
    }

    fn finish(&self, before: CursorStyle, mut actions: Vec<Action>) -> Vec<Action> {
        let after = self.cursor.style();
        if after != before {
            actions.push(Action::SetCursor(after));
        }
        actions
    }
}

// --- Gesture helpers ---

/// Put every target at its start position plus `delta`. Objects move
/// through their proxy so attached bodies follow.
fn move_targets(scene: &SceneHandle, camera: &mut Rect, targets: &[MoveStart], delta: Point) {
    let mut scene = scene.borrow_mut();
    for MoveStart { target, start } in targets {
        let to = start.add(delta);
        match target {
            MoveTarget::Object(id) => {
                if let Some(mut proxy) = scene.proxy(*id) {
                    proxy.set_position(to.x, to.y);
                }
            }
            MoveTarget::EditorCamera => {
                camera.x = to.x;
                camera.y = to.y;
            }
        }
    }
}

fn set_object_rect(scene: &SceneHandle, id: ObjectId, rect: Rect) {
    let mut scene = scene.borrow_mut();
    if let Some(mut proxy) = scene.proxy(id) {
        proxy.set_position(rect.x, rect.y);
        proxy.set_width(rect.width);
        proxy.set_height(rect.height);
    }
}
