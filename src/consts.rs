//! Shared constants for the playfield crate.

// ── Frame loop ──────────────────────────────────────────────────

/// Physics delta used on the first running frame, before any timestamp exists.
pub const NOMINAL_FRAME_SECS: f64 = 1.0 / 60.0;

// ── Objects ─────────────────────────────────────────────────────

/// Script installed on every freshly constructed object.
pub const DEFAULT_SCRIPT: &str = "this.on_click(|| { this.x = 0.0; });";

/// Fill color for boxes created without an explicit color.
pub const DEFAULT_BOX_COLOR: &str = "green";

/// Text color for new text objects.
pub const DEFAULT_TEXT_COLOR: &str = "red";

/// Content of a text object placed with the text tool.
pub const DEFAULT_TEXT: &str = "hello world";

/// Side length of a box placed with the box tool, in world units.
pub const PLACED_BOX_SIZE: f64 = 32.0;

// ── Atlas ───────────────────────────────────────────────────────

pub const DEFAULT_ATLAS_URL: &str = "/sprites.png";
pub const DEFAULT_SPRITE_SIZE: u32 = 32;

/// Separator between atlas URL and tile index in a serialized sprite reference.
pub const SPRITE_REF_SEPARATOR: char = '@';

// ── Canvas ──────────────────────────────────────────────────────

pub const DEFAULT_CANVAS_WIDTH: f64 = 300.0;
pub const DEFAULT_CANVAS_HEIGHT: f64 = 150.0;

pub const BACKGROUND_COLOR: &str = "#292A2D";
pub const CAMERA_OUTLINE_COLOR: &str = "green";
pub const DEBUG_BODY_COLOR: &str = "blue";
pub const DEBUG_SPRITE_COLOR: &str = "red";
pub const SELECTION_COLOR: &str = "white";
pub const MARQUEE_COLOR: &str = "rgba(99, 99, 255, 0.5)";

/// Side length of a selection corner handle, in world units.
pub const HANDLE_SIZE: f64 = 10.0;

// ── Keyboard ────────────────────────────────────────────────────

/// Arrow-key nudge distance, in world units.
pub const NUDGE_STEP: f64 = 1.0;

/// Arrow-key nudge distance while Shift is held.
pub const NUDGE_STEP_LARGE: f64 = 10.0;

/// Wheel deltas are divided by this before panning the editor camera.
pub const WHEEL_PAN_DIVISOR: f64 = 2.0;

// ── Persistence ─────────────────────────────────────────────────

pub const DEFAULT_STORAGE_KEY: &str = "boomer-doc";

/// Suffix of the marker key written next to a saved document.
pub const STORAGE_EXISTS_SUFFIX: &str = "-exists";

/// MIME type used for clipboard interop.
pub const CLIPBOARD_MIME: &str = "text/plain";

// ── Scripting ───────────────────────────────────────────────────

/// Upper bound on interpreter operations per script call.
pub const DEFAULT_SCRIPT_MAX_OPERATIONS: u64 = 1_000_000;
