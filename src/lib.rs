//! Playfield: a small 2D scene editor and runtime.
//!
//! A scene holds sprites, boxes and text labels. In editing mode the user
//! arranges them with the mouse and keyboard; in running mode each object's
//! script runs in its own sandbox against an embedded interpreter, and
//! objects with physics are simulated by a rigid-body world. Documents are
//! saved as tagged JSON.
//!
//! The core is host-agnostic and tested natively. The browser adapter lives
//! behind the `web` feature.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | [`engine::EngineCore`]: cursor state machine, keyboard, clipboard, atlas, mode switching |
//! | [`scene`] | Objects in paint order, run camera, physics world, user-id index |
//! | [`object`] | Scene object variants and their serial form |
//! | [`ordered_set`] | Insertion-ordered set used for paint order |
//! | [`sandbox`] | Per-object event registries and the script-facing accessor |
//! | [`script`] | Embedded interpreter: run initialization and event triggers |
//! | [`runtime`] | Running-mode frame loop |
//! | [`physics`] | Rigid-body world over `rapier2d` |
//! | [`render`] | Painter seam and scene rendering |
//! | [`input`] | Modes, keys, selection, cursor states |
//! | [`camera`] | Points and camera/client coordinate conversion |
//! | [`rect`] | Rectangle geometry |
//! | [`tiles`] | Sprite atlas slicing |
//! | [`doc`] | `Doc_V1` documents and clipboard blobs |
//! | [`storage`] | Key-value document persistence |
//! | [`config`] | Engine configuration from the environment |
//! | [`consts`] | Shared constants |
//! | `web` | Browser adapter (feature `web`) |

pub mod camera;
pub mod config;
pub mod consts;
pub mod doc;
pub mod engine;
pub mod input;
pub mod object;
pub mod ordered_set;
pub mod physics;
pub mod rect;
pub mod render;
pub mod runtime;
pub mod sandbox;
pub mod scene;
pub mod script;
pub mod storage;
pub mod tiles;
#[cfg(feature = "web")]
pub mod web;
