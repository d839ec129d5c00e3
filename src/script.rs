//! Embedded scripting host.
//!
//! Each object's script becomes the body of an entry function taking
//! `frame`, `objects` and `keyboard`, called with `this` bound to the object.
//! Scripts register handlers through `this.on_click(..)`, `this.on_frame(..)`
//! and `this.on_keypress(..)`; triggers later call those handlers with `this`
//! bound the same way.
//!
//! `this.angle_to_object(o)` measures in screen space with +y down: `-90.0`
//! means `o` is straight above.
//!
//! The only surface registered with the interpreter is the one below. Script
//! handles reach the scene through a `Weak`: captured handles end up stored in
//! the scene's own sandboxes, and a strong reference would keep the scene
//! alive forever.
//!
//! No scene borrow is ever held while a script runs. Script-side accessors
//! borrow for the duration of a single field read or write.

#[cfg(test)]
#[path = "script_test.rs"]
mod script_test;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use rhai::{AST, Array, CallFnOptions, Dynamic, Engine, EvalAltResult, FLOAT, FnPtr, INT, ImmutableString, Map, Scope};

use crate::input::PressedKeys;
use crate::object::{ObjectId, SceneObject};
use crate::rect::{rect_center, rect_overlap, vector_from_a_to_b};
use crate::sandbox::{ObjectProxy, SandboxEvent};
use crate::scene::{Scene, SceneHandle};

const ENTRY_FN: &str = "playfield_entry";

type RhaiResult<T> = Result<T, Box<EvalAltResult>>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptError {
    #[error("script for object {object} does not compile: {message}")]
    Compile { object: ObjectId, message: String },
    #[error("script for object {object} failed: {message}")]
    Runtime { object: ObjectId, message: String },
    #[error("no object {0} in scene")]
    UnknownObject(ObjectId),
}

impl ScriptError {
    #[must_use]
    pub fn object(&self) -> ObjectId {
        match self {
            Self::Compile { object, .. } | Self::Runtime { object, .. } | Self::UnknownObject(object) => *object,
        }
    }
}

/// Canvas size handed to scripts as `frame`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSize {
    pub width: f64,
    pub height: f64,
}

impl FrameSize {
    fn to_map(self) -> Map {
        let mut map = Map::new();
        map.insert("width".into(), Dynamic::from_float(self.width));
        map.insert("height".into(), Dynamic::from_float(self.height));
        map
    }
}

// ── Script-facing types ─────────────────────────────────────────

/// `this` and the values `objects.find` returns.
#[derive(Clone)]
pub struct ScriptObject {
    object: ObjectId,
    scene: Weak<RefCell<Scene>>,
}

impl ScriptObject {
    fn new(object: ObjectId, scene: &SceneHandle) -> Self {
        Self { object, scene: Rc::downgrade(scene) }
    }

    fn scene(&self) -> RhaiResult<SceneHandle> {
        self.scene.upgrade().ok_or_else(|| "scene has been dropped".into())
    }

    fn read<T>(&self, f: impl FnOnce(&SceneObject) -> T) -> RhaiResult<T> {
        let handle = self.scene()?;
        let scene = handle.try_borrow().map_err(|e| e.to_string())?;
        let object = scene.get(self.object).ok_or_else(|| format!("object {} is no longer in the scene", self.object))?;
        Ok(f(object))
    }

    fn write<T>(&self, f: impl FnOnce(&mut ObjectProxy<'_>) -> T) -> RhaiResult<T> {
        let handle = self.scene()?;
        let mut scene = handle.try_borrow_mut().map_err(|e| e.to_string())?;
        let mut proxy = scene.proxy(self.object).ok_or_else(|| format!("object {} is no longer in the scene", self.object))?;
        Ok(f(&mut proxy))
    }

    fn get_x(&mut self) -> RhaiResult<FLOAT> {
        self.read(|o| o.x)
    }

    fn set_x(&mut self, v: FLOAT) -> RhaiResult<()> {
        self.write(|p| p.set_x(v))
    }

    fn get_y(&mut self) -> RhaiResult<FLOAT> {
        self.read(|o| o.y)
    }

    fn set_y(&mut self, v: FLOAT) -> RhaiResult<()> {
        self.write(|p| p.set_y(v))
    }

    fn get_width(&mut self) -> RhaiResult<FLOAT> {
        self.read(|o| o.width)
    }

    fn set_width(&mut self, v: FLOAT) -> RhaiResult<()> {
        self.write(|p| p.set_width(v))
    }

    fn get_height(&mut self) -> RhaiResult<FLOAT> {
        self.read(|o| o.height)
    }

    fn set_height(&mut self, v: FLOAT) -> RhaiResult<()> {
        self.write(|p| p.set_height(v))
    }

    fn get_id(&mut self) -> RhaiResult<Dynamic> {
        self.read(|o| o.id.clone().map_or(Dynamic::UNIT, Dynamic::from))
    }

    fn set_id(&mut self, v: ImmutableString) -> RhaiResult<()> {
        self.write(|p| p.set_id(Some(v.to_string())))
    }

    fn clear_id(&mut self, _: ()) -> RhaiResult<()> {
        self.write(|p| p.set_id(None))
    }

    fn on_click(&mut self, handler: FnPtr) -> RhaiResult<()> {
        self.write(|p| p.on(SandboxEvent::Click, handler))
    }

    fn on_frame(&mut self, handler: FnPtr) -> RhaiResult<()> {
        self.write(|p| p.on(SandboxEvent::Frame, handler))
    }

    fn on_keypress(&mut self, handler: FnPtr) -> RhaiResult<()> {
        self.write(|p| p.on(SandboxEvent::Keypress, handler))
    }

    fn get_rect(&mut self) -> RhaiResult<Array> {
        self.read(|o| {
            let r = o.rect();
            vec![Dynamic::from_float(r.x), Dynamic::from_float(r.y), Dynamic::from_float(r.width), Dynamic::from_float(r.height)]
        })
    }

    fn is_colliding(&mut self, other: ScriptObject) -> RhaiResult<bool> {
        let other = other.read(SceneObject::rect)?;
        self.write(|p| p.is_colliding(other))
    }

    fn angle_to_object(&mut self, other: ScriptObject) -> RhaiResult<FLOAT> {
        let other = other.read(SceneObject::rect)?;
        self.write(|p| p.angle_to_object(other))
    }

    fn cardinal_direction_to_object(&mut self, other: ScriptObject) -> RhaiResult<ImmutableString> {
        let other = other.read(SceneObject::rect)?;
        self.write(|p| p.cardinal_direction_to_object(other).as_str().into())
    }

    fn to_display(&mut self) -> String {
        format!("Object({})", self.object)
    }
}

macro_rules! int_setter {
    ($name:ident, $target:ident) => {
        #[allow(clippy::cast_precision_loss)]
        fn $name(o: &mut ScriptObject, v: INT) -> RhaiResult<()> {
            o.$target(v as FLOAT)
        }
    };
}

int_setter!(set_x_int, set_x);
int_setter!(set_y_int, set_y);
int_setter!(set_width_int, set_width);
int_setter!(set_height_int, set_height);

/// The `objects` namespace.
#[derive(Clone)]
pub struct ScriptObjects {
    scene: Weak<RefCell<Scene>>,
}

impl ScriptObjects {
    fn find(&mut self, id: &str) -> RhaiResult<Dynamic> {
        let handle = self.scene.upgrade().ok_or("scene has been dropped")?;
        let found = handle.try_borrow().map_err(|e| e.to_string())?.find_by_user_id(id);
        Ok(found.map_or(Dynamic::UNIT, |object| Dynamic::from(ScriptObject::new(object, &handle))))
    }

    #[allow(clippy::unused_self)]
    fn are_colliding(&mut self, a: ScriptObject, b: ScriptObject) -> RhaiResult<bool> {
        Ok(rect_overlap(a.read(SceneObject::rect)?, b.read(SceneObject::rect)?))
    }

    /// Angle between the two centers, or `()` when they don't overlap.
    #[allow(clippy::unused_self)]
    fn find_collision_angle(&mut self, a: ScriptObject, b: ScriptObject) -> RhaiResult<Dynamic> {
        let (ar, br) = (a.read(SceneObject::rect)?, b.read(SceneObject::rect)?);
        if !rect_overlap(ar, br) {
            return Ok(Dynamic::UNIT);
        }
        Ok(Dynamic::from_float(vector_from_a_to_b(rect_center(ar), rect_center(br)).1))
    }
}

/// The `keyboard` namespace.
#[derive(Clone)]
pub struct Keyboard {
    keys: PressedKeys,
}

impl Keyboard {
    fn is_pressed(&mut self, key: &str) -> bool {
        self.keys.is_pressed(key)
    }

    fn is_pressed2(&mut self, a: &str, b: &str) -> bool {
        self.keys.all_pressed(&[a, b])
    }

    fn is_pressed3(&mut self, a: &str, b: &str, c: &str) -> bool {
        self.keys.all_pressed(&[a, b, c])
    }

    fn is_pressed_all(&mut self, keys: Array) -> bool {
        keys.into_iter().all(|k| k.into_immutable_string().is_ok_and(|k| self.keys.is_pressed(&k)))
    }
}

fn register_api(engine: &mut Engine) {
    engine.register_type_with_name::<ScriptObject>("Object");
    engine.register_get_set("x", ScriptObject::get_x, ScriptObject::set_x);
    engine.register_get_set("y", ScriptObject::get_y, ScriptObject::set_y);
    engine.register_get_set("width", ScriptObject::get_width, ScriptObject::set_width);
    engine.register_get_set("height", ScriptObject::get_height, ScriptObject::set_height);
    engine.register_set("x", set_x_int);
    engine.register_set("y", set_y_int);
    engine.register_set("width", set_width_int);
    engine.register_set("height", set_height_int);
    engine.register_get("id", ScriptObject::get_id);
    engine.register_set("id", ScriptObject::set_id);
    engine.register_set("id", ScriptObject::clear_id);
    engine.register_fn("on_click", ScriptObject::on_click);
    engine.register_fn("on_frame", ScriptObject::on_frame);
    engine.register_fn("on_keypress", ScriptObject::on_keypress);
    engine.register_fn("get_rect", ScriptObject::get_rect);
    engine.register_fn("is_colliding", ScriptObject::is_colliding);
    engine.register_fn("angle_to_object", ScriptObject::angle_to_object);
    engine.register_fn("cardinal_direction_to_object", ScriptObject::cardinal_direction_to_object);
    engine.register_fn("to_string", ScriptObject::to_display);
    engine.register_fn("to_debug", ScriptObject::to_display);

    engine.register_type_with_name::<ScriptObjects>("Objects");
    engine.register_fn("find", ScriptObjects::find);
    engine.register_fn("are_colliding", ScriptObjects::are_colliding);
    engine.register_fn("find_collision_angle", ScriptObjects::find_collision_angle);

    engine.register_type_with_name::<Keyboard>("Keyboard");
    engine.register_fn("is_pressed", Keyboard::is_pressed);
    engine.register_fn("is_pressed", Keyboard::is_pressed2);
    engine.register_fn("is_pressed", Keyboard::is_pressed3);
    engine.register_fn("is_pressed", Keyboard::is_pressed_all);
}

// ── Host ────────────────────────────────────────────────────────

/// Owns the interpreter and runs scripts and handlers against a scene.
pub struct ScriptHost {
    engine: Engine,
}

impl ScriptHost {
    #[must_use]
    pub fn new(max_operations: u64) -> Self {
        let mut engine = Engine::new();
        engine.set_max_operations(max_operations);
        engine.on_print(|text| tracing::info!(target: "script", "{text}"));
        engine.on_debug(|text, source, pos| {
            tracing::debug!(target: "script", source = source.unwrap_or_default(), position = %pos, "{text}");
        });
        register_api(&mut engine);
        Self { engine }
    }

    /// Compile `source` as the body of the entry function.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::Compile`] on a syntax error.
    pub fn compile(&self, object: ObjectId, source: &str) -> Result<AST, ScriptError> {
        let wrapped = format!("fn {ENTRY_FN}(frame, objects, keyboard) {{\n{source}\n}}");
        self.engine.compile(wrapped).map_err(|e| ScriptError::Compile { object, message: e.to_string() })
    }

    /// Compile `object`'s script into its sandbox and evaluate it once.
    ///
    /// # Errors
    ///
    /// Returns an error if the object is missing or its script fails to
    /// compile or throws.
    pub fn initialize_object(
        &self,
        scene: &SceneHandle,
        object: ObjectId,
        frame: FrameSize,
        keys: &PressedKeys,
    ) -> Result<(), ScriptError> {
        let source = scene.borrow().get(object).map(|o| o.script.clone()).ok_or(ScriptError::UnknownObject(object))?;
        let program = Rc::new(self.compile(object, &source)?);
        scene
            .borrow_mut()
            .get_mut(object)
            .ok_or(ScriptError::UnknownObject(object))?
            .sandbox
            .install_program(Rc::clone(&program));

        let weak = Rc::downgrade(scene);
        let args = (
            Dynamic::from_map(frame.to_map()),
            Dynamic::from(ScriptObjects { scene: weak }),
            Dynamic::from(Keyboard { keys: keys.clone() }),
        );
        let mut this = Dynamic::from(ScriptObject::new(object, scene));
        let options = CallFnOptions::new().eval_ast(false).bind_this_ptr(&mut this);
        self.engine
            .call_fn_with_options::<Dynamic>(options, &mut Scope::new(), &program, ENTRY_FN, args)
            .map_err(|e| ScriptError::Runtime { object, message: e.to_string() })?;
        Ok(())
    }

    /// Discard every sandbox, then initialize each object in paint order.
    ///
    /// Failures don't stop the remaining objects; they're returned in order.
    pub fn initialize_run(&self, scene: &SceneHandle, frame: FrameSize, keys: &PressedKeys) -> Vec<ScriptError> {
        scene.borrow_mut().reset_sandboxes();
        let ids = scene.borrow().ids();
        ids.into_iter().filter_map(|id| self.initialize_object(scene, id, frame, keys).err()).collect()
    }

    /// # Errors
    ///
    /// Returns the first handler failure; later handlers don't run.
    pub fn trigger_click(&self, scene: &SceneHandle, object: ObjectId) -> Result<(), ScriptError> {
        self.trigger(scene, object, SandboxEvent::Click, &[])
    }

    /// # Errors
    ///
    /// Returns the first handler failure; later handlers don't run.
    pub fn trigger_frame(&self, scene: &SceneHandle, object: ObjectId) -> Result<(), ScriptError> {
        self.trigger(scene, object, SandboxEvent::Frame, &[])
    }

    /// Call keypress handlers with `#{ key: .. }`.
    ///
    /// # Errors
    ///
    /// Returns the first handler failure; later handlers don't run.
    pub fn trigger_keypress(&self, scene: &SceneHandle, object: ObjectId, key: &str) -> Result<(), ScriptError> {
        let mut evt = Map::new();
        evt.insert("key".into(), Dynamic::from(key.to_owned()));
        self.trigger(scene, object, SandboxEvent::Keypress, &[Dynamic::from_map(evt)])
    }

    fn trigger(&self, scene: &SceneHandle, object: ObjectId, event: SandboxEvent, args: &[Dynamic]) -> Result<(), ScriptError> {
        let (program, handlers) = {
            let scene = scene.borrow();
            let sandbox = scene.get(object).ok_or(ScriptError::UnknownObject(object))?.sandbox();
            (sandbox.program(), sandbox.handlers(event).to_vec())
        };
        let Some(program) = program else {
            return Ok(());
        };
        for handler in &handlers {
            self.call_handler(scene, object, &program, handler, args)
                .map_err(|e| ScriptError::Runtime { object, message: e.to_string() })?;
        }
        Ok(())
    }

    /// Call one handler with its curried captures followed by as many event
    /// arguments as its declared arity accepts.
    fn call_handler(
        &self,
        scene: &SceneHandle,
        object: ObjectId,
        program: &AST,
        handler: &FnPtr,
        args: &[Dynamic],
    ) -> RhaiResult<()> {
        let name = handler.fn_name();
        let curried = handler.curry().len();
        let take = program
            .iter_functions()
            .filter(|f| f.name == name)
            .map(|f| f.params.len())
            .filter(|n| (curried..=curried + args.len()).contains(n))
            .max()
            .map_or(args.len(), |n| n - curried);

        let mut call_args: Vec<Dynamic> = handler.curry().to_vec();
        call_args.extend(args.iter().take(take).cloned());

        let mut this = Dynamic::from(ScriptObject::new(object, scene));
        let options = CallFnOptions::new().eval_ast(false).bind_this_ptr(&mut this);
        self.engine.call_fn_with_options::<Dynamic>(options, &mut Scope::new(), program, name, call_args)?;
        Ok(())
    }
}
