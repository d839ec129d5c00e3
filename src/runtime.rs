//! Running-mode frame loop.
//!
//! One frame runs, in order: the frame event on every object, a physics step
//! by the wall-clock delta since the previous frame, and the commit of body
//! positions back onto their objects. Rendering follows in the caller. A
//! frame handler therefore always observes the positions committed at the end
//! of the previous frame.

#[cfg(test)]
#[path = "runtime_test.rs"]
mod runtime_test;

use crate::consts::NOMINAL_FRAME_SECS;
use crate::input::PressedKeys;
use crate::object::ObjectId;
use crate::scene::SceneHandle;
use crate::script::{FrameSize, ScriptError, ScriptHost};

pub struct Runtime {
    scripts: ScriptHost,
    /// Timestamp of the previous frame, in milliseconds.
    last_time_ms: Option<f64>,
}

impl Runtime {
    #[must_use]
    pub fn new(max_script_operations: u64) -> Self {
        Self { scripts: ScriptHost::new(max_script_operations), last_time_ms: None }
    }

    #[must_use]
    pub fn scripts(&self) -> &ScriptHost {
        &self.scripts
    }

    /// Prepare `scene` for running: put bodies back on their objects, rebuild
    /// the id index, and evaluate every script in a fresh sandbox.
    ///
    /// Script failures are logged and returned; the objects that failed
    /// simply have no handlers.
    pub fn initialize_run(&mut self, scene: &SceneHandle, frame: FrameSize, keys: &PressedKeys) -> Vec<ScriptError> {
        self.reset_clock();
        {
            let mut scene = scene.borrow_mut();
            scene.reset_bodies();
            scene.rebuild_id_index();
        }
        let errors = self.scripts.initialize_run(scene, frame, keys);
        for err in &errors {
            tracing::warn!(object = %err.object(), error = %err, "script initialization failed");
        }
        tracing::info!(objects = scene.borrow().len(), failed = errors.len(), "run initialized");
        errors
    }

    /// Forget the previous frame timestamp so the next frame uses the
    /// nominal delta.
    pub fn reset_clock(&mut self) {
        self.last_time_ms = None;
    }

    /// Run one frame at `now_ms`. Returns the handler failures; each is
    /// logged and the remaining objects still run.
    pub fn run_frame(&mut self, scene: &SceneHandle, now_ms: f64) -> Vec<ScriptError> {
        let errors = self.dispatch_frame_to_all(scene);

        let dt_secs = match self.last_time_ms {
            Some(last) => (now_ms - last) / 1000.0,
            None => NOMINAL_FRAME_SECS,
        };
        self.last_time_ms = Some(now_ms);

        let mut scene = scene.borrow_mut();
        scene.step_physics(dt_secs);
        scene.commit_physics();
        errors
    }

    fn dispatch_frame_to_all(&self, scene: &SceneHandle) -> Vec<ScriptError> {
        let ids = scene.borrow().ids();
        let mut errors = Vec::new();
        for id in ids {
            if let Err(err) = self.scripts.trigger_frame(scene, id) {
                tracing::warn!(object = %id, error = %err, "frame handler failed");
                errors.push(err);
            }
        }
        errors
    }

    /// Run the click handlers of `object`.
    ///
    /// # Panics
    ///
    /// Panics if `object` is not in the scene; clicks are only dispatched to
    /// objects found by hit testing.
    ///
    /// # Errors
    ///
    /// Returns the first handler failure.
    pub fn dispatch_click(&self, scene: &SceneHandle, object: ObjectId) -> Result<(), ScriptError> {
        assert!(scene.borrow().contains(object), "clicked object {object} is not in the scene");
        self.scripts.trigger_click(scene, object)
    }

    /// Send a keypress to every object, in paint order.
    pub fn dispatch_keypress_to_all(&self, scene: &SceneHandle, key: &str) -> Vec<ScriptError> {
        let ids = scene.borrow().ids();
        let mut errors = Vec::new();
        for id in ids {
            if let Err(err) = self.scripts.trigger_keypress(scene, id, key) {
                tracing::warn!(object = %id, key, error = %err, "keypress handler failed");
                errors.push(err);
            }
        }
        errors
    }
}
