//! Rigid-body simulation over `rapier2d`.
//!
//! The world runs with zero gravity. A body's translation is the top-left
//! corner of the object it mirrors; its box collider is offset by half
//! extents so collisions line up with the drawn rect.

#[cfg(test)]
#[path = "physics_test.rs"]
mod physics_test;

use rapier2d::prelude::{
    CCDSolver, ColliderBuilder, ColliderSet, DefaultBroadPhase, ImpulseJointSet, IntegrationParameters, IslandManager,
    MultibodyJointSet, NarrowPhase, PhysicsPipeline, QueryPipeline, Real, RigidBodyBuilder, RigidBodyHandle,
    RigidBodySet, Vector,
};

use crate::camera::Point;

/// Non-owning handle to a body in the [`PhysicsWorld`].
pub type BodyHandle = RigidBodyHandle;

/// Smallest half extent given to a collider, so zero-sized objects still collide.
const MIN_HALF_EXTENT: f64 = 0.5;

pub struct PhysicsWorld {
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    gravity: Vector<Real>,
    integration_params: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
}

impl std::fmt::Debug for PhysicsWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicsWorld").field("bodies", &self.rigid_body_set.len()).finish_non_exhaustive()
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(clippy::cast_possible_truncation)]
fn real(v: f64) -> Real {
    v as Real
}

/// `v` as a body stores it. Bodies keep single-precision coordinates.
#[must_use]
pub fn body_precision(v: f64) -> f64 {
    f64::from(real(v))
}

impl PhysicsWorld {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            gravity: Vector::new(0.0, 0.0),
            integration_params: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
        }
    }

    /// Insert a dynamic, non-rotating box body with its top-left at `(x, y)`.
    pub fn add_box_body(&mut self, x: f64, y: f64, width: f64, height: f64) -> BodyHandle {
        let hw = real((width.abs() / 2.0).max(MIN_HALF_EXTENT));
        let hh = real((height.abs() / 2.0).max(MIN_HALF_EXTENT));
        let body = RigidBodyBuilder::dynamic().translation(Vector::new(real(x), real(y))).lock_rotations().build();
        let handle = self.rigid_body_set.insert(body);
        let collider = ColliderBuilder::cuboid(hw, hh).translation(Vector::new(hw, hh)).build();
        self.collider_set.insert_with_parent(collider, handle, &mut self.rigid_body_set);
        handle
    }

    /// Remove a body and its colliders. Returns whether it existed.
    pub fn remove_body(&mut self, handle: BodyHandle) -> bool {
        self.rigid_body_set
            .remove(
                handle,
                &mut self.island_manager,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                true,
            )
            .is_some()
    }

    #[must_use]
    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.rigid_body_set.contains(handle)
    }

    #[must_use]
    pub fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }

    /// Teleport a body. Returns `false` for an unknown handle.
    pub fn set_position(&mut self, handle: BodyHandle, x: f64, y: f64) -> bool {
        let Some(body) = self.rigid_body_set.get_mut(handle) else {
            return false;
        };
        body.set_translation(Vector::new(real(x), real(y)), true);
        true
    }

    #[must_use]
    pub fn position(&self, handle: BodyHandle) -> Option<Point> {
        let t = self.rigid_body_set.get(handle)?.translation();
        Some(Point::new(f64::from(t.x), f64::from(t.y)))
    }

    /// Set linear velocity in world units per second.
    pub fn set_velocity(&mut self, handle: BodyHandle, vx: f64, vy: f64) -> bool {
        let Some(body) = self.rigid_body_set.get_mut(handle) else {
            return false;
        };
        body.set_linvel(Vector::new(real(vx), real(vy)), true);
        true
    }

    #[must_use]
    pub fn velocity(&self, handle: BodyHandle) -> Option<Point> {
        let v = self.rigid_body_set.get(handle)?.linvel();
        Some(Point::new(f64::from(v.x), f64::from(v.y)))
    }

    /// Advance the simulation by `dt_secs`. Non-positive deltas are ignored.
    pub fn step(&mut self, dt_secs: f64) {
        if dt_secs.is_nan() || dt_secs <= 0.0 {
            return;
        }
        self.integration_params.dt = real(dt_secs);
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_params,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }
}
