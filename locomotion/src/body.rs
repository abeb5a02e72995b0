//! How the integrated motion reaches the host's transform.
//!
//! A [`KinematicBody`] owns its position outright and rides the anchor point
//! between steps. A [`DynamicBody`] mirrors a host rigid body: the controller
//! simulates on a projected copy of its position, then turns the step's
//! displacement into a velocity command for the host to apply.

use std::fmt::Debug;

use crate::math::Vec3;

pub trait BodyMotion: Debug {
    /// Position the controller simulates on.
    fn position(&self) -> Vec3;

    fn set_position(&mut self, position: Vec3);

    /// Whether the body is carried by the anchor point at the start of each step.
    fn rides_anchor(&self) -> bool;

    /// Called before anything else in a fixed step.
    fn begin_step(&mut self) {}

    /// Called after the resolver pass. Returns the measured speed for the step.
    fn end_step(&mut self, last_position: Vec3, dt: f32) -> f32;

    /// Velocity the host should give its rigid body, for bodies the host moves.
    fn velocity_command(&self) -> Option<Vec3> {
        None
    }

    /// Report the host's authoritative position (after its own physics ran).
    fn sync_from_host(&mut self, position: Vec3) {
        self.set_position(position);
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KinematicBody {
    position: Vec3,
}

impl KinematicBody {
    pub fn new(position: Vec3) -> Self {
        Self { position }
    }
}

impl BodyMotion for KinematicBody {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    fn rides_anchor(&self) -> bool {
        true
    }

    fn end_step(&mut self, last_position: Vec3, dt: f32) -> f32 {
        (self.position - last_position).norm() / dt
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DynamicBody {
    /// Latest position reported by the host.
    host_position: Vec3,
    /// Working copy the step integrates and resolves.
    projected: Vec3,
    /// Projected position at the start of the current step.
    initial: Vec3,
    command: Vec3,
}

impl DynamicBody {
    pub fn new(position: Vec3) -> Self {
        Self {
            host_position: position,
            projected: position,
            initial: position,
            command: Vec3::zeros(),
        }
    }
}

impl BodyMotion for DynamicBody {
    fn position(&self) -> Vec3 {
        self.projected
    }

    fn set_position(&mut self, position: Vec3) {
        self.projected = position;
    }

    fn rides_anchor(&self) -> bool {
        false
    }

    fn begin_step(&mut self) {
        self.projected = self.host_position;
        self.initial = self.host_position;
    }

    fn end_step(&mut self, _last_position: Vec3, dt: f32) -> f32 {
        self.command = (self.projected - self.initial) / dt;
        // The host moves the body; the projection restarts from where it is.
        self.projected = self.initial;
        self.command.norm()
    }

    fn velocity_command(&self) -> Option<Vec3> {
        Some(self.command)
    }

    fn sync_from_host(&mut self, position: Vec3) {
        self.host_position = position;
        self.projected = position;
    }
}
