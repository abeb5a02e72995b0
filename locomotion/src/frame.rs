/*!
Reference frames the body lives in.

- [`GravityFrame`]: the orientation whose up axis opposes gravity. The body's
  yaw is expressed inside it, so flipping gravity turns the whole player.
- [`AnchorPoint`]: a point glued to whatever the body stands on, which is how
  a kinematic body rides moving and rotating platforms.
- [`LookState`]: accumulated camera pitch and body yaw from look input.
*/

use log::trace;
use nalgebra as na;

use crate::{
    constants::PITCH_LIMIT_DEG,
    math::{Quat, Vec3, align_up, angle_deg, normalize_or_zero, rotate_towards},
    query::{GeometryQuery, SurfaceId},
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GravityFrame {
    rotation: Quat,
}

impl Default for GravityFrame {
    fn default() -> Self {
        Self {
            rotation: Quat::identity(),
        }
    }
}

impl GravityFrame {
    /// Frame already aligned with `gravity`.
    pub fn aligned_with(gravity: Vec3) -> Self {
        let mut frame = Self::default();
        frame.snap_to(gravity);
        frame
    }

    #[inline]
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Current up axis of the frame.
    #[inline]
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::y()
    }

    /// Align the up axis with `-gravity` immediately. Zero gravity leaves the frame alone.
    pub fn snap_to(&mut self, gravity: Vec3) {
        let target = -normalize_or_zero(gravity);
        if target != Vec3::zeros() {
            self.rotation = align_up(self.rotation, target);
        }
    }

    /// Turn the up axis toward `-gravity` by at most `max_radians`, without twisting about it.
    pub fn update(&mut self, gravity: Vec3, max_radians: f32) {
        let target = -normalize_or_zero(gravity);
        if target == Vec3::zeros() {
            return;
        }
        let next_up = rotate_towards(self.up(), target, max_radians);
        self.rotation = align_up(self.rotation, next_up);
    }

    /// Angle in degrees still left between the frame's up and `-gravity`.
    pub fn misalignment_deg(&self, gravity: Vec3) -> f32 {
        angle_deg(self.up(), -gravity)
    }
}

/// A point following the surface the body last stood on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnchorPoint {
    position: Vec3,
    parent: Option<SurfaceId>,
    /// `position` in the parent surface's local frame.
    local: Vec3,
}

impl AnchorPoint {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            parent: None,
            local: position,
        }
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    #[inline]
    pub fn parent(&self) -> Option<SurfaceId> {
        self.parent
    }

    /// Move with the parent surface. Returns the new world position.
    ///
    /// A parent that no longer exists detaches the anchor where it was.
    pub fn follow<Q: GeometryQuery + ?Sized>(&mut self, query: &Q) -> Vec3 {
        if let Some(surface) = self.parent {
            match query.surface_pose(surface) {
                Some(pose) => self.position = pose.transform_point(&na::Point3::from(self.local)).coords,
                None => {
                    trace!("anchor parent {surface:?} vanished, detaching");
                    self.detach();
                }
            }
        }
        self.position
    }

    /// Re-parent to `surface` (or to nothing), keeping the world position.
    pub fn set_parent<Q: GeometryQuery + ?Sized>(&mut self, surface: Option<SurfaceId>, query: &Q) {
        self.parent = surface;
        self.place(self.position, query);
    }

    pub fn detach(&mut self) {
        self.parent = None;
        self.local = self.position;
    }

    /// Move the anchor to `position` in world space.
    pub fn place<Q: GeometryQuery + ?Sized>(&mut self, position: Vec3, query: &Q) {
        self.position = position;
        self.local = match self.parent.and_then(|surface| query.surface_pose(surface)) {
            Some(pose) => pose.inverse_transform_point(&na::Point3::from(position)).coords,
            None => {
                self.parent = None;
                position
            }
        };
    }
}

/// Camera pitch and body yaw accumulated from look input, in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LookState {
    pub pitch: f32,
    pub yaw: f32,
}

impl LookState {
    /// Apply a look delta. `delta.0` turns right, `delta.1` looks up.
    pub fn apply(&mut self, delta: (f32, f32), sensitivity: f32) {
        self.yaw -= delta.0 * sensitivity;
        self.pitch = (self.pitch + delta.1 * sensitivity).clamp(-PITCH_LIMIT_DEG, PITCH_LIMIT_DEG);
    }

    /// Yaw about the frame's up axis.
    pub fn yaw_rotation(&self) -> Quat {
        Quat::from_axis_angle(&Vec3::y_axis(), self.yaw.to_radians())
    }

    /// Pitch about the body's right axis.
    pub fn pitch_rotation(&self) -> Quat {
        Quat::from_axis_angle(&Vec3::x_axis(), self.pitch.to_radians())
    }
}
